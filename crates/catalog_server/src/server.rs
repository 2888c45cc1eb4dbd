//! Server lifecycle: open the store, serve HTTP, close the store.

use crate::config::Config;
use crate::routes::{build_router, AppState};
use catalog_core::{Store, StoreError, StoreOptions};
use log::{error, info, warn};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to bind `{address}`: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("http server failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// Runs until Ctrl+C or SIGTERM.
pub async fn run(config: &Config) -> Result<(), ServerError> {
    run_until(config, shutdown_signal()).await
}

/// Runs until `shutdown` resolves, then drains connections and closes the
/// store.
pub async fn run_until(
    config: &Config,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let options = StoreOptions {
        busy_timeout: config.store.busy_timeout(),
    };
    let store = Arc::new(Store::open_with(&config.store.db_path, options)?);
    let app = build_router(AppState::new(Arc::clone(&store)), config.api.logging);

    let address = config.bind_address();
    let listener = match TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(source) => {
            close_store(store);
            return Err(ServerError::Bind { address, source });
        }
    };
    let local_address = listener
        .local_addr()
        .map(|addr| addr.to_string())
        .unwrap_or(address);
    info!(
        "event=server_start module=server status=ok address={} db_path={} access_log={}",
        local_address,
        config.store.db_path.display(),
        config.api.logging
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;

    close_store(store);
    served.map_err(ServerError::Serve)?;
    info!("event=server_stop module=server status=ok");
    Ok(())
}

fn close_store(store: Arc<Store>) {
    match Arc::try_unwrap(store) {
        Ok(store) => {
            if let Err(err) = store.close() {
                warn!("event=server_stop module=server status=degraded error={err}");
            }
        }
        Err(_) => warn!("event=server_stop module=server status=degraded reason=store_still_shared"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("event=signal_install module=server status=error signal=ctrl_c error={err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("event=signal_install module=server status=error signal=sigterm error={err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("event=shutdown_signal module=server signal=ctrl_c"),
        _ = terminate => info!("event=shutdown_signal module=server signal=sigterm"),
    }
}

#[cfg(test)]
mod tests {
    use super::{run_until, ServerError};
    use crate::config::Config;
    use catalog_core::{Category, CategoryService, Store};
    use std::sync::Arc;

    fn config_for(db_path: &std::path::Path) -> Config {
        let yaml = format!(
            "api:\n  host: 127.0.0.1\n  http_port: 0\nstore:\n  db_path: {}\n",
            db_path.display()
        );
        Config::from_yaml(&yaml).unwrap()
    }

    #[tokio::test]
    async fn immediate_shutdown_creates_and_releases_database() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("catalog.db");

        run_until(&config_for(&db_path), async {}).await.unwrap();
        assert!(db_path.exists());

        let store = Arc::new(Store::open(&db_path).unwrap());
        let categories = CategoryService::new(store);
        assert_eq!(categories.create(&Category::new("tools")).unwrap(), 1);
    }

    #[tokio::test]
    async fn unopenable_database_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("missing").join("catalog.db");

        let err = run_until(&config_for(&db_path), async {}).await.unwrap_err();
        assert!(matches!(err, ServerError::Store(_)), "{err}");
    }

    #[tokio::test]
    async fn occupied_port_is_a_bind_error() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_for(&dir.path().join("catalog.db"));
        config.api.http_port = occupied.local_addr().unwrap().port();

        let err = run_until(&config, async {}).await.unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }), "{err}");
    }
}
