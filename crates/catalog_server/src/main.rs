use anyhow::{anyhow, Context};
use catalog_server::Config;
use clap::Parser;
use log::info;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "catalog_server", version, about = "Products and categories HTTP service")]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(long = "conf", default_value = "./config/config.yaml")]
    conf: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load(&args.conf)
        .with_context(|| format!("loading configuration from {}", args.conf.display()))?;

    catalog_core::init_logging(&config.log_level, config.log_dir.as_deref())
        .map_err(|err| anyhow!(err))?;
    info!(
        "event=app_start module=server status=ok config={} version={}",
        args.conf.display(),
        catalog_core::core_version()
    );

    catalog_server::run(&config).await?;
    Ok(())
}
