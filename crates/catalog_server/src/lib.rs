//! HTTP front end for the catalog store.

pub mod config;
pub mod error;
pub mod routes;
pub mod server;

pub use config::{Config, ConfigError};
pub use error::ApiError;
pub use routes::{build_router, AppState};
pub use server::{run, run_until, ServerError};
