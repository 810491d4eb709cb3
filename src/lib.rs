pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod render;
#[cfg(feature = "server")]
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;
pub use config::AppConfig;

pub use adapters::storage::LocalStorage;
pub use core::{client::SankhyaClient, service::ReceivablesService};
pub use utils::error::{ReceivablesError, Result};
