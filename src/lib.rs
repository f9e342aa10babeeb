pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;

pub use adapters::GoogleSheetsStore;
pub use config::{ImportConfig, RunSettings, SettingsInput};
pub use core::{etl::ImportEngine, pipeline::ImportPipeline};
pub use utils::error::{ImportError, Result};
