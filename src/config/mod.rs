#[cfg(feature = "cli")]
pub mod cli;
pub mod file_config;
pub mod settings;

#[cfg(feature = "cli")]
pub use cli::CliArgs;
pub use file_config::{GoogleConfig, ImportConfig, OrgConfig, DEFAULT_CONFIG_PATH};
pub use settings::{RemoteTarget, RunSettings, SettingsInput};
