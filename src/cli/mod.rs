pub mod args;
pub mod config;
pub mod loader;

pub use args::Args;
pub use config::{ConfigFile, ServerConfig, SpfConfig};
pub use loader::{Settings, SettingsLoader};
