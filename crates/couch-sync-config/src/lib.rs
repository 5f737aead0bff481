pub mod config;
pub mod paths;

pub use config::{Config, LibraryConfig, SyncConfig, TrackerConfig};
pub use paths::default_config_file;
