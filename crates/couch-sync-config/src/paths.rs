use std::path::PathBuf;

/// Default config location: `~/.config/couchsync/config.toml` (or the
/// platform equivalent). Falls back to the current directory when no config
/// directory can be resolved.
pub fn default_config_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("couchsync")
        .join("config.toml")
}
