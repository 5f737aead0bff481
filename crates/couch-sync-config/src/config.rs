use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub library: LibraryConfig,
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Connection settings for the local library's JSON-RPC endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// e.g. `http://127.0.0.1:8080/jsonrpc`
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_tracker_url")]
    pub api_url: String,
    pub client_id: String,
    pub access_token: String,
}

/// Feature toggles and tuning for a sync run. One value of this struct is
/// loaded per invocation; nothing here persists run state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_true")]
    pub watched_movies: bool,
    #[serde(default = "default_true")]
    pub watched_episodes: bool,
    #[serde(default = "default_true")]
    pub ratings: bool,
    /// Re-send watched state when the library's watch timestamp is newer than
    /// the tracker's, recovering from missed scrobbles.
    #[serde(default)]
    pub scrobble_fallback: bool,
    /// Minimum timestamp lead (seconds) before the fallback re-sends.
    #[serde(default = "default_fallback_tolerance")]
    pub fallback_tolerance_secs: i64,
    /// Only write tracker ratings back to items the library owns.
    #[serde(default = "default_true")]
    pub restrict_to_library: bool,
    /// This run was triggered by a library update rather than by the user.
    #[serde(default)]
    pub sync_on_update: bool,
    #[serde(default = "default_true")]
    pub notifications: bool,
    #[serde(default)]
    pub hide_notifications_during_playback: bool,
}

fn default_true() -> bool {
    true
}

fn default_fallback_tolerance() -> i64 {
    60
}

fn default_tracker_url() -> String {
    "https://api.trakt.tv".to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            watched_movies: true,
            watched_episodes: true,
            ratings: true,
            scrobble_fallback: false,
            fallback_tolerance_secs: default_fallback_tolerance(),
            restrict_to_library: true,
            sync_on_update: false,
            notifications: true,
            hide_notifications_during_playback: false,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.library.url.is_empty() {
            return Err(anyhow::anyhow!("library.url is required"));
        }
        if self.tracker.client_id.is_empty() || self.tracker.client_id == "YOUR_CLIENT_ID" {
            return Err(anyhow::anyhow!("tracker.client_id is not configured"));
        }
        if self.tracker.access_token.is_empty() {
            return Err(anyhow::anyhow!("tracker.access_token is not configured"));
        }
        if self.sync.fallback_tolerance_secs < 0 {
            return Err(anyhow::anyhow!("sync.fallback_tolerance_secs must be non-negative"));
        }
        Ok(())
    }
}
