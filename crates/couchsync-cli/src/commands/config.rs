use std::path::PathBuf;

use color_eyre::eyre::{eyre, Context};
use color_eyre::Result;
use couch_sync_config::{default_config_file, Config, LibraryConfig, SyncConfig, TrackerConfig};
use owo_colors::OwoColorize;

pub fn show(config_path: Option<PathBuf>) -> Result<()> {
    let path = config_path.unwrap_or_else(default_config_file);
    let mut config = Config::load_from_file(&path)
        .map_err(|e| eyre!(e))
        .wrap_err_with(|| format!("failed to load config from {}", path.display()))?;

    config.tracker.access_token = mask(&config.tracker.access_token);
    if let Some(password) = config.library.password.as_mut() {
        *password = mask(password);
    }

    println!("{} {}", "config:".bold(), path.display());
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

pub fn init(force: bool) -> Result<()> {
    let path = default_config_file();
    if path.exists() && !force {
        return Err(eyre!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }

    let template = Config {
        library: LibraryConfig {
            url: "http://127.0.0.1:8080/jsonrpc".to_string(),
            username: Some("kodi".to_string()),
            password: None,
        },
        tracker: TrackerConfig {
            api_url: "https://api.trakt.tv".to_string(),
            client_id: "YOUR_CLIENT_ID".to_string(),
            access_token: String::new(),
        },
        sync: SyncConfig::default(),
    };
    template.save_to_file(&path).map_err(|e| eyre!(e))?;
    println!("{} {}", "wrote".green().bold(), path.display());
    println!("fill in the tracker credentials before the first sync");
    Ok(())
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "********".to_string()
    }
}
