pub mod config;
pub mod manager;

pub use config::{
    ChatConfig, Config, ConfigError, ConfigResult, LogLevel, LoggingConfig, TransportConfig,
    TransportMode,
};
pub use manager::ConfigManager;

use std::path::PathBuf;

/// Maple home directory (~/.maple)
pub fn maple_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".maple"))
}

/// Default config file path
pub fn default_config_path() -> Option<PathBuf> {
    maple_dir().map(|dir| dir.join("config.json"))
}

/// Default log file path
pub fn default_log_path() -> Option<PathBuf> {
    maple_dir().map(|dir| dir.join("logs").join("maple.log"))
}

/// Create the Maple directory layout
pub async fn init_maple_dirs() -> ConfigResult<()> {
    if let Some(maple) = maple_dir() {
        tokio::fs::create_dir_all(&maple).await?;
        tokio::fs::create_dir_all(maple.join("logs")).await?;
    }
    Ok(())
}

/// Expand a leading `~/` to the home directory
pub fn expand_tilde(path: &str) -> Option<PathBuf> {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir().map(|home| home.join(rest))
    } else {
        Some(PathBuf::from(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maple_dir() {
        let dir = maple_dir();
        assert!(dir.is_some());
        assert!(dir.unwrap().to_string_lossy().contains(".maple"));
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde("~/.maple/config.json");
        assert!(expanded.is_some());
        assert!(!expanded.unwrap().to_string_lossy().starts_with('~'));

        assert_eq!(
            expand_tilde("/var/log/maple.log"),
            Some(PathBuf::from("/var/log/maple.log"))
        );
    }
}
