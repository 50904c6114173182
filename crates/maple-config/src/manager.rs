use crate::config::{Config, ConfigError, ConfigResult, TransportMode};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Loads, validates and persists the config file
#[derive(Clone, Debug)]
pub struct ConfigManager {
    path: PathBuf,
    config: Arc<RwLock<Config>>,
}

impl ConfigManager {
    /// Load the config at `path`, writing defaults there if it does not exist
    pub async fn load(path: &Path) -> ConfigResult<Self> {
        let config = if path.exists() {
            info!("Loading config from {:?}", path);
            let content = tokio::fs::read_to_string(path).await?;
            let content = Self::expand_env_vars(&content)?;
            let config: Config = serde_json::from_str(&content)?;
            Self::validate(&config)?;
            config
        } else {
            info!("Config file not found, creating default config at {:?}", path);
            let default_config = Config::default();
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let content = serde_json::to_string_pretty(&default_config)?;
            tokio::fs::write(path, &content).await?;
            default_config
        };

        Ok(Self {
            path: path.to_path_buf(),
            config: Arc::new(RwLock::new(config)),
        })
    }

    /// Load from ~/.maple/config.json
    pub async fn load_default() -> ConfigResult<Self> {
        let config_path = Self::default_config_path()?;
        Self::load(&config_path).await
    }

    pub fn default_config_path() -> ConfigResult<PathBuf> {
        crate::default_config_path()
            .ok_or_else(|| ConfigError::InvalidPath("Could not find home directory".to_string()))
    }

    /// Wrap an in-memory config (used by tests)
    pub fn new(config: Config, path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// Clone of the current config
    pub async fn snapshot(&self) -> Config {
        self.config.read().await.clone()
    }

    pub async fn save(&self) -> ConfigResult<()> {
        self.save_to(&self.path).await?;
        info!("Config saved to {:?}", self.path);
        Ok(())
    }

    pub async fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let config = self.config.read().await;
        let content = serde_json::to_string_pretty(&*config)?;
        drop(config);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Re-read the file; the in-memory config is untouched on error
    pub async fn reload(&self) -> ConfigResult<()> {
        if !self.path.exists() {
            return Err(ConfigError::InvalidPath(format!(
                "Config file not found: {:?}",
                self.path
            )));
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        let content = Self::expand_env_vars(&content)?;
        let new_config: Config = serde_json::from_str(&content)?;

        Self::validate(&new_config)?;

        let mut config = self.config.write().await;
        *config = new_config;
        drop(config);

        info!("Config reloaded from {:?}", self.path);
        Ok(())
    }

    /// Apply `f`, validate, and save
    pub async fn update<F>(&self, f: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.config.write().await;
        let mut candidate = config.clone();
        f(&mut candidate);
        Self::validate(&candidate)?;
        *config = candidate;
        drop(config);
        self.save().await
    }

    pub fn validate(config: &Config) -> ConfigResult<()> {
        if config.transport.mode == TransportMode::Websocket {
            let endpoint = config.transport.resolved_endpoint()?;
            if endpoint.is_empty() {
                return Err(ConfigError::Validation(
                    "Transport endpoint cannot be empty".to_string(),
                ));
            }
            maple_gateway::validate_endpoint(&endpoint)
                .map_err(|e| ConfigError::Validation(e.to_string()))?;
        }

        if config.transport.close_grace_ms == 0 {
            return Err(ConfigError::Validation(
                "Transport close_grace_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Expand `${VAR}` and `${VAR:-default}`
    fn expand_env_vars(content: &str) -> ConfigResult<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::Validation(format!("Invalid pattern: {}", e)))?;
        let mut result = content.to_string();

        for cap in re.captures_iter(content) {
            let full_match = &cap[0];
            let var_expr = &cap[1];

            let (var_name, default_value) = match var_expr.split_once(":-") {
                Some((name, default)) => (name, Some(default)),
                None => (var_expr, None),
            };

            let replacement = match std::env::var(var_name) {
                Ok(val) => val,
                Err(_) => match default_value {
                    Some(default) => default.to_string(),
                    None => return Err(ConfigError::EnvVarNotFound(var_name.to_string())),
                },
            };

            result = result.replace(full_match, &replacement);
        }

        Ok(result)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use maple_core::Region;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_creates_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        let manager = ConfigManager::load(&config_path).await.unwrap();
        let config = manager.snapshot().await;

        assert!(config_path.exists());
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn test_env_var_expansion() {
        std::env::set_var("MAPLE_TEST_ENDPOINT", "ws://10.0.0.5:9000/ws");

        let content = r#"{"endpoint": "${MAPLE_TEST_ENDPOINT}", "mode": "${MAPLE_TEST_UNSET_MODE:-mock}"}"#;
        let expanded = ConfigManager::expand_env_vars(content).unwrap();

        assert!(expanded.contains("ws://10.0.0.5:9000/ws"));
        assert!(expanded.contains(r#""mode": "mock""#));
    }

    #[tokio::test]
    async fn test_missing_env_var_is_an_error() {
        let err = ConfigManager::expand_env_vars("${MAPLE_TEST_DEFINITELY_UNSET}").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotFound(name) if name == "MAPLE_TEST_DEFINITELY_UNSET"));
    }

    #[tokio::test]
    async fn test_config_validation() {
        let mut config = Config::default();
        config.transport.endpoint = "http://127.0.0.1:8000/ws".to_string();
        assert!(ConfigManager::validate(&config).is_err());

        config.transport.mode = TransportMode::Mock;
        assert!(ConfigManager::validate(&config).is_ok());

        config.transport.close_grace_ms = 0;
        assert!(ConfigManager::validate(&config).is_err());
    }

    #[tokio::test]
    async fn test_update_saves_and_reload_reads_back() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let manager = ConfigManager::load(&config_path).await.unwrap();

        manager
            .update(|config| config.chat.default_region = Region::Atlantic)
            .await
            .unwrap();

        let other = ConfigManager::load(&config_path).await.unwrap();
        assert_eq!(other.snapshot().await.chat.default_region, Region::Atlantic);

        tokio::fs::write(&config_path, "{ not json").await.unwrap();
        assert!(manager.reload().await.is_err());
        assert_eq!(manager.snapshot().await.chat.default_region, Region::Atlantic);
    }

    #[tokio::test]
    async fn test_reload_picks_up_edited_log_level() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let manager = ConfigManager::load(&config_path).await.unwrap();
        assert_eq!(manager.snapshot().await.logging.level, LogLevel::Info);

        let mut edited = Config::default();
        edited.logging.level = LogLevel::Debug;
        tokio::fs::write(&config_path, serde_json::to_string_pretty(&edited).unwrap())
            .await
            .unwrap();

        manager.reload().await.unwrap();
        assert_eq!(manager.snapshot().await.logging.level, LogLevel::Debug);

        tokio::fs::remove_file(&config_path).await.unwrap();
        assert!(matches!(
            manager.reload().await,
            Err(ConfigError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_update_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::new(Config::default(), temp_dir.path().join("config.json"));

        let result = manager
            .update(|config| config.transport.close_grace_ms = 0)
            .await;

        assert!(result.is_err());
        assert_eq!(manager.snapshot().await.transport.close_grace_ms, 2000);
    }
}
