use std::env;
use std::path::PathBuf;

/// Store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the JSON state document
    pub path: PathBuf,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub log_level: String,
}

impl StoreConfig {
    /// Create store config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let path = match env::var("EQUB_STORE_PATH") {
            Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
            _ => Self::default_path()?,
        };
        Ok(Self { path })
    }

    /// Default location under the platform data directory
    pub fn default_path() -> Result<PathBuf, String> {
        let base = dirs::data_dir().ok_or("Could not determine a data directory for this platform")?;
        Ok(base.join("equb").join("ledger.json"))
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        let store = StoreConfig::from_env()?;

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            ));
        }

        Ok(Self {
            store,
            log_level: log_level.to_lowercase(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_is_under_data_dir() {
        let path = StoreConfig::default_path().expect("default path");
        assert!(path.ends_with("equb/ledger.json"));
    }
}
