//! Configuration loading and data directory resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Database file name inside the data directory
pub const DB_FILE_NAME: &str = "rayo.db";

/// Runtime settings for the API service
///
/// Secrets are read from the environment only; they never land in the
/// TOML config file or the database.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Bind address for the HTTP server
    pub bind_addr: String,
    /// HS256 secret for bearer token validation (empty disables auth)
    pub jwt_secret: String,
    /// OpenAI API key (None when generation endpoints are unavailable)
    pub openai_api_key: Option<String>,
    /// OpenAI model used for all generation calls
    pub openai_model: String,
    /// SEMrush API key (None when metric endpoints are unavailable)
    pub semrush_api_key: Option<String>,
}

impl Settings {
    /// Load settings from the environment
    pub fn from_env() -> Self {
        Settings {
            bind_addr: std::env::var("RAYO_BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:8300".to_string()),
            jwt_secret: std::env::var("RAYO_JWT_SECRET").unwrap_or_default(),
            openai_api_key: non_empty_env("OPENAI_API_KEY"),
            openai_model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            semrush_api_key: non_empty_env("SEMRUSH_API_KEY"),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Data directory resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable RAYO_DATA_DIR
/// 3. TOML config file (`data_dir` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_data_dir(cli_arg: Option<&str>) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var("RAYO_DATA_DIR") {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = locate_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(data_dir) = config.get("data_dir").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(data_dir));
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_data_dir())
}

/// Full path to the database file under the resolved data directory
pub fn database_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join(DB_FILE_NAME)
}

/// Get default configuration file path for the platform
fn locate_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/rayo/config.toml first, then /etc/rayo/config.toml
        if let Some(path) = dirs::config_dir().map(|d| d.join("rayo").join("config.toml")) {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/rayo/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    }

    let config_path = dirs::config_dir()
        .map(|d| d.join("rayo").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if config_path.exists() {
        Ok(config_path)
    } else {
        Err(Error::Config(format!(
            "Config file not found: {:?}",
            config_path
        )))
    }
}

/// Get OS-dependent default data directory path
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("rayo"))
        .unwrap_or_else(|| PathBuf::from("./rayo_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_arg_takes_priority() {
        let resolved = resolve_data_dir(Some("/tmp/rayo-test")).unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/rayo-test"));
    }

    #[test]
    fn test_database_path_appends_file_name() {
        let path = database_path(std::path::Path::new("/var/lib/rayo"));
        assert_eq!(path, PathBuf::from("/var/lib/rayo/rayo.db"));
    }
}
