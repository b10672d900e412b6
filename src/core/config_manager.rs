// src/core/config_manager.rs
//! Configuration loading: environment paths from `config.yaml` (optional),
//! vendor keys and endpoints from environment variables.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.yaml";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_SERPAPI_URL: &str = "https://serpapi.com/search";
pub const DEFAULT_CONTACTOUT_URL: &str = "https://api.contactout.com/v1/linkedin/enrich";
pub const DEFAULT_ROCKETREACH_URL: &str = "https://api.rocketreach.co/v2/api/lookupProfile";

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub environment_name: String,
    pub environment: EnvironmentConfig,
    pub vendors: VendorConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentConfig {
    pub database_path: PathBuf,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: EnvironmentConfig,
    production: EnvironmentConfig,
}

#[derive(Debug, Clone)]
pub struct VendorConfig {
    pub serpapi_key: Option<String>,
    pub contactout_api_key: Option<String>,
    pub rocketreach_api_key: Option<String>,
    pub serpapi_url: String,
    pub contactout_url: String,
    pub rocketreach_url: String,
    pub timeout_seconds: u64,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            serpapi_key: None,
            contactout_api_key: None,
            rocketreach_api_key: None,
            serpapi_url: DEFAULT_SERPAPI_URL.to_string(),
            contactout_url: DEFAULT_CONTACTOUT_URL.to_string(),
            rocketreach_url: DEFAULT_ROCKETREACH_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl ConfigManager {
    /// Load all configurations from the process environment and `config.yaml`
    pub fn load() -> Result<Self> {
        let lookup = |key: &str| std::env::var(key).ok();
        let environment_name = environment_name(&lookup);

        let config_path = PathBuf::from(CONFIG_FILE);
        let yaml = if config_path.exists() {
            Some(std::fs::read_to_string(&config_path).context("Failed to read config.yaml")?)
        } else {
            None
        };

        let base_dir = if environment_name == "production" {
            PathBuf::from("/app")
        } else {
            std::env::current_dir().context("Failed to get current directory")?
        };

        Self::from_sources(&environment_name, yaml.as_deref(), &base_dir, &lookup)
    }

    /// Build configuration from explicit sources
    pub fn from_sources<F>(
        environment_name: &str,
        yaml: Option<&str>,
        base_dir: &Path,
        lookup: &F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut environment = match yaml {
            Some(content) => {
                let file: ConfigFile =
                    serde_yaml::from_str(content).context("Failed to parse config.yaml")?;
                match environment_name {
                    "production" => file.production,
                    _ => file.local,
                }
            }
            None => EnvironmentConfig {
                database_path: PathBuf::from("leads.db"),
                port: DEFAULT_PORT,
                log_file: None,
            },
        };

        if let Some(path) = lookup("DATABASE_PATH") {
            environment.database_path = PathBuf::from(path);
        }
        if let Some(port) = lookup("LEADGEN_PORT") {
            environment.port = port
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("LEADGEN_PORT must be a valid port number"))?;
        }

        environment.database_path = resolve_path(&environment.database_path, base_dir);
        environment.log_file = environment
            .log_file
            .map(|path| resolve_path(&path, base_dir));

        Ok(Self {
            environment_name: environment_name.to_string(),
            environment,
            vendors: VendorConfig::from_lookup(lookup)?,
        })
    }

    /// Ensure the database directory exists
    pub async fn ensure_directories(&self) -> Result<()> {
        if let Some(db_parent) = self.environment.database_path.parent() {
            if !db_parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(db_parent).await.with_context(|| {
                    format!(
                        "Failed to create database directory: {}",
                        db_parent.display()
                    )
                })?;
            }
        }
        Ok(())
    }
}

impl VendorConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let timeout_seconds = match lookup("VENDOR_TIMEOUT_SECONDS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| anyhow::anyhow!("VENDOR_TIMEOUT_SECONDS must be a number"))?,
            None => defaults.timeout_seconds,
        };

        Ok(Self {
            serpapi_key: key("SERPAPI_KEY"),
            contactout_api_key: key("CONTACTOUT_API_KEY"),
            rocketreach_api_key: key("ROCKETREACH_API_KEY"),
            serpapi_url: key("SERPAPI_URL").unwrap_or(defaults.serpapi_url),
            contactout_url: key("CONTACTOUT_API_URL").unwrap_or(defaults.contactout_url),
            rocketreach_url: key("ROCKETREACH_API_URL").unwrap_or(defaults.rocketreach_url),
            timeout_seconds,
        })
    }
}

fn environment_name<F>(lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup("LEADGEN_ENV")
        .or_else(|| lookup("ENVIRONMENT"))
        .unwrap_or_else(|| "local".to_string())
}

fn resolve_path(path: &Path, base_dir: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const YAML: &str = r#"
local:
  database_path: data/local.db
  port: 9000
production:
  database_path: /var/lib/leadgen/leads.db
  log_file: logs/leadgen.log
"#;

    #[test]
    fn test_defaults_without_config_file() {
        let lookup = lookup_from(&[]);
        let config = ConfigManager::from_sources("local", None, Path::new("/srv"), &lookup).unwrap();

        assert_eq!(config.environment.database_path, PathBuf::from("/srv/leads.db"));
        assert_eq!(config.environment.port, DEFAULT_PORT);
        assert!(config.vendors.serpapi_key.is_none());
        assert_eq!(config.vendors.serpapi_url, DEFAULT_SERPAPI_URL);
        assert_eq!(config.vendors.timeout_seconds, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_yaml_sections_by_environment() {
        let lookup = lookup_from(&[]);
        let local = ConfigManager::from_sources("local", Some(YAML), Path::new("/srv"), &lookup).unwrap();
        assert_eq!(local.environment.database_path, PathBuf::from("/srv/data/local.db"));
        assert_eq!(local.environment.port, 9000);
        assert!(local.environment.log_file.is_none());

        let prod =
            ConfigManager::from_sources("production", Some(YAML), Path::new("/app"), &lookup).unwrap();
        assert_eq!(
            prod.environment.database_path,
            PathBuf::from("/var/lib/leadgen/leads.db")
        );
        assert_eq!(prod.environment.port, DEFAULT_PORT);
        assert_eq!(
            prod.environment.log_file,
            Some(PathBuf::from("/app/logs/leadgen.log"))
        );
    }

    #[test]
    fn test_env_overrides_and_vendor_keys() {
        let lookup = lookup_from(&[
            ("DATABASE_PATH", "/tmp/x.db"),
            ("LEADGEN_PORT", "8123"),
            ("SERPAPI_KEY", "serp"),
            ("CONTACTOUT_API_KEY", "  "),
            ("ROCKETREACH_API_URL", "http://localhost:1234/lookup"),
        ]);
        let config = ConfigManager::from_sources("local", None, Path::new("/srv"), &lookup).unwrap();

        assert_eq!(config.environment.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.environment.port, 8123);
        assert_eq!(config.vendors.serpapi_key.as_deref(), Some("serp"));
        assert!(config.vendors.contactout_api_key.is_none());
        assert_eq!(config.vendors.rocketreach_url, "http://localhost:1234/lookup");
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let lookup = lookup_from(&[("LEADGEN_PORT", "not-a-port")]);
        assert!(ConfigManager::from_sources("local", None, Path::new("/srv"), &lookup).is_err());
    }

    #[test]
    fn test_environment_name_precedence() {
        assert_eq!(environment_name(&lookup_from(&[])), "local");
        assert_eq!(
            environment_name(&lookup_from(&[("ENVIRONMENT", "production")])),
            "production"
        );
        assert_eq!(
            environment_name(&lookup_from(&[
                ("ENVIRONMENT", "production"),
                ("LEADGEN_ENV", "staging")
            ])),
            "staging"
        );
    }
}
