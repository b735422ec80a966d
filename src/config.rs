use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub collection: CollectionSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub sessions: SessionSettings,
    #[serde(default)]
    pub images: ImageSettings,
    #[serde(default)]
    pub profile: ProfileSettings,
    #[serde(default)]
    pub advisor: AdvisorSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Which document store and identity service to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Appwrite,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub database_id: String,
    /// JSON array of college documents preloaded into the memory backend
    pub seed_file: Option<String>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            endpoint: String::new(),
            api_key: String::new(),
            project_id: String::new(),
            database_id: String::new(),
            seed_file: None,
        }
    }
}

fn default_backend() -> StoreBackend { StoreBackend::Memory }

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSettings {
    #[serde(default = "default_colleges_collection")]
    pub colleges: String,
    #[serde(default = "default_users_collection")]
    pub users: String,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            colleges: default_colleges_collection(),
            users: default_users_collection(),
        }
    }
}

fn default_colleges_collection() -> String { "colleges".to_string() }
fn default_users_collection() -> String { "users".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_l1_cache_size")]
    pub l1_cache_size: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            l1_cache_size: default_l1_cache_size(),
        }
    }
}

fn default_cache_ttl() -> u64 { 300 }
fn default_l1_cache_size() -> u64 { 1000 }

/// Live deck sessions held in memory
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u64,
    #[serde(default = "default_session_idle_secs")]
    pub idle_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            idle_secs: default_session_idle_secs(),
        }
    }
}

fn default_max_sessions() -> u64 { 10_000 }
fn default_session_idle_secs() -> u64 { 1800 }

#[derive(Debug, Clone, Deserialize)]
pub struct ImageSettings {
    #[serde(default = "default_image_entries")]
    pub max_entries: usize,
    #[serde(default = "default_image_bytes")]
    pub max_bytes: usize,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            max_entries: default_image_entries(),
            max_bytes: default_image_bytes(),
        }
    }
}

fn default_image_entries() -> usize { 100 }
fn default_image_bytes() -> usize { 50 * 1024 * 1024 }

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileSettings {
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
        }
    }
}

fn default_storage_dir() -> String { "data".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct AdvisorSettings {
    #[serde(default = "default_advisor_endpoint")]
    pub endpoint: String,
    pub api_key: Option<String>,
    #[serde(default = "default_advisor_model")]
    pub model: String,
}

impl Default for AdvisorSettings {
    fn default() -> Self {
        Self {
            endpoint: default_advisor_endpoint(),
            api_key: None,
            model: default_advisor_model(),
        }
    }
}

fn default_advisor_endpoint() -> String { "https://api.openai.com/v1/completions".to_string() }
fn default_advisor_model() -> String { "gpt-3.5-turbo-instruct".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with CAMPUS)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., CAMPUS__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("CAMPUS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("CAMPUS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(
                "[server]\nhost = \"127.0.0.1\"\nport = 9000\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.store.backend, StoreBackend::Memory);
        assert_eq!(settings.collection.colleges, "colleges");
        assert_eq!(settings.cache.ttl_secs, 300);
        assert_eq!(settings.images.max_entries, 100);
        assert_eq!(settings.sessions.idle_secs, 1800);
        assert!(settings.advisor.api_key.is_none());
    }

    #[test]
    fn test_appwrite_backend_parses() {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(
                r#"
                [server]
                host = "0.0.0.0"
                port = 8080

                [store]
                backend = "appwrite"
                endpoint = "https://cloud.appwrite.io/v1"
                project_id = "campus"
                database_id = "main"
                "#,
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.store.backend, StoreBackend::Appwrite);
        assert_eq!(settings.store.database_id, "main");
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }
}
