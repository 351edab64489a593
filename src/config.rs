use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 9002;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Which repository backs the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Json,
    Sqlite,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Json => write!(f, "json"),
            StorageKind::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(StorageKind::Json),
            "sqlite" => Ok(StorageKind::Sqlite),
            _ => Err(format!(
                "Invalid storage '{}'. Valid options: json, sqlite",
                s
            )),
        }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Where the document lives (JSON file or SQLite database)
    pub data_path: ConfigValue<PathBuf>,
    /// Repository backend
    pub storage: ConfigValue<StorageKind>,
    /// When set, the CLI talks to this server instead of the local store
    pub server_url: ConfigValue<Option<String>>,
    /// Port the server listens on
    pub port: ConfigValue<u16>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_path: Option<PathBuf>,
    storage: Option<StorageKind>,
    server_url: Option<String>,
    port: Option<u16>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut data_path: Option<ConfigValue<PathBuf>> = None;
        let mut storage = ConfigValue::new(StorageKind::default(), ConfigSource::Default);
        let mut server_url = ConfigValue::new(None, ConfigSource::Default);
        let mut port = ConfigValue::new(DEFAULT_PORT, ConfigSource::Default);
        let mut config_file = None;

        // Try to load from config file
        let path = config_path
            .or_else(|| std::env::var("CAFEBOOK_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(file_data_path) = file_config.data_path {
                // Resolve relative paths against config file's directory
                let resolved_path = if file_data_path.is_relative() {
                    path.parent()
                        .map(|p| p.join(&file_data_path))
                        .unwrap_or(file_data_path)
                } else {
                    file_data_path
                };
                data_path = Some(ConfigValue::new(resolved_path, ConfigSource::File));
            }
            if let Some(kind) = file_config.storage {
                storage = ConfigValue::new(kind, ConfigSource::File);
            }
            if let Some(url) = file_config.server_url {
                server_url = ConfigValue::new(Some(url), ConfigSource::File);
            }
            if let Some(file_port) = file_config.port {
                port = ConfigValue::new(file_port, ConfigSource::File);
            }
        }

        // Apply environment variable overrides
        if let Ok(env_path) = std::env::var("CAFEBOOK_DATA_PATH") {
            data_path = Some(ConfigValue::new(
                PathBuf::from(env_path),
                ConfigSource::Environment,
            ));
        }
        if let Ok(env_storage) = std::env::var("CAFEBOOK_STORAGE") {
            let kind = env_storage
                .parse()
                .map_err(|e| ConfigError::InvalidValue("CAFEBOOK_STORAGE".into(), e))?;
            storage = ConfigValue::new(kind, ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("CAFEBOOK_SERVER_URL") {
            let url = if url.trim().is_empty() { None } else { Some(url) };
            server_url = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Ok(env_port) = std::env::var("CAFEBOOK_PORT") {
            let parsed = env_port.parse().map_err(|_| {
                ConfigError::InvalidValue(
                    "CAFEBOOK_PORT".into(),
                    format!("'{}' is not a valid port", env_port),
                )
            })?;
            port = ConfigValue::new(parsed, ConfigSource::Environment);
        }

        let data_path = data_path.unwrap_or_else(|| {
            ConfigValue::new(
                Self::default_data_path(storage.value),
                ConfigSource::Default,
            )
        });

        Ok(Self {
            data_path,
            storage,
            server_url,
            port,
            config_file,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/cafebook/
    /// - macOS: ~/Library/Application Support/cafebook/
    /// - Windows: %APPDATA%/cafebook/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cafebook")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/cafebook/
    /// - macOS: ~/Library/Application Support/cafebook/
    /// - Windows: %APPDATA%/cafebook/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cafebook")
    }

    /// `db.json` or `cafebook.db` in the data directory, by storage kind.
    pub fn default_data_path(storage: StorageKind) -> PathBuf {
        match storage {
            StorageKind::Json => Self::default_data_dir().join("db.json"),
            StorageKind::Sqlite => Self::default_data_dir().join("cafebook.db"),
        }
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(String, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(key, e) => {
                write!(f, "Invalid value for {}: {}", key, e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    // Tests below read and write process-wide environment variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load(Some(config_path)).unwrap();
        assert!(config.data_path.value.ends_with("cafebook/db.json"));
        assert_eq!(config.data_path.source, ConfigSource::Default);
        assert_eq!(config.storage.value, StorageKind::Json);
        assert_eq!(config.port.value, DEFAULT_PORT);
        assert!(config.server_url.value.is_none());
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "data_path: /srv/cafe/cafe.db").unwrap();
        writeln!(file, "storage: sqlite").unwrap();
        writeln!(file, "server_url: http://localhost:9002").unwrap();
        writeln!(file, "port: 8088").unwrap();

        let config = Config::load(Some(config_path.clone())).unwrap();
        assert_eq!(config.data_path.value, PathBuf::from("/srv/cafe/cafe.db"));
        assert_eq!(config.data_path.source, ConfigSource::File);
        assert_eq!(config.storage.value, StorageKind::Sqlite);
        assert_eq!(
            config.server_url.value.as_deref(),
            Some("http://localhost:9002")
        );
        assert_eq!(config.port.value, 8088);
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_relative_data_path_resolves_against_config_dir() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "data_path: data/db.json\n").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.data_path.value, temp_dir.path().join("data/db.json"));
    }

    #[test]
    fn test_sqlite_default_path() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "storage: sqlite\n").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert!(config.data_path.value.ends_with("cafebook/cafebook.db"));
    }

    #[test]
    fn test_env_var_overrides_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "port: 7000\n").unwrap();

        std::env::set_var("CAFEBOOK_PORT", "7100");
        std::env::set_var("CAFEBOOK_DATA_PATH", "/tmp/from-env.json");

        let config = Config::load(Some(config_path));

        std::env::remove_var("CAFEBOOK_PORT");
        std::env::remove_var("CAFEBOOK_DATA_PATH");

        let config = config.unwrap();
        assert_eq!(config.port.value, 7100);
        assert_eq!(config.port.source, ConfigSource::Environment);
        assert_eq!(config.data_path.value, PathBuf::from("/tmp/from-env.json"));
    }

    #[test]
    fn test_invalid_env_port() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp_dir = tempdir().unwrap();

        std::env::set_var("CAFEBOOK_PORT", "not-a-port");
        let result = Config::load(Some(temp_dir.path().join("none.yaml")));
        std::env::remove_var("CAFEBOOK_PORT");

        let err = result.unwrap_err();
        assert!(err.to_string().contains("CAFEBOOK_PORT"));
    }

    #[test]
    fn test_invalid_yaml_error() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(Some(config_path));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
