use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub slack: SlackConfig,
    pub directory: DirectoryConfig,
    pub store: StoreConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct SlackConfig {
    pub bot_token: SecretString,
    pub channel: String,
}

#[derive(Clone, Debug)]
pub struct DirectoryConfig {
    /// Upper bound on each individual presence/name lookup during fan-out.
    pub lookup_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub file_path: String,
    pub table_name: String,
    pub bucket: String,
    pub object_key: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Memory,
    File,
    Table,
    Object,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub slack_bot_token: Option<String>,
    pub slack_channel: Option<String>,
    pub store_backend: Option<StoreBackend>,
    pub store_file_path: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            slack: SlackConfig { bot_token: String::new().into(), channel: String::new() },
            directory: DirectoryConfig { lookup_timeout_secs: 10 },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                file_path: "brewbot.redb".to_string(),
                table_name: "members".to_string(),
                bucket: String::new(),
                object_key: "results.json".to_string(),
            },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 3000 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            "table" => Ok(Self::Table),
            "object" => Ok(Self::Object),
            other => Err(ConfigError::Validation(format!(
                "unsupported store backend `{other}` (expected memory|file|table|object)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("brewbot.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(slack) = patch.slack {
            if let Some(bot_token) = slack.bot_token {
                self.slack.bot_token = bot_token.into();
            }
            if let Some(channel) = slack.channel {
                self.slack.channel = channel;
            }
        }

        if let Some(directory) = patch.directory {
            if let Some(lookup_timeout_secs) = directory.lookup_timeout_secs {
                self.directory.lookup_timeout_secs = lookup_timeout_secs;
            }
        }

        if let Some(store) = patch.store {
            if let Some(backend) = store.backend {
                self.store.backend = backend;
            }
            if let Some(file_path) = store.file_path {
                self.store.file_path = file_path;
            }
            if let Some(table_name) = store.table_name {
                self.store.table_name = table_name;
            }
            if let Some(bucket) = store.bucket {
                self.store.bucket = bucket;
            }
            if let Some(object_key) = store.object_key {
                self.store.object_key = object_key;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("BREWBOT_SLACK_BOT_TOKEN") {
            self.slack.bot_token = value.into();
        }
        if let Some(value) = read_env("BREWBOT_SLACK_CHANNEL") {
            self.slack.channel = value;
        }

        if let Some(value) = read_env("BREWBOT_DIRECTORY_LOOKUP_TIMEOUT_SECS") {
            self.directory.lookup_timeout_secs =
                parse_u64("BREWBOT_DIRECTORY_LOOKUP_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("BREWBOT_STORE_BACKEND") {
            self.store.backend = value.parse()?;
        }
        if let Some(value) = read_env("BREWBOT_STORE_FILE_PATH") {
            self.store.file_path = value;
        }
        if let Some(value) = read_env("BREWBOT_STORE_TABLE_NAME") {
            self.store.table_name = value;
        }
        if let Some(value) = read_env("BREWBOT_STORE_BUCKET") {
            self.store.bucket = value;
        }
        if let Some(value) = read_env("BREWBOT_STORE_OBJECT_KEY") {
            self.store.object_key = value;
        }

        if let Some(value) = read_env("BREWBOT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("BREWBOT_SERVER_PORT") {
            self.server.port = parse_u16("BREWBOT_SERVER_PORT", &value)?;
        }

        let log_level = read_env("BREWBOT_LOGGING_LEVEL").or_else(|| read_env("BREWBOT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("BREWBOT_LOGGING_FORMAT").or_else(|| read_env("BREWBOT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bot_token) = overrides.slack_bot_token {
            self.slack.bot_token = bot_token.into();
        }
        if let Some(channel) = overrides.slack_channel {
            self.slack.channel = channel;
        }
        if let Some(backend) = overrides.store_backend {
            self.store.backend = backend;
        }
        if let Some(file_path) = overrides.store_file_path {
            self.store.file_path = file_path;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        use secrecy::ExposeSecret;

        if self.slack.bot_token.expose_secret().is_empty() {
            return Err(ConfigError::Validation("slack.bot_token must be set".to_string()));
        }
        if self.slack.channel.is_empty() {
            return Err(ConfigError::Validation("slack.channel must be set".to_string()));
        }

        if self.directory.lookup_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "directory.lookup_timeout_secs must be at least 1".to_string(),
            ));
        }

        match self.store.backend {
            StoreBackend::Memory => {}
            StoreBackend::File => {
                if self.store.file_path.is_empty() {
                    return Err(ConfigError::Validation(
                        "store.file_path must be set for the file backend".to_string(),
                    ));
                }
            }
            StoreBackend::Table => {
                if self.store.table_name.is_empty() {
                    return Err(ConfigError::Validation(
                        "store.table_name must be set for the table backend".to_string(),
                    ));
                }
            }
            StoreBackend::Object => {
                if self.store.bucket.is_empty() || self.store.object_key.is_empty() {
                    return Err(ConfigError::Validation(
                        "store.bucket and store.object_key must be set for the object backend"
                            .to_string(),
                    ));
                }
            }
        }

        if self.server.bind_address.is_empty() {
            return Err(ConfigError::Validation("server.bind_address must be set".to_string()));
        }

        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "unsupported logging level `{}` (expected trace|debug|info|warn|error)",
                self.logging.level
            )));
        }

        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("brewbot.toml"), PathBuf::from("config/brewbot.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    toml::from_str::<ConfigPatch>(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    slack: Option<SlackPatch>,
    directory: Option<DirectoryPatch>,
    store: Option<StorePatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackPatch {
    bot_token: Option<String>,
    channel: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DirectoryPatch {
    lookup_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct StorePatch {
    backend: Option<StoreBackend>,
    file_path: Option<String>,
    table_name: Option<String>,
    bucket: Option<String>,
    object_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use secrecy::ExposeSecret;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, StoreBackend};

    fn valid_overrides() -> ConfigOverrides {
        ConfigOverrides {
            slack_bot_token: Some("xoxb-test".to_string()),
            slack_channel: Some("C0FFEE".to_string()),
            ..ConfigOverrides::default()
        }
    }

    #[test]
    fn defaults_plus_overrides_validate() {
        let config = AppConfig::load(LoadOptions {
            overrides: valid_overrides(),
            ..LoadOptions::default()
        })
        .expect("load config");

        assert_eq!(config.slack.channel, "C0FFEE");
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.directory.lookup_timeout_secs, 10);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn missing_bot_token_fails_validation() {
        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                slack_channel: Some("C0FFEE".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        let message = result.err().expect("validation error").to_string();
        assert!(message.contains("slack.bot_token"));
    }

    #[test]
    fn toml_patch_overrides_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("brewbot.toml");
        let mut file = std::fs::File::create(&path).expect("create config file");
        write!(
            file,
            r#"
[slack]
bot_token = "xoxb-from-file"
channel = "C0FFEE"

[store]
backend = "object"
bucket = "coffee-storage"
object_key = "results.json"

[logging]
level = "debug"
format = "json"
"#
        )
        .expect("write config file");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(path),
            require_file: true,
            overrides: ConfigOverrides::default(),
        })
        .expect("load config");

        assert_eq!(config.slack.bot_token.expose_secret(), "xoxb-from-file");
        assert_eq!(config.store.backend, StoreBackend::Object);
        assert_eq!(config.store.bucket, "coffee-storage");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn required_file_that_is_missing_errors() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/definitely/not/here/brewbot.toml")),
            require_file: true,
            overrides: valid_overrides(),
        });

        assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
    }

    #[test]
    fn file_backend_requires_a_path() {
        let mut config = AppConfig::default();
        config.slack.bot_token = "xoxb-test".to_string().into();
        config.slack.channel = "C0FFEE".to_string();
        config.store.backend = StoreBackend::File;
        config.store.file_path = String::new();

        let message = config.validate().err().expect("validation error").to_string();
        assert!(message.contains("store.file_path"));
    }

    #[test]
    fn backend_names_parse_case_insensitively() {
        assert_eq!("MEMORY".parse::<StoreBackend>().expect("parse"), StoreBackend::Memory);
        assert_eq!("object".parse::<StoreBackend>().expect("parse"), StoreBackend::Object);
        assert!("cloud".parse::<StoreBackend>().is_err());
    }
}
