use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Environment variable naming an optional YAML config file.
pub const CONFIG_ENV: &str = "HTTPWIRE_CONFIG";
/// Environment variable overriding `server.listen_addr`.
pub const LISTEN_ENV: &str = "LISTEN";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub parser: ParserConfig,
    pub proxy: ProxyConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:42069".to_string(),
        }
    }
}

/// Buffer sizing for request parsing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// First read window; doubles while a line does not fit
    pub initial_buffer_size: usize,
    /// Largest window, i.e. longest request line or header line accepted
    pub max_buffer_size: usize,
    /// Largest `Content-Length` accepted
    pub max_body_size: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            initial_buffer_size: 8,
            max_buffer_size: 64 * 1024,
            max_body_size: 10 * 1024 * 1024,
        }
    }
}

/// Settings for the upstream-streaming demo route.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Plain-HTTP base URL requests are forwarded to
    pub upstream: String,
    /// Target prefix routed to the upstream; stripped before forwarding
    pub prefix: String,
    pub read_chunk_size: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            upstream: "http://httpbin.org".to_string(),
            prefix: "/httpbin".to_string(),
            read_chunk_size: 1024,
        }
    }
}

impl Config {
    /// Loads configuration from the environment.
    ///
    /// Starts from defaults, reads the YAML file named by `HTTPWIRE_CONFIG`
    /// if set, then applies `LISTEN`.
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Ok(listen_addr) = std::env::var(LISTEN_ENV) {
            cfg.server.listen_addr = listen_addr;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let cfg: Config = serde_yaml::from_str(yaml)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let parser = &self.parser;
        if parser.initial_buffer_size == 0 || parser.max_buffer_size == 0 {
            return Err(ConfigError::Invalid(
                "parser buffer sizes must be non-zero".to_string(),
            ));
        }
        if parser.initial_buffer_size > parser.max_buffer_size {
            return Err(ConfigError::Invalid(format!(
                "parser.initial_buffer_size ({}) exceeds parser.max_buffer_size ({})",
                parser.initial_buffer_size, parser.max_buffer_size
            )));
        }
        if self.proxy.read_chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "proxy.read_chunk_size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
