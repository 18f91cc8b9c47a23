/// Client configuration
///
/// Resolved once at startup from flags, environment and an optional `.env`
/// file, then handed to the engine by value.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_OUTPUT_PATH: &str = "outdump.json";
pub const DEFAULT_LOG_PATH: &str = "logdump.txt";
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 3;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read configuration file {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: dotenvy::Error,
    },

    #[error("invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub output_path: PathBuf,
    pub log_path: PathBuf,
    pub connect_attempts: u32,
    /// `None` blocks reads until data or close
    pub read_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            read_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "host",
                reason: "must not be empty".into(),
            });
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "output_path",
                reason: "must not be empty".into(),
            });
        }
        if self.connect_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "connect_attempts",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Parser)]
#[command(version, about = "BetaCrew exchange client: replay, gap recovery, JSON dump")]
pub struct Args {
    /// Exchange host name or IP address
    #[arg(long, env = "BETACREW_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Exchange TCP port; falls back to 3000 when missing or unparseable
    #[arg(long, env = "BETACREW_PORT")]
    pub port: Option<String>,

    /// JSON output file
    #[arg(long, env = "BETACREW_OUTPUT", default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Diagnostic log file, truncated on startup
    #[arg(long, env = "BETACREW_LOG", default_value = DEFAULT_LOG_PATH)]
    pub log_file: PathBuf,

    /// Connect attempts per session
    #[arg(long, env = "BETACREW_CONNECT_ATTEMPTS", default_value_t = DEFAULT_CONNECT_ATTEMPTS)]
    pub connect_attempts: u32,

    /// Read timeout in milliseconds; 0 or unset blocks indefinitely
    #[arg(long, env = "BETACREW_READ_TIMEOUT_MS")]
    pub read_timeout_ms: Option<u64>,
}

/// A validated config plus warnings raised while resolving it.
///
/// Resolution runs before logging exists, so warnings are carried out and
/// logged by the caller once the subscriber is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub config: ClientConfig,
    pub warnings: Vec<String>,
}

impl Args {
    pub fn into_config(self) -> Result<ResolvedConfig, ConfigError> {
        let mut warnings = Vec::new();
        let (port, port_warning) = parse_port(self.port.as_deref());
        warnings.extend(port_warning);

        let config = ClientConfig {
            host: self.host,
            port,
            output_path: self.output,
            log_path: self.log_file,
            connect_attempts: self.connect_attempts,
            read_timeout: self
                .read_timeout_ms
                .filter(|&ms| ms > 0)
                .map(Duration::from_millis),
        };
        config.validate()?;
        Ok(ResolvedConfig { config, warnings })
    }
}

/// Port from its raw text, or the default when absent or not a valid port.
/// A present but unparseable value also yields a warning message.
pub fn parse_port(raw: Option<&str>) -> (u16, Option<String>) {
    match raw.map(str::trim) {
        None | Some("") => (DEFAULT_PORT, None),
        Some(text) => match text.parse() {
            Ok(port) => (port, None),
            Err(_) => (
                DEFAULT_PORT,
                Some(format!("unparseable port {:?}, using default {}", text, DEFAULT_PORT)),
            ),
        },
    }
}

/// Log file to use when configuration could not be resolved
pub fn fallback_log_path() -> PathBuf {
    log_path_or_default(std::env::var_os("BETACREW_LOG"))
}

fn log_path_or_default(raw: Option<OsString>) -> PathBuf {
    raw.filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH))
}

/// Variable naming an env file to load instead of `./.env`
pub const ENV_FILE_VAR: &str = "BETACREW_ENV_FILE";

/// Load `$BETACREW_ENV_FILE` if set, otherwise `.env` from the working
/// directory if one exists
pub fn load_env() -> Result<(), ConfigError> {
    if let Some(path) = std::env::var_os(ENV_FILE_VAR) {
        return load_env_file(Path::new(&path));
    }
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(source) => Err(ConfigError::Unreadable {
            path: ".env".into(),
            source,
        }),
    }
}

/// Load an explicit env file; unlike `load_env`, a missing file is an error
pub fn load_env_file(path: &Path) -> Result<(), ConfigError> {
    dotenvy::from_path(path).map_err(|source| ConfigError::Unreadable {
        path: path.display().to_string(),
        source,
    })
}
