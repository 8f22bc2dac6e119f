use crate::error::ConfigError;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Password used when neither `ADMIN_PASSWORD_HASH` nor `ADMIN_PASSWORD` is set.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin_password";

/// How the administrator's password is supplied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdminSecret {
    /// Plaintext, hashed once at startup.
    Password(String),
    /// A pre-computed argon2 PHC string.
    Hash(String),
}

/// Runtime configuration, read from the environment
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory scanned for exam workbooks on every request
    pub data_dir: PathBuf,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub admin_username: String,
    pub admin_secret: AdminSecret,
    pub session_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            static_dir: PathBuf::from("static"),
            host: "0.0.0.0".to_string(),
            port: 5000,
            admin_username: "admin".to_string(),
            admin_secret: AdminSecret::Password(DEFAULT_ADMIN_PASSWORD.to_string()),
            session_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source; unset variables keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        let admin_secret = match (lookup("ADMIN_PASSWORD_HASH"), lookup("ADMIN_PASSWORD")) {
            (Some(hash), _) => AdminSecret::Hash(hash),
            (None, Some(password)) => AdminSecret::Password(password),
            (None, None) => {
                log::warn!(
                    "ADMIN_PASSWORD is not set; falling back to the default admin password"
                );
                default.admin_secret
            }
        };

        Ok(Self {
            data_dir: lookup("EXAM_DATA_DIR").map(PathBuf::from).unwrap_or(default.data_dir),
            static_dir: lookup("STATIC_DIR").map(PathBuf::from).unwrap_or(default.static_dir),
            host: lookup("HOST").unwrap_or(default.host),
            port: parse_var(&lookup, "PORT")?.unwrap_or(default.port),
            admin_username: lookup("ADMIN_USERNAME").unwrap_or(default.admin_username),
            admin_secret,
            session_ttl: parse_var(&lookup, "SESSION_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(default.session_ttl),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(value) = lookup(name) else {
        return Ok(None);
    };

    let parsed: Option<T> = value.trim().parse().ok();
    match parsed {
        Some(parsed) => Ok(Some(parsed)),
        None => Err(ConfigError::InvalidValue { name, value }),
    }
}
