use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::crypto::PBKDF2_ITERATIONS;
use crate::models::AppointmentCodeScheme;

/// Application-level constants
pub const APP_NAME: &str = "ClinicAdmin";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_POOL_SIZE: usize = 8;
pub const DEFAULT_TOKEN_TTL_HOURS: u32 = 24;
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
pub const DEFAULT_LOG_FILTER: &str = "clinic_admin=info,tower_http=info";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("Cannot determine home directory; set CLINIC_DATA_DIR")]
    NoHomeDir,
}

/// Runtime configuration, read from `CLINIC_*` environment variables.
#[derive(Clone, Deserialize)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub pool_size: usize,
    /// HMAC key for claim tokens. `None` means a random per-process key.
    pub token_secret: Option<String>,
    pub token_ttl_hours: u32,
    pub appointment_code: AppointmentCodeScheme,
    pub admin_password: String,
    pub password_iterations: u32,
    pub log_filter: String,
}

// Secrets stay out of logs.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("data_dir", &self.data_dir)
            .field("db_path", &self.db_path)
            .field("pool_size", &self.pool_size)
            .field("token_secret", &self.token_secret.as_ref().map(|_| "<redacted>"))
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("appointment_code", &self.appointment_code)
            .field("admin_password", &"<redacted>")
            .field("password_iterations", &self.password_iterations)
            .field("log_filter", &self.log_filter)
            .finish()
    }
}

/// Get the default data directory: ~/ClinicAdmin/
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(APP_NAME))
}

fn parse<T: FromStr>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to read variables. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = parse(
            "CLINIC_BIND_ADDR",
            get("CLINIC_BIND_ADDR"),
            SocketAddr::from(([127, 0, 0, 1], 3000)),
        )?;
        let data_dir = match get("CLINIC_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => app_data_dir()?,
        };
        let db_path = get("CLINIC_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("clinic.db"));

        let pool_size = parse("CLINIC_POOL_SIZE", get("CLINIC_POOL_SIZE"), DEFAULT_POOL_SIZE)?;
        if pool_size == 0 {
            return Err(ConfigError::Invalid {
                var: "CLINIC_POOL_SIZE",
                value: "0".into(),
            });
        }
        let token_ttl_hours = parse(
            "CLINIC_TOKEN_TTL_HOURS",
            get("CLINIC_TOKEN_TTL_HOURS"),
            DEFAULT_TOKEN_TTL_HOURS,
        )?;
        let appointment_code = parse(
            "CLINIC_APPOINTMENT_CODE",
            get("CLINIC_APPOINTMENT_CODE"),
            AppointmentCodeScheme::Daily,
        )?;
        let password_iterations = parse(
            "CLINIC_PASSWORD_ITERATIONS",
            get("CLINIC_PASSWORD_ITERATIONS"),
            PBKDF2_ITERATIONS,
        )?;
        if password_iterations == 0 {
            return Err(ConfigError::Invalid {
                var: "CLINIC_PASSWORD_ITERATIONS",
                value: "0".into(),
            });
        }

        Ok(Self {
            bind_addr,
            data_dir,
            db_path,
            pool_size,
            token_secret: get("CLINIC_TOKEN_SECRET"),
            token_ttl_hours,
            appointment_code,
            admin_password: get("CLINIC_ADMIN_PASSWORD")
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
            password_iterations,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        })
    }

    /// Configuration for tests: database under `data_dir`, fast hashing.
    pub fn for_data_dir(data_dir: PathBuf) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            db_path: data_dir.join("clinic.db"),
            data_dir,
            pool_size: 4,
            token_secret: Some("test-secret".into()),
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            appointment_code: AppointmentCodeScheme::Daily,
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            password_iterations: 1_000,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}
