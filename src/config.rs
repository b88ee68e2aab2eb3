use std::path::PathBuf;

use crate::errors::AppError;
use crate::jwt::JwtConfig;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Everything the process needs to know at startup.
///
/// Built once in `main` and handed to [`crate::create_app`]; request handling
/// never reads the environment itself.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub tls: Option<TlsConfig>,
}

#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| AppError::configuration("DATABASE_URL not set"))?;
        let jwt = JwtConfig::from_env()?;

        let upload_dir = std::env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_UPLOAD_DIR));

        let max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        let port = parse_var("APP_PORT", DEFAULT_PORT)?;

        let tls = match (std::env::var("TLS_CERT_PATH"), std::env::var("TLS_KEY_PATH")) {
            (Ok(cert), Ok(key)) => Some(TlsConfig {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            }),
            (Err(_), Err(_)) => None,
            _ => {
                return Err(AppError::configuration(
                    "TLS_CERT_PATH and TLS_KEY_PATH must be set together",
                ))
            }
        };

        Ok(Self {
            database_url,
            jwt,
            upload_dir,
            max_upload_bytes,
            port,
            tls,
        })
    }

    /// Configuration with defaults for everything except the secrets and paths
    /// a caller has to choose. Used by the CLI and by tests.
    pub fn new(database_url: impl Into<String>, jwt: JwtConfig, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            database_url: database_url.into(),
            jwt,
            upload_dir: upload_dir.into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            port: DEFAULT_PORT,
            tls: None,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::configuration(format!("{name} must be a valid number"))),
        Err(_) => Ok(default),
    }
}
