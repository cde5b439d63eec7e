use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub lifecycle: LifecycleConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("STAFFLINE_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("STAFFLINE_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("STAFFLINE_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("STAFFLINE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let expiry_warning_days = env::var("STAFFLINE_EXPIRY_WARNING_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse::<i64>()
            .ok()
            .filter(|days| *days >= 0)
            .ok_or(ConfigError::InvalidExpiryWindow)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            lifecycle: LifecycleConfig {
                expiry_warning_days,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Dials for the lifecycle core consumed by the service shell.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Window, in days, used when listing penalizations nearing expiry.
    pub expiry_warning_days: i64,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidExpiryWindow,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "STAFFLINE_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "STAFFLINE_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidExpiryWindow => {
                write!(
                    f,
                    "STAFFLINE_EXPIRY_WARNING_DAYS must be a non-negative number of days"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidExpiryWindow => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
