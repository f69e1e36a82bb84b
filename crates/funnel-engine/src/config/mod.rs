use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

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
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            engine: EngineConfig::from_env()?,
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

/// Knobs for the reconciliation and revenue pipeline.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Reporting year the dashboard centers on; the comparison window is
    /// this year and the two before it.
    pub current_year: i32,
    /// Census term the revenue model bills against, e.g. "2026S".
    pub census_term: String,
    /// Net tuition revenue goal for the current cycle.
    pub ntr_goal: f64,
    /// How long a computed snapshot satisfies reads before recomputing.
    pub cache_ttl: Duration,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let current_year = env::var("FUNNEL_CURRENT_YEAR")
            .unwrap_or_else(|_| "2026".to_string())
            .parse::<i32>()
            .map_err(|_| ConfigError::InvalidYear)?;

        let census_term =
            env::var("FUNNEL_CENSUS_TERM").unwrap_or_else(|_| format!("{current_year}S"));

        let ntr_goal = env::var("FUNNEL_NTR_GOAL")
            .unwrap_or_else(|_| "9800000".to_string())
            .parse::<f64>()
            .map_err(|_| ConfigError::InvalidGoal)?;

        let cache_ttl_secs = env::var("FUNNEL_CACHE_TTL_SECS")
            .unwrap_or_else(|_| (3 * 60 * 60).to_string())
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidCacheTtl)?;

        Ok(Self {
            current_year,
            census_term,
            ntr_goal,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            current_year: 2026,
            census_term: "2026S".to_string(),
            ntr_goal: 9_800_000.0,
            cache_ttl: Duration::from_secs(3 * 60 * 60),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidYear,
    InvalidGoal,
    InvalidCacheTtl,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidYear => {
                write!(f, "FUNNEL_CURRENT_YEAR must be a four-digit year")
            }
            ConfigError::InvalidGoal => write!(f, "FUNNEL_NTR_GOAL must be numeric"),
            ConfigError::InvalidCacheTtl => {
                write!(f, "FUNNEL_CACHE_TTL_SECS must be a whole number of seconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
