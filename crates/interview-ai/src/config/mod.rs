use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::workflows::interview::domain::Difficulty;

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
    pub generator: GeneratorConfig,
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

        let base_url =
            env::var("GENERATOR_URL").unwrap_or_else(|_| "http://127.0.0.1:9400".to_string());
        let timeout_secs = env::var("GENERATOR_TIMEOUT_SECS")
            .unwrap_or_else(|_| "20".to_string())
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidGeneratorTimeout)?;
        let question_count = env::var("GENERATOR_QUESTION_COUNT")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidQuestionCount)?;
        let difficulty = parse_difficulty(
            &env::var("GENERATOR_DIFFICULTY").unwrap_or_else(|_| "medium".to_string()),
        )?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            generator: GeneratorConfig {
                base_url,
                timeout_secs,
                question_count,
                difficulty,
            },
        })
    }
}

fn parse_difficulty(raw: &str) -> Result<Difficulty, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "easy" => Ok(Difficulty::Easy),
        "medium" => Ok(Difficulty::Medium),
        "hard" => Ok(Difficulty::Hard),
        _ => Err(ConfigError::InvalidDifficulty {
            value: raw.to_string(),
        }),
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

/// Connection settings for the hosted question/feedback generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub question_count: usize,
    pub difficulty: Difficulty,
}

impl GeneratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidGeneratorTimeout,
    InvalidQuestionCount,
    InvalidDifficulty { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidGeneratorTimeout => {
                write!(f, "GENERATOR_TIMEOUT_SECS must be a positive integer")
            }
            ConfigError::InvalidQuestionCount => {
                write!(f, "GENERATOR_QUESTION_COUNT must be a positive integer")
            }
            ConfigError::InvalidDifficulty { value } => {
                write!(
                    f,
                    "GENERATOR_DIFFICULTY '{value}' is not one of easy, medium, hard"
                )
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
