/// 환경 변수 기반 설정
// region:    --- Imports
use std::env;
use std::str::FromStr;

// endregion: --- Imports

// region:    --- Config
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("환경 변수 {0}가 필요합니다")]
    Missing(&'static str),

    #[error("환경 변수 {name} 값이 올바르지 않습니다: {value}")]
    Invalid { name: &'static str, value: String },
}

/// 저장소 구현 선택
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::Invalid {
                name: "STORE_BACKEND",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub reset: bool,
}

#[derive(Debug, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    pub topic: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: StoreBackend,
    pub database: Option<DatabaseConfig>,
    pub kafka: Option<KafkaConfig>,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 조회 함수 기반 로드
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("STORE_BACKEND") {
            Some(value) => value.parse()?,
            None => StoreBackend::Postgres,
        };

        let database = match backend {
            StoreBackend::Postgres => {
                let url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
                Some(DatabaseConfig {
                    url,
                    max_connections: parse_or("DATABASE_MAX_CONNECTIONS", &lookup, 5)?,
                    reset: parse_or("RESET_DATABASE", &lookup, false)?,
                })
            }
            StoreBackend::Memory => None,
        };

        let kafka = lookup("KAFKA_BROKERS").map(|brokers| KafkaConfig {
            brokers,
            topic: lookup("MARKET_EVENTS_TOPIC").unwrap_or_else(|| "market-events".to_string()),
        });

        Ok(Config {
            backend,
            database,
            kafka,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        })
    }
}

fn parse_or<F, T>(name: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

// endregion: --- Config

// endregion: --- Tests
