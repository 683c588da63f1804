use std::{
    env::{self, VarError},
    str::FromStr,
    time::Duration,
};
use tracing::Level;

pub mod routes;
pub mod secret;
pub mod test_cases;

// ############################################
// ################## CONFIG ##################
// ############################################

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_COMBINATIONS: u64 = 1_000_000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub log_level: Level,
    /// Upper bound on the number of subsets a single search may evaluate
    pub max_combinations: u64,
    pub request_timeout: Duration,
}

impl Config {
    pub fn parse_environment() -> Result<Config, anyhow::Error> {
        let mut errors: Vec<String> = vec![];
        let port = match parse_env_variable("PORT") {
            Ok(v) => v.unwrap_or(DEFAULT_PORT),
            Err(e) => {
                errors.push(e.to_string());
                DEFAULT_PORT
            }
        };
        // `LOG_LEVEL` has priority over `RUST_LOG`
        let log_level = match parse_env_variable::<Level>("LOG_LEVEL") {
            Ok(v) => v
                .or_else(|| parse_env_variable::<Level>("RUST_LOG").unwrap_or(None))
                .unwrap_or(Level::INFO),
            Err(e) => {
                errors.push(e.to_string());
                Level::INFO
            }
        };

        let max_combinations = match parse_env_variable::<u64>("MAX_COMBINATIONS") {
            Ok(Some(0)) => {
                errors.push("[MAX_COMBINATIONS]: must be greater than zero".to_string());
                DEFAULT_MAX_COMBINATIONS
            }
            Ok(v) => v.unwrap_or(DEFAULT_MAX_COMBINATIONS),
            Err(e) => {
                errors.push(e.to_string());
                DEFAULT_MAX_COMBINATIONS
            }
        };

        let request_timeout = match parse_env_variable::<u64>("REQUEST_TIMEOUT_SECS") {
            Ok(v) => Duration::from_secs(v.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)),
            Err(e) => {
                errors.push(e.to_string());
                Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
            }
        };

        if !errors.is_empty() {
            return Err(anyhow::anyhow!(errors.join(", ")));
        }

        Ok(Config {
            port,
            log_level,
            max_combinations,
            request_timeout,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            log_level: Level::INFO,
            max_combinations: DEFAULT_MAX_COMBINATIONS,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

fn parse_env_variable<T>(key: &str) -> Result<Option<T>, anyhow::Error>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    fn map_err<E>(key: &str, e: E) -> anyhow::Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        anyhow::anyhow!("[{key}]: {e}")
    }

    let env_value = match env::var(key) {
        Ok(v) => {
            if v.is_empty() {
                Ok(None)
            } else {
                Ok(Some(v))
            }
        }
        Err(e) => {
            if e == VarError::NotPresent {
                Ok(None)
            } else {
                Err(map_err(key, e))
            }
        }
    }?;
    env_value
        .map(|v| v.parse::<T>().map_err(|e| map_err(key, e)))
        .transpose()
}
