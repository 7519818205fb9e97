// Runtime configuration for the indexer binary:
// - ledger RPC endpoint and request timeout
// - database connection string and pool size
// - page size used when walking paginated listings
// - optional height range to index

use std::{env, str::FromStr, time::Duration};

use dotenv::dotenv;
use thiserror::Error;

use crate::application::PaginatingFetcher;

const DEFAULT_RPC_URL: &str = "http://localhost:8081";
const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_PER_PAGE: u32 = PaginatingFetcher::DEFAULT_PER_PAGE;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rpc_url: String,
    pub rpc_timeout: Duration,
    pub db_max_connections: u32,
    pub per_page: u32,
    /// First height to index. `None` resumes after the highest stored block.
    pub from_height: Option<i64>,
    /// Last height to index. `None` means the current ledger height.
    pub to_height: Option<i64>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let Some(database_url) = lookup("DATABASE_URL") else {
            return Err(ConfigError::Missing("DATABASE_URL"));
        };
        let rpc_url = lookup("POCKET_RPC_URL")
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        let rpc_timeout_secs = parse_or(&lookup, "RPC_TIMEOUT_SECS", DEFAULT_RPC_TIMEOUT_SECS)?;
        let db_max_connections =
            parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?;
        let per_page = parse_or(&lookup, "INDEX_PER_PAGE", DEFAULT_PER_PAGE)?;
        let from_height = parse(&lookup, "INDEX_FROM_HEIGHT")?;
        let to_height = parse(&lookup, "INDEX_TO_HEIGHT")?;

        Ok(Self {
            database_url,
            rpc_url,
            rpc_timeout: Duration::from_secs(rpc_timeout_secs),
            db_max_connections,
            per_page,
            from_height,
            to_height,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: FromStr,
{
    Ok(parse(lookup, key)?.unwrap_or(default))
}

fn parse<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
