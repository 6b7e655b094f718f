//! Centralized configuration (environment variables + defaults).

use anyhow::Context;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8001";
pub const DEFAULT_RPC_URL: &str = "https://data-seed-prebsc-1-s1.binance.org:8545/";
pub const DEFAULT_CHAIN_ID: u64 = 97;
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";
/// One year.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub bind_addr: String,
    /// `None` disables the chain gateway (set `WEB3_PROVIDER_URL=` to empty).
    pub web3_provider_url: Option<String>,
    pub chain_id: u64,
    pub event_factory_address: Option<String>,
    pub deployment_file: PathBuf,
    pub session_ttl_hours: i64,
}

impl Config {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage = match lookup("STORAGE").as_deref().map(str::trim) {
            None | Some("") | Some("postgres") => StorageBackend::Postgres,
            Some("memory") => StorageBackend::Memory,
            Some(other) => anyhow::bail!("STORAGE must be 'postgres' or 'memory' (got '{}')", other),
        };

        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        if storage == StorageBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when STORAGE=postgres");
        }

        let db_max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", 5u32)?.max(1);
        let chain_id = parse_or(&lookup, "CHAIN_ID", DEFAULT_CHAIN_ID)?;
        let session_ttl_hours = parse_or(&lookup, "SESSION_TTL_HOURS", 24i64)?;
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&session_ttl_hours) {
            anyhow::bail!(
                "SESSION_TTL_HOURS must be between 1 and {} (got {})",
                MAX_SESSION_TTL_HOURS,
                session_ttl_hours
            );
        }

        let web3_provider_url = match lookup("WEB3_PROVIDER_URL") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(v.trim().to_string()),
            None => Some(DEFAULT_RPC_URL.to_string()),
        };

        let deployment_file = lookup("DEPLOYMENT_FILE")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "deployment.json".to_string());

        Ok(Self {
            storage,
            database_url,
            db_max_connections,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            web3_provider_url,
            chain_id,
            event_factory_address: lookup("EVENT_FACTORY_ADDRESS").filter(|v| !v.trim().is_empty()),
            deployment_file: PathBuf::from(shellexpand::tilde(&deployment_file).to_string()),
            session_ttl_hours,
        })
    }

    pub fn database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set")
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number (got '{}')", key, v)),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn postgres_requires_database_url() {
        assert!(config(&[]).is_err());
        let c = config(&[("DATABASE_URL", "postgres://localhost/banka")]).unwrap();
        assert_eq!(c.storage, StorageBackend::Postgres);
        assert_eq!(c.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(c.chain_id, 97);
        assert_eq!(c.web3_provider_url.as_deref(), Some(DEFAULT_RPC_URL));
    }

    #[test]
    fn memory_backend_needs_no_database() {
        let c = config(&[("STORAGE", "memory"), ("WEB3_PROVIDER_URL", "")]).unwrap();
        assert_eq!(c.storage, StorageBackend::Memory);
        assert!(c.web3_provider_url.is_none());
        assert!(c.database_url().is_err());
    }

    #[test]
    fn rejects_bad_numbers_and_backends() {
        assert!(config(&[("STORAGE", "mongo")]).is_err());
        assert!(config(&[("STORAGE", "memory"), ("CHAIN_ID", "bnb")]).is_err());
        assert!(config(&[("STORAGE", "memory"), ("SESSION_TTL_HOURS", "0")]).is_err());
    }

    #[test]
    fn session_ttl_is_capped_at_a_year() {
        let c = config(&[("STORAGE", "memory"), ("SESSION_TTL_HOURS", "8760")]).unwrap();
        assert_eq!(c.session_ttl_hours, MAX_SESSION_TTL_HOURS);
        assert!(config(&[("STORAGE", "memory"), ("SESSION_TTL_HOURS", "8761")]).is_err());
        assert!(config(&[("STORAGE", "memory"), ("SESSION_TTL_HOURS", "3000000000")]).is_err());
    }
}
