//! Environment configuration, read once at startup.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::domain::CategoryPolicy;
use crate::CardiolensError;

pub const BIND_ADDR_ENV: &str = "CARDIOLENS_BIND_ADDR";
pub const MODEL_DIR_ENV: &str = "CARDIOLENS_MODEL_DIR";
pub const STRICT_CATEGORIES_ENV: &str = "CARDIOLENS_STRICT_CATEGORIES";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
pub const DEFAULT_MODEL_DIR: &str = "models";

/// Truthy values: `1`, `true`, `TRUE`, `yes`, `YES`.
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES")
}

/// Read a boolean flag; unset means `false`.
#[must_use]
pub fn parse_bool_env(name: &str) -> bool {
    std::env::var(name).map(|v| parse_bool(&v)).unwrap_or(false)
}

/// Settings of the serving process.
#[derive(Debug, Clone, PartialEq)]
pub struct ServeConfig {
    pub bind_addr: SocketAddr,
    pub model_dir: PathBuf,
    pub category_policy: CategoryPolicy,
}

impl ServeConfig {
    /// # Errors
    /// Returns `CardiolensError::Config` if the bind address does not parse.
    pub fn from_env() -> Result<Self, CardiolensError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns `CardiolensError::Config` if the bind address does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CardiolensError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_addr = lookup(BIND_ADDR_ENV).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr.parse().map_err(|e| {
            CardiolensError::Config(format!(
                "{BIND_ADDR_ENV}={raw_addr:?} is not a socket address: {e}"
            ))
        })?;
        let model_dir = lookup(MODEL_DIR_ENV)
            .map_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR), PathBuf::from);
        let category_policy = if lookup(STRICT_CATEGORIES_ENV).is_some_and(|v| parse_bool(&v)) {
            CategoryPolicy::Strict
        } else {
            CategoryPolicy::Lenient
        };

        Ok(Self {
            bind_addr,
            model_dir,
            category_policy,
        })
    }
}
