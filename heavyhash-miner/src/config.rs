//! Miner configuration.
//!
//! Parses environment variables. Only the reward address is required;
//! everything else has a default suited to a node on the local machine.
//!
//! # Environment Variables
//!
//! - `HEAVYHASH_NODE_ADDR`: node address as `host:port` (default: `127.0.0.1:16110`)
//! - `HEAVYHASH_PAY_ADDRESS`: address receiving block rewards (required)
//! - `HEAVYHASH_EXTRA_DATA`: tag embedded in requested templates
//!   (default: `heavyhash-miner/<version>`)
//! - `HEAVYHASH_MINE_WHEN_NOT_SYNCED`: mine templates from an unsynced node
//!   (default: false)
//! - `HEAVYHASH_BATCH_SIZE`: nonces per batch (default: 10)
//! - `HEAVYHASH_QUEUE_CAPACITY`: outbound queue depth (default: 4)
//! - `HEAVYHASH_CREDIT_LIMIT`: requests allowed in flight (default: 190)
//! - `HEAVYHASH_HASHRATE_INTERVAL_SECS`: hashrate report period (default: 10)
//!
//! Numeric values below one are raised to one. Unparseable values fall back
//! to the default with a warning.

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::tracing::prelude::*;

pub const DEFAULT_NODE_ADDR: &str = "127.0.0.1:16110";
pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_QUEUE_CAPACITY: usize = 4;
pub const DEFAULT_CREDIT_LIMIT: usize = 190;
pub const DEFAULT_HASHRATE_INTERVAL_SECS: u64 = 10;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("HEAVYHASH_PAY_ADDRESS is not set")]
    MissingPayAddress,

    #[error("Invalid pay address {0:?}: expected <prefix>:<payload>")]
    InvalidPayAddress(String),
}

/// Runtime configuration parsed from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub node_addr: String,
    pub pay_address: String,
    pub extra_data: String,

    /// Mine templates even when the node reports it is not synced.
    pub mine_when_not_synced: bool,

    pub batch_size: usize,
    pub queue_capacity: usize,
    pub credit_limit: usize,
    pub hashrate_interval: Duration,
}

impl Config {
    /// Parse configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let pay_address = env::var("HEAVYHASH_PAY_ADDRESS")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingPayAddress)?;
        validate_pay_address(&pay_address)?;

        let node_addr = env::var("HEAVYHASH_NODE_ADDR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_NODE_ADDR.to_string());

        let extra_data =
            env::var("HEAVYHASH_EXTRA_DATA").unwrap_or_else(|_| default_extra_data());

        Ok(Self {
            node_addr,
            pay_address,
            extra_data,
            mine_when_not_synced: parse_flag("HEAVYHASH_MINE_WHEN_NOT_SYNCED", false),
            batch_size: parse_count("HEAVYHASH_BATCH_SIZE", DEFAULT_BATCH_SIZE),
            queue_capacity: parse_count("HEAVYHASH_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY),
            credit_limit: parse_count("HEAVYHASH_CREDIT_LIMIT", DEFAULT_CREDIT_LIMIT),
            hashrate_interval: Duration::from_secs(parse_count(
                "HEAVYHASH_HASHRATE_INTERVAL_SECS",
                DEFAULT_HASHRATE_INTERVAL_SECS as usize,
            ) as u64),
        })
    }
}

fn default_extra_data() -> String {
    format!("heavyhash-miner/{}", env!("CARGO_PKG_VERSION"))
}

fn validate_pay_address(address: &str) -> Result<(), ConfigError> {
    match address.split_once(':') {
        Some((prefix, payload)) if !prefix.is_empty() && !payload.is_empty() => Ok(()),
        _ => Err(ConfigError::InvalidPayAddress(address.to_string())),
    }
}

fn parse_count(var: &str, default: usize) -> usize {
    let Ok(val) = env::var(var) else {
        return default;
    };
    match val.trim().parse::<usize>() {
        Ok(v) => v.max(1),
        Err(_) => {
            warn!(value = %val, "Invalid {}, using default {}", var, default);
            default
        }
    }
}

fn parse_flag(var: &str, default: bool) -> bool {
    let Ok(val) = env::var(var) else {
        return default;
    };
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!(value = %val, "Invalid {}, using default {}", var, default);
            default
        }
    }
}
