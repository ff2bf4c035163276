//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a voting run.
//! All types derive Serde traits for deserialization from config files.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// Root configuration for a voting run.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct VoterConfig {
    /// RPC endpoint settings.
    pub rpc: RpcConfig,

    /// Target contract.
    pub contract: ContractConfig,

    /// Gas pricing policy.
    pub gas: GasConfig,

    /// Inter-cycle delay range.
    pub schedule: ScheduleConfig,

    /// Receipt polling settings.
    pub confirmation: ConfirmationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// JSON-RPC endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Primary JSON-RPC endpoint URL.
    pub url: String,

    /// Failover JSON-RPC endpoint URLs, tried in order on transport errors.
    pub failover_urls: Vec<String>,

    /// Chain ID used for EIP-155 signing. Fetched from the node when unset.
    pub chain_id: Option<u64>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: None,
            timeout_secs: 10,
        }
    }
}

/// Target contract configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ContractConfig {
    /// Address exposing `vote()`. Prompted for when unset.
    pub address: Option<Address>,
}

/// Gas pricing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GasConfig {
    /// Fixed gas limit for every vote transaction.
    pub limit: u64,

    /// Margin added on top of the node's gas price, in percent.
    pub price_margin_percent: u64,

    /// Optional ceiling on the margined gas price, in gwei.
    pub max_gas_price_gwei: Option<u64>,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            limit: 200_000,
            price_margin_percent: 5,
            max_gas_price_gwei: None,
        }
    }
}

/// Inter-cycle delay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Lower bound of the delay range in seconds (inclusive).
    pub min_delay_secs: u64,

    /// Upper bound of the delay range in seconds (inclusive).
    pub max_delay_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: 30,
            max_delay_secs: 60,
        }
    }
}

/// Confirmation wait configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Maximum time to wait for a receipt, in seconds.
    pub timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Blocks required for a receipt to count (1 = included).
    pub blocks: u32,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            poll_interval_ms: 2000,
            blocks: 1,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
