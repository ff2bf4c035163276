//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, delay bounds ordered)
//! - Check endpoint URLs and bind addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: VoterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::VoterConfig;

/// Upper bound on the gas price margin, in percent.
pub const MAX_PRICE_MARGIN_PERCENT: u64 = 1000;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid RPC URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("schedule.min_delay_secs ({min}) exceeds schedule.max_delay_secs ({max})")]
    DelayRange { min: u64, max: u64 },

    #[error("gas.price_margin_percent ({0}) exceeds {MAX_PRICE_MARGIN_PERCENT}")]
    MarginTooLarge(u64),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &VoterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for url in std::iter::once(&config.rpc.url).chain(&config.rpc.failover_urls) {
        if let Err(e) = url.parse::<url::Url>() {
            errors.push(ValidationError::InvalidUrl {
                url: url.clone(),
                reason: e.to_string(),
            });
        }
    }

    if config.rpc.timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "rpc.timeout_secs" });
    }

    if config.gas.limit == 0 {
        errors.push(ValidationError::Zero { field: "gas.limit" });
    }
    if config.gas.price_margin_percent > MAX_PRICE_MARGIN_PERCENT {
        errors.push(ValidationError::MarginTooLarge(config.gas.price_margin_percent));
    }

    let schedule = &config.schedule;
    if schedule.min_delay_secs > schedule.max_delay_secs {
        errors.push(ValidationError::DelayRange {
            min: schedule.min_delay_secs,
            max: schedule.max_delay_secs,
        });
    }

    let confirmation = &config.confirmation;
    if confirmation.timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "confirmation.timeout_secs" });
    }
    if confirmation.poll_interval_ms == 0 {
        errors.push(ValidationError::Zero { field: "confirmation.poll_interval_ms" });
    }
    if confirmation.blocks == 0 {
        errors.push(ValidationError::Zero { field: "confirmation.blocks" });
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(observability.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
