//! Chain-specific types and error definitions.

use alloy::primitives::{Address, TxHash, B256, U256};
use alloy::transports::TransportError;
use thiserror::Error;

// Re-export endpoint settings from config module to avoid duplication
pub use crate::config::schema::{ConfirmationConfig, RpcConfig};

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// Endpoint unreachable or transport failure. Transient.
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The node answered with a JSON-RPC error (insufficient funds, nonce conflict, ...).
    #[error("remote rejected: {0}")]
    RemoteRejected(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// No receipt within the confirmation window.
    #[error("transaction {tx_hash} not confirmed within {secs} seconds")]
    ConfirmationTimeout { tx_hash: TxHash, secs: u64 },

    /// Transaction was included but reverted.
    #[error("transaction {tx_hash} reverted in block {block_number}")]
    Reverted { tx_hash: TxHash, block_number: u64 },

    /// Margined gas price exceeded the configured ceiling.
    #[error("gas price {current_gwei} gwei exceeds maximum {max_gwei} gwei")]
    GasPriceTooHigh { current_gwei: u128, max_gwei: u64 },

    /// The worst-case fee of the request exceeds the account balance.
    #[error("maximum fee {required} wei exceeds balance {available} wei")]
    InsufficientFundsForFee { required: U256, available: U256 },

    /// Signing the transaction failed.
    #[error("signing failed: {0}")]
    Signing(String),
}

impl BlockchainError {
    /// Classify a transport-level error from alloy.
    ///
    /// Error responses from the node are rejections; everything else is
    /// treated as the endpoint being unavailable.
    pub fn from_transport(err: TransportError) -> Self {
        match err.as_error_resp() {
            Some(payload) => Self::RemoteRejected(payload.message.to_string()),
            None => Self::NetworkUnavailable(err.to_string()),
        }
    }

    /// Whether the node itself refused the request.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::RemoteRejected(_))
    }
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Chain state captured right before building one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkState {
    pub balance: U256,
    pub nonce: u64,
    pub base_gas_price: u128,
}

/// Proof of inclusion for a vote transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub block_hash: Option<B256>,
    pub gas_used: u64,
    pub effective_gas_price: u128,
    pub from: Address,
}
