//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! keystore blob + passphrase
//!     → keystore.rs (decrypt → Identity)
//!     → client.rs (balance, nonce, gas price over JSON-RPC with timeouts)
//!     → transaction.rs (build the vote() request)
//!     → wallet.rs (sign)
//!     → client.rs (broadcast, wait for receipt)
//! ```
//!
//! # Security Constraints
//! - Private keys only from an encrypted keystore
//! - Never log private keys, passphrases or decrypted material
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod keystore;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{BlockchainClient, LedgerClient};
pub use keystore::{KeySource, KeystoreError};
pub use transaction::{SignedTransaction, VoteRequest, VoteTxBuilder};
pub use types::{BlockchainError, BlockchainResult, NetworkState, Receipt};
pub use wallet::Identity;
