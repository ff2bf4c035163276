//! Signing identity for the run.
//!
//! # Security
//! - Keys come only from a decrypted keystore (or a test fixture)
//! - Keys are never logged or serialized
//! - The identity is read-only once created

use alloy::eips::eip2718::Encodable2718;
use alloy::network::{Ethereum, EthereumWallet, NetworkWallet};
use alloy::primitives::{Address, Bytes};
use alloy::signers::local::PrivateKeySigner;

use crate::blockchain::transaction::{SignedTransaction, VoteRequest};
use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// A private signing key and the address derived from it.
pub struct Identity {
    wallet: EthereumWallet,
    address: Address,
}

impl Identity {
    /// Wrap an already-constructed signer.
    pub fn from_signer(signer: PrivateKeySigner) -> Self {
        let address = signer.address();
        Self {
            wallet: EthereumWallet::from(signer),
            address,
        }
    }

    /// Create an identity from a hex-encoded private key (with or without 0x prefix).
    pub fn from_private_key(private_key_hex: &str) -> BlockchainResult<Self> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);
        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::Signing(format!("Invalid private key format: {}", e)))?;
        Ok(Self::from_signer(signer))
    }

    /// Address derived from the public key.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a vote request, consuming it.
    pub async fn sign(&self, request: VoteRequest) -> BlockchainResult<SignedTransaction> {
        let nonce = request.nonce;
        let tx = request.into_transaction_request();

        let envelope = <EthereumWallet as NetworkWallet<Ethereum>>::sign_request(&self.wallet, tx)
            .await
            .map_err(|e| BlockchainError::Signing(e.to_string()))?;

        Ok(SignedTransaction {
            tx_hash: *envelope.tx_hash(),
            raw: Bytes::from(envelope.encoded_2718()),
            nonce,
        })
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
