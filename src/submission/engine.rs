//! One submit-and-confirm cycle.
//!
//! # States
//! ```text
//! CheckBalance → FetchNonce → PriceGas → Build → Sign → Broadcast → AwaitConfirmation → Done
//!       └──────────────┴───────────┴────────┴───────┴─────────┴─────────────┴──→ Failed
//! ```
//!
//! Every step reads fresh chain state; nothing is cached between cycles. A
//! failure at any step ends the cycle with the originating cause attached and
//! is never retried here.

use std::fmt;
use std::sync::Arc;

use alloy::primitives::utils::{format_ether, format_units};
use alloy::primitives::{Address, U256};
use thiserror::Error;
use tracing::Instrument;

use crate::blockchain::{
    BlockchainError, Identity, LedgerClient, NetworkState, Receipt, VoteTxBuilder,
};
use crate::observability::metrics;

/// Step of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    CheckBalance,
    FetchNonce,
    PriceGas,
    Build,
    Sign,
    Broadcast,
    AwaitConfirmation,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckBalance => "balance check",
            Self::FetchNonce => "nonce fetch",
            Self::PriceGas => "gas pricing",
            Self::Build => "build",
            Self::Sign => "sign",
            Self::Broadcast => "broadcast",
            Self::AwaitConfirmation => "confirmation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a cycle ended in `Failed`.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("balance check failed: account {address} has no funds to pay network fees")]
    InsufficientFunds { address: Address },

    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: BlockchainError,
    },
}

impl CycleError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::InsufficientFunds { .. } => Stage::CheckBalance,
            Self::Stage { stage, .. } => *stage,
        }
    }
}

fn at(stage: Stage) -> impl FnOnce(BlockchainError) -> CycleError {
    move |source| CycleError::Stage { stage, source }
}

/// Terminal result of one cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    Confirmed(Receipt),
    Failed(CycleError),
}

impl CycleOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        match self {
            Self::Confirmed(receipt) => Some(receipt),
            Self::Failed(_) => None,
        }
    }
}

/// Drives single vote cycles for one identity.
pub struct SubmissionEngine<C> {
    client: Arc<C>,
    identity: Identity,
    builder: VoteTxBuilder,
}

impl<C: LedgerClient> SubmissionEngine<C> {
    pub fn new(client: Arc<C>, identity: Identity, builder: VoteTxBuilder) -> Self {
        Self {
            client,
            identity,
            builder,
        }
    }

    pub fn address(&self) -> Address {
        self.identity.address()
    }

    /// Run one cycle. Never fails outright; errors come back as [`CycleOutcome::Failed`].
    pub async fn submit(&self, cycle: u32) -> CycleOutcome {
        let span = tracing::info_span!("cycle", cycle, address = %self.identity.address());

        match self.run_cycle().instrument(span).await {
            Ok(receipt) => {
                tracing::info!(
                    cycle,
                    tx_hash = %receipt.tx_hash,
                    block = receipt.block_number,
                    gas_used = receipt.gas_used,
                    "Vote confirmed"
                );
                metrics::record_cycle(true);
                CycleOutcome::Confirmed(receipt)
            }
            Err(e) => {
                tracing::warn!(cycle, stage = %e.stage(), error = %e, "Vote failed");
                metrics::record_cycle(false);
                metrics::record_cycle_failure(e.stage().as_str());
                CycleOutcome::Failed(e)
            }
        }
    }

    async fn run_cycle(&self) -> Result<Receipt, CycleError> {
        let address = self.identity.address();

        let balance = self.client.balance(address).await.map_err(at(Stage::CheckBalance))?;
        tracing::info!(balance_wei = %balance, balance = %format_ether(balance), "Account balance");
        if balance.is_zero() {
            return Err(CycleError::InsufficientFunds { address });
        }

        let nonce = self.client.nonce(address).await.map_err(at(Stage::FetchNonce))?;
        tracing::info!(nonce, "Current nonce");

        let base_gas_price = self.client.base_gas_price().await.map_err(at(Stage::PriceGas))?;
        let state = NetworkState {
            balance,
            nonce,
            base_gas_price,
        };
        let gas_price = self
            .builder
            .price_gas(state.base_gas_price)
            .map_err(at(Stage::PriceGas))?;
        tracing::info!(
            base_gas_price = state.base_gas_price,
            gas_price_gwei = %gwei(gas_price),
            "Gas price suggested"
        );

        let request = self.builder.build(address, state.nonce, gas_price);
        let max_fee = request.max_fee();
        if max_fee > state.balance {
            return Err(at(Stage::Build)(BlockchainError::InsufficientFundsForFee {
                required: max_fee,
                available: state.balance,
            }));
        }
        tracing::info!(
            contract = %self.builder.contract(),
            gas_limit = request.gas_limit,
            estimated_fee = %format_ether(max_fee),
            "Transaction built"
        );

        let signed = self.identity.sign(request).await.map_err(at(Stage::Sign))?;
        tracing::info!(tx_hash = %signed.tx_hash, nonce = signed.nonce, "Transaction signed");

        let tx_hash = self.client.broadcast(&signed).await.map_err(at(Stage::Broadcast))?;
        tracing::info!(tx_hash = %tx_hash, "Transaction broadcast, awaiting confirmation");

        self.client
            .wait_for_receipt(tx_hash)
            .await
            .map_err(at(Stage::AwaitConfirmation))
    }
}

fn gwei(wei: u128) -> String {
    format_units(U256::from(wei), "gwei").unwrap_or_else(|_| format!("{wei} wei"))
}
