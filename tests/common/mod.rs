//! Shared utilities for submission tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use alloy::primitives::{address, Address, TxHash, U256};
use async_trait::async_trait;

use vote_runner::blockchain::{
    BlockchainError, BlockchainResult, Identity, LedgerClient, Receipt, SignedTransaction,
    VoteTxBuilder,
};
use vote_runner::config::GasConfig;
use vote_runner::submission::{DelaySchedule, Scheduler, SubmissionEngine};

// Well-known test private key (Anvil's first account)
pub const TEST_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const CONTRACT: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
pub const ONE_ETHER: u128 = 1_000_000_000_000_000_000;

#[derive(Default)]
struct LedgerState {
    balance: U256,
    nonce: u64,
    gas_price: u128,
    block: u64,
    revert: bool,
    stall_confirmation: bool,
    reject_broadcasts: HashSet<usize>,
    unavailable_nonce_calls: HashSet<usize>,
    broadcast_attempts: usize,
    nonce_calls: usize,
    calls: Vec<&'static str>,
    broadcasts: Vec<SignedTransaction>,
    receipts: HashMap<TxHash, u64>,
}

/// Scripted in-memory ledger that records every call.
pub struct MockLedger {
    state: Mutex<LedgerState>,
}

#[allow(dead_code)]
impl MockLedger {
    pub fn with_balance(balance: u128) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                balance: U256::from(balance),
                gas_price: 1_000_000_000,
                block: 100,
                ..LedgerState::default()
            }),
        }
    }

    pub fn funded() -> Self {
        Self::with_balance(ONE_ETHER)
    }

    pub fn starting_nonce(self, nonce: u64) -> Self {
        self.state.lock().unwrap().nonce = nonce;
        self
    }

    /// Reject the `n`-th broadcast attempt (1-based) as the node would.
    pub fn rejecting_broadcast(self, n: usize) -> Self {
        self.state.lock().unwrap().reject_broadcasts.insert(n);
        self
    }

    /// Fail the `n`-th nonce request (1-based) at the transport level.
    pub fn unavailable_nonce(self, n: usize) -> Self {
        self.state.lock().unwrap().unavailable_nonce_calls.insert(n);
        self
    }

    pub fn reverting(self) -> Self {
        self.state.lock().unwrap().revert = true;
        self
    }

    /// Never answer `wait_for_receipt`, as if inclusion takes forever.
    pub fn stalling_confirmation(self) -> Self {
        self.state.lock().unwrap().stall_confirmation = true;
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn broadcast_attempts(&self) -> usize {
        self.state.lock().unwrap().broadcast_attempts
    }

    /// Nonces of broadcasts the ledger accepted, in order.
    pub fn accepted_nonces(&self) -> Vec<u64> {
        self.state.lock().unwrap().broadcasts.iter().map(|tx| tx.nonce).collect()
    }

    fn record(&self, call: &'static str) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn is_reachable(&self) -> bool {
        self.record("reachable");
        true
    }

    async fn chain_id(&self) -> BlockchainResult<u64> {
        self.record("chain_id");
        Ok(31337)
    }

    async fn balance(&self, _address: Address) -> BlockchainResult<U256> {
        self.record("balance");
        Ok(self.state.lock().unwrap().balance)
    }

    async fn nonce(&self, _address: Address) -> BlockchainResult<u64> {
        self.record("nonce");
        let mut state = self.state.lock().unwrap();
        state.nonce_calls += 1;
        if state.unavailable_nonce_calls.contains(&state.nonce_calls) {
            return Err(BlockchainError::NetworkUnavailable("connection reset".into()));
        }
        Ok(state.nonce)
    }

    async fn base_gas_price(&self) -> BlockchainResult<u128> {
        self.record("gas_price");
        Ok(self.state.lock().unwrap().gas_price)
    }

    async fn broadcast(&self, tx: &SignedTransaction) -> BlockchainResult<TxHash> {
        self.record("broadcast");
        let mut state = self.state.lock().unwrap();
        state.broadcast_attempts += 1;

        if state.reject_broadcasts.contains(&state.broadcast_attempts) {
            return Err(BlockchainError::RemoteRejected(
                "replacement transaction underpriced".into(),
            ));
        }
        if tx.nonce != state.nonce {
            return Err(BlockchainError::RemoteRejected("nonce too low".into()));
        }

        state.nonce += 1;
        state.block += 1;
        let block = state.block;
        state.receipts.insert(tx.tx_hash, block);
        state.broadcasts.push(tx.clone());
        Ok(tx.tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Receipt> {
        self.record("receipt");
        let stall = self.state.lock().unwrap().stall_confirmation;
        if stall {
            std::future::pending::<()>().await;
        }

        let state = self.state.lock().unwrap();
        let block_number = *state
            .receipts
            .get(&tx_hash)
            .ok_or(BlockchainError::ConfirmationTimeout { tx_hash, secs: 120 })?;

        if state.revert {
            return Err(BlockchainError::Reverted { tx_hash, block_number });
        }

        Ok(Receipt {
            tx_hash,
            block_number,
            block_hash: None,
            gas_used: 43_000,
            effective_gas_price: state.gas_price,
            from: Address::ZERO,
        })
    }
}

pub fn identity() -> Identity {
    Identity::from_private_key(TEST_PRIVATE_KEY).unwrap()
}

pub fn engine(ledger: &Arc<MockLedger>) -> SubmissionEngine<MockLedger> {
    let builder = VoteTxBuilder::new(CONTRACT, 31337, &GasConfig::default());
    SubmissionEngine::new(Arc::clone(ledger), identity(), builder)
}

#[allow(dead_code)]
pub fn scheduler(ledger: &Arc<MockLedger>, delays: Vec<u64>) -> Scheduler<MockLedger> {
    Scheduler::new(engine(ledger), DelaySchedule::from_secs(delays).unwrap())
}
