//! Vote transaction building.
//!
//! # Responsibilities
//! - Encode the `vote()` call against the configured contract
//! - Apply the fixed gas limit and the margined gas price
//! - Hand a one-shot request to the identity for signing

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::config::schema::GasConfig;

sol! {
    /// Minimal surface of the voting contract.
    interface IVoter {
        function vote() external payable;
        receive() external payable;
    }
}

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Unsigned vote transaction. Consumed by signing, never reused.
#[derive(Debug, PartialEq, Eq)]
pub struct VoteRequest {
    pub sender: Address,
    pub contract: Address,
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_limit: u64,
    pub gas_price: u128,
}

impl VoteRequest {
    /// Worst-case fee: `gas_limit * gas_price`. Value is always zero.
    pub fn max_fee(&self) -> U256 {
        U256::from(self.gas_limit) * U256::from(self.gas_price)
    }

    /// Convert into an alloy legacy-priced request.
    pub fn into_transaction_request(self) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(self.sender)
            .with_to(self.contract)
            .with_value(U256::ZERO)
            .with_input(Bytes::from(IVoter::voteCall {}.abi_encode()))
            .with_nonce(self.nonce)
            .with_chain_id(self.chain_id)
            .with_gas_limit(self.gas_limit)
            .with_gas_price(self.gas_price)
    }
}

/// Raw signed payload plus its hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub tx_hash: TxHash,
    pub raw: Bytes,
    pub nonce: u64,
}

/// Builds vote transactions from live network parameters.
#[derive(Debug, Clone)]
pub struct VoteTxBuilder {
    contract: Address,
    chain_id: u64,
    gas_limit: u64,
    price_margin_percent: u64,
    max_gas_price_gwei: Option<u64>,
}

impl VoteTxBuilder {
    pub fn new(contract: Address, chain_id: u64, gas: &GasConfig) -> Self {
        Self {
            contract,
            chain_id,
            gas_limit: gas.limit,
            price_margin_percent: gas.price_margin_percent,
            max_gas_price_gwei: gas.max_gas_price_gwei,
        }
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    /// Inflate the base gas price by the configured margin (floored).
    pub fn price_gas(&self, base_gas_price: u128) -> BlockchainResult<u128> {
        let price = base_gas_price.saturating_mul(100 + u128::from(self.price_margin_percent)) / 100;

        if let Some(max_gwei) = self.max_gas_price_gwei {
            if price > u128::from(max_gwei).saturating_mul(WEI_PER_GWEI) {
                return Err(BlockchainError::GasPriceTooHigh {
                    current_gwei: price / WEI_PER_GWEI,
                    max_gwei,
                });
            }
        }

        Ok(price)
    }

    /// Assemble the zero-value `vote()` call for `sender` at `nonce`.
    pub fn build(&self, sender: Address, nonce: u64, gas_price: u128) -> VoteRequest {
        VoteRequest {
            sender,
            contract: self.contract,
            chain_id: self.chain_id,
            nonce,
            gas_limit: self.gas_limit,
            gas_price,
        }
    }
}
