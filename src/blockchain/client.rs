//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoint (plus optional failovers)
//! - Query chain state (balance, nonce, gas price)
//! - Broadcast raw transactions and wait for their receipts
//! - Classify failures as transient (`NetworkUnavailable`) or final (`RemoteRejected`)

use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionReceipt;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::blockchain::transaction::SignedTransaction;
use crate::blockchain::types::{
    BlockchainError, BlockchainResult, ConfirmationConfig, Receipt, RpcConfig,
};
use crate::observability::metrics;

/// Capabilities the submission engine needs from the ledger.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// One-shot connectivity probe.
    async fn is_reachable(&self) -> bool;

    async fn chain_id(&self) -> BlockchainResult<u64>;

    async fn balance(&self, address: Address) -> BlockchainResult<U256>;

    /// Next usable nonce for `address`.
    async fn nonce(&self, address: Address) -> BlockchainResult<u64>;

    async fn base_gas_price(&self) -> BlockchainResult<u128>;

    async fn broadcast(&self, tx: &SignedTransaction) -> BlockchainResult<TxHash>;

    /// Suspend until `tx_hash` is included or the confirmation window closes.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Receipt>;
}

/// Runs `$call` against each provider in turn.
///
/// Transport errors and timeouts fall through to the next provider; a JSON-RPC
/// error response is returned immediately.
macro_rules! with_failover {
    ($self:ident, $op:literal, |$provider:ident| $call:expr) => {{
        let mut last_error = BlockchainError::NetworkUnavailable(format!(
            "no RPC providers available for {}",
            $op
        ));
        for (i, $provider) in $self.providers.iter().enumerate() {
            match timeout($self.timeout_duration, $call).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    let err = BlockchainError::from_transport(e);
                    if err.is_rejection() {
                        return Err(err);
                    }
                    tracing::warn!(provider_idx = i, op = $op, error = %err, "RPC error, trying next provider");
                    last_error = err;
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, op = $op, "RPC timeout, trying next provider");
                    last_error = BlockchainError::Timeout($self.timeout_duration.as_secs());
                }
            }
        }
        Err(last_error)
    }};
}

/// Blockchain RPC client wrapper with failover support.
#[derive(Clone)]
pub struct BlockchainClient {
    /// List of providers (primary + failovers).
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    /// Endpoint configuration.
    rpc: RpcConfig,
    /// Receipt polling configuration.
    confirmation: ConfirmationConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a new blockchain client.
    ///
    /// No request is sent here; use [`LedgerClient::is_reachable`] to probe.
    pub fn new(rpc: RpcConfig, confirmation: ConfirmationConfig) -> BlockchainResult<Self> {
        let timeout_duration = Duration::from_secs(rpc.timeout_secs);
        let mut providers = Vec::new();

        // 1. Add primary provider
        let primary_url: url::Url = rpc.url.parse().map_err(|e| {
            BlockchainError::NetworkUnavailable(format!("Invalid RPC URL '{}': {}", rpc.url, e))
        })?;
        providers.push(
            Arc::new(ProviderBuilder::new().connect_http(primary_url)) as Arc<dyn Provider + Send + Sync>
        );

        // 2. Add failover providers
        for url_str in &rpc.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(
                    Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>
                );
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        tracing::debug!(
            rpc_url = %rpc.url,
            failovers = providers.len() - 1,
            "Blockchain client initialized"
        );

        Ok(Self {
            providers,
            rpc,
            confirmation,
            timeout_duration,
        })
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> BlockchainResult<u64> {
        with_failover!(self, "eth_blockNumber", |provider| provider.get_block_number())
    }

    /// Get a transaction receipt by hash.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> BlockchainResult<Option<TransactionReceipt>> {
        with_failover!(self, "eth_getTransactionReceipt", |provider| {
            provider.get_transaction_receipt(tx_hash)
        })
    }

    /// Blocks required before a receipt counts.
    fn confirmation_blocks(&self) -> u64 {
        u64::from(self.confirmation.blocks.max(1))
    }
}

#[async_trait]
impl LedgerClient for BlockchainClient {
    /// Returns true if we can read the chain id and the block number.
    async fn is_reachable(&self) -> bool {
        let reachable = match (self.chain_id().await, self.get_block_number().await) {
            (Ok(chain_id), Ok(block)) => {
                tracing::info!(chain_id, block, rpc_url = %self.rpc.url, "RPC endpoint reachable");
                true
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(rpc_url = %self.rpc.url, error = %e, "RPC endpoint unreachable");
                false
            }
        };
        metrics::record_rpc_reachable(reachable);
        reachable
    }

    async fn chain_id(&self) -> BlockchainResult<u64> {
        with_failover!(self, "eth_chainId", |provider| provider.get_chain_id())
    }

    async fn balance(&self, address: Address) -> BlockchainResult<U256> {
        with_failover!(self, "eth_getBalance", |provider| provider.get_balance(address))
    }

    async fn nonce(&self, address: Address) -> BlockchainResult<u64> {
        with_failover!(self, "eth_getTransactionCount", |provider| {
            provider.get_transaction_count(address).pending()
        })
    }

    async fn base_gas_price(&self) -> BlockchainResult<u128> {
        with_failover!(self, "eth_gasPrice", |provider| provider.get_gas_price())
    }

    /// Send the signed bytes, failing over only while delivery is known not to
    /// have happened.
    ///
    /// A timeout may hide a delivered transaction, so it ends the attempt. A
    /// node that already holds the same bytes counts as a successful send.
    async fn broadcast(&self, tx: &SignedTransaction) -> BlockchainResult<TxHash> {
        let mut last_error =
            BlockchainError::NetworkUnavailable("no RPC providers available for broadcast".into());

        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.send_raw_transaction(&tx.raw)).await {
                Ok(Ok(pending)) => return Ok(*pending.tx_hash()),
                Ok(Err(e)) => {
                    let err = BlockchainError::from_transport(e);
                    if is_already_known(&err) {
                        tracing::info!(provider_idx = i, tx_hash = %tx.tx_hash, "Transaction already known to node");
                        return Ok(tx.tx_hash);
                    }
                    if err.is_rejection() {
                        return Err(err);
                    }
                    tracing::warn!(provider_idx = i, error = %err, "Broadcast failed, trying next provider");
                    last_error = err;
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, "Broadcast timed out, delivery unknown");
                    return Err(BlockchainError::Timeout(self.timeout_duration.as_secs()));
                }
            }
        }
        Err(last_error)
    }

    /// Poll for the receipt until it has the configured depth.
    ///
    /// Transient RPC errors while polling are logged and polling continues;
    /// only the overall confirmation window ends the wait.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Receipt> {
        let window = Duration::from_secs(self.confirmation.timeout_secs);
        let required = self.confirmation_blocks();
        let started = Instant::now();

        let result = timeout(window, async {
            let mut ticker = interval(Duration::from_millis(self.confirmation.poll_interval_ms));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let receipt = match self.get_transaction_receipt(tx_hash).await {
                    Ok(Some(r)) => r,
                    Ok(None) => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                        continue;
                    }
                    Err(e) if e.is_rejection() => return Err(e),
                    Err(e) => {
                        tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt poll failed");
                        continue;
                    }
                };

                let Some(block_number) = receipt.block_number else {
                    continue;
                };

                if !receipt.status() {
                    return Err(BlockchainError::Reverted { tx_hash, block_number });
                }

                if required > 1 {
                    let current = match self.get_block_number().await {
                        Ok(n) => n,
                        Err(e) => {
                            tracing::warn!(error = %e, "Block number poll failed");
                            continue;
                        }
                    };
                    let confirmations = current.saturating_sub(block_number) + 1;
                    if confirmations < required {
                        tracing::debug!(
                            tx_hash = %tx_hash,
                            confirmations,
                            required,
                            "Waiting for confirmations"
                        );
                        continue;
                    }
                }

                return Ok(Receipt {
                    tx_hash,
                    block_number,
                    block_hash: receipt.block_hash,
                    gas_used: receipt.gas_used,
                    effective_gas_price: receipt.effective_gas_price,
                    from: receipt.from,
                });
            }
        })
        .await;

        match result {
            Ok(Ok(receipt)) => {
                metrics::record_confirmation_latency(started.elapsed());
                Ok(receipt)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(BlockchainError::ConfirmationTimeout {
                tx_hash,
                secs: self.confirmation.timeout_secs,
            }),
        }
    }
}

/// Node answers meaning the exact transaction is already in its pool.
fn is_already_known(err: &BlockchainError) -> bool {
    match err {
        BlockchainError::RemoteRejected(message) => {
            let message = message.to_ascii_lowercase();
            message.contains("already known")
                || message.contains("known transaction")
                || message.contains("alreadyknown")
        }
        _ => false,
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.rpc.url)
            .field("failover_urls", &self.rpc.failover_urls)
            .field("timeout_secs", &self.rpc.timeout_secs)
            .finish()
    }
}
