//! vote-runner
//!
//! Submits `vote()` to a contract N times from one keystore account, waiting
//! for inclusion after each submission and sleeping a shuffled 30–60 s between
//! submissions.
//!
//! ```text
//!   config.toml ─┐
//!   CLI flags  ──┼─▶ VoterConfig ─▶ RPC probe ─▶ keystore ─▶ contract ─▶ count
//!                │                                                        │
//!                │         ┌──────────────────────────────────────────────┘
//!                │         ▼
//!                │    Scheduler ──▶ SubmissionEngine ──▶ BlockchainClient ──▶ node
//!                │       │  ▲              │
//!                │   sleep │        Identity (sign)
//!                │       ▼  │
//!                └── Ctrl-C ─▶ Shutdown ─▶ partial tally
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use alloy::primitives::Address;
use clap::Parser;
use zeroize::Zeroizing;

use vote_runner::blockchain::{BlockchainClient, KeySource, LedgerClient, VoteTxBuilder};
use vote_runner::config::{load_config, validate_config, ConfigError, VoterConfig};
use vote_runner::lifecycle::startup::{
    parse_contract_address, parse_vote_count, prompt_line, read_keystore, read_passphrase,
};
use vote_runner::lifecycle::{listen_for_interrupt, Shutdown, StartupError};
use vote_runner::observability::{init_logging, init_metrics};
use vote_runner::submission::{DelaySchedule, RunReport, Scheduler, SubmissionEngine};

#[derive(Parser, Debug)]
#[command(name = "vote-runner")]
#[command(version, about = "Submit jittered vote() transactions from a keystore account", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint (overrides rpc.url)
    #[arg(long)]
    rpc_url: Option<String>,

    /// Encrypted keystore file (prompted for when omitted)
    #[arg(short, long)]
    keystore: Option<PathBuf>,

    /// Contract exposing vote() (overrides contract.address)
    #[arg(long, value_parser = contract_arg)]
    contract: Option<Address>,

    /// Number of votes to submit (prompted for when omitted)
    #[arg(short = 'n', long, value_parser = count_arg)]
    count: Option<u32>,

    /// Log level (overrides observability.log_level)
    #[arg(long)]
    log_level: Option<String>,
}

fn count_arg(value: &str) -> Result<u32, String> {
    parse_vote_count(value).map_err(|e| e.to_string())
}

fn contract_arg(value: &str) -> Result<Address, String> {
    parse_contract_address(value).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.observability.log_level);
    tracing::info!("vote-runner v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            init_metrics(addr);
        }
    }

    match run(cli, config).await {
        Ok(report) => {
            println!(
                "Done. Successful votes: {}{}",
                report.tally,
                if report.interrupted { " (interrupted)" } else { "" }
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Aborting");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Config file (or defaults) with CLI overrides applied, then validated.
fn resolve_config(cli: &Cli) -> Result<VoterConfig, StartupError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => VoterConfig::default(),
    };

    if let Some(url) = &cli.rpc_url {
        config.rpc.url = url.clone();
    }
    if let Some(address) = cli.contract {
        config.contract.address = Some(address);
    }
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

async fn run(cli: Cli, config: VoterConfig) -> Result<RunReport, StartupError> {
    // 1. Connectivity
    let client = BlockchainClient::new(config.rpc.clone(), config.confirmation.clone())?;
    if !client.is_reachable().await {
        return Err(StartupError::Unreachable(config.rpc.url.clone()));
    }

    // 2. Keystore
    let keystore_path = match cli.keystore {
        Some(path) => path,
        None => PathBuf::from(prompt_line("Keystore file path: ")?),
    };
    let blob = read_keystore(&keystore_path)?;
    let passphrase = Zeroizing::new(read_passphrase()?);

    tracing::info!("Decrypting keystore");
    let identity = KeySource.decrypt(&blob, &passphrase)?;
    drop(passphrase);
    tracing::info!(address = %identity.address(), "Keystore decrypted");

    // 3. Contract
    let contract = match config.contract.address {
        Some(address) => address,
        None => parse_contract_address(&prompt_line("Contract address: ")?)?,
    };

    // 4. Vote count
    let count = match cli.count {
        Some(count) => count,
        None => parse_vote_count(&prompt_line("How many votes do you want to send? ")?)?,
    };

    let chain_id = match config.rpc.chain_id {
        Some(id) => id,
        None => client.chain_id().await?,
    };
    tracing::info!(%contract, chain_id, count, "Run parameters");

    let delays = DelaySchedule::generate(
        config.schedule.min_delay_secs,
        config.schedule.max_delay_secs,
    )?;
    let builder = VoteTxBuilder::new(contract, chain_id, &config.gas);
    let engine = SubmissionEngine::new(Arc::new(client), identity, builder);
    let scheduler = Scheduler::new(engine, delays);

    let shutdown = Arc::new(Shutdown::new());
    let interrupts = shutdown.subscribe();
    let listener = listen_for_interrupt(Arc::clone(&shutdown));

    let report = scheduler
        .run(count, interrupts)
        .await
        .map_err(|_| StartupError::InvalidVoteCount(count.to_string()))?;

    listener.abort();
    Ok(report)
}
