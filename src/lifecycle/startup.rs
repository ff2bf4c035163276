//! Startup inputs.
//!
//! # Responsibilities
//! - Read the keystore file and the passphrase
//! - Capture and validate the contract address and the vote count
//! - Classify every fatal startup failure
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and ends the process with status 1
//! - Inputs are validated here so the core only sees well-formed values

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use alloy::primitives::Address;
use thiserror::Error;

use crate::blockchain::KeystoreError;
use crate::config::ConfigError;
use crate::submission::ShuffleError;

/// Environment variable consulted before prompting for the passphrase.
pub const PASSPHRASE_ENV_VAR: &str = "VOTE_RUNNER_PASSPHRASE";

/// Fatal errors that stop the process before (or instead of) a run.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("could not connect to the RPC endpoint at {0}")]
    Unreachable(String),

    #[error("keystore file not found: {}", .0.display())]
    KeystoreNotFound(PathBuf),

    #[error("failed to read keystore file {}: {source}", .path.display())]
    KeystoreRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("wrong passphrase or invalid keystore")]
    WrongPassphrase,

    #[error("unexpected error while decrypting keystore: {0}")]
    Decryption(String),

    #[error("invalid contract address '{0}'")]
    InvalidContract(String),

    #[error("please enter a valid number of votes (a positive integer), got '{0}'")]
    InvalidVoteCount(String),

    #[error("delay schedule: {0}")]
    Schedule(#[from] ShuffleError),

    #[error("network error during startup: {0}")]
    Network(#[from] crate::blockchain::BlockchainError),

    #[error("failed to read input: {0}")]
    Input(#[from] io::Error),
}

impl From<KeystoreError> for StartupError {
    fn from(err: KeystoreError) -> Self {
        match err {
            KeystoreError::InvalidPassphraseOrCorruptKey => Self::WrongPassphrase,
            KeystoreError::UnexpectedDecryptionError(reason) => Self::Decryption(reason),
        }
    }
}

/// Parse the requested number of votes.
pub fn parse_vote_count(input: &str) -> Result<u32, StartupError> {
    let trimmed = input.trim();
    match trimmed.parse::<u32>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(StartupError::InvalidVoteCount(trimmed.to_string())),
    }
}

/// Parse a contract address, checksummed or not.
pub fn parse_contract_address(input: &str) -> Result<Address, StartupError> {
    let trimmed = input.trim();
    trimmed
        .parse::<Address>()
        .map_err(|_| StartupError::InvalidContract(trimmed.to_string()))
}

/// Read the encrypted keystore blob from disk.
pub fn read_keystore(path: &Path) -> Result<String, StartupError> {
    std::fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => StartupError::KeystoreNotFound(path.to_path_buf()),
        _ => StartupError::KeystoreRead {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Print `prompt` and read one line from stdin.
pub fn prompt_line(prompt: &str) -> Result<String, StartupError> {
    let mut stdout = io::stdout();
    write!(stdout, "{prompt}")?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Passphrase from [`PASSPHRASE_ENV_VAR`], or an echo-free prompt.
pub fn read_passphrase() -> Result<String, StartupError> {
    if let Ok(passphrase) = std::env::var(PASSPHRASE_ENV_VAR) {
        return Ok(passphrase);
    }
    Ok(rpassword::prompt_password("Keystore passphrase: ")?)
}
