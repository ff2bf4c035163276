//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → CLI overrides applied by the binary
//!     → VoterConfig (validated, immutable for the run)
//! ```
//!
//! # Design Decisions
//! - Config lives for exactly one run; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ConfirmationConfig, ContractConfig, GasConfig, ObservabilityConfig, RpcConfig,
    ScheduleConfig, VoterConfig,
};
pub use validation::{validate_config, ValidationError};
