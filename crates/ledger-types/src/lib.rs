//! Common types module for the ledger operations system.
//!
//! This module defines the data model shared by every component: read queries
//! and their results, unsigned call payloads, submission handles, per-operation
//! state and the events exchanged between services. Keeping them in one crate
//! lets the node, wallet and core crates agree on a single vocabulary.

/// Unsigned contract call payloads and their typed arguments.
pub mod call;
/// Event types for inter-service communication.
pub mod events;
/// Ledger, token and explorer configuration types.
pub mod ledger;
/// Per-operation state owned by the orchestrator.
pub mod operation;
/// Read queries, read values and read results.
pub mod query;
/// Base trait for self-registering implementations.
pub mod registry;
/// Wrapper for sensitive configuration strings.
pub mod secret_string;
/// Transaction hashes, submission handles and on-chain status.
pub mod transaction;
/// Utility functions for formatting and conversion.
pub mod utils;
/// Configuration validation types for backend-specific tables.
pub mod validation;

pub use alloy_primitives::{Address, Bytes, U256};
pub use call::*;
pub use events::*;
pub use ledger::{ExplorerConfig, NativeCurrency, TokenConfig};
pub use operation::*;
pub use query::*;
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use transaction::*;
pub use utils::{format_token_amount, round_decimal_string, truncate_id, with_0x_prefix, without_0x_prefix};
pub use validation::*;
