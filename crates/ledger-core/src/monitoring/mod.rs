//! Confirmation tracking for submitted transactions.

pub mod confirmation;

pub use confirmation::{ConfirmationOutcome, ConfirmationWatcher};
