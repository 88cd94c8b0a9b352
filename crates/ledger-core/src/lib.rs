//! Core engine for the ledger operations system.
//!
//! This crate tracks user-initiated writes from submission to a final on-chain
//! status and keeps the reads that depend on them fresh. It provides:
//! - `ConfirmationWatcher`, which polls a submission until it is confirmed or
//!   rejected
//! - `OperationOrchestrator`, which owns one state machine per action and
//!   refuses overlapping submissions for the same action
//! - `LedgerEngine` and `LedgerBuilder`, which assemble everything from
//!   configuration

pub mod builder;
pub mod engine;
pub mod monitoring;
pub mod orchestrator;
pub mod read_model;
pub mod state;

pub use builder::{BuilderError, LedgerBuilder, LedgerFactories};
pub use engine::{event_bus::EventBus, EngineError, LedgerEngine};
pub use monitoring::{ConfirmationOutcome, ConfirmationWatcher};
pub use orchestrator::{phase_label, OperationOrchestrator, OperationSlot, SubmitOutcome, WriteIntent};
pub use read_model::{DependentReads, WorkshopPhase, WorkshopWindow};
pub use state::OperationStateMachine;

#[cfg(test)]
pub(crate) mod test_support;
