//! Operation lifecycle rules.

pub mod operation;

pub use operation::OperationStateMachine;
