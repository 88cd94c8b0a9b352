//! Transaction submission types.
//!
//! A submission handle is created exactly once per successful broadcast and is
//! never mutated afterwards. The status type describes what the node reports
//! for a handle's hash on each confirmation poll.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Blockchain transaction hash representation.
///
/// Stores transaction hashes as raw bytes so the type does not depend on a
/// particular hash width.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionHash(pub Vec<u8>);

impl TransactionHash {
	/// Returns the hash as a 0x-prefixed lowercase hex string.
	pub fn to_hex(&self) -> String {
		format!("0x{}", hex::encode(&self.0))
	}
}

impl fmt::Display for TransactionHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_hex())
	}
}

/// Handle returned by a successful submission.
///
/// Uniquely identifies one confirmation watch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionHandle {
	/// Hash of the broadcast transaction.
	pub tx_hash: TransactionHash,
	/// When the wallet returned the hash.
	pub submitted_at: DateTime<Utc>,
}

impl SubmissionHandle {
	pub fn new(tx_hash: TransactionHash) -> Self {
		Self {
			tx_hash,
			submitted_at: Utc::now(),
		}
	}
}

/// Status of a submitted transaction as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
	/// Not yet included, or included without a final outcome.
	Pending,
	/// Included and executed successfully.
	Confirmed { block_number: u64 },
	/// Included but reverted, or rejected by the sequencer.
	Rejected { reason: String },
}

impl TransactionStatus {
	/// Returns true for Confirmed and Rejected.
	pub fn is_terminal(&self) -> bool {
		!matches!(self, TransactionStatus::Pending)
	}
}
