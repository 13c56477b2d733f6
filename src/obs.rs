//! Optional observability helpers for guarded requests and session issuance.
//!
//! # Feature Flags
//!
//! - `tracing` (default) emits spans named `account_session.op` with `op` and `stage` fields, and
//!   logs internal causes that are hidden from callers.
//! - `metrics` increments the `account_session_op_total` counter for every attempt and resolution,
//!   labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// One request raced against its deadline by the timeout guard.
	Guard,
	/// Access/refresh pair issuance or rotation.
	IssuePair,
	/// Explicit refresh-token revocation.
	Revoke,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::Guard => "guard",
			Operation::IssuePair => "issue_pair",
			Operation::Revoke => "revoke",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// The deadline (or parent cancellation) won the race.
	Timeout,
	/// The handler panicked and the fault payload was committed.
	Fault,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
			Outcome::Timeout => "timeout",
			Outcome::Fault => "fault",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
