// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for issuance and revocation calls.
#[derive(Debug, Default)]
pub struct IssuerMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	revocations: AtomicU64,
}
impl IssuerMetrics {
	/// Returns the total number of `issue_pair` calls.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of pairs handed back to callers.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of issuance or revocation calls that ended in `Error::Internal`.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns the number of successful revocations.
	pub fn revocations(&self) -> u64 {
		self.revocations.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_revocation(&self) {
		self.revocations.fetch_add(1, Ordering::Relaxed);
	}
}
