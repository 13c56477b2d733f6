//! Per-request cancellation scope with an absolute deadline.

// std
use std::time::Duration as StdDuration;
// crates.io
use tokio::{
	sync::watch,
	time::{self, Instant},
};
// self
use crate::_prelude::*;

/// Why a [`DeadlineContext`] finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DoneReason {
	/// The absolute deadline passed.
	DeadlineExceeded,
	/// The scope (or its parent) was cancelled or released.
	Cancelled,
}
impl DoneReason {
	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			DoneReason::DeadlineExceeded => "deadline_exceeded",
			DoneReason::Cancelled => "cancelled",
		}
	}
}
impl Display for DoneReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Read-only view handed to handlers so they can stop work once their request is resolved.
#[derive(Clone, Debug)]
pub struct CancelSignal {
	deadline: Instant,
	rx: watch::Receiver<Option<DoneReason>>,
}
impl CancelSignal {
	/// Absolute deadline of the owning scope.
	pub fn deadline(&self) -> Instant {
		self.deadline
	}

	/// Returns the reason once the owning scope finished.
	pub fn reason(&self) -> Option<DoneReason> {
		*self.rx.borrow()
	}

	/// Returns `true` once the owning scope finished.
	pub fn is_cancelled(&self) -> bool {
		self.reason().is_some()
	}

	/// Resolves when the owning scope finishes. A dropped scope counts as cancelled.
	pub async fn cancelled(&self) -> DoneReason {
		let mut rx = self.rx.clone();

		match rx.wait_for(Option::is_some).await {
			Ok(reason) => (*reason).unwrap_or(DoneReason::Cancelled),
			Err(_) => DoneReason::Cancelled,
		}
	}
}

/// Cancellable scope owned by the guard for one request.
///
/// Dropping the context cancels it, so the scope is released on every exit path.
#[derive(Debug)]
pub struct DeadlineContext {
	deadline: Instant,
	tx: watch::Sender<Option<DoneReason>>,
	parent: Option<CancelSignal>,
}
impl DeadlineContext {
	/// Scope expiring `timeout` from now.
	pub fn new(timeout: StdDuration) -> Self {
		Self::at(Instant::now() + timeout, None)
	}

	/// Scope expiring `timeout` from now or at the parent's deadline, whichever is first.
	/// Cancelling the parent finishes this scope too.
	pub fn with_parent(parent: &CancelSignal, timeout: StdDuration) -> Self {
		let deadline = (Instant::now() + timeout).min(parent.deadline);

		Self::at(deadline, Some(parent.clone()))
	}

	fn at(deadline: Instant, parent: Option<CancelSignal>) -> Self {
		let (tx, _) = watch::channel(None);

		Self { deadline, tx, parent }
	}

	/// Absolute deadline.
	pub fn deadline(&self) -> Instant {
		self.deadline
	}

	/// Handler-side observer for this scope.
	pub fn signal(&self) -> CancelSignal {
		CancelSignal { deadline: self.deadline, rx: self.tx.subscribe() }
	}

	/// Finishes the scope. Only the first reason sticks; returns `true` if this call set it.
	pub fn cancel(&self, reason: DoneReason) -> bool {
		self.tx.send_if_modified(|current| {
			if current.is_some() {
				return false;
			}

			*current = Some(reason);

			true
		})
	}

	/// Resolves when the deadline passes, the scope is cancelled, or the parent finishes.
	pub async fn done(&self) -> DoneReason {
		let own = self.signal();
		let reason = tokio::select! {
			biased;
			reason = own.cancelled() => reason,
			_ = time::sleep_until(self.deadline) => DoneReason::DeadlineExceeded,
			reason = parent_done(self.parent.as_ref()) => reason,
		};

		self.cancel(reason);

		reason
	}
}
impl Drop for DeadlineContext {
	fn drop(&mut self) {
		self.cancel(DoneReason::Cancelled);
	}
}

async fn parent_done(parent: Option<&CancelSignal>) -> DoneReason {
	match parent {
		Some(parent) => parent.cancelled().await,
		None => std::future::pending().await,
	}
}
