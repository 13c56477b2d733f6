//! Request timeout guard.
//!
//! [`TimeoutGuard`] runs each handler on a dedicated blocking-pool thread, lets it write into a
//! [`ResponseBuffer`], and races that thread against the request's [`DeadlineContext`]. A handler
//! that blocks its thread (CPU loops, synchronous IO) cannot starve the deadline, even on a
//! current-thread runtime. Exactly one of three paths commits:
//!
//! - the handler returned: its buffered status, headers, and body are committed verbatim;
//! - the handler panicked: buffered writes are discarded and the internal-error payload commits;
//! - the deadline (or a parent scope) finished first: the buffer is poisoned, the configured
//!   timeout payload commits, and the handler's [`CancelSignal`] fires.
//!
//! A timed-out handler is never aborted. It keeps running detached and holds its thread until it
//! returns, so long-running handlers should watch [`RequestScope::cancel`]. Everything it writes
//! afterwards is dropped by the poisoned buffer.

pub mod buffer;
pub mod deadline;
pub mod payload;

pub use buffer::*;
pub use deadline::*;
pub use payload::*;

// std
use std::any::Any;
// crates.io
use http::Response;
use tokio::{
	runtime::Handle,
	task::{self, JoinError},
};
// self
use crate::{
	_prelude::*,
	config::GuardConfig,
	obs::{self, OpSpan, Operation, Outcome},
};

/// Which resolution path produced the committed response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommitPath {
	/// The handler finished before the deadline.
	Finished,
	/// The handler panicked.
	Faulted,
	/// The deadline or a parent cancellation won.
	TimedOut,
}
impl CommitPath {
	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			CommitPath::Finished => "finished",
			CommitPath::Faulted => "faulted",
			CommitPath::TimedOut => "timed_out",
		}
	}

	const fn outcome(self) -> Outcome {
		match self {
			CommitPath::Finished => Outcome::Success,
			CommitPath::Faulted => Outcome::Fault,
			CommitPath::TimedOut => Outcome::Timeout,
		}
	}
}
impl Display for CommitPath {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// The single response produced for one request.
#[derive(Debug)]
pub struct Committed {
	/// Path that won the race.
	pub path: CommitPath,
	/// Response to hand to the transport.
	pub response: Response<Vec<u8>>,
}

/// Real transport receiving the committed response. Consumed on commit, so it is written once.
pub trait ResponseSink {
	/// Writes the final response.
	fn commit(self, response: Response<Vec<u8>>);
}
impl<F> ResponseSink for F
where
	F: FnOnce(Response<Vec<u8>>),
{
	fn commit(self, response: Response<Vec<u8>>) {
		self(response)
	}
}

/// Everything a guarded handler receives.
#[derive(Clone, Debug)]
pub struct RequestScope {
	/// Buffered response writer.
	pub writer: ResponseWriter,
	/// Fires once the request is resolved by any path.
	pub cancel: CancelSignal,
}

/// Races handlers against a deadline and commits exactly one response per request.
#[derive(Clone, Debug)]
pub struct TimeoutGuard {
	config: GuardConfig,
	fault_payload: ErrorPayload,
}
impl TimeoutGuard {
	/// Creates a guard with the internal-error payload for faults.
	pub fn new(config: GuardConfig) -> Self {
		Self { config, fault_payload: ErrorPayload::internal() }
	}

	/// Active configuration.
	pub fn config(&self) -> &GuardConfig {
		&self.config
	}

	/// Runs `handler` under a fresh deadline scope.
	pub async fn run<H, Fut>(&self, handler: H) -> Committed
	where
		H: 'static + Send + FnOnce(RequestScope) -> Fut,
		Fut: Future<Output = ()>,
	{
		self.resolve(DeadlineContext::new(self.config.deadline), handler).await
	}

	/// Runs `handler` under a scope linked to `parent`; cancelling the parent commits the
	/// timeout payload.
	pub async fn run_within<H, Fut>(&self, parent: &CancelSignal, handler: H) -> Committed
	where
		H: 'static + Send + FnOnce(RequestScope) -> Fut,
		Fut: Future<Output = ()>,
	{
		self.resolve(DeadlineContext::with_parent(parent, self.config.deadline), handler).await
	}

	/// Runs `handler` and commits the resolved response into `sink`.
	pub async fn serve<S, H, Fut>(&self, sink: S, handler: H) -> CommitPath
	where
		S: ResponseSink,
		H: 'static + Send + FnOnce(RequestScope) -> Fut,
		Fut: Future<Output = ()>,
	{
		let Committed { path, response } = self.run(handler).await;

		sink.commit(response);

		path
	}

	async fn resolve<H, Fut>(&self, context: DeadlineContext, handler: H) -> Committed
	where
		H: 'static + Send + FnOnce(RequestScope) -> Fut,
		Fut: Future<Output = ()>,
	{
		const OP: Operation = Operation::Guard;

		let span = OpSpan::new(OP, "handler");

		obs::record_outcome(OP, Outcome::Attempt);

		let buffer = ResponseBuffer::new();
		let scope = RequestScope { writer: buffer.writer(), cancel: context.signal() };
		let runtime = Handle::current();
		// The handler is invoked on its own thread too, so a panic while building the future is
		// contained like any other fault.
		let mut running =
			task::spawn_blocking(move || runtime.block_on(span.instrument(handler(scope))));
		let committed = tokio::select! {
			biased;
			joined = &mut running => match joined {
				Ok(()) => self.finish(&buffer),
				Err(e) => self.fault(&buffer, e),
			},
			reason = context.done() => self.time_out(&buffer, reason),
		};

		obs::record_outcome(OP, committed.path.outcome());

		// Dropping the context releases the scope on every path.
		drop(context);

		committed
	}

	fn finish(&self, buffer: &ResponseBuffer) -> Committed {
		let response = buffer.try_commit();

		// Only `resolve` moves a buffer out of `Pending`, once, after the race is decided.
		debug_assert!(response.is_some(), "A finished handler's buffer must still be pending.");

		match response {
			Some(response) => Committed { path: CommitPath::Finished, response },
			None => self.fault_response(),
		}
	}

	fn fault(&self, buffer: &ResponseBuffer, error: JoinError) -> Committed {
		let cause = if error.is_panic() {
			panic_message(error.into_panic())
		} else {
			error.to_string()
		};

		obs::log_internal(Operation::Guard, "handler", &cause);
		buffer.discard_and_commit();

		self.fault_response()
	}

	fn fault_response(&self) -> Committed {
		Committed { path: CommitPath::Faulted, response: self.fault_payload.to_response() }
	}

	fn time_out(&self, buffer: &ResponseBuffer, reason: DoneReason) -> Committed {
		obs::log_warning(Operation::Guard, "deadline", &reason);
		buffer.set_timed_out();

		Committed { path: CommitPath::TimedOut, response: self.config.timeout_payload.to_response() }
	}
}
impl Default for TimeoutGuard {
	fn default() -> Self {
		Self::new(GuardConfig::default())
	}
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
	match payload.downcast::<String>() {
		Ok(message) => *message,
		Err(payload) => match payload.downcast::<&'static str>() {
			Ok(message) => (*message).to_owned(),
			Err(_) => "handler panicked with a non-string payload".into(),
		},
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::time::Duration as StdDuration;
	// crates.io
	use http::StatusCode;
	// self
	use super::*;

	fn guard(deadline_ms: u64) -> TimeoutGuard {
		TimeoutGuard::new(
			GuardConfig::new(StdDuration::from_millis(deadline_ms))
				.expect("Test deadline should be positive."),
		)
	}

	#[tokio::test]
	async fn finished_handler_commits_verbatim() {
		let committed = guard(1_000)
			.run(|scope| async move {
				scope.writer.write_header(StatusCode::CREATED);
				scope.writer.write(b"made");
			})
			.await;

		assert_eq!(committed.path, CommitPath::Finished);
		assert_eq!(committed.response.status(), StatusCode::CREATED);
		assert_eq!(committed.response.body(), b"made");
	}

	#[tokio::test]
	async fn string_panics_are_contained() {
		let committed = guard(1_000)
			.run(|scope| async move {
				scope.writer.write(b"partial");

				panic!("boom");
			})
			.await;

		assert_eq!(committed.path, CommitPath::Faulted);
		assert_eq!(committed.response.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert!(!String::from_utf8_lossy(committed.response.body()).contains("partial"));
	}

	#[tokio::test]
	async fn panic_before_future_is_built_is_contained() {
		let committed = guard(1_000)
			.run(|_| -> std::future::Ready<()> { panic!("boom before the future") })
			.await;

		assert_eq!(committed.path, CommitPath::Faulted);
		assert_eq!(committed.response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}

	#[tokio::test]
	async fn blocking_handler_cannot_starve_deadline_on_current_thread_runtime() {
		let (written_tx, written_rx) = tokio::sync::oneshot::channel();
		let committed = guard(10)
			.run(|scope| async move {
				std::thread::sleep(StdDuration::from_millis(200));

				let _ = written_tx.send(scope.writer.write(b"late"));
			})
			.await;

		assert_eq!(committed.path, CommitPath::TimedOut);
		assert_eq!(committed.response.status(), StatusCode::SERVICE_UNAVAILABLE);
		assert_eq!(written_rx.await.expect("Blocked handler should still finish."), 0);
	}

	#[tokio::test]
	async fn deadline_commits_timeout_payload_and_cancels_handler() {
		let (seen_tx, seen_rx) = tokio::sync::oneshot::channel();
		let committed = guard(10)
			.run(|scope| async move {
				let reason = scope.cancel.cancelled().await;
				let written = scope.writer.write(b"late");
				let _ = seen_tx.send((reason, written));
			})
			.await;

		assert_eq!(committed.path, CommitPath::TimedOut);
		assert_eq!(committed.response.status(), StatusCode::SERVICE_UNAVAILABLE);
		assert_eq!(
			seen_rx.await.expect("Handler should observe cancellation."),
			(DoneReason::DeadlineExceeded, 0)
		);
	}

	#[test]
	fn panic_messages_are_extracted() {
		assert_eq!(panic_message(Box::new("boom")), "boom");
		assert_eq!(panic_message(Box::new(String::from("boom"))), "boom");
		assert_eq!(panic_message(Box::new(7_u8)), "handler panicked with a non-string payload");
	}
}
