// self
use crate::{_prelude::*, obs::Operation};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// Span wrapper shared by the guard and the issuer.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(op: Operation, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("account_session.op", op = op.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (op, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a cause that is replaced by an opaque error or payload before reaching the caller.
pub fn log_internal(op: Operation, stage: &'static str, cause: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::error!(op = op.as_str(), stage, %cause, "internal failure");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (op, stage, cause);
	}
}

/// Logs a non-fatal condition, such as a request cut off by its deadline.
pub fn log_warning(op: Operation, stage: &'static str, detail: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(op = op.as_str(), stage, %detail);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (op, stage, detail);
	}
}
