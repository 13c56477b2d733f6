//! In-memory response capture shared between a handler task and its guard.

// crates.io
use http::{
	HeaderMap, HeaderValue, Response, StatusCode,
	header::{CONTENT_TYPE, HeaderName},
	status::InvalidStatusCode,
};
// self
use crate::_prelude::*;

/// Lifecycle of a buffered response. Transitions only leave `Pending`, and only once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
	/// Handler writes are accepted.
	Pending,
	/// The guard took the response (or discarded it on a fault).
	Committed,
	/// The deadline won; every later write is dropped.
	TimedOut,
}

/// Status, headers, and body written by a handler so far.
#[derive(Debug)]
pub(crate) struct ResponseState {
	headers: HeaderMap,
	body: Vec<u8>,
	status: Option<StatusCode>,
	phase: Phase,
}
impl ResponseState {
	/// Returns `true` once a status has been fixed, explicitly or by the first body write.
	fn header_committed(&self) -> bool {
		self.status.is_some()
	}

	/// Returns `true` once the deadline won the race.
	fn timed_out(&self) -> bool {
		self.phase == Phase::TimedOut
	}

	fn accepts_writes(&self) -> bool {
		self.phase == Phase::Pending
	}

	fn accepts_header_writes(&self) -> bool {
		self.accepts_writes() && !self.header_committed()
	}
}
impl Default for ResponseState {
	fn default() -> Self {
		Self { headers: HeaderMap::new(), body: Vec::new(), status: None, phase: Phase::Pending }
	}
}

/// Guard-side handle over one request's buffered status, headers, and body.
#[derive(Clone, Debug, Default)]
pub struct ResponseBuffer(Arc<Mutex<ResponseState>>);
impl ResponseBuffer {
	/// Creates an empty pending buffer.
	pub fn new() -> Self {
		Self::default()
	}

	/// Handler-side writer sharing this buffer's state.
	pub fn writer(&self) -> ResponseWriter {
		ResponseWriter(self.0.clone())
	}

	/// Current phase.
	pub fn phase(&self) -> Phase {
		self.0.lock().phase
	}

	/// Poisons the buffer so later writes become no-ops.
	///
	/// Idempotent. Returns `true` only for the call that moved the buffer out of `Pending`;
	/// a committed buffer is left as is.
	pub fn set_timed_out(&self) -> bool {
		let mut state = self.0.lock();

		if state.phase != Phase::Pending {
			return false;
		}

		state.phase = Phase::TimedOut;
		state.headers.clear();
		state.body.clear();

		true
	}

	/// Moves `Pending` to `Committed` and hands back what the handler wrote.
	///
	/// Without an explicit status the response defaults to `200 OK`.
	pub fn try_commit(&self) -> Option<Response<Vec<u8>>> {
		let mut state = self.0.lock();

		if state.phase != Phase::Pending {
			return None;
		}

		state.phase = Phase::Committed;

		let mut response = Response::new(std::mem::take(&mut state.body));

		*response.status_mut() = state.status.unwrap_or(StatusCode::OK);
		*response.headers_mut() = std::mem::take(&mut state.headers);

		Some(response)
	}

	/// Moves `Pending` to `Committed`, dropping partial writes. Returns `false` if already resolved.
	pub fn discard_and_commit(&self) -> bool {
		let mut state = self.0.lock();

		if state.phase != Phase::Pending {
			return false;
		}

		state.phase = Phase::Committed;
		state.headers.clear();
		state.body.clear();

		true
	}
}

/// Handler-facing writer with standard response-writer semantics.
///
/// Writes never fail once the request is resolved; they are dropped and report zero bytes so
/// handler code written against a live transport keeps running.
#[derive(Clone, Debug)]
pub struct ResponseWriter(Arc<Mutex<ResponseState>>);
impl ResponseWriter {
	/// Mutates headers; ignored (returning `None`) once the status is fixed or the request resolved.
	pub fn with_headers<R>(&self, f: impl FnOnce(&mut HeaderMap) -> R) -> Option<R> {
		let mut state = self.0.lock();

		if !state.accepts_header_writes() {
			return None;
		}

		Some(f(&mut state.headers))
	}

	/// Appends a header value, keeping earlier values for the same name.
	pub fn append_header(&self, name: HeaderName, value: HeaderValue) {
		self.with_headers(|headers| headers.append(name, value));
	}

	/// Fixes the status on the first call; later calls are ignored.
	pub fn write_header(&self, status: StatusCode) {
		let mut state = self.0.lock();

		if state.accepts_header_writes() {
			state.status = Some(status);
		}
	}

	/// Like [`write_header`](Self::write_header) for a raw code.
	///
	/// Codes outside `100..=999` are rejected without touching the buffer.
	pub fn write_status(&self, code: u16) -> Result<(), InvalidStatusCode> {
		self.write_header(StatusCode::from_u16(code)?);

		Ok(())
	}

	/// Appends body bytes, implicitly fixing `200 OK` if no status was written yet.
	pub fn write(&self, bytes: &[u8]) -> usize {
		let mut state = self.0.lock();

		if !state.accepts_writes() {
			return 0;
		}

		if state.status.is_none() {
			state.status = Some(StatusCode::OK);
		}

		state.body.extend_from_slice(bytes);

		bytes.len()
	}

	/// Writes `value` as a JSON body under `status` with a JSON content type.
	pub fn write_json<T>(&self, status: StatusCode, value: &T) -> Result<usize, serde_json::Error>
	where
		T: ?Sized + Serialize,
	{
		let body = serde_json::to_vec(value)?;
		let mut state = self.0.lock();

		if !state.accepts_writes() {
			return Ok(0);
		}
		if !state.header_committed() {
			state.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
			state.status = Some(status);
		}

		state.body.extend_from_slice(&body);

		Ok(body.len())
	}

	/// Returns `true` once the deadline won; handlers may use it to stop early.
	pub fn is_timed_out(&self) -> bool {
		self.0.lock().timed_out()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn first_status_wins_and_headers_freeze_with_it() {
		let buffer = ResponseBuffer::new();
		let writer = buffer.writer();

		writer.append_header(HeaderName::from_static("x-trace"), HeaderValue::from_static("a"));
		writer.append_header(HeaderName::from_static("x-trace"), HeaderValue::from_static("b"));
		writer.write_header(StatusCode::CREATED);
		writer.write_header(StatusCode::BAD_REQUEST);
		writer.append_header(HeaderName::from_static("x-late"), HeaderValue::from_static("c"));

		assert_eq!(writer.write(b"hello "), 6);
		assert_eq!(writer.write(b"world"), 5);

		let response = buffer.try_commit().expect("Pending buffer should commit.");
		let traces: Vec<_> = response.headers().get_all("x-trace").iter().collect();

		assert_eq!(response.status(), StatusCode::CREATED);
		assert_eq!(traces, ["a", "b"]);
		assert!(response.headers().get("x-late").is_none());
		assert_eq!(response.body(), b"hello world");
	}

	#[test]
	fn timed_out_buffer_drops_every_write() {
		let buffer = ResponseBuffer::new();
		let writer = buffer.writer();

		writer.write(b"partial");

		assert!(buffer.set_timed_out());
		assert!(!buffer.set_timed_out(), "Poisoning is idempotent.");
		assert!(writer.is_timed_out());
		assert_eq!(writer.write(b"late"), 0);
		assert_eq!(
			writer.write_json(StatusCode::OK, &"late").expect("Serialization should succeed."),
			0
		);
		assert!(writer.with_headers(|h| h.len()).is_none());
		assert!(buffer.try_commit().is_none());
		assert!(!buffer.discard_and_commit());
		assert_eq!(buffer.phase(), Phase::TimedOut);
	}

	#[test]
	fn commit_happens_once() {
		let buffer = ResponseBuffer::new();

		assert!(buffer.try_commit().is_some());
		assert!(buffer.try_commit().is_none());
		assert!(!buffer.set_timed_out());
		assert_eq!(buffer.phase(), Phase::Committed);
	}

	#[test]
	fn invalid_status_codes_are_rejected() {
		let buffer = ResponseBuffer::new();
		let writer = buffer.writer();

		assert!(writer.write_status(99).is_err());
		assert!(writer.write_status(1000).is_err());
		assert!(writer.write_status(418).is_ok());

		let response = buffer.try_commit().expect("Pending buffer should commit.");

		assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
	}

	#[test]
	fn json_writes_set_content_type() {
		let buffer = ResponseBuffer::new();

		buffer
			.writer()
			.write_json(StatusCode::ACCEPTED, &serde_json::json!({ "ok": true }))
			.expect("Serialization should succeed.");

		let response = buffer.try_commit().expect("Pending buffer should commit.");

		assert_eq!(response.status(), StatusCode::ACCEPTED);
		assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
		assert_eq!(response.body(), br#"{"ok":true}"#);
	}
}
