//! Fixed, non-leaking error bodies committed by the guard.

// crates.io
use http::{HeaderValue, Response, StatusCode, header::CONTENT_TYPE};
// self
use crate::_prelude::*;

/// Client-visible error category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
	/// Unrecoverable handler or server failure (500).
	Internal,
	/// Request cut off by its deadline or by load shedding (503).
	ServiceUnavailable,
}
impl ErrorKind {
	/// HTTP status presented for this kind.
	pub const fn status(self) -> StatusCode {
		match self {
			ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
			ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
		}
	}
}

/// Error body shaped as `{"error":{"type":"INTERNAL","message":"..."}}` on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
	/// Category; also decides the status code.
	#[serde(rename = "type")]
	pub kind: ErrorKind,
	/// Human-readable message. Never carries internal causes.
	pub message: String,
}
impl ErrorPayload {
	/// Creates a payload with a custom message.
	pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
		Self { kind, message: message.into() }
	}

	/// Payload committed when a handler faults.
	pub fn internal() -> Self {
		Self::new(ErrorKind::Internal, "Internal server error.")
	}

	/// Default payload committed when the deadline wins.
	pub fn service_unavailable() -> Self {
		Self::new(ErrorKind::ServiceUnavailable, "Service unavailable or timed out.")
	}

	/// Status derived from [`kind`](Self::kind).
	pub fn status(&self) -> StatusCode {
		self.kind.status()
	}

	/// Renders the payload as a complete JSON response.
	pub fn to_response(&self) -> Response<Vec<u8>> {
		#[derive(Serialize)]
		struct Envelope<'a> {
			error: &'a ErrorPayload,
		}

		// Plain strings and unit variants always serialize.
		let body = serde_json::to_vec(&Envelope { error: self }).unwrap_or_default();
		let mut response = Response::new(body);

		*response.status_mut() = self.status();
		response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		response
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn payload_renders_wrapped_json() {
		let response = ErrorPayload::internal().to_response();
		let body: serde_json::Value =
			serde_json::from_slice(response.body()).expect("Payload body should be JSON.");

		assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
		assert_eq!(body["error"]["type"], "INTERNAL");
		assert_eq!(body["error"]["message"], "Internal server error.");
	}

	#[test]
	fn timeout_and_fault_statuses_differ() {
		assert_eq!(ErrorPayload::service_unavailable().status(), StatusCode::SERVICE_UNAVAILABLE);
		assert_ne!(ErrorPayload::service_unavailable().status(), ErrorPayload::internal().status());

		let parsed: ErrorPayload =
			serde_json::from_str(r#"{"type":"SERVICE_UNAVAILABLE","message":"busy"}"#)
				.expect("Payload should deserialize.");

		assert_eq!(parsed, ErrorPayload::new(ErrorKind::ServiceUnavailable, "busy"));
	}
}
