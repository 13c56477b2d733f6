//! Crate-level error types shared by the guard, issuer, signer, and stores.

// std
use std::path::PathBuf;
// self
use crate::{_prelude::*, auth::TokenKind};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token signing failure.
	#[error(transparent)]
	Signing(#[from] SigningError),
	/// Identifier failed validation.
	#[error(transparent)]
	Identifier(#[from] crate::auth::IdentifierError),

	/// Presented token failed signature, expiry, or key checks.
	#[error("Token failed verification: {reason}.")]
	InvalidToken {
		/// Verifier-supplied reason string.
		reason: String,
	},
	/// Opaque failure surfaced to callers; the cause has already been logged.
	#[error("Internal server error.")]
	Internal,
}
impl Error {
	/// Returns `true` for the opaque internal failure.
	pub fn is_internal(&self) -> bool {
		matches!(self, Self::Internal)
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// No private key PEM was supplied.
	#[error("The access-token private key is required.")]
	MissingPrivateKey,
	/// No public key PEM was supplied.
	#[error("The access-token public key is required.")]
	MissingPublicKey,
	/// The refresh-token secret was empty.
	#[error("The refresh-token secret cannot be empty.")]
	EmptyRefreshSecret,
	/// A token lifetime was zero or negative.
	#[error("The {which} token lifetime must be positive.")]
	NonPositiveLifetime {
		/// Which lifetime failed validation.
		which: TokenKind,
	},
	/// A token lifetime exceeded the accepted maximum.
	#[error("The {which} token lifetime cannot exceed {max}.")]
	LifetimeTooLong {
		/// Which lifetime failed validation.
		which: TokenKind,
		/// Accepted maximum.
		max: Duration,
	},
	/// The request deadline was zero.
	#[error("The request timeout must be positive.")]
	ZeroRequestTimeout,
	/// Key material could not be parsed.
	#[error("The {which} key is not a valid PEM-encoded RSA key.")]
	InvalidKey {
		/// Which key failed to parse.
		which: &'static str,
		/// Underlying parser failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// Key file could not be read.
	#[error("Failed to read key file {}.", .path.display())]
	ReadKeyFile {
		/// Offending path.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// A required environment variable is unset.
	#[error("Environment variable {name} is required.")]
	MissingEnv {
		/// Variable name.
		name: &'static str,
	},
	/// An environment variable could not be parsed.
	#[error("Environment variable {name} is invalid.")]
	InvalidEnv {
		/// Variable name.
		name: &'static str,
		/// Underlying parse failure.
		#[source]
		source: BoxError,
	},
	/// Settings document failed to deserialize.
	#[error("Settings are invalid at `{}`.", .source.path())]
	Settings {
		/// Structured deserialization failure carrying the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl ConfigError {
	/// Wraps an environment parsing failure.
	pub fn invalid_env(
		name: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::InvalidEnv { name, source: Box::new(src) }
	}
}

/// Failures raised while producing signed tokens.
#[derive(Debug, ThisError)]
pub enum SigningError {
	/// The JWT encoder rejected the claims or key.
	#[error("Failed to sign the {kind} token.")]
	Encode {
		/// Token being signed.
		kind: TokenKind,
		/// Underlying encoder failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// Non-JWT signer backend failure.
	#[error("Signer backend failed for the {kind} token: {message}.")]
	Backend {
		/// Token being signed.
		kind: TokenKind,
		/// Human-readable error payload.
		message: String,
	},
}
