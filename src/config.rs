//! Session and guard configuration, plus file/environment loading.
//!
//! [`SessionConfig`] holds validated key material and token lifetimes; build it with
//! [`SessionConfig::builder`]. [`SessionSettings`] is the serialized form that deployments keep
//! in a JSON file or the process environment and resolves into both configs at startup.

// std
use std::{
	env, fs,
	num::ParseIntError,
	path::{Path, PathBuf},
	time::Duration as StdDuration,
};
// self
use crate::{
	_prelude::*,
	auth::{TokenKind, TokenSecret},
	error::ConfigError,
	guard::ErrorPayload,
};

/// Default access-token lifetime (15 minutes).
pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::minutes(15);
/// Default refresh-token lifetime (30 days).
pub const DEFAULT_REFRESH_TOKEN_TTL: Duration = Duration::days(30);
/// Default per-request deadline (7 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(7);
/// Longest accepted token lifetime (10 years); expiries past it risk leaving the date range.
pub const MAX_TOKEN_TTL: Duration = Duration::days(3_650);

/// Validated key material and lifetimes consumed by the signer and issuer.
#[derive(Clone)]
pub struct SessionConfig {
	/// Access-token lifetime.
	pub access_token_ttl: Duration,
	/// Refresh-token lifetime; also the token-store TTL.
	pub refresh_token_ttl: Duration,
	/// PEM-encoded RSA private key for access tokens.
	pub private_key_pem: Vec<u8>,
	/// PEM-encoded RSA public key matching `private_key_pem`.
	pub public_key_pem: Vec<u8>,
	/// Shared HS256 secret for refresh tokens.
	pub refresh_secret: TokenSecret,
}
impl SessionConfig {
	/// Returns a builder seeded with the default lifetimes.
	pub fn builder() -> SessionConfigBuilder {
		SessionConfigBuilder::default()
	}
}
impl Debug for SessionConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionConfig")
			.field("access_token_ttl", &self.access_token_ttl)
			.field("refresh_token_ttl", &self.refresh_token_ttl)
			.field("private_key_pem", &"<redacted>")
			.field("public_key_pem_len", &self.public_key_pem.len())
			.field("refresh_secret", &self.refresh_secret)
			.finish()
	}
}

/// Builder for [`SessionConfig`].
#[derive(Debug)]
pub struct SessionConfigBuilder {
	access_token_ttl: Duration,
	refresh_token_ttl: Duration,
	private_key_pem: Option<Vec<u8>>,
	public_key_pem: Option<Vec<u8>>,
	refresh_secret: Option<TokenSecret>,
}
impl SessionConfigBuilder {
	/// Sets the access-token lifetime.
	pub fn access_token_ttl(mut self, ttl: Duration) -> Self {
		self.access_token_ttl = ttl;

		self
	}

	/// Sets the refresh-token lifetime.
	pub fn refresh_token_ttl(mut self, ttl: Duration) -> Self {
		self.refresh_token_ttl = ttl;

		self
	}

	/// Provides the PEM-encoded RSA private key.
	pub fn private_key_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
		self.private_key_pem = Some(pem.into());

		self
	}

	/// Provides the PEM-encoded RSA public key.
	pub fn public_key_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
		self.public_key_pem = Some(pem.into());

		self
	}

	/// Provides the refresh-token shared secret.
	pub fn refresh_secret(mut self, secret: impl Into<String>) -> Self {
		self.refresh_secret = Some(TokenSecret::new(secret));

		self
	}

	/// Validates presence and lifetimes. PEM contents are parsed by the signer.
	///
	/// Lifetimes must lie in `(0, MAX_TOKEN_TTL]`.
	pub fn build(self) -> Result<SessionConfig, ConfigError> {
		let private_key_pem =
			self.private_key_pem.filter(|pem| !pem.is_empty()).ok_or(ConfigError::MissingPrivateKey)?;
		let public_key_pem =
			self.public_key_pem.filter(|pem| !pem.is_empty()).ok_or(ConfigError::MissingPublicKey)?;
		let refresh_secret = self
			.refresh_secret
			.filter(|secret| !secret.is_empty())
			.ok_or(ConfigError::EmptyRefreshSecret)?;

		validate_lifetime(TokenKind::Access, self.access_token_ttl)?;
		validate_lifetime(TokenKind::Refresh, self.refresh_token_ttl)?;

		Ok(SessionConfig {
			access_token_ttl: self.access_token_ttl,
			refresh_token_ttl: self.refresh_token_ttl,
			private_key_pem,
			public_key_pem,
			refresh_secret,
		})
	}
}
impl Default for SessionConfigBuilder {
	fn default() -> Self {
		Self {
			access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL,
			refresh_token_ttl: DEFAULT_REFRESH_TOKEN_TTL,
			private_key_pem: None,
			public_key_pem: None,
			refresh_secret: None,
		}
	}
}

/// Deadline and timeout payload applied by [`TimeoutGuard`](crate::guard::TimeoutGuard).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardConfig {
	/// Relative deadline applied to every request.
	pub deadline: StdDuration,
	/// Payload committed when the deadline wins.
	pub timeout_payload: ErrorPayload,
}
impl GuardConfig {
	/// Creates a config with the default 503 timeout payload; a zero deadline is rejected.
	pub fn new(deadline: StdDuration) -> Result<Self, ConfigError> {
		if deadline.is_zero() {
			return Err(ConfigError::ZeroRequestTimeout);
		}

		Ok(Self { deadline, timeout_payload: ErrorPayload::service_unavailable() })
	}

	/// Overrides the payload committed on timeout.
	pub fn with_timeout_payload(mut self, payload: ErrorPayload) -> Self {
		self.timeout_payload = payload;

		self
	}
}
impl Default for GuardConfig {
	fn default() -> Self {
		Self {
			deadline: DEFAULT_REQUEST_TIMEOUT,
			timeout_payload: ErrorPayload::service_unavailable(),
		}
	}
}

/// Serialized deployment settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSettings {
	/// Path to the PEM-encoded RSA private key.
	pub private_key_file: PathBuf,
	/// Path to the PEM-encoded RSA public key.
	pub public_key_file: PathBuf,
	/// Refresh-token shared secret.
	pub refresh_secret: TokenSecret,
	/// Access-token lifetime in seconds.
	#[serde(default = "SessionSettings::default_access_token_exp_secs")]
	pub access_token_exp_secs: i64,
	/// Refresh-token lifetime in seconds.
	#[serde(default = "SessionSettings::default_refresh_token_exp_secs")]
	pub refresh_token_exp_secs: i64,
	/// Per-request deadline in milliseconds.
	#[serde(default = "SessionSettings::default_request_timeout_ms")]
	pub request_timeout_ms: u64,
}
impl SessionSettings {
	/// Parses settings from JSON, reporting the failing field path on error.
	pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
		let de = &mut serde_json::Deserializer::from_slice(bytes);

		serde_path_to_error::deserialize(de).map_err(|source| ConfigError::Settings { source })
	}

	/// Reads `PRIV_KEY_FILE`, `PUB_KEY_FILE`, `REFRESH_SECRET`, `ACCESS_TOKEN_EXP`,
	/// `REFRESH_TOKEN_EXP`, and the optional `REQUEST_TIMEOUT_MS` from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let required = |name: &'static str| lookup(name).ok_or(ConfigError::MissingEnv { name });
		let parse_secs = |name: &'static str| -> Result<i64, ConfigError> {
			required(name)?.trim().parse().map_err(|e: ParseIntError| ConfigError::invalid_env(name, e))
		};
		let request_timeout_ms = match lookup("REQUEST_TIMEOUT_MS") {
			Some(raw) => raw
				.trim()
				.parse()
				.map_err(|e: ParseIntError| ConfigError::invalid_env("REQUEST_TIMEOUT_MS", e))?,
			None => Self::default_request_timeout_ms(),
		};

		Ok(Self {
			private_key_file: required("PRIV_KEY_FILE")?.into(),
			public_key_file: required("PUB_KEY_FILE")?.into(),
			refresh_secret: TokenSecret::new(required("REFRESH_SECRET")?),
			access_token_exp_secs: parse_secs("ACCESS_TOKEN_EXP")?,
			refresh_token_exp_secs: parse_secs("REFRESH_TOKEN_EXP")?,
			request_timeout_ms,
		})
	}

	/// Loads key files and resolves both configs.
	pub fn into_configs(self) -> Result<(SessionConfig, GuardConfig), ConfigError> {
		let guard = GuardConfig::new(StdDuration::from_millis(self.request_timeout_ms))?;
		let session = SessionConfig::builder()
			.private_key_pem(read_key_file(&self.private_key_file)?)
			.public_key_pem(read_key_file(&self.public_key_file)?)
			.refresh_secret(self.refresh_secret.expose())
			.access_token_ttl(Duration::seconds(self.access_token_exp_secs))
			.refresh_token_ttl(Duration::seconds(self.refresh_token_exp_secs))
			.build()?;

		Ok((session, guard))
	}

	fn default_access_token_exp_secs() -> i64 {
		DEFAULT_ACCESS_TOKEN_TTL.whole_seconds()
	}

	fn default_refresh_token_exp_secs() -> i64 {
		DEFAULT_REFRESH_TOKEN_TTL.whole_seconds()
	}

	fn default_request_timeout_ms() -> u64 {
		DEFAULT_REQUEST_TIMEOUT.as_millis() as u64
	}
}

fn validate_lifetime(which: TokenKind, ttl: Duration) -> Result<(), ConfigError> {
	if !ttl.is_positive() {
		return Err(ConfigError::NonPositiveLifetime { which });
	}
	if ttl > MAX_TOKEN_TTL {
		return Err(ConfigError::LifetimeTooLong { which, max: MAX_TOKEN_TTL });
	}

	Ok(())
}

fn read_key_file(path: &Path) -> Result<Vec<u8>, ConfigError> {
	fs::read(path).map_err(|source| ConfigError::ReadKeyFile { path: path.to_owned(), source })
}
