//! Session issuance and rotation.
//!
//! [`SessionIssuer::issue_pair`] signs an access token from the password-free user snapshot,
//! mints a refresh token under a fresh identifier, records that identifier in the
//! [`TokenStore`] for the refresh lifetime, and finally drops the record of the refresh token
//! being rotated out. Any signing or store failure is logged and collapsed into
//! [`Error::Internal`]; tokens produced before the failure are discarded. Nothing is retried.
//!
//! Rotation is two independent store calls. A failed delete after a successful set leaves both
//! identifiers live until the old record's TTL runs out, and two rotations racing on the same
//! previous identifier may both succeed. Callers that need stricter guarantees must serialize
//! rotations per user themselves.

mod metrics;

pub use metrics::IssuerMetrics;

// crates.io
use rand::{RngCore, SeedableRng, rngs::StdRng};
use uuid::Builder;
// self
use crate::{
	_prelude::*,
	auth::{
		AccessTokenClaims, RecordKey, RefreshToken, RefreshTokenClaims, TokenId, TokenPair,
		TokenSecret, User, UserId,
	},
	config::SessionConfig,
	obs::{self, OpSpan, Operation, Outcome},
	signer::{JwtSigner, Signer},
	store::TokenStore,
};

const EXPIRY_OUT_OF_RANGE: &str = "token expiry is outside the representable date range";

/// Source of refresh-token identifiers.
pub trait IdGenerator
where
	Self: Send + Sync,
{
	/// Returns an identifier that has not been handed out before.
	fn next_id(&self) -> Result<TokenId>;
}

/// Random UUID (version 4 layout) generator over an explicitly owned RNG.
pub struct RandomIdGenerator {
	rng: Mutex<StdRng>,
}
impl RandomIdGenerator {
	/// Seeds the generator from the operating system.
	pub fn new() -> Self {
		Self { rng: Mutex::new(StdRng::from_os_rng()) }
	}

	/// Deterministic generator for tests and reproducible fixtures.
	pub fn seeded(seed: u64) -> Self {
		Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
	}
}
impl Default for RandomIdGenerator {
	fn default() -> Self {
		Self::new()
	}
}
impl Debug for RandomIdGenerator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("RandomIdGenerator(..)")
	}
}
impl IdGenerator for RandomIdGenerator {
	fn next_id(&self) -> Result<TokenId> {
		let mut bytes = [0_u8; 16];

		self.rng.lock().fill_bytes(&mut bytes);

		Ok(TokenId::from_uuid(Builder::from_random_bytes(bytes).into_uuid())?)
	}
}

/// Issues and rotates access/refresh pairs.
pub struct SessionIssuer {
	signer: Arc<dyn Signer>,
	store: Arc<dyn TokenStore>,
	ids: Arc<dyn IdGenerator>,
	access_token_ttl: Duration,
	refresh_token_ttl: Duration,
	metrics: Arc<IssuerMetrics>,
}
impl SessionIssuer {
	/// Builds an issuer with a [`JwtSigner`] over `config` and an OS-seeded identifier generator.
	pub fn new(config: &SessionConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
		let signer = JwtSigner::new(config)?;

		Ok(Self::with_parts(
			Arc::new(signer),
			store,
			Arc::new(RandomIdGenerator::new()),
			config.access_token_ttl,
			config.refresh_token_ttl,
		))
	}

	/// Assembles an issuer from explicit capabilities.
	pub fn with_parts(
		signer: Arc<dyn Signer>,
		store: Arc<dyn TokenStore>,
		ids: Arc<dyn IdGenerator>,
		access_token_ttl: Duration,
		refresh_token_ttl: Duration,
	) -> Self {
		Self {
			signer,
			store,
			ids,
			access_token_ttl,
			refresh_token_ttl,
			metrics: Default::default(),
		}
	}

	/// Counters shared with whoever exports them.
	pub fn metrics(&self) -> &Arc<IssuerMetrics> {
		&self.metrics
	}

	/// Signs a new pair for `user` and, when `previous` is given, rotates that refresh token out.
	pub async fn issue_pair(&self, user: &User, previous: Option<&TokenId>) -> Result<TokenPair> {
		const OP: Operation = Operation::IssuePair;

		let span = OpSpan::new(OP, "issue_pair");

		obs::record_outcome(OP, Outcome::Attempt);
		self.metrics.record_attempt();

		let result = span.instrument(self.rotate(user, previous)).await;

		match &result {
			Ok(_) => {
				obs::record_outcome(OP, Outcome::Success);
				self.metrics.record_success();
			},
			Err(_) => {
				obs::record_outcome(OP, Outcome::Failure);
				self.metrics.record_failure();
			},
		}

		result
	}

	/// Drops the store record for `token`, ending that refresh token's server-side validity.
	pub async fn revoke(&self, user: UserId, token: TokenId) -> Result<()> {
		const OP: Operation = Operation::Revoke;

		let span = OpSpan::new(OP, "revoke");

		obs::record_outcome(OP, Outcome::Attempt);

		let key = RecordKey::new(user, token);
		let result = span
			.instrument(self.store.delete(&key))
			.await
			.map_err(|e| internal(OP, "store_delete", &e));

		match &result {
			Ok(()) => {
				obs::record_outcome(OP, Outcome::Success);
				self.metrics.record_revocation();
			},
			Err(_) => {
				obs::record_outcome(OP, Outcome::Failure);
				self.metrics.record_failure();
			},
		}

		result
	}

	/// Verifies an access token issued by this issuer's signer.
	pub fn verify_access(&self, token: &str) -> Result<AccessTokenClaims> {
		self.signer.verify_access(token)
	}

	/// Verifies a refresh token's signature and expiry. The store is not consulted.
	pub fn verify_refresh(&self, token: &str) -> Result<RefreshTokenClaims> {
		self.signer.verify_refresh(token)
	}

	async fn rotate(&self, user: &User, previous: Option<&TokenId>) -> Result<TokenPair> {
		const OP: Operation = Operation::IssuePair;

		let now = OffsetDateTime::now_utc();
		let access_claims = AccessTokenClaims::new(user.snapshot(), now, self.access_token_ttl)
			.ok_or_else(|| internal(OP, "access_claims", &EXPIRY_OUT_OF_RANGE))?;
		let access_token = self
			.signer
			.sign_access(&access_claims)
			.map_err(|e| internal(OP, "sign_access", &e))?;
		let refresh = self.mint_refresh(user.uid, now)?;

		self.store
			.set(RecordKey::new(user.uid, refresh.id), refresh.expires_in)
			.await
			.map_err(|e| internal(OP, "store_set", &e))?;

		if let Some(previous) = previous {
			self.store
				.delete(&RecordKey::new(user.uid, *previous))
				.await
				.map_err(|e| internal(OP, "store_delete", &e))?;
		}

		Ok(TokenPair { access_token: TokenSecret::new(access_token), refresh_token: refresh.signed })
	}

	fn mint_refresh(&self, uid: UserId, now: OffsetDateTime) -> Result<RefreshToken> {
		const OP: Operation = Operation::IssuePair;

		let id = self.ids.next_id().map_err(|e| internal(OP, "next_id", &e))?;
		let claims = RefreshTokenClaims::new(uid, id, now, self.refresh_token_ttl)
			.ok_or_else(|| internal(OP, "refresh_claims", &EXPIRY_OUT_OF_RANGE))?;
		let signed =
			self.signer.sign_refresh(&claims).map_err(|e| internal(OP, "sign_refresh", &e))?;

		Ok(RefreshToken { id, signed: TokenSecret::new(signed), expires_in: claims.remaining_at(now) })
	}
}
impl Debug for SessionIssuer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionIssuer")
			.field("access_token_ttl", &self.access_token_ttl)
			.field("refresh_token_ttl", &self.refresh_token_ttl)
			.field("metrics", &self.metrics)
			.finish_non_exhaustive()
	}
}

fn internal(op: Operation, stage: &'static str, cause: &dyn Display) -> Error {
	obs::log_internal(op, stage, cause);

	Error::Internal
}
