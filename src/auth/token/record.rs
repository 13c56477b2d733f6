//! Token-store records marking which refresh-token identifiers are live.

// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, TokenId, UserId},
};

/// Suffix separating the user and token halves of a store key.
pub const REFRESH_TOKEN_SUFFIX: &str = "refreshtoken";

/// Lifecycle status of a record at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
	/// The refresh token is still trusted.
	Live,
	/// The TTL elapsed; the store treats the key as absent.
	Expired,
}

/// Store key `{userID}-refreshtoken:{tokenID}`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordKey {
	/// Owning user.
	pub user: UserId,
	/// Refresh-token identifier.
	pub token: TokenId,
}
impl RecordKey {
	/// Builds the key for a user/token pair.
	pub fn new(user: UserId, token: TokenId) -> Self {
		Self { user, token }
	}
}
impl Debug for RecordKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "RecordKey({self})")
	}
}
impl Display for RecordKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}-{REFRESH_TOKEN_SUFFIX}:{}", self.user, self.token)
	}
}
impl FromStr for RecordKey {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let malformed = || IdentifierError::Malformed { kind: "RecordKey", value: s.to_owned() };
		let (user, token) = s.split_once(':').ok_or_else(malformed)?;
		let user = user
			.strip_suffix(REFRESH_TOKEN_SUFFIX)
			.and_then(|head| head.strip_suffix('-'))
			.ok_or_else(malformed)?;

		Ok(Self { user: user.parse()?, token: token.parse()? })
	}
}
impl From<RecordKey> for String {
	fn from(value: RecordKey) -> Self {
		value.to_string()
	}
}
impl TryFrom<String> for RecordKey {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

/// Presence marker with an absolute expiry; the store keeps no token content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
	/// Store key.
	pub key: RecordKey,
	/// Instant after which the record no longer counts as present.
	#[serde(with = "time::serde::timestamp")]
	pub expires_at: OffsetDateTime,
}
impl TokenRecord {
	/// Creates a record that lives for `ttl` from `now`; `None` if the expiry overflows.
	pub fn new(key: RecordKey, now: OffsetDateTime, ttl: Duration) -> Option<Self> {
		Some(Self { key, expires_at: now.checked_add(ttl)? })
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> RecordStatus {
		if instant >= self.expires_at { RecordStatus::Expired } else { RecordStatus::Live }
	}

	/// Returns `true` if the record is live at the provided instant.
	pub fn is_live_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), RecordStatus::Live)
	}
}
