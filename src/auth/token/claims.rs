//! Claim payloads signed into access and refresh tokens.

// self
use crate::{
	_prelude::*,
	auth::{TokenId, UserId, UserSnapshot},
};

/// Which half of a session pair a value belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
	/// Short-lived credential carrying the user snapshot.
	Access,
	/// Long-lived credential tracked server-side by identifier.
	Refresh,
}
impl TokenKind {
	/// Returns a stable label suitable for logs and error messages.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenKind::Access => "access",
			TokenKind::Refresh => "refresh",
		}
	}
}
impl Display for TokenKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Claims carried by an access token; immutable once signed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
	/// Password-free user snapshot.
	pub user: UserSnapshot,
	/// Issued-at instant (whole seconds on the wire).
	#[serde(with = "time::serde::timestamp")]
	pub iat: OffsetDateTime,
	/// Expiry instant (whole seconds on the wire).
	#[serde(with = "time::serde::timestamp")]
	pub exp: OffsetDateTime,
}
impl AccessTokenClaims {
	/// Builds claims valid for `lifetime` starting at `issued_at`.
	///
	/// Returns `None` if the expiry falls outside the representable date range.
	pub fn new(user: UserSnapshot, issued_at: OffsetDateTime, lifetime: Duration) -> Option<Self> {
		Some(Self { user, iat: issued_at, exp: issued_at.checked_add(lifetime)? })
	}
}

/// Claims carried by a refresh token; immutable once signed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
	/// Owning user.
	pub uid: UserId,
	/// The token's own identifier, mirrored into the token store.
	pub jti: TokenId,
	/// Issued-at instant (whole seconds on the wire).
	#[serde(with = "time::serde::timestamp")]
	pub iat: OffsetDateTime,
	/// Expiry instant (whole seconds on the wire).
	#[serde(with = "time::serde::timestamp")]
	pub exp: OffsetDateTime,
}
impl RefreshTokenClaims {
	/// Builds claims valid for `lifetime` starting at `issued_at`; `None` on expiry overflow.
	pub fn new(
		uid: UserId,
		jti: TokenId,
		issued_at: OffsetDateTime,
		lifetime: Duration,
	) -> Option<Self> {
		Some(Self { uid, jti, iat: issued_at, exp: issued_at.checked_add(lifetime)? })
	}

	/// Lifetime left at `instant`, clamped at zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.exp - instant;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}
}
