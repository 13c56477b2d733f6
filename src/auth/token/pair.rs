//! Issued session credentials returned to sign-up/sign-in handlers.

// self
use crate::{
	_prelude::*,
	auth::{TokenId, TokenSecret},
};

/// Freshly signed refresh token plus the bookkeeping the issuer needs to track it.
#[derive(Clone, Debug)]
pub struct RefreshToken {
	/// Identifier recorded in the token store.
	pub id: TokenId,
	/// Signed string handed to the client.
	pub signed: TokenSecret,
	/// Lifetime at signing time; used as the store TTL.
	pub expires_in: Duration,
}

/// Access/refresh pair returned to the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
	/// Short-lived RS256 access token.
	pub access_token: TokenSecret,
	/// Long-lived HS256 refresh token.
	pub refresh_token: TokenSecret,
}
