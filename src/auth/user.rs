//! Account models handed to the session issuer by the sign-up/sign-in flows.

// self
use crate::{_prelude::*, auth::UserId};

/// Opaque one-way password hash; never serialized and redacted from logs.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);
impl PasswordHash {
	/// Wraps an already hashed password.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the encoded hash for comparison by the hashing capability.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for PasswordHash {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("PasswordHash(<redacted>)")
	}
}

/// Account row as loaded by the user repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
	/// Account identifier.
	pub uid: UserId,
	/// Sign-in email address.
	pub email: String,
	/// Hashed password; excluded from every token.
	pub password: PasswordHash,
	/// Display name.
	pub name: String,
	/// Avatar location.
	pub image_url: String,
	/// Personal website.
	pub website: String,
}
impl User {
	/// Returns every field except the password hash.
	pub fn snapshot(&self) -> UserSnapshot {
		UserSnapshot {
			uid: self.uid,
			email: self.email.clone(),
			name: self.name.clone(),
			image_url: self.image_url.clone(),
			website: self.website.clone(),
		}
	}
}

/// Password-free user view embedded in access tokens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
	/// Account identifier.
	pub uid: UserId,
	/// Sign-in email address.
	pub email: String,
	/// Display name.
	#[serde(default)]
	pub name: String,
	/// Avatar location.
	#[serde(default)]
	pub image_url: String,
	/// Personal website.
	#[serde(default)]
	pub website: String,
}
