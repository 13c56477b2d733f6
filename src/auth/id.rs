//! Strongly typed UUID identifiers for users and refresh tokens.

// std
use std::ops::Deref;
// crates.io
use uuid::Uuid;
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(Uuid);
		impl $name {
			/// Parses an identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				parse_view($kind, value.as_ref()).map(Self)
			}

			/// Wraps an already generated UUID.
			pub fn from_uuid(value: Uuid) -> Result<Self, IdentifierError> {
				if value.is_nil() {
					return Err(IdentifierError::Nil { kind: $kind });
				}

				Ok(Self(value))
			}

			/// Returns the underlying UUID.
			pub const fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}
		impl Deref for $name {
			type Target = Uuid;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0.hyphenated().to_string()
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::new(value)
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0.hyphenated())
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				Display::fmt(&self.0.hyphenated(), f)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (user, token).
		kind: &'static str,
	},
	/// The identifier is not a hyphenated UUID.
	#[error("{kind} identifier `{value}` is not a hyphenated UUID.")]
	Malformed {
		/// Kind of identifier (user, token).
		kind: &'static str,
		/// Offending input.
		value: String,
	},
	/// The identifier was the nil UUID.
	#[error("{kind} identifier cannot be the nil UUID.")]
	Nil {
		/// Kind of identifier (user, token).
		kind: &'static str,
	},
}

def_id! { UserId, "Unique identifier for an account.", "User" }
def_id! { TokenId, "Unique identifier for an issued refresh token.", "Token" }

// Hyphenated form only, so store keys have exactly one spelling per identifier.
const HYPHENATED_LEN: usize = 36;

fn parse_view(kind: &'static str, view: &str) -> Result<Uuid, IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}

	let malformed = || IdentifierError::Malformed { kind, value: view.to_owned() };

	if view.len() != HYPHENATED_LEN {
		return Err(malformed());
	}

	let uuid = Uuid::try_parse(view).map_err(|_| malformed())?;

	if uuid.is_nil() {
		return Err(IdentifierError::Nil { kind });
	}

	Ok(uuid)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_require_hyphenated_uuids() {
		assert!(UserId::new("").is_err(), "Empty identifiers must be rejected.");
		assert!(UserId::new("not-a-uuid").is_err());
		assert!(
			UserId::new("6f1f5c8e2b1a4d5e9c3b0a7e4d2f9b61").is_err(),
			"Simple UUID spelling must be rejected."
		);
		assert!(UserId::new(" 6f1f5c8e-2b1a-4d5e-9c3b-0a7e4d2f9b61").is_err());

		let user = UserId::new("6F1F5C8E-2B1A-4D5E-9C3B-0A7E4D2F9B61")
			.expect("Uppercase hyphenated UUIDs should be accepted.");

		assert_eq!(user.to_string(), "6f1f5c8e-2b1a-4d5e-9c3b-0a7e4d2f9b61");
	}

	#[test]
	fn nil_uuid_is_rejected() {
		assert_eq!(
			TokenId::new("00000000-0000-0000-0000-000000000000"),
			Err(IdentifierError::Nil { kind: "Token" })
		);
		assert!(TokenId::from_uuid(Uuid::nil()).is_err());
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let token: TokenId = serde_json::from_str("\"0b5c3c1e-8d53-4a8b-9a43-2f0f3b1f1d10\"")
			.expect("Token identifier should deserialize successfully.");

		assert_eq!(format!("{token:?}"), "Token(0b5c3c1e-8d53-4a8b-9a43-2f0f3b1f1d10)");
		assert!(serde_json::from_str::<TokenId>("\"with space\"").is_err());
		assert_eq!(
			serde_json::to_string(&token).expect("Token identifier should serialize."),
			"\"0b5c3c1e-8d53-4a8b-9a43-2f0f3b1f1d10\""
		);
	}
}
