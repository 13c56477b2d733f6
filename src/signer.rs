//! Signing capability for session tokens.
//!
//! [`Signer`] is the only seam between the issuer and a JWT library. [`JwtSigner`] is the
//! production implementation: access tokens are RS256-signed with the configured private key and
//! carry a `kid` header (base64url SHA-256 of the public key PEM) so verifiers can pick the
//! right key; refresh tokens are HS256-signed with the shared refresh secret.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::{AccessTokenClaims, RefreshTokenClaims, TokenKind},
	config::SessionConfig,
	error::{ConfigError, SigningError},
};

/// Produces and verifies signed token strings.
pub trait Signer
where
	Self: Send + Sync,
{
	/// Signs access-token claims with the asymmetric private key.
	fn sign_access(&self, claims: &AccessTokenClaims) -> Result<String, SigningError>;

	/// Signs refresh-token claims with the shared secret.
	fn sign_refresh(&self, claims: &RefreshTokenClaims) -> Result<String, SigningError>;

	/// Verifies signature and expiry of an access token and returns its claims.
	fn verify_access(&self, token: &str) -> Result<AccessTokenClaims>;

	/// Verifies signature and expiry of a refresh token and returns its claims.
	fn verify_refresh(&self, token: &str) -> Result<RefreshTokenClaims>;
}

/// `jsonwebtoken`-backed [`Signer`].
#[derive(Clone)]
pub struct JwtSigner {
	access_encoding: EncodingKey,
	access_decoding: DecodingKey,
	refresh_encoding: EncodingKey,
	refresh_decoding: DecodingKey,
	key_id: String,
}
impl JwtSigner {
	/// Parses the key material held by `config`.
	pub fn new(config: &SessionConfig) -> Result<Self, ConfigError> {
		let access_encoding = EncodingKey::from_rsa_pem(&config.private_key_pem)
			.map_err(|source| ConfigError::InvalidKey { which: "private", source })?;
		let access_decoding = DecodingKey::from_rsa_pem(&config.public_key_pem)
			.map_err(|source| ConfigError::InvalidKey { which: "public", source })?;
		let secret = config.refresh_secret.expose().as_bytes();

		Ok(Self {
			access_encoding,
			access_decoding,
			refresh_encoding: EncodingKey::from_secret(secret),
			refresh_decoding: DecodingKey::from_secret(secret),
			key_id: key_fingerprint(&config.public_key_pem),
		})
	}

	/// Key identifier stamped into every access-token header.
	pub fn key_id(&self) -> &str {
		&self.key_id
	}

	fn invalid(kind: TokenKind, err: impl Display) -> Error {
		Error::InvalidToken { reason: format!("{kind} token rejected: {err}") }
	}
}
impl Signer for JwtSigner {
	fn sign_access(&self, claims: &AccessTokenClaims) -> Result<String, SigningError> {
		let mut header = Header::new(Algorithm::RS256);

		header.kid = Some(self.key_id.clone());

		jsonwebtoken::encode(&header, claims, &self.access_encoding)
			.map_err(|source| SigningError::Encode { kind: TokenKind::Access, source })
	}

	fn sign_refresh(&self, claims: &RefreshTokenClaims) -> Result<String, SigningError> {
		jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.refresh_encoding)
			.map_err(|source| SigningError::Encode { kind: TokenKind::Refresh, source })
	}

	fn verify_access(&self, token: &str) -> Result<AccessTokenClaims> {
		let header = jsonwebtoken::decode_header(token)
			.map_err(|e| Self::invalid(TokenKind::Access, e))?;

		if header.kid.as_deref() != Some(self.key_id.as_str()) {
			return Err(Self::invalid(TokenKind::Access, "unknown key id"));
		}

		jsonwebtoken::decode::<AccessTokenClaims>(
			token,
			&self.access_decoding,
			&Validation::new(Algorithm::RS256),
		)
		.map(|data| data.claims)
		.map_err(|e| Self::invalid(TokenKind::Access, e))
	}

	fn verify_refresh(&self, token: &str) -> Result<RefreshTokenClaims> {
		jsonwebtoken::decode::<RefreshTokenClaims>(
			token,
			&self.refresh_decoding,
			&Validation::new(Algorithm::HS256),
		)
		.map(|data| data.claims)
		.map_err(|e| Self::invalid(TokenKind::Refresh, e))
	}
}
impl Debug for JwtSigner {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("JwtSigner").field("key_id", &self.key_id).finish_non_exhaustive()
	}
}

/// Base64url (no padding) SHA-256 digest of a public key PEM.
pub fn key_fingerprint(public_key_pem: &[u8]) -> String {
	URL_SAFE_NO_PAD.encode(Sha256::digest(public_key_pem))
}
