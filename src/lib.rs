//! Request lifecycle core for account services: race every handler against a deadline without
//! ever double-writing the response, and mint rotating access/refresh session pairs backed by a
//! TTL token store.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod issuer;
pub mod obs;
pub mod signer;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports, key fixtures, and store doubles for tests; enabled via `cfg(test)`
	//! or the `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
	// self
	use crate::{
		auth::{PasswordHash, RecordKey, User, UserId},
		config::SessionConfig,
		issuer::{RandomIdGenerator, SessionIssuer},
		signer::JwtSigner,
		store::{MemoryTokenStore, StoreError, StoreFuture, TokenStore},
	};

	/// PKCS#8 RSA private key used to sign access tokens in tests.
	pub const TEST_PRIVATE_KEY_PEM: &[u8] = include_bytes!("../tests/fixtures/rsa_private_test.pem");
	/// SPKI RSA public key matching [`TEST_PRIVATE_KEY_PEM`].
	pub const TEST_PUBLIC_KEY_PEM: &[u8] = include_bytes!("../tests/fixtures/rsa_public_test.pem");
	/// SPKI RSA public key from an unrelated key pair.
	pub const TEST_OTHER_PUBLIC_KEY_PEM: &[u8] =
		include_bytes!("../tests/fixtures/rsa_public_other.pem");
	/// Shared secret used to sign refresh tokens in tests.
	pub const TEST_REFRESH_SECRET: &str = "secret1sdsadasdasdasdasda23";

	/// Builds a session config with a 15 minute access and 30 day refresh lifetime.
	pub fn test_session_config() -> SessionConfig {
		SessionConfig::builder()
			.private_key_pem(TEST_PRIVATE_KEY_PEM)
			.public_key_pem(TEST_PUBLIC_KEY_PEM)
			.refresh_secret(TEST_REFRESH_SECRET)
			.access_token_ttl(Duration::minutes(15))
			.refresh_token_ttl(Duration::days(30))
			.build()
			.expect("Test session config should build successfully.")
	}

	/// Absolute path of a file under `tests/fixtures`.
	pub fn test_fixture_path(name: &str) -> String {
		format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
	}

	/// Returns a fully populated user fixture.
	pub fn test_user() -> User {
		User {
			uid: UserId::new("6f1f5c8e-2b1a-4d5e-9c3b-0a7e4d2f9b61")
				.expect("User identifier fixture should be valid."),
			email: "alice@example.com".into(),
			password: PasswordHash::new("$2a$10$abcdefghijklmnopqrstuuvwxyzABCDEFGHIJKLMNOPQRS"),
			name: "Alice".into(),
			image_url: "https://cdn.example.com/alice.png".into(),
			website: "https://alice.example.com".into(),
		}
	}

	/// Returns a second user, distinct from [`test_user`] in every field.
	pub fn test_other_user() -> User {
		User {
			uid: UserId::new("9a2b7c4d-1e3f-4a5b-8c6d-7e8f9a0b1c2d")
				.expect("User identifier fixture should be valid."),
			email: "bob@example.com".into(),
			password: PasswordHash::new("$2a$10$zyxwvutsrqponmlkjihgfedcbaZYXWVUTSRQPONMLKJIH"),
			name: "Bob".into(),
			image_url: String::new(),
			website: String::new(),
		}
	}

	/// Builds an issuer over `store` using the test keys and a seeded identifier generator.
	pub fn build_test_issuer(store: Arc<dyn TokenStore>) -> SessionIssuer {
		let config = test_session_config();
		let signer = JwtSigner::new(&config).expect("Test signer should accept fixture keys.");

		SessionIssuer::with_parts(
			Arc::new(signer),
			store,
			Arc::new(RandomIdGenerator::seeded(7)),
			config.access_token_ttl,
			config.refresh_token_ttl,
		)
	}

	/// [`TokenStore`] double that forwards to a [`MemoryTokenStore`] unless told to fail.
	#[derive(Debug, Default)]
	pub struct FlakyTokenStore {
		/// Backing store observed by assertions.
		pub inner: MemoryTokenStore,
		fail_set: AtomicBool,
		fail_delete: AtomicBool,
		deletes: AtomicUsize,
	}
	impl FlakyTokenStore {
		/// Makes every subsequent `set` fail with a backend error.
		pub fn fail_sets(&self, fail: bool) {
			self.fail_set.store(fail, Ordering::SeqCst);
		}

		/// Makes every subsequent `delete` fail with a backend error.
		pub fn fail_deletes(&self, fail: bool) {
			self.fail_delete.store(fail, Ordering::SeqCst);
		}

		/// Number of `delete` calls observed, including failed ones.
		pub fn delete_calls(&self) -> usize {
			self.deletes.load(Ordering::SeqCst)
		}
	}
	impl TokenStore for FlakyTokenStore {
		fn set(&self, key: RecordKey, ttl: Duration) -> StoreFuture<'_, ()> {
			if self.fail_set.load(Ordering::SeqCst) {
				return Box::pin(async {
					Err(StoreError::Backend { message: "injected set failure".into() })
				});
			}

			self.inner.set(key, ttl)
		}

		fn delete<'a>(&'a self, key: &'a RecordKey) -> StoreFuture<'a, ()> {
			self.deletes.fetch_add(1, Ordering::SeqCst);

			if self.fail_delete.load(Ordering::SeqCst) {
				return Box::pin(async {
					Err(StoreError::Backend { message: "injected delete failure".into() })
				});
			}

			self.inner.delete(key)
		}

		fn contains<'a>(&'a self, key: &'a RecordKey) -> StoreFuture<'a, bool> {
			self.inner.contains(key)
		}
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{Error, Result};
}

pub use http;
pub use jsonwebtoken;
