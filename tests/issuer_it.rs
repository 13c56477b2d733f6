// std
use std::{env, fs, process};
// crates.io
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
// self
use account_session::{
	_preludet::*,
	auth::{AccessTokenClaims, RecordKey},
	config::SessionSettings,
	issuer::SessionIssuer,
	signer::key_fingerprint,
	store::{FileTokenStore, MemoryTokenStore, TokenStore},
};

fn record_key(issuer: &SessionIssuer, refresh_token: &str) -> RecordKey {
	let claims = issuer.verify_refresh(refresh_token).expect("Refresh token should verify.");

	RecordKey::new(claims.uid, claims.jti)
}

#[tokio::test]
async fn access_token_decodes_to_password_free_snapshot() {
	let issuer = build_test_issuer(Arc::new(MemoryTokenStore::default()));
	let alice = test_user();
	let pair = issuer.issue_pair(&alice, None).await.expect("Issuance should succeed.");
	let validation = Validation::new(Algorithm::RS256);
	let decoded = jsonwebtoken::decode::<AccessTokenClaims>(
		pair.access_token.expose(),
		&DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY_PEM).expect("Fixture key should parse."),
		&validation,
	)
	.expect("Access token should verify with the fixture public key.");

	assert_eq!(decoded.claims.user, alice.snapshot());
	assert_eq!(
		decoded.header.kid.as_deref(),
		Some(key_fingerprint(TEST_PUBLIC_KEY_PEM).as_str())
	);
	assert!(
		jsonwebtoken::decode::<AccessTokenClaims>(
			pair.access_token.expose(),
			&DecodingKey::from_rsa_pem(TEST_OTHER_PUBLIC_KEY_PEM)
				.expect("Fixture key should parse."),
			&validation,
		)
		.is_err(),
		"A different key pair must not verify the token."
	);

	let json = serde_json::to_value(&pair).expect("Token pair should serialize.");

	assert!(json.get("accessToken").is_some());
	assert!(json.get("refreshToken").is_some());
}

#[tokio::test]
async fn rotation_keeps_users_apart() {
	let store = Arc::new(MemoryTokenStore::default());
	let issuer = build_test_issuer(store.clone());
	let alice = test_user();
	let bob = test_other_user();
	let alice_first = issuer.issue_pair(&alice, None).await.expect("Issuance should succeed.");
	let bob_first = issuer.issue_pair(&bob, None).await.expect("Issuance should succeed.");
	let alice_key = record_key(&issuer, alice_first.refresh_token.expose());
	let bob_key = record_key(&issuer, bob_first.refresh_token.expose());
	let alice_second = issuer
		.issue_pair(&alice, Some(&alice_key.token))
		.await
		.expect("Rotation should succeed.");
	let alice_rotated = record_key(&issuer, alice_second.refresh_token.expose());

	assert!(!store.contains(&alice_key).await.expect("Lookup should succeed."));
	assert!(store.contains(&alice_rotated).await.expect("Lookup should succeed."));
	assert!(store.contains(&bob_key).await.expect("Bob's record must survive Alice's rotation."));
	assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn failed_delete_reports_internal_but_keeps_new_record() {
	let store = Arc::new(FlakyTokenStore::default());
	let issuer = build_test_issuer(store.clone());
	let alice = test_user();
	let first = issuer.issue_pair(&alice, None).await.expect("Issuance should succeed.");
	let first_key = record_key(&issuer, first.refresh_token.expose());

	store.fail_deletes(true);

	let err = issuer
		.issue_pair(&alice, Some(&first_key.token))
		.await
		.expect_err("A failed delete must fail the rotation.");

	assert!(err.is_internal());
	assert_eq!(err.to_string(), "Internal server error.");
	assert_eq!(store.inner.len(), 2, "Both the old and the new record are left live.");
	assert_eq!(issuer.metrics().attempts(), 2);
	assert_eq!(issuer.metrics().failures(), 1);
}

#[tokio::test]
async fn settings_and_file_store_wire_up_end_to_end() {
	let settings = SessionSettings::from_json_slice(
		serde_json::json!({
			"private_key_file": test_fixture_path("rsa_private_test.pem"),
			"public_key_file": test_fixture_path("rsa_public_test.pem"),
			"refresh_secret": TEST_REFRESH_SECRET,
			"access_token_exp_secs": 60,
			"refresh_token_exp_secs": 3_600,
			"request_timeout_ms": 500
		})
		.to_string()
		.as_bytes(),
	)
	.expect("Settings fixture should parse.");
	let (session, guard) = settings.into_configs().expect("Settings should resolve.");
	let path = env::temp_dir().join(format!("account_session_issuer_it_{}.json", process::id()));
	let store = Arc::new(FileTokenStore::open(&path).expect("File store should open."));
	let issuer = SessionIssuer::new(&session, store.clone()).expect("Issuer should build.");
	let alice = test_user();
	let pair = issuer.issue_pair(&alice, None).await.expect("Issuance should succeed.");
	let key = record_key(&issuer, pair.refresh_token.expose());
	let claims = issuer.verify_access(pair.access_token.expose()).expect("Access should verify.");

	assert_eq!(guard.deadline.as_millis(), 500);
	assert_eq!((claims.exp - claims.iat).whole_seconds(), 60);
	assert!(
		FileTokenStore::open(&path)
			.expect("File store should reopen.")
			.contains(&key)
			.await
			.expect("Lookup should succeed."),
		"Issued refresh identifiers must survive a reopen."
	);

	issuer.revoke(key.user, key.token).await.expect("Revocation should succeed.");

	assert!(!store.contains(&key).await.expect("Lookup should succeed."));

	fs::remove_file(&path).expect("Temporary store file should be removable.");
}
