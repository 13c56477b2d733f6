//! Simple file-backed [`TokenStore`] for single-node deployments without Redis.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{RecordKey, TokenRecord},
	store::{self, StoreError, StoreFuture, TokenStore},
};

/// Persists live records to a JSON file after each mutation.
///
/// Expired records are dropped when the snapshot is loaded and whenever the file is rewritten,
/// so the file never grows past the set of currently trusted refresh tokens plus whatever
/// expired since the last write.
#[derive(Clone, Debug)]
pub struct FileTokenStore {
	path: PathBuf,
	inner: Arc<RwLock<HashMap<RecordKey, TokenRecord>>>,
}
impl FileTokenStore {
	/// Opens (or creates) a store at the provided path, eagerly loading live records.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path, OffsetDateTime::now_utc())?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	fn load_snapshot(
		path: &Path,
		now: OffsetDateTime,
	) -> Result<HashMap<RecordKey, TokenRecord>, StoreError> {
		if !path.exists() {
			return Ok(HashMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.is_empty() {
			return Ok(HashMap::new());
		}

		let records: Vec<TokenRecord> =
			serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		Ok(records
			.into_iter()
			.filter(|record| record.is_live_at(now))
			.map(|record| (record.key, record))
			.collect())
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn temp_path(&self) -> PathBuf {
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		tmp_path
	}

	/// Persists `next` and only then installs it, so a failed write leaves memory untouched.
	fn replace_locked(
		&self,
		current: &mut HashMap<RecordKey, TokenRecord>,
		mut next: HashMap<RecordKey, TokenRecord>,
		now: OffsetDateTime,
	) -> Result<(), StoreError> {
		next.retain(|_, record| record.is_live_at(now));
		self.write_snapshot(&next)?;

		*current = next;

		Ok(())
	}

	fn write_snapshot(&self, contents: &HashMap<RecordKey, TokenRecord>) -> Result<(), StoreError> {
		let snapshot: Vec<_> = contents.values().collect();
		let serialized =
			serde_json::to_vec_pretty(&snapshot).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let tmp_path = self.temp_path();

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl TokenStore for FileTokenStore {
	fn set(&self, key: RecordKey, ttl: Duration) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let now = OffsetDateTime::now_utc();
			let record = store::record_for(key, now, ttl)?;
			let mut guard = self.inner.write();
			let mut next = guard.clone();

			next.insert(key, record);

			self.replace_locked(&mut guard, next, now)
		})
	}

	fn delete<'a>(&'a self, key: &'a RecordKey) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			if !guard.contains_key(key) {
				return Ok(());
			}

			let mut next = guard.clone();

			next.remove(key);

			self.replace_locked(&mut guard, next, OffsetDateTime::now_utc())
		})
	}

	fn contains<'a>(&'a self, key: &'a RecordKey) -> StoreFuture<'a, bool> {
		Box::pin(async move {
			let now = OffsetDateTime::now_utc();

			Ok(self.inner.read().get(key).is_some_and(|record| record.is_live_at(now)))
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::auth::{TokenId, UserId};

	fn temp_path() -> PathBuf {
		let unique = format!(
			"account_session_file_store_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	fn key(token: &str) -> RecordKey {
		RecordKey::new(
			UserId::new("6f1f5c8e-2b1a-4d5e-9c3b-0a7e4d2f9b61")
				.expect("User identifier fixture should be valid."),
			TokenId::new(token).expect("Token identifier fixture should be valid."),
		)
	}

	#[test]
	fn records_survive_reopen_and_deletes_persist() {
		let path = temp_path();
		let store = FileTokenStore::open(&path).expect("Failed to open file store snapshot.");
		let kept = key("0b5c3c1e-8d53-4a8b-9a43-2f0f3b1f1d10");
		let dropped = key("1c6d4d2f-9e64-4b9c-8b54-3a1a4c2a2e21");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.set(kept, Duration::days(30))).expect("Failed to save first record.");
		rt.block_on(store.set(dropped, Duration::days(30))).expect("Failed to save second record.");
		rt.block_on(store.delete(&dropped)).expect("Failed to delete second record.");
		drop(store);

		let reopened = FileTokenStore::open(&path).expect("Failed to reopen file store snapshot.");

		assert!(rt.block_on(reopened.contains(&kept)).expect("Lookup should succeed."));
		assert!(!rt.block_on(reopened.contains(&dropped)).expect("Lookup should succeed."));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn expired_records_are_skipped_on_load() {
		let path = temp_path();
		let now = OffsetDateTime::now_utc();
		let expired = TokenRecord::new(
			key("0b5c3c1e-8d53-4a8b-9a43-2f0f3b1f1d10"),
			now - Duration::hours(2),
			Duration::hours(1),
		)
		.expect("Fixture expiry should be in range.");

		fs::write(&path, serde_json::to_vec(&[expired]).expect("Fixture should serialize."))
			.expect("Failed to write stale snapshot.");

		let store = FileTokenStore::open(&path).expect("Failed to open stale snapshot.");

		assert!(store.inner.read().is_empty());

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn failed_persist_leaves_memory_and_file_unchanged() {
		let path = temp_path();
		let store = FileTokenStore::open(&path).expect("Failed to open file store snapshot.");
		let kept = key("0b5c3c1e-8d53-4a8b-9a43-2f0f3b1f1d10");
		let rejected = key("1c6d4d2f-9e64-4b9c-8b54-3a1a4c2a2e21");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.set(kept, Duration::days(30))).expect("Failed to save first record.");

		// A directory squatting on the temp path makes every snapshot write fail.
		let blocker = store.temp_path();

		fs::create_dir(&blocker).expect("Failed to create blocking directory.");

		assert!(matches!(
			rt.block_on(store.set(rejected, Duration::days(30))),
			Err(StoreError::Backend { .. })
		));
		assert!(!rt.block_on(store.contains(&rejected)).expect("Lookup should succeed."));
		assert!(rt.block_on(store.delete(&kept)).is_err());
		assert!(
			rt.block_on(store.contains(&kept)).expect("Lookup should succeed."),
			"A failed delete must keep the record live."
		);

		fs::remove_dir(&blocker).expect("Failed to remove blocking directory.");

		let reopened = FileTokenStore::open(&path).expect("Failed to reopen file store snapshot.");

		assert!(rt.block_on(reopened.contains(&kept)).expect("Lookup should succeed."));
		assert!(!rt.block_on(reopened.contains(&rejected)).expect("Lookup should succeed."));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}
}
