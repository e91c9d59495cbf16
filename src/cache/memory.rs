//! Thread-safe in-memory [`TokenCache`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	cache::{CacheError, CacheFuture, CacheLease, TokenCache},
};

#[derive(Clone, Debug)]
struct Entry {
	value: String,
	expires_at: OffsetDateTime,
}

type EntryMap = Arc<RwLock<HashMap<String, Entry>>>;
type LockMap = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// In-process cache backend keeping entries and locks local for tests and demos.
///
/// Entries are lazily expired on read. Lock leases are per-name `async` mutex guards; an
/// in-process holder cannot crash without dropping its guard, so the acquire timeout is accepted
/// for contract parity but no expiry timer is armed.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache {
	entries: EntryMap,
	locks: LockMap,
}
impl MemoryCache {
	fn get_now(entries: &EntryMap, key: &str) -> Option<String> {
		let now = OffsetDateTime::now_utc();
		let expired = {
			let guard = entries.read();

			match guard.get(key) {
				Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
				Some(_) => true,
				None => false,
			}
		};

		if expired {
			entries.write().remove(key);
		}

		None
	}

	fn set_now(entries: &EntryMap, key: &str, ttl: Duration, value: String) {
		let entry = Entry { value, expires_at: OffsetDateTime::now_utc() + ttl };

		entries.write().insert(key.to_owned(), entry);
	}

	fn lock_handle(locks: &LockMap, name: &str) -> Arc<AsyncMutex<()>> {
		let mut guard = locks.lock();

		guard.entry(name.to_owned()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}
}
impl TokenCache for MemoryCache {
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<String>> {
		let entries = self.entries.clone();

		Box::pin(async move { Ok(Self::get_now(&entries, key)) })
	}

	fn set_with_expiry<'a>(
		&'a self,
		key: &'a str,
		ttl: Duration,
		value: String,
	) -> CacheFuture<'a, ()> {
		let entries = self.entries.clone();

		Box::pin(async move {
			Self::set_now(&entries, key, ttl, value);

			Ok(())
		})
	}

	fn lock<'a>(&'a self, name: &'a str, _timeout: Duration) -> CacheFuture<'a, CacheLease> {
		let handle = Self::lock_handle(&self.locks, name);

		Box::pin(async move {
			let guard = handle.lock_arc().await;

			Ok(CacheLease::new(guard))
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn entries_round_trip_until_expiry() {
		let cache = MemoryCache::default();

		cache
			.set_with_expiry("k", Duration::hours(1), "v".into())
			.await
			.expect("Set should succeed.");

		assert_eq!(cache.get("k").await.expect("Get should succeed."), Some("v".into()));
		assert_eq!(cache.get("absent").await.expect("Get should succeed."), None);
	}

	#[tokio::test]
	async fn expired_entries_read_as_absent() {
		let cache = MemoryCache::default();

		cache
			.set_with_expiry("k", Duration::seconds(-1), "v".into())
			.await
			.expect("Set should succeed.");

		assert_eq!(cache.get("k").await.expect("Get should succeed."), None);
	}

	#[tokio::test]
	async fn overwrites_replace_value_and_deadline() {
		let cache = MemoryCache::default();

		cache
			.set_with_expiry("k", Duration::seconds(-1), "stale".into())
			.await
			.expect("Set should succeed.");
		cache
			.set_with_expiry("k", Duration::hours(1), "fresh".into())
			.await
			.expect("Set should succeed.");

		assert_eq!(cache.get("k").await.expect("Get should succeed."), Some("fresh".into()));
	}

	#[tokio::test]
	async fn lock_serializes_holders_per_name() {
		let cache = MemoryCache::default();
		let lease = cache.lock("name", Duration::seconds(180)).await.expect("Lock should succeed.");
		let handle = MemoryCache::lock_handle(&cache.locks, "name");

		assert!(handle.try_lock().is_none(), "Second holder must wait while the lease is live.");

		drop(lease);

		assert!(handle.try_lock().is_some(), "Dropping the lease must release the name.");
	}

	#[tokio::test]
	async fn distinct_names_do_not_contend() {
		let cache = MemoryCache::default();
		let _lease = cache.lock("a", Duration::seconds(180)).await.expect("Lock should succeed.");
		let other = cache.lock("b", Duration::seconds(180)).await;

		assert!(other.is_ok(), "Unrelated names must stay independent.");
	}
}
