//! Shared token-cache contract and the key schema binding entries to one site.

pub mod memory;

pub use memory::MemoryCache;

// self
use crate::{_prelude::*, auth::SiteContext};

/// Prefix shared by every cache key this connector writes.
const KEY_PREFIX: &str = "badgr";

/// Boxed future returned by [`TokenCache`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Contract over the shared, site-scoped key-value store holding token material.
///
/// Multiple server processes observe the same cache, so implementations must provide expiring
/// entries (`setex` semantics) and named mutual exclusion. The lock `timeout` bounds how long a
/// crashed holder can poison a name: distributed backends arm it as the lock's own expiry, while
/// in-process backends may rely on guard drop for release and merely record it.
pub trait TokenCache
where
	Self: Send + Sync,
{
	/// Fetches the value stored under `key`, if present and unexpired.
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<String>>;

	/// Stores `value` under `key`, replacing any prior entry, expiring after `ttl`.
	fn set_with_expiry<'a>(
		&'a self,
		key: &'a str,
		ttl: Duration,
		value: String,
	) -> CacheFuture<'a, ()>;

	/// Acquires the named mutual-exclusion lock, waiting at most `timeout`.
	///
	/// The returned lease releases the name when dropped, on every exit path. A wait exceeding
	/// `timeout` resolves to [`CacheError::LockTimeout`], which callers should treat as
	/// transient.
	fn lock<'a>(&'a self, name: &'a str, timeout: Duration) -> CacheFuture<'a, CacheLease>;
}

/// Opaque lock lease returned by [`TokenCache::lock`]; dropping it releases the name.
pub struct CacheLease(#[allow(dead_code)] Box<dyn std::any::Any + Send>);
impl CacheLease {
	/// Wraps a backend-specific guard whose drop releases the lock.
	pub fn new(guard: impl Send + 'static) -> Self {
		Self(Box::new(guard))
	}
}
impl Debug for CacheLease {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("CacheLease(..)")
	}
}

/// Error type produced by [`TokenCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// Backend-level failure for the storage engine.
	#[error("Cache backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// Named lock could not be acquired within the timeout.
	#[error("Timed out acquiring cache lock `{name}`.")]
	LockTimeout {
		/// Lock name that timed out.
		name: String,
		/// Timeout that elapsed, in whole seconds.
		timeout_secs: i64,
	},
}

/// Cache key set for one integration's token custody.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenKeys {
	/// Key holding the short-lived access token.
	pub access_token: String,
	/// Key holding the long-lived refresh token.
	pub refresh_token: String,
	/// Name of the refresh mutual-exclusion lock.
	pub refresh_lock: String,
}
impl TokenKeys {
	/// Derives the key set for a site context (site name plus local integration id).
	pub fn for_context(context: &SiteContext) -> Self {
		let scope = format!("{KEY_PREFIX}/{}/{}", context.site, context.integration);

		Self {
			access_token: format!("{scope}/access-token"),
			refresh_token: format!("{scope}/refresh-token"),
			refresh_lock: format!("{scope}/refresh-lock"),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::{IntegrationId, SiteId};

	#[test]
	fn key_schema_scopes_by_site_and_integration() {
		let site = SiteId::new("alpha.example.edu").expect("Site fixture should be valid.");
		let context = SiteContext::new(site, IntegrationId::new(42));
		let keys = TokenKeys::for_context(&context);

		assert_eq!(keys.access_token, "badgr/alpha.example.edu/42/access-token");
		assert_eq!(keys.refresh_token, "badgr/alpha.example.edu/42/refresh-token");
		assert_eq!(keys.refresh_lock, "badgr/alpha.example.edu/42/refresh-lock");
	}

	#[test]
	fn distinct_integrations_never_share_keys() {
		let site = SiteId::new("alpha.example.edu").expect("Site fixture should be valid.");
		let a = TokenKeys::for_context(&SiteContext::new(site.clone(), IntegrationId::new(1)));
		let b = TokenKeys::for_context(&SiteContext::new(site, IntegrationId::new(2)));

		assert_ne!(a.access_token, b.access_token);
		assert_ne!(a.refresh_lock, b.refresh_lock);
	}

	#[test]
	fn cache_error_serializes_for_transport() {
		let payload = serde_json::to_string(&CacheError::Backend { message: "down".into() })
			.expect("Cache errors should serialize to JSON.");
		let round_trip: CacheError =
			serde_json::from_str(&payload).expect("Serialized error should deserialize.");

		assert_eq!(round_trip, CacheError::Backend { message: "down".into() });
	}
}
