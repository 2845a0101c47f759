//! Thread-safe in-memory token cache with lazy expiry eviction.

// std
use std::sync::OnceLock;
// self
use crate::{
	_prelude::*,
	auth::{CachedToken, TokenSecret},
	obs::{self, CacheOutcome},
	store::IdentityKey,
};

/// Minimum remaining lifetime, in seconds, for a cached token to be handed out.
pub const FRESHNESS_MARGIN_SECS: i64 = 300;

type CacheMap = Arc<RwLock<HashMap<IdentityKey, CachedToken>>>;

/// Mapping from [`IdentityKey`] to [`CachedToken`].
///
/// Entries are added on every fetch (last write wins) and removed only when a lookup finds
/// them inside the freshness margin. There is no size bound and no background sweep.
#[derive(Clone, Debug, Default)]
pub struct TokenCache(CacheMap);
impl TokenCache {
	/// Returns the process-wide cache shared by providers that do not inject their own.
	pub fn shared() -> Arc<TokenCache> {
		static SHARED: OnceLock<Arc<TokenCache>> = OnceLock::new();

		SHARED.get_or_init(Default::default).clone()
	}

	/// Returns the cached token for the pair if it stays valid for at least
	/// [`FRESHNESS_MARGIN_SECS`].
	pub fn lookup(&self, resource: &str, client_id: &str) -> Option<TokenSecret> {
		self.lookup_at(resource, client_id, OffsetDateTime::now_utc().unix_timestamp())
	}

	/// Same as [`TokenCache::lookup`] with an explicit clock reading in epoch seconds.
	///
	/// A stale entry is removed before `None` is returned.
	pub fn lookup_at(&self, resource: &str, client_id: &str, now: i64) -> Option<TokenSecret> {
		let key = IdentityKey::new(resource, client_id);

		match self.0.read().get(&key) {
			None => {
				obs::record_cache_outcome(CacheOutcome::Miss, &key);

				return None;
			},
			Some(entry) if entry.is_fresh_at(now, FRESHNESS_MARGIN_SECS) => {
				obs::record_cache_outcome(CacheOutcome::Hit, &key);

				return Some(entry.access_token.clone());
			},
			Some(_) => (),
		}

		let mut guard = self.0.write();

		// Re-check under the write lock; a concurrent store may have replaced the entry.
		match guard.get(&key) {
			Some(entry) if entry.is_fresh_at(now, FRESHNESS_MARGIN_SECS) => {
				obs::record_cache_outcome(CacheOutcome::Hit, &key);

				Some(entry.access_token.clone())
			},
			Some(_) => {
				guard.remove(&key);
				obs::record_cache_outcome(CacheOutcome::Stale, &key);

				None
			},
			None => {
				obs::record_cache_outcome(CacheOutcome::Miss, &key);

				None
			},
		}
	}

	/// Inserts or overwrites the entry for the pair.
	pub fn store(
		&self,
		resource: &str,
		client_id: &str,
		access_token: impl Into<String>,
		expires_on: i64,
	) {
		let key = IdentityKey::new(resource, client_id);

		self.0.write().insert(key, CachedToken::new(access_token, expires_on));
	}

	/// Number of entries, stale ones included.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when the cache holds no entries.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
