//! Immutable cached token entries and their freshness rules.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Access token plus its absolute expiry as returned by the metadata endpoint.
///
/// Entries are created on every successful fetch and replaced, never mutated, on refresh.
#[derive(Clone, PartialEq, Eq)]
pub struct CachedToken {
	/// Bearer token; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Absolute expiry in epoch seconds.
	pub expires_on: i64,
}
impl CachedToken {
	/// Creates a new entry.
	pub fn new(access_token: impl Into<String>, expires_on: i64) -> Self {
		Self { access_token: TokenSecret::new(access_token), expires_on }
	}

	/// Seconds left until expiry at `now`; negative once expired.
	pub fn remaining_at(&self, now: i64) -> i64 {
		self.expires_on.saturating_sub(now)
	}

	/// Returns `true` while at least `margin` seconds of lifetime remain at `now`.
	pub fn is_fresh_at(&self, now: i64, margin: i64) -> bool {
		self.remaining_at(now) >= margin
	}

	/// Expiry as a UTC instant, if it is representable.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		OffsetDateTime::from_unix_timestamp(self.expires_on).ok()
	}
}
impl Debug for CachedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedToken")
			.field("access_token", &"<redacted>")
			.field("expires_on", &self.expires_on)
			.finish()
	}
}
