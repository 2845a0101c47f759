//! Spans, events, and counters around provider calls and cache lookups.
//!
//! # Feature Flags
//!
//! - `tracing`: each provider call runs in a `managed_identity.flow` span (`flow`, `resource`,
//!   `source`); cache lookups and endpoint selection emit debug events.
//! - `metrics`: `managed_identity_flow_total{flow, outcome}` counts attempts, successes, and
//!   failures; `managed_identity_cache_total{outcome}` counts hits, misses, and stale evictions.
//!
//! With both features off every hook compiles to nothing.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Entry points observed by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Attaching a bearer token to an outbound request.
	Authenticate,
	/// Fetching a token from a metadata endpoint.
	FetchToken,
	/// Fetching and decoding a token for inspection.
	Validate,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Authenticate => "authenticate",
			FlowKind::FetchToken => "fetch_token",
			FlowKind::Validate => "validate",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a broker helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Result of a single cache lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheOutcome {
	/// A fresh entry was returned.
	Hit,
	/// No entry existed.
	Miss,
	/// An entry existed inside the freshness margin and was removed.
	Stale,
}
impl CacheOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheOutcome::Hit => "hit",
			CacheOutcome::Miss => "miss",
			CacheOutcome::Stale => "stale",
		}
	}
}
impl Display for CacheOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
