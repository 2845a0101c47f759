// self
use crate::{
	obs::{CacheOutcome, FlowKind, FlowOutcome},
	store::IdentityKey,
};

/// Counts one flow attempt, success, or failure on the global recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"managed_identity_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Counts a cache lookup and logs it at debug level (when enabled).
///
/// The event names the resource and whether a user-assigned identity was requested; the client
/// id itself and the token stay out of logs.
pub fn record_cache_outcome(outcome: CacheOutcome, key: &IdentityKey) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("managed_identity_cache_total", "outcome" => outcome.as_str())
			.increment(1);
	}
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(
			outcome = outcome.as_str(),
			resource = key.resource.as_str(),
			user_assigned = !key.client_id.is_empty(),
			"token cache lookup"
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = key;
	}
	#[cfg(not(any(feature = "metrics", feature = "tracing")))]
	{
		let _ = outcome;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_accept_every_label() {
		let key = IdentityKey::new("api://resource", "client");

		for outcome in [CacheOutcome::Hit, CacheOutcome::Miss, CacheOutcome::Stale] {
			record_cache_outcome(outcome, &key);
		}
		for outcome in [FlowOutcome::Attempt, FlowOutcome::Success, FlowOutcome::Failure] {
			record_flow_outcome(FlowKind::Validate, outcome);
		}
	}
}
