//! Environment hooks used to discover the host-managed identity endpoint.

// self
use crate::_prelude::*;

/// Variable holding the App Service/Container Apps identity endpoint URL.
pub const IDENTITY_ENDPOINT_VAR: &str = "IDENTITY_ENDPOINT";
/// Variable holding the secret sent as `X-IDENTITY-HEADER`.
pub const IDENTITY_HEADER_VAR: &str = "IDENTITY_HEADER";

/// Read-only view over environment variables.
///
/// Values are looked up on every fetch, so implementations must be cheap. An empty value is
/// treated the same as an unset one.
pub trait EnvSource: Send + Sync {
	/// Returns the raw value for `key`, if set.
	fn var(&self, key: &str) -> Option<String>;

	/// Returns the value for `key` when it is set and non-empty.
	fn non_empty(&self, key: &str) -> Option<String> {
		self.var(key).filter(|value| !value.is_empty())
	}
}

/// [`EnvSource`] backed by the process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;
impl EnvSource for ProcessEnv {
	fn var(&self, key: &str) -> Option<String> {
		std::env::var(key).ok()
	}
}

/// In-memory [`EnvSource`] for tests and embedders that manage configuration themselves.
#[derive(Clone, Default)]
pub struct MapEnv(HashMap<String, String>);
impl MapEnv {
	/// Adds or replaces a variable.
	pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.0.insert(key.into(), value.into());

		self
	}
}
impl EnvSource for MapEnv {
	fn var(&self, key: &str) -> Option<String> {
		self.0.get(key).cloned()
	}
}
impl Debug for MapEnv {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		// Values may hold the identity header secret.
		f.debug_struct("MapEnv").field("keys", &self.0.keys().collect::<Vec<_>>()).finish()
	}
}
