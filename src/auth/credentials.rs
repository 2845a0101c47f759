//! Managed identity credential fields supplied by the host.

// self
use crate::_prelude::*;

/// Resource and identity a caller wants a token for.
///
/// An empty `client_id` selects the system-assigned identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedIdentityCredentials {
	/// Target resource (audience), e.g. `https://vault.azure.net`.
	pub resource: String,
	/// User-assigned identity client id; empty for the system-assigned identity.
	#[serde(default)]
	pub client_id: String,
}
impl ManagedIdentityCredentials {
	/// Credentials for the system-assigned identity.
	pub fn new(resource: impl Into<String>) -> Self {
		Self { resource: resource.into(), client_id: String::new() }
	}

	/// Selects a user-assigned identity.
	pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = client_id.into();

		self
	}

	/// Returns `true` when the system-assigned identity is used.
	pub fn is_system_assigned(&self) -> bool {
		self.client_id.is_empty()
	}
}
