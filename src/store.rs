//! In-process token cache keyed by resource and identity.
//!
//! Entries live only as long as the process. Each process keeps its own cache and fetches its
//! own tokens; nothing is persisted or shared across workers.

pub mod memory;

pub use memory::*;

// self
use crate::_prelude::*;

/// Cache key combining the target resource with the identity client id.
///
/// An empty `client_id` denotes the system-assigned identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityKey {
	/// Target resource (audience).
	pub resource: String,
	/// User-assigned identity client id, or empty.
	pub client_id: String,
}
impl IdentityKey {
	/// Builds a key for the provided resource + client id pair.
	pub fn new(resource: impl Into<String>, client_id: impl Into<String>) -> Self {
		Self { resource: resource.into(), client_id: client_id.into() }
	}
}
