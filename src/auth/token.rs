//! Token values held by the cache.

pub mod cached;
pub mod secret;
