//! Metadata endpoint selection (data) and environment lookup (behavior).
//!
//! `endpoint` decides between the host-managed App Service/Container Apps endpoint and the VM
//! instance metadata service, then renders the outbound token request. `env` defines
//! [`EnvSource`], the seam through which `IDENTITY_ENDPOINT` and `IDENTITY_HEADER` are read on
//! every fetch.

pub mod endpoint;
pub mod env;

pub use endpoint::*;
pub use env::*;
