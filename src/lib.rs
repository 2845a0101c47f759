//! Managed identity token broker: select the host metadata endpoint, cache short-lived bearer
//! tokens per resource and identity, and decode their claims without trusting them.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod claims;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod provider;
pub mod store;
#[cfg(feature = "reqwest")]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		flows::{ReqwestTokenProvider, TokenProvider},
		http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
		provider::MapEnv,
		store::TokenCache,
	};

	/// Builds a reqwest-backed provider with an isolated cache and an in-memory environment.
	///
	/// The provider never touches the process environment or the shared cache, so tests can run
	/// in parallel.
	pub fn build_reqwest_test_provider(env: MapEnv) -> (ReqwestTokenProvider, Arc<TokenCache>) {
		let cache = Arc::new(TokenCache::default());
		let provider = TokenProvider::with_http_client(
			ReqwestHttpClient::new().expect("Failed to build Reqwest client for tests."),
			Arc::new(ReqwestTransportErrorMapper),
		)
		.with_cache(cache.clone())
		.with_env(env);

		(provider, cache)
	}

	/// Returns an environment that selects the App Service/Container Apps protocol.
	pub fn app_service_env(endpoint: &str, header: &str) -> MapEnv {
		MapEnv::default()
			.with_var(crate::provider::IDENTITY_ENDPOINT_VAR, endpoint)
			.with_var(crate::provider::IDENTITY_HEADER_VAR, header)
	}

	/// Current UTC time as epoch seconds.
	pub fn now_epoch() -> i64 {
		OffsetDateTime::now_utc().unix_timestamp()
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		sync::Arc,
	};
	#[cfg(feature = "reqwest")] pub use std::pin::Pin;

	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use oauth2;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
