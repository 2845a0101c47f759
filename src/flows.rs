//! Token provider entry points: fetch, authenticate, and validate.

mod authenticate;
mod fetch;
mod validate;

pub use authenticate::*;
pub use validate::*;

// self
use crate::{
	_prelude::*,
	http::{TokenHttpClient, TransportErrorMapper},
	provider::{EnvSource, ProcessEnv},
	store::TokenCache,
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Provider specialized for the crate's default reqwest transport stack.
pub type ReqwestTokenProvider = TokenProvider<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Acquires managed identity tokens and keeps them in a [`TokenCache`].
///
/// The provider owns the HTTP client, the cache, and the environment view. Endpoint selection
/// happens on every fetch so configuration changes are picked up without rebuilding the
/// provider. Concurrent callers for the same pair are not coalesced; each miss issues its own
/// request and the last completed fetch wins the cache slot.
#[derive(Clone)]
pub struct TokenProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound metadata request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Token cache consulted by [`TokenProvider::get_token`] and updated on every fetch.
	pub cache: Arc<TokenCache>,
	/// Source of `IDENTITY_ENDPOINT`/`IDENTITY_HEADER`.
	pub env: Arc<dyn EnvSource>,
	/// Override for the instance metadata token endpoint.
	pub imds_endpoint: Option<Url>,
}
impl<C, M> TokenProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a provider that reuses the caller-provided transport + mapper pair.
	///
	/// The provider starts with the process-wide cache and the process environment.
	pub fn with_http_client(http_client: impl Into<Arc<C>>, mapper: impl Into<Arc<M>>) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			cache: TokenCache::shared(),
			env: Arc::new(ProcessEnv),
			imds_endpoint: None,
		}
	}

	/// Replaces the token cache.
	pub fn with_cache(mut self, cache: Arc<TokenCache>) -> Self {
		self.cache = cache;

		self
	}

	/// Replaces the environment view used for endpoint selection.
	pub fn with_env(mut self, env: impl 'static + EnvSource) -> Self {
		self.env = Arc::new(env);

		self
	}

	/// Points the instance metadata protocol at `endpoint` instead of `169.254.169.254`.
	pub fn with_imds_endpoint(mut self, endpoint: Url) -> Self {
		self.imds_endpoint = Some(endpoint);

		self
	}
}
#[cfg(feature = "reqwest")]
impl TokenProvider<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a provider backed by [`ReqwestHttpClient::new`], which never follows redirects.
	pub fn new() -> Result<Self> {
		Ok(Self::with_http_client(ReqwestHttpClient::new()?, Arc::new(ReqwestTransportErrorMapper)))
	}
}
impl<C, M> Debug for TokenProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenProvider")
			.field("cached_entries", &self.cache.len())
			.field("imds_endpoint", &self.imds_endpoint.as_ref().map(Url::as_str))
			.finish()
	}
}
