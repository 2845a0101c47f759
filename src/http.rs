//! Transport primitives for metadata endpoint calls.
//!
//! The module exposes [`TokenHttpClient`] so downstream crates can bring their own HTTP stack,
//! and [`TransportErrorMapper`] so their failures land in the broker's [`TransportError`] /
//! [`ConfigError`] taxonomy. Requests and responses use the `oauth2` crate's
//! [`HttpRequest`]/[`HttpResponse`] aliases over the `http` crate types.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError};
#[cfg(feature = "reqwest")] use oauth2::{HttpRequest, HttpResponse};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
	provider::IdentitySource,
};

/// Abstraction over HTTP transports capable of calling metadata endpoints.
///
/// Implementations must be `Send + Sync + 'static` so they can be shared across provider
/// instances, and the handles they return must own whatever state is required so their request
/// futures remain `Send` for the lifetime of the in-flight call. The broker issues exactly one
/// call per fetch and never retries.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle used for a single fetch.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds a handle for the next request.
	fn handle(&self) -> Self::Handle;
}

/// Maps HTTP transport failures into broker [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted while calling `source` into a broker error.
	fn map_transport_error(&self, source: IdentitySource, error: HttpClientError<E>) -> Error;
}

/// Mapper for arbitrary transports: every client failure is a network error.
#[derive(Clone, Debug, Default)]
pub struct GenericTransportErrorMapper;
impl<E> TransportErrorMapper<E> for GenericTransportErrorMapper
where
	E: 'static + Send + Sync + StdError,
{
	fn map_transport_error(&self, source: IdentitySource, error: HttpClientError<E>) -> Error {
		map_common_client_error(source, error)
	}
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		source: IdentitySource,
		error: HttpClientError<ReqwestError>,
	) -> Error {
		match error {
			HttpClientError::Reqwest(inner) if inner.is_builder() => ConfigError::from(*inner).into(),
			error => map_common_client_error(source, error),
		}
	}
}

fn map_common_client_error<E>(origin: IdentitySource, error: HttpClientError<E>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match error {
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(source) => TransportError::Io { origin, source }.into(),
		HttpClientError::Other(message) => TransportError::Other { origin, message }.into(),
		HttpClientError::Reqwest(inner) => TransportError::network(origin, *inner).into(),
		_ =>
			TransportError::Other { origin, message: "unknown HTTP client failure".into() }.into(),
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Metadata endpoints answer directly. Clients built here never follow redirects: reqwest only
/// strips `Authorization` and cookies on cross-origin hops, so a followed redirect would forward
/// `X-IDENTITY-HEADER` to whatever host `Location` names. A redirect surfaces as a non-success
/// response instead. Custom clients passed to [`ReqwestHttpClient::with_client`] must disable
/// redirects themselves.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds the default client: rustls, no redirects followed.
	pub fn new() -> Result<Self> {
		Self::without_redirects()
	}

	/// Builds a client that never follows redirects.
	pub fn without_redirects() -> Result<Self> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(ConfigError::from)?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl TokenHttpClient for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn handle(&self) -> Self::Handle {
		ReqwestHandle(self.0.clone())
	}
}

/// [`AsyncHttpClient`] handle returned by [`ReqwestHttpClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHandle(ReqwestClient);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
