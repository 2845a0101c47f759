//! Attaching bearer tokens to outbound requests.

// crates.io
use oauth2::http::{
	HeaderMap, Request,
	header::{AUTHORIZATION, HeaderValue},
};
// self
use crate::{
	_prelude::*,
	auth::ManagedIdentityCredentials,
	error::ConfigError,
	flows::TokenProvider,
	http::{TokenHttpClient, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Outbound request types whose headers the broker may set.
///
/// The broker only ever writes the `Authorization` header; every other header is left as is.
pub trait AuthorizeRequest {
	/// Mutable access to the request's header bag.
	fn headers_mut(&mut self) -> &mut HeaderMap;
}
impl AuthorizeRequest for HeaderMap {
	fn headers_mut(&mut self) -> &mut HeaderMap {
		self
	}
}
impl<B> AuthorizeRequest for Request<B> {
	fn headers_mut(&mut self) -> &mut HeaderMap {
		Request::headers_mut(self)
	}
}

impl<C, M> TokenProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Sets `Authorization: Bearer <token>` on `request` for the given credentials.
	///
	/// Fails with [`ConfigError::MissingResource`] before any lookup when the resource is empty.
	/// A cached token is reused while it stays outside the freshness margin; otherwise one
	/// fetch is issued.
	pub async fn authenticate<R>(
		&self,
		credentials: &ManagedIdentityCredentials,
		mut request: R,
	) -> Result<R>
	where
		R: AuthorizeRequest + Send,
	{
		const KIND: FlowKind = FlowKind::Authenticate;

		let span = FlowSpan::new(KIND, &credentials.resource);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result: Result<R> = span
			.instrument(async move {
				if credentials.resource.trim().is_empty() {
					return Err(ConfigError::MissingResource.into());
				}

				let token = self.get_token(&credentials.resource, &credentials.client_id).await?;
				let mut value = HeaderValue::try_from(format!("Bearer {}", token.expose()))
					.map_err(|source| ConfigError::InvalidHeader { name: "Authorization", source })?;

				value.set_sensitive(true);
				request.headers_mut().insert(AUTHORIZATION, value);

				Ok(request)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
