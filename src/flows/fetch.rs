//! Token acquisition against the selected metadata endpoint.
//!
//! [`TokenProvider::fetch_token`] always performs exactly one request, stores the result in the
//! cache, and returns the access token. [`TokenProvider::get_token`] consults the cache first.

// crates.io
use oauth2::{AsyncHttpClient, HttpResponse};
// self
use crate::{
	_prelude::*,
	auth::{CachedToken, TokenSecret},
	error::{AcquisitionError, ConfigError, ResponseError},
	flows::TokenProvider,
	http::{TokenHttpClient, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{IdentityEndpoint, IdentitySource},
};

/// Success body shared by both metadata protocols; unknown fields are ignored.
#[derive(Deserialize)]
struct TokenResponse {
	access_token: String,
	expires_on: ExpiresOn,
}

/// `expires_on` arrives as a string-encoded integer, or as a bare integer on some hosts.
#[derive(Deserialize)]
#[serde(untagged)]
enum ExpiresOn {
	Number(i64),
	Text(String),
}
impl ExpiresOn {
	fn epoch_seconds(&self, origin: IdentitySource) -> Result<i64, ResponseError> {
		match self {
			Self::Number(secs) => Ok(*secs),
			Self::Text(raw) => raw
				.trim()
				.parse()
				.map_err(|_| ResponseError::InvalidExpiresOn { origin, value: raw.clone() }),
		}
	}
}

impl<C, M> TokenProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Fetches a fresh token for `resource` and `client_id`, bypassing the cache lookup.
	///
	/// An empty `client_id` requests the system-assigned identity. The result is stored in the
	/// cache before it is returned.
	pub async fn fetch_token(&self, resource: &str, client_id: &str) -> Result<TokenSecret> {
		const KIND: FlowKind = FlowKind::FetchToken;

		let span = FlowSpan::new(KIND, resource);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result: Result<TokenSecret> = span
			.instrument(async move {
				if resource.trim().is_empty() {
					return Err(ConfigError::MissingResource.into());
				}

				let endpoint =
					IdentityEndpoint::select(self.env.as_ref(), self.imds_endpoint.as_ref())?;

				obs::record_endpoint_selection(endpoint.source);

				let request = endpoint.token_request(resource, client_id)?;
				let handle = self.http_client.handle();
				let response = handle.call(request).await.map_err(|err| {
					<M as TransportErrorMapper<C::TransportError>>::map_transport_error(
						self.transport_mapper.as_ref(),
						endpoint.source,
						err,
					)
				})?;
				let token = parse_token_response(endpoint.source, response)?;

				self.cache.store(resource, client_id, token.access_token.expose(), token.expires_on);

				Ok(token.access_token)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Returns a cached token when one stays valid for the freshness margin, otherwise fetches.
	pub async fn get_token(&self, resource: &str, client_id: &str) -> Result<TokenSecret> {
		if resource.trim().is_empty() {
			return Err(ConfigError::MissingResource.into());
		}

		match self.cache.lookup(resource, client_id) {
			Some(token) => Ok(token),
			None => self.fetch_token(resource, client_id).await,
		}
	}
}

fn parse_token_response(origin: IdentitySource, response: HttpResponse) -> Result<CachedToken> {
	let status = response.status();

	if !status.is_success() {
		return Err(AcquisitionError {
			origin,
			status: status.as_u16(),
			body: String::from_utf8_lossy(response.body()).into_owned(),
		}
		.into());
	}

	let mut deserializer = serde_json::Deserializer::from_slice(response.body());
	let body: TokenResponse = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| ResponseError::Parse { origin, source })?;
	let expires_on = body.expires_on.epoch_seconds(origin)?;

	Ok(CachedToken::new(body.access_token, expires_on))
}
