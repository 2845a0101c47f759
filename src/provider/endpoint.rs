//! Endpoint selection and request rendering for the two metadata protocols.

// crates.io
use oauth2::{
	HttpRequest,
	http::{
		Method, Request,
		header::{ACCEPT, HeaderValue},
	},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ConfigError,
	provider::env::{EnvSource, IDENTITY_ENDPOINT_VAR, IDENTITY_HEADER_VAR},
};

/// Fixed link-local token endpoint of the VM instance metadata service.
pub const IMDS_TOKEN_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";

/// Metadata protocol that serves a token request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
	/// Host-managed endpoint advertised through `IDENTITY_ENDPOINT`/`IDENTITY_HEADER`.
	AppService,
	/// VM instance metadata service at `169.254.169.254`.
	Imds,
}
impl IdentitySource {
	/// Returns the human-readable label used in error messages.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::AppService => "App Service/Container Apps",
			Self::Imds => "VM IMDS",
		}
	}

	/// Returns the `api-version` query value the protocol expects.
	pub const fn api_version(self) -> &'static str {
		match self {
			Self::AppService => "2019-08-01",
			Self::Imds => "2018-02-01",
		}
	}

	/// Returns the authentication header name the protocol expects.
	pub const fn header_name(self) -> &'static str {
		match self {
			Self::AppService => "X-IDENTITY-HEADER",
			Self::Imds => "Metadata",
		}
	}
}
impl Display for IdentitySource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Resolved endpoint for a single fetch.
#[derive(Clone)]
pub struct IdentityEndpoint {
	/// Protocol in use.
	pub source: IdentitySource,
	/// Base URL before query parameters are appended.
	pub url: Url,
	header_value: TokenSecret,
}
impl IdentityEndpoint {
	/// Picks the protocol from the current environment.
	///
	/// Both `IDENTITY_ENDPOINT` and `IDENTITY_HEADER` must be non-empty to select
	/// [`IdentitySource::AppService`]; anything else falls back to `imds`. The decision is never
	/// cached and never retried against the other protocol.
	pub fn select(env: &dyn EnvSource, imds: Option<&Url>) -> Result<Self> {
		match (env.non_empty(IDENTITY_ENDPOINT_VAR), env.non_empty(IDENTITY_HEADER_VAR)) {
			(Some(endpoint), Some(header)) => Self::app_service(&endpoint, header),
			_ => Self::imds(imds),
		}
	}

	/// App Service/Container Apps endpoint with its identity header secret.
	pub fn app_service(endpoint: &str, header: impl Into<String>) -> Result<Self> {
		let url = Url::parse(endpoint).map_err(|source| ConfigError::InvalidIdentityEndpoint {
			endpoint: endpoint.to_owned(),
			source,
		})?;

		Ok(Self { source: IdentitySource::AppService, url, header_value: TokenSecret::new(header) })
	}

	/// Instance metadata endpoint; `base` overrides [`IMDS_TOKEN_ENDPOINT`].
	pub fn imds(base: Option<&Url>) -> Result<Self> {
		let url = match base {
			Some(url) => url.clone(),
			None => Url::parse(IMDS_TOKEN_ENDPOINT).map_err(|source| {
				ConfigError::InvalidIdentityEndpoint { endpoint: IMDS_TOKEN_ENDPOINT.into(), source }
			})?,
		};

		Ok(Self { source: IdentitySource::Imds, url, header_value: TokenSecret::new("true") })
	}

	/// Renders the full token URL; `client_id` is only appended when non-empty.
	pub fn token_url(&self, resource: &str, client_id: &str) -> Url {
		let mut url = self.url.clone();

		{
			let mut query = url.query_pairs_mut();

			query
				.append_pair("api-version", self.source.api_version())
				.append_pair("resource", resource);

			if !client_id.is_empty() {
				query.append_pair("client_id", client_id);
			}
		}

		url
	}

	/// Builds the outbound `GET` request for `resource` and `client_id`.
	pub fn token_request(&self, resource: &str, client_id: &str) -> Result<HttpRequest> {
		let header_name = self.source.header_name();
		let mut header_value = HeaderValue::from_str(self.header_value.expose())
			.map_err(|source| ConfigError::InvalidHeader { name: header_name, source })?;

		header_value.set_sensitive(true);

		let request = Request::builder()
			.method(Method::GET)
			.uri(self.token_url(resource, client_id).as_str())
			.header(header_name, header_value)
			.header(ACCEPT, HeaderValue::from_static("application/json"))
			.body(Vec::new())
			.map_err(ConfigError::from)?;

		Ok(request)
	}
}
impl Debug for IdentityEndpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IdentityEndpoint")
			.field("source", &self.source)
			.field("url", &self.url.as_str())
			.field("header_value", &"<redacted>")
			.finish()
	}
}
