//! Broker-level error types shared across flows, providers, and the token cache.

// self
use crate::{_prelude::*, provider::IdentitySource};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; no network call was attempted.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Metadata endpoint answered with a non-success status.
	#[error(transparent)]
	Acquisition(#[from] AcquisitionError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Metadata endpoint answered successfully but the body is unusable.
	#[error(transparent)]
	Response(#[from] ResponseError),
	/// Access token does not have the expected JWT shape.
	#[error(transparent)]
	MalformedToken(#[from] MalformedTokenError),

	/// Validation flow failure; the cause is kept as the error source.
	#[error("Failed to acquire or decode managed identity token.")]
	Validation {
		/// Acquisition or decoding failure that aborted validation.
		#[source]
		source: Box<Error>,
	},
}
impl Error {
	/// Wraps an acquisition or decoding failure into the validation error.
	pub fn validation(source: Error) -> Self {
		Self::Validation { source: Box::new(source) }
	}

	/// Returns the wrapped cause when this is a validation error.
	pub fn validation_cause(&self) -> Option<&Error> {
		match self {
			Self::Validation { source } => Some(source),
			_ => None,
		}
	}
}

/// Configuration and validation failures raised before any request leaves the process.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Credentials did not name a target resource.
	#[error("Managed identity credentials must specify a resource.")]
	MissingResource,
	/// `IDENTITY_ENDPOINT` is not a valid absolute URL.
	#[error("Identity endpoint `{endpoint}` is not a valid URL.")]
	InvalidIdentityEndpoint {
		/// Raw endpoint value.
		endpoint: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A header value contains characters HTTP does not allow.
	#[error("Header `{name}` has an invalid value.")]
	InvalidHeader {
		/// Header name.
		name: &'static str,
		/// Underlying validation failure.
		#[source]
		source: oauth2::http::header::InvalidHeaderValue,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Non-success HTTP response returned by a metadata endpoint.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Failed to acquire managed identity token from {origin} (HTTP {status}): {body}")]
pub struct AcquisitionError {
	/// Protocol that served the response.
	pub origin: IdentitySource,
	/// HTTP status code.
	pub status: u16,
	/// Response body, decoded lossily as UTF-8.
	pub body: String,
}

/// Successful response whose body could not be turned into a cached token.
#[derive(Debug, ThisError)]
pub enum ResponseError {
	/// Body is not the expected JSON object.
	#[error("Metadata endpoint {origin} returned malformed JSON.")]
	Parse {
		/// Protocol that served the response.
		origin: IdentitySource,
		/// Structured parsing failure, including the offending field path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// `expires_on` does not hold integer epoch seconds.
	#[error("Metadata endpoint {origin} returned a non-integer expires_on value `{value}`.")]
	InvalidExpiresOn {
		/// Protocol that served the response.
		origin: IdentitySource,
		/// Raw value as received.
		value: String,
	},
}

/// Token string that cannot be decoded as a JWT payload.
#[derive(Debug, ThisError)]
pub enum MalformedTokenError {
	/// Token does not split into exactly three dot-separated segments.
	#[error("Token must have 3 dot-separated segments, found {found}.")]
	SegmentCount {
		/// Number of segments present.
		found: usize,
	},
	/// Payload segment is not valid base64url.
	#[error("Token payload is not valid base64url.")]
	Base64(#[from] base64::DecodeError),
	/// Payload segment does not decode to JSON.
	#[error("Token payload is not valid JSON.")]
	Json(#[from] serde_json::Error),
	/// Payload JSON is valid but not an object.
	#[error("Token payload is not a JSON object.")]
	NotAnObject,
}

/// Transport-level failures (network, IO), tagged with the protocol that was being called.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {origin} metadata endpoint.")]
	Network {
		/// Protocol whose endpoint was unreachable.
		origin: IdentitySource,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the {origin} metadata endpoint.")]
	Io {
		/// Protocol whose endpoint was being called.
		origin: IdentitySource,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// HTTP client failed without a structured error.
	#[error("HTTP client error occurred while calling the {origin} metadata endpoint: {message}.")]
	Other {
		/// Protocol whose endpoint was being called.
		origin: IdentitySource,
		/// Message reported by the client.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error raised while calling `origin`.
	pub fn network(
		origin: IdentitySource,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { origin, source: Box::new(src) }
	}

	/// Protocol whose endpoint the failed call targeted.
	pub fn origin(&self) -> IdentitySource {
		match self {
			Self::Network { origin, .. } | Self::Io { origin, .. } | Self::Other { origin, .. } =>
				*origin,
		}
	}
}
