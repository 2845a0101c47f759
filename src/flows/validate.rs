//! Token inspection: fetch, decode, and report the caller's identity claims.

// self
use crate::{
	_prelude::*,
	auth::{ManagedIdentityCredentials, TokenSecret},
	claims::{self, Claims},
	flows::TokenProvider,
	http::{TokenHttpClient, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Options for [`TokenProvider::validate`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOptions {
	/// Include the raw access token in the output.
	#[serde(default)]
	pub include_token: bool,
}
impl ValidationOptions {
	/// Requests the raw access token in the output.
	pub fn with_token(mut self) -> Self {
		self.include_token = true;

		self
	}
}

/// Decoded identity report. Absent claims are omitted when serialized.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedIdentity {
	/// Audience (`aud`).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub audience: Option<String>,
	/// Issuer (`iss`).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub issuer: Option<String>,
	/// Subject (`sub`).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub subject: Option<String>,
	/// Tenant id (`tid`).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tenant_id: Option<String>,
	/// Object id (`oid`).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub object_id: Option<String>,
	/// Application id (`appid`/`azp`).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub application_id: Option<String>,
	/// Identity type (`idtyp`).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub identity_type: Option<String>,
	/// Token version (`ver`).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub token_version: Option<String>,
	/// Issued-at (`iat`) as ISO-8601.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub issued_at: Option<String>,
	/// Not-before (`nbf`) as ISO-8601.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub not_before: Option<String>,
	/// Expiry (`exp`) as ISO-8601.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expires_on: Option<String>,
	/// Managed identity resource id (`xms_mirid`).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub managed_identity_resource_id: Option<String>,
	/// Raw access token, present only when [`ValidationOptions::include_token`] was set.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub token: Option<TokenSecret>,
}
impl ValidatedIdentity {
	/// Assembles the report from decoded claims, rendering epoch claims as ISO-8601.
	pub fn from_claims(claims: Claims, token: Option<TokenSecret>) -> Self {
		Self {
			audience: claims.aud,
			issuer: claims.iss,
			subject: claims.sub,
			tenant_id: claims.tid,
			object_id: claims.oid,
			application_id: claims.appid,
			identity_type: claims.idtyp,
			token_version: claims.ver,
			issued_at: claims.iat.and_then(claims::epoch_to_iso8601),
			not_before: claims.nbf.and_then(claims::epoch_to_iso8601),
			expires_on: claims.exp.and_then(claims::epoch_to_iso8601),
			managed_identity_resource_id: claims.xms_mirid,
			token,
		}
	}
}
impl Debug for ValidatedIdentity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ValidatedIdentity")
			.field("audience", &self.audience)
			.field("issuer", &self.issuer)
			.field("subject", &self.subject)
			.field("tenant_id", &self.tenant_id)
			.field("object_id", &self.object_id)
			.field("application_id", &self.application_id)
			.field("identity_type", &self.identity_type)
			.field("token_version", &self.token_version)
			.field("issued_at", &self.issued_at)
			.field("not_before", &self.not_before)
			.field("expires_on", &self.expires_on)
			.field("managed_identity_resource_id", &self.managed_identity_resource_id)
			.field("token", &self.token.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

impl<C, M> TokenProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Fetches a fresh token for `credentials` and decodes its claims.
	///
	/// Every failure, whether acquisition or decoding, is reported as [`Error::Validation`];
	/// use [`Error::validation_cause`] to tell them apart.
	pub async fn validate(
		&self,
		credentials: &ManagedIdentityCredentials,
		options: ValidationOptions,
	) -> Result<ValidatedIdentity> {
		const KIND: FlowKind = FlowKind::Validate;

		let span = FlowSpan::new(KIND, &credentials.resource);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let token = self.fetch_token(&credentials.resource, &credentials.client_id).await?;
				let claims = claims::decode(token.expose())?;

				Ok::<_, Error>(ValidatedIdentity::from_claims(
					claims,
					options.include_token.then_some(token),
				))
			})
			.await
			.map_err(Error::validation);

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
