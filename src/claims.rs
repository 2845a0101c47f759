//! Unverified JWT claim decoding for managed identity access tokens.
//!
//! Signatures are never checked; the decoded claims are for inspection only. Epoch-second
//! claims stay numeric here and are rendered by [`epoch_to_iso8601`] at the output boundary.

// crates.io
use base64::{
	Engine,
	alphabet,
	engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde_json::{Map, Value};
use time::macros::format_description;
// self
use crate::{_prelude::*, error::MalformedTokenError};

// Tokens are unpadded in practice, but tolerate padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
	&alphabet::URL_SAFE,
	GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Claims extracted from a token payload. Absent or mistyped claims stay `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Claims {
	/// `aud`: audience the token was issued for.
	pub aud: Option<String>,
	/// `iss`: issuing authority.
	pub iss: Option<String>,
	/// `sub`: subject.
	pub sub: Option<String>,
	/// `tid`: tenant id.
	pub tid: Option<String>,
	/// `oid`: object id of the identity.
	pub oid: Option<String>,
	/// `appid`, or `azp` for v2 tokens: application (client) id.
	pub appid: Option<String>,
	/// `idtyp`: identity type, e.g. `app`.
	pub idtyp: Option<String>,
	/// `ver`: token version.
	pub ver: Option<String>,
	/// `iat`: issued-at, epoch seconds.
	pub iat: Option<i64>,
	/// `nbf`: not-before, epoch seconds.
	pub nbf: Option<i64>,
	/// `exp`: expiry, epoch seconds.
	pub exp: Option<i64>,
	/// `xms_mirid`: managed identity resource id.
	pub xms_mirid: Option<String>,
}
impl Claims {
	fn from_map(map: &Map<String, Value>) -> Self {
		Self {
			aud: string_claim(map, "aud"),
			iss: string_claim(map, "iss"),
			sub: string_claim(map, "sub"),
			tid: string_claim(map, "tid"),
			oid: string_claim(map, "oid"),
			appid: string_claim(map, "appid").or_else(|| string_claim(map, "azp")),
			idtyp: string_claim(map, "idtyp"),
			ver: string_claim(map, "ver"),
			iat: numeric_claim(map, "iat"),
			nbf: numeric_claim(map, "nbf"),
			exp: numeric_claim(map, "exp"),
			xms_mirid: string_claim(map, "xms_mirid"),
		}
	}
}

/// Decodes the payload segment of `token`.
///
/// Fails when the token is not exactly three dot-separated segments or when the middle segment
/// is not base64url-encoded JSON object.
pub fn decode(token: &str) -> Result<Claims, MalformedTokenError> {
	let segments = token.split('.').collect::<Vec<_>>();

	if segments.len() != 3 {
		return Err(MalformedTokenError::SegmentCount { found: segments.len() });
	}

	let payload = URL_SAFE_LENIENT.decode(segments[1])?;
	let value = serde_json::from_slice::<Value>(&payload)?;
	let map = value.as_object().ok_or(MalformedTokenError::NotAnObject)?;

	Ok(Claims::from_map(map))
}

/// Renders epoch seconds as `YYYY-MM-DDTHH:MM:SS.sssZ`, or `None` when out of range.
pub fn epoch_to_iso8601(secs: i64) -> Option<String> {
	let format =
		format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");

	OffsetDateTime::from_unix_timestamp(secs).ok()?.format(&format).ok()
}

fn string_claim(map: &Map<String, Value>, name: &str) -> Option<String> {
	map.get(name).and_then(Value::as_str).map(str::to_owned)
}

fn numeric_claim(map: &Map<String, Value>, name: &str) -> Option<i64> {
	let value = map.get(name)?;

	value.as_i64().or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
}
