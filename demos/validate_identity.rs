//! Demonstrates authenticating an outbound request and inspecting the managed identity token
//! against a local stand-in for the App Service identity endpoint.

// std
use std::sync::Arc;
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use color_eyre::Result;
use httpmock::prelude::*;
// self
use managed_identity_broker::{
	auth::ManagedIdentityCredentials,
	flows::{TokenProvider, ValidationOptions},
	oauth2::http::{Request, header::AUTHORIZATION},
	provider::{IDENTITY_ENDPOINT_VAR, IDENTITY_HEADER_VAR, MapEnv},
	store::TokenCache,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let payload = serde_json::json!({
		"aud": "https://vault.azure.net",
		"iss": "https://sts.windows.net/demo-tenant/",
		"tid": "demo-tenant",
		"oid": "demo-object",
		"appid": "demo-app",
		"idtyp": "app",
		"iat": 1_700_000_000,
		"nbf": 1_700_000_000,
		"exp": 1_700_003_600,
	});
	let token = format!("eyJhbGciOiJub25lIn0.{}.", URL_SAFE_NO_PAD.encode(payload.to_string()));
	let expires_on = time::OffsetDateTime::now_utc().unix_timestamp() + 3_600;
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/msi/token").header("x-identity-header", "demo-secret");
			then.status(200).header("content-type", "application/json").body(format!(
				"{{\"access_token\":\"{token}\",\"expires_on\":\"{expires_on}\"}}"
			));
		})
		.await;
	let env = MapEnv::default()
		.with_var(IDENTITY_ENDPOINT_VAR, server.url("/msi/token"))
		.with_var(IDENTITY_HEADER_VAR, "demo-secret");
	let provider = TokenProvider::new()?.with_cache(Arc::new(TokenCache::default())).with_env(env);
	let credentials = ManagedIdentityCredentials::new("https://vault.azure.net");
	let request = Request::builder()
		.uri("https://demo.vault.azure.net/secrets/example?api-version=7.4")
		.body(Vec::<u8>::new())?;
	let request = provider.authenticate(&credentials, request).await?;

	println!("Authorization header set: {}", request.headers().contains_key(AUTHORIZATION));

	let identity = provider.validate(&credentials, ValidationOptions::default()).await?;

	println!("{}", serde_json::to_string_pretty(&identity)?);

	token_mock.assert_calls_async(2).await;

	Ok(())
}
