// crates.io
use httpmock::prelude::*;
// self
use managed_identity_broker::{
	_preludet::*,
	error::{AcquisitionError, TransportError},
	provider::{IdentitySource, MapEnv},
};

const RESOURCE: &str = "https://vault.azure.net";
const IDENTITY_HEADER: &str = "header-secret";

fn token_body(token: &str, expires_on: i64) -> String {
	format!(r#"{{"access_token":"{token}","expires_on":"{expires_on}","token_type":"Bearer"}}"#)
}

#[tokio::test]
async fn app_service_protocol_sends_identity_header_without_client_id() {
	let server = MockServer::start_async().await;
	let expires_on = now_epoch() + 3_600;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/msi/token")
				.query_param("api-version", "2019-08-01")
				.query_param("resource", RESOURCE)
				.query_param_missing("client_id")
				.header("x-identity-header", IDENTITY_HEADER);
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("app-service-token", expires_on));
		})
		.await;
	let (provider, cache) =
		build_reqwest_test_provider(app_service_env(&server.url("/msi/token"), IDENTITY_HEADER));
	let token =
		provider.fetch_token(RESOURCE, "").await.expect("App Service fetch should succeed.");

	assert_eq!(token.expose(), "app-service-token");

	mock.assert_async().await;

	let cached = cache.lookup(RESOURCE, "").expect("Fetched token should be cached.");

	assert_eq!(cached.expose(), "app-service-token");
}

#[tokio::test]
async fn app_service_protocol_includes_client_id_when_set() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/msi/token")
				.query_param("api-version", "2019-08-01")
				.query_param("client_id", "user-assigned-id");
			then.status(200).body(token_body("user-token", now_epoch() + 3_600));
		})
		.await;
	let (provider, cache) =
		build_reqwest_test_provider(app_service_env(&server.url("/msi/token"), IDENTITY_HEADER));
	let token = provider
		.fetch_token(RESOURCE, "user-assigned-id")
		.await
		.expect("User-assigned fetch should succeed.");

	assert_eq!(token.expose(), "user-token");
	assert!(cache.lookup(RESOURCE, "").is_none());
	assert!(cache.lookup(RESOURCE, "user-assigned-id").is_some());

	mock.assert_async().await;
}

#[tokio::test]
async fn imds_protocol_is_used_without_identity_variables() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/metadata/identity/oauth2/token")
				.query_param("api-version", "2018-02-01")
				.query_param("resource", RESOURCE)
				.header("metadata", "true");
			then.status(200).body(token_body("imds-token", now_epoch() + 3_600));
		})
		.await;
	let imds = Url::parse(&server.url("/metadata/identity/oauth2/token"))
		.expect("Mock IMDS endpoint should parse.");
	// Only one of the two variables is set, so the host endpoint must not be used.
	let env = MapEnv::default().with_var("IDENTITY_ENDPOINT", server.url("/msi/token"));
	let (provider, _cache) = build_reqwest_test_provider(env);
	let provider = provider.with_imds_endpoint(imds);
	let token = provider.fetch_token(RESOURCE, "").await.expect("IMDS fetch should succeed.");

	assert_eq!(token.expose(), "imds-token");

	mock.assert_async().await;
}

#[tokio::test]
async fn non_success_status_names_protocol_status_and_body() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/metadata/identity/oauth2/token");
			then.status(400).body("Identity not found");
		})
		.await;
	let imds = Url::parse(&server.url("/metadata/identity/oauth2/token"))
		.expect("Mock IMDS endpoint should parse.");
	let (provider, cache) = build_reqwest_test_provider(MapEnv::default());
	let err = provider
		.with_imds_endpoint(imds)
		.fetch_token(RESOURCE, "missing-id")
		.await
		.expect_err("A 400 response must fail.");

	assert!(matches!(
		err,
		Error::Acquisition(AcquisitionError { origin: IdentitySource::Imds, status: 400, .. })
	));
	assert_eq!(
		err.to_string(),
		"Failed to acquire managed identity token from VM IMDS (HTTP 400): Identity not found"
	);
	assert!(cache.is_empty());

	mock.assert_async().await;
}

#[tokio::test]
async fn app_service_failure_is_not_retried_against_imds() {
	let server = MockServer::start_async().await;
	let host = server
		.mock_async(|when, then| {
			when.method(GET).path("/msi/token");
			then.status(500).body("upstream unavailable");
		})
		.await;
	let imds = server
		.mock_async(|when, then| {
			when.method(GET).path("/metadata/identity/oauth2/token");
			then.status(200).body(token_body("imds-token", now_epoch() + 3_600));
		})
		.await;
	let (provider, _cache) =
		build_reqwest_test_provider(app_service_env(&server.url("/msi/token"), IDENTITY_HEADER));
	let provider = provider.with_imds_endpoint(
		Url::parse(&server.url("/metadata/identity/oauth2/token"))
			.expect("Mock IMDS endpoint should parse."),
	);
	let err = provider.fetch_token(RESOURCE, "").await.expect_err("A 500 response must fail.");

	assert!(
		err.to_string()
			.starts_with("Failed to acquire managed identity token from App Service/Container Apps (HTTP 500)")
	);

	host.assert_calls_async(1).await;
	imds.assert_calls_async(0).await;
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
	// Nothing listens on port 9 of the loopback interface.
	let (provider, _cache) =
		build_reqwest_test_provider(app_service_env("http://127.0.0.1:9/msi/token", IDENTITY_HEADER));
	let err = provider.fetch_token(RESOURCE, "").await.expect_err("Connection must be refused.");

	assert!(matches!(
		err,
		Error::Transport(TransportError::Network { origin: IdentitySource::AppService, .. })
	));
}

#[tokio::test]
async fn redirect_is_not_followed_and_identity_header_stays_on_origin() {
	let origin = MockServer::start_async().await;
	let elsewhere = MockServer::start_async().await;
	let location = elsewhere.url("/collect");
	let redirect = origin
		.mock_async(|when, then| {
			when.method(GET).path("/msi/token");
			then.status(302).header("location", location.as_str());
		})
		.await;
	let forwarded = elsewhere
		.mock_async(|when, then| {
			when.path("/collect");
			then.status(200).body(token_body("foreign-token", now_epoch() + 3_600));
		})
		.await;
	let (provider, cache) =
		build_reqwest_test_provider(app_service_env(&origin.url("/msi/token"), IDENTITY_HEADER));
	let err = provider.fetch_token(RESOURCE, "").await.expect_err("Redirects must not succeed.");

	assert!(matches!(
		err,
		Error::Acquisition(AcquisitionError { origin: IdentitySource::AppService, status: 302, .. })
	));
	assert!(cache.is_empty());

	redirect.assert_calls_async(1).await;
	forwarded.assert_calls_async(0).await;
}

#[tokio::test]
async fn fetch_always_calls_the_endpoint_and_overwrites_the_cache() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/msi/token");
			then.status(200).body(token_body("refetched", now_epoch() + 3_600));
		})
		.await;
	let (provider, cache) =
		build_reqwest_test_provider(app_service_env(&server.url("/msi/token"), IDENTITY_HEADER));

	cache.store(RESOURCE, "", "previous", now_epoch() + 7_200);

	let token = provider.fetch_token(RESOURCE, "").await.expect("Fetch should succeed.");

	assert_eq!(token.expose(), "refetched");
	assert_eq!(cache.lookup(RESOURCE, "").map(|t| t.into_inner()).as_deref(), Some("refetched"));

	mock.assert_calls_async(1).await;
}
