// std
use std::sync::Mutex;
// self
use managed_identity_broker::{
	_preludet::*,
	flows::TokenProvider,
	http::{GenericTransportErrorMapper, TokenHttpClient},
	oauth2::{
		AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
		http::{HeaderMap, Method, StatusCode, Uri},
	},
	provider::MapEnv,
	store::TokenCache,
};

#[derive(Debug)]
enum FakeTransportError {
	Refused,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Refused => write!(f, "Connection refused."),
		}
	}
}
impl StdError for FakeTransportError {}

#[derive(Clone, Debug)]
struct RecordedRequest {
	method: Method,
	uri: Uri,
	headers: HeaderMap,
}
impl RecordedRequest {
	fn method(&self) -> &Method {
		&self.method
	}

	fn uri(&self) -> &Uri {
		&self.uri
	}

	fn headers(&self) -> &HeaderMap {
		&self.headers
	}
}

/// Captures every request and answers with a canned response.
#[derive(Clone, Default)]
struct RecordingHttpClient {
	requests: Arc<Mutex<Vec<RecordedRequest>>>,
	status: Option<u16>,
	body: String,
}
impl RecordingHttpClient {
	fn answering(status: u16, body: impl Into<String>) -> Self {
		Self { requests: Default::default(), status: Some(status), body: body.into() }
	}

	fn refusing() -> Self {
		Self::default()
	}

	fn recorded(&self) -> Vec<RecordedRequest> {
		self.requests.lock().expect("Request log should not be poisoned.").clone()
	}
}
impl TokenHttpClient for RecordingHttpClient {
	type Handle = RecordingHandle;
	type TransportError = FakeTransportError;

	fn handle(&self) -> Self::Handle {
		RecordingHandle(self.clone())
	}
}

struct RecordingHandle(RecordingHttpClient);
impl<'a> AsyncHttpClient<'a> for RecordingHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let recorded = RecordedRequest {
				method: request.method().clone(),
				uri: request.uri().clone(),
				headers: request.headers().clone(),
			};

			client.requests.lock().expect("Request log should not be poisoned.").push(recorded);

			let Some(status) = client.status else {
				return Err(HttpClientError::Reqwest(Box::new(FakeTransportError::Refused)));
			};
			let mut response = HttpResponse::new(client.body.clone().into_bytes());

			*response.status_mut() =
				StatusCode::from_u16(status).expect("Fake status should be a valid HTTP status.");

			Ok(response)
		})
	}
}

fn provider(
	client: RecordingHttpClient,
	env: MapEnv,
) -> TokenProvider<RecordingHttpClient, GenericTransportErrorMapper> {
	TokenProvider::with_http_client(client, Arc::new(GenericTransportErrorMapper))
		.with_cache(Arc::new(TokenCache::default()))
		.with_env(env)
}

fn body(expires_on: i64) -> String {
	format!(r#"{{"access_token":"fake-token","expires_on":"{expires_on}"}}"#)
}

#[tokio::test]
async fn default_imds_request_targets_link_local_metadata_address() {
	let client = RecordingHttpClient::answering(200, body(now_epoch() + 3_600));
	let provider = provider(client.clone(), MapEnv::default());
	let token = provider
		.fetch_token("https://management.azure.com/", "")
		.await
		.expect("Fake IMDS fetch should succeed.");

	assert_eq!(token.expose(), "fake-token");

	let requests = client.recorded();

	assert_eq!(requests.len(), 1);

	let request = &requests[0];
	let uri = request.uri();
	let query = uri.query().expect("IMDS request should carry a query string.");

	assert_eq!(request.method(), &Method::GET);
	assert_eq!(uri.scheme_str(), Some("http"));
	assert_eq!(uri.host(), Some("169.254.169.254"));
	assert_eq!(uri.path(), "/metadata/identity/oauth2/token");
	assert!(query.starts_with("api-version=2018-02-01&resource="));
	assert!(!query.contains("client_id"));
	assert_eq!(request.headers().get("Metadata").and_then(|v| v.to_str().ok()), Some("true"));
	assert!(request.headers().get("X-IDENTITY-HEADER").is_none());
}

#[tokio::test]
async fn imds_request_appends_client_id_for_user_assigned_identity() {
	let client = RecordingHttpClient::answering(200, body(now_epoch() + 3_600));
	let provider = provider(client.clone(), MapEnv::default());

	provider
		.fetch_token("https://storage.azure.com/", "user-assigned")
		.await
		.expect("Fake IMDS fetch should succeed.");

	let requests = client.recorded();
	let query = requests[0].uri().query().expect("Query should be present.").to_owned();

	assert!(query.ends_with("&client_id=user-assigned"));
}

#[tokio::test]
async fn endpoint_selection_is_reevaluated_on_every_fetch() {
	let client = RecordingHttpClient::answering(200, body(now_epoch() + 3_600));
	let imds_provider = provider(client.clone(), MapEnv::default());

	imds_provider.fetch_token("api://one", "").await.expect("IMDS fetch should succeed.");

	let host_provider = imds_provider
		.clone()
		.with_env(app_service_env("http://127.0.0.1:41741/msi/token", "header-secret"));

	host_provider.fetch_token("api://one", "").await.expect("Host fetch should succeed.");

	let requests = client.recorded();

	assert_eq!(requests[0].uri().host(), Some("169.254.169.254"));
	assert_eq!(requests[1].uri().host(), Some("127.0.0.1"));
	assert!(requests[1].uri().query().is_some_and(|q| q.contains("api-version=2019-08-01")));
	assert_eq!(
		requests[1].headers().get("X-IDENTITY-HEADER").and_then(|v| v.to_str().ok()),
		Some("header-secret")
	);
}

#[tokio::test]
async fn refused_connection_surfaces_transport_error() {
	let client = RecordingHttpClient::refusing();
	let provider = provider(client.clone(), MapEnv::default());
	let err = provider.fetch_token("api://one", "").await.expect_err("Refusal must fail.");

	assert!(matches!(err, Error::Transport(_)));
	assert!(
		StdError::source(&err).is_some_and(|source| source.to_string() == "Connection refused.")
	);
	assert_eq!(client.recorded().len(), 1);
	assert!(provider.cache.is_empty());
}

#[tokio::test]
async fn empty_resource_is_rejected_before_any_request() {
	let client = RecordingHttpClient::answering(200, body(now_epoch() + 3_600));
	let provider = provider(client.clone(), MapEnv::default());
	let err = provider.fetch_token("", "").await.expect_err("Empty resource must fail.");

	assert!(matches!(err, Error::Config(_)));
	assert!(client.recorded().is_empty());
}
