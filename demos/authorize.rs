//! Demonstrates the admin-facing authorization bootstrap: building the consent URL, completing
//! the code exchange against a mock token endpoint, and resolving the organization binding.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use badgr_connect::{
	auth::{IntegrationId, SiteContext, SiteId},
	cache::MemoryCache,
	handshake,
	http::HttpTransport,
	integration::{InitializationOutcome, Initializer, Integration, MemoryRegistry},
	oauth::TokenEndpointClient,
	provider::BadgrProvider,
	reqwest::Client,
	store::TokenStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/o/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"refresh_token\":\"demo-refresh\",\"expires_in\":86400}",
			);
		})
		.await;
	let organizations_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/organizations");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"data\":[{\"id\":\"demo-org\",\"name\":\"Demo Organization\"}]}");
		})
		.await;
	let provider = BadgrProvider::builder()
		.api_base(Url::parse(&server.base_url())?)
		.token_endpoint(Url::parse(&server.url("/o/token"))?)
		.authorization_endpoint(Url::parse(&server.url("/auth"))?)
		.client_id("demo-client")
		.client_secret("demo-secret")
		.build()?;
	let redirect = Url::parse("https://demo.example.edu/oauth/return")?;
	let request = handshake::authorization_request(&provider, &redirect);

	println!("Send the admin to: {}", request.url);
	println!("Hold the state token for the redirect leg: {}", request.state);

	let transport = HttpTransport::with_client(
		Client::builder().danger_accept_invalid_certs(true).build()?,
	);
	let context = SiteContext::new(SiteId::new("demo.example.edu")?, IntegrationId::new(1));
	let store = Arc::new(TokenStore::new(
		Arc::new(MemoryCache::default()),
		TokenEndpointClient::new(&provider, transport.clone())?,
		context.clone(),
	));

	// The redirect came back; its state matched; exchange the code and seed the cache.
	assert!(handshake::state_matches(&request.state, &request.state));

	let grant = store.complete_handshake("demo-consent-code", &redirect).await?;

	println!("Handshake minted a pair (scope: {:?}).", grant.scope);

	let registry = Arc::new(MemoryRegistry::default());
	let initializer = Initializer::new(registry, transport);
	let integration = Integration::new(context).with_creator("site-admin");
	let outcome = initializer.initialize(integration, store, &provider).await?;

	match outcome {
		InitializationOutcome::Bound(integration) => println!(
			"Integration bound to organization {:?}.",
			integration.organization_id(),
		),
		InitializationOutcome::Ambiguous { candidates } =>
			println!("Organization resolution was ambiguous ({candidates} candidates)."),
	}

	token_mock.assert_async().await;
	organizations_mock.assert_async().await;

	Ok(())
}
