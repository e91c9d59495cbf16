//! Demonstrates awarding a badge end to end against a mock issuer: seeded token pair, expired
//! access token, transparent refresh, and the award call itself.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use badgr_connect::{
	api::{AwardOptions, BadgrClient, Credentials},
	auth::{IntegrationId, SiteContext, SiteId},
	cache::MemoryCache,
	http::HttpTransport,
	model::Recipient,
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
	let award_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/organizations/demo-org/badges");
			then.status(201).header("content-type", "application/json").body(
				"{\"data\":{\"badge_template\":{\"id\":\"template-7\",\"name\":\"Demo Badge\",\"url\":\"https://issuer.example.com/badge/template-7\"},\"state\":\"pending\",\"recipient_email\":\"learner@example.com\",\"accept_badge_url\":\"https://issuer.example.com/accept/abc\"}}",
			);
		})
		.await;
	let provider = BadgrProvider::builder()
		.api_base(Url::parse(&server.base_url())?)
		.token_endpoint(Url::parse(&server.url("/o/token"))?)
		.authorization_endpoint(Url::parse(&server.url("/auth"))?)
		.client_id("demo-client")
		.client_secret("demo-secret")
		.build()?;
	let transport = HttpTransport::with_client(
		Client::builder().danger_accept_invalid_certs(true).build()?,
	);
	let context = SiteContext::new(SiteId::new("demo.example.edu")?, IntegrationId::new(1));
	let store = Arc::new(TokenStore::new(
		Arc::new(MemoryCache::default()),
		TokenEndpointClient::new(&provider, transport.clone())?,
		context,
	));

	// Only the refresh token survives, as after a day of idleness; the first call refreshes.
	store.store("", "demo-refresh").await?;

	let client = BadgrClient::new(
		provider.api_base().clone(),
		Credentials::Bearer(store),
		transport,
	)
	.with_organization("demo-org");
	let recipient = Recipient::new(12, "learner@example.com").with_display_name("Demo Learner");
	let award = client.award_badge(&recipient, "template-7", AwardOptions::default()).await?;

	println!(
		"Awarded `{}` to {} (state: {:?}).",
		award.badge_template.name.as_deref().unwrap_or("<unnamed>"),
		award.recipient_email,
		award.state,
	);

	token_mock.assert_async().await;
	award_mock.assert_async().await;

	Ok(())
}
