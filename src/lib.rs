//! Badge-issuer connector—site-scoped OAuth token custody with collapse-smart refresh, plus typed
//! badge template and award operations over the issuer's REST API.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod cache;
pub mod content;
pub mod error;
pub mod handshake;
pub mod http;
pub mod integration;
pub mod model;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod store;
pub mod translate;
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers shared by the integration tests and demos.

	pub use crate::_prelude::*;

	// self
	use crate::{
		api::{BadgrClient, Credentials},
		auth::{IntegrationId, SiteContext, SiteId},
		cache::{MemoryCache, TokenCache},
		http::HttpTransport,
		oauth::TokenEndpointClient,
		provider::BadgrProvider,
		store::TokenStore,
	};

	/// Builds an HTTP transport that accepts the self-signed certificates produced by `httpmock`
	/// during tests.
	pub fn test_http_transport() -> HttpTransport {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		HttpTransport::with_client(client)
	}

	/// Site context shared by the integration-test fixtures.
	pub fn test_site_context() -> SiteContext {
		let site = SiteId::new("alpha.example.edu").expect("Site fixture should be valid.");

		SiteContext::new(site, IntegrationId::new(401))
	}

	/// Builds a provider whose API base and token endpoint both point at a mock server URL.
	pub fn test_provider(base: &str) -> BadgrProvider {
		let api_base = Url::parse(base).expect("Mock API base should parse successfully.");
		let token = Url::parse(&format!("{base}/o/token"))
			.expect("Mock token endpoint should parse successfully.");
		let authorization = Url::parse(&format!("{base}/auth/oauth2/authorize"))
			.expect("Mock authorization endpoint should parse successfully.");

		BadgrProvider::builder()
			.api_base(api_base)
			.authorization_endpoint(authorization)
			.token_endpoint(token)
			.client_id("test-client")
			.client_secret("test-secret")
			.build()
			.expect("Provider fixture should build successfully.")
	}

	/// Constructs a [`TokenStore`] backed by an in-memory cache and the test transport.
	pub fn build_test_store(
		provider: &BadgrProvider,
		cache: Arc<dyn TokenCache>,
	) -> Arc<TokenStore> {
		let token_client = TokenEndpointClient::new(provider, test_http_transport())
			.expect("Token endpoint client fixture should build successfully.");

		Arc::new(TokenStore::new(cache, token_client, test_site_context()))
	}

	/// Constructs a bearer-authenticated [`BadgrClient`] bound to the provider's first API base.
	pub fn build_test_client(
		provider: &BadgrProvider,
		store: Arc<TokenStore>,
		organization_id: Option<&str>,
	) -> BadgrClient {
		let mut client = BadgrClient::new(
			provider.api_base().clone(),
			Credentials::Bearer(store),
			test_http_transport(),
		);

		if let Some(id) = organization_id {
			client = client.with_organization(id);
		}

		client
	}

	/// Seeds the cache with a token pair the way a completed handshake would.
	pub async fn seed_tokens(store: &TokenStore, access: &str, refresh: &str) {
		store.store(access, refresh).await.expect("Seeding the token cache should succeed.");
	}

	/// Shorthand for a fresh in-memory cache behind the trait object the store expects.
	pub fn memory_cache() -> Arc<dyn TokenCache> {
		Arc::new(MemoryCache::default())
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
