//! Issuer deployment descriptors: endpoint sets and client credentials.

// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Production badge API base.
pub const PRODUCTION_API_BASE: &str = "https://api.badgr.io/v2";
/// Staging badge API base.
pub const STAGING_API_BASE: &str = "https://api.staging.badgr.io/v2";
/// Production token endpoint.
pub const PRODUCTION_TOKEN_URL: &str = "https://api.badgr.io/o/token";
/// Staging token endpoint.
pub const STAGING_TOKEN_URL: &str = "https://api.staging.badgr.io/o/token";
/// Consent-page authorization endpoint.
pub const AUTHORIZATION_URL: &str = "https://badgr.io/auth/oauth2/authorize";
/// Scope requested during authorization.
pub const DEFAULT_SCOPE: &str = "rw:issuer r:backpack";

/// Immutable issuer deployment descriptor consumed by the token store and the API client.
///
/// `api_bases` is an ordered probe list: steady-state calls use the first entry, while
/// integration initialization may walk the remainder when a legacy deployment answers on an
/// alternate base.
#[derive(Clone, Debug)]
pub struct BadgrProvider {
	/// Ordered badge API base URLs.
	pub api_bases: Vec<Url>,
	/// Authorization (consent) endpoint.
	pub authorization: Url,
	/// Token endpoint used for exchanges and refreshes.
	pub token: Url,
	/// OAuth client identifier issued to this platform.
	pub client_id: String,
	/// OAuth client secret; authenticated to the token endpoint via HTTP Basic.
	pub client_secret: TokenSecret,
	/// Scope string requested during authorization.
	pub scope: String,
}
impl BadgrProvider {
	/// Creates a new builder.
	pub fn builder() -> BadgrProviderBuilder {
		BadgrProviderBuilder::default()
	}

	/// Descriptor for the production deployment.
	pub fn production(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Result<Self, ConfigError> {
		Self::well_known(PRODUCTION_API_BASE, PRODUCTION_TOKEN_URL, client_id, client_secret)
	}

	/// Descriptor for the staging deployment.
	pub fn staging(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Result<Self, ConfigError> {
		Self::well_known(STAGING_API_BASE, STAGING_TOKEN_URL, client_id, client_secret)
	}

	fn well_known(
		api_base: &str,
		token: &str,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Result<Self, ConfigError> {
		Self::builder()
			.api_base(parse_endpoint(api_base)?)
			.authorization_endpoint(parse_endpoint(AUTHORIZATION_URL)?)
			.token_endpoint(parse_endpoint(token)?)
			.client_id(client_id)
			.client_secret(client_secret)
			.build()
	}

	/// Returns the primary API base used for steady-state calls.
	pub fn api_base(&self) -> &Url {
		// The builder guarantees a non-empty list.
		&self.api_bases[0]
	}
}

fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidEndpoint { source })
}

/// Builder for [`BadgrProvider`] values.
#[derive(Debug, Default)]
pub struct BadgrProviderBuilder {
	api_bases: Vec<Url>,
	authorization: Option<Url>,
	token: Option<Url>,
	client_id: Option<String>,
	client_secret: Option<TokenSecret>,
	scope: Option<String>,
}
impl BadgrProviderBuilder {
	/// Appends an API base URL to the ordered probe list.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_bases.push(url);

		self
	}

	/// Sets the authorization (consent) endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token = Some(url);

		self
	}

	/// Sets the OAuth client identifier.
	pub fn client_id(mut self, id: impl Into<String>) -> Self {
		self.client_id = Some(id.into());

		self
	}

	/// Sets the OAuth client secret.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(TokenSecret::new(secret));

		self
	}

	/// Overrides the authorization scope (defaults to [`DEFAULT_SCOPE`]).
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<BadgrProvider, ConfigError> {
		if self.api_bases.is_empty() {
			return Err(ConfigError::MissingApiBase);
		}

		let authorization = self
			.authorization
			.map_or_else(|| parse_endpoint(AUTHORIZATION_URL), Ok)?;
		let token = self.token.map_or_else(|| parse_endpoint(PRODUCTION_TOKEN_URL), Ok)?;
		let client_id =
			self.client_id.ok_or(ConfigError::MissingCredential { field: "client_id" })?;
		let client_secret =
			self.client_secret.ok_or(ConfigError::MissingCredential { field: "client_secret" })?;

		Ok(BadgrProvider {
			api_bases: self.api_bases,
			authorization,
			token,
			client_id,
			client_secret,
			scope: self.scope.unwrap_or_else(|| DEFAULT_SCOPE.into()),
		})
	}
}
