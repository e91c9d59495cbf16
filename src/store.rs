//! Site-scoped token custody with collapse-smart refresh.
//!
//! [`TokenStore`] owns one integration's token pair inside the shared cache. Reads are plain
//! cache lookups; refresh serializes writers on a named lock (site name + local integration id)
//! and re-reads the cached access token after acquiring so that callers who queued behind an
//! in-flight refresh reuse its result instead of issuing redundant token endpoint calls. Only
//! the caller whose triggering token still matches the cache performs the remote rotation.

// self
use crate::{
	_prelude::*,
	auth::{SiteContext, TokenGrant},
	cache::{TokenCache, TokenKeys},
	error::ConfigError,
	oauth::TokenEndpointClient,
	obs::{self, OpKind, OpOutcome, OpSpan},
};

/// Lifetime of a cached access token. The issuer mints day-long access tokens.
pub const ACCESS_TOKEN_TTL: Duration = Duration::hours(24);
/// Lifetime of a cached refresh token.
pub const REFRESH_TOKEN_TTL: Duration = Duration::days(30);
/// Bounded wait on the refresh lock so a crashed holder cannot deadlock future requests.
pub const REFRESH_LOCK_TIMEOUT: Duration = Duration::seconds(180);

/// Durable, concurrency-safe custody of one integration's OAuth token pair.
#[derive(Clone)]
pub struct TokenStore {
	cache: Arc<dyn TokenCache>,
	token_client: TokenEndpointClient,
	context: SiteContext,
	keys: TokenKeys,
}
impl TokenStore {
	/// Creates a store scoped to the provided site context.
	pub fn new(
		cache: Arc<dyn TokenCache>,
		token_client: TokenEndpointClient,
		context: SiteContext,
	) -> Self {
		let keys = TokenKeys::for_context(&context);

		Self { cache, token_client, context, keys }
	}

	/// Returns the site context this store is bound to.
	pub fn context(&self) -> &SiteContext {
		&self.context
	}

	/// Returns the cached access token, refreshing first when none is cached.
	pub async fn access_token(&self) -> Result<String> {
		if let Some(token) = self.cache.get(&self.keys.access_token).await?
			&& !token.is_empty()
		{
			return Ok(token);
		}

		self.refresh(None).await
	}

	/// Returns the cached refresh token.
	///
	/// Absence is a fatal configuration state: the pair is only ever written whole, so a missing
	/// refresh token means the integration was never authorized (or its 30-day window lapsed)
	/// and an admin must re-run the consent flow.
	pub async fn refresh_token(&self) -> Result<String> {
		match self.cache.get(&self.keys.refresh_token).await? {
			Some(token) if !token.is_empty() => Ok(token),
			_ => Err(ConfigError::MissingRefreshToken.into()),
		}
	}

	/// Rotates the token pair, collapsing concurrent callers into one remote round-trip.
	///
	/// `old_access_token` is the token whose rejection triggered this refresh (or `None` when no
	/// token was cached at all). After acquiring the lock the cache is read again: a non-empty
	/// value different from `old_access_token` means another holder already rotated, and that
	/// value is returned without touching the token endpoint.
	pub async fn refresh(&self, old_access_token: Option<&str>) -> Result<String> {
		const KIND: OpKind = OpKind::Refresh;

		let span = OpSpan::new(KIND, "refresh");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _lease =
					self.cache.lock(&self.keys.refresh_lock, REFRESH_LOCK_TIMEOUT).await?;

				if let Some(current) = self.cache.get(&self.keys.access_token).await?
					&& !current.is_empty()
					&& old_access_token != Some(current.as_str())
				{
					return Ok(current);
				}

				let refresh_token = self.refresh_token().await?;
				let grant = self.token_client.refresh(&refresh_token).await?;
				let access = grant.access_token.expose().to_owned();

				self.store(grant.access_token.expose(), grant.refresh_token.expose()).await?;

				Ok(access)
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => {
				#[cfg(feature = "tracing")]
				tracing::warn!(site = %self.context.site, "token refresh failed");

				obs::record_op_outcome(KIND, OpOutcome::Failure);
			},
		}

		result
	}

	/// Unconditionally overwrites the cached pair with fresh expirations.
	///
	/// Callers must hold the refresh lock, or be the single writer right after the
	/// authorization handshake.
	pub async fn store(&self, access_token: &str, refresh_token: &str) -> Result<()> {
		self.cache
			.set_with_expiry(&self.keys.access_token, ACCESS_TOKEN_TTL, access_token.to_owned())
			.await?;
		self.cache
			.set_with_expiry(&self.keys.refresh_token, REFRESH_TOKEN_TTL, refresh_token.to_owned())
			.await?;

		Ok(())
	}

	/// Completes the authorization-code handshake and seeds the cache with the minted pair.
	pub async fn complete_handshake(&self, code: &str, redirect_uri: &Url) -> Result<TokenGrant> {
		const KIND: OpKind = OpKind::Handshake;

		let span = OpSpan::new(KIND, "complete_handshake");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let grant =
					self.token_client.exchange_authorization_code(code, redirect_uri).await?;

				self.store(grant.access_token.expose(), grant.refresh_token.expose()).await?;

				Ok(grant)
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}
}
impl Debug for TokenStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenStore").field("context", &self.context).finish()
	}
}
