//! OAuth token endpoint facade built on the `oauth2` crate.
//!
//! The facade issues `grant_type=refresh_token` and `grant_type=authorization_code` exchanges
//! with client credentials presented via HTTP Basic, then validates the response into a
//! [`TokenGrant`]. An `invalid_grant` answer means the stored refresh token no longer
//! authorizes the integration, so it maps to [`Error::InvalidAuthorization`] rather than a
//! generic failure.

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RefreshToken, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicErrorResponseType, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::TokenGrant,
	error::{ConfigError, TransientError, TransportError},
	http::{HttpTransport, ResponseMetadata, ResponseMetadataSlot},
	provider::BadgrProvider,
};

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Client for the issuer's OAuth token endpoint.
#[derive(Clone)]
pub struct TokenEndpointClient {
	oauth_client: ConfiguredBasicClient,
	transport: HttpTransport,
}
impl TokenEndpointClient {
	/// Builds a facade from the provider's endpoint set and client credentials.
	pub fn new(provider: &BadgrProvider, transport: HttpTransport) -> Result<Self> {
		let auth_url = AuthUrl::new(provider.authorization.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let token_url = TokenUrl::new(provider.token.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		// The default oauth2 auth type is HTTP Basic, which is what the issuer's token endpoint
		// expects for client authentication.
		let oauth_client = BasicClient::new(ClientId::new(provider.client_id.clone()))
			.set_client_secret(ClientSecret::new(provider.client_secret.expose().to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url);

		Ok(Self { oauth_client, transport })
	}

	/// Exchanges a refresh token for a fresh token pair.
	pub async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
		let meta = ResponseMetadataSlot::default();
		let handle = self.transport.token_handle(meta.clone());
		let secret = RefreshToken::new(refresh_token.to_owned());
		let response = self
			.oauth_client
			.exchange_refresh_token(&secret)
			.request_async(&handle)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		into_grant(response)
	}

	/// Exchanges an authorization code (from the consent redirect) for the initial token pair.
	pub async fn exchange_authorization_code(
		&self,
		code: &str,
		redirect_uri: &Url,
	) -> Result<TokenGrant> {
		let meta = ResponseMetadataSlot::default();
		let handle = self.transport.token_handle(meta.clone());
		let redirect_url = oauth2::RedirectUrl::new(redirect_uri.to_string())
			.map_err(|source| ConfigError::InvalidRedirect { source })?;
		let response = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.set_redirect_uri(Cow::Owned(redirect_url))
			.request_async(&handle)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		into_grant(response)
	}
}
impl Debug for TokenEndpointClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenEndpointClient(..)")
	}
}

fn into_grant(response: oauth2::basic::BasicTokenResponse) -> Result<TokenGrant> {
	let access_token = Some(response.access_token().secret().to_owned());
	let refresh_token = response.refresh_token().map(|token| token.secret().to_owned());
	let expires_in = response
		.expires_in()
		.and_then(|lifetime| i64::try_from(lifetime.as_secs()).ok())
		.map(Duration::seconds);
	let scope = response.scopes().map(|scopes| {
		scopes.iter().map(|scope| scope.as_str().to_owned()).collect::<Vec<_>>().join(" ")
	});

	TokenGrant::from_parts(access_token, refresh_token, expires_in, scope).map_err(Into::into)
}

fn map_request_error(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Error {
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(response, meta_ref),
		RequestTokenError::Request(error) => map_transport_error(meta_ref, error),
		RequestTokenError::Parse(error, _body) =>
			TransientError::TokenResponseParse { source: error, status: meta_status(meta_ref) }
				.into(),
		RequestTokenError::Other(message) => TransientError::TokenEndpoint {
			message: format!("Token endpoint returned an unexpected response: {message}."),
			status: meta_status(meta_ref),
			retry_after: meta_retry_after(meta_ref),
		}
		.into(),
	}
}

fn map_server_response_error(
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let message = if let Some(description) = response.error_description() {
		format!("token endpoint returned {}: {description}", response.error().as_ref())
	} else {
		format!("token endpoint returned {}", response.error().as_ref())
	};

	// A lapsed authorization: the admin has to walk the consent flow again.
	if matches!(response.error(), BasicErrorResponseType::InvalidGrant) {
		return Error::invalid_authorization(message);
	}

	TransientError::TokenEndpoint {
		message,
		status: meta_status(meta),
		retry_after: meta_retry_after(meta),
	}
	.into()
}

fn map_transport_error(
	meta: Option<&ResponseMetadata>,
	err: HttpClientError<ReqwestError>,
) -> Error {
	match err {
		HttpClientError::Reqwest(inner) => map_reqwest_error(meta, *inner),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransientError::TokenEndpoint {
			message: format!("HTTP client error occurred while calling the token endpoint: {message}."),
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
		_ => TransientError::TokenEndpoint {
			message: "HTTP client error occurred while calling the token endpoint.".into(),
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

fn map_reqwest_error(meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::http_client_build(err).into();
	}
	if err.is_timeout() {
		return TransientError::TokenEndpoint {
			message: "Request timed out while calling the token endpoint.".into(),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
			retry_after: meta_retry_after(meta),
		}
		.into();
	}

	TransportError::from(err).into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::StandardErrorResponse;
	// self
	use super::*;

	fn server_error(kind: BasicErrorResponseType) -> BasicErrorResponse {
		StandardErrorResponse::new(kind, Some("account lapsed".into()), None)
	}

	#[test]
	fn invalid_grant_maps_to_reauthorization() {
		let error = map_server_response_error(
			server_error(BasicErrorResponseType::InvalidGrant),
			Some(&ResponseMetadata { status: Some(400), retry_after: None }),
		);

		assert!(matches!(error, Error::InvalidAuthorization { .. }));
		assert!(error.to_string().contains("account lapsed"));
	}

	#[test]
	fn other_oauth_errors_stay_transient() {
		let error = map_server_response_error(
			server_error(BasicErrorResponseType::InvalidRequest),
			Some(&ResponseMetadata { status: Some(400), retry_after: None }),
		);

		assert!(matches!(error, Error::Transient(TransientError::TokenEndpoint { .. })));
	}
}
