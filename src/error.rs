//! Connector-level error types shared across the token store, the API client, and translators.

// self
use crate::_prelude::*;

/// Connector-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical connector error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token-cache failure.
	#[error("{0}")]
	Cache(
		#[from]
		#[source]
		crate::cache::CacheError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token endpoint broke its response contract.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),
	/// Badge API payload could not be translated into a domain object.
	#[error(transparent)]
	Translate(#[from] TranslateError),

	/// Integration has no resolved organization; callers must finish initialization first.
	#[error("Integration is not bound to an organization.")]
	MissingOrganization,
	/// Authorization is no longer valid; the integration must be re-authorized by an admin.
	#[error("Integration needs re-authorization: {reason}.")]
	InvalidAuthorization {
		/// Issuer- or connector-supplied reason string.
		reason: String,
	},
	/// Recipient already holds this non-repeatable badge.
	#[error("Recipient already holds this badge: {message}.")]
	DuplicateAward {
		/// Message extracted from the issuer's validation payload.
		message: String,
	},
	/// Badge API rejected the call for any other reason; the raw body is kept for diagnostics.
	#[error("{0}")]
	Api(ApiFailure),
}
impl Error {
	/// Shorthand for [`Error::InvalidAuthorization`].
	pub fn invalid_authorization(reason: impl Into<String>) -> Self {
		Self::InvalidAuthorization { reason: reason.into() }
	}
}

/// Unaccepted badge API response, preserved verbatim for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Badge API call failed with status {status}")]
pub struct ApiFailure {
	/// HTTP status code returned by the badge API.
	pub status: u16,
	/// Raw response body as text.
	pub body: String,
}

/// Configuration and validation failures raised by the connector.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Provider endpoint set contains an invalid URL.
	#[error("Provider contains an invalid URL.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Provider was built without an API base URL.
	#[error("Provider must declare at least one API base URL.")]
	MissingApiBase,
	/// Provider was built without client credentials.
	#[error("Provider is missing the {field} credential.")]
	MissingCredential {
		/// Which credential field was absent.
		field: &'static str,
	},

	/// No refresh token is cached for this integration; the site must re-authorize.
	#[error("No refresh token is cached for this integration.")]
	MissingRefreshToken,
	/// Evidence reference failed platform identifier syntax validation.
	#[error("Evidence reference is not a valid content reference: {value}.")]
	InvalidContentRef {
		/// Offending reference string.
		value: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Token endpoint returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Issuer- or connector-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the remote API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Token endpoint contract violations. These are fatal: the connector never proceeds with
/// partial credentials.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum ProtocolError {
	/// Token response carried no usable access token.
	#[error("Token endpoint response is missing an access token.")]
	AccessTokenMissing,
	/// Token response omitted the refresh token entirely.
	#[error("Token endpoint response is missing a refresh token.")]
	RefreshTokenMissing,
	/// Token response carried an explicitly empty refresh token.
	#[error("Token endpoint response contains an empty refresh token.")]
	RefreshTokenEmpty,
}

/// Failures raised while turning raw badge API payloads into domain objects.
#[derive(Debug, ThisError)]
pub enum TranslateError {
	/// Response body was not valid JSON.
	#[error("Badge API returned a body that is not valid JSON.")]
	Syntax {
		/// Underlying JSON syntax failure.
		#[source]
		source: serde_json::Error,
	},
	/// Payload decoded as JSON but did not match the expected entity shape.
	#[error("Badge API payload for {entity} has an unexpected shape.")]
	Decode {
		/// Entity kind the caller requested.
		entity: &'static str,
		/// Structured parsing failure carrying the offending field path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Payload was missing a structural element (e.g. the list envelope).
	#[error("Badge API payload for {entity} is missing `{field}`.")]
	MissingField {
		/// Entity kind the caller requested.
		entity: &'static str,
		/// Missing structural field.
		field: &'static str,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn api_failure_keeps_raw_body() {
		let failure = ApiFailure { status: 500, body: "{\"oops\":true}".into() };
		let error = Error::Api(failure.clone());

		assert!(error.to_string().contains("500"));
		assert_eq!(failure.body, "{\"oops\":true}");
	}

	#[test]
	fn cache_error_converts_with_source() {
		let cache_error = crate::cache::CacheError::Backend { message: "cache unreachable".into() };
		let error: Error = cache_error.into();

		assert!(matches!(error, Error::Cache(_)));
		assert!(error.to_string().contains("cache unreachable"));
		assert!(StdError::source(&error).is_some(), "Cache errors should expose their source.");
	}

	#[test]
	fn protocol_violations_are_distinct_from_generic_failures() {
		let error: Error = ProtocolError::RefreshTokenEmpty.into();

		assert!(matches!(error, Error::Protocol(ProtocolError::RefreshTokenEmpty)));
		assert!(!matches!(error, Error::Api(_)));
	}
}
