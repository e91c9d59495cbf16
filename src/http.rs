//! Shared HTTP transport for the badge API and the OAuth token endpoint.
//!
//! One [`HttpTransport`] serves both halves of the connector: [`HttpTransport::send_api`]
//! executes plain badge API requests and hands the status and body back to the client's call
//! protocol, while [`HttpTransport::token_handle`] produces an instrumented
//! [`AsyncHttpClient`] handle for the `oauth2` crate that records response status and
//! Retry-After hints in a [`ResponseMetadataSlot`] so token endpoint failures can be classified
//! with consistent metadata.

// std
use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransportError};

/// Captures metadata from the most recent token endpoint response for downstream error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the token endpoint, if available.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
///
/// The connector creates a fresh slot for each token request and reads the captured metadata
/// immediately after `oauth2` resolves. The handle clears the slot before dispatching so traces
/// from prior attempts never leak into a new invocation.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Badge API response reduced to what the call protocol needs.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Renders the body as lossy UTF-8 text for diagnostics.
	pub fn body_text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Token requests should not follow redirects, matching OAuth 2.0 guidance that token endpoints
/// return results directly instead of delegating to another URI. Configure any custom
/// [`ReqwestClient`] accordingly before wrapping it.
#[derive(Clone, Default)]
pub struct HttpTransport(pub ReqwestClient);
impl HttpTransport {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Executes a prepared badge API request, returning status and body.
	pub(crate) async fn send_api(
		&self,
		request: reqwest::Request,
	) -> Result<ApiResponse, TransportError> {
		let response = self.0.execute(request).await?;
		let status = response.status().as_u16();
		let body = response.bytes().await?.to_vec();

		Ok(ApiResponse { status, body })
	}

	/// Builds an instrumented token endpoint handle that records outcomes in `slot`.
	pub(crate) fn token_handle(&self, slot: ResponseMetadataSlot) -> TokenEndpointHandle {
		TokenEndpointHandle::new(self.0.clone(), slot)
	}
}
impl AsRef<ReqwestClient> for HttpTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for HttpTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl Debug for HttpTransport {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("HttpTransport(..)")
	}
}

struct InstrumentedTokenClient {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}

/// Instrumented [`AsyncHttpClient`] handle driving token endpoint exchanges.
#[derive(Clone)]
pub struct TokenEndpointHandle(Arc<InstrumentedTokenClient>);
impl TokenEndpointHandle {
	fn new(client: ReqwestClient, slot: ResponseMetadataSlot) -> Self {
		Self(Arc::new(InstrumentedTokenClient { client, slot }))
	}
}
impl<'c> AsyncHttpClient<'c> for TokenEndpointHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = Arc::clone(&self.0);

		Box::pin(async move {
			client.slot.take();

			let response = client
				.client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let retry_after = parse_retry_after(&headers);

			client.slot.store(ResponseMetadata { status: Some(status.as_u16()), retry_after });

			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// crates.io
	use reqwest::header::HeaderValue;
	// self
	use super::*;

	#[test]
	fn metadata_slot_is_consumed_on_take() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata { status: Some(401), retry_after: None });

		assert_eq!(slot.take().and_then(|meta| meta.status), Some(401));
		assert!(slot.take().is_none(), "A second take must observe an empty slot.");
	}

	#[test]
	fn retry_after_parses_relative_seconds() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("120"));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(120)));
	}

	#[test]
	fn retry_after_ignores_garbage() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));

		assert_eq!(parse_retry_after(&headers), None);
	}

	#[test]
	fn api_response_renders_lossy_text() {
		let response = ApiResponse { status: 422, body: b"already has this badge".to_vec() };

		assert_eq!(response.body_text(), "already has this badge");
	}
}
