//! Authorization handshake helpers: the consent URL and its anti-forgery state token.
//!
//! Rendering the consent page and receiving the redirect stay with the host web framework; this
//! module only builds the outbound request and checks the returned state. Completing the
//! code-for-tokens exchange lives on [`crate::store::TokenStore::complete_handshake`], the one
//! single-writer moment allowed to seed the cache without holding the refresh lock.

// crates.io
use rand::RngCore;
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, provider::BadgrProvider};

/// Consent URL plus the state token the caller must hold for the redirect leg.
#[derive(Clone, Debug)]
pub struct AuthorizationRequest {
	/// Fully parameterized consent-page URL.
	pub url: Url,
	/// Anti-forgery state token echoed back on the redirect.
	pub state: String,
}

/// Builds the consent-page request for the provider.
pub fn authorization_request(provider: &BadgrProvider, redirect_uri: &Url) -> AuthorizationRequest {
	let state = anti_forgery_state();
	let mut url = provider.authorization.clone();

	url.query_pairs_mut()
		.append_pair("client_id", &provider.client_id)
		.append_pair("response_type", "code")
		.append_pair("scope", &provider.scope)
		.append_pair("state", &state)
		.append_pair("redirect_uri", redirect_uri.as_str());

	AuthorizationRequest { url, state }
}

/// Checks the state echoed on the redirect leg against the stored one.
pub fn state_matches(expected: &str, presented: &str) -> bool {
	!expected.is_empty() && expected == presented
}

fn anti_forgery_state() -> String {
	use std::fmt::Write;

	let mut entropy = [0_u8; 64];

	rand::rng().fill_bytes(&mut entropy);

	let digest = Sha256::digest(entropy);
	let mut state = String::with_capacity(digest.len() * 2);

	for byte in digest {
		// Writing into a String cannot fail.
		let _ = write!(state, "{byte:02x}");
	}

	state
}
