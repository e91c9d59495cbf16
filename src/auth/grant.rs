//! Validated token endpoint grants.

// self
use crate::{_prelude::*, auth::TokenSecret, error::ProtocolError};

/// Token pair minted by the OAuth token endpoint, validated at construction.
///
/// A grant always carries a non-empty refresh token: the issuer omitting one (or returning an
/// explicitly empty one) is a contract violation the connector refuses to proceed past, since a
/// stored pair without a refresh token would strand the integration once the access token lapses.
#[derive(Clone)]
pub struct TokenGrant {
	/// Short-lived credential attached to badge API calls.
	pub access_token: TokenSecret,
	/// Long-lived credential used to mint replacement access tokens.
	pub refresh_token: TokenSecret,
	/// Relative lifetime reported by the token endpoint, if any.
	pub expires_in: Option<Duration>,
	/// Scope string echoed by the token endpoint, if any.
	pub scope: Option<String>,
}
impl TokenGrant {
	/// Validates the raw token endpoint fields into a grant.
	pub fn from_parts(
		access_token: Option<String>,
		refresh_token: Option<String>,
		expires_in: Option<Duration>,
		scope: Option<String>,
	) -> Result<Self, ProtocolError> {
		let access_token = match access_token {
			Some(token) if !token.is_empty() => TokenSecret::new(token),
			_ => return Err(ProtocolError::AccessTokenMissing),
		};
		let refresh_token = match refresh_token {
			None => return Err(ProtocolError::RefreshTokenMissing),
			Some(token) if token.is_empty() => return Err(ProtocolError::RefreshTokenEmpty),
			Some(token) => TokenSecret::new(token),
		};

		Ok(Self { access_token, refresh_token, expires_in, scope })
	}
}
impl Debug for TokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGrant")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("expires_in", &self.expires_in)
			.field("scope", &self.scope)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn valid_parts_build_a_grant() {
		let grant = TokenGrant::from_parts(
			Some("access".into()),
			Some("refresh".into()),
			Some(Duration::seconds(86_400)),
			Some("rw:issuer r:backpack".into()),
		)
		.expect("Complete token response should validate.");

		assert_eq!(grant.access_token.expose(), "access");
		assert_eq!(grant.refresh_token.expose(), "refresh");
	}

	#[test]
	fn missing_access_token_is_a_protocol_violation() {
		let err = TokenGrant::from_parts(None, Some("refresh".into()), None, None)
			.expect_err("Missing access token must not validate.");

		assert_eq!(err, ProtocolError::AccessTokenMissing);

		let err = TokenGrant::from_parts(Some(String::new()), Some("refresh".into()), None, None)
			.expect_err("Empty access token must not validate.");

		assert_eq!(err, ProtocolError::AccessTokenMissing);
	}

	#[test]
	fn refresh_token_must_be_present_and_non_empty() {
		let err = TokenGrant::from_parts(Some("access".into()), None, None, None)
			.expect_err("Missing refresh token must not validate.");

		assert_eq!(err, ProtocolError::RefreshTokenMissing);

		let err = TokenGrant::from_parts(Some("access".into()), Some(String::new()), None, None)
			.expect_err("Empty refresh token must not validate.");

		assert_eq!(err, ProtocolError::RefreshTokenEmpty);
	}

	#[test]
	fn debug_output_redacts_both_secrets() {
		let grant = TokenGrant::from_parts(
			Some("access-value".into()),
			Some("refresh-value".into()),
			None,
			None,
		)
		.expect("Grant fixture should validate.");
		let rendered = format!("{grant:?}");

		assert!(!rendered.contains("access-value"));
		assert!(!rendered.contains("refresh-value"));
	}
}
