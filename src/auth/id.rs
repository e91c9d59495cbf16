//! Strongly typed identifiers scoping token custody to one site and integration.

// std
use std::borrow::Borrow;
// self
use crate::_prelude::*;

const SITE_ID_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("Site identifier cannot be empty.")]
	Empty,
	/// The identifier contains whitespace characters.
	#[error("Site identifier contains whitespace.")]
	ContainsWhitespace,
	/// The identifier exceeded the allowed character count.
	#[error("Site identifier exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Deployment-site identifier (typically the site's host name).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SiteId(String);
impl SiteId {
	/// Creates a new identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}
}
impl AsRef<str> for SiteId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for SiteId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<SiteId> for String {
	fn from(value: SiteId) -> Self {
		value.0
	}
}
impl TryFrom<String> for SiteId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl Debug for SiteId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Site({})", self.0)
	}
}
impl Display for SiteId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for SiteId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_view(view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace);
	}
	if view.len() > SITE_ID_MAX_LEN {
		return Err(IdentifierError::TooLong { max: SITE_ID_MAX_LEN });
	}

	Ok(())
}

/// Local integer id of one integration instance within its site.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntegrationId(i64);
impl IntegrationId {
	/// Wraps the site-local integer id.
	pub fn new(value: i64) -> Self {
		Self(value)
	}

	/// Returns the raw integer value.
	pub fn value(self) -> i64 {
		self.0
	}
}
impl Display for IntegrationId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}", self.0)
	}
}

/// Explicit site scope passed into every store and client operation.
///
/// No ambient "current site" lookup exists; the pair travels with the caller so two sites can
/// never observe each other's tokens.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteContext {
	/// Deployment site the tokens belong to.
	pub site: SiteId,
	/// Integration instance within that site.
	pub integration: IntegrationId,
}
impl SiteContext {
	/// Creates a context for the provided site and integration instance.
	pub fn new(site: SiteId, integration: IntegrationId) -> Self {
		Self { site, integration }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn site_ids_validate_shape() {
		assert!(SiteId::new("").is_err());
		assert!(SiteId::new("with space").is_err());
		assert!(SiteId::new(" leading").is_err());

		let site = SiteId::new("alpha.example.edu").expect("Site fixture should be valid.");

		assert_eq!(site.as_ref(), "alpha.example.edu");
	}

	#[test]
	fn site_id_length_limit_is_enforced() {
		let exact = "a".repeat(SITE_ID_MAX_LEN);

		SiteId::new(&exact).expect("Exact length should succeed.");

		let too_long = "a".repeat(SITE_ID_MAX_LEN + 1);

		assert!(SiteId::new(&too_long).is_err());
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let site: SiteId = serde_json::from_str("\"beta.example.edu\"")
			.expect("Site should deserialize successfully.");

		assert_eq!(site.as_ref(), "beta.example.edu");
		assert!(serde_json::from_str::<SiteId>("\"with space\"").is_err());
	}

	#[test]
	fn context_carries_both_halves() {
		let site = SiteId::new("gamma.example.edu").expect("Site fixture should be valid.");
		let context = SiteContext::new(site.clone(), IntegrationId::new(7));

		assert_eq!(context.site, site);
		assert_eq!(context.integration.value(), 7);
	}
}
