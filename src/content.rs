//! Platform content references and the evidence marker tying awards back to local content.

// self
use crate::{_prelude::*, error::ConfigError};

/// Evidence `name` marking entries this connector itself attached to an award.
///
/// Ingestion keeps an evidence entry only when its `name` equals this exact string; everything
/// else was attached by someone else and is dropped.
pub const EVIDENCE_MARKER: &str = "ContentEvidenceRef";

/// Wire `type` value for identifier-based evidence records.
pub const EVIDENCE_TYPE: &str = "IdEvidence";

/// Syntactically validated platform-internal content reference.
///
/// References use the tag-URI shape `tag:<authority>,<date>:<specific-parts>` the platform mints
/// for addressable content.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentRef(String);
impl ContentRef {
	/// Validates and wraps a reference string.
	pub fn new(value: impl Into<String>) -> Result<Self, ConfigError> {
		let value = value.into();

		if !is_valid_content_ref(&value) {
			return Err(ConfigError::InvalidContentRef { value });
		}

		Ok(Self(value))
	}

	/// Returns the reference string.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Renders the marker-tagged evidence id sent to the issuer (`<marker>=<reference>`).
	pub fn evidence_id(&self) -> String {
		format!("{EVIDENCE_MARKER}={}", self.0)
	}
}
impl AsRef<str> for ContentRef {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<ContentRef> for String {
	fn from(value: ContentRef) -> Self {
		value.0
	}
}
impl TryFrom<String> for ContentRef {
	type Error = ConfigError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl Debug for ContentRef {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "ContentRef({})", self.0)
	}
}
impl Display for ContentRef {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for ContentRef {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

/// Checks whether `value` has the platform content-reference shape.
pub fn is_valid_content_ref(value: &str) -> bool {
	if value.chars().any(char::is_whitespace) {
		return false;
	}

	let Some(rest) = value.strip_prefix("tag:") else {
		return false;
	};
	let Some((authority, specific)) = rest.split_once(':') else {
		return false;
	};
	let Some((host, date)) = authority.split_once(',') else {
		return false;
	};

	!host.is_empty() && !date.is_empty() && !specific.is_empty()
}
