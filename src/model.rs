//! Typed domain objects produced by the badge API translators.

// self
use crate::_prelude::*;

/// Local user projection carried into award and listing calls.
///
/// The host platform resolves its user object down to this triple: the opaque numeric identifier
/// reported to the issuer as the earner id, the email address the issuer keys awards by, and an
/// optional display name used to populate the awardee's first/last name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
	/// Opaque numeric identifier local to the platform.
	pub id: i64,
	/// Email address awards are keyed by remotely.
	pub email: String,
	/// Optional display name; ignored when it looks like an email address.
	pub display_name: Option<String>,
}
impl Recipient {
	/// Creates a recipient with no display name.
	pub fn new(id: i64, email: impl Into<String>) -> Self {
		Self { id, email: email.into(), display_name: None }
	}

	/// Attaches a display name.
	pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
		self.display_name = Some(name.into());

		self
	}
}

/// Remote organization/issuer owning badge templates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
	/// Remote organization identifier.
	pub organization_id: String,
	/// Display name.
	pub name: Option<String>,
	/// Logo image URL.
	pub photo_url: Option<String>,
	/// Public website URL.
	pub website_url: Option<String>,
	/// Contact email address.
	pub contact_email: Option<String>,
}

/// Reusable badge design owned by an organization. Immutable snapshot per fetch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BadgeTemplate {
	/// Remote template identifier.
	pub template_id: String,
	/// Owning organization id, when the payload carries one.
	pub organization_id: Option<String>,
	/// Owning organization name, when the payload carries one.
	pub organization_name: Option<String>,
	/// Template name.
	pub name: Option<String>,
	/// Template description.
	pub description: Option<String>,
	/// Remote lifecycle state (e.g. `active`, `archived`).
	pub state: Option<String>,
	/// Remote visibility label.
	pub visibility: Option<String>,
	/// Whether the template is publicly visible.
	#[serde(default)]
	pub public: bool,
	/// Number of awards issued from this template.
	pub badges_count: Option<u32>,
	/// Whether a user may earn this badge more than once.
	pub allow_duplicate_badges: Option<bool>,
	/// Badge image URL.
	pub image_url: Option<String>,
	/// Canonical template page URL.
	pub badge_url: Option<String>,
	/// Remote creation instant.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub created_at: Option<OffsetDateTime>,
	/// Remote last-modified instant.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub updated_at: Option<OffsetDateTime>,
}

/// Remote lifecycle state of an awarded badge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AwardState {
	/// Issued but not yet accepted by the recipient.
	Pending,
	/// Accepted by the recipient.
	Accepted,
	/// Revoked by the issuer.
	Revoked,
	/// Rejected by the recipient.
	Rejected,
}
impl AwardState {
	/// Parses a wire label, reading unknown labels as absent rather than failing the payload.
	pub fn parse(label: &str) -> Option<Self> {
		match label {
			"pending" => Some(AwardState::Pending),
			"accepted" => Some(AwardState::Accepted),
			"revoked" => Some(AwardState::Revoked),
			"rejected" => Some(AwardState::Rejected),
			_ => None,
		}
	}

	/// Returns the wire label for this state.
	pub const fn as_str(self) -> &'static str {
		match self {
			AwardState::Pending => "pending",
			AwardState::Accepted => "accepted",
			AwardState::Revoked => "revoked",
			AwardState::Rejected => "rejected",
		}
	}
}
impl Display for AwardState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Evidence entry referencing platform-local content, kept only when it carries this
/// connector's own marker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEvidence {
	/// Evidence name; always equals [`crate::content::EVIDENCE_MARKER`] after ingestion.
	pub name: String,
	/// Platform-internal content reference.
	pub content_ref: String,
	/// Evidence title, if supplied.
	pub title: Option<String>,
	/// Evidence description, if supplied.
	pub description: Option<String>,
}

/// A badge template instance issued to a specific user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AwardedBadge {
	/// Template this award was minted from.
	pub badge_template: BadgeTemplate,
	/// Remote award state.
	pub state: Option<AwardState>,
	/// Recipient email address recorded remotely.
	pub recipient_email: String,
	/// Whether the award is publicly visible.
	#[serde(default)]
	pub public: bool,
	/// Recipient locale recorded at award time.
	pub locale: Option<String>,
	/// Badge image URL.
	pub image_url: Option<String>,
	/// Canonical award page URL (present once accepted).
	pub badge_url: Option<String>,
	/// Acceptance URL (present while pending).
	pub accept_badge_url: Option<String>,
	/// Remote creation instant.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub created_at: Option<OffsetDateTime>,
	/// Remote last-modified instant.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub updated_at: Option<OffsetDateTime>,
	/// Evidence entries carrying this connector's marker; foreign evidence is dropped.
	#[serde(default)]
	pub evidence: Vec<ContentEvidence>,
	/// Local recipient this listing was resolved for. Never sent remotely.
	#[serde(skip)]
	pub local_recipient: Option<Recipient>,
}

/// Pagination envelope attached to every list result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
	/// Number of items on this page.
	pub count: u32,
	/// Total item count across pages, when reported.
	pub total_count: Option<u32>,
	/// Current page number (1-based).
	pub current_page: u32,
	/// Total page count.
	pub total_pages: u32,
}

/// One page of list results plus its pagination envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
	/// Items on this page.
	pub items: Vec<T>,
	/// Pagination envelope.
	pub metadata: PageMetadata,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn award_state_round_trips_wire_labels() {
		for (state, label) in [
			(AwardState::Pending, "\"pending\""),
			(AwardState::Accepted, "\"accepted\""),
			(AwardState::Revoked, "\"revoked\""),
			(AwardState::Rejected, "\"rejected\""),
		] {
			let rendered =
				serde_json::to_string(&state).expect("Award state should serialize to JSON.");

			assert_eq!(rendered, label);

			let parsed: AwardState =
				serde_json::from_str(label).expect("Wire label should deserialize.");

			assert_eq!(parsed, state);
		}
	}

	#[test]
	fn local_recipient_is_never_serialized() {
		let recipient = Recipient::new(7, "user@example.com");
		let badge = AwardedBadge {
			badge_template: BadgeTemplate {
				template_id: "t-1".into(),
				organization_id: None,
				organization_name: None,
				name: None,
				description: None,
				state: None,
				visibility: None,
				public: false,
				badges_count: None,
				allow_duplicate_badges: None,
				image_url: None,
				badge_url: None,
				created_at: None,
				updated_at: None,
			},
			state: Some(AwardState::Pending),
			recipient_email: "user@example.com".into(),
			public: false,
			locale: None,
			image_url: None,
			badge_url: None,
			accept_badge_url: None,
			created_at: None,
			updated_at: None,
			evidence: Vec::new(),
			local_recipient: Some(recipient),
		};
		let rendered =
			serde_json::to_string(&badge).expect("Awarded badge should serialize to JSON.");

		assert!(!rendered.contains("local_recipient"));
	}
}
