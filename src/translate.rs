//! Explicit per-entity translators from raw badge API JSON to domain objects.
//!
//! The caller picks the function for the entity kind it requested; there is no registry or
//! type-driven dispatch layer. Every function is pure (translating the same
//! payload twice yields identical results) and applies the wire renames in one place: an
//! optional top-level `data` wrapper is unwrapped, remote `id` becomes
//! `organization_id`/`template_id`, remote `url` becomes `badge_url`, the template's `owner`
//! block flattens into `organization_id`/`organization_name`, and list envelopes split into
//! items plus [`PageMetadata`].

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	content::{self, EVIDENCE_MARKER},
	error::TranslateError,
	model::{AwardState, AwardedBadge, BadgeTemplate, ContentEvidence, Organization, Page, PageMetadata},
};

#[derive(Debug, Deserialize)]
struct RawOrganization {
	id: String,
	name: Option<String>,
	photo_url: Option<String>,
	website_url: Option<String>,
	contact_email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawOwner {
	id: Option<String>,
	name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawBadge {
	id: String,
	name: Option<String>,
	description: Option<String>,
	state: Option<String>,
	visibility: Option<String>,
	#[serde(default)]
	public: bool,
	badges_count: Option<u32>,
	allow_duplicate_badges: Option<bool>,
	image_url: Option<String>,
	url: Option<String>,
	owner: Option<RawOwner>,
	#[serde(default, with = "time::serde::rfc3339::option")]
	created_at: Option<OffsetDateTime>,
	#[serde(default, with = "time::serde::rfc3339::option")]
	updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize)]
struct RawEvidence {
	name: Option<String>,
	id: Option<String>,
	title: Option<String>,
	description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAwardedBadge {
	badge_template: Value,
	state: Option<String>,
	recipient_email: String,
	#[serde(default)]
	public: bool,
	locale: Option<String>,
	image_url: Option<String>,
	badge_url: Option<String>,
	accept_badge_url: Option<String>,
	#[serde(default, with = "time::serde::rfc3339::option")]
	created_at: Option<OffsetDateTime>,
	#[serde(default, with = "time::serde::rfc3339::option")]
	updated_at: Option<OffsetDateTime>,
	#[serde(default)]
	evidence: Option<Vec<RawEvidence>>,
}

/// Decodes a raw response body into JSON.
pub fn decode_body(body: &[u8]) -> Result<Value, TranslateError> {
	serde_json::from_slice(body).map_err(|source| TranslateError::Syntax { source })
}

/// Translates an organization payload.
pub fn organization(payload: &Value) -> Result<Organization, TranslateError> {
	let raw: RawOrganization = typed("organization", unwrap_data(payload))?;

	Ok(Organization {
		organization_id: raw.id,
		name: raw.name,
		photo_url: raw.photo_url,
		website_url: raw.website_url,
		contact_email: raw.contact_email,
	})
}

/// Translates an organization list payload.
pub fn organization_collection(payload: &Value) -> Result<Vec<Organization>, TranslateError> {
	data_items("organization_collection", payload)?.iter().map(organization).collect()
}

/// Translates a badge template payload.
pub fn badge(payload: &Value) -> Result<BadgeTemplate, TranslateError> {
	let raw: RawBadge = typed("badge_template", unwrap_data(payload))?;
	let (organization_id, organization_name) = match raw.owner {
		Some(owner) => (owner.id, owner.name),
		None => (None, None),
	};

	Ok(BadgeTemplate {
		template_id: raw.id,
		organization_id,
		organization_name,
		name: raw.name,
		description: raw.description,
		state: raw.state,
		visibility: raw.visibility,
		public: raw.public,
		badges_count: raw.badges_count,
		allow_duplicate_badges: raw.allow_duplicate_badges,
		image_url: raw.image_url,
		badge_url: raw.url,
		created_at: raw.created_at,
		updated_at: raw.updated_at,
	})
}

/// Translates a badge template list payload into a page.
pub fn badge_collection(payload: &Value) -> Result<Page<BadgeTemplate>, TranslateError> {
	const ENTITY: &str = "badge_template_collection";

	let items = data_items(ENTITY, payload)?.iter().map(badge).collect::<Result<_, _>>()?;
	let metadata = page_metadata(ENTITY, payload)?;

	Ok(Page { items, metadata })
}

/// Translates an awarded badge payload.
///
/// Evidence entries survive only when their `name` equals [`EVIDENCE_MARKER`] and their `id`
/// is a syntactically valid platform content reference; foreign evidence is dropped.
pub fn awarded_badge(payload: &Value) -> Result<AwardedBadge, TranslateError> {
	let raw: RawAwardedBadge = typed("awarded_badge", unwrap_data(payload))?;
	let badge_template = badge(&raw.badge_template)?;
	let evidence = raw
		.evidence
		.unwrap_or_default()
		.into_iter()
		.filter_map(|entry| {
			let name = entry.name?;

			if name != EVIDENCE_MARKER {
				return None;
			}

			let content_ref = entry.id.filter(|id| content::is_valid_content_ref(id))?;

			Some(ContentEvidence {
				name,
				content_ref,
				title: entry.title,
				description: entry.description,
			})
		})
		.collect();

	Ok(AwardedBadge {
		badge_template,
		state: raw.state.as_deref().and_then(AwardState::parse),
		recipient_email: raw.recipient_email,
		public: raw.public,
		locale: raw.locale,
		image_url: raw.image_url,
		badge_url: raw.badge_url,
		accept_badge_url: raw.accept_badge_url,
		created_at: raw.created_at,
		updated_at: raw.updated_at,
		evidence,
		local_recipient: None,
	})
}

/// Translates an awarded badge list payload into a page.
pub fn awarded_badge_collection(payload: &Value) -> Result<Page<AwardedBadge>, TranslateError> {
	const ENTITY: &str = "awarded_badge_collection";

	let items = data_items(ENTITY, payload)?.iter().map(awarded_badge).collect::<Result<_, _>>()?;
	let metadata = page_metadata(ENTITY, payload)?;

	Ok(Page { items, metadata })
}

fn unwrap_data(payload: &Value) -> &Value {
	match payload.get("data") {
		Some(inner) if inner.is_object() => inner,
		_ => payload,
	}
}

fn data_items<'p>(
	entity: &'static str,
	payload: &'p Value,
) -> Result<&'p Vec<Value>, TranslateError> {
	payload
		.get("data")
		.and_then(Value::as_array)
		.ok_or(TranslateError::MissingField { entity, field: "data" })
}

fn page_metadata(entity: &'static str, payload: &Value) -> Result<PageMetadata, TranslateError> {
	let meta =
		payload.get("metadata").ok_or(TranslateError::MissingField { entity, field: "metadata" })?;

	typed(entity, meta)
}

fn typed<T>(entity: &'static str, value: &Value) -> Result<T, TranslateError>
where
	T: serde::de::DeserializeOwned,
{
	serde_path_to_error::deserialize(value.clone())
		.map_err(|source| TranslateError::Decode { entity, source })
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn badge_payload() -> Value {
		json!({
			"data": {
				"id": "823a5e0c",
				"name": "Badge Template 7",
				"description": "Dynamically deliver go forward e-tailers",
				"state": "active",
				"visibility": "public",
				"public": true,
				"badges_count": 0,
				"allow_duplicate_badges": true,
				"image_url": "https://cdn.example.com/path/to/image.png",
				"url": "https://issuer.example.com/org/org-5/badge/badge-template-7",
				"owner": {"id": "b4deef45", "name": "Organization 5"},
				"created_at": "2018-09-13T14:41:00Z",
				"updated_at": "2018-09-13T14:41:00Z"
			}
		})
	}

	#[test]
	fn badge_applies_wire_renames() {
		let badge = badge(&badge_payload()).expect("Badge payload should translate.");

		assert_eq!(badge.template_id, "823a5e0c");
		assert_eq!(badge.organization_id.as_deref(), Some("b4deef45"));
		assert_eq!(badge.organization_name.as_deref(), Some("Organization 5"));
		assert_eq!(
			badge.badge_url.as_deref(),
			Some("https://issuer.example.com/org/org-5/badge/badge-template-7"),
		);
		assert!(badge.public);
	}

	#[test]
	fn translation_is_idempotent() {
		let payload = badge_payload();
		let first = badge(&payload).expect("First translation should succeed.");
		let second = badge(&payload).expect("Second translation should succeed.");

		assert_eq!(first, second);
	}

	#[test]
	fn organization_unwraps_data_and_renames_id() {
		let payload = json!({"data": {"id": "ba92621f", "name": "Organization 8"}});
		let organization =
			organization(&payload).expect("Organization payload should translate.");

		assert_eq!(organization.organization_id, "ba92621f");
		assert_eq!(organization.name.as_deref(), Some("Organization 8"));
	}

	#[test]
	fn collection_envelope_splits_items_and_metadata() {
		let payload = json!({
			"data": [badge_payload()["data"], badge_payload()["data"]],
			"metadata": {"count": 2, "total_count": 2, "current_page": 1, "total_pages": 1}
		});
		let page = badge_collection(&payload).expect("Collection payload should translate.");

		assert_eq!(page.items.len(), 2);
		assert_eq!(page.metadata.count, 2);
		assert_eq!(page.metadata.total_count, Some(2));
		assert_eq!(page.metadata.current_page, 1);
		assert_eq!(page.metadata.total_pages, 1);
	}

	#[test]
	fn missing_envelope_pieces_are_reported_by_name() {
		let payload = json!({"data": []});
		let err = badge_collection(&payload)
			.expect_err("Missing metadata should fail translation.");

		assert!(matches!(err, TranslateError::MissingField { field: "metadata", .. }));
	}

	#[test]
	fn evidence_is_filtered_to_the_marker() {
		let payload = json!({
			"data": {
				"badge_template": badge_payload()["data"],
				"state": "accepted",
				"recipient_email": "user@example.com",
				"public": true,
				"locale": "en",
				"evidence": [
					{
						"name": EVIDENCE_MARKER,
						"id": "tag:example.edu,2024-01:courses-unit-12:completion",
						"title": "Unit 12"
					},
					{"name": "SomeoneElsesEvidence", "id": "https://example.com/foreign"},
					{"name": EVIDENCE_MARKER, "id": "not-a-content-ref"}
				]
			}
		});
		let award = awarded_badge(&payload).expect("Awarded badge payload should translate.");

		assert_eq!(award.evidence.len(), 1);
		assert_eq!(
			award.evidence[0].content_ref,
			"tag:example.edu,2024-01:courses-unit-12:completion",
		);
		assert_eq!(award.state, Some(AwardState::Accepted));
		assert!(award.local_recipient.is_none());
	}

	#[test]
	fn null_evidence_reads_as_empty() {
		let payload = json!({
			"badge_template": badge_payload()["data"],
			"recipient_email": "user@example.com",
			"evidence": null
		});
		let award = awarded_badge(&payload).expect("Awarded badge payload should translate.");

		assert!(award.evidence.is_empty());
	}

	#[test]
	fn unknown_award_states_read_as_absent() {
		let payload = json!({
			"badge_template": badge_payload()["data"],
			"recipient_email": "user@example.com",
			"state": "superseded"
		});
		let award = awarded_badge(&payload).expect("Awarded badge payload should translate.");

		assert_eq!(award.state, None);
	}
}
