//! Unified badge API client.
//!
//! One [`BadgrClient`] serves both historical API generations: [`Credentials`] selects between
//! OAuth bearer tokens with transparent refresh and the legacy static Basic token, and the base
//! URL comes from the provider descriptor. Every operation runs the same call protocol: build
//! the request, attach authorization, send, refresh-and-retry once on 401/403, classify any
//! unaccepted status, translate the JSON body.

pub mod query;

pub use query::ListQuery;

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use reqwest::{
	Method,
	header::{ACCEPT, AUTHORIZATION},
};
use serde_json::{Value, json};
use time::{format_description::BorrowedFormatItem, macros::format_description};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	content::EVIDENCE_TYPE,
	error::{ApiFailure, TransportError},
	http::{ApiResponse, HttpTransport},
	model::{AwardedBadge, BadgeTemplate, Organization, Page, Recipient},
	obs::{self, OpKind, OpOutcome, OpSpan},
	store::TokenStore,
	translate,
};

const ORGANIZATIONS_PATH: &str = "/organizations";
const DEFAULT_ACCEPTED: &[u16] = &[200, 201];
/// Phrase the issuer embeds in its semantic-validation payload when the recipient already holds
/// a non-repeatable badge.
const DUPLICATE_AWARD_MARKER: &str = "already has this badge";
const ISSUED_AT_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
	"[year]-[month]-[day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute]"
);

fn organization_path(organization_id: &str) -> String {
	format!("/organizations/{organization_id}")
}

fn badge_templates_path(organization_id: &str) -> String {
	format!("/organizations/{organization_id}/badge_templates")
}

fn badge_template_path(organization_id: &str, template_id: &str) -> String {
	format!("/organizations/{organization_id}/badge_templates/{template_id}")
}

fn badges_path(organization_id: &str) -> String {
	format!("/organizations/{organization_id}/badges")
}

/// Auth-scheme strategy selecting between the two API generations.
#[derive(Clone, Debug)]
pub enum Credentials {
	/// OAuth bearer token, refreshed transparently through the [`TokenStore`].
	Bearer(Arc<TokenStore>),
	/// Legacy static authorization token, sent as HTTP Basic; a 401/403 is terminal.
	Basic(TokenSecret),
}

/// Optional award parameters beyond recipient and template.
#[derive(Clone, Debug, Default)]
pub struct AwardOptions {
	/// Suppress the issuer's award notification email.
	pub suppress_notification_email: bool,
	/// Recipient locale recorded on the award.
	pub locale: Option<String>,
	/// Evidence record linking the award back to platform content.
	pub evidence: Option<AwardEvidence>,
}

/// Evidence attached to an award, referencing platform-local content.
#[derive(Clone, Debug)]
pub struct AwardEvidence {
	/// Validated platform content reference.
	pub reference: crate::content::ContentRef,
	/// Evidence title.
	pub title: Option<String>,
	/// Evidence description.
	pub description: Option<String>,
}

#[derive(Clone, Debug)]
struct ApiRequest {
	method: Method,
	path: String,
	query: Vec<(String, String)>,
	body: Option<Value>,
}
impl ApiRequest {
	fn get(path: String) -> Self {
		Self { method: Method::GET, path, query: Vec::new(), body: None }
	}

	fn post(path: String, body: Value) -> Self {
		Self { method: Method::POST, path, query: Vec::new(), body: Some(body) }
	}

	fn with_query(mut self, query: Vec<(String, String)>) -> Self {
		self.query = query;

		self
	}
}

/// Client for one integration's badge operations.
///
/// The client is stateless across calls except for a read-through copy of the access token held
/// for its own lifetime; a refresh replaces that copy in place.
pub struct BadgrClient {
	transport: HttpTransport,
	base_url: Url,
	credentials: Credentials,
	organization_id: Option<String>,
	access_token_slot: Mutex<Option<String>>,
}
impl BadgrClient {
	/// Creates a client against the provided API base.
	pub fn new(base_url: Url, credentials: Credentials, transport: HttpTransport) -> Self {
		Self {
			transport,
			base_url,
			credentials,
			organization_id: None,
			access_token_slot: Mutex::new(None),
		}
	}

	/// Binds the client to an organization, enabling the org-scoped operations.
	pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
		self.organization_id = Some(organization_id.into());

		self
	}

	/// Returns the bound organization id, if any.
	pub fn organization_id(&self) -> Option<&str> {
		self.organization_id.as_deref()
	}

	// Local precondition: org-scoped calls never reach the network without a binding.
	fn require_organization(&self) -> Result<&str> {
		self.organization_id.as_deref().ok_or(Error::MissingOrganization)
	}

	/// Fetches one organization by id.
	pub async fn get_organization(&self, organization_id: &str) -> Result<Organization> {
		let payload = self.call(ApiRequest::get(organization_path(organization_id))).await?;

		Ok(translate::organization(&payload)?)
	}

	/// Fetches every organization reachable with the current credentials.
	pub async fn get_organizations(&self) -> Result<Vec<Organization>> {
		let payload = self.call(ApiRequest::get(ORGANIZATIONS_PATH.into())).await?;

		Ok(translate::organization_collection(&payload)?)
	}

	/// Fetches one badge template by id.
	pub async fn get_badge(&self, template_id: &str) -> Result<BadgeTemplate> {
		let organization_id = self.require_organization()?;
		let payload =
			self.call(ApiRequest::get(badge_template_path(organization_id, template_id))).await?;

		Ok(translate::badge(&payload)?)
	}

	/// Lists badge templates. Always restricted to active templates server-side; callers cannot
	/// reach archived templates through this path.
	pub async fn get_badges(&self, query: ListQuery) -> Result<Page<BadgeTemplate>> {
		let organization_id = self.require_organization()?;
		let mut query = query;

		query.force_filter("state", "active");

		let mut params = Vec::new();

		query.append_to(&mut params);

		let payload = self
			.call(ApiRequest::get(badge_templates_path(organization_id)).with_query(params))
			.await?;

		Ok(translate::badge_collection(&payload)?)
	}

	/// Lists badges awarded to `recipient`, filtered server-side by the recipient's email.
	///
	/// The state filter is always forced: `accepted` alone when `accepted_only`, otherwise
	/// `pending,accepted`, so revoked and rejected awards are unreachable through this path.
	/// Every returned badge is stamped with the requesting local recipient.
	pub async fn get_awarded_badges(
		&self,
		recipient: &Recipient,
		query: ListQuery,
		public_only: bool,
		accepted_only: bool,
	) -> Result<Page<AwardedBadge>> {
		let organization_id = self.require_organization()?;
		let mut query = query;

		// All of the recipient's issuer-side email addresses count, not just the primary.
		query.force_filter("recipient_email_all", recipient.email.clone());

		if public_only {
			query.force_filter("public", "true");
		}
		if accepted_only {
			query.force_filter("state", "accepted");
		} else {
			query.force_filter("state", "pending,accepted");
		}

		let mut params = Vec::new();

		query.append_to(&mut params);

		let payload =
			self.call(ApiRequest::get(badges_path(organization_id)).with_query(params)).await?;
		let mut page = translate::awarded_badge_collection(&payload)?;

		for award in &mut page.items {
			award.local_recipient = Some(recipient.clone());
		}

		Ok(page)
	}

	/// Awards a badge template to `recipient`.
	pub async fn award_badge(
		&self,
		recipient: &Recipient,
		template_id: &str,
		options: AwardOptions,
	) -> Result<AwardedBadge> {
		let organization_id = self.require_organization()?;
		let body = award_body(recipient, template_id, &options);
		let payload = self.call(ApiRequest::post(badges_path(organization_id), body)).await?;

		Ok(translate::awarded_badge(&payload)?)
	}

	async fn call(&self, request: ApiRequest) -> Result<Value> {
		self.call_with(request, DEFAULT_ACCEPTED).await
	}

	async fn call_with(&self, request: ApiRequest, accepted: &[u16]) -> Result<Value> {
		const KIND: OpKind = OpKind::BadgeCall;

		let span = OpSpan::new(KIND, "call");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let url = self.endpoint(&request);

				#[cfg(feature = "tracing")]
				tracing::debug!(%url, method = %request.method, "badge API call");

				let mut response = self.dispatch(&request, &url).await?;

				if matches!(response.status, 401 | 403) && self.refresh_authorization().await? {
					// Expired access token; retry exactly once with the rotated credential.
					response = self.dispatch(&request, &url).await?;
				}
				if !accepted.contains(&response.status) {
					return Err(self.classify_failure(&url, &response));
				}

				Ok(translate::decode_body(&response.body)?)
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	fn endpoint(&self, request: &ApiRequest) -> Url {
		let mut url = self.base_url.clone();
		let path = format!("{}{}", url.path().trim_end_matches('/'), request.path);

		url.set_path(&path);

		if !request.query.is_empty() {
			let mut pairs = url.query_pairs_mut();

			for (key, value) in &request.query {
				pairs.append_pair(key, value);
			}
		}

		url
	}

	async fn dispatch(&self, request: &ApiRequest, url: &Url) -> Result<ApiResponse> {
		let authorization = self.authorization_header().await?;
		let mut builder = self
			.transport
			.request(request.method.clone(), url.clone())
			.header(AUTHORIZATION, authorization)
			.header(ACCEPT, "application/json");

		if let Some(body) = &request.body {
			builder = builder.json(body);
		}

		let prepared = builder.build().map_err(TransportError::from)?;

		Ok(self.transport.send_api(prepared).await?)
	}

	async fn authorization_header(&self) -> Result<String> {
		match &self.credentials {
			Credentials::Bearer(store) => {
				if let Some(token) = self.access_token_slot.lock().clone() {
					return Ok(format!("Bearer {token}"));
				}

				let token = store.access_token().await?;
				let header = format!("Bearer {token}");

				*self.access_token_slot.lock() = Some(token);

				Ok(header)
			},
			Credentials::Basic(token) =>
				Ok(format!("Basic {}", BASE64_STANDARD.encode(format!("{}:", token.expose())))),
		}
	}

	/// Rotates the bearer credential; returns `false` when the scheme has nothing to rotate.
	async fn refresh_authorization(&self) -> Result<bool> {
		match &self.credentials {
			Credentials::Bearer(store) => {
				let stale = self.access_token_slot.lock().clone();
				let fresh = store.refresh(stale.as_deref()).await?;

				*self.access_token_slot.lock() = Some(fresh);

				Ok(true)
			},
			Credentials::Basic(_) => Ok(false),
		}
	}

	fn classify_failure(&self, url: &Url, response: &ApiResponse) -> Error {
		if response.status == 422
			&& let Some(message) = duplicate_award_message(&response.body)
		{
			return Error::DuplicateAward { message };
		}

		let body = response.body_text();

		#[cfg(feature = "tracing")]
		tracing::warn!(%url, status = response.status, body = %body, "badge API call failed");
		#[cfg(not(feature = "tracing"))]
		let _ = url;

		if response.status == 401 {
			return Error::invalid_authorization(body);
		}

		Error::Api(ApiFailure { status: response.status, body })
	}
}
impl Debug for BadgrClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BadgrClient")
			.field("base_url", &self.base_url.as_str())
			.field("organization_id", &self.organization_id)
			.finish()
	}
}

fn duplicate_award_message(body: &[u8]) -> Option<String> {
	let value: Value = serde_json::from_slice(body).ok()?;
	let message = value.get("data")?.get("message")?.as_str()?;

	message.contains(DUPLICATE_AWARD_MARKER).then(|| message.to_owned())
}

fn award_body(recipient: &Recipient, template_id: &str, options: &AwardOptions) -> Value {
	let mut body = serde_json::Map::new();

	// The recipient's email is recorded regardless of its validity on the issuer side.
	body.insert("recipient_email".into(), json!(&recipient.email));

	// An email posing as a display name would leak into the awardee's printed name.
	if let Some(name) = recipient.display_name.as_deref()
		&& !name.trim().is_empty()
		&& !name.contains('@')
	{
		let (first, last) = split_display_name(name);

		body.insert("issued_to_first_name".into(), json!(first));
		body.insert("issued_to_last_name".into(), json!(last));
	}

	body.insert("badge_template_id".into(), json!(template_id));
	body.insert("issuer_earner_id".into(), json!(recipient.id));
	body.insert("issued_at".into(), json!(format_issued_at(OffsetDateTime::now_utc())));
	body.insert(
		"suppress_badge_notification_email".into(),
		json!(options.suppress_notification_email),
	);

	if let Some(locale) = &options.locale {
		body.insert("locale".into(), json!(locale));
	}
	if let Some(evidence) = &options.evidence {
		body.insert(
			"evidence".into(),
			json!([{
				"type": EVIDENCE_TYPE,
				"title": &evidence.title,
				"description": &evidence.description,
				"id": evidence.reference.evidence_id(),
			}]),
		);
	}

	Value::Object(body)
}

fn split_display_name(name: &str) -> (String, String) {
	let mut tokens = name.split_whitespace();
	let first = tokens.next().unwrap_or_default().to_owned();
	let last = tokens.next_back().unwrap_or_default().to_owned();

	(first, last)
}

fn format_issued_at(at: OffsetDateTime) -> String {
	at.format(ISSUED_AT_FORMAT).unwrap_or_else(|_| at.to_string())
}
