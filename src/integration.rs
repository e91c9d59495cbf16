//! Integration records, the per-site registry, and the organization-binding initializer.

// self
use crate::{
	_prelude::*,
	api::{BadgrClient, Credentials},
	auth::{SiteContext, SiteId},
	error::ConfigError,
	http::HttpTransport,
	model::Organization,
	provider::BadgrProvider,
	store::TokenStore,
};

/// Site-level record binding this platform to one remote badge-issuer account.
///
/// Created by an admin enable action, initialized by resolving its organization, and destroyed
/// on disconnect with no tombstone; a fresh enable starts over.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Integration {
	/// Site scope this integration belongs to.
	pub context: SiteContext,
	/// Human-readable title shown in the admin surface.
	pub title: String,
	/// Username of the admin who enabled the integration.
	pub created_by: Option<String>,
	/// Enablement instant.
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	/// Organization resolved at initialization time; org-scoped calls require it.
	pub organization: Option<Organization>,
}
impl Integration {
	/// Creates a fresh, unbound integration for the provided site scope.
	pub fn new(context: SiteContext) -> Self {
		Self {
			context,
			title: "Badge Issuer Integration".into(),
			created_by: None,
			created_at: OffsetDateTime::now_utc(),
			organization: None,
		}
	}

	/// Records the admin who enabled the integration.
	pub fn with_creator(mut self, username: impl Into<String>) -> Self {
		self.created_by = Some(username.into());

		self
	}

	/// Returns the bound organization id, if initialization resolved one.
	pub fn organization_id(&self) -> Option<&str> {
		self.organization.as_ref().map(|organization| organization.organization_id.as_str())
	}

	/// Returns `true` once an organization is bound.
	pub fn is_bound(&self) -> bool {
		self.organization.is_some()
	}

	/// Binds (or rebinds) the resolved organization.
	pub fn bind_organization(&mut self, organization: Organization) {
		self.organization = Some(organization);
	}
}

/// Per-site custody of the registered integration. One integration per site; registering
/// replaces any prior record, unregistering leaves nothing behind.
pub trait IntegrationRegistry
where
	Self: Send + Sync,
{
	/// Registers the integration for its site, replacing any prior registration.
	fn register(&self, integration: Integration);

	/// Removes and returns the site's integration, if one was registered.
	fn unregister(&self, site: &SiteId) -> Option<Integration>;

	/// Returns a copy of the site's integration, if one is registered.
	fn lookup(&self, site: &SiteId) -> Option<Integration>;
}

/// Thread-safe in-process registry for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryRegistry(Arc<RwLock<HashMap<SiteId, Integration>>>);
impl IntegrationRegistry for MemoryRegistry {
	fn register(&self, integration: Integration) {
		self.0.write().insert(integration.context.site.clone(), integration);
	}

	fn unregister(&self, site: &SiteId) -> Option<Integration> {
		self.0.write().remove(site)
	}

	fn lookup(&self, site: &SiteId) -> Option<Integration> {
		self.0.read().get(site).cloned()
	}
}

/// Result of the organization-binding initialization protocol.
#[derive(Clone, Debug, PartialEq)]
pub enum InitializationOutcome {
	/// Exactly one organization was reachable; the integration is bound and registered.
	Bound(Integration),
	/// Zero or multiple organizations were reachable; the integration stays unbound and
	/// unregistered.
	Ambiguous {
		/// Number of candidate organizations observed on the last base that answered.
		candidates: usize,
	},
}

/// Runs the once-per-integration initialization protocol.
pub struct Initializer {
	registry: Arc<dyn IntegrationRegistry>,
	transport: HttpTransport,
}
impl Initializer {
	/// Creates an initializer registering into `registry`.
	pub fn new(registry: Arc<dyn IntegrationRegistry>, transport: HttpTransport) -> Self {
		Self { registry, transport }
	}

	/// Resolves the integration's organization and registers it on success.
	///
	/// The provider's API bases are probed in order; the first base reachable with the stored
	/// token that reports exactly one organization wins. Bases answering with an authorization
	/// failure are skipped, and the last such failure propagates only if no base produced an
	/// organization listing at all. A listing of zero or multiple candidates leaves the
	/// integration unbound and unregistered without raising.
	pub async fn initialize(
		&self,
		integration: Integration,
		store: Arc<TokenStore>,
		provider: &BadgrProvider,
	) -> Result<InitializationOutcome> {
		let mut integration = integration;
		let mut last_auth_error = None;
		let mut ambiguous = None;

		for base in &provider.api_bases {
			let client = BadgrClient::new(
				base.clone(),
				Credentials::Bearer(store.clone()),
				self.transport.clone(),
			);

			match client.get_organizations().await {
				Ok(organizations) =>
					if organizations.len() == 1 {
						let organization = organizations
							.into_iter()
							.next()
							.ok_or(Error::MissingOrganization)?;

						integration.bind_organization(organization);
						self.registry.register(integration.clone());

						return Ok(InitializationOutcome::Bound(integration));
					} else {
						#[cfg(feature = "tracing")]
						tracing::warn!(
							base = %base,
							candidates = organizations.len(),
							"organization resolution is ambiguous",
						);

						ambiguous = Some(organizations.len());
					},
				Err(error @ Error::InvalidAuthorization { .. }) => {
					last_auth_error = Some(error);
				},
				Err(error) => return Err(error),
			}
		}

		match (ambiguous, last_auth_error) {
			(Some(candidates), _) => Ok(InitializationOutcome::Ambiguous { candidates }),
			(None, Some(error)) => Err(error),
			(None, None) => Err(ConfigError::MissingApiBase.into()),
		}
	}
}
impl Debug for Initializer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Initializer(..)")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::IntegrationId;

	fn context(site: &str, id: i64) -> SiteContext {
		SiteContext::new(
			SiteId::new(site).expect("Site fixture should be valid."),
			IntegrationId::new(id),
		)
	}

	fn organization(id: &str) -> Organization {
		Organization {
			organization_id: id.into(),
			name: None,
			photo_url: None,
			website_url: None,
			contact_email: None,
		}
	}

	#[test]
	fn registry_holds_one_integration_per_site() {
		let registry = MemoryRegistry::default();
		let site = SiteId::new("alpha.example.edu").expect("Site fixture should be valid.");
		let first = Integration::new(context("alpha.example.edu", 1));
		let mut second = Integration::new(context("alpha.example.edu", 2));

		second.bind_organization(organization("org-2"));
		registry.register(first);
		registry.register(second.clone());

		let current = registry.lookup(&site).expect("Replacement should be registered.");

		assert_eq!(current.context.integration, IntegrationId::new(2));
		assert_eq!(current.organization_id(), Some("org-2"));
	}

	#[test]
	fn unregister_leaves_no_tombstone() {
		let registry = MemoryRegistry::default();
		let site = SiteId::new("alpha.example.edu").expect("Site fixture should be valid.");

		registry.register(Integration::new(context("alpha.example.edu", 1)));

		assert!(registry.unregister(&site).is_some());
		assert!(registry.unregister(&site).is_none());
		assert!(registry.lookup(&site).is_none());
	}

	#[test]
	fn binding_state_is_observable() {
		let mut integration = Integration::new(context("alpha.example.edu", 1));

		assert!(!integration.is_bound());
		assert_eq!(integration.organization_id(), None);

		integration.bind_organization(organization("org-1"));

		assert!(integration.is_bound());
		assert_eq!(integration.organization_id(), Some("org-1"));
	}
}
