// crates.io
use httpmock::prelude::*;
// self
use badgr_connect::{
	_preludet::*,
	api::{AwardEvidence, AwardOptions},
	content::ContentRef,
	model::{AwardState, Recipient},
};

const ORG: &str = "org-1";

fn awarded_body() -> &'static str {
	r#"{
		"data": {
			"badge_template": {
				"id": "t-1",
				"name": "Badge Template 7",
				"url": "https://issuer.example.com/badge/t-1"
			},
			"state": "pending",
			"recipient_email": "user@example.com",
			"public": false,
			"locale": "en",
			"accept_badge_url": "https://issuer.example.com/accept/abc",
			"evidence": [{
				"name": "ContentEvidenceRef",
				"id": "tag:example.edu,2024-01:courses-unit-12:completion",
				"title": "Unit 12"
			}]
		}
	}"#
}

async fn seeded_client(server: &MockServer) -> badgr_connect::api::BadgrClient {
	let provider = test_provider(&server.base_url());
	let store = build_test_store(&provider, memory_cache());

	seed_tokens(&store, "live-access", "seed-refresh").await;

	build_test_client(&provider, store, Some(ORG))
}

#[tokio::test]
async fn awarding_posts_the_payload_and_translates_the_result() {
	let server = MockServer::start_async().await;
	let client = seeded_client(&server).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(format!("/organizations/{ORG}/badges"))
				.header("authorization", "Bearer live-access")
				.header("content-type", "application/json")
				.body_includes("\"recipient_email\":\"user@example.com\"")
				.body_includes("\"badge_template_id\":\"t-1\"")
				.body_includes("\"issuer_earner_id\":12")
				.body_includes("\"issued_to_first_name\":\"Ada\"")
				.body_includes("\"issued_to_last_name\":\"Lovelace\"")
				.body_includes(
					"\"id\":\"ContentEvidenceRef=tag:example.edu,2024-01:courses-unit-12:completion\"",
				);
			then.status(201)
				.header("content-type", "application/json")
				.body(awarded_body());
		})
		.await;
	let recipient = Recipient::new(12, "user@example.com").with_display_name("Ada Lovelace");
	let reference = ContentRef::new("tag:example.edu,2024-01:courses-unit-12:completion")
		.expect("Reference fixture should validate.");
	let options = AwardOptions {
		suppress_notification_email: false,
		locale: Some("en".into()),
		evidence: Some(AwardEvidence {
			reference,
			title: Some("Unit 12".into()),
			description: None,
		}),
	};
	let award = client
		.award_badge(&recipient, "t-1", options)
		.await
		.expect("Awarding against a healthy endpoint should succeed.");

	mock.assert_async().await;

	assert_eq!(award.state, Some(AwardState::Pending));
	assert_eq!(award.recipient_email, "user@example.com");
	assert_eq!(award.badge_template.template_id, "t-1");
	assert_eq!(award.evidence.len(), 1);
	assert_eq!(
		award.accept_badge_url.as_deref(),
		Some("https://issuer.example.com/accept/abc"),
	);
}

#[tokio::test]
async fn duplicate_awards_are_distinguished_from_generic_validation_errors() {
	let server = MockServer::start_async().await;
	let client = seeded_client(&server).await;
	let duplicate_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(format!("/organizations/{ORG}/badges"));
			then.status(422)
				.header("content-type", "application/json")
				.body("{\"data\":{\"message\":\"User already has this badge issued.\"}}");
		})
		.await;
	let recipient = Recipient::new(12, "user@example.com");
	let error = client
		.award_badge(&recipient, "t-1", AwardOptions::default())
		.await
		.expect_err("A duplicate award must fail.");

	assert!(matches!(error, Error::DuplicateAward { .. }));
	assert!(error.to_string().contains("already has this badge"));

	duplicate_mock.delete_async().await;

	let other_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(format!("/organizations/{ORG}/badges"));
			then.status(422)
				.header("content-type", "application/json")
				.body("{\"data\":{\"message\":\"Template is archived.\"}}");
		})
		.await;
	let error = client
		.award_badge(&recipient, "t-1", AwardOptions::default())
		.await
		.expect_err("Any other validation error must fail generically.");

	other_mock.assert_async().await;

	match error {
		Error::Api(failure) => assert_eq!(failure.status, 422),
		other => panic!("Expected Error::Api, got {other:?}"),
	}
}

#[tokio::test]
async fn awarding_requires_an_organization_binding() {
	let server = MockServer::start_async().await;
	let provider = test_provider(&server.base_url());
	let store = build_test_store(&provider, memory_cache());
	let client = build_test_client(&provider, store, None);
	let recipient = Recipient::new(12, "user@example.com");
	let error = client
		.award_badge(&recipient, "t-1", AwardOptions::default())
		.await
		.expect_err("An unbound client must refuse to award.");

	assert!(matches!(error, Error::MissingOrganization));
}
