use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use qbank_config::DeletePolicy;
use qbank_domain::grouping::Role;
use qbank_service::{DeleteRequest, Error, HistoryRequest, QbankService};
use qbank_storage::queries;

use super::ACTOR;

async fn group_with_two_variations(service: &QbankService) -> (Uuid, Uuid, Uuid) {
	let canonical = super::create(service, "What is a normal subgroup?").await;
	let older = super::create(service, "Define normal subgroup.").await;
	let newer = super::create(service, "When is a subgroup normal?").await;
	let base = OffsetDateTime::now_utc() - Duration::hours(1);

	super::set_rank_fields(service, older, 0, base).await;
	super::set_rank_fields(service, newer, 0, base + Duration::minutes(10)).await;
	super::link(service, older, canonical).await;
	super::link(service, newer, canonical).await;

	(canonical, older, newer)
}

async fn delete(service: &QbankService, question_id: Uuid) -> qbank_service::DeleteResponse {
	service
		.delete_question(DeleteRequest { question_id, actor: ACTOR.to_string() })
		.await
		.expect("delete_question failed.")
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set QBANK_PG_DSN to run."]
async fn deleting_a_canonical_dissolves_its_group() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping deleting_a_canonical_dissolves_its_group; set QBANK_PG_DSN to run.");

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string(), DeletePolicy::Dissolve);
	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let (canonical, older, newer) = group_with_two_variations(&service).await;
	let response = delete(&service, canonical).await;

	assert_eq!(response.policy, DeletePolicy::Dissolve);
	assert_eq!(response.role, Role::GroupCanonical);
	assert_eq!(response.affected_groups.len(), 2);

	for id in [older, newer] {
		let row = queries::get_question(&service.db.pool, id).await.expect("get_question failed.");

		assert!(row.is_canonical);
		assert_eq!(row.group_id, id);
		assert_eq!(row.canonical_id, None);
	}

	assert!(queries::find_question(&service.db.pool, canonical).await.expect("find").is_none());

	super::assert_consistent(&service).await;

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set QBANK_PG_DSN to run."]
async fn deleting_a_canonical_promotes_the_oldest_variation() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping deleting_a_canonical_promotes_the_oldest_variation; set QBANK_PG_DSN to run."
		);

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string(), DeletePolicy::PromoteOldest);
	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let (canonical, older, newer) = group_with_two_variations(&service).await;
	let response = delete(&service, canonical).await;

	assert_eq!(response.role, Role::GroupCanonical);
	assert_eq!(response.affected_groups, vec![older]);

	let heir = queries::get_question(&service.db.pool, older).await.expect("get_question failed.");
	let follower =
		queries::get_question(&service.db.pool, newer).await.expect("get_question failed.");

	assert!(heir.is_canonical);
	assert_eq!(heir.group_id, older);
	assert!(!follower.is_canonical);
	assert_eq!(follower.group_id, older);
	assert_eq!(follower.canonical_id, Some(older));

	let history = service
		.question_history(HistoryRequest { question_id: canonical })
		.await
		.expect("History of a deleted question must remain readable.");

	assert_eq!(history.events.last().map(|event| event.op.as_str()), Some("DELETE"));

	super::assert_consistent(&service).await;

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set QBANK_PG_DSN to run."]
async fn deleting_a_variation_or_singleton_touches_no_other_row() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping deleting_a_variation_or_singleton_touches_no_other_row; set QBANK_PG_DSN to run."
		);

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string(), DeletePolicy::Dissolve);
	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let (canonical, older, newer) = group_with_two_variations(&service).await;
	let singleton = super::create(&service, "Define a field extension.").await;
	let response = delete(&service, older).await;

	assert_eq!(response.role, Role::Variation);
	assert_eq!(response.affected_groups, vec![canonical]);

	let sibling =
		queries::get_question(&service.db.pool, newer).await.expect("get_question failed.");

	assert_eq!(sibling.canonical_id, Some(canonical));

	let response = delete(&service, singleton).await;

	assert_eq!(response.role, Role::SingletonCanonical);
	assert!(response.affected_groups.is_empty());

	let missing = service
		.delete_question(DeleteRequest { question_id: singleton, actor: ACTOR.to_string() })
		.await;

	assert!(matches!(missing, Err(Error::NotFound { .. })));

	super::assert_consistent(&service).await;

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
