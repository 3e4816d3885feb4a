use uuid::Uuid;

use qbank_config::DeletePolicy;
use qbank_service::{
	Error, HistoryRequest, LinkOutcome, LinkRequest, QuestionRequest, UnlinkRequest,
};
use qbank_storage::queries;

use super::ACTOR;

#[tokio::test]
#[ignore = "Requires external Postgres. Set QBANK_PG_DSN to run."]
async fn created_question_is_a_singleton_canonical() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping created_question_is_a_singleton_canonical; set QBANK_PG_DSN to run.");

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string(), DeletePolicy::Dissolve);
	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let id = super::create(&service, "State the rank-nullity theorem.").await;
	let view = service.get_question(QuestionRequest { question_id: id }).await.expect("get");

	assert_eq!(view.group_id, id);
	assert!(view.is_canonical);
	assert_eq!(view.canonical_id, None);
	assert_eq!(view.subject_label.as_deref(), Some("Algebra"));
	assert_eq!(view.submitted_by, ACTOR);

	let blank = service
		.create_question(qbank_service::CreateRequest {
			text: "   ".to_string(),
			actor: ACTOR.to_string(),
			exam_id: None,
			subject_label: None,
			professor_label: None,
		})
		.await;

	assert!(matches!(blank, Err(Error::InvalidRequest { .. })));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set QBANK_PG_DSN to run."]
async fn merge_moves_whole_group_onto_new_canonical() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping merge_moves_whole_group_onto_new_canonical; set QBANK_PG_DSN to run.");

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string(), DeletePolicy::Dissolve);
	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let a = super::create(&service, "What is an eigenvalue?").await;
	let b = super::create(&service, "Define eigenvalue of a matrix.").await;
	let c = super::create(&service, "Explain eigenvalues and eigenvectors.").await;

	super::link(&service, b, a).await;

	let response = service
		.link_question(LinkRequest { question_id: a, canonical_id: c, actor: ACTOR.to_string() })
		.await
		.expect("Merge failed.");

	assert_eq!(response.outcome, LinkOutcome::Linked);
	assert_eq!(response.repointed, vec![b]);
	assert_eq!(response.summary.canonical_id, c);
	assert_eq!(response.summary.total_questions, 3);

	for id in [a, b] {
		let row = queries::get_question(&service.db.pool, id).await.expect("get_question failed.");

		assert_eq!(row.group_id, c);
		assert!(!row.is_canonical);
		assert_eq!(row.canonical_id, Some(c));
	}

	let canonical = queries::get_question(&service.db.pool, c).await.expect("get_question failed.");

	assert!(canonical.is_canonical);
	assert_eq!(canonical.group_id, c);
	assert_eq!(canonical.canonical_id, None);

	let history = service
		.question_history(HistoryRequest { question_id: b })
		.await
		.expect("question_history failed.");
	let ops = history.events.iter().map(|event| event.op.as_str()).collect::<Vec<_>>();

	assert_eq!(ops, vec!["CREATE", "LINK", "REPOINT"]);

	super::assert_consistent(&service).await;

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set QBANK_PG_DSN to run."]
async fn relinking_within_the_same_group_is_a_no_op() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping relinking_within_the_same_group_is_a_no_op; set QBANK_PG_DSN to run.");

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string(), DeletePolicy::Dissolve);
	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let canonical = super::create(&service, "Prove that sqrt(2) is irrational.").await;
	let variation = super::create(&service, "Show sqrt 2 is not rational.").await;

	super::link(&service, variation, canonical).await;

	let before =
		queries::get_question(&service.db.pool, variation).await.expect("get_question failed.");
	let response = service
		.link_question(LinkRequest {
			question_id: variation,
			canonical_id: canonical,
			actor: ACTOR.to_string(),
		})
		.await
		.expect("Repeated link failed.");
	let after =
		queries::get_question(&service.db.pool, variation).await.expect("get_question failed.");

	assert_eq!(response.outcome, LinkOutcome::AlreadyLinked);
	assert_eq!(response.summary.total_questions, 2);
	assert_eq!(before.updated_at, after.updated_at);
	assert_eq!(before.group_id, after.group_id);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set QBANK_PG_DSN to run."]
async fn invalid_links_leave_state_unchanged() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping invalid_links_leave_state_unchanged; set QBANK_PG_DSN to run.");

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string(), DeletePolicy::Dissolve);
	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let canonical = super::create(&service, "Compute the determinant of a 3x3 matrix.").await;
	let variation = super::create(&service, "How to find a 3x3 determinant?").await;
	let other = super::create(&service, "Define the trace of a matrix.").await;

	super::link(&service, variation, canonical).await;

	let self_link = service
		.link_question(LinkRequest {
			question_id: other,
			canonical_id: other,
			actor: ACTOR.to_string(),
		})
		.await;

	assert!(matches!(self_link, Err(Error::InvalidOperation { .. })));

	let onto_variation = service
		.link_question(LinkRequest {
			question_id: other,
			canonical_id: variation,
			actor: ACTOR.to_string(),
		})
		.await;

	assert!(matches!(onto_variation, Err(Error::InvalidCanonical { .. })));

	let missing = service
		.link_question(LinkRequest {
			question_id: other,
			canonical_id: Uuid::new_v4(),
			actor: ACTOR.to_string(),
		})
		.await;

	assert!(matches!(missing, Err(Error::NotFound { .. })));

	let row = queries::get_question(&service.db.pool, other).await.expect("get_question failed.");

	assert!(row.is_canonical);
	assert_eq!(row.group_id, other);

	super::assert_consistent(&service).await;

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set QBANK_PG_DSN to run."]
async fn unlink_restores_a_singleton() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping unlink_restores_a_singleton; set QBANK_PG_DSN to run this test.");

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string(), DeletePolicy::Dissolve);
	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let canonical = super::create(&service, "What is a vector space?").await;
	let first = super::create(&service, "Define a vector space.").await;
	let second = super::create(&service, "Vector space axioms?").await;

	super::link(&service, first, canonical).await;
	super::link(&service, second, canonical).await;

	let response = service
		.unlink_question(UnlinkRequest { question_id: first, actor: ACTOR.to_string() })
		.await
		.expect("unlink_question failed.");

	assert_eq!(response.group_id, first);
	assert_eq!(response.previous_group_id, canonical);

	let row = queries::get_question(&service.db.pool, first).await.expect("get_question failed.");

	assert!(row.is_canonical);
	assert_eq!(row.group_id, first);
	assert_eq!(row.canonical_id, None);

	let sibling =
		queries::get_question(&service.db.pool, second).await.expect("get_question failed.");

	assert_eq!(sibling.canonical_id, Some(canonical));

	let unlink_canonical = service
		.unlink_question(UnlinkRequest { question_id: canonical, actor: ACTOR.to_string() })
		.await;

	assert!(matches!(unlink_canonical, Err(Error::InvalidOperation { .. })));

	let unlink_missing = service
		.unlink_question(UnlinkRequest { question_id: Uuid::new_v4(), actor: ACTOR.to_string() })
		.await;

	assert!(matches!(unlink_missing, Err(Error::NotFound { .. })));

	super::assert_consistent(&service).await;

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set QBANK_PG_DSN to run."]
async fn variations_exclude_the_question_and_keep_creation_order() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping variations_exclude_the_question_and_keep_creation_order; set QBANK_PG_DSN to run."
		);

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string(), DeletePolicy::Dissolve);
	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let canonical = super::create(&service, "What is a basis?").await;
	let first = super::create(&service, "Define basis of a vector space.").await;
	let second = super::create(&service, "Basis: definition?").await;

	super::link(&service, second, canonical).await;
	super::link(&service, first, canonical).await;

	let variations = service
		.get_variations(QuestionRequest { question_id: canonical })
		.await
		.expect("get_variations failed.");
	let ids = variations.items.iter().map(|item| item.question_id).collect::<Vec<_>>();

	assert_eq!(ids, vec![first, second]);

	let from_variation = service
		.get_variations(QuestionRequest { question_id: second })
		.await
		.expect("get_variations failed.");
	let ids = from_variation.items.iter().map(|item| item.question_id).collect::<Vec<_>>();

	assert_eq!(ids, vec![canonical, first]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
