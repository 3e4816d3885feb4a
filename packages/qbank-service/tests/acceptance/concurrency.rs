use uuid::Uuid;

use qbank_config::DeletePolicy;
use qbank_service::{DeleteRequest, Error, LinkRequest, QuestionRequest, UnlinkRequest};
use qbank_storage::queries;

use super::ACTOR;

fn link_request(question_id: Uuid, canonical_id: Uuid) -> LinkRequest {
	LinkRequest { question_id, canonical_id, actor: ACTOR.to_string() }
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set QBANK_PG_DSN to run."]
async fn concurrent_links_onto_one_canonical_all_land() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping concurrent_links_onto_one_canonical_all_land; set QBANK_PG_DSN to run.");

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string(), DeletePolicy::Dissolve);
	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let canonical = super::create(&service, "Define a context-free grammar.").await;
	let first = super::create(&service, "What is a CFG?").await;
	let second = super::create(&service, "Context-free grammar definition.").await;
	let third = super::create(&service, "Explain context-free grammars.").await;
	let (a, b, c) = tokio::join!(
		service.link_question(link_request(first, canonical)),
		service.link_question(link_request(second, canonical)),
		service.link_question(link_request(third, canonical)),
	);

	a.expect("First link failed.");
	b.expect("Second link failed.");
	c.expect("Third link failed.");

	let members =
		queries::find_by_group(&service.db.pool, canonical).await.expect("find_by_group failed.");

	assert_eq!(members.len(), 4);

	super::assert_consistent(&service).await;

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set QBANK_PG_DSN to run."]
async fn crossing_links_serialize() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping crossing_links_serialize; set QBANK_PG_DSN to run this test.");

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string(), DeletePolicy::Dissolve);
	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let left = super::create(&service, "What is a pushdown automaton?").await;
	let right = super::create(&service, "Define pushdown automaton.").await;
	let (forward, backward) = tokio::join!(
		service.link_question(link_request(left, right)),
		service.link_question(link_request(right, left)),
	);
	let outcomes = [forward, backward];
	let succeeded = outcomes.iter().filter(|outcome| outcome.is_ok()).count();

	assert_eq!(succeeded, 1);
	assert!(
		outcomes
			.iter()
			.filter_map(|outcome| outcome.as_ref().err())
			.all(|err| matches!(err, Error::InvalidCanonical { .. }))
	);

	super::assert_consistent(&service).await;

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set QBANK_PG_DSN to run."]
async fn mixed_concurrent_transitions_keep_groups_consistent() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping mixed_concurrent_transitions_keep_groups_consistent; set QBANK_PG_DSN to run."
		);

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string(), DeletePolicy::PromoteOldest);
	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let hub = super::create(&service, "Explain the halting problem.").await;
	let spoke = super::create(&service, "Is halting decidable?").await;
	let target = super::create(&service, "Halting problem undecidability.").await;
	let late = super::create(&service, "Why can't we decide halting?").await;

	super::link(&service, spoke, hub).await;

	let (merge, unlink, delete, join) = tokio::join!(
		service.link_question(link_request(hub, target)),
		service.unlink_question(UnlinkRequest { question_id: spoke, actor: ACTOR.to_string() }),
		service.delete_question(DeleteRequest { question_id: target, actor: ACTOR.to_string() }),
		service.link_question(link_request(late, hub)),
	);

	// Each transition either lands or is rejected against the state it observed.
	for outcome in [merge.map(|_| ()), unlink.map(|_| ()), delete.map(|_| ()), join.map(|_| ())] {
		if let Err(err) = outcome {
			assert!(
				matches!(
					err,
					Error::NotFound { .. }
						| Error::InvalidCanonical { .. }
						| Error::InvalidOperation { .. }
				),
				"Unexpected error: {err}"
			);
		}
	}

	super::assert_consistent(&service).await;

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set QBANK_PG_DSN to run."]
async fn reads_racing_a_canonical_delete_see_one_group_state() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping reads_racing_a_canonical_delete_see_one_group_state; set QBANK_PG_DSN to run."
		);

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string(), DeletePolicy::Dissolve);
	let service = super::build_service(cfg).await.expect("Failed to build service.");

	for _ in 0..60 {
		let canonical = super::create(&service, "State the pumping lemma.").await;
		let variation = super::create(&service, "What does the pumping lemma say?").await;

		super::link(&service, variation, canonical).await;

		let (deleted, summary, variations) = tokio::join!(
			service.delete_question(DeleteRequest {
				question_id: canonical,
				actor: ACTOR.to_string(),
			}),
			service.get_group_summary(QuestionRequest { question_id: variation }),
			service.get_variations(QuestionRequest { question_id: variation }),
		);

		deleted.expect("delete_question failed.");

		let summary = summary.expect("get_group_summary failed during a concurrent delete.");

		// Either the whole pre-delete group or the dissolved singleton, never a mix.
		if summary.canonical_id == canonical {
			assert_eq!(summary.total_questions, 2);
		} else {
			assert_eq!(summary.canonical_id, variation);
			assert_eq!(summary.total_questions, 1);
		}

		let variations = variations.expect("get_variations failed during a concurrent delete.");

		if variations.group_id == canonical {
			assert_eq!(variations.items.len(), 1);
		} else {
			assert!(variations.items.is_empty());
		}
	}

	super::assert_consistent(&service).await;

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
