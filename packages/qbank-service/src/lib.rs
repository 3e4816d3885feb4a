pub mod admin;
pub mod answers;
pub mod create;
pub mod delete;
pub mod link;
pub mod questions;
pub mod search;
pub mod summary;
pub mod time_serde;
pub mod unlink;
pub mod variations;

mod error;

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use serde_json::Value;
use sqlx::{PgConnection, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

pub use admin::{
	AuditBreach, AuditReport, EditRequest, EditResponse, HistoryEvent, HistoryRequest,
	HistoryResponse,
};
pub use answers::{AddAnswerRequest, AddAnswerResponse};
pub use create::{CreateRequest, CreateResponse};
pub use delete::{DeleteRequest, DeleteResponse};
pub use error::{Error, Result};
pub use link::{LinkOutcome, LinkRequest, LinkResponse};
pub use questions::{QuestionRequest, QuestionView, ViewResponse};
pub use search::{CandidateQuery, LexicalSearch, SearchItem, SearchRequest, SearchResponse};
pub use summary::GroupSummary;
pub use unlink::{UnlinkRequest, UnlinkResponse};
pub use variations::VariationsResponse;

use qbank_config::Config;
use qbank_domain::grouping::{self, Assignment, GroupOp, Member};
use qbank_storage::{
	db::Db,
	events,
	models::{CandidateRow, GroupEvent, GroupPatch, Question, QuestionPatch},
	queries,
};

const CONFLICT_BASE_BACKOFF_MS: u64 = 10;
const CONFLICT_MAX_BACKOFF_MS: u64 = 200;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Finds canonical questions that a new submission may be a variation of.
pub trait CandidateSearch
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		db: &'a Db,
		query: &'a CandidateQuery,
	) -> BoxFuture<'a, Result<Vec<CandidateRow>>>;
}

pub struct QbankService {
	pub cfg: Config,
	pub db: Db,
	pub search: Arc<dyn CandidateSearch>,
}
impl QbankService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db, search: Arc::new(LexicalSearch) }
	}

	pub fn with_search(cfg: Config, db: Db, search: Arc<dyn CandidateSearch>) -> Self {
		Self { cfg, db, search }
	}

	/// Runs `attempt` again while it fails with a retryable conflict, up to
	/// `groups.conflict_retries` extra times.
	pub(crate) async fn retry_on_conflict<T, F, Fut>(
		&self,
		operation: &'static str,
		mut attempt: F,
	) -> Result<T>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		let mut retries = 0_u32;

		loop {
			match attempt().await {
				Err(err) if err.is_retryable() && retries < self.cfg.groups.conflict_retries => {
					retries += 1;

					let backoff = conflict_backoff(retries);

					tracing::warn!(
						operation,
						retries,
						backoff_ms = backoff.as_millis() as u64,
						error = %err,
						"Group transition conflicted. Retrying."
					);
					tokio::time::sleep(backoff).await;
				},
				result => return result,
			}
		}
	}
}

pub(crate) struct RecordEventArgs<'a> {
	pub(crate) question_id: Uuid,
	pub(crate) op: GroupOp,
	pub(crate) prev_snapshot: Option<Value>,
	pub(crate) new_snapshot: Option<Value>,
	pub(crate) actor: &'a str,
	pub(crate) ts: OffsetDateTime,
}

pub(crate) fn conflict_backoff(attempt: u32) -> Duration {
	let exp = attempt.max(1).saturating_sub(1).min(5);
	let base = CONFLICT_BASE_BACKOFF_MS.saturating_mul(1 << exp);

	Duration::from_millis(base.min(CONFLICT_MAX_BACKOFF_MS))
}

pub(crate) fn member(question: &Question) -> Member {
	Member {
		question_id: question.question_id,
		group_id: question.group_id,
		is_canonical: question.is_canonical,
		canonical_id: question.canonical_id,
		created_at: question.created_at,
	}
}

pub(crate) fn question_snapshot(question: &Question) -> Value {
	serde_json::json!({
		"question_id": question.question_id,
		"text": question.text,
		"group_id": question.group_id,
		"is_canonical": question.is_canonical,
		"canonical_id": question.canonical_id,
		"views": question.views,
		"exam_id": question.exam_id,
		"subject_label": question.subject_label,
		"professor_label": question.professor_label,
		"submitted_by": question.submitted_by,
		"created_at": question.created_at,
		"updated_at": question.updated_at,
	})
}

pub(crate) fn required_actor(actor: &str) -> Result<&str> {
	let actor = actor.trim();

	if actor.is_empty() {
		return Err(Error::InvalidRequest { message: "actor is required.".to_string() });
	}

	Ok(actor)
}

pub(crate) async fn record_event(
	tx: &mut Transaction<'_, Postgres>,
	args: RecordEventArgs<'_>,
) -> Result<()> {
	let RecordEventArgs { question_id, op, prev_snapshot, new_snapshot, actor, ts } = args;
	let event = GroupEvent {
		event_id: Uuid::new_v4(),
		question_id,
		op: op.as_str().to_string(),
		prev_snapshot,
		new_snapshot,
		actor: actor.to_string(),
		ts,
	};

	events::insert_group_event(&mut **tx, &event).await?;

	Ok(())
}

/// Writes each planned assignment over the matching locked row and records one event per write.
pub(crate) async fn apply_assignments(
	tx: &mut Transaction<'_, Postgres>,
	locked: &[Question],
	writes: &[Assignment],
	actor: &str,
	now: OffsetDateTime,
) -> Result<()> {
	for write in writes {
		let Some(prev) = locked.iter().find(|row| row.question_id == write.question_id) else {
			return Err(Error::InvariantViolation {
				message: format!("Planned write targets unlocked question {}.", write.question_id),
			});
		};
		let patch = QuestionPatch {
			group: Some(GroupPatch {
				group_id: write.group_id,
				is_canonical: write.is_canonical,
				canonical_id: write.canonical_id,
			}),
			text: None,
		};

		queries::update_question(&mut **tx, write.question_id, &patch, now).await?;

		let mut next = prev.clone();

		next.group_id = write.group_id;
		next.is_canonical = write.is_canonical;
		next.canonical_id = write.canonical_id;
		next.updated_at = now;

		record_event(
			tx,
			RecordEventArgs {
				question_id: write.question_id,
				op: write.op,
				prev_snapshot: Some(question_snapshot(prev)),
				new_snapshot: Some(question_snapshot(&next)),
				actor,
				ts: now,
			},
		)
		.await?;
	}

	Ok(())
}

/// Re-reads groups inside the transaction. `live` groups must satisfy every group invariant and
/// `vacated` groups must have no members left.
pub(crate) async fn verify_groups(
	conn: &mut PgConnection,
	operation: &'static str,
	live: &[Uuid],
	vacated: &[Uuid],
) -> Result<()> {
	let mut live = live.to_vec();

	live.sort();
	live.dedup();

	for group_id in live {
		let members = queries::find_by_group(&mut *conn, group_id)
			.await?
			.iter()
			.map(member)
			.collect::<Vec<_>>();

		if let Err(breach) = grouping::check_group(group_id, &members) {
			tracing::error!(operation, %group_id, %breach, "Group invariant breached. Aborting.");

			return Err(Error::InvariantViolation {
				message: format!("Group {group_id}: {breach}"),
			});
		}
	}
	for group_id in vacated {
		let remaining = queries::find_by_group(&mut *conn, *group_id).await?;

		if !remaining.is_empty() {
			tracing::error!(
				operation,
				%group_id,
				remaining = remaining.len(),
				"Vacated group still has members. Aborting."
			);

			return Err(Error::InvariantViolation {
				message: format!("Group {group_id} still has {} members.", remaining.len()),
			});
		}
	}

	Ok(())
}
