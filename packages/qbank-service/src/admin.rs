use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, QbankService, RecordEventArgs, Result};
use qbank_domain::grouping::{self, GroupOp};
use qbank_storage::{
	events,
	models::{GroupEvent, QuestionPatch},
	queries,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EditRequest {
	pub question_id: Uuid,
	pub text: String,
	pub actor: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EditResponse {
	pub question_id: Uuid,
	pub changed: bool,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditBreach {
	pub group_id: Uuid,
	pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditReport {
	pub questions_checked: u64,
	pub groups_checked: u64,
	pub breaches: Vec<AuditBreach>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryRequest {
	pub question_id: Uuid,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryEvent {
	pub event_id: Uuid,
	pub op: String,
	pub prev_snapshot: Option<Value>,
	pub new_snapshot: Option<Value>,
	pub actor: String,
	#[serde(with = "crate::time_serde")]
	pub ts: OffsetDateTime,
}
impl From<GroupEvent> for HistoryEvent {
	fn from(event: GroupEvent) -> Self {
		Self {
			event_id: event.event_id,
			op: event.op,
			prev_snapshot: event.prev_snapshot,
			new_snapshot: event.new_snapshot,
			actor: event.actor,
			ts: event.ts,
		}
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
	pub question_id: Uuid,
	pub events: Vec<HistoryEvent>,
}

impl QbankService {
	/// Replaces the text of a question. Group membership is untouched.
	pub async fn edit_question(&self, req: EditRequest) -> Result<EditResponse> {
		let now = OffsetDateTime::now_utc();
		let actor = crate::required_actor(&req.actor)?;
		let text = req.text.trim();

		if text.is_empty() {
			return Err(Error::InvalidRequest { message: "text must be non-empty.".to_string() });
		}

		let mut tx = self.db.pool.begin().await?;
		let locked = queries::lock_questions_tx(&mut tx, &[req.question_id]).await?;
		let question = crate::link::find_locked(&locked, req.question_id)?;

		if question.text == text {
			tx.commit().await?;

			return Ok(EditResponse {
				question_id: question.question_id,
				changed: false,
				updated_at: question.updated_at,
			});
		}

		let patch = QuestionPatch { group: None, text: Some(text.to_string()) };

		queries::update_question(&mut *tx, question.question_id, &patch, now).await?;

		let mut next = question.clone();

		next.text = text.to_string();
		next.updated_at = now;

		crate::record_event(
			&mut tx,
			RecordEventArgs {
				question_id: question.question_id,
				op: GroupOp::Edit,
				prev_snapshot: Some(crate::question_snapshot(question)),
				new_snapshot: Some(crate::question_snapshot(&next)),
				actor,
				ts: now,
			},
		)
		.await?;

		tx.commit().await?;

		tracing::info!(question_id = %question.question_id, "Question text edited.");

		Ok(EditResponse { question_id: question.question_id, changed: true, updated_at: now })
	}

	/// Scans every group and reports the ones that break a group invariant.
	pub async fn audit_groups(&self) -> Result<AuditReport> {
		let questions = queries::list_questions(&self.db.pool).await?;
		let members = questions.iter().map(crate::member).collect::<Vec<_>>();
		let mut group_ids = members.iter().map(|member| member.group_id).collect::<Vec<_>>();

		group_ids.sort();
		group_ids.dedup();

		let breaches = grouping::audit(&members)
			.into_iter()
			.map(|(group_id, breach)| AuditBreach { group_id, message: breach.to_string() })
			.collect::<Vec<_>>();

		for breach in &breaches {
			tracing::error!(
				group_id = %breach.group_id,
				breach = %breach.message,
				"Group audit found a breach."
			);
		}

		tracing::info!(
			questions = members.len(),
			groups = group_ids.len(),
			breaches = breaches.len(),
			"Group audit finished."
		);

		Ok(AuditReport {
			questions_checked: members.len() as u64,
			groups_checked: group_ids.len() as u64,
			breaches,
		})
	}

	/// Lists the recorded group events of one question, oldest first.
	pub async fn question_history(&self, req: HistoryRequest) -> Result<HistoryResponse> {
		let events = events::list_group_events(&self.db.pool, req.question_id).await?;

		// Deleted questions keep their history.
		let known = !events.is_empty()
			|| queries::find_question(&self.db.pool, req.question_id).await?.is_some();

		if !known {
			return Err(Error::NotFound { message: format!("question {}", req.question_id) });
		}

		Ok(HistoryResponse {
			question_id: req.question_id,
			events: events.into_iter().map(HistoryEvent::from).collect(),
		})
	}
}
