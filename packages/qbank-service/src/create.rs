use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, QbankService, RecordEventArgs, Result};
use qbank_domain::grouping::GroupOp;
use qbank_storage::{
	models::{Provenance, Question},
	queries,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateRequest {
	pub text: String,
	pub actor: String,
	#[serde(default)]
	pub exam_id: Option<Uuid>,
	#[serde(default)]
	pub subject_label: Option<String>,
	#[serde(default)]
	pub professor_label: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateResponse {
	pub question_id: Uuid,
	pub group_id: Uuid,
}

impl QbankService {
	/// Stores a new submission as the canonical of its own singleton group.
	pub async fn create_question(&self, req: CreateRequest) -> Result<CreateResponse> {
		let now = OffsetDateTime::now_utc();
		let actor = crate::required_actor(&req.actor)?;
		let text = req.text.trim();

		if text.is_empty() {
			return Err(Error::InvalidRequest { message: "text must be non-empty.".to_string() });
		}

		let provenance = Provenance {
			exam_id: req.exam_id,
			subject_label: normalize_label(req.subject_label),
			professor_label: normalize_label(req.professor_label),
			submitted_by: actor.to_string(),
		};
		let question = Question::submitted(text.to_string(), provenance, now);
		let mut tx = self.db.pool.begin().await?;

		queries::insert_question(&mut *tx, &question).await?;
		crate::record_event(
			&mut tx,
			RecordEventArgs {
				question_id: question.question_id,
				op: GroupOp::Create,
				prev_snapshot: None,
				new_snapshot: Some(crate::question_snapshot(&question)),
				actor,
				ts: now,
			},
		)
		.await?;

		tx.commit().await?;

		tracing::info!(question_id = %question.question_id, "Question created.");

		Ok(CreateResponse { question_id: question.question_id, group_id: question.group_id })
	}
}

fn normalize_label(label: Option<String>) -> Option<String> {
	label.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}
