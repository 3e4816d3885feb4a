use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{Error, QbankService, QuestionRequest, Result};
use qbank_storage::{answers, models::CountFilter, queries};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupSummary {
	pub question_id: Uuid,
	pub canonical_id: Uuid,
	pub group_id: Uuid,
	pub total_questions: i64,
	/// Whether the canonical itself has an answer.
	pub has_answer: bool,
	/// Answers attached to the group's variations.
	pub variation_answer_count: i64,
	pub canonical_text: String,
}

impl QbankService {
	pub async fn get_group_summary(&self, req: QuestionRequest) -> Result<GroupSummary> {
		let mut tx = self.db.begin_snapshot().await?;
		let summary = load_group_summary(&mut tx, req.question_id).await?;

		tx.commit().await?;

		Ok(summary)
	}
}

/// Reads the summary through `conn`. Callers hold one snapshot or the group locks across all reads.
pub(crate) async fn load_group_summary(
	conn: &mut PgConnection,
	question_id: Uuid,
) -> Result<GroupSummary> {
	let question = queries::get_question(&mut *conn, question_id).await?;
	let canonical = if question.is_canonical {
		question
	} else {
		let Some(canonical_id) = question.canonical_id else {
			return Err(Error::InvariantViolation {
				message: format!("Variation {question_id} has no canonical."),
			});
		};

		queries::find_question(&mut *conn, canonical_id).await?.ok_or_else(|| {
			Error::InvariantViolation {
				message: format!("Variation {question_id} points at missing {canonical_id}."),
			}
		})?
	};
	let total_questions =
		queries::count_questions(&mut *conn, CountFilter::Group(canonical.group_id)).await?;
	let counts =
		answers::answer_counts(&mut *conn, canonical.group_id, canonical.question_id).await?;

	Ok(GroupSummary {
		question_id,
		canonical_id: canonical.question_id,
		group_id: canonical.group_id,
		total_questions,
		has_answer: counts.canonical > 0,
		variation_answer_count: counts.variations,
		canonical_text: canonical.text,
	})
}
