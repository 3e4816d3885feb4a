use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{QbankService, Result};
use qbank_storage::{models::Question, queries};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuestionRequest {
	pub question_id: Uuid,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuestionView {
	pub question_id: Uuid,
	pub text: String,
	pub group_id: Uuid,
	pub is_canonical: bool,
	pub canonical_id: Option<Uuid>,
	pub views: i64,
	pub exam_id: Option<Uuid>,
	pub subject_label: Option<String>,
	pub professor_label: Option<String>,
	pub submitted_by: String,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}
impl From<Question> for QuestionView {
	fn from(question: Question) -> Self {
		Self {
			question_id: question.question_id,
			text: question.text,
			group_id: question.group_id,
			is_canonical: question.is_canonical,
			canonical_id: question.canonical_id,
			views: question.views,
			exam_id: question.exam_id,
			subject_label: question.subject_label,
			professor_label: question.professor_label,
			submitted_by: question.submitted_by,
			created_at: question.created_at,
			updated_at: question.updated_at,
		}
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ViewResponse {
	pub question_id: Uuid,
	pub views: i64,
}

impl QbankService {
	pub async fn get_question(&self, req: QuestionRequest) -> Result<QuestionView> {
		let question = queries::get_question(&self.db.pool, req.question_id).await?;

		Ok(question.into())
	}

	/// Counts one view. Views only feed candidate ranking.
	pub async fn record_view(&self, req: QuestionRequest) -> Result<ViewResponse> {
		let views = queries::record_view(&self.db.pool, req.question_id).await?;

		Ok(ViewResponse { question_id: req.question_id, views })
	}
}
