use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, QbankService, Result};
use qbank_storage::{answers, models::Answer, queries};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddAnswerRequest {
	pub question_id: Uuid,
	pub author_id: String,
	pub body: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddAnswerResponse {
	pub answer_id: Uuid,
	pub question_id: Uuid,
}

impl QbankService {
	/// Attaches an answer to one question. Answers never move when groups change.
	pub async fn add_answer(&self, req: AddAnswerRequest) -> Result<AddAnswerResponse> {
		let author_id = req.author_id.trim();
		let body = req.body.trim();

		if author_id.is_empty() || body.is_empty() {
			return Err(Error::InvalidRequest {
				message: "author_id and body are required.".to_string(),
			});
		}

		let answer = Answer {
			answer_id: Uuid::new_v4(),
			question_id: req.question_id,
			author_id: author_id.to_string(),
			body: body.to_string(),
			created_at: OffsetDateTime::now_utc(),
		};
		let mut tx = self.db.pool.begin().await?;

		if !queries::share_lock_question_tx(&mut tx, req.question_id).await? {
			return Err(Error::NotFound { message: format!("question {}", req.question_id) });
		}

		answers::insert_answer(&mut *tx, &answer).await?;

		tx.commit().await?;

		Ok(AddAnswerResponse { answer_id: answer.answer_id, question_id: answer.question_id })
	}
}
