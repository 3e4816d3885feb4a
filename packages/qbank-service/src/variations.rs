use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{QbankService, QuestionRequest, QuestionView, Result};
use qbank_storage::queries;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VariationsResponse {
	pub question_id: Uuid,
	pub group_id: Uuid,
	/// Other members of the group, oldest first.
	pub items: Vec<QuestionView>,
}

impl QbankService {
	pub async fn get_variations(&self, req: QuestionRequest) -> Result<VariationsResponse> {
		let mut tx = self.db.begin_snapshot().await?;
		let question = queries::get_question(&mut *tx, req.question_id).await?;
		let items = queries::find_by_group(&mut *tx, question.group_id)
			.await?
			.into_iter()
			.filter(|member| member.question_id != question.question_id)
			.map(QuestionView::from)
			.collect();

		tx.commit().await?;

		Ok(VariationsResponse {
			question_id: question.question_id,
			group_id: question.group_id,
			items,
		})
	}
}
