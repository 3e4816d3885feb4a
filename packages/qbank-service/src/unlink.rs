use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{QbankService, Result};
use qbank_domain::grouping;
use qbank_storage::queries;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnlinkRequest {
	pub question_id: Uuid,
	pub actor: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnlinkResponse {
	pub question_id: Uuid,
	pub group_id: Uuid,
	pub previous_group_id: Uuid,
}

impl QbankService {
	/// Detaches a variation into a singleton group of its own.
	pub async fn unlink_question(&self, req: UnlinkRequest) -> Result<UnlinkResponse> {
		let actor = crate::required_actor(&req.actor)?;
		let question_id = req.question_id;

		self.retry_on_conflict("unlink", move || self.unlink_once(question_id, actor)).await
	}

	async fn unlink_once(&self, question_id: Uuid, actor: &str) -> Result<UnlinkResponse> {
		let now = OffsetDateTime::now_utc();
		let mut tx = self.db.pool.begin().await?;
		let locked = queries::lock_questions_tx(&mut tx, &[question_id]).await?;
		let question = crate::link::find_locked(&locked, question_id)?;
		let write = grouping::plan_unlink(&crate::member(question))?;

		crate::apply_assignments(&mut tx, &locked, std::slice::from_ref(&write), actor, now).await?;
		crate::verify_groups(&mut tx, "unlink", &[question.group_id, write.group_id], &[]).await?;

		tx.commit().await?;

		tracing::info!(
			%question_id,
			previous_group_id = %question.group_id,
			"Question unlinked into its own group."
		);

		Ok(UnlinkResponse {
			question_id,
			group_id: write.group_id,
			previous_group_id: question.group_id,
		})
	}
}
