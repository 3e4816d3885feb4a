use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{QbankService, RecordEventArgs, Result};
use qbank_config::DeletePolicy;
use qbank_domain::grouping::{self, GroupOp, Role};
use qbank_storage::queries;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteRequest {
	pub question_id: Uuid,
	pub actor: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
	pub question_id: Uuid,
	pub policy: DeletePolicy,
	/// The role the question held in its group when it was deleted.
	pub role: Role,
	/// Groups that hold the deleted question's former group members.
	pub affected_groups: Vec<Uuid>,
}

impl QbankService {
	/// Deletes a question. Variations of a deleted canonical are regrouped first, according to
	/// `groups.delete_policy`, so no row is left pointing at a missing canonical.
	pub async fn delete_question(&self, req: DeleteRequest) -> Result<DeleteResponse> {
		let actor = crate::required_actor(&req.actor)?;
		let question_id = req.question_id;

		self.retry_on_conflict("delete", move || self.delete_once(question_id, actor)).await
	}

	async fn delete_once(&self, question_id: Uuid, actor: &str) -> Result<DeleteResponse> {
		let now = OffsetDateTime::now_utc();
		let policy = self.cfg.groups.delete_policy;
		let mut tx = self.db.pool.begin().await?;
		let locked = queries::lock_questions_tx(&mut tx, &[question_id]).await?;
		let question = crate::link::find_locked(&locked, question_id)?.clone();
		let group = if question.is_canonical {
			queries::lock_group_tx(&mut tx, question.group_id).await?
		} else {
			locked
		};
		let members = group.iter().map(crate::member).collect::<Vec<_>>();
		let role = grouping::role(&crate::member(&question), members.len());
		let plan = grouping::plan_delete(&crate::member(&question), &members, policy);

		crate::apply_assignments(&mut tx, &group, &plan.writes, actor, now).await?;
		queries::delete_question(&mut *tx, question_id).await?;
		crate::record_event(
			&mut tx,
			RecordEventArgs {
				question_id,
				op: GroupOp::Delete,
				prev_snapshot: Some(crate::question_snapshot(&question)),
				new_snapshot: None,
				actor,
				ts: now,
			},
		)
		.await?;

		let vacated = if question.is_canonical { vec![question.group_id] } else { Vec::new() };

		crate::verify_groups(&mut tx, "delete", &plan.affected_groups, &vacated).await?;

		tx.commit().await?;

		if !plan.writes.is_empty() && policy == DeletePolicy::Dissolve {
			tracing::warn!(
				%question_id,
				fragments = plan.writes.len(),
				"Deleted canonical; its group dissolved into singleton groups."
			);
		}

		tracing::info!(%question_id, rewritten = plan.writes.len(), "Question deleted.");

		Ok(DeleteResponse { question_id, policy, role, affected_groups: plan.affected_groups })
	}
}
