use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, GroupSummary, QbankService, Result};
use qbank_domain::grouping::{self, LinkPlan};
use qbank_storage::{models::Question, queries};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LinkRequest {
	pub question_id: Uuid,
	pub canonical_id: Uuid,
	pub actor: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkOutcome {
	Linked,
	AlreadyLinked,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LinkResponse {
	pub outcome: LinkOutcome,
	/// Former variations of the question that now point at the new canonical.
	pub repointed: Vec<Uuid>,
	pub summary: GroupSummary,
}

impl QbankService {
	/// Attaches a question to the group of a canonical question, merging its own group into the
	/// target when the question is a canonical itself.
	pub async fn link_question(&self, req: LinkRequest) -> Result<LinkResponse> {
		let actor = crate::required_actor(&req.actor)?;
		let req = &req;

		self.retry_on_conflict("link", move || self.link_once(req, actor)).await
	}

	async fn link_once(&self, req: &LinkRequest, actor: &str) -> Result<LinkResponse> {
		let now = OffsetDateTime::now_utc();
		let mut ids = vec![req.question_id, req.canonical_id];

		ids.sort();
		ids.dedup();

		let mut tx = self.db.pool.begin().await?;
		let locked = queries::lock_questions_tx(&mut tx, &ids).await?;
		let question = find_locked(&locked, req.question_id)?;
		let canonical = find_locked(&locked, req.canonical_id)?;
		let merges_group = question.is_canonical && question.question_id != canonical.question_id;
		// A canonical brings its variations along, so its whole group is locked too.
		let question_group = if merges_group {
			queries::lock_group_tx(&mut tx, question.group_id).await?
		} else {
			vec![question.clone()]
		};
		let group_members = question_group.iter().map(crate::member).collect::<Vec<_>>();
		let plan = grouping::plan_link(
			&crate::member(question),
			&group_members,
			&crate::member(canonical),
		)?;
		let LinkPlan::Apply { writes } = plan else {
			let summary = crate::summary::load_group_summary(&mut tx, req.question_id).await?;

			tx.commit().await?;

			tracing::info!(
				question_id = %req.question_id,
				canonical_id = %req.canonical_id,
				"Question already belongs to the target group."
			);

			return Ok(LinkResponse {
				outcome: LinkOutcome::AlreadyLinked,
				repointed: Vec::new(),
				summary,
			});
		};
		let mut locked_rows = question_group;

		locked_rows.push(canonical.clone());

		crate::apply_assignments(&mut tx, &locked_rows, &writes, actor, now).await?;

		let vacated = if question.is_canonical { vec![question.group_id] } else { Vec::new() };
		let mut live = vec![canonical.group_id];

		if !question.is_canonical {
			live.push(question.group_id);
		}

		crate::verify_groups(&mut tx, "link", &live, &vacated).await?;

		let summary = crate::summary::load_group_summary(&mut tx, req.question_id).await?;

		tx.commit().await?;

		let repointed = writes
			.iter()
			.filter(|write| write.question_id != req.question_id)
			.map(|write| write.question_id)
			.collect::<Vec<_>>();

		tracing::info!(
			question_id = %req.question_id,
			canonical_id = %req.canonical_id,
			repointed = repointed.len(),
			"Question linked."
		);

		Ok(LinkResponse { outcome: LinkOutcome::Linked, repointed, summary })
	}
}

pub(crate) fn find_locked(locked: &[Question], question_id: Uuid) -> Result<&Question> {
	locked
		.iter()
		.find(|row| row.question_id == question_id)
		.ok_or_else(|| Error::NotFound { message: format!("question {question_id}") })
}
