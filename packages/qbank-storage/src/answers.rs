use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{
	Result,
	models::{Answer, AnswerCounts},
};

pub async fn insert_answer<'e, E>(executor: E, answer: &Answer) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO question_answers (answer_id, question_id, author_id, body, created_at)
VALUES ($1, $2, $3, $4, $5)",
	)
	.bind(answer.answer_id)
	.bind(answer.question_id)
	.bind(answer.author_id.as_str())
	.bind(answer.body.as_str())
	.bind(answer.created_at)
	.execute(executor)
	.await?;

	Ok(())
}

/// Answers attached to the canonical of a group and to its variations.
pub async fn answer_counts<'e, E>(
	executor: E,
	group_id: Uuid,
	canonical_id: Uuid,
) -> Result<AnswerCounts>
where
	E: PgExecutor<'e>,
{
	let counts = sqlx::query_as::<_, AnswerCounts>(
		"\
SELECT
	count(*) FILTER (WHERE a.question_id = $2) AS canonical,
	count(*) FILTER (WHERE a.question_id <> $2) AS variations
FROM question_answers a
JOIN questions q ON q.question_id = a.question_id
WHERE q.group_id = $1",
	)
	.bind(group_id)
	.bind(canonical_id)
	.fetch_one(executor)
	.await?;

	Ok(counts)
}
