use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{Result, models::CandidateRow};

/// Canonical questions whose text contains any of `patterns` (`ILIKE` patterns).
///
/// The `ORDER BY` only decides which rows survive `LIMIT`; the service ranks the final list.
pub async fn search_canonical<'e, E>(
	executor: E,
	patterns: &[String],
	exclude_id: Option<Uuid>,
	limit: i64,
) -> Result<Vec<CandidateRow>>
where
	E: PgExecutor<'e>,
{
	if patterns.is_empty() || limit <= 0 {
		return Ok(Vec::new());
	}

	let rows = sqlx::query_as::<_, CandidateRow>(
		"\
SELECT
	q.question_id,
	q.text,
	q.group_id,
	q.views,
	q.created_at,
	q.subject_label,
	q.professor_label,
	(
		SELECT count(*)
		FROM questions v
		WHERE v.group_id = q.group_id AND v.question_id <> q.question_id
	) AS variation_count,
	EXISTS (
		SELECT 1
		FROM question_answers a
		WHERE a.question_id = q.question_id
	) AS has_answer
FROM questions q
WHERE q.is_canonical
	AND q.text ILIKE ANY($1)
	AND ($2::uuid IS NULL OR q.question_id <> $2)
ORDER BY q.views DESC, q.created_at DESC, q.question_id ASC
LIMIT $3",
	)
	.bind(patterns)
	.bind(exclude_id)
	.bind(limit)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}
