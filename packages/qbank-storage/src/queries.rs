use sqlx::{PgExecutor, Postgres, QueryBuilder, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{CountFilter, Question, QuestionPatch},
};

const QUESTION_COLUMNS: &str = "question_id, text, group_id, is_canonical, canonical_id, views, \
exam_id, subject_label, professor_label, submitted_by, created_at, updated_at";

pub async fn insert_question<'e, E>(executor: E, question: &Question) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO questions (
	question_id,
	text,
	group_id,
	is_canonical,
	canonical_id,
	views,
	exam_id,
	subject_label,
	professor_label,
	submitted_by,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
	)
	.bind(question.question_id)
	.bind(question.text.as_str())
	.bind(question.group_id)
	.bind(question.is_canonical)
	.bind(question.canonical_id)
	.bind(question.views)
	.bind(question.exam_id)
	.bind(question.subject_label.as_deref())
	.bind(question.professor_label.as_deref())
	.bind(question.submitted_by.as_str())
	.bind(question.created_at)
	.bind(question.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn find_question<'e, E>(executor: E, question_id: Uuid) -> Result<Option<Question>>
where
	E: PgExecutor<'e>,
{
	let sql = format!("SELECT {QUESTION_COLUMNS}\nFROM questions\nWHERE question_id = $1");
	let question = sqlx::query_as::<_, Question>(&sql)
		.bind(question_id)
		.fetch_optional(executor)
		.await?;

	Ok(question)
}

pub async fn get_question<'e, E>(executor: E, question_id: Uuid) -> Result<Question>
where
	E: PgExecutor<'e>,
{
	find_question(executor, question_id)
		.await?
		.ok_or_else(|| Error::NotFound(format!("question {question_id}")))
}

/// Locks the given rows in ascending id order. Missing ids are silently absent from the result.
pub async fn lock_questions_tx(
	tx: &mut Transaction<'_, Postgres>,
	question_ids: &[Uuid],
) -> Result<Vec<Question>> {
	let sql = format!(
		"SELECT {QUESTION_COLUMNS}\nFROM questions\nWHERE question_id = ANY($1)\nORDER BY question_id\nFOR UPDATE"
	);
	let questions =
		sqlx::query_as::<_, Question>(&sql).bind(question_ids).fetch_all(&mut **tx).await?;

	Ok(questions)
}

/// Takes a shared lock on one row so it cannot be deleted before the transaction ends. Returns
/// whether the row exists.
pub async fn share_lock_question_tx(
	tx: &mut Transaction<'_, Postgres>,
	question_id: Uuid,
) -> Result<bool> {
	let found: Option<i32> =
		sqlx::query_scalar("SELECT 1 FROM questions WHERE question_id = $1 FOR SHARE")
			.bind(question_id)
			.fetch_optional(&mut **tx)
			.await?;

	Ok(found.is_some())
}

/// Locks every member of a group in ascending id order.
pub async fn lock_group_tx(
	tx: &mut Transaction<'_, Postgres>,
	group_id: Uuid,
) -> Result<Vec<Question>> {
	let sql = format!(
		"SELECT {QUESTION_COLUMNS}\nFROM questions\nWHERE group_id = $1\nORDER BY question_id\nFOR UPDATE"
	);
	let questions = sqlx::query_as::<_, Question>(&sql).bind(group_id).fetch_all(&mut **tx).await?;

	Ok(questions)
}

pub async fn find_by_group<'e, E>(executor: E, group_id: Uuid) -> Result<Vec<Question>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"SELECT {QUESTION_COLUMNS}\nFROM questions\nWHERE group_id = $1\nORDER BY created_at ASC, question_id ASC"
	);
	let questions = sqlx::query_as::<_, Question>(&sql).bind(group_id).fetch_all(executor).await?;

	Ok(questions)
}

pub async fn list_questions<'e, E>(executor: E) -> Result<Vec<Question>>
where
	E: PgExecutor<'e>,
{
	let sql = format!("SELECT {QUESTION_COLUMNS}\nFROM questions\nORDER BY group_id, question_id");
	let questions = sqlx::query_as::<_, Question>(&sql).fetch_all(executor).await?;

	Ok(questions)
}

/// Applies `patch` to one row. Only the group columns and `text` are writable here.
pub async fn update_question<'e, E>(
	executor: E,
	question_id: Uuid,
	patch: &QuestionPatch,
	now: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	if patch.is_empty() {
		return Err(Error::InvalidArgument("Question patch is empty.".to_string()));
	}

	let mut builder = QueryBuilder::<Postgres>::new("UPDATE questions SET updated_at = ");

	builder.push_bind(now);

	if let Some(group) = patch.group {
		builder.push(", group_id = ");
		builder.push_bind(group.group_id);
		builder.push(", is_canonical = ");
		builder.push_bind(group.is_canonical);
		builder.push(", canonical_id = ");
		builder.push_bind(group.canonical_id);
	}
	if let Some(text) = patch.text.as_deref() {
		builder.push(", text = ");
		builder.push_bind(text);
	}

	builder.push(" WHERE question_id = ");
	builder.push_bind(question_id);

	let result = builder.build().execute(executor).await?;

	if result.rows_affected() == 0 {
		return Err(Error::NotFound(format!("question {question_id}")));
	}

	Ok(())
}

pub async fn delete_question<'e, E>(executor: E, question_id: Uuid) -> Result<()>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM questions WHERE question_id = $1")
		.bind(question_id)
		.execute(executor)
		.await?;

	if result.rows_affected() == 0 {
		return Err(Error::NotFound(format!("question {question_id}")));
	}

	Ok(())
}

pub async fn count_questions<'e, E>(executor: E, filter: CountFilter) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let query = match filter {
		CountFilter::All => sqlx::query_scalar::<Postgres, i64>("SELECT count(*) FROM questions"),
		CountFilter::Canonical => sqlx::query_scalar::<Postgres, i64>(
			"SELECT count(*) FROM questions WHERE is_canonical",
		),
		CountFilter::Group(group_id) => sqlx::query_scalar::<Postgres, i64>(
			"SELECT count(*) FROM questions WHERE group_id = $1",
		)
		.bind(group_id),
		CountFilter::Variations(group_id) => sqlx::query_scalar::<Postgres, i64>(
			"SELECT count(*) FROM questions WHERE group_id = $1 AND NOT is_canonical",
		)
		.bind(group_id),
	};
	let count: i64 = query.fetch_one(executor).await?;

	Ok(count)
}

/// Bumps the view counter and returns the new value.
pub async fn record_view<'e, E>(executor: E, question_id: Uuid) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	sqlx::query_scalar(
		"UPDATE questions SET views = views + 1 WHERE question_id = $1 RETURNING views",
	)
	.bind(question_id)
	.fetch_optional(executor)
	.await?
	.ok_or_else(|| Error::NotFound(format!("question {question_id}")))
}
