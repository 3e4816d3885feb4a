use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{Result, models::GroupEvent};

pub async fn insert_group_event<'e, E>(executor: E, event: &GroupEvent) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO question_group_events (
	event_id,
	question_id,
	op,
	prev_snapshot,
	new_snapshot,
	actor,
	ts
)
VALUES ($1, $2, $3, $4, $5, $6, $7)",
	)
	.bind(event.event_id)
	.bind(event.question_id)
	.bind(event.op.as_str())
	.bind(&event.prev_snapshot)
	.bind(&event.new_snapshot)
	.bind(event.actor.as_str())
	.bind(event.ts)
	.execute(executor)
	.await?;

	Ok(())
}

/// Events for one question, oldest first.
pub async fn list_group_events<'e, E>(executor: E, question_id: Uuid) -> Result<Vec<GroupEvent>>
where
	E: PgExecutor<'e>,
{
	let events = sqlx::query_as::<_, GroupEvent>(
		"\
SELECT event_id, question_id, op, prev_snapshot, new_snapshot, actor, ts
FROM question_group_events
WHERE question_id = $1
ORDER BY ts ASC, event_id ASC",
	)
	.bind(question_id)
	.fetch_all(executor)
	.await?;

	Ok(events)
}
