use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Question {
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
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
impl Question {
	/// A new submission, placed in its own singleton group.
	pub fn submitted(text: String, provenance: Provenance, now: OffsetDateTime) -> Self {
		let question_id = Uuid::new_v4();

		Self {
			question_id,
			text,
			group_id: question_id,
			is_canonical: true,
			canonical_id: None,
			views: 0,
			exam_id: provenance.exam_id,
			subject_label: provenance.subject_label,
			professor_label: provenance.professor_label,
			submitted_by: provenance.submitted_by,
			created_at: now,
			updated_at: now,
		}
	}
}

/// Where a submission came from. Owned by the ingestion flow.
#[derive(Clone, Debug, Default)]
pub struct Provenance {
	pub exam_id: Option<Uuid>,
	pub subject_label: Option<String>,
	pub professor_label: Option<String>,
	pub submitted_by: String,
}

/// New values for the group columns of a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroupPatch {
	pub group_id: Uuid,
	pub is_canonical: bool,
	pub canonical_id: Option<Uuid>,
}

#[derive(Clone, Debug, Default)]
pub struct QuestionPatch {
	pub group: Option<GroupPatch>,
	pub text: Option<String>,
}
impl QuestionPatch {
	pub fn is_empty(&self) -> bool {
		self.group.is_none() && self.text.is_none()
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountFilter {
	All,
	Canonical,
	Group(Uuid),
	Variations(Uuid),
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct CandidateRow {
	pub question_id: Uuid,
	pub text: String,
	pub group_id: Uuid,
	pub views: i64,
	pub created_at: OffsetDateTime,
	pub subject_label: Option<String>,
	pub professor_label: Option<String>,
	pub variation_count: i64,
	pub has_answer: bool,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Answer {
	pub answer_id: Uuid,
	pub question_id: Uuid,
	pub author_id: String,
	pub body: String,
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct AnswerCounts {
	pub canonical: i64,
	pub variations: i64,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct GroupEvent {
	pub event_id: Uuid,
	pub question_id: Uuid,
	pub op: String,
	pub prev_snapshot: Option<Value>,
	pub new_snapshot: Option<Value>,
	pub actor: String,
	pub ts: OffsetDateTime,
}
