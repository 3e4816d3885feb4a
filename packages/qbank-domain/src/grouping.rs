//! Duplicate-group rules.
//!
//! A group is the set of questions sharing a `group_id`. Exactly one member is canonical and every
//! other member points at it through `canonical_id`. The functions here plan transitions from a
//! snapshot of the rows involved and check the result; they never touch storage.

use std::{
	collections::BTreeMap,
	fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use qbank_config::DeletePolicy;

/// The group-related columns of one question row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
	pub question_id: Uuid,
	pub group_id: Uuid,
	pub is_canonical: bool,
	pub canonical_id: Option<Uuid>,
	pub created_at: OffsetDateTime,
}
impl Member {
	/// A freshly submitted question: its own singleton group.
	pub fn singleton(question_id: Uuid, created_at: OffsetDateTime) -> Self {
		Self {
			question_id,
			group_id: question_id,
			is_canonical: true,
			canonical_id: None,
			created_at,
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	SingletonCanonical,
	GroupCanonical,
	Variation,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupOp {
	Create,
	Link,
	Repoint,
	Unlink,
	Promote,
	Dissolve,
	Delete,
	Edit,
}
impl GroupOp {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Create => "CREATE",
			Self::Link => "LINK",
			Self::Repoint => "REPOINT",
			Self::Unlink => "UNLINK",
			Self::Promote => "PROMOTE",
			Self::Dissolve => "DISSOLVE",
			Self::Delete => "DELETE",
			Self::Edit => "EDIT",
		}
	}
}

/// New values for the three group columns of one row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assignment {
	pub question_id: Uuid,
	pub group_id: Uuid,
	pub is_canonical: bool,
	pub canonical_id: Option<Uuid>,
	pub op: GroupOp,
}
impl Assignment {
	fn canonical_of_own_group(question_id: Uuid, op: GroupOp) -> Self {
		Self { question_id, group_id: question_id, is_canonical: true, canonical_id: None, op }
	}

	fn variation_of(question_id: Uuid, canonical: &Member, op: GroupOp) -> Self {
		Self {
			question_id,
			group_id: canonical.group_id,
			is_canonical: false,
			canonical_id: Some(canonical.question_id),
			op,
		}
	}

	pub fn apply_to(&self, member: &mut Member) {
		member.group_id = self.group_id;
		member.is_canonical = self.is_canonical;
		member.canonical_id = self.canonical_id;
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
	/// The question was asked to link to itself.
	SelfLink,
	/// The link target is not the canonical of its group.
	TargetNotCanonical,
	/// Only variations can be unlinked.
	NotAVariation,
}
impl Display for Rejection {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::SelfLink => write!(f, "A question cannot be linked to itself."),
			Self::TargetNotCanonical => write!(f, "Link target is not a canonical question."),
			Self::NotAVariation => write!(f, "Question is not a variation."),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkPlan {
	/// The question already belongs to the target's group.
	AlreadyLinked,
	Apply { writes: Vec<Assignment> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeletePlan {
	/// Rows that must be rewritten before the deleted row goes away.
	pub writes: Vec<Assignment>,
	/// Groups that exist after the delete and must be rechecked.
	pub affected_groups: Vec<Uuid>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Breach {
	Empty,
	ForeignMember { question_id: Uuid },
	NoCanonical,
	MultipleCanonicals { question_ids: Vec<Uuid> },
	CanonicalWithReference { question_id: Uuid },
	DanglingReference { question_id: Uuid, canonical_id: Option<Uuid> },
}
impl Display for Breach {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Empty => write!(f, "group has no members"),
			Self::ForeignMember { question_id } => {
				write!(f, "question {question_id} carries a different group_id")
			},
			Self::NoCanonical => write!(f, "group has no canonical question"),
			Self::MultipleCanonicals { question_ids } => {
				write!(f, "group has {} canonical questions", question_ids.len())
			},
			Self::CanonicalWithReference { question_id } => {
				write!(f, "canonical question {question_id} has a canonical_id")
			},
			Self::DanglingReference { question_id, canonical_id } => match canonical_id {
				Some(canonical_id) => write!(
					f,
					"question {question_id} references {canonical_id}, which is not the group's canonical"
				),
				None => write!(f, "variation {question_id} has no canonical_id"),
			},
		}
	}
}

pub fn role(member: &Member, group_size: usize) -> Role {
	match (member.is_canonical, group_size) {
		(false, _) => Role::Variation,
		(true, 0 | 1) => Role::SingletonCanonical,
		(true, _) => Role::GroupCanonical,
	}
}

/// Plans attaching `question` to the group whose canonical is `canonical`.
///
/// `question_group` holds every member of the question's current group, the question included.
/// When the question is itself a canonical, its whole group follows it into the target group.
pub fn plan_link(
	question: &Member,
	question_group: &[Member],
	canonical: &Member,
) -> Result<LinkPlan, Rejection> {
	if question.question_id == canonical.question_id {
		return Err(Rejection::SelfLink);
	}
	if !canonical.is_canonical {
		return Err(Rejection::TargetNotCanonical);
	}
	if question.group_id == canonical.group_id {
		return Ok(LinkPlan::AlreadyLinked);
	}

	let mut writes = vec![Assignment::variation_of(question.question_id, canonical, GroupOp::Link)];

	if question.is_canonical {
		writes.extend(
			sorted_others(question_group, question.question_id)
				.into_iter()
				.filter(|member| member.group_id == question.group_id)
				.map(|member| {
					Assignment::variation_of(member.question_id, canonical, GroupOp::Repoint)
				}),
		);
	}

	Ok(LinkPlan::Apply { writes })
}

pub fn plan_unlink(question: &Member) -> Result<Assignment, Rejection> {
	if question.is_canonical {
		return Err(Rejection::NotAVariation);
	}

	Ok(Assignment::canonical_of_own_group(question.question_id, GroupOp::Unlink))
}

/// Plans the rewrites needed before `question` can be deleted without leaving a dangling
/// `canonical_id` behind.
pub fn plan_delete(question: &Member, group: &[Member], policy: DeletePolicy) -> DeletePlan {
	let variations = if question.is_canonical {
		sorted_others(group, question.question_id)
			.into_iter()
			.filter(|member| member.group_id == question.group_id)
			.collect::<Vec<_>>()
	} else {
		Vec::new()
	};

	if variations.is_empty() {
		let affected_groups =
			if question.is_canonical { Vec::new() } else { vec![question.group_id] };

		return DeletePlan { writes: Vec::new(), affected_groups };
	}

	match policy {
		DeletePolicy::Dissolve => {
			let writes = variations
				.iter()
				.map(|member| {
					Assignment::canonical_of_own_group(member.question_id, GroupOp::Dissolve)
				})
				.collect::<Vec<_>>();
			let affected_groups = writes.iter().map(|write| write.group_id).collect();

			DeletePlan { writes, affected_groups }
		},
		DeletePolicy::PromoteOldest => {
			let Some(heir) = variations
				.iter()
				.min_by(|left, right| {
					left.created_at
						.cmp(&right.created_at)
						.then_with(|| left.question_id.cmp(&right.question_id))
				})
				.map(|member| Member::singleton(member.question_id, member.created_at))
			else {
				return DeletePlan { writes: Vec::new(), affected_groups: Vec::new() };
			};
			let mut writes =
				vec![Assignment::canonical_of_own_group(heir.question_id, GroupOp::Promote)];

			writes.extend(
				variations
					.iter()
					.filter(|member| member.question_id != heir.question_id)
					.map(|member| {
						Assignment::variation_of(member.question_id, &heir, GroupOp::Repoint)
					}),
			);

			DeletePlan { writes, affected_groups: vec![heir.group_id] }
		},
	}
}

/// Checks one group against the group invariants.
pub fn check_group(group_id: Uuid, members: &[Member]) -> Result<(), Breach> {
	if members.is_empty() {
		return Err(Breach::Empty);
	}

	if let Some(member) = members.iter().find(|member| member.group_id != group_id) {
		return Err(Breach::ForeignMember { question_id: member.question_id });
	}

	let canonicals = members.iter().filter(|member| member.is_canonical).collect::<Vec<_>>();
	let canonical = match canonicals.as_slice() {
		[] => return Err(Breach::NoCanonical),
		[canonical] => *canonical,
		many => {
			let mut question_ids = many.iter().map(|member| member.question_id).collect::<Vec<_>>();

			question_ids.sort();

			return Err(Breach::MultipleCanonicals { question_ids });
		},
	};

	if canonical.canonical_id.is_some() {
		return Err(Breach::CanonicalWithReference { question_id: canonical.question_id });
	}

	for member in members.iter().filter(|member| !member.is_canonical) {
		if member.canonical_id != Some(canonical.question_id) {
			return Err(Breach::DanglingReference {
				question_id: member.question_id,
				canonical_id: member.canonical_id,
			});
		}
	}

	Ok(())
}

/// Partitions `members` by `group_id` and checks every group.
pub fn audit(members: &[Member]) -> Vec<(Uuid, Breach)> {
	let mut groups: BTreeMap<Uuid, Vec<Member>> = BTreeMap::new();

	for member in members {
		groups.entry(member.group_id).or_default().push(member.clone());
	}

	groups
		.into_iter()
		.filter_map(|(group_id, members)| {
			check_group(group_id, &members).err().map(|breach| (group_id, breach))
		})
		.collect()
}

fn sorted_others(group: &[Member], question_id: Uuid) -> Vec<&Member> {
	let mut others =
		group.iter().filter(|member| member.question_id != question_id).collect::<Vec<_>>();

	others.sort_by_key(|member| member.question_id);

	others
}
