use std::cmp::Ordering;

use time::OffsetDateTime;
use uuid::Uuid;

/// Upper bound on query terms; bounds the cost of the disjunctive filter.
pub const MAX_QUERY_TOKENS: usize = 5;
/// Tokens shorter than this (in characters) are dropped.
pub const MIN_TOKEN_CHARS: usize = 3;

/// Lowercases `text`, splits it on whitespace, and keeps the first [`MAX_QUERY_TOKENS`] tokens
/// that are at least [`MIN_TOKEN_CHARS`] long, in their original order.
pub fn query_tokens(text: &str) -> Vec<String> {
	text.to_lowercase()
		.split_whitespace()
		.filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
		.take(MAX_QUERY_TOKENS)
		.map(str::to_string)
		.collect()
}

/// Builds an `ILIKE` pattern matching `token` anywhere in the text. `LIKE` metacharacters in the
/// token match literally.
pub fn contains_pattern(token: &str) -> String {
	let mut out = String::with_capacity(token.len() + 2);

	out.push('%');

	for ch in token.chars() {
		if matches!(ch, '\\' | '%' | '_') {
			out.push('\\');
		}

		out.push(ch);
	}

	out.push('%');

	out
}

/// Resolves a requested result count against the configured default and ceiling.
pub fn clamp_limit(requested: Option<u32>, default_limit: u32, max_limit: u32) -> u32 {
	match requested {
		None | Some(0) => default_limit.min(max_limit),
		Some(limit) => limit.min(max_limit),
	}
}

/// Sort key for link candidates: most viewed first, then most recent, then id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RankKey {
	pub views: i64,
	pub created_at: OffsetDateTime,
	pub question_id: Uuid,
}
impl Ord for RankKey {
	fn cmp(&self, other: &Self) -> Ordering {
		other
			.views
			.cmp(&self.views)
			.then_with(|| other.created_at.cmp(&self.created_at))
			.then_with(|| self.question_id.cmp(&other.question_id))
	}
}
impl PartialOrd for RankKey {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}
