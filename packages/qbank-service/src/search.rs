use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{BoxFuture, CandidateSearch, QbankService, Result};
use qbank_domain::similarity::{self, RankKey};
use qbank_storage::{candidates, db::Db, models::CandidateRow};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchRequest {
	pub text: String,
	#[serde(default)]
	pub exclude_id: Option<Uuid>,
	#[serde(default)]
	pub limit: Option<u32>,
}

/// A resolved candidate query handed to the [`CandidateSearch`] backend.
#[derive(Clone, Debug)]
pub struct CandidateQuery {
	pub text: String,
	pub exclude_id: Option<Uuid>,
	pub limit: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchItem {
	pub question_id: Uuid,
	pub text: String,
	pub group_id: Uuid,
	pub variation_count: i64,
	pub subject_label: Option<String>,
	pub professor_label: Option<String>,
	pub has_answer: bool,
	pub views: i64,
}
impl From<CandidateRow> for SearchItem {
	fn from(row: CandidateRow) -> Self {
		Self {
			question_id: row.question_id,
			text: row.text,
			group_id: row.group_id,
			variation_count: row.variation_count,
			subject_label: row.subject_label,
			professor_label: row.professor_label,
			has_answer: row.has_answer,
			views: row.views,
		}
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResponse {
	pub items: Vec<SearchItem>,
}

/// Substring matching on the leading query tokens.
pub struct LexicalSearch;
impl CandidateSearch for LexicalSearch {
	fn search<'a>(
		&'a self,
		db: &'a Db,
		query: &'a CandidateQuery,
	) -> BoxFuture<'a, Result<Vec<CandidateRow>>> {
		Box::pin(async move {
			let tokens = similarity::query_tokens(&query.text);

			if tokens.is_empty() || query.limit == 0 {
				tracing::debug!("Candidate search skipped; no usable tokens.");

				return Ok(Vec::new());
			}

			let patterns =
				tokens.iter().map(|token| similarity::contains_pattern(token)).collect::<Vec<_>>();
			let rows = candidates::search_canonical(
				&db.pool,
				&patterns,
				query.exclude_id,
				i64::from(query.limit),
			)
			.await?;

			tracing::debug!(?tokens, hits = rows.len(), "Candidate search finished.");

			Ok(rows)
		})
	}
}

impl QbankService {
	/// Lists canonical questions whose text shares a token with `text`. Never errors on no match.
	///
	/// Results are ranked here by [`RankKey`] and cut to the limit, whatever order the backend
	/// returned them in.
	pub async fn search_candidates(&self, req: SearchRequest) -> Result<SearchResponse> {
		let query = CandidateQuery {
			text: req.text,
			exclude_id: req.exclude_id,
			limit: similarity::clamp_limit(
				req.limit,
				self.cfg.search.default_limit,
				self.cfg.search.max_limit,
			),
		};
		let mut rows = self.search.search(&self.db, &query).await?;

		rank_candidates(&mut rows);
		rows.truncate(query.limit as usize);

		Ok(SearchResponse { items: rows.into_iter().map(SearchItem::from).collect() })
	}
}

/// Orders rows by views desc, then creation time desc, then id.
pub(crate) fn rank_candidates(rows: &mut [CandidateRow]) {
	rows.sort_by_key(|row| RankKey {
		views: row.views,
		created_at: row.created_at,
		question_id: row.question_id,
	});
}
