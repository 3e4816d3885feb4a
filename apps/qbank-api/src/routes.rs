use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use crate::state::AppState;
use qbank_service::{
	AddAnswerRequest, AddAnswerResponse, AuditReport, CreateRequest, CreateResponse,
	DeleteRequest, DeleteResponse, EditRequest, EditResponse, Error, GroupSummary,
	HistoryRequest, HistoryResponse, LinkRequest, LinkResponse, QuestionRequest, QuestionView,
	SearchRequest, SearchResponse, UnlinkRequest, UnlinkResponse, VariationsResponse,
	ViewResponse,
};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/questions/create", post(create_question))
		.route("/v1/questions/get", post(get_question))
		.route("/v1/questions/link", post(link_question))
		.route("/v1/questions/unlink", post(unlink_question))
		.route("/v1/questions/delete", post(delete_question))
		.route("/v1/questions/search", post(search_candidates))
		.route("/v1/questions/variations", post(get_variations))
		.route("/v1/questions/group_summary", post(get_group_summary))
		.route("/v1/questions/view", post(record_view))
		.route("/v1/questions/answer", post(add_answer))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new()
		.route("/v1/admin/questions/edit", post(edit_question))
		.route("/v1/admin/questions/history", post(question_history))
		.route("/v1/admin/groups/audit", post(audit_groups))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn create_question(
	State(state): State<AppState>,
	Json(payload): Json<CreateRequest>,
) -> Result<Json<CreateResponse>, ApiError> {
	let response = state.service.create_question(payload).await?;

	Ok(Json(response))
}

async fn get_question(
	State(state): State<AppState>,
	Json(payload): Json<QuestionRequest>,
) -> Result<Json<QuestionView>, ApiError> {
	let response = state.service.get_question(payload).await?;

	Ok(Json(response))
}

async fn link_question(
	State(state): State<AppState>,
	Json(payload): Json<LinkRequest>,
) -> Result<Json<LinkResponse>, ApiError> {
	let response = state.service.link_question(payload).await?;

	Ok(Json(response))
}

async fn unlink_question(
	State(state): State<AppState>,
	Json(payload): Json<UnlinkRequest>,
) -> Result<Json<UnlinkResponse>, ApiError> {
	let response = state.service.unlink_question(payload).await?;

	Ok(Json(response))
}

async fn delete_question(
	State(state): State<AppState>,
	Json(payload): Json<DeleteRequest>,
) -> Result<Json<DeleteResponse>, ApiError> {
	let response = state.service.delete_question(payload).await?;

	Ok(Json(response))
}

async fn search_candidates(
	State(state): State<AppState>,
	Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.search_candidates(payload).await?;

	Ok(Json(response))
}

async fn get_variations(
	State(state): State<AppState>,
	Json(payload): Json<QuestionRequest>,
) -> Result<Json<VariationsResponse>, ApiError> {
	let response = state.service.get_variations(payload).await?;

	Ok(Json(response))
}

async fn get_group_summary(
	State(state): State<AppState>,
	Json(payload): Json<QuestionRequest>,
) -> Result<Json<GroupSummary>, ApiError> {
	let response = state.service.get_group_summary(payload).await?;

	Ok(Json(response))
}

async fn record_view(
	State(state): State<AppState>,
	Json(payload): Json<QuestionRequest>,
) -> Result<Json<ViewResponse>, ApiError> {
	let response = state.service.record_view(payload).await?;

	Ok(Json(response))
}

async fn add_answer(
	State(state): State<AppState>,
	Json(payload): Json<AddAnswerRequest>,
) -> Result<Json<AddAnswerResponse>, ApiError> {
	let response = state.service.add_answer(payload).await?;

	Ok(Json(response))
}

async fn edit_question(
	State(state): State<AppState>,
	Json(payload): Json<EditRequest>,
) -> Result<Json<EditResponse>, ApiError> {
	let response = state.service.edit_question(payload).await?;

	Ok(Json(response))
}

async fn question_history(
	State(state): State<AppState>,
	Json(payload): Json<HistoryRequest>,
) -> Result<Json<HistoryResponse>, ApiError> {
	let response = state.service.question_history(payload).await?;

	Ok(Json(response))
}

async fn audit_groups(State(state): State<AppState>) -> Result<Json<AuditReport>, ApiError> {
	let response = state.service.audit_groups().await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}

	pub fn status(&self) -> StatusCode {
		self.status
	}

	pub fn error_code(&self) -> &str {
		&self.error_code
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } =>
				Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message, None),
			Error::NotFound { message } =>
				Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message, None),
			Error::InvalidCanonical { message } => Self::new(
				StatusCode::BAD_REQUEST,
				"INVALID_CANONICAL",
				message,
				Some(vec!["$.canonical_id".to_string()]),
			),
			Error::InvalidOperation { message } =>
				Self::new(StatusCode::BAD_REQUEST, "INVALID_OPERATION", message, None),
			Error::ConflictRetryable { message } =>
				Self::new(StatusCode::CONFLICT, "CONFLICT_RETRYABLE", message, None),
			Error::InvariantViolation { message } => {
				tracing::error!(%message, "Request aborted on a group invariant violation.");

				Self::new(
					StatusCode::INTERNAL_SERVER_ERROR,
					"INVARIANT_VIOLATION",
					"Internal error.",
					None,
				)
			},
			Error::Storage { message } => {
				tracing::error!(%message, "Request failed in storage.");

				Self::new(
					StatusCode::INTERNAL_SERVER_ERROR,
					"STORAGE_ERROR",
					"Internal error.",
					None,
				)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}
