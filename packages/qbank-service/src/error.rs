use qbank_domain::grouping::Rejection;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Invalid canonical: {message}")]
	InvalidCanonical { message: String },
	#[error("Invalid operation: {message}")]
	InvalidOperation { message: String },
	#[error("Invariant violation: {message}")]
	InvariantViolation { message: String },
	#[error("Conflict: {message}")]
	ConflictRetryable { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::ConflictRetryable { .. })
	}
}

impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		let code = match &err {
			sqlx::Error::Database(db_err) => db_err.code().map(|code| code.into_owned()),
			_ => None,
		};

		match code.as_deref() {
			// serialization_failure, deadlock_detected
			Some("40001" | "40P01") => Self::ConflictRetryable { message: err.to_string() },
			// unique_violation, foreign_key_violation, check_violation
			Some("23505" | "23503" | "23514") => {
				Self::InvariantViolation { message: err.to_string() }
			},
			_ => Self::Storage { message: err.to_string() },
		}
	}
}

impl From<qbank_storage::Error> for Error {
	fn from(err: qbank_storage::Error) -> Self {
		match err {
			qbank_storage::Error::Sqlx(inner) => Self::from(inner),
			qbank_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			qbank_storage::Error::NotFound(message) => Self::NotFound { message },
		}
	}
}

impl From<Rejection> for Error {
	fn from(rejection: Rejection) -> Self {
		let message = rejection.to_string();

		match rejection {
			Rejection::TargetNotCanonical => Self::InvalidCanonical { message },
			Rejection::SelfLink | Rejection::NotAVariation => Self::InvalidOperation { message },
		}
	}
}
