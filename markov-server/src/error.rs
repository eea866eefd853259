use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use markov_core::{GeneratorError, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	#[error(transparent)]
	Store(#[from] StoreError),

	#[error(transparent)]
	Generator(#[from] GeneratorError),

	#[error("worker pool unavailable")]
	Blocking(#[from] BlockingError),
}

impl ResponseError for ApiError {
	fn status_code(&self) -> StatusCode {
		match self {
			Self::Generator(GeneratorError::NoContinuation { .. }) => StatusCode::NOT_FOUND,
			Self::Generator(GeneratorError::TooLong(_)) => StatusCode::UNPROCESSABLE_ENTITY,
			Self::Blocking(_) => StatusCode::SERVICE_UNAVAILABLE,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn error_response(&self) -> HttpResponse {
		let status = self.status_code();
		if status.is_server_error() {
			log::error!("{self}");
		}
		HttpResponse::build(status).body(self.to_string())
	}
}
