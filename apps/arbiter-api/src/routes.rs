use axum::{
	Json, Router,
	extract::{State, rejection::JsonRejection},
	http::{HeaderMap, StatusCode, header::AUTHORIZATION},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use arbiter_service::{DecideRequest, DecisionResult, Error as ServiceError};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/decide", post(decide))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn decide(
	State(state): State<AppState>,
	headers: HeaderMap,
	payload: Result<Json<DecideRequest>, JsonRejection>,
) -> Result<Json<DecisionResult>, ApiError> {
	let unauthorized = state
		.auth_token()
		.is_some_and(|expected| read_bearer_token(&headers) != Some(expected));

	if unauthorized {
		return Err(ApiError::new(StatusCode::UNAUTHORIZED, "Missing or invalid bearer token."));
	}

	let Json(payload) = payload.map_err(|rejection| {
		ApiError::new(
			StatusCode::BAD_REQUEST,
			format!("Invalid request body: {}", rejection.body_text()),
		)
	})?;
	let cancel = CancellationToken::new();
	// Fires when the client disconnects and axum drops this future.
	let _guard = cancel.clone().drop_guard();
	let span = tracing::info_span!("decide", request_id = %Uuid::new_v4());
	let result = state.service.decide(payload, &cancel).instrument(span).await?;

	Ok(Json(result))
}

fn read_bearer_token(headers: &HeaderMap) -> Option<&str> {
	let raw = headers.get(AUTHORIZATION)?;
	let value = raw.to_str().ok()?.trim();
	let token = value.strip_prefix("Bearer ")?.trim();

	if token.is_empty() { None } else { Some(token) }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, message: impl Into<String>) -> Self {
		Self { status, message: message.into() }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } => Self::new(StatusCode::BAD_REQUEST, message),
			ServiceError::Configuration { message } => {
				tracing::error!(error = %message, "Configuration error while serving request.");

				Self::new(
					StatusCode::INTERNAL_SERVER_ERROR,
					"The service is misconfigured. Contact the operator.",
				)
			},
			ServiceError::ProviderUnavailable { .. } => Self::new(
				StatusCode::SERVICE_UNAVAILABLE,
				"A model provider is unavailable. Try again later.",
			),
			ServiceError::Retrieval { .. } =>
				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Knowledge base search failed."),
			ServiceError::Cancelled =>
				Self::new(StatusCode::SERVICE_UNAVAILABLE, "Request was cancelled."),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		(self.status, Json(ErrorBody { error: self.message })).into_response()
	}
}

#[cfg(test)]
mod tests {
	use axum::http::HeaderValue;

	use super::*;

	#[test]
	fn bearer_scheme_is_case_sensitive() {
		let mut headers = HeaderMap::new();

		headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer token-a"));

		assert_eq!(read_bearer_token(&headers), None);

		headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer token-a"));

		assert_eq!(read_bearer_token(&headers), Some("token-a"));
	}

	#[test]
	fn internal_messages_are_not_exposed() {
		let err = ApiError::from(ServiceError::Retrieval {
			message: "relation \"corpus_chunks\" does not exist".to_string(),
		});

		assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
		assert!(!err.message.contains("corpus_chunks"));
	}
}
