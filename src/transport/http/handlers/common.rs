use crate::domain::error::LedgerError;
use crate::transport::http::types::ErrorBody;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

/// A status code plus the `detail` message the frontend shows.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let status = match &err {
            LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
            LedgerError::Conflict(_)
            | LedgerError::InsufficientStock { .. }
            | LedgerError::InsufficientBalance { .. }
            | LedgerError::SaleModeNotAllowed { .. }
            | LedgerError::Inactive(_) => StatusCode::CONFLICT,
            LedgerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            LedgerError::Forbidden(_) => StatusCode::FORBIDDEN,
            LedgerError::Storage(e) => {
                tracing::error!(error = %e, "storage failure");
                return ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
            }
        };
        ApiError::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

/// Unwraps a JSON body, answering 422 when it does not parse.
pub fn json_body<T>(request: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match request {
        Ok(Json(v)) => Ok(v),
        Err(e) => Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Invalid JSON body: {}", e.body_text()),
        )),
    }
}

/// Unwraps a UUID path segment; a malformed id cannot name anything, so it is a 404.
pub fn path_id(
    id: Result<Path<Uuid>, PathRejection>,
    what: &'static str,
) -> Result<Uuid, ApiError> {
    id.map(|Path(id)| id)
        .map_err(|_| LedgerError::NotFound(what).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_errors_map_to_statuses() {
        let cases = [
            (LedgerError::NotFound("User"), StatusCode::NOT_FOUND),
            (LedgerError::validation("bad"), StatusCode::BAD_REQUEST),
            (
                LedgerError::InsufficientStock {
                    requested: 5,
                    remaining: 2,
                },
                StatusCode::CONFLICT,
            ),
            (LedgerError::Inactive("Token"), StatusCode::CONFLICT),
            (LedgerError::Unauthorized("no".into()), StatusCode::UNAUTHORIZED),
            (LedgerError::Forbidden("no".into()), StatusCode::FORBIDDEN),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn storage_errors_hide_details() {
        let err = ApiError::from(LedgerError::Storage(anyhow::anyhow!("password=hunter2")));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.detail.contains("hunter2"));
    }
}
