//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ledger::LedgerError;
use saga::WorkflowError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Order workflow error.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    /// Stock ledger error.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ApiError {
    fn status_and_message(self) -> (StatusCode, String) {
        match self {
            ApiError::Workflow(err) => workflow_error_to_response(err),
            ApiError::Ledger(err) => ledger_error_to_response(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "request failed");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn workflow_error_to_response(err: WorkflowError) -> (StatusCode, String) {
    let status = match &err {
        WorkflowError::NotFound { .. } => StatusCode::NOT_FOUND,
        WorkflowError::Validation(_)
        | WorkflowError::InsufficientStock { .. }
        | WorkflowError::InvalidStatus(_)
        | WorkflowError::InvalidTransition { .. }
        | WorkflowError::OrderNotCancellable { .. } => StatusCode::BAD_REQUEST,
        WorkflowError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        WorkflowError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

fn ledger_error_to_response(err: LedgerError) -> (StatusCode, String) {
    let status = match &err {
        LedgerError::StockNotFound(_) | LedgerError::ProductNotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::InsufficientStock { .. }
        | LedgerError::InsufficientReleaseAmount { .. }
        | LedgerError::InvalidQuantities(_) => StatusCode::BAD_REQUEST,
        LedgerError::DuplicateStock(_) => StatusCode::CONFLICT,
        LedgerError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{ProductId, StockId};
    use saga::Resource;

    fn status(err: impl Into<ApiError>) -> StatusCode {
        err.into().status_and_message().0
    }

    #[test]
    fn test_workflow_status_mapping() {
        assert_eq!(
            status(WorkflowError::not_found(Resource::Order, 1)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(WorkflowError::unavailable(Resource::User, "timeout")),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status(WorkflowError::InvalidStatus("LOST".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_ledger_status_mapping() {
        assert_eq!(
            status(LedgerError::DuplicateStock(ProductId::new("P"))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(LedgerError::StockNotFound(StockId::new(1))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(LedgerError::InsufficientReleaseAmount {
                stock_id: StockId::new(1),
                reserved: 0,
                requested: 1,
            }),
            StatusCode::BAD_REQUEST
        );
    }
}
