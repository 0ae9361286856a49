use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
};
use serde_json::json;
use axum::Json;
use thiserror::Error;

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// The only failures the analysis engine surfaces. Malformed cells never
/// end up here; they degrade to null/zero/skip inside the calculators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// Headers and rows do not describe a rectangular dataset.
    #[error("structural input error: {0}")]
    StructuralInput(String),

    /// A chart request named a column the dataset does not declare.
    #[error("unknown column: {0}")]
    UnknownColumn(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File processing error: {0}")]
    FileProcessingError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Analysis(AnalysisError::StructuralInput(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Analysis(AnalysisError::UnknownColumn(_)) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::FileProcessingError(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_errors_map_to_client_statuses() {
        let missing = AppError::from(AnalysisError::UnknownColumn("Profit".to_string()));
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let ragged = AppError::from(AnalysisError::StructuralInput("row 2 lacks 'Sales'".to_string()));
        assert_eq!(ragged.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn analysis_error_message_names_the_column() {
        let err = AnalysisError::UnknownColumn("Profit".to_string());
        assert_eq!(err.to_string(), "unknown column: Profit");
        assert_eq!(AppError::from(err).to_string(), "unknown column: Profit");
    }
}
