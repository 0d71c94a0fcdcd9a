use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use log::error;
use crate::db::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    InvalidId(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Store Error: {0}")]
    Store(StoreError),
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl AppError {
    pub fn department_not_found() -> Self {
        AppError::NotFound("Cannot find department".to_string())
    }

    pub fn employee_not_found() -> Self {
        AppError::NotFound("Cannot find employee".to_string())
    }

    pub fn conflict_with_employees(count: i64) -> Self {
        AppError::Conflict(format!(
            "Cannot delete department: {} employee(s) are assigned.",
            count
        ))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateName(name) => {
                AppError::Validation(format!("Department name '{}' already exists.", name))
            }
            StoreError::ReferenceViolation(_) => AppError::Conflict(
                "Department references changed during the request; retry with current data.".to_string(),
            ),
            other => AppError::Store(other),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidId(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Store(err) => {
                error!("store failure: {}", err);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(MessageResponse::new(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use std::time::Duration;

    async fn body_message(err: AppError) -> (StatusCode, String) {
        let response = err.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (status, value["message"].as_str().unwrap().to_string())
    }

    #[actix_web::test]
    async fn conflict_is_bad_request_with_count() {
        let (status, message) = body_message(AppError::conflict_with_employees(3)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("3 employee(s)"));
    }

    #[actix_web::test]
    async fn duplicate_name_is_bad_request() {
        let (status, message) = body_message(StoreError::DuplicateName("Surgery".into()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("Surgery"));
    }

    #[actix_web::test]
    async fn reference_violation_is_bad_request_conflict() {
        let err: AppError = StoreError::ReferenceViolation("department is still assigned".into()).into();
        assert!(matches!(err, AppError::Conflict(_)));

        let (status, message) = body_message(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("Department references changed"));
    }

    #[actix_web::test]
    async fn store_failures_hide_detail() {
        let (status, message) = body_message(StoreError::Timeout(Duration::from_millis(10)).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Internal server error");
    }

    #[actix_web::test]
    async fn not_found_is_404() {
        let (status, message) = body_message(AppError::employee_not_found()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(message, "Cannot find employee");
    }
}
