//! HTTP error responses

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use links_category_domain::StoreError;
use links_category_domain::policy::INVALID_ACCESS_KEY;
use links_category_domain::usecases::{CategoryAdminError, CreateLinkError, EditTopicError};
use serde_json::json;

const INTERNAL_ERROR_KEY: &str = "internal_error";
const NOT_FOUND_KEY: &str = "not_found";

/// An error rendered as `{ "errors": [..], "error_type": key }`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    key: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, key: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            key,
            message: message.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            NOT_FOUND_KEY,
            "The requested URL or resource could not be found.",
        )
    }

    pub fn invalid_access() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            INVALID_ACCESS_KEY,
            "You are not permitted to view the requested resource.",
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn key(&self) -> &'static str {
        self.key
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            INTERNAL_ERROR_KEY,
            err.to_string(),
        )
    }
}

impl From<CreateLinkError> for ApiError {
    fn from(err: CreateLinkError) -> Self {
        let status = match &err {
            CreateLinkError::Disabled => StatusCode::NOT_FOUND,
            CreateLinkError::PermissionDenied => StatusCode::FORBIDDEN,
            CreateLinkError::InvalidLink(_) | CreateLinkError::TitleBlank => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            CreateLinkError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.key(), err.to_string())
    }
}

impl From<EditTopicError> for ApiError {
    fn from(err: EditTopicError) -> Self {
        let status = match &err {
            EditTopicError::NotFound(_) => StatusCode::NOT_FOUND,
            EditTopicError::PermissionDenied => StatusCode::FORBIDDEN,
            EditTopicError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.key(), err.to_string())
    }
}

impl From<CategoryAdminError> for ApiError {
    fn from(err: CategoryAdminError) -> Self {
        let status = match &err {
            CategoryAdminError::PermissionDenied => StatusCode::FORBIDDEN,
            CategoryAdminError::NotFound(_) => StatusCode::NOT_FOUND,
            CategoryAdminError::NameBlank => StatusCode::UNPROCESSABLE_ENTITY,
            CategoryAdminError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.key(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Store faults never leak their details
        let message = if self.status.is_server_error() {
            tracing::error!(error = %self.message, "Request failed");
            "Internal server error".to_string()
        } else {
            self.message
        };

        let body = json!({
            "errors": [message],
            "error_type": self.key,
        });
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use links_category_domain::InvalidLinkError;

    #[test]
    fn test_status_codes() {
        let invalid = ApiError::from(CreateLinkError::InvalidLink(InvalidLinkError {
            input: "not a url".to_string(),
        }));
        assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(invalid.key(), "links_category.invalid_link");

        assert_eq!(
            ApiError::from(CreateLinkError::Disabled).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(EditTopicError::PermissionDenied).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(CategoryAdminError::NameBlank).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_store_errors_are_internal() {
        let err = ApiError::from(StoreError::Database("disk full".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.key(), INTERNAL_ERROR_KEY);
    }
}
