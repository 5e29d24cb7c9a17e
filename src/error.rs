use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::{
    batch::BatchError,
    customization::CustomizationError,
    pricing::PromoError,
    response::{ApiResponse, Meta},
    storefront::checkout::CheckoutError,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Invalid data")]
    Validation(Vec<FieldError>),

    #[error("Not authenticated")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Conflict {0}")]
    Conflict(String),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Value must be unique".into())
            }
            _ => AppError::OrmError(err),
        }
    }
}

impl From<BatchError> for AppError {
    fn from(err: BatchError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<PromoError> for AppError {
    fn from(err: PromoError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<CustomizationError> for AppError {
    fn from(err: CustomizationError) -> Self {
        AppError::invalid("customization", err.to_string())
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Submit(source) => match source.downcast::<AppError>() {
                Ok(app) => app,
                Err(source) => AppError::Internal(source),
            },
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

impl AppError {
    /// Turn a unique-constraint violation into a 409 with a resource-specific message.
    pub fn unique(err: DbErr, message: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(message.into()),
            _ => AppError::OrmError(err),
        }
    }

    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            match &self {
                AppError::DbError(e) => tracing::error!(error = ?e, "database error"),
                AppError::OrmError(e) => tracing::error!(error = ?e, "orm error"),
                AppError::Internal(e) => tracing::error!(error = ?e, "internal error"),
                _ => {}
            }
        }

        let errors = match &self {
            AppError::Validation(errors) => Some(errors.clone()),
            _ => None,
        };

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
                errors,
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_variants_to_status_codes() {
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Conflict("Slug must be unique.".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::invalid("price", "must not be negative").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn server_errors_hide_the_cause() {
        let err = AppError::Internal(anyhow::anyhow!("password=hunter2"));
        assert_eq!(err.to_string(), "Internal Server Error");
    }

    #[test]
    fn domain_errors_are_client_errors() {
        let err: AppError = BatchError::MissingDeliveryTime(0).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let err: AppError = PromoError::NotApplicable.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let err: AppError = CustomizationError::MissingChoice("Nasi".into()).into();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn non_unique_db_errors_stay_internal() {
        let err = AppError::unique(DbErr::Custom("boom".into()), "Slug must be unique.");
        assert!(matches!(err, AppError::OrmError(_)));
    }
}
