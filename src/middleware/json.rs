use axum::extract::{FromRequest, Request, rejection::JsonRejection};

use crate::error::AppError;

/// `Json` body extractor whose rejections use the `ApiResponse` error envelope.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state).await?;
        Ok(AppJson(value))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => data_error(&err.body_text()),
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

// Body text reads "Failed to deserialize ...: <path>: <reason>"; the path is
// absent when the error sits at the document root.
fn data_error(text: &str) -> AppError {
    let detail = text
        .split_once("target type: ")
        .map_or(text, |(_, detail)| detail);
    match detail.split_once(": ") {
        Some((field, message)) if !field.contains(' ') => AppError::invalid(field, message),
        _ => AppError::invalid("body", detail),
    }
}
