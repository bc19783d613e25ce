use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use derive_more::{Display, Error};
use log::{error, warn};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{media::BlobError, records::RecordError, store::StoreError};

pub type HResult<T> = std::result::Result<T, HandlerError>;

#[derive(Debug, Display, Error, Serialize, ToSchema)]
#[display(fmt = "{}", message)]
pub struct HandlerError {
    #[schema(example = "missing_field:blog_title")]
    pub message: String,
    #[schema(example = 400)]
    pub code: u16,
}

impl HandlerError {
    pub fn with_code(code: u16, message: String) -> Self {
        Self { message, code }
    }
}

impl ResponseError for HandlerError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

impl From<StoreError> for HandlerError {
    fn from(err: StoreError) -> Self {
        error!("persistence error: {}", err);
        Self::with_code(500, "persistence_failed".into())
    }
}

impl From<BlobError> for HandlerError {
    fn from(err: BlobError) -> Self {
        warn!("media upload failed: {}", err);
        Self::with_code(502, "upload_failed".into())
    }
}

impl From<RecordError> for HandlerError {
    fn from(err: RecordError) -> Self {
        use RecordError::*;
        match err {
            MissingImage => Self::with_code(400, "missing_image".into()),
            MissingField { field } => Self::with_code(400, format!("missing_field:{}", field)),
            PayloadTooLarge => Self::with_code(413, "payload_too_large".into()),
            MalformedForm { reason } => {
                warn!("rejected malformed upload form: {}", reason);
                Self::with_code(400, "malformed_form".into())
            }
            Upload(e) => e.into(),
            Store(e) => e.into(),
        }
    }
}

impl From<u16> for HandlerError {
    fn from(code: u16) -> Self {
        let message = match code {
            404 => "not_found".into(),
            _ => StatusCode::from_u16(code)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
                .to_string(),
        };

        Self::with_code(code, message)
    }
}

impl From<(u16, &'static str)> for HandlerError {
    fn from(tuple: (u16, &'static str)) -> Self {
        Self::with_code(tuple.0, tuple.1.into())
    }
}

pub trait IntoHandlerErrorResult<T> {
    fn or_err(self, code: u16) -> Result<T, HandlerError>;
}

impl<T, E> IntoHandlerErrorResult<T> for Result<T, E> {
    fn or_err(self, code: u16) -> Result<T, HandlerError> {
        self.map_err(|_| code.into())
    }
}

impl<T> IntoHandlerErrorResult<T> for Option<T> {
    fn or_err(self, code: u16) -> Result<T, HandlerError> {
        self.ok_or_else(|| code.into())
    }
}

pub mod macros {
macro_rules! err {
    ($code:expr, $msg:expr) => {
        Err(crate::error::HandlerError::from(($code, $msg)))
    };
}

    pub(crate) use err;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_names_the_field() {
        let err: HandlerError = RecordError::MissingField { field: "blog_title" }.into();
        assert_eq!(err.code, 400);
        assert_eq!(err.message, "missing_field:blog_title");
    }

    #[test]
    fn upstream_failures_are_bad_gateway() {
        let err: HandlerError = RecordError::Upload(BlobError::InvalidName).into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.message, "upload_failed");
    }

    #[test]
    fn none_becomes_not_found() {
        let result: HResult<()> = None.or_err(404);
        let err = result.unwrap_err();
        assert_eq!(err.code, 404);
        assert_eq!(err.message, "not_found");
    }
}
