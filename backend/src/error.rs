use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Required fields are missing: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid {field} format")]
    InvalidFormat { field: &'static str },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Not authorized to {0}")]
    Unauthorized(&'static str),

    #[error("Could not save data: {0}")]
    Persistence(#[from] StoreError),

    #[error("Could not store upload: {0}")]
    Upload(#[source] std::io::Error),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: &str) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingFields(_) | Self::Validation(_) | Self::InvalidFormat { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::Persistence(_) | Self::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingFields(_) | Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidFormat { .. } => "INVALID_FORMAT",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Unauthorized(_) => "FORBIDDEN",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::Upload(_) => "UPLOAD_ERROR",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            Self::Persistence(ref e) => log::error!("Request failed to persist: {}", e),
            Self::Upload(ref e) => log::error!("Upload failed to store: {}", e),
            _ => {}
        }

        let mut body = json!({
            "success": false,
            "error": self.to_string(),
            "code": self.code(),
        });
        if let Self::MissingFields(ref fields) = self {
            body["missingFields"] = json!(fields);
        }

        (self.status_code(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
