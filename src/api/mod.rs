// src/api/mod.rs
pub mod campaigns;
pub mod ingestion;
pub mod lists;

pub use campaigns::*;
pub use ingestion::*;
pub use lists::*;

use rocket::http::Status;
use serde::Serialize;

use crate::error::ProviderError;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// HTTP status for a provider failure. An unconfigured provider is our
/// fault (503), upstream rejections surface as bad gateway.
pub fn provider_error_status(e: &ProviderError) -> Status {
    match e {
        ProviderError::NotConfigured => Status::ServiceUnavailable,
        ProviderError::AuthFailure(_) => Status::BadGateway,
        ProviderError::NotFound(_) => Status::NotFound,
        ProviderError::Upstream { .. } => Status::BadGateway,
        ProviderError::Validation(_) => Status::InternalServerError,
    }
}
