use thiserror::Error;

/// Failure classes for the campaign provider API.
///
/// The variant is decided at the point the HTTP response is inspected;
/// nothing downstream re-parses error strings to classify a failure.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider credentials are not configured; set CAMPAIGN_PROVIDER_URL and CAMPAIGN_PROVIDER_API_KEY")]
    NotConfigured,

    #[error("provider rejected the API token (HTTP {0})")]
    AuthFailure(u16),

    #[error("campaign {0} not found")]
    NotFound(String),

    /// Non-2xx response or transport failure. `status` is `None` when the
    /// request never produced a response (timeout, DNS, connect error);
    /// `body` carries an excerpt of the upstream body for diagnostics.
    #[error("upstream request failed: {body}")]
    Upstream { status: Option<u16>, body: String },

    #[error("malformed upstream payload: {0}")]
    Validation(String),
}

impl ProviderError {
    /// Upstream HTTP status associated with this failure, when one exists.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProviderError::AuthFailure(status) => Some(*status),
            ProviderError::NotFound(_) => Some(404),
            ProviderError::Upstream { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Upstream {
            status: err.status().map(|s| s.as_u16()),
            body: err.to_string(),
        }
    }
}
