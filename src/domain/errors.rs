use thiserror::Error;

/// One or more required fields were missing or malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid order submission: {}", .fields.join(", "))]
pub struct ValidationErrors {
    pub fields: Vec<String>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Order {0} already exists")]
    Conflict(String),
    #[error("Order {0} not found")]
    NotFound(String),
    #[error("Order {invoice} is already {status}")]
    AlreadyFinalized { invoice: String, status: String },
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Transport-level failure talking to the courier. A well-formed rejection
/// from the courier is not a `ProviderError`.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Courier request timed out: {0}")]
    Timeout(String),
    #[error("Courier request failed: {0}")]
    Transport(String),
    #[error("Courier responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Courier response was not valid JSON: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing identity token")]
    MissingToken,
    #[error("Invalid identity token: {0}")]
    InvalidToken(String),
    #[error("Identity verification is not configured")]
    NotConfigured,
}
