use serde::Serialize;
use uuid::Uuid;

use crate::gateway::GatewayError;

/// Error type shared by all engine services.
///
/// Gateway failures are converted into user-visible notifications at the
/// orchestration boundary; nothing here is ever allowed to escape as a panic
/// into the presentation layer, and no variant triggers an automatic retry.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Gateway error: {0}")]
    Gateway(
        #[from]
        #[serde(skip)]
        GatewayError,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Concurrent modification: {0}")]
    ConcurrentModification(Uuid),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// The message a user should see for this failure, preferring whatever
    /// the server reported over the local rendering.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Gateway(err) => err
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string()),
            other => other.to_string(),
        }
    }
}
