use crate::domain::session::SessionStatus;
use thiserror::Error;

/// Failures reported by a payment gateway adapter.
///
/// Adapters never panic on processor faults; every failure is converted into
/// one of these variants at the adapter boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("processor rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("could not decode processor response: {0}")]
    Decode(String),
    #[error("scripted gateway has no {0} response left")]
    Script(&'static str),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("no authenticated payer; sign in before paying")]
    MissingIdentity,
    #[error("no order context was handed to the payment step")]
    MissingOrder,
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("cannot {operation} while the session is {status}")]
    InvalidTransition {
        operation: &'static str,
        status: SessionStatus,
    },
    #[error("a payment confirmation is already in flight")]
    ConfirmationInFlight,
    #[error("no payment session has been started")]
    NoSession,
    #[error("the payment session was cancelled")]
    Cancelled,
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
