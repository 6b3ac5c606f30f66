use thiserror::Error;

/// Every failure the client can surface to a user.
///
/// The first five variants are the booking taxonomy; the rest cover the
/// surrounding plumbing (auth, form validation, local storage, configuration).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    /// Transport or connectivity failure: no response was received.
    #[error("Network error occurred: {0}")]
    Network(String),
    /// The server answered with `success: false`.
    #[error("{0}")]
    Api(String),
    #[error("Not found: {0}")]
    NotFound(String),
    /// The payment processor rejected the payment (card declined, ...).
    /// The message is the processor's, verbatim.
    #[error("{0}")]
    Processor(String),
    /// The processor took the payment but the backend did not record it.
    #[error(
        "Your payment was received but the booking could not be confirmed: {0}. \
         Please contact support before trying to pay again."
    )]
    Reconciliation(String),
    #[error("Session expired. Please log in again.")]
    Unauthorized,
    #[error("You are not logged in. Run `tutorbook login` first.")]
    NotLoggedIn,
    #[error("Invalid booking: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BookingError {
    /// Whether resubmitting the form can make progress after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Api(_) | Self::Processor(_) | Self::Validation(_)
        )
    }
}

impl From<reqwest::Error> for BookingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Api(format!("Malformed server response: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<std::io::Error> for BookingError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for BookingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(format!("Corrupt record: {err}"))
    }
}

impl From<csv::Error> for BookingError {
    fn from(err: csv::Error) -> Self {
        Self::Storage(format!("CSV error: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconciliation_message_does_not_invite_retry() {
        let msg = BookingError::Reconciliation("session already booked".into()).to_string();
        assert!(msg.contains("payment was received"));
        assert!(msg.contains("session already booked"));
        assert!(!BookingError::Reconciliation(String::new()).is_recoverable());
    }

    #[test]
    fn test_processor_message_is_verbatim() {
        let err = BookingError::Processor("Your card was declined.".into());
        assert_eq!(err.to_string(), "Your card was declined.");
        assert!(err.is_recoverable());
    }
}
