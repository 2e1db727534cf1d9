use thiserror::Error;

/// Input rejected before any remote call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Item name is required")]
    MissingName,
    #[error("Quantity must be a number")]
    InvalidQuantity,
    #[error("Quantity cannot be negative")]
    NegativeQuantity,
    #[error("Email and password are required.")]
    MissingCredentials,
    #[error("Passwords do not match.")]
    PasswordMismatch,
}

/// Failure reported by a remote collaborator (document store or auth provider).
///
/// The message is passed through untouched so it can be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    message: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The remote's message, or `fallback` when the remote gave none.
    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.message.trim().is_empty() {
            fallback
        } else {
            &self.message
        }
    }
}

/// Error type for store and session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Remote(#[from] RemoteError),
    #[error("no user is signed in")]
    NotSignedIn,
}

impl StoreError {
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}
