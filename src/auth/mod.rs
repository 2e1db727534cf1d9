//! Authentication: the identity signal that decides whose inventory is shown.
//!
//! An [`AuthProvider`] owns accounts and the signed-in identity. The
//! [`AuthSession`] holds the sign-in/register form and observes identity
//! transitions through an [`IdentityListener`].

mod in_memory;
mod session;

use std::fmt;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::RemoteError;
use crate::remote::Registration;

pub use in_memory::InMemoryAuthProvider;
pub use session::{AuthSession, AuthUiState, AUTH_FAILED};

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>, email: Option<String>) -> Self {
        Self {
            uid: uid.into(),
            email,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMode {
    #[default]
    SignIn,
    Register,
}

impl AuthMode {
    pub fn toggled(self) -> Self {
        match self {
            AuthMode::SignIn => AuthMode::Register,
            AuthMode::Register => AuthMode::SignIn,
        }
    }
}

/// Form input for a sign-in or registration attempt.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    /// Only checked when registering.
    pub confirm_password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            confirm_password: String::new(),
        }
    }

    pub fn confirmed(mut self, confirm_password: impl Into<String>) -> Self {
        self.confirm_password = confirm_password.into();
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Hosted authentication.
pub trait AuthProvider: Send + Sync {
    fn current_identity(&self) -> Option<Identity>;

    /// Listen for identity transitions. The current identity is delivered
    /// immediately on registration.
    fn on_change(&self) -> IdentityListener;

    fn sign_in(&self, email: &str, password: &str) -> Result<Identity, RemoteError>;

    fn register(&self, email: &str, password: &str) -> Result<Identity, RemoteError>;

    fn sign_out(&self);
}

impl<P: AuthProvider + ?Sized> AuthProvider for Arc<P> {
    fn current_identity(&self) -> Option<Identity> {
        (**self).current_identity()
    }

    fn on_change(&self) -> IdentityListener {
        (**self).on_change()
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<Identity, RemoteError> {
        (**self).sign_in(email, password)
    }

    fn register(&self, email: &str, password: &str) -> Result<Identity, RemoteError> {
        (**self).register(email, password)
    }

    fn sign_out(&self) {
        (**self).sign_out()
    }
}

/// Receiving end of identity transitions (`None` = signed out).
///
/// Dropping the listener removes its registration.
#[derive(Debug)]
pub struct IdentityListener {
    receiver: Receiver<Option<Identity>>,
    registration: Registration,
}

impl IdentityListener {
    pub fn new(receiver: Receiver<Option<Identity>>, registration: Registration) -> Self {
        Self {
            receiver,
            registration,
        }
    }

    pub fn try_next(&self) -> Option<Option<Identity>> {
        if !self.registration.is_active() {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(identity) => Some(identity),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn drain(&self) -> Vec<Option<Identity>> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}

impl Drop for IdentityListener {
    fn drop(&mut self) {
        self.registration.remove();
    }
}
