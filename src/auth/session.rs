use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{AuthMode, AuthProvider, Credentials, Identity, IdentityListener};
use crate::error::{StoreError, ValidationError};

pub const AUTH_FAILED: &str = "Authentication failed";

/// Sign-in / register form plus the identity currently signed in.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUiState {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub mode: AuthMode,
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub current_user: Option<Identity>,
}

impl fmt::Debug for AuthUiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthUiState")
            .field("email", &self.email)
            .field("mode", &self.mode)
            .field("is_loading", &self.is_loading)
            .field("error_message", &self.error_message)
            .field("current_user", &self.current_user)
            .finish_non_exhaustive()
    }
}

/// Owns the authenticated-identity signal and the credentials form.
pub struct AuthSession<P> {
    provider: P,
    state: AuthUiState,
    changes: IdentityListener,
}

impl<P: AuthProvider> AuthSession<P> {
    pub fn new(provider: P) -> Self {
        let changes = provider.on_change();
        let state = AuthUiState {
            current_user: provider.current_identity(),
            ..AuthUiState::default()
        };
        Self {
            provider,
            state,
            changes,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn state(&self) -> &AuthUiState {
        &self.state
    }

    pub fn current_identity(&self) -> Option<&Identity> {
        self.state.current_user.as_ref()
    }

    /// Drain identity transitions reported by the provider, oldest first,
    /// updating the current user for each.
    pub fn poll_identity_changes(&mut self) -> Vec<Option<Identity>> {
        let changes = self.changes.drain();
        for identity in &changes {
            self.refresh_current_user(identity.clone());
        }
        changes
    }

    pub fn refresh_current_user(&mut self, identity: Option<Identity>) {
        self.state.current_user = identity;
        self.state.is_loading = false;
        self.state.error_message = None;
    }

    pub fn on_email_changed(&mut self, value: impl Into<String>) {
        self.state.email = value.into();
        self.state.error_message = None;
    }

    pub fn on_password_changed(&mut self, value: impl Into<String>) {
        self.state.password = value.into();
        self.state.error_message = None;
    }

    pub fn on_confirm_password_changed(&mut self, value: impl Into<String>) {
        self.state.confirm_password = value.into();
        self.state.error_message = None;
    }

    pub fn toggle_mode(&mut self) {
        self.state.mode = self.state.mode.toggled();
        self.state.confirm_password.clear();
        self.state.error_message = None;
    }

    /// Load `credentials` into the form in `mode`, then [`submit`](Self::submit).
    pub fn submit_credentials(
        &mut self,
        credentials: Credentials,
        mode: AuthMode,
    ) -> Result<Identity, StoreError> {
        self.state.email = credentials.email;
        self.state.password = credentials.password;
        self.state.confirm_password = credentials.confirm_password;
        self.state.mode = mode;
        self.submit()
    }

    /// Validate the form and make exactly one sign-in or register call.
    ///
    /// On failure the provider's message is shown and the identity is left
    /// as it was.
    pub fn submit(&mut self) -> Result<Identity, StoreError> {
        if let Err(err) = self.validate() {
            self.state.error_message = Some(err.to_string());
            return Err(err.into());
        }

        self.state.is_loading = true;
        self.state.error_message = None;

        let email = self.state.email.trim().to_string();
        let result = match self.state.mode {
            AuthMode::SignIn => self.provider.sign_in(&email, &self.state.password),
            AuthMode::Register => self.provider.register(&email, &self.state.password),
        };

        match result {
            Ok(identity) => {
                info!(uid = %identity.uid, mode = ?self.state.mode, "authenticated");
                self.refresh_current_user(Some(identity.clone()));
                Ok(identity)
            }
            Err(err) => {
                warn!(mode = ?self.state.mode, error = %err, "authentication failed");
                self.state.is_loading = false;
                self.state.error_message = Some(err.message_or(AUTH_FAILED).to_string());
                Err(err.into())
            }
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.state.email.trim().is_empty() || self.state.password.trim().is_empty() {
            return Err(ValidationError::MissingCredentials);
        }
        if self.state.mode == AuthMode::Register
            && self.state.password != self.state.confirm_password
        {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(())
    }

    /// Sign out and clear the current identity at once. The provider's change
    /// is still reported by the next [`poll_identity_changes`](Self::poll_identity_changes).
    pub fn sign_out(&mut self) {
        info!("signing out");
        self.provider.sign_out();
        self.refresh_current_user(None);
    }
}
