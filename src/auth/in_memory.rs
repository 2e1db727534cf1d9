//! InMemoryAuthProvider - email/password accounts kept in a HashMap.

use std::collections::HashMap;
use std::sync::mpsc::{channel, Sender};
use std::sync::{Arc, RwLock};

use tracing::debug;

use super::{AuthProvider, Identity, IdentityListener};
use crate::error::RemoteError;
use crate::remote::Registration;

pub const MIN_PASSWORD_LENGTH: usize = 6;

const BADLY_FORMATTED_EMAIL: &str = "The email address is badly formatted.";
const EMAIL_IN_USE: &str = "The email address is already in use by another account.";
const WEAK_PASSWORD: &str =
    "The given password is invalid. [ Password should be at least 6 characters ]";
const UNKNOWN_USER: &str =
    "There is no user record corresponding to this identifier. The user may have been deleted.";
const WRONG_PASSWORD: &str = "The password is invalid or the user does not have a password.";

struct Account {
    uid: String,
    email: String,
    password: String,
}

impl Account {
    fn identity(&self) -> Identity {
        Identity::new(self.uid.clone(), Some(self.email.clone()))
    }
}

struct Watcher {
    sender: Sender<Option<Identity>>,
    registration: Registration,
}

#[derive(Default)]
struct AuthStorage {
    /// Keyed by lower-cased email.
    accounts: HashMap<String, Account>,
    current: Option<Identity>,
    watchers: Vec<Watcher>,
    sequence: u64,
}

impl AuthStorage {
    fn create_account(&mut self, email: &str, password: &str) -> Identity {
        self.sequence += 1;
        let account = Account {
            uid: format!("uid-{}", self.sequence),
            email: email.to_string(),
            password: password.to_string(),
        };
        let identity = account.identity();
        self.accounts.insert(email.to_lowercase(), account);
        identity
    }

    fn set_current(&mut self, identity: Option<Identity>) {
        self.current = identity;
        let current = self.current.clone();
        self.watchers.retain(|watcher| {
            watcher.registration.is_active() && watcher.sender.send(current.clone()).is_ok()
        });
    }
}

/// In-memory authentication provider.
///
/// Clone-friendly via Arc: clones share accounts, the signed-in identity and
/// listeners. [`with_account`](Self::with_account) installs fixed credentials
/// without any format checks, e.g. a demo `admin` / `1234` login.
#[derive(Clone)]
pub struct InMemoryAuthProvider {
    storage: Arc<RwLock<AuthStorage>>,
}

impl Default for InMemoryAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAuthProvider {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(AuthStorage::default())),
        }
    }

    /// Add an account, skipping registration rules.
    pub fn with_account(self, email: &str, password: &str) -> Self {
        if let Ok(mut storage) = self.storage.write() {
            storage.create_account(email, password);
        }
        self
    }

    /// Identity of a known account.
    pub fn identity_for(&self, email: &str) -> Option<Identity> {
        let storage = self.storage.read().ok()?;
        storage
            .accounts
            .get(&email.to_lowercase())
            .map(Account::identity)
    }

    fn lock_error() -> RemoteError {
        RemoteError::new("auth provider lock poisoned")
    }
}

impl AuthProvider for InMemoryAuthProvider {
    fn current_identity(&self) -> Option<Identity> {
        self.storage
            .read()
            .ok()
            .and_then(|storage| storage.current.clone())
    }

    fn on_change(&self) -> IdentityListener {
        let (sender, receiver) = channel();
        let registration = Registration::new();

        if let Ok(mut storage) = self.storage.write() {
            if sender.send(storage.current.clone()).is_ok() {
                storage.watchers.push(Watcher {
                    sender,
                    registration: registration.clone(),
                });
            }
        }

        IdentityListener::new(receiver, registration)
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<Identity, RemoteError> {
        let mut storage = self.storage.write().map_err(|_| Self::lock_error())?;
        let identity = {
            let account = storage
                .accounts
                .get(&email.to_lowercase())
                .ok_or_else(|| RemoteError::new(UNKNOWN_USER))?;
            if account.password != password {
                return Err(RemoteError::new(WRONG_PASSWORD));
            }
            account.identity()
        };

        debug!(uid = %identity.uid, "signed in");
        storage.set_current(Some(identity.clone()));
        Ok(identity)
    }

    fn register(&self, email: &str, password: &str) -> Result<Identity, RemoteError> {
        let (local, domain) = email
            .split_once('@')
            .ok_or_else(|| RemoteError::new(BADLY_FORMATTED_EMAIL))?;
        if local.is_empty() || domain.is_empty() || email.chars().any(char::is_whitespace) {
            return Err(RemoteError::new(BADLY_FORMATTED_EMAIL));
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(RemoteError::new(WEAK_PASSWORD));
        }

        let mut storage = self.storage.write().map_err(|_| Self::lock_error())?;
        if storage.accounts.contains_key(&email.to_lowercase()) {
            return Err(RemoteError::new(EMAIL_IN_USE));
        }

        let identity = storage.create_account(email, password);
        debug!(uid = %identity.uid, "registered");
        storage.set_current(Some(identity.clone()));
        Ok(identity)
    }

    fn sign_out(&self) {
        if let Ok(mut storage) = self.storage.write() {
            if storage.current.is_some() {
                debug!("signed out");
                storage.set_current(None);
            }
        }
    }
}
