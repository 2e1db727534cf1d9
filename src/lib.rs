//! Store-It inventory core.
//!
//! Mirrors a signed-in user's remote inventory collection into an immutable,
//! observable view, and forwards save/delete intents back to the collection.
//! The collection and the auth provider sit behind traits; in-memory
//! implementations of both are included.

pub mod app;
pub mod auth;
pub mod config;
#[cfg(feature = "emitter")]
pub mod emitter;
mod error;
pub mod inventory;
pub mod record;
pub mod remote;

pub use app::{Destination, StoreItApp};
pub use auth::{
    AuthMode, AuthProvider, AuthSession, AuthUiState, Credentials, Identity, IdentityListener,
    InMemoryAuthProvider,
};
pub use config::{ConfigError, SortOrder, StoreConfig};
pub use error::{RemoteError, StoreError, ValidationError};
pub use inventory::{InventoryStore, InventoryUiState, Notification, SubscriptionHandle};
pub use record::{Document, EditorDraft, Record, RecordFields};
pub use remote::{
    InMemoryCollection, Registration, RemoteCollection, Snapshot, SnapshotEvent, SnapshotListener,
};

// Re-export the EventEmitter from the event_emitter_rs crate
#[cfg(feature = "emitter")]
pub use event_emitter_rs::EventEmitter;
