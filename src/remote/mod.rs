//! Remote document collections.
//!
//! A [`RemoteCollection`] holds one document set per user and pushes a full,
//! ordered [`Snapshot`] to every live listener on subscribe and after every
//! change.
//!
//! ```text
//!  InventoryStore ── subscribe(uid) ──▶ RemoteCollection
//!        ▲                                   │
//!        └──── SnapshotListener ◀── Snapshot ┘ (on subscribe + every write)
//! ```
//!
//! Listeners are channels drained by their owner, so snapshots are applied on
//! the owner's thread in delivery order.

mod in_memory;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;

use crate::error::RemoteError;
use crate::record::{Document, Record, RecordFields};

pub use in_memory::InMemoryCollection;

/// A complete, ordered replica of a user's documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub documents: Vec<Document>,
}

impl Snapshot {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Decode every document, keeping snapshot order.
    pub fn records(&self) -> Vec<Record> {
        self.documents.iter().map(Record::from_document).collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// One delivery on a listener: a snapshot or a subscription failure.
pub type SnapshotEvent = Result<Snapshot, RemoteError>;

/// Per-user document collection.
pub trait RemoteCollection: Send + Sync {
    /// Open a live listener on the user's collection.
    fn subscribe(&self, user_id: &str) -> Result<SnapshotListener, RemoteError>;

    /// Insert a new document, returning the id the collection assigned.
    fn insert(&self, user_id: &str, fields: &RecordFields) -> Result<String, RemoteError>;

    /// Overwrite the whole document at `id`, creating it if absent.
    fn put(&self, user_id: &str, id: &str, fields: &RecordFields) -> Result<(), RemoteError>;

    /// Delete the document at `id`.
    fn delete(&self, user_id: &str, id: &str) -> Result<(), RemoteError>;
}

impl<C: RemoteCollection + ?Sized> RemoteCollection for Arc<C> {
    fn subscribe(&self, user_id: &str) -> Result<SnapshotListener, RemoteError> {
        (**self).subscribe(user_id)
    }

    fn insert(&self, user_id: &str, fields: &RecordFields) -> Result<String, RemoteError> {
        (**self).insert(user_id, fields)
    }

    fn put(&self, user_id: &str, id: &str, fields: &RecordFields) -> Result<(), RemoteError> {
        (**self).put(user_id, id, fields)
    }

    fn delete(&self, user_id: &str, id: &str) -> Result<(), RemoteError> {
        (**self).delete(user_id, id)
    }
}

/// Shared flag marking a listener as live. Clones observe the same flag.
#[derive(Debug, Clone)]
pub struct Registration {
    active: Arc<AtomicBool>,
}

impl Default for Registration {
    fn default() -> Self {
        Self::new()
    }
}

impl Registration {
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Detach. Idempotent.
    pub fn remove(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Receiving end of a live subscription.
///
/// Dropping the listener removes its registration.
#[derive(Debug)]
pub struct SnapshotListener {
    receiver: Receiver<SnapshotEvent>,
    registration: Registration,
}

impl SnapshotListener {
    pub fn new(receiver: Receiver<SnapshotEvent>, registration: Registration) -> Self {
        Self {
            receiver,
            registration,
        }
    }

    pub fn registration(&self) -> &Registration {
        &self.registration
    }

    pub fn is_active(&self) -> bool {
        self.registration.is_active()
    }

    /// Next pending event, if any. Nothing is returned once removed.
    pub fn try_next(&self) -> Option<SnapshotEvent> {
        if !self.is_active() {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// All pending events in delivery order.
    pub fn drain(&self) -> Vec<SnapshotEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    pub fn remove(&self) {
        self.registration.remove();
    }
}

impl Drop for SnapshotListener {
    fn drop(&mut self) {
        self.registration.remove();
    }
}
