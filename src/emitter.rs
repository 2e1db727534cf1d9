//! Broadcast store activity through an [`EventEmitter`].
//!
//! Listeners registered here run on the emitter's own threads and receive
//! owned copies of each state and notification.
//!
//! ```
//! use store_it::emitter::StateEmitter;
//! use store_it::{EditorDraft, InMemoryCollection, InventoryStore};
//!
//! let emitter = StateEmitter::new();
//! emitter.on_state(|state| println!("{} items", state.items.len()));
//!
//! let mut store = InventoryStore::new(InMemoryCollection::new());
//! emitter.attach(&mut store);
//! store.subscribe("user-1");
//! store.pump();
//!
//! let draft = EditorDraft::new().with_name("Widget").with_quantity("5");
//! store.save("user-1", &draft).unwrap();
//! assert_eq!(emitter.publish_notifications(&mut store), 1);
//! ```

use std::sync::{Arc, Mutex};

use event_emitter_rs::EventEmitter;

use crate::inventory::{InventoryStore, InventoryUiState, Notification};
use crate::remote::RemoteCollection;

pub const STATE_EVENT: &str = "inventory.state";
pub const NOTIFICATION_EVENT: &str = "inventory.notification";

/// Shared handle to an emitter carrying inventory events.
#[derive(Clone)]
pub struct StateEmitter {
    emitter: Arc<Mutex<EventEmitter>>,
}

impl Default for StateEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl StateEmitter {
    pub fn new() -> Self {
        Self::from_emitter(EventEmitter::new())
    }

    pub fn from_emitter(emitter: EventEmitter) -> Self {
        Self {
            emitter: Arc::new(Mutex::new(emitter)),
        }
    }

    pub fn on_state<F>(&self, listener: F)
    where
        F: Fn(InventoryUiState) + Send + Sync + 'static,
    {
        if let Ok(mut emitter) = self.emitter.lock() {
            emitter.on(STATE_EVENT, listener);
        }
    }

    pub fn on_notification<F>(&self, listener: F)
    where
        F: Fn(Notification) + Send + Sync + 'static,
    {
        if let Ok(mut emitter) = self.emitter.lock() {
            emitter.on(NOTIFICATION_EVENT, listener);
        }
    }

    /// Forward every future state of `store`.
    pub fn attach<C: RemoteCollection>(&self, store: &mut InventoryStore<C>) {
        let emitter = self.clone();
        store.watch(move |state| emitter.emit_state(state));
    }

    fn emit_state(&self, state: &InventoryUiState) {
        if let Ok(mut emitter) = self.emitter.lock() {
            emitter.emit(STATE_EVENT, state.clone());
        }
    }

    /// Drain the store's pending notifications onto the emitter.
    pub fn publish_notifications<C: RemoteCollection>(
        &self,
        store: &mut InventoryStore<C>,
    ) -> usize {
        let notifications = store.drain_notifications();
        let count = notifications.len();
        if let Ok(mut emitter) = self.emitter.lock() {
            for notification in notifications {
                emitter.emit(NOTIFICATION_EVENT, notification);
            }
        }
        count
    }
}
