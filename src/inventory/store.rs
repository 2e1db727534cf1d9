use tracing::{debug, info, warn};

use super::notification::{Notification, NotificationQueue};
use super::state::InventoryUiState;
use crate::error::{RemoteError, StoreError};
use crate::record::{EditorDraft, Record};
use crate::remote::{RemoteCollection, SnapshotEvent, SnapshotListener};

pub const ITEM_SAVED: &str = "Item saved";
pub const ITEM_DELETED: &str = "Item deleted";
pub const LOAD_FAILED: &str = "Unable to load inventory";
pub const SAVE_FAILED: &str = "Unable to save item";
pub const DELETE_FAILED: &str = "Unable to delete item";

type StateWatcher = Box<dyn Fn(&InventoryUiState) + Send + Sync>;

/// Identifies one subscription: the user it was opened for and a generation
/// number that is never reused by the same store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    user_id: String,
    generation: u64,
}

impl SubscriptionHandle {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

struct ActiveSubscription {
    handle: SubscriptionHandle,
    /// `None` when opening the listener failed.
    listener: Option<SnapshotListener>,
}

/// Live mirror of one user's inventory.
///
/// The view is a read-through copy of the last snapshot. Writes go straight
/// to the collection and show up only once the collection pushes the next
/// snapshot; nothing is applied optimistically.
///
/// ## Example
///
/// ```
/// use store_it::{EditorDraft, InMemoryCollection, InventoryStore};
///
/// let mut store = InventoryStore::new(InMemoryCollection::new());
/// store.subscribe("user-1");
/// store.pump();
///
/// let draft = EditorDraft::new().with_name("Widget").with_quantity("5");
/// store.save("user-1", &draft).unwrap();
/// assert!(store.state().items.is_empty()); // not yet applied
///
/// store.pump();
/// assert_eq!(store.state().items[0].name, "Widget");
/// ```
pub struct InventoryStore<C> {
    collection: C,
    state: InventoryUiState,
    active: Option<ActiveSubscription>,
    generation: u64,
    notifications: NotificationQueue,
    watchers: Vec<StateWatcher>,
}

impl<C: RemoteCollection> InventoryStore<C> {
    pub fn new(collection: C) -> Self {
        Self {
            collection,
            state: InventoryUiState::default(),
            active: None,
            generation: 0,
            notifications: NotificationQueue::new(),
            watchers: Vec::new(),
        }
    }

    pub fn collection(&self) -> &C {
        &self.collection
    }

    pub fn state(&self) -> &InventoryUiState {
        &self.state
    }

    /// Register a callback invoked with every new state.
    pub fn watch<F>(&mut self, watcher: F)
    where
        F: Fn(&InventoryUiState) + Send + Sync + 'static,
    {
        self.watchers.push(Box::new(watcher));
    }

    pub fn active_subscription(&self) -> Option<&SubscriptionHandle> {
        self.active.as_ref().map(|active| &active.handle)
    }

    pub fn active_user(&self) -> Option<&str> {
        self.active_subscription().map(SubscriptionHandle::user_id)
    }

    pub fn next_notification(&mut self) -> Option<Notification> {
        self.notifications.pop()
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain()
    }

    // -- subscription lifecycle -------------------------------------------------

    /// Start mirroring `user_id`'s collection.
    ///
    /// A no-op when already subscribed to the same user. Otherwise the current
    /// subscription is torn down and its items cleared before the new one is
    /// opened.
    pub fn subscribe(&mut self, user_id: &str) -> SubscriptionHandle {
        if let Some(active) = &self.active {
            if active.handle.user_id == user_id {
                return active.handle.clone();
            }
        }

        self.detach();
        self.generation += 1;
        let handle = SubscriptionHandle {
            user_id: user_id.to_string(),
            generation: self.generation,
        };
        // The previous user's records must not stay visible to the next one.
        self.update_state(|state| {
            state.items.clear();
            state.is_loading = true;
        });

        let (listener, setup_error) = match self.collection.subscribe(user_id) {
            Ok(listener) => (Some(listener), None),
            Err(err) => (None, Some(err)),
        };
        debug!(
            user_id,
            generation = handle.generation,
            opened = listener.is_some(),
            "inventory subscription started"
        );
        self.active = Some(ActiveSubscription {
            handle: handle.clone(),
            listener,
        });

        if let Some(err) = setup_error {
            self.apply(&handle, Err(err));
        }
        handle
    }

    /// Stop mirroring and reset the view to its initial state.
    pub fn unsubscribe(&mut self) {
        self.detach();
        self.replace_state(InventoryUiState::default());
    }

    fn detach(&mut self) {
        if let Some(active) = self.active.take() {
            if let Some(listener) = active.listener {
                listener.remove();
            }
            debug!(
                user_id = %active.handle.user_id,
                generation = active.handle.generation,
                "inventory subscription detached"
            );
        }
    }

    /// Apply every event pending on the live listener, in delivery order.
    /// Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let Some(active) = &self.active else {
            return 0;
        };
        let Some(listener) = &active.listener else {
            return 0;
        };
        let origin = active.handle.clone();
        let events = listener.drain();

        let mut applied = 0;
        for event in events {
            if self.apply(&origin, event) {
                applied += 1;
            }
        }
        applied
    }

    /// Apply one event delivered for `origin`.
    ///
    /// Events from any subscription other than the active one are dropped and
    /// `false` is returned.
    pub fn apply(&mut self, origin: &SubscriptionHandle, event: SnapshotEvent) -> bool {
        let is_current = self
            .active
            .as_ref()
            .is_some_and(|active| active.handle == *origin);
        if !is_current {
            debug!(
                user_id = %origin.user_id,
                generation = origin.generation,
                "dropping event from stale subscription"
            );
            return false;
        }

        match event {
            Ok(snapshot) => {
                let items = snapshot.records();
                debug!(user_id = %origin.user_id, count = items.len(), "snapshot applied");
                self.update_state(|state| {
                    state.items = items;
                    state.is_loading = false;
                });
            }
            Err(err) => {
                warn!(user_id = %origin.user_id, error = %err, "inventory subscription failed");
                self.update_state(|state| state.is_loading = false);
                self.notify_failure(&err, LOAD_FAILED);
            }
        }
        true
    }

    // -- writes ----------------------------------------------------------------

    /// Validate `draft` and write it: insert when it has no id, full overwrite
    /// otherwise. Returns the record id.
    ///
    /// The view is not touched; the change arrives with the next snapshot.
    pub fn save(&mut self, user_id: &str, draft: &EditorDraft) -> Result<String, StoreError> {
        self.save_draft(user_id, draft, false)
    }

    fn save_draft(
        &mut self,
        user_id: &str,
        draft: &EditorDraft,
        close_editor: bool,
    ) -> Result<String, StoreError> {
        let fields = match draft.validate() {
            Ok(fields) => fields,
            Err(err) => {
                self.update_state(|state| state.error_message = Some(err.to_string()));
                return Err(err.into());
            }
        };

        self.update_state(|state| {
            state.is_saving = true;
            state.error_message = None;
        });

        let result = match draft.existing_id() {
            None => self.collection.insert(user_id, &fields),
            Some(id) => self
                .collection
                .put(user_id, id, &fields)
                .map(|()| id.to_string()),
        };

        match result {
            Ok(id) => {
                info!(user_id, id = %id, created = draft.is_new(), "item saved");
                self.update_state(|state| {
                    state.is_saving = false;
                    if close_editor {
                        state.editor = None;
                    }
                });
                self.notifications
                    .push(Notification::Message(ITEM_SAVED.to_string()));
                Ok(id)
            }
            Err(err) => {
                warn!(user_id, error = %err, "saving item failed");
                self.update_state(|state| state.is_saving = false);
                self.notify_failure(&err, SAVE_FAILED);
                Err(err.into())
            }
        }
    }

    /// Delete the record `id`. A blank id is ignored.
    pub fn delete(&mut self, user_id: &str, id: &str) -> Result<(), StoreError> {
        if id.trim().is_empty() {
            debug!(user_id, "ignoring delete without an id");
            return Ok(());
        }

        match self.collection.delete(user_id, id) {
            Ok(()) => {
                info!(user_id, id, "item deleted");
                self.notifications
                    .push(Notification::Message(ITEM_DELETED.to_string()));
                Ok(())
            }
            Err(err) => {
                warn!(user_id, id, error = %err, "deleting item failed");
                self.notify_failure(&err, DELETE_FAILED);
                Err(err.into())
            }
        }
    }

    // -- editor ----------------------------------------------------------------

    pub fn open_new_item(&mut self) {
        self.update_state(|state| {
            state.editor = Some(EditorDraft::new());
            state.error_message = None;
        });
    }

    pub fn edit_item(&mut self, record: &Record) {
        let draft = EditorDraft::from_record(record);
        self.update_state(|state| {
            state.editor = Some(draft);
            state.error_message = None;
        });
    }

    pub fn update_editor_name(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.update_editor(|draft| draft.name = value);
    }

    pub fn update_editor_quantity(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.update_editor(|draft| draft.quantity = value);
    }

    pub fn update_editor_description(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.update_editor(|draft| draft.description = value);
    }

    fn update_editor(&mut self, edit: impl FnOnce(&mut EditorDraft)) {
        if self.state.editor.is_none() {
            return;
        }
        self.update_state(|state| {
            if let Some(draft) = state.editor.as_mut() {
                edit(draft);
            }
            state.error_message = None;
        });
    }

    pub fn dismiss_editor(&mut self) {
        self.update_state(|state| {
            state.editor = None;
            state.error_message = None;
        });
    }

    /// Save the open draft and close the editor on success.
    ///
    /// Returns `Ok(None)` when no editor is open. On failure the editor stays
    /// open with the draft intact.
    pub fn save_editor(&mut self, user_id: &str) -> Result<Option<String>, StoreError> {
        let Some(draft) = self.state.editor.clone() else {
            return Ok(None);
        };
        self.save_draft(user_id, &draft, true).map(Some)
    }

    // -- state plumbing --------------------------------------------------------

    fn notify_failure(&mut self, err: &RemoteError, fallback: &str) {
        self.notifications
            .push(Notification::Error(err.message_or(fallback).to_string()));
    }

    fn update_state(&mut self, transform: impl FnOnce(&mut InventoryUiState)) {
        let mut next = self.state.clone();
        transform(&mut next);
        self.replace_state(next);
    }

    /// Swap in `next` and broadcast it. Unchanged states are not broadcast.
    fn replace_state(&mut self, next: InventoryUiState) {
        if next == self.state {
            return;
        }
        self.state = next;
        for watcher in &self.watchers {
            watcher(&self.state);
        }
    }
}
