//! InMemoryCollection - HashMap-backed document collection for tests and the offline demo data set.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::mpsc::{channel, Sender};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{Map, Value};

use super::{Registration, RemoteCollection, Snapshot, SnapshotEvent, SnapshotListener};
use crate::config::{SortOrder, StoreConfig};
use crate::error::RemoteError;
use crate::record::{Document, Record, RecordFields};

/// Internal stored representation of a document.
struct StoredDocument {
    fields: Map<String, Value>,
    /// Write order of first creation, for insertion ordering.
    created: u64,
}

struct Watcher {
    path: String,
    sender: Sender<SnapshotEvent>,
    registration: Registration,
}

#[derive(Default)]
struct Storage {
    documents: HashMap<String, StoredDocument>,
    watchers: Vec<Watcher>,
    sequence: u64,
}

/// In-memory document collection.
///
/// Storage key is `"users/<uid>/items/<id>"`. Clone-friendly via Arc: clones
/// share documents and listeners.
#[derive(Clone)]
pub struct InMemoryCollection {
    storage: Arc<RwLock<Storage>>,
    config: StoreConfig,
}

impl Default for InMemoryCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCollection {
    /// Create an empty collection with the default layout (ordered by name).
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            storage: Arc::new(RwLock::new(Storage::default())),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn make_key(path: &str, id: &str) -> String {
        format!("{}/{}", path, id)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Storage>, RemoteError> {
        self.storage
            .read()
            .map_err(|_| RemoteError::new("collection lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Storage>, RemoteError> {
        self.storage
            .write()
            .map_err(|_| RemoteError::new("collection lock poisoned"))
    }

    /// Write records as-is, keeping their ids. Records without an id get one
    /// assigned. Listeners are notified once.
    pub fn seed(&self, user_id: &str, records: &[Record]) -> Result<Vec<String>, RemoteError> {
        let path = self.config.collection_path(user_id);
        let mut storage = self.write()?;
        let mut ids = Vec::with_capacity(records.len());

        for record in records {
            let id = if record.is_persisted() {
                record.id.clone()
            } else {
                next_id(&mut storage, &path)
            };
            store_document(&mut storage, &path, &id, record.fields().to_map());
            ids.push(id);
        }

        self.broadcast(&mut storage, &path);
        Ok(ids)
    }

    /// Write a raw document, bypassing the record layout. Used to exercise
    /// decoding of malformed data.
    pub fn put_raw(
        &self,
        user_id: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), RemoteError> {
        let path = self.config.collection_path(user_id);
        let mut storage = self.write()?;
        store_document(&mut storage, &path, id, fields);
        self.broadcast(&mut storage, &path);
        Ok(())
    }

    /// Deliver `error` to every live listener on the user's collection.
    pub fn fail_listeners(&self, user_id: &str, error: RemoteError) -> Result<(), RemoteError> {
        let path = self.config.collection_path(user_id);
        let mut storage = self.write()?;
        storage.watchers.retain(|watcher| {
            if !watcher.registration.is_active() {
                return false;
            }
            if watcher.path != path {
                return true;
            }
            watcher.sender.send(Err(error.clone())).is_ok()
        });
        Ok(())
    }

    /// Current ordered documents of a user's collection.
    pub fn documents(&self, user_id: &str) -> Result<Vec<Document>, RemoteError> {
        let path = self.config.collection_path(user_id);
        let storage = self.read()?;
        Ok(self.snapshot_of(&storage, &path).documents)
    }

    /// Number of live listeners on a user's collection.
    pub fn listener_count(&self, user_id: &str) -> usize {
        let path = self.config.collection_path(user_id);
        self.read()
            .map(|storage| {
                storage
                    .watchers
                    .iter()
                    .filter(|w| w.path == path && w.registration.is_active())
                    .count()
            })
            .unwrap_or(0)
    }

    fn snapshot_of(&self, storage: &Storage, path: &str) -> Snapshot {
        let prefix = format!("{}/", path);
        let mut entries: Vec<(u64, Document)> = storage
            .documents
            .iter()
            .filter_map(|(key, stored)| {
                let id = key.strip_prefix(&prefix)?;
                Some((stored.created, Document::new(id, stored.fields.clone())))
            })
            .collect();

        match self.config.order_by {
            SortOrder::Name => entries.sort_by(|(_, a), (_, b)| {
                a.name().cmp(b.name()).then_with(|| a.id.cmp(&b.id))
            }),
            SortOrder::Insertion => entries.sort_by_key(|(created, _)| *created),
        }

        Snapshot::new(entries.into_iter().map(|(_, doc)| doc).collect())
    }

    /// Push a fresh snapshot to live listeners of `path`, pruning dead ones.
    fn broadcast(&self, storage: &mut Storage, path: &str) {
        let snapshot = self.snapshot_of(storage, path);
        storage.watchers.retain(|watcher| {
            if !watcher.registration.is_active() {
                return false;
            }
            if watcher.path != path {
                return true;
            }
            watcher.sender.send(Ok(snapshot.clone())).is_ok()
        });
    }
}

/// Generate an id not yet taken under `path`. Ids written by `put` or `seed`
/// may collide with the generated form, so taken ones are skipped.
fn next_id(storage: &mut Storage, path: &str) -> String {
    loop {
        storage.sequence += 1;
        let id = format!("item-{}", storage.sequence);
        let key = InMemoryCollection::make_key(path, &id);
        if !storage.documents.contains_key(&key) {
            return id;
        }
    }
}

fn store_document(storage: &mut Storage, path: &str, id: &str, fields: Map<String, Value>) {
    let key = InMemoryCollection::make_key(path, id);
    storage.sequence += 1;
    let created = storage.sequence;
    match storage.documents.entry(key) {
        Entry::Occupied(mut entry) => entry.get_mut().fields = fields,
        Entry::Vacant(entry) => {
            entry.insert(StoredDocument { fields, created });
        }
    }
}

impl RemoteCollection for InMemoryCollection {
    fn subscribe(&self, user_id: &str) -> Result<SnapshotListener, RemoteError> {
        let path = self.config.collection_path(user_id);
        let mut storage = self.write()?;

        storage
            .watchers
            .retain(|watcher| watcher.registration.is_active());

        let (sender, receiver) = channel();
        let registration = Registration::new();

        // Like a live query, the current state is delivered immediately.
        let initial = self.snapshot_of(&storage, &path);
        sender
            .send(Ok(initial))
            .map_err(|_| RemoteError::new("listener closed before first snapshot"))?;

        storage.watchers.push(Watcher {
            path,
            sender,
            registration: registration.clone(),
        });

        Ok(SnapshotListener::new(receiver, registration))
    }

    fn insert(&self, user_id: &str, fields: &RecordFields) -> Result<String, RemoteError> {
        let path = self.config.collection_path(user_id);
        let mut storage = self.write()?;
        let id = next_id(&mut storage, &path);
        store_document(&mut storage, &path, &id, fields.to_map());
        self.broadcast(&mut storage, &path);
        Ok(id)
    }

    fn put(&self, user_id: &str, id: &str, fields: &RecordFields) -> Result<(), RemoteError> {
        if id.trim().is_empty() {
            return Err(RemoteError::new("document id must not be empty"));
        }
        let path = self.config.collection_path(user_id);
        let mut storage = self.write()?;
        store_document(&mut storage, &path, id, fields.to_map());
        self.broadcast(&mut storage, &path);
        Ok(())
    }

    fn delete(&self, user_id: &str, id: &str) -> Result<(), RemoteError> {
        let path = self.config.collection_path(user_id);
        let key = Self::make_key(&path, id);
        let mut storage = self.write()?;

        // Deleting a missing document succeeds, as with a document store.
        if storage.documents.remove(&key).is_some() {
            self.broadcast(&mut storage, &path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(name: &str, quantity: u32) -> RecordFields {
        RecordFields {
            name: name.into(),
            quantity,
            description: String::new(),
        }
    }

    fn names(snapshot: &Snapshot) -> Vec<String> {
        snapshot.records().into_iter().map(|r| r.name).collect()
    }

    #[test]
    fn subscribe_delivers_initial_snapshot() {
        let collection = InMemoryCollection::new();
        collection.insert("u1", &fields("Bolt", 1)).unwrap();

        let listener = collection.subscribe("u1").unwrap();
        let events = listener.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(names(events[0].as_ref().unwrap()), vec!["Bolt"]);
    }

    #[test]
    fn writes_push_ordered_snapshots() {
        let collection = InMemoryCollection::new();
        let listener = collection.subscribe("u1").unwrap();
        listener.drain();

        collection.insert("u1", &fields("Washer", 3)).unwrap();
        collection.insert("u1", &fields("Anchor", 2)).unwrap();

        let events = listener.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(names(events[1].as_ref().unwrap()), vec!["Anchor", "Washer"]);
    }

    #[test]
    fn insertion_order_when_configured() {
        let collection = InMemoryCollection::with_config(StoreConfig {
            order_by: SortOrder::Insertion,
            ..StoreConfig::default()
        });
        collection.insert("u1", &fields("Washer", 3)).unwrap();
        let id = collection.insert("u1", &fields("Anchor", 2)).unwrap();
        collection.put("u1", &id, &fields("Zinc", 2)).unwrap();

        let docs = collection.documents("u1").unwrap();
        let names: Vec<_> = docs.iter().map(|d| d.name().to_string()).collect();
        assert_eq!(names, vec!["Washer", "Zinc"]);
    }

    #[test]
    fn collections_are_scoped_per_user() {
        let collection = InMemoryCollection::new();
        let other = collection.subscribe("u2").unwrap();
        other.drain();

        collection.insert("u1", &fields("Bolt", 1)).unwrap();

        assert!(other.drain().is_empty());
        assert!(collection.documents("u2").unwrap().is_empty());
        assert_eq!(collection.documents("u1").unwrap().len(), 1);
    }

    #[test]
    fn put_overwrites_whole_document() {
        let collection = InMemoryCollection::new();
        collection
            .put_raw(
                "u1",
                "a",
                json!({ "name": "Bolt", "quantity": 1, "colour": "red" })
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .unwrap();

        collection.put("u1", "a", &fields("Bolt", 9)).unwrap();

        let docs = collection.documents("u1").unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].fields.get("colour").is_none());
        assert_eq!(Record::from_document(&docs[0]).quantity, 9);
    }

    #[test]
    fn delete_removes_and_notifies() {
        let collection = InMemoryCollection::new();
        let ids = collection
            .seed("u1", &[Record::new("a", "Bolt", 1, ""), Record::new("", "Nut", 2, "")])
            .unwrap();
        assert_eq!(ids[0], "a");

        let listener = collection.subscribe("u1").unwrap();
        listener.drain();

        collection.delete("u1", "a").unwrap();
        collection.delete("u1", "missing").unwrap();

        let events = listener.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(names(events[0].as_ref().unwrap()), vec!["Nut"]);
    }

    #[test]
    fn removed_listeners_are_pruned() {
        let collection = InMemoryCollection::new();
        let listener = collection.subscribe("u1").unwrap();
        assert_eq!(collection.listener_count("u1"), 1);

        listener.remove();
        assert_eq!(collection.listener_count("u1"), 0);

        collection.insert("u1", &fields("Bolt", 1)).unwrap();
        assert!(listener.drain().is_empty());
    }

    #[test]
    fn fail_listeners_delivers_error() {
        let collection = InMemoryCollection::new();
        let listener = collection.subscribe("u1").unwrap();
        listener.drain();

        collection
            .fail_listeners("u1", RemoteError::new("permission denied"))
            .unwrap();

        let events = listener.drain();
        assert_eq!(events[0].as_ref().unwrap_err().message(), "permission denied");
    }

    #[test]
    fn insert_skips_ids_already_written() {
        let collection = InMemoryCollection::new();
        collection.put("u1", "item-2", &fields("Existing", 1)).unwrap();

        let first = collection.insert("u1", &fields("New", 2)).unwrap();
        let second = collection.insert("u1", &fields("Newer", 3)).unwrap();

        assert_ne!(first, "item-2");
        assert_ne!(second, "item-2");
        assert_ne!(first, second);
        let docs = collection.documents("u1").unwrap();
        assert_eq!(docs.len(), 3);
        let existing = docs.iter().find(|d| d.id == "item-2").unwrap();
        assert_eq!(existing.name(), "Existing");
    }

    #[test]
    fn insert_never_replaces_seeded_records() {
        let collection = InMemoryCollection::new();
        collection
            .seed(
                "u1",
                &[Record::new("item-1", "Seeded", 1, ""), Record::new("item-3", "Other", 1, "")],
            )
            .unwrap();

        for n in 0..4 {
            collection.insert("u1", &fields(&format!("Fresh {n}"), 1)).unwrap();
        }

        let docs = collection.documents("u1").unwrap();
        assert_eq!(docs.len(), 6);
        let find = |id: &str| docs.iter().find(|d| d.id == id).map(|d| d.name().to_string());
        assert_eq!(find("item-1").as_deref(), Some("Seeded"));
        assert_eq!(find("item-3").as_deref(), Some("Other"));
    }

    #[test]
    fn subscribe_prunes_removed_listeners() {
        let collection = InMemoryCollection::new();
        for _ in 0..5 {
            collection.subscribe("u1").unwrap().remove();
        }
        let _live = collection.subscribe("u1").unwrap();

        let storage = collection.read().unwrap();
        assert_eq!(storage.watchers.len(), 1);
    }

    #[test]
    fn clone_shares_storage() {
        let collection = InMemoryCollection::new();
        let clone = collection.clone();

        collection.insert("u1", &fields("Bolt", 1)).unwrap();
        assert_eq!(clone.documents("u1").unwrap().len(), 1);
    }
}
