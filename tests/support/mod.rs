//! Collaborator doubles that count remote calls and can be told to fail.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use store_it::{
    AuthProvider, Identity, IdentityListener, InMemoryAuthProvider, InMemoryCollection,
    RecordFields, RemoteCollection, RemoteError, SnapshotListener,
};

#[derive(Default)]
struct Calls {
    subscribe: AtomicUsize,
    insert: AtomicUsize,
    put: AtomicUsize,
    delete: AtomicUsize,
}

/// Wraps an [`InMemoryCollection`], counting every call.
#[derive(Clone)]
pub struct RecordingCollection {
    pub inner: InMemoryCollection,
    calls: Arc<Calls>,
    failure: Arc<Mutex<Option<RemoteError>>>,
}

impl RecordingCollection {
    pub fn new() -> Self {
        Self {
            inner: InMemoryCollection::new(),
            calls: Arc::new(Calls::default()),
            failure: Arc::new(Mutex::new(None)),
        }
    }

    /// Make every following call fail with `message`.
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(RemoteError::new(message));
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    fn check(&self) -> Result<(), RemoteError> {
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn subscribe_calls(&self) -> usize {
        self.calls.subscribe.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.calls.insert.load(Ordering::SeqCst)
            + self.calls.put.load(Ordering::SeqCst)
            + self.calls.delete.load(Ordering::SeqCst)
    }

    pub fn insert_calls(&self) -> usize {
        self.calls.insert.load(Ordering::SeqCst)
    }

    pub fn put_calls(&self) -> usize {
        self.calls.put.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.calls.delete.load(Ordering::SeqCst)
    }
}

impl RemoteCollection for RecordingCollection {
    fn subscribe(&self, user_id: &str) -> Result<SnapshotListener, RemoteError> {
        self.calls.subscribe.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.subscribe(user_id)
    }

    fn insert(&self, user_id: &str, fields: &RecordFields) -> Result<String, RemoteError> {
        self.calls.insert.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.insert(user_id, fields)
    }

    fn put(&self, user_id: &str, id: &str, fields: &RecordFields) -> Result<(), RemoteError> {
        self.calls.put.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.put(user_id, id, fields)
    }

    fn delete(&self, user_id: &str, id: &str) -> Result<(), RemoteError> {
        self.calls.delete.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.delete(user_id, id)
    }
}

/// Wraps an [`InMemoryAuthProvider`], counting sign-in and register calls.
#[derive(Clone)]
pub struct RecordingAuth {
    pub inner: InMemoryAuthProvider,
    calls: Arc<AtomicUsize>,
}

impl RecordingAuth {
    pub fn new(inner: InMemoryAuthProvider) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn remote_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AuthProvider for RecordingAuth {
    fn current_identity(&self) -> Option<Identity> {
        self.inner.current_identity()
    }

    fn on_change(&self) -> IdentityListener {
        self.inner.on_change()
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<Identity, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.sign_in(email, password)
    }

    fn register(&self, email: &str, password: &str) -> Result<Identity, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.register(email, password)
    }

    fn sign_out(&self) {
        self.inner.sign_out()
    }
}
