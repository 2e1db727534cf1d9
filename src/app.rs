//! StoreItApp - wires the auth session to the inventory store.
//!
//! Each identity transition picks the screen to show and, before it is
//! shown, subscribes the store to the new user or unsubscribes it on
//! sign-out.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::{AuthProvider, AuthSession, Identity};
use crate::error::StoreError;
use crate::inventory::InventoryStore;
use crate::record::Record;
use crate::remote::RemoteCollection;

/// Which screen should be visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    Auth,
    Inventory,
}

impl Destination {
    pub fn for_identity(identity: Option<&Identity>) -> Self {
        match identity {
            Some(_) => Destination::Inventory,
            None => Destination::Auth,
        }
    }
}

pub struct StoreItApp<P, C> {
    auth: AuthSession<P>,
    inventory: InventoryStore<C>,
    destination: Destination,
}

impl<P: AuthProvider, C: RemoteCollection> StoreItApp<P, C> {
    /// Build the app and apply the provider's current identity.
    pub fn new(provider: P, collection: C) -> Self {
        let auth = AuthSession::new(provider);
        let destination = Destination::for_identity(auth.current_identity());
        let mut app = Self {
            auth,
            inventory: InventoryStore::new(collection),
            destination,
        };
        app.pump();
        app
    }

    pub fn auth(&self) -> &AuthSession<P> {
        &self.auth
    }

    pub fn auth_mut(&mut self) -> &mut AuthSession<P> {
        &mut self.auth
    }

    pub fn inventory(&self) -> &InventoryStore<C> {
        &self.inventory
    }

    pub fn inventory_mut(&mut self) -> &mut InventoryStore<C> {
        &mut self.inventory
    }

    pub fn destination(&self) -> Destination {
        self.destination
    }

    pub fn current_user(&self) -> Option<&Identity> {
        self.auth.current_identity()
    }

    /// Apply pending identity transitions, then pending snapshots.
    pub fn pump(&mut self) {
        for identity in self.auth.poll_identity_changes() {
            self.on_identity_changed(identity.as_ref());
        }
        self.inventory.pump();
    }

    fn on_identity_changed(&mut self, identity: Option<&Identity>) {
        match identity {
            Some(identity) => {
                self.inventory.subscribe(&identity.uid);
            }
            None => self.inventory.unsubscribe(),
        }

        let destination = Destination::for_identity(identity);
        if destination != self.destination {
            debug!(from = ?self.destination, to = ?destination, "navigating");
            self.destination = destination;
        }
    }

    pub fn submit(&mut self) -> Result<Identity, StoreError> {
        let result = self.auth.submit();
        self.pump();
        result
    }

    pub fn sign_out(&mut self) {
        self.auth.sign_out();
        self.pump();
    }

    fn user_id(&self) -> Result<String, StoreError> {
        self.current_user()
            .map(|identity| identity.uid.clone())
            .ok_or(StoreError::NotSignedIn)
    }

    /// Save the open editor draft for the signed-in user.
    pub fn save_editor(&mut self) -> Result<Option<String>, StoreError> {
        let user_id = self.user_id()?;
        let saved = self.inventory.save_editor(&user_id)?;
        self.inventory.pump();
        Ok(saved)
    }

    /// Delete `record` for the signed-in user.
    pub fn delete_item(&mut self, record: &Record) -> Result<(), StoreError> {
        let user_id = self.user_id()?;
        self.inventory.delete(&user_id, &record.id)?;
        self.inventory.pump();
        Ok(())
    }
}
