//! Inventory store - the live, per-user mirror of a remote collection.
//!
//! ```text
//!   subscribe(uid) ─▶ SnapshotListener ─▶ pump() ─▶ InventoryUiState ─▶ watchers
//!   save / delete  ─▶ RemoteCollection ─▶ (next snapshot) ─┘
//!                                 └──▶ NotificationQueue (drained by the UI)
//! ```

mod notification;
mod state;
mod store;

pub use notification::{Notification, NotificationQueue};
pub use state::InventoryUiState;
pub use store::{
    InventoryStore, SubscriptionHandle, DELETE_FAILED, ITEM_DELETED, ITEM_SAVED, LOAD_FAILED,
    SAVE_FAILED,
};
