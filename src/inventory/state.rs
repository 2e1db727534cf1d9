use serde::{Deserialize, Serialize};

use crate::record::{EditorDraft, Record};

/// Everything the inventory screen renders.
///
/// Never mutated in place by the store: every transition builds a new value
/// and hands it to the watchers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryUiState {
    /// Records of the last snapshot, in snapshot order.
    pub items: Vec<Record>,
    pub is_loading: bool,
    pub is_saving: bool,
    /// Inline editor validation message.
    pub error_message: Option<String>,
    pub editor: Option<EditorDraft>,
}

impl InventoryUiState {
    pub fn find(&self, id: &str) -> Option<&Record> {
        self.items.iter().find(|record| record.id == id)
    }

    pub fn is_editing(&self) -> bool {
        self.editor.is_some()
    }
}
