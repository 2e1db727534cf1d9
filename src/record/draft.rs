use serde::{Deserialize, Serialize};

use super::{Record, RecordFields};
use crate::error::ValidationError;

/// Editable, text-valued copy of a record.
///
/// `id` is `Some` when editing an existing record and `None` when creating a
/// new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorDraft {
    pub id: Option<String>,
    pub name: String,
    pub quantity: String,
    pub description: String,
}

impl EditorDraft {
    /// A blank draft for a new record.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_record(record: &Record) -> Self {
        Self {
            id: Some(record.id.clone()).filter(|id| !id.trim().is_empty()),
            name: record.name.clone(),
            quantity: record.quantity.to_string(),
            description: record.description.clone(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_quantity(mut self, quantity: impl Into<String>) -> Self {
        self.quantity = quantity.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_new(&self) -> bool {
        self.existing_id().is_none()
    }

    /// Id of the record being edited, ignoring blank ids.
    pub fn existing_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// Check the draft and produce the fields to persist.
    ///
    /// Name and description are trimmed. The quantity must parse as a
    /// non-negative integer.
    pub fn validate(&self) -> Result<RecordFields, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }

        let quantity: i64 = self
            .quantity
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidQuantity)?;
        if quantity < 0 {
            return Err(ValidationError::NegativeQuantity);
        }
        let quantity = u32::try_from(quantity).map_err(|_| ValidationError::InvalidQuantity)?;

        Ok(RecordFields {
            name: name.to_string(),
            quantity,
            description: self.description.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_draft_is_trimmed() {
        let fields = EditorDraft::new()
            .with_name("  Widget ")
            .with_quantity(" 5 ")
            .with_description(" x ")
            .validate()
            .unwrap();

        assert_eq!(
            fields,
            RecordFields {
                name: "Widget".into(),
                quantity: 5,
                description: "x".into(),
            }
        );
    }

    #[test]
    fn blank_name_is_rejected_first() {
        let err = EditorDraft::new()
            .with_name("   ")
            .with_quantity("abc")
            .validate()
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingName);
    }

    #[test]
    fn quantity_must_be_a_non_negative_integer() {
        let draft = EditorDraft::new().with_name("Widget");

        for bad in ["", "abc", "1.5", "99999999999"] {
            assert_eq!(
                draft.clone().with_quantity(bad).validate().unwrap_err(),
                ValidationError::InvalidQuantity,
                "quantity {:?}",
                bad
            );
        }
        assert_eq!(
            draft.with_quantity("-1").validate().unwrap_err(),
            ValidationError::NegativeQuantity
        );
    }

    #[test]
    fn from_record_round_trips_fields() {
        let record = Record::new("7", "Bolt", 12, "M8");
        let draft = EditorDraft::from_record(&record);

        assert_eq!(draft.existing_id(), Some("7"));
        assert!(!draft.is_new());
        assert_eq!(draft.validate().unwrap().into_record("7"), record);
    }

    #[test]
    fn blank_id_counts_as_new() {
        let draft = EditorDraft::from_record(&Record::new("", "Bolt", 1, ""));
        assert!(draft.is_new());
        assert_eq!(draft.id, None);
    }
}
