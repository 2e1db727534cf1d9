//! Store configuration.
//!
//! # Environment Variables
//!
//! All optional:
//! - `STORE_IT_USERS_COLLECTION` - top-level collection holding one document per user (default: `users`)
//! - `STORE_IT_ITEMS_COLLECTION` - per-user sub-collection holding inventory records (default: `items`)
//! - `STORE_IT_ORDER_BY` - snapshot ordering, `name` or `insertion` (default: `name`)

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const USERS_COLLECTION_VAR: &str = "STORE_IT_USERS_COLLECTION";
pub const ITEMS_COLLECTION_VAR: &str = "STORE_IT_ITEMS_COLLECTION";
pub const ORDER_BY_VAR: &str = "STORE_IT_ORDER_BY";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Ordering applied to every snapshot the collection delivers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending by the `name` field.
    #[default]
    Name,
    /// Order in which documents were first written.
    Insertion,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(SortOrder::Name),
            "insertion" => Ok(SortOrder::Insertion),
            other => Err(format!("expected `name` or `insertion`, got `{}`", other)),
        }
    }
}

/// Layout of the per-user document collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub users_collection: String,
    pub items_collection: String,
    pub order_by: SortOrder,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            users_collection: "users".to_string(),
            items_collection: "items".to_string(),
            order_by: SortOrder::Name,
        }
    }
}

impl StoreConfig {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(users) = lookup(USERS_COLLECTION_VAR) {
            config.users_collection = non_empty(USERS_COLLECTION_VAR, users)?;
        }
        if let Some(items) = lookup(ITEMS_COLLECTION_VAR) {
            config.items_collection = non_empty(ITEMS_COLLECTION_VAR, items)?;
        }
        if let Some(order) = lookup(ORDER_BY_VAR) {
            config.order_by = order
                .parse()
                .map_err(|e| ConfigError::InvalidEnvVar(ORDER_BY_VAR.to_string(), e))?;
        }

        Ok(config)
    }

    /// Path of a user's item collection, e.g. `users/u1/items`.
    pub fn collection_path(&self, user_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.users_collection, user_id, self.items_collection
        )
    }
}

fn non_empty(var: &str, value: String) -> Result<String, ConfigError> {
    let value = value.trim();
    if value.is_empty() || value.contains('/') {
        return Err(ConfigError::InvalidEnvVar(
            var.to_string(),
            "must be a single non-empty path segment".to_string(),
        ));
    }
    Ok(value.to_string())
}
