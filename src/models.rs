//! Models
//!
//! Shared list item and the draft form it is built from.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::identity::ClientId;

/// Globally unique item identifier, minted by the creating client
pub type ItemId = Uuid;

/// A shared to-do item (matches the backend payload)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    /// Client that created the item; never shown
    pub client_id: ClientId,
    pub name: String,
    pub description: String,
    pub completed: bool,
}

impl Item {
    /// Create a new, not yet completed item with a fresh id
    pub fn new(client_id: ClientId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id,
            name: name.into(),
            description: description.into(),
            completed: false,
        }
    }
}

/// Field of the draft form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftField {
    Name,
    Description,
}

impl DraftField {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftField::Name => "name",
            DraftField::Description => "description",
        }
    }

    /// Map an input's `name` attribute to a field
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(DraftField::Name),
            "description" => Some(DraftField::Description),
            _ => None,
        }
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Item under construction. Local only, never synced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub name: String,
    pub description: String,
}

impl Draft {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn get(&self, field: DraftField) -> &str {
        match field {
            DraftField::Name => &self.name,
            DraftField::Description => &self.description,
        }
    }

    /// Copy of this draft with one field replaced
    pub fn with(mut self, field: DraftField, value: String) -> Self {
        match field {
            DraftField::Name => self.name = value,
            DraftField::Description => self.description = value,
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.description.is_empty()
    }

    /// Both fields are required
    pub fn validate(&self) -> Result<(), ValidationError> {
        for field in [DraftField::Name, DraftField::Description] {
            if self.get(field).is_empty() {
                return Err(ValidationError::MissingField(field));
            }
        }
        Ok(())
    }
}
