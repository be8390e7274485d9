//! Fleet record model.
//!
//! Records are validated when they are constructed and again whenever they
//! are decoded from a stored document, so a [`Vehicle`] or [`WorkOrder`]
//! value always satisfies its invariants.

pub mod validation;
pub mod vehicle;
pub mod work_order;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::store::Document;

pub use validation::{FieldError, ValidationError};
pub use vehicle::{
    Condition, Documentation, NewVehicle, NonRunningDetails, Unavailability, Vehicle,
    VehicleDocument, VehicleUpdate,
};
pub use work_order::{NewWorkOrder, WorkOrder, WorkOrderDocument, WorkOrderUpdate};

/// Opaque record identifier, generated on creation and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generate a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A record persisted as one document of a collection.
///
/// The in-memory `id` is stored as the document's `_id`; everything else
/// keeps its field name.
pub trait Record: Serialize + DeserializeOwned {
    /// Collection holding records of this type.
    const COLLECTION: &'static str;

    /// The unvalidated stored shape of the record.
    type Raw: DeserializeOwned + TryInto<Self, Error = ValidationError>;

    /// The record's identifier.
    fn id(&self) -> &RecordId;

    /// Encode the record as a store document.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not serialize to a JSON object.
    fn to_document(&self) -> Result<Document> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(ValidationError::new(Self::COLLECTION, "record is not an object").into()),
        }
    }

    /// Decode and validate a store document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the document is malformed or breaks
    /// one of the record's invariants.
    fn from_document(doc: Document) -> Result<Self> {
        let raw: Self::Raw = serde_json::from_value(Value::Object(doc))
            .map_err(|e| Error::Validation(ValidationError::new("document", e.to_string())))?;
        Ok(raw.try_into()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = RecordId::generate();
        let b = RecordId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn test_record_id_serializes_as_string() {
        let id = RecordId::new("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
        assert_eq!(id.to_string(), "abc");
        assert_eq!(RecordId::from("abc"), id);
    }
}
