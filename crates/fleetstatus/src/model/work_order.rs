//! Maintenance work orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::store::Update;

use super::validation::{ValidationError, Validator};
use super::{Record, RecordId};

/// Payload for opening a work order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkOrder {
    /// Vehicle the work is for.
    pub vehicle_id: RecordId,
    /// Short summary.
    pub title: String,
    /// Free-form details.
    pub description: String,
    /// Cost of the work.
    pub cost: f64,
    /// Estimated completion; ignored when `eta_is_tbd` is set.
    pub eta: Option<DateTime<Utc>>,
    /// No estimate yet.
    pub eta_is_tbd: bool,
}

impl NewWorkOrder {
    /// A payload for `vehicle_id` with every optional field at its default.
    #[must_use]
    pub fn new(vehicle_id: RecordId, title: impl Into<String>) -> Self {
        Self {
            vehicle_id,
            title: title.into(),
            description: String::new(),
            cost: 0.0,
            eta: None,
            eta_is_tbd: false,
        }
    }

    /// Check the payload without constructing a work order.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming every offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_work_order(self.vehicle_id.as_str(), &self.title, self.cost)
    }
}

fn check_work_order(vehicle_id: &str, title: &str, cost: f64) -> Result<(), ValidationError> {
    let mut v = Validator::new();
    v.require_text("vehicle_id", vehicle_id);
    v.require_text("title", title);
    v.require_non_negative("cost", cost);
    v.finish()
}

/// A maintenance task on one vehicle.
///
/// The referenced vehicle is not required to exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WorkOrderDocument")]
pub struct WorkOrder {
    #[serde(rename = "_id")]
    id: RecordId,
    vehicle_id: RecordId,
    title: String,
    description: String,
    cost: f64,
    start_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    eta: Option<DateTime<Utc>>,
    eta_is_tbd: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    completion_date: Option<DateTime<Utc>>,
    is_complete: bool,
}

impl WorkOrder {
    /// Validate `new` and open a work order started at `now`.
    ///
    /// When the payload is marked TBD its `eta` is dropped.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming every offending field.
    pub fn create(new: NewWorkOrder, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        new.validate()?;
        Ok(Self {
            id: RecordId::generate(),
            vehicle_id: new.vehicle_id,
            title: new.title.trim().to_string(),
            description: new.description,
            cost: new.cost,
            start_date: now,
            eta: if new.eta_is_tbd { None } else { new.eta },
            eta_is_tbd: new.eta_is_tbd,
            completion_date: None,
            is_complete: false,
        })
    }

    /// Identifier.
    #[must_use]
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// Referenced vehicle.
    #[must_use]
    pub fn vehicle_id(&self) -> &RecordId {
        &self.vehicle_id
    }

    /// Short summary.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Free-form details.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Cost of the work.
    #[must_use]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// When the work order was opened.
    #[must_use]
    pub fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    /// Estimated completion; always `None` while TBD.
    #[must_use]
    pub fn eta(&self) -> Option<DateTime<Utc>> {
        self.eta
    }

    /// Whether the estimate is TBD.
    #[must_use]
    pub fn eta_is_tbd(&self) -> bool {
        self.eta_is_tbd
    }

    /// When the work order was completed.
    #[must_use]
    pub fn completion_date(&self) -> Option<DateTime<Utc>> {
        self.completion_date
    }

    /// Whether the work is done.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.is_complete
    }
}

impl Record for WorkOrder {
    const COLLECTION: &'static str = "work_orders";

    type Raw = WorkOrderDocument;

    fn id(&self) -> &RecordId {
        &self.id
    }
}

/// The stored shape of a work order, before validation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
#[allow(missing_docs)]
pub struct WorkOrderDocument {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub vehicle_id: RecordId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cost: f64,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub eta: Option<DateTime<Utc>>,
    #[serde(default)]
    pub eta_is_tbd: bool,
    #[serde(default)]
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_complete: bool,
}

impl TryFrom<WorkOrderDocument> for WorkOrder {
    type Error = ValidationError;

    fn try_from(doc: WorkOrderDocument) -> Result<Self, Self::Error> {
        check_work_order(doc.vehicle_id.as_str(), &doc.title, doc.cost)?;
        Ok(Self {
            id: doc.id,
            vehicle_id: doc.vehicle_id,
            title: doc.title.trim().to_string(),
            description: doc.description,
            cost: doc.cost,
            start_date: doc.start_date,
            eta: if doc.eta_is_tbd { None } else { doc.eta },
            eta_is_tbd: doc.eta_is_tbd,
            completion_date: doc.completion_date,
            is_complete: doc.is_complete,
        })
    }
}

/// A partial update to a stored work order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkOrderUpdate {
    update: Update,
}

impl WorkOrderUpdate {
    /// Create an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rename the work order.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.update = self.update.set("title", title.into());
        self
    }

    /// Replace the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.update = self.update.set("description", description.into());
        self
    }

    /// Replace the cost.
    #[must_use]
    pub fn cost(mut self, cost: f64) -> Self {
        self.update = self.update.set("cost", json!(cost));
        self
    }

    /// Set an estimated completion and clear the TBD flag.
    #[must_use]
    pub fn eta(mut self, eta: DateTime<Utc>) -> Self {
        self.update = self
            .update
            .set("eta", json!(eta))
            .set("eta_is_tbd", false);
        self
    }

    /// Mark the estimate as TBD and drop any stored eta.
    #[must_use]
    pub fn eta_tbd(mut self) -> Self {
        self.update = self.update.set("eta_is_tbd", true).unset("eta");
        self
    }

    /// Drop the estimate without marking it TBD.
    #[must_use]
    pub fn clear_eta(mut self) -> Self {
        self.update = self.update.set("eta_is_tbd", false).unset("eta");
        self
    }

    /// Mark the work order complete at `now`.
    #[must_use]
    pub fn complete(mut self, now: DateTime<Utc>) -> Self {
        self.update = self
            .update
            .set("is_complete", true)
            .set("completion_date", json!(now));
        self
    }

    /// Reopen a completed work order.
    #[must_use]
    pub fn reopen(mut self) -> Self {
        self.update = self
            .update
            .set("is_complete", false)
            .unset("completion_date");
        self
    }

    /// Set a raw field path, or remove it with `None`.
    #[must_use]
    pub fn field(mut self, path: impl Into<String>, value: Option<Value>) -> Self {
        self.update = self.update.field(path, value);
        self
    }

    /// Check whether the update has no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.update.is_empty()
    }

    /// The underlying field-path operations.
    #[must_use]
    pub fn as_update(&self) -> &Update {
        &self.update
    }
}
