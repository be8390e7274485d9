//! Fleet repository.
//!
//! [`FleetRepository`] is the only component that talks to the document
//! store. Store failures never escape it: they are logged and reported as an
//! empty read or a failed write. Validation failures are returned to the
//! caller so they can be shown field by field.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::model::{
    NewVehicle, NewWorkOrder, Record, RecordId, ValidationError, Vehicle, VehicleUpdate,
    WorkOrder, WorkOrderUpdate,
};
use crate::store::{Document, DocumentStore, ID_FIELD};

/// Field holding a vehicle's display name.
const ALIAS_FIELD: &str = "alias";

/// Field of a work order referencing its vehicle.
const VEHICLE_REF_FIELD: &str = "vehicle_id";

/// Vehicles and work orders on top of a [`DocumentStore`].
///
/// A repository built without a store (because the connection failed at
/// startup) answers every read with nothing and every write with failure.
#[derive(Debug)]
pub struct FleetRepository {
    store: Option<DocumentStore>,
    clock: Box<dyn Clock>,
}

impl FleetRepository {
    /// Open the configured store.
    ///
    /// A store that cannot be opened is logged and leaves the repository
    /// disconnected.
    #[must_use]
    pub fn connect(config: &DatabaseConfig) -> Self {
        match DocumentStore::open(&config.uri, config.name.clone()) {
            Ok(store) => Self::with_store(store),
            Err(e) => {
                error!("Failed to connect to document store: {}", e);
                Self::disconnected()
            }
        }
    }

    /// Wrap an already opened store.
    #[must_use]
    pub fn with_store(store: DocumentStore) -> Self {
        Self {
            store: Some(store),
            clock: Box::new(SystemClock),
        }
    }

    /// A repository with no store behind it.
    #[must_use]
    pub fn disconnected() -> Self {
        Self {
            store: None,
            clock: Box::new(SystemClock),
        }
    }

    /// Replace the clock used for "today" and completion timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Whether a store is attached and answering.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.store.as_ref().is_some_and(|s| s.ping().is_ok())
    }

    /// The underlying store, if connected.
    #[must_use]
    pub fn store(&self) -> Option<&DocumentStore> {
        self.store.as_ref()
    }

    /// The current date according to the repository clock.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    fn store_or_err(&self) -> Result<&DocumentStore> {
        self.store.as_ref().ok_or(Error::NotConnected)
    }

    // ------------------------------------------------------------------
    // Vehicles
    // ------------------------------------------------------------------

    /// All vehicles, in insertion order.
    ///
    /// Documents that fail validation are skipped with a warning.
    #[must_use]
    pub fn get_all_vehicles(&self) -> Vec<Vehicle> {
        self.read("list vehicles", |store| {
            Ok(decode_all(store.find_all(Vehicle::COLLECTION)?))
        })
        .unwrap_or_default()
    }

    /// A vehicle by id.
    #[must_use]
    pub fn get_vehicle_by_id(&self, id: &RecordId) -> Option<Vehicle> {
        self.read("get vehicle", |store| {
            store
                .find_one(Vehicle::COLLECTION, id.as_str())?
                .map(Vehicle::from_document)
                .transpose()
        })
        .flatten()
    }

    /// A vehicle by alias; surrounding whitespace is ignored.
    #[must_use]
    pub fn find_vehicle_by_alias(&self, alias: &str) -> Option<Vehicle> {
        self.read("find vehicle by alias", |store| {
            Ok(decode_all::<Vehicle>(store.find_by_field(
                Vehicle::COLLECTION,
                ALIAS_FIELD,
                alias.trim(),
            )?)
            .into_iter()
            .next())
        })
        .flatten()
    }

    /// A vehicle by id, falling back to its alias.
    #[must_use]
    pub fn find_vehicle(&self, key: &str) -> Option<Vehicle> {
        self.get_vehicle_by_id(&RecordId::new(key))
            .or_else(|| self.find_vehicle_by_alias(key))
    }

    /// Validate and store a new vehicle.
    ///
    /// Returns the new id, or `None` if the store failed.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the payload is invalid or another
    /// vehicle already uses the alias.
    pub fn add_vehicle(
        &self,
        new: NewVehicle,
    ) -> std::result::Result<Option<RecordId>, ValidationError> {
        let vehicle = Vehicle::create(new)?;
        self.write("add vehicle", |store| {
            ensure_unique_alias(store, vehicle.alias(), None)?;
            store.insert_one(Vehicle::COLLECTION, &vehicle.to_document()?)?;
            info!("Added vehicle {} ({})", vehicle.alias(), vehicle.id());
            Ok(vehicle.id().clone())
        })
    }

    /// Apply a partial update to a vehicle.
    ///
    /// The merged document is validated and normalized before anything is
    /// written; unknown fields are rejected. Returns whether a vehicle
    /// matched `id`; `false` also covers store failures.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the merged vehicle would be invalid
    /// or its new alias is taken.
    pub fn update_vehicle(
        &self,
        id: &RecordId,
        update: &VehicleUpdate,
    ) -> std::result::Result<bool, ValidationError> {
        let renames = update.as_update().touches(ALIAS_FIELD);
        self.write("update vehicle", |store| {
            let matched = store.update_one_checked(
                Vehicle::COLLECTION,
                id.as_str(),
                update.as_update(),
                |merged| {
                    let vehicle = Vehicle::from_document(merged)?;
                    if renames {
                        ensure_unique_alias(store, vehicle.alias(), Some(id))?;
                    }
                    vehicle.to_document()
                },
            )?;
            if matched {
                info!("Updated vehicle {}", id);
            } else {
                debug!("No vehicle {} to update", id);
            }
            Ok(matched)
        })
        .map(|matched| matched.unwrap_or(false))
    }

    /// Delete a vehicle. Its work orders are left in place.
    #[must_use]
    pub fn delete_vehicle(&self, id: &RecordId) -> bool {
        self.read("delete vehicle", |store| {
            let deleted = store.delete_one(Vehicle::COLLECTION, id.as_str())?;
            if deleted {
                info!("Deleted vehicle {}", id);
            }
            Ok(deleted)
        })
        .unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // Work orders
    // ------------------------------------------------------------------

    /// Validate and store a new work order started now.
    ///
    /// Returns the new id, or `None` if the store failed.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the payload is invalid.
    pub fn add_work_order(
        &self,
        new: NewWorkOrder,
    ) -> std::result::Result<Option<RecordId>, ValidationError> {
        let order = WorkOrder::create(new, self.clock.now())?;
        self.write("add work order", |store| {
            store.insert_one(WorkOrder::COLLECTION, &order.to_document()?)?;
            info!("Added work order '{}' ({})", order.title(), order.id());
            Ok(order.id().clone())
        })
    }

    /// A work order by id.
    #[must_use]
    pub fn get_work_order_by_id(&self, id: &RecordId) -> Option<WorkOrder> {
        self.read("get work order", |store| {
            store
                .find_one(WorkOrder::COLLECTION, id.as_str())?
                .map(WorkOrder::from_document)
                .transpose()
        })
        .flatten()
    }

    /// Work orders referencing `vehicle_id`, most recently started first.
    #[must_use]
    pub fn get_work_orders_for_vehicle(&self, vehicle_id: &RecordId) -> Vec<WorkOrder> {
        let mut orders = self
            .read("list work orders", |store| {
                Ok(decode_all::<WorkOrder>(store.find_by_field(
                    WorkOrder::COLLECTION,
                    VEHICLE_REF_FIELD,
                    vehicle_id.as_str(),
                )?))
            })
            .unwrap_or_default();
        orders.sort_by(|a, b| b.start_date().cmp(&a.start_date()));
        orders
    }

    /// Apply a partial update to a work order.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the merged work order would be invalid.
    pub fn update_work_order(
        &self,
        id: &RecordId,
        update: &WorkOrderUpdate,
    ) -> std::result::Result<bool, ValidationError> {
        self.write("update work order", |store| {
            let matched = store.update_one_checked(
                WorkOrder::COLLECTION,
                id.as_str(),
                update.as_update(),
                |merged| WorkOrder::from_document(merged)?.to_document(),
            )?;
            if matched {
                info!("Updated work order {}", id);
            }
            Ok(matched)
        })
        .map(|matched| matched.unwrap_or(false))
    }

    /// Mark a work order complete as of now.
    #[must_use]
    pub fn complete_work_order(&self, id: &RecordId) -> bool {
        let update = WorkOrderUpdate::new().complete(self.clock.now());
        self.update_work_order(id, &update).unwrap_or_else(|e| {
            warn!("Work order {} could not be completed: {}", id, e);
            false
        })
    }

    /// Delete a work order.
    #[must_use]
    pub fn delete_work_order(&self, id: &RecordId) -> bool {
        self.read("delete work order", |store| {
            let deleted = store.delete_one(WorkOrder::COLLECTION, id.as_str())?;
            if deleted {
                info!("Deleted work order {}", id);
            }
            Ok(deleted)
        })
        .unwrap_or(false)
    }

    /// Delete every work order referencing `vehicle_id`.
    ///
    /// Returns the number deleted.
    #[must_use]
    pub fn delete_work_orders_for_vehicle(&self, vehicle_id: &RecordId) -> usize {
        self.read("delete work orders", |store| {
            store.delete_many_by_field(
                WorkOrder::COLLECTION,
                VEHICLE_REF_FIELD,
                vehicle_id.as_str(),
            )
        })
        .unwrap_or(0)
    }

    // ------------------------------------------------------------------
    // Error funnels
    // ------------------------------------------------------------------

    /// Run a store operation, logging and discarding any failure.
    fn read<T>(&self, what: &str, op: impl FnOnce(&DocumentStore) -> Result<T>) -> Option<T> {
        let result = self.store_or_err().and_then(op);
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                log_store_failure(what, &e);
                None
            }
        }
    }

    /// Like [`Self::read`], but passes validation failures through.
    fn write<T>(
        &self,
        what: &str,
        op: impl FnOnce(&DocumentStore) -> Result<T>,
    ) -> std::result::Result<Option<T>, ValidationError> {
        let result = self.store_or_err().and_then(op);
        match result {
            Ok(value) => Ok(Some(value)),
            Err(Error::Validation(e)) => Err(e),
            Err(e) => {
                log_store_failure(what, &e);
                Ok(None)
            }
        }
    }
}

fn log_store_failure(what: &str, e: &Error) {
    if e.is_not_connected() {
        warn!("Cannot {}: {}", what, e);
    } else {
        error!("Failed to {}: {}", what, e);
    }
}

/// Decode documents, skipping the ones that do not validate.
fn decode_all<R: Record>(docs: Vec<Document>) -> Vec<R> {
    docs.into_iter()
        .filter_map(|doc| {
            let id = doc
                .get(ID_FIELD)
                .and_then(Value::as_str)
                .unwrap_or("?")
                .to_string();
            match R::from_document(doc) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping invalid document {} in {}: {}", id, R::COLLECTION, e);
                    None
                }
            }
        })
        .collect()
}

/// Reject `alias` if a vehicle other than `except` already uses it.
fn ensure_unique_alias(
    store: &DocumentStore,
    alias: &str,
    except: Option<&RecordId>,
) -> Result<()> {
    let alias = alias.trim();
    let taken = store
        .find_by_field(Vehicle::COLLECTION, ALIAS_FIELD, alias)?
        .iter()
        .filter_map(|doc| doc.get(ID_FIELD).and_then(Value::as_str))
        .any(|id| !except.is_some_and(|except| except.as_str() == id));

    if taken {
        return Err(
            ValidationError::new(ALIAS_FIELD, format!("'{alias}' is already in use")).into(),
        );
    }
    Ok(())
}
