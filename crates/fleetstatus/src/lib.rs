//! `fleetstatus` - a record-keeper for a small vehicle fleet
//!
//! This library tracks vehicles, their operational condition and
//! documentation deadlines, and the maintenance work orders opened on them,
//! on top of an embedded JSON document store.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod clock;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod model;
pub mod photo;
pub mod repository;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use dashboard::{FleetOverview, FleetSummary};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use model::{
    Condition, NewVehicle, NewWorkOrder, RecordId, ValidationError, Vehicle, VehicleUpdate,
    WorkOrder, WorkOrderUpdate,
};
pub use photo::{LocalPhotoHost, PhotoHost};
pub use repository::FleetRepository;
pub use store::{DocumentStore, StoreStats, Update};
