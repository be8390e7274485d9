//! Dashboard views derived from the vehicle list.
//!
//! Availability is recomputed here for a given day; nothing in this module
//! is ever persisted.

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{Condition, Unavailability, Vehicle};

/// One row of the fleet overview table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleRow {
    /// Vehicle id.
    pub id: String,
    /// Display name.
    pub alias: String,
    /// Operational state.
    pub condition: Condition,
    /// Current location.
    pub location: String,
    /// Whether the vehicle can be used today.
    pub is_available: bool,
    /// Inspection due date.
    pub inspection_due: NaiveDate,
    /// Tax due date.
    pub tax_due: NaiveDate,
    /// Photo URL, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl VehicleRow {
    fn from_vehicle(vehicle: &Vehicle, today: NaiveDate) -> Self {
        Self {
            id: vehicle.id().to_string(),
            alias: vehicle.alias().to_string(),
            condition: vehicle.condition(),
            location: vehicle.location().to_string(),
            is_available: vehicle.is_available(today),
            inspection_due: vehicle.documentation().inspection_due,
            tax_due: vehicle.documentation().tax_due,
            photo_url: vehicle.photo_url().map(str::to_string),
        }
    }
}

/// An unavailable vehicle and every reason it is unavailable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnavailableCard {
    /// Vehicle id.
    pub id: String,
    /// Display name.
    pub alias: String,
    /// Current location.
    pub location: String,
    /// Human-readable reasons.
    pub reasons: Vec<String>,
}

/// Fleet counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FleetSummary {
    /// Number of vehicles.
    pub total: usize,
    /// Vehicles usable today.
    pub available: usize,
    /// Vehicles that do not run.
    pub non_running: usize,
    /// Vehicles with an inspection or tax due today or earlier.
    pub documentation_expired: usize,
}

/// Everything the dashboard shows, computed for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetOverview {
    /// The day availability was computed for.
    pub today: NaiveDate,
    /// Counts.
    pub summary: FleetSummary,
    /// One row per vehicle, in the order given.
    pub rows: Vec<VehicleRow>,
    /// Unavailable vehicles with their reasons.
    pub unavailable: Vec<UnavailableCard>,
}

impl FleetOverview {
    /// Build the overview of `vehicles` as of `today`.
    #[must_use]
    pub fn build(vehicles: &[Vehicle], today: NaiveDate) -> Self {
        let mut summary = FleetSummary {
            total: vehicles.len(),
            ..FleetSummary::default()
        };
        let mut unavailable = Vec::new();

        for vehicle in vehicles {
            let reasons = vehicle.unavailability(today);
            if reasons.is_empty() {
                summary.available += 1;
            }
            if vehicle.condition() == Condition::NonRunning {
                summary.non_running += 1;
            }
            if reasons.iter().any(|r| {
                matches!(
                    r,
                    Unavailability::InspectionExpired(_) | Unavailability::TaxExpired(_)
                )
            }) {
                summary.documentation_expired += 1;
            }
            if !reasons.is_empty() {
                unavailable.push(UnavailableCard {
                    id: vehicle.id().to_string(),
                    alias: vehicle.alias().to_string(),
                    location: vehicle.location().to_string(),
                    reasons: reasons.iter().map(ToString::to_string).collect(),
                });
            }
        }

        Self {
            today,
            summary,
            rows: vehicles
                .iter()
                .map(|v| VehicleRow::from_vehicle(v, today))
                .collect(),
            unavailable,
        }
    }
}
