//! Turning command-line flags into record payloads and updates.
//!
//! Flags that contradict the chosen condition are passed through so the
//! record model rejects them instead of silently dropping them.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::json;

use crate::model::validation::Validator;
use crate::model::{
    Condition, Documentation, NewVehicle, NewWorkOrder, NonRunningDetails, RecordId,
    ValidationError, VehicleUpdate, WorkOrderUpdate,
};

use super::commands::{AddOrderArgs, AddVehicleArgs, DetailArgs, EditOrderArgs, EditVehicleArgs};

/// Build a vehicle payload from `vehicle add` flags.
///
/// # Errors
///
/// Returns a [`ValidationError`] if the repair detail flags are incomplete
/// or given for a running vehicle.
pub fn new_vehicle(
    args: &AddVehicleArgs,
    photo_url: Option<String>,
) -> Result<NewVehicle, ValidationError> {
    let condition = Condition::from(args.condition);
    let non_running_details = match condition {
        Condition::NonRunning => Some(complete_details(&args.details)?),
        Condition::Running if args.details.any() => Some(lenient_details(&args.details)),
        Condition::Running => None,
    };

    Ok(NewVehicle {
        alias: args.alias.trim().to_string(),
        photo_url,
        condition,
        non_running_details,
        documentation: Documentation {
            inspection_due: args.inspection_due,
            tax_due: args.tax_due,
        },
        location: args.location.trim().to_string(),
    })
}

/// Build a vehicle update from `vehicle edit` flags.
///
/// `photo_url` is the already uploaded photo, if any. Detail flags given
/// without `--condition` edit the stored details field by field.
///
/// # Errors
///
/// Returns a [`ValidationError`] if `--condition non-running` comes without
/// complete repair details.
pub fn vehicle_update(
    args: &EditVehicleArgs,
    photo_url: Option<String>,
) -> Result<VehicleUpdate, ValidationError> {
    let mut update = VehicleUpdate::new();

    if let Some(alias) = &args.alias {
        update = update.alias(alias.trim());
    }
    if let Some(location) = &args.location {
        update = update.location(location.trim());
    }
    if let Some(date) = args.inspection_due {
        update = update.inspection_due(date);
    }
    if let Some(date) = args.tax_due {
        update = update.tax_due(date);
    }

    match args.condition.map(Condition::from) {
        Some(Condition::NonRunning) => {
            update = update.non_running(&complete_details(&args.details)?);
        }
        Some(Condition::Running) => {
            update = update.running();
            if args.details.any() {
                update = update.field(
                    "non_running_details",
                    Some(details_json(&lenient_details(&args.details))),
                );
            }
        }
        None => update = detail_fields(update, &args.details),
    }

    if args.remove_photo {
        update = update.photo_url(None);
    } else if let Some(url) = photo_url.or_else(|| args.photo_url.clone()) {
        update = update.photo_url(Some(url));
    }

    Ok(update)
}

/// Build a work order payload from `order add` flags.
#[must_use]
pub fn new_work_order(vehicle_id: RecordId, args: &AddOrderArgs) -> NewWorkOrder {
    NewWorkOrder {
        vehicle_id,
        title: args.title.trim().to_string(),
        description: args.description.clone(),
        cost: args.cost,
        eta: args.eta.map(start_of_day),
        eta_is_tbd: args.tbd,
    }
}

/// Build a work order update from `order edit` flags.
#[must_use]
pub fn work_order_update(args: &EditOrderArgs) -> WorkOrderUpdate {
    let mut update = WorkOrderUpdate::new();
    if let Some(title) = &args.title {
        update = update.title(title.trim());
    }
    if let Some(description) = &args.description {
        update = update.description(description.clone());
    }
    if let Some(cost) = args.cost {
        update = update.cost(cost);
    }
    if let Some(eta) = args.eta {
        update = update.eta(start_of_day(eta));
    } else if args.tbd {
        update = update.eta_tbd();
    } else if args.clear_eta {
        update = update.clear_eta();
    }
    if args.reopen {
        update = update.reopen();
    }
    update
}

/// Midnight UTC of `date`.
#[must_use]
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Repair details with every flag required.
fn complete_details(args: &DetailArgs) -> Result<NonRunningDetails, ValidationError> {
    let mut v = Validator::new();
    if args.explanation.is_none() {
        v.reject("non_running_details.explanation", "--explanation is required");
    }
    if args.budget.is_none() {
        v.reject("non_running_details.estimated_budget", "--budget is required");
    }
    if args.eta.is_none() {
        v.reject("non_running_details.eta", "--eta is required");
    }
    v.finish()?;
    Ok(lenient_details(args))
}

/// Repair details with absent flags defaulted, for the model to reject.
fn lenient_details(args: &DetailArgs) -> NonRunningDetails {
    NonRunningDetails {
        explanation: args.explanation.clone().unwrap_or_default(),
        estimated_budget: args.budget.unwrap_or_default(),
        eta: args.eta.unwrap_or_default(),
    }
}

fn details_json(details: &NonRunningDetails) -> serde_json::Value {
    json!({
        "explanation": details.explanation,
        "estimated_budget": details.estimated_budget,
        "eta": details.eta,
    })
}

/// Set individual detail fields, leaving the others as stored.
fn detail_fields(mut update: VehicleUpdate, args: &DetailArgs) -> VehicleUpdate {
    if let Some(explanation) = &args.explanation {
        update = update.field(
            "non_running_details.explanation",
            Some(json!(explanation.trim())),
        );
    }
    if let Some(budget) = args.budget {
        update = update.field("non_running_details.estimated_budget", Some(json!(budget)));
    }
    if let Some(eta) = args.eta {
        update = update.field("non_running_details.eta", Some(json!(eta)));
    }
    update
}
