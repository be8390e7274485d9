//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

use crate::model::Condition;

/// Dashboard arguments.
#[derive(Debug, Args)]
pub struct OverviewCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Show one card per unavailable vehicle instead of the table
    #[arg(long)]
    pub cards: bool,
}

/// Vehicle commands.
#[derive(Debug, Subcommand)]
pub enum VehicleCommand {
    /// List every vehicle
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show one vehicle and its work orders
    Show {
        /// Vehicle id or alias
        vehicle: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Add a vehicle
    Add(AddVehicleArgs),

    /// Change fields of a vehicle
    Edit(EditVehicleArgs),

    /// Delete a vehicle
    Delete {
        /// Vehicle id or alias
        vehicle: String,

        /// Confirm the deletion
        #[arg(short, long)]
        yes: bool,

        /// Also delete the vehicle's work orders
        #[arg(long)]
        purge_orders: bool,
    },
}

/// Repair details given on the command line.
#[derive(Debug, Clone, Default, Args)]
pub struct DetailArgs {
    /// What needs fixing (non-running vehicles)
    #[arg(long)]
    pub explanation: Option<String>,

    /// Estimated repair budget (non-running vehicles)
    #[arg(long)]
    pub budget: Option<f64>,

    /// Estimated date the vehicle runs again, YYYY-MM-DD (non-running vehicles)
    #[arg(long, value_name = "DATE")]
    pub eta: Option<NaiveDate>,
}

impl DetailArgs {
    /// Whether any detail flag was given.
    #[must_use]
    pub fn any(&self) -> bool {
        self.explanation.is_some() || self.budget.is_some() || self.eta.is_some()
    }
}

/// Arguments of `vehicle add`.
#[derive(Debug, Clone, Args)]
pub struct AddVehicleArgs {
    /// Display name, unique across the fleet
    #[arg(long)]
    pub alias: String,

    /// Where the vehicle is
    #[arg(long)]
    pub location: String,

    /// Operational state
    #[arg(long, value_enum, default_value = "running")]
    pub condition: ConditionArg,

    /// Inspection due date, YYYY-MM-DD
    #[arg(long, value_name = "DATE")]
    pub inspection_due: NaiveDate,

    /// Road tax due date, YYYY-MM-DD
    #[arg(long, value_name = "DATE")]
    pub tax_due: NaiveDate,

    /// Repair details
    #[command(flatten, next_help_heading = "Repair details")]
    pub details: DetailArgs,

    /// Photo URL
    #[arg(long, conflicts_with = "photo")]
    pub photo_url: Option<String>,

    /// Image file to upload as the vehicle photo
    #[arg(long, value_name = "FILE")]
    pub photo: Option<PathBuf>,
}

/// Arguments of `vehicle edit`.
#[derive(Debug, Clone, Args)]
pub struct EditVehicleArgs {
    /// Vehicle id or alias
    pub vehicle: String,

    /// New display name
    #[arg(long)]
    pub alias: Option<String>,

    /// New location
    #[arg(long)]
    pub location: Option<String>,

    /// New operational state
    #[arg(long, value_enum)]
    pub condition: Option<ConditionArg>,

    /// New inspection due date, YYYY-MM-DD
    #[arg(long, value_name = "DATE")]
    pub inspection_due: Option<NaiveDate>,

    /// New road tax due date, YYYY-MM-DD
    #[arg(long, value_name = "DATE")]
    pub tax_due: Option<NaiveDate>,

    /// Repair details
    #[command(flatten, next_help_heading = "Repair details")]
    pub details: DetailArgs,

    /// New photo URL
    #[arg(long, conflicts_with_all = ["photo", "remove_photo"])]
    pub photo_url: Option<String>,

    /// Image file to upload as the new photo
    #[arg(long, value_name = "FILE", conflicts_with = "remove_photo")]
    pub photo: Option<PathBuf>,

    /// Remove the photo
    #[arg(long)]
    pub remove_photo: bool,
}

/// Work order commands.
#[derive(Debug, Subcommand)]
pub enum OrderCommand {
    /// List the work orders of a vehicle, most recent first
    List {
        /// Vehicle id or alias
        vehicle: String,

        /// Include completed work orders
        #[arg(short, long)]
        all: bool,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Open a work order
    Add(AddOrderArgs),

    /// Change fields of a work order
    Edit(EditOrderArgs),

    /// Mark a work order complete
    Complete {
        /// Work order id
        id: String,
    },

    /// Delete a work order
    Delete {
        /// Work order id
        id: String,

        /// Confirm the deletion
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments of `order add`.
#[derive(Debug, Clone, Args)]
pub struct AddOrderArgs {
    /// Vehicle id or alias
    pub vehicle: String,

    /// Short summary
    #[arg(long)]
    pub title: String,

    /// Details of the work
    #[arg(long, default_value = "")]
    pub description: String,

    /// Cost of the work
    #[arg(long, default_value_t = 0.0)]
    pub cost: f64,

    /// Estimated completion date, YYYY-MM-DD
    #[arg(long, value_name = "DATE")]
    pub eta: Option<NaiveDate>,

    /// No estimate yet (any --eta is ignored)
    #[arg(long)]
    pub tbd: bool,
}

/// Arguments of `order edit`.
#[derive(Debug, Clone, Args)]
pub struct EditOrderArgs {
    /// Work order id
    pub id: String,

    /// New summary
    #[arg(long)]
    pub title: Option<String>,

    /// New details
    #[arg(long)]
    pub description: Option<String>,

    /// New cost
    #[arg(long)]
    pub cost: Option<f64>,

    /// New estimated completion date, YYYY-MM-DD
    #[arg(long, value_name = "DATE", conflicts_with_all = ["tbd", "clear_eta"])]
    pub eta: Option<NaiveDate>,

    /// Mark the estimate as TBD
    #[arg(long, conflicts_with = "clear_eta")]
    pub tbd: bool,

    /// Remove the estimate
    #[arg(long)]
    pub clear_eta: bool,

    /// Reopen a completed work order
    #[arg(long)]
    pub reopen: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Vehicle condition argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConditionArg {
    /// The vehicle runs
    Running,
    /// The vehicle needs repair
    NonRunning,
}

impl From<ConditionArg> for Condition {
    fn from(arg: ConditionArg) -> Self {
        match arg {
            ConditionArg::Running => Self::Running,
            ConditionArg::NonRunning => Self::NonRunning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_arg_conversion() {
        assert_eq!(Condition::from(ConditionArg::Running), Condition::Running);
        assert_eq!(
            Condition::from(ConditionArg::NonRunning),
            Condition::NonRunning
        );
    }

    #[test]
    fn test_condition_arg_value_names() {
        let names: Vec<_> = ConditionArg::value_variants()
            .iter()
            .filter_map(|v| v.to_possible_value())
            .map(|v| v.get_name().to_string())
            .collect();
        assert_eq!(names, vec!["running", "non-running"]);
    }

    #[test]
    fn test_detail_args_any() {
        assert!(!DetailArgs::default().any());
        let details = DetailArgs {
            budget: Some(10.0),
            ..DetailArgs::default()
        };
        assert!(details.any());
    }
}
