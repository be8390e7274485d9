//! Command-line interface for fleetstatus.
//!
//! This module provides the CLI structure for the `fleetstatus` binary and
//! the conversion of its flags into record payloads.

mod commands;
pub mod forms;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddOrderArgs, AddVehicleArgs, ConditionArg, ConfigCommand, DetailArgs, EditOrderArgs,
    EditVehicleArgs, OrderCommand, OverviewCommand, VehicleCommand,
};

use crate::logging::Verbosity;

/// fleetstatus - Keep track of your fleet
///
/// Records vehicles, their condition and documentation deadlines, and the
/// work orders opened on them, and shows which vehicles can be used today.
#[derive(Debug, Parser)]
#[command(name = "fleetstatus")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the fleet dashboard
    Overview(OverviewCommand),

    /// Manage vehicles
    #[command(subcommand)]
    Vehicle(VehicleCommand),

    /// Manage work orders
    #[command(subcommand)]
    Order(OrderCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "fleetstatus");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(parse(&["fleetstatus", "overview"]).verbosity(), Verbosity::Normal);
        assert_eq!(
            parse(&["fleetstatus", "-v", "overview"]).verbosity(),
            Verbosity::Verbose
        );
        assert_eq!(
            parse(&["fleetstatus", "-vv", "overview"]).verbosity(),
            Verbosity::Trace
        );
        assert_eq!(
            parse(&["fleetstatus", "-q", "overview"]).verbosity(),
            Verbosity::Quiet
        );
    }

    #[test]
    fn test_detail_flags_grouped_under_heading() {
        let mut cli = Cli::command();
        cli.build();
        for sub in ["add", "edit"] {
            let cmd = cli
                .find_subcommand("vehicle")
                .and_then(|v| v.find_subcommand(sub))
                .unwrap();
            for flag in ["explanation", "budget", "eta"] {
                let arg = cmd.get_arguments().find(|a| a.get_id() == flag).unwrap();
                assert_eq!(arg.get_help_heading(), Some("Repair details"));
            }
        }
    }

    #[test]
    fn test_parse_with_config() {
        let cli = parse(&["fleetstatus", "-c", "/custom/config.toml", "overview"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_overview_cards() {
        let cli = parse(&["fleetstatus", "overview", "--cards", "--json"]);
        assert!(matches!(
            cli.command,
            Command::Overview(OverviewCommand {
                json: true,
                cards: true
            })
        ));
    }

    #[test]
    fn test_parse_vehicle_add() {
        let cli = parse(&[
            "fleetstatus",
            "vehicle",
            "add",
            "--alias",
            "Van 1",
            "--location",
            "Depot",
            "--condition",
            "non-running",
            "--inspection-due",
            "2027-01-01",
            "--tax-due",
            "2027-02-01",
            "--explanation",
            "Gearbox",
            "--budget",
            "800",
            "--eta",
            "2026-12-01",
        ]);
        let Command::Vehicle(VehicleCommand::Add(args)) = cli.command else {
            panic!("expected vehicle add");
        };
        assert_eq!(args.condition, ConditionArg::NonRunning);
        assert_eq!(args.details.budget, Some(800.0));
        assert_eq!(args.tax_due.to_string(), "2027-02-01");
    }

    #[test]
    fn test_parse_vehicle_add_rejects_bad_date() {
        let result = Cli::try_parse_from([
            "fleetstatus",
            "vehicle",
            "add",
            "--alias",
            "Van",
            "--location",
            "Depot",
            "--inspection-due",
            "tomorrow",
            "--tax-due",
            "2027-02-01",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_vehicle_edit_photo_conflicts() {
        let result = Cli::try_parse_from([
            "fleetstatus",
            "vehicle",
            "edit",
            "Van 1",
            "--photo-url",
            "x",
            "--remove-photo",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_vehicle_delete() {
        let cli = parse(&["fleetstatus", "vehicle", "delete", "Van 1", "--yes", "--purge-orders"]);
        assert!(matches!(
            cli.command,
            Command::Vehicle(VehicleCommand::Delete {
                yes: true,
                purge_orders: true,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_order_add_defaults() {
        let cli = parse(&["fleetstatus", "order", "add", "Van 1", "--title", "Brakes"]);
        let Command::Order(OrderCommand::Add(args)) = cli.command else {
            panic!("expected order add");
        };
        assert!(args.description.is_empty());
        assert!(args.cost.abs() < f64::EPSILON);
        assert!(!args.tbd);
    }

    #[test]
    fn test_parse_order_edit_eta_conflicts_with_tbd() {
        let result = Cli::try_parse_from([
            "fleetstatus",
            "order",
            "edit",
            "w1",
            "--eta",
            "2026-11-01",
            "--tbd",
        ]);
        assert!(result.is_err());
    }
}
