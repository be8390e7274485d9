//! `fleetstatus` - CLI for the fleet record-keeper
//!
//! This binary renders the fleet dashboard and provides the vehicle, work
//! order and configuration commands.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use dotenvy::dotenv;
use tracing::warn;

use fleetstatus::cli::forms;
use fleetstatus::cli::{
    AddOrderArgs, AddVehicleArgs, Cli, Command, ConfigCommand, EditOrderArgs, EditVehicleArgs,
    OrderCommand, OverviewCommand, VehicleCommand,
};
use fleetstatus::dashboard::FleetOverview;
use fleetstatus::{
    init_logging, Config, FleetRepository, LocalPhotoHost, PhotoHost, RecordId, ValidationError,
    Vehicle, WorkOrder,
};

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match cli.command {
        Command::Overview(cmd) => handle_overview(&App::open(cli.config)?, &cmd),
        Command::Vehicle(cmd) => handle_vehicle(&App::open(cli.config)?, cmd),
        Command::Order(cmd) => handle_order(&App::open(cli.config)?, cmd),
        Command::Config(cmd) => handle_config(cli.config, cmd),
    }
}

/// Loaded configuration and the repository built from it.
#[derive(Debug)]
struct App {
    config: Config,
    repo: FleetRepository,
}

impl App {
    fn open(config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let config = Config::load_from(config_path).context("failed to load configuration")?;
        let repo = FleetRepository::connect(&config.database);
        if !repo.is_connected() {
            warn!("Not connected to the document store; results will be empty");
        }
        Ok(Self { config, repo })
    }

    fn date(&self, date: NaiveDate) -> String {
        date.format(&self.config.display.date_format).to_string()
    }

    fn datetime(&self, at: DateTime<Utc>) -> String {
        self.date(at.date_naive())
    }

    fn vehicle(&self, key: &str) -> anyhow::Result<Vehicle> {
        self.repo
            .find_vehicle(key)
            .ok_or_else(|| anyhow!("no vehicle matches '{key}'"))
    }

    fn upload_photo(&self, file: Option<&PathBuf>, alias: &str) -> Option<String> {
        let file = file?;
        let url = LocalPhotoHost::from_config(&self.config).upload(file, alias);
        if url.is_none() {
            warn!("Photo {} was not stored; continuing without it", file.display());
        }
        url
    }
}

fn rejected(err: &ValidationError) -> anyhow::Error {
    let lines: Vec<String> = err
        .errors()
        .iter()
        .map(|e| format!("  - {e}"))
        .collect();
    anyhow!("invalid input:\n{}", lines.join("\n"))
}

// ----------------------------------------------------------------------
// Dashboard
// ----------------------------------------------------------------------

fn handle_overview(app: &App, cmd: &OverviewCommand) -> anyhow::Result<()> {
    let vehicles = app.repo.get_all_vehicles();
    let overview = FleetOverview::build(&vehicles, app.repo.today());

    if cmd.json {
        if cmd.cards {
            println!("{}", serde_json::to_string_pretty(&overview.unavailable)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&overview)?);
        }
        return Ok(());
    }

    let title = &app.config.display.app_title;
    println!("{title}");
    println!("{}", "=".repeat(title.chars().count()));
    println!(
        "Total: {}  Available: {}  Non-running: {}  Documentation expired: {}",
        overview.summary.total,
        overview.summary.available,
        overview.summary.non_running,
        overview.summary.documentation_expired
    );
    println!();

    if cmd.cards {
        if overview.unavailable.is_empty() {
            println!("Every vehicle is available.");
        }
        for card in &overview.unavailable {
            println!("{} ({})", card.alias, card.location);
            for reason in &card.reasons {
                println!("  - {reason}");
            }
            println!();
        }
        return Ok(());
    }

    if overview.rows.is_empty() {
        println!("No vehicles.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = overview
        .rows
        .iter()
        .map(|row| {
            vec![
                row.alias.clone(),
                row.condition.to_string(),
                row.location.clone(),
                yes_no(row.is_available).to_string(),
                app.date(row.inspection_due),
                app.date(row.tax_due),
            ]
        })
        .collect();
    print_table(
        &["ALIAS", "CONDITION", "LOCATION", "AVAILABLE", "INSPECTION", "TAX"],
        &rows,
    );
    Ok(())
}

// ----------------------------------------------------------------------
// Vehicles
// ----------------------------------------------------------------------

fn handle_vehicle(app: &App, cmd: VehicleCommand) -> anyhow::Result<()> {
    match cmd {
        VehicleCommand::List { json } => list_vehicles(app, json),
        VehicleCommand::Show { vehicle, json } => show_vehicle(app, &vehicle, json),
        VehicleCommand::Add(args) => add_vehicle(app, &args),
        VehicleCommand::Edit(args) => edit_vehicle(app, &args),
        VehicleCommand::Delete {
            vehicle,
            yes,
            purge_orders,
        } => delete_vehicle(app, &vehicle, yes, purge_orders),
    }
}

fn list_vehicles(app: &App, json: bool) -> anyhow::Result<()> {
    let vehicles = app.repo.get_all_vehicles();
    let overview = FleetOverview::build(&vehicles, app.repo.today());

    if json {
        println!("{}", serde_json::to_string_pretty(&overview.rows)?);
        return Ok(());
    }
    if overview.rows.is_empty() {
        println!("No vehicles.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = overview
        .rows
        .iter()
        .map(|row| {
            vec![
                row.id.clone(),
                row.alias.clone(),
                row.condition.to_string(),
                row.location.clone(),
                yes_no(row.is_available).to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "ALIAS", "CONDITION", "LOCATION", "AVAILABLE"], &rows);
    Ok(())
}

fn show_vehicle(app: &App, key: &str, json: bool) -> anyhow::Result<()> {
    let vehicle = app.vehicle(key)?;
    let today = app.repo.today();
    let orders = app.repo.get_work_orders_for_vehicle(vehicle.id());

    if json {
        let value = serde_json::json!({
            "vehicle": vehicle,
            "is_available": vehicle.is_available(today),
            "work_orders": orders,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", vehicle.alias());
    println!("{}", "-".repeat(vehicle.alias().chars().count()));
    println!("Id:              {}", vehicle.id());
    println!("Condition:       {}", vehicle.condition());
    println!("Location:        {}", vehicle.location());
    println!(
        "Inspection due:  {}",
        app.date(vehicle.documentation().inspection_due)
    );
    println!("Tax due:         {}", app.date(vehicle.documentation().tax_due));
    if let Some(url) = vehicle.photo_url() {
        println!("Photo:           {url}");
    }
    if let Some(details) = vehicle.non_running_details() {
        println!("Repair:          {}", details.explanation);
        println!("Budget:          {:.2}", details.estimated_budget);
        println!("Back in service: {}", app.date(details.eta));
    }

    let reasons = vehicle.unavailability(today);
    if reasons.is_empty() {
        println!("Available:       yes");
    } else {
        println!("Available:       no");
        for reason in reasons {
            println!("  - {reason}");
        }
    }

    println!();
    print_orders(app, &orders);
    Ok(())
}

fn add_vehicle(app: &App, args: &AddVehicleArgs) -> anyhow::Result<()> {
    let photo_url = app
        .upload_photo(args.photo.as_ref(), &args.alias)
        .or_else(|| args.photo_url.clone());
    let new = forms::new_vehicle(args, photo_url).map_err(|e| rejected(&e))?;
    let alias = new.alias.clone();

    match app.repo.add_vehicle(new).map_err(|e| rejected(&e))? {
        Some(id) => {
            println!("Added vehicle {alias} ({id})");
            Ok(())
        }
        None => bail!("vehicle '{alias}' could not be saved"),
    }
}

fn edit_vehicle(app: &App, args: &EditVehicleArgs) -> anyhow::Result<()> {
    let vehicle = app.vehicle(&args.vehicle)?;
    let alias = args.alias.as_deref().unwrap_or(vehicle.alias());
    let photo_url = app.upload_photo(args.photo.as_ref(), alias);

    let update = forms::vehicle_update(args, photo_url).map_err(|e| rejected(&e))?;
    if update.is_empty() {
        bail!("nothing to change; pass at least one field flag");
    }

    if app
        .repo
        .update_vehicle(vehicle.id(), &update)
        .map_err(|e| rejected(&e))?
    {
        println!("Updated vehicle {}", vehicle.alias());
        Ok(())
    } else {
        bail!("vehicle '{}' could not be updated", vehicle.alias())
    }
}

fn delete_vehicle(app: &App, key: &str, yes: bool, purge_orders: bool) -> anyhow::Result<()> {
    let vehicle = app.vehicle(key)?;
    if !yes {
        println!(
            "This will delete vehicle {} ({}).",
            vehicle.alias(),
            vehicle.id()
        );
        println!("Use --yes to confirm.");
        return Ok(());
    }

    if !app.repo.delete_vehicle(vehicle.id()) {
        bail!("vehicle '{}' could not be deleted", vehicle.alias());
    }
    println!("Deleted vehicle {}", vehicle.alias());

    if purge_orders {
        let count = app.repo.delete_work_orders_for_vehicle(vehicle.id());
        println!("Deleted {count} work orders");
    }
    Ok(())
}

// ----------------------------------------------------------------------
// Work orders
// ----------------------------------------------------------------------

fn handle_order(app: &App, cmd: OrderCommand) -> anyhow::Result<()> {
    match cmd {
        OrderCommand::List { vehicle, all, json } => list_orders(app, &vehicle, all, json),
        OrderCommand::Add(args) => add_order(app, &args),
        OrderCommand::Edit(args) => edit_order(app, &args),
        OrderCommand::Complete { id } => {
            let id = RecordId::new(id);
            if app.repo.complete_work_order(&id) {
                println!("Completed work order {id}");
                Ok(())
            } else {
                bail!("work order '{id}' could not be completed")
            }
        }
        OrderCommand::Delete { id, yes } => {
            let id = RecordId::new(id);
            if !yes {
                println!("This will delete work order {id}.");
                println!("Use --yes to confirm.");
                return Ok(());
            }
            if app.repo.delete_work_order(&id) {
                println!("Deleted work order {id}");
                Ok(())
            } else {
                bail!("work order '{id}' could not be deleted")
            }
        }
    }
}

fn list_orders(app: &App, key: &str, all: bool, json: bool) -> anyhow::Result<()> {
    // Orphaned work orders stay reachable through the raw vehicle id.
    let vehicle_id = app
        .repo
        .find_vehicle(key)
        .map_or_else(|| RecordId::new(key), |v| v.id().clone());

    let orders: Vec<WorkOrder> = app
        .repo
        .get_work_orders_for_vehicle(&vehicle_id)
        .into_iter()
        .filter(|o| all || !o.is_complete())
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&orders)?);
    } else {
        print_orders(app, &orders);
    }
    Ok(())
}

fn add_order(app: &App, args: &AddOrderArgs) -> anyhow::Result<()> {
    let vehicle = app.vehicle(&args.vehicle)?;
    let new = forms::new_work_order(vehicle.id().clone(), args);

    match app.repo.add_work_order(new).map_err(|e| rejected(&e))? {
        Some(id) => {
            println!("Opened work order {id} on {}", vehicle.alias());
            Ok(())
        }
        None => bail!("work order could not be saved"),
    }
}

fn edit_order(app: &App, args: &EditOrderArgs) -> anyhow::Result<()> {
    let update = forms::work_order_update(args);
    if update.is_empty() {
        bail!("nothing to change; pass at least one field flag");
    }

    let id = RecordId::new(args.id.clone());
    if app
        .repo
        .update_work_order(&id, &update)
        .map_err(|e| rejected(&e))?
    {
        println!("Updated work order {id}");
        Ok(())
    } else {
        bail!("work order '{id}' could not be updated")
    }
}

fn print_orders(app: &App, orders: &[WorkOrder]) {
    if orders.is_empty() {
        println!("No work orders.");
        return;
    }
    let rows: Vec<Vec<String>> = orders
        .iter()
        .map(|order| {
            let eta = if order.eta_is_tbd() {
                "TBD".to_string()
            } else {
                order
                    .eta()
                    .map_or_else(|| "-".to_string(), |eta| app.datetime(eta))
            };
            let status = match order.completion_date() {
                Some(done) if order.is_complete() => format!("done {}", app.datetime(done)),
                _ if order.is_complete() => "done".to_string(),
                _ => "open".to_string(),
            };
            vec![
                order.id().to_string(),
                order.title().to_string(),
                format!("{:.2}", order.cost()),
                app.datetime(order.start_date()),
                eta,
                status,
            ]
        })
        .collect();
    print_table(&["ID", "TITLE", "COST", "STARTED", "ETA", "STATUS"], &rows);
}

// ----------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_unchecked(config_path.clone())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Database]");
                println!("  URI:            {}", or_unset(&config.database.uri));
                println!("  Name:           {}", or_unset(&config.database.name));
                println!();
                println!("[Display]");
                println!("  App title:      {}", config.display.app_title);
                println!("  Date format:    {}", config.display.date_format);
                println!();
                println!("[Photos]");
                println!("  Directory:      {}", config.photos_dir().display());
                println!(
                    "  Size:           {}x{}",
                    config.photos.width, config.photos.height
                );
            }
            if let Err(e) = config.validate() {
                warn!("Configuration is not usable: {}", e);
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}

// ----------------------------------------------------------------------
// Rendering helpers
// ----------------------------------------------------------------------

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn or_unset(value: &str) -> &str {
    if value.trim().is_empty() {
        "(not set)"
    } else {
        value
    }
}

fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    print_row(headers.iter().copied(), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    println!("{}", rule.join("  "));
    for row in rows {
        print_row(row.iter().map(String::as_str), &widths);
    }
}

fn print_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    println!("{}", line.join("  ").trim_end());
}
