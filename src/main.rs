mod cli;
mod config;
mod day;
mod db;
mod habit;
mod history;
mod record;
mod service;

use crate::cli::{Cli, Commands, ConfigCommands, HabitCommands};
use crate::config::Config;
use crate::day::DayKey;
use crate::habit::{DailySummary, Habit};
use crate::history::{GridCell, build_day_grid};
use crate::db::ErrorKind;
use crate::service::{App, DayView, ErrorEntry, Phase};
use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { command } => handle_config_command(command),
        command => {
            let config = Config::load_or_default()?;
            let db_path = cli.db.or_else(|| config.db_path.clone());

            let mut app = open_app(db_path).await?;
            let result = run_command(&mut app, &config, command).await;
            app.shutdown().await.context("Failed to close habit store")?;

            result
        }
    }
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load_or_default()?;
            config.set_value(&key, &value)?;
            config.save()?;

            println!("Config saved: {key} = {value}");
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let config = Config::load_or_default()?;
            let value = config
                .get_value(&key)
                .with_context(|| format!("Unsupported config key: {key}"))?;

            println!("{value}");
            Ok(())
        }
    }
}

async fn open_app(db_path: Option<PathBuf>) -> Result<App> {
    let mut app = App::new();
    app.start(db_path);
    app.settle().await;

    if let Phase::Failed(error) = app.phase() {
        match error.kind() {
            ErrorKind::IoFailure => bail!(
                "Failed to open habit store: {error}\nCheck the path with `todaily config get db_path`."
            ),
            _ => bail!("Failed to load habits: {error}"),
        }
    }

    Ok(app)
}

async fn run_command(app: &mut App, config: &Config, command: Commands) -> Result<()> {
    match command {
        Commands::Today => print_day(app),
        Commands::Show { date } => {
            select_day(app, &date).await?;
            print_day(app)
        }
        Commands::Check { id, date } => set_done(app, id, true, date).await,
        Commands::Uncheck { id, date } => set_done(app, id, false, date).await,
        Commands::Habits { command } => handle_habit_command(app, command).await,
        Commands::History => {
            app.refresh_summaries();
            app.settle().await;
            ensure_no_errors(app)?;
            print_history(app, config);
            Ok(())
        }
        Commands::Status => handle_status(app).await,
        Commands::Config { command } => handle_config_command(command),
    }
}

async fn select_day(app: &mut App, raw: &str) -> Result<()> {
    let date = DayKey::parse(raw)?;
    app.select_day(date);
    app.settle().await;
    ensure_no_errors(app)
}

async fn set_done(app: &mut App, id: i64, done: bool, date: Option<String>) -> Result<()> {
    if let Some(raw) = date.as_deref() {
        select_day(app, raw).await?;
    }

    if !app.set_done(id, done, Local::now()) {
        let shown = app
            .record()
            .map(|record| record.date.to_string())
            .unwrap_or_default();
        bail!("No habit with id {id} on {shown}");
    }
    app.settle().await;
    ensure_no_errors(app)?;

    print_day(app)
}

async fn handle_habit_command(app: &mut App, command: HabitCommands) -> Result<()> {
    app.open_habit_screen();
    app.settle().await;
    ensure_no_errors(app)?;

    match command {
        HabitCommands::List => {}
        HabitCommands::Add { content } => {
            if content.trim().is_empty() {
                bail!("Habit text cannot be empty");
            }
            app.add_habit(&content, Local::now());
        }
        HabitCommands::Edit { id, content } => {
            if content.trim().is_empty() {
                bail!("Habit text cannot be empty");
            }
            if !app.edit_habit(id, &content) {
                bail!("No active habit with id {id}");
            }
        }
        HabitCommands::Remove { id } => {
            if !app.remove_habit(id, Local::now()) {
                bail!("No active habit with id {id}");
            }
        }
        HabitCommands::Apply => {
            app.apply_to_today();
            app.settle().await;
            ensure_no_errors(app)?;
            return print_day(app);
        }
    }

    app.settle().await;
    ensure_no_errors(app)?;
    print_template(app.habit_screen().unwrap_or_default());
    app.close_habit_screen();

    Ok(())
}

async fn handle_status(app: &App) -> Result<()> {
    let store = app.store().context("Habit store is not open")?;
    let template = store.get_template().await?;
    let days = store.count_day_records().await?;

    println!("Todaily status");
    println!("- db_path: {}", store.path().await?.display());
    println!(
        "- habits: {} active, {} removed",
        template.iter().filter(|habit| !habit.is_deleted()).count(),
        template.iter().filter(|habit| habit.is_deleted()).count()
    );
    println!("- recorded_days: {days}");
    println!(
        "- first_recorded_day: {}",
        app.summaries()
            .keys()
            .next()
            .map(DayKey::pretty)
            .unwrap_or_else(|| "none".to_string())
    );

    Ok(())
}

fn ensure_no_errors(app: &mut App) -> Result<()> {
    if app.errors().is_empty() {
        return Ok(());
    }

    let mut messages = Vec::with_capacity(app.errors().len());
    while let Some(entry) = app.dismiss_error(0) {
        messages.push(describe_error(&entry));
    }
    bail!(messages.join("\n"))
}

fn describe_error(entry: &ErrorEntry) -> String {
    match entry.error.kind() {
        ErrorKind::InvalidDate => format!("{}. Dates look like 240301.", entry.error),
        ErrorKind::FutureDate => format!("{}. Only today and past days can be shown.", entry.error),
        ErrorKind::DecodeFailure => format!(
            "Error {}: {}. The habit database holds data this version cannot read.",
            entry.action, entry.error
        ),
        _ => format!("Error {}: {}", entry.action, entry.error),
    }
}

fn print_day(app: &App) -> Result<()> {
    let DayView { date, habits } = app.record().context("No day is loaded")?;

    println!("{}  [{date}]", date.pretty());

    if habits.is_empty() {
        if *date == DayKey::today() {
            println!("  No habits created yet!");
            println!("  Run `todaily habits add <text>` and `todaily habits apply`.");
        } else {
            println!("  You didn't have any habits set on this day.");
        }
        return Ok(());
    }

    for habit in habits {
        let mark = if habit.is_done() { "x" } else { " " };
        println!("  [{mark}] {:>3}  {}", habit.id, habit.content);
    }

    if let Some(summary) = app.summaries().get(date) {
        println!("{}", describe_summary(summary, habits.len()));
    }

    Ok(())
}

fn describe_summary(summary: &DailySummary, total: usize) -> String {
    format!(
        "{}/{total} complete ({:.0}%)",
        summary.num_complete,
        summary.percent_complete * 100.0
    )
}

fn print_template(template: &[Habit]) {
    let active = template
        .iter()
        .filter(|habit| !habit.is_deleted())
        .collect::<Vec<_>>();

    if active.is_empty() {
        println!("No habits yet. Add one with `todaily habits add <text>`.");
        return;
    }

    println!("Daily habits");
    for habit in active {
        println!(
            "  {:>3}  {}  (since {})",
            habit.id,
            habit.content,
            habit.created_at.format("%b %-d, %Y")
        );
    }
}

fn print_history(app: &App, config: &Config) {
    let today = DayKey::today().date();
    let rows = build_day_grid(app.summaries(), today, config.history_months);

    println!("     S M T W T F S");
    for row in rows {
        let cells = row
            .cells
            .iter()
            .map(|cell| cell_glyph(cell).to_string())
            .collect::<Vec<_>>()
            .join(" ");
        println!("{:<4} {cells}", row.month_label.unwrap_or_default());
    }
}

fn cell_glyph(cell: &GridCell) -> char {
    if cell.in_future {
        return ' ';
    }

    match cell.summary.map(|summary| summary.percent_complete) {
        Some(ratio) if ratio >= 1.0 => '█',
        Some(ratio) if ratio >= 0.67 => '▓',
        Some(ratio) if ratio >= 0.34 => '▒',
        Some(ratio) if ratio > 0.0 => '░',
        _ => '·',
    }
}

#[cfg(test)]
mod tests {
    use super::describe_error;
    use crate::db::StoreError;
    use crate::service::ErrorEntry;

    fn entry(error: StoreError) -> ErrorEntry {
        ErrorEntry {
            action: "selecting day".to_string(),
            error,
        }
    }

    #[test]
    fn date_errors_read_as_user_mistakes() {
        let future = describe_error(&entry(StoreError::FutureDate("991231".to_string())));
        assert!(future.contains("Only today and past days"));
        assert!(!future.starts_with("Error"));

        let invalid = describe_error(&entry(StoreError::InvalidDate("99-1".to_string())));
        assert!(invalid.contains("Dates look like 240301"));
    }

    #[test]
    fn store_failures_name_the_action() {
        let message = describe_error(&entry(StoreError::Closed));
        assert_eq!(message, "Error selecting day: store is not open");
    }
}
