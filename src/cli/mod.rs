use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "todaily", about = "Track the habits you want to keep every day")]
pub struct Cli {
    /// Database file to use instead of the configured one.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show today's habits.
    Today,
    /// Show the habits of a past day.
    Show {
        #[arg(long)]
        date: String,
    },
    /// Mark a habit done.
    Check {
        id: i64,
        #[arg(long)]
        date: Option<String>,
    },
    /// Mark a habit not done.
    Uncheck {
        id: i64,
        #[arg(long)]
        date: Option<String>,
    },
    Habits {
        #[command(subcommand)]
        command: HabitCommands,
    },
    /// Calendar of completion over the last months.
    History,
    Status,
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum HabitCommands {
    List,
    Add { content: String },
    Edit { id: i64, content: String },
    Remove { id: i64 },
    /// Merge the habit list into today, keeping today's check marks.
    Apply,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    Set { key: String, value: String },
    Get { key: String },
}
