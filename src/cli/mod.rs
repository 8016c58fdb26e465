//! CLI argument definitions for levelup.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("LU_GIT_DESCRIBE"),
    ", built ",
    env!("LU_BUILD_DATE"),
    ")"
);

/// levelup - Turn daily habits into points, streaks, levels and rewards.
///
/// Start with `lu today` to see today's tasks, then `lu mark` them as you go.
#[derive(Parser, Debug)]
#[command(name = "lu")]
#[command(author, version = VERSION, about = "Gamified daily habit tracker", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Directory holding the progress records.
    /// Can also be set via LU_DATA_DIR or `data-dir` in config.kdl.
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Pretend today is this date (YYYY-MM-DD)
    #[arg(long, global = true, env = "LU_TODAY", hide = true)]
    pub today: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Today's points, streak, level and reward state
    Status,

    /// Today's tasks and per-category points
    Today,

    /// Set a task's status for today
    Mark {
        /// Category id (e.g., fitness)
        category: String,

        /// Task id (e.g., workout)
        task: String,

        /// full, half, missed or unset
        status: String,
    },

    /// Show or switch hardcore mode (negative habits cost points)
    Hardcore {
        /// on or off; omit to show the current setting
        #[arg(value_enum)]
        state: Option<Switch>,
    },

    /// Toggle a negative habit for today
    Habit {
        /// Negative habit id (e.g., skip-workout)
        id: String,
    },

    /// Current and longest streak
    Streak,

    /// XP total and level
    Level,

    /// Weekly average and reward state
    Rewards,

    /// Claim an unlocked reward
    Claim {
        /// Reward id (e.g., solo-movie)
        reward: String,
    },

    /// List the task catalog
    Catalog {
        /// Validate the catalog instead of listing it
        #[arg(long)]
        check: bool,
    },

    /// Ask the habit coach
    Coach {
        #[command(subcommand)]
        command: CoachCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn enabled(self) -> bool {
        self == Switch::On
    }
}

/// Coach subcommands
#[derive(Subcommand, Debug)]
pub enum CoachCommands {
    /// Chat with the coach
    Chat {
        /// Your message
        message: String,

        /// JSON file with earlier turns: [{"role": "user", "content": "..."}]
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Analyze the mood of a journal entry
    Mood {
        /// Journal entry text
        entry: String,
    },

    /// Micro-habit suggestions for missed habits
    Plan {
        /// Habits as `name` or `name:days-missed`; defaults to today's unfinished tasks
        habits: Vec<String>,
    },

    /// Suggest category weight adjustments
    Scale,

    /// Motivational summary of today
    Summary,

    /// Insights from recent history
    Insights,

    /// Personalised reward idea
    Reward,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration and where each value comes from
    Show,

    /// Get a value from config.kdl
    Get {
        /// Config key (e.g., output-format)
        key: String,
    },

    /// Set a value in config.kdl
    Set {
        /// Config key (e.g., output-format)
        key: String,

        /// Value to set
        value: String,
    },
}
