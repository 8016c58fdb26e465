//! levelup CLI - A gamified daily habit tracker.

use levelup::action_log;
use levelup::cli::{Cli, CoachCommands, Commands, ConfigCommands};
use levelup::clock::FixedClock;
use levelup::coach::{Coach, HttpCompletion};
use levelup::commands::{self, CommandResult};
use levelup::config::{
    ConfigOverrides, OutputFormat, ResolvedConfig, config_path, load_config, resolve_config,
};
use levelup::models::Catalog;
use levelup::storage::{RecordStore, open_backend};
use levelup::Tracker;
use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (e.g. `debug`, `levelup=trace`).
const LOG_ENV: &str = "LU_LOG";

fn main() {
    init_logging();

    let cli = Cli::parse();

    // Serialize command for logging
    let (cmd_name, args_json) = serialize_command(&cli.command);

    let ctx = match Context::load(&cli) {
        Ok(ctx) => ctx,
        Err(e) => exit_with_error(&e, cli.human_readable),
    };
    let human = ctx.human();

    let start = Instant::now();
    let result = run_command(cli.command, &ctx, human);
    let duration = start.elapsed().as_millis() as u64;

    let (success, error) = match &result {
        Ok(_) => (true, None),
        Err(e) => (false, Some(e.to_string())),
    };

    if ctx.config.action_log.value {
        let log_path = action_log::log_path(ctx.config.data_dir());
        action_log::log_action(&log_path, &cmd_name, args_json, success, error, duration);
    }

    if let Err(e) = result {
        exit_with_error(&e, human);
    }
}

/// Route `tracing` output to stderr, filtered by `LU_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn exit_with_error(e: &levelup::Error, human: bool) -> ! {
    if human {
        eprintln!("Error: {}", e);
    } else {
        eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
    }
    process::exit(1);
}

/// Resolved settings for one invocation.
struct Context {
    config_path: PathBuf,
    config: ResolvedConfig,
    today: Option<chrono::NaiveDate>,
}

impl Context {
    fn load(cli: &Cli) -> levelup::Result<Self> {
        let config_path = config_path()?;
        let file = load_config(&config_path)?;

        let mut overrides = ConfigOverrides::new();
        if cli.human_readable {
            overrides = overrides.with_output_format(OutputFormat::Human);
        }
        if let Some(ref dir) = cli.data_dir {
            overrides = overrides.with_data_dir(dir.clone());
        }
        let config = resolve_config(&file, &overrides)?;
        tracing::debug!(
            data_dir = %config.data_dir().display(),
            source = %config.data_dir.source,
            "configuration resolved"
        );

        Ok(Self {
            config_path,
            config,
            today: cli.today,
        })
    }

    fn human(&self) -> bool {
        self.config.output_format() == OutputFormat::Human
    }

    fn catalog(&self) -> levelup::Result<Catalog> {
        match &self.config.catalog {
            Some(path) => Catalog::from_json_file(&path.value),
            None => Ok(Catalog::default()),
        }
    }

    fn tracker(&self) -> levelup::Result<Tracker<Box<dyn RecordStore>>> {
        let backend = open_backend(self.config.backend.value, self.config.data_dir());
        let tracker = Tracker::new(backend, self.catalog()?);
        Ok(match self.today {
            Some(date) => tracker.with_clock(FixedClock(date)),
            None => tracker,
        })
    }

    fn coach(&self) -> Coach<HttpCompletion> {
        Coach::new(HttpCompletion::new(
            &self.config.coach_endpoint.value,
            &self.config.coach_model.value,
            self.config.api_key().map(str::to_string),
        ))
    }
}

fn run_command(command: Commands, ctx: &Context, human: bool) -> levelup::Result<()> {
    match command {
        Commands::Status => {
            let tracker = ctx.tracker()?;
            output(&commands::status(&tracker), human);
        }

        Commands::Today => {
            let tracker = ctx.tracker()?;
            output(&commands::today(&tracker), human);
        }

        Commands::Mark {
            category,
            task,
            status,
        } => {
            let mut tracker = ctx.tracker()?;
            let result = commands::mark(&mut tracker, &category, &task, &status)?;
            output(&result, human);
        }

        Commands::Hardcore { state } => {
            let mut tracker = ctx.tracker()?;
            let result = match state {
                Some(state) => commands::hardcore(&mut tracker, state.enabled()),
                None => commands::hardcore_show(&tracker),
            };
            output(&result, human);
        }

        Commands::Habit { id } => {
            let mut tracker = ctx.tracker()?;
            let result = commands::toggle_habit(&mut tracker, &id)?;
            output(&result, human);
        }

        Commands::Streak => {
            let tracker = ctx.tracker()?;
            output(&commands::streak(&tracker), human);
        }

        Commands::Level => {
            let tracker = ctx.tracker()?;
            output(&commands::level(&tracker), human);
        }

        Commands::Rewards => {
            let tracker = ctx.tracker()?;
            output(&commands::rewards(&tracker), human);
        }

        Commands::Claim { reward } => {
            let mut tracker = ctx.tracker()?;
            let result = commands::claim(&mut tracker, &reward)?;
            output(&result, human);
        }

        Commands::Catalog { check } => {
            let catalog = ctx.catalog()?;
            if check {
                output(&commands::catalog_check(&catalog)?, human);
            } else {
                output(&commands::catalog_show(&catalog), human);
            }
        }

        Commands::Coach { command } => {
            let coach = ctx.coach();
            match command {
                CoachCommands::Chat { message, history } => {
                    let result = commands::coach_chat(&coach, &message, history.as_deref())?;
                    output(&result, human);
                }
                CoachCommands::Mood { entry } => {
                    output(&commands::coach_mood(&coach, &entry)?, human);
                }
                CoachCommands::Plan { habits } => {
                    let tracker = ctx.tracker()?;
                    output(&commands::coach_plan(&coach, &tracker, &habits)?, human);
                }
                CoachCommands::Scale => {
                    let tracker = ctx.tracker()?;
                    output(&commands::coach_scale(&coach, &tracker)?, human);
                }
                CoachCommands::Summary => {
                    let tracker = ctx.tracker()?;
                    output(&commands::coach_summary(&coach, &tracker)?, human);
                }
                CoachCommands::Insights => {
                    let tracker = ctx.tracker()?;
                    output(&commands::coach_insights(&coach, &tracker)?, human);
                }
                CoachCommands::Reward => {
                    let tracker = ctx.tracker()?;
                    output(&commands::coach_reward(&coach, &tracker)?, human);
                }
            }
        }

        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                output(&commands::config_show(&ctx.config_path, &ctx.config), human);
            }
            ConfigCommands::Get { key } => {
                output(&commands::config_get(&ctx.config_path, &key)?, human);
            }
            ConfigCommands::Set { key, value } => {
                output(&commands::config_set(&ctx.config_path, &key, &value)?, human);
            }
        },
    }

    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: CommandResult>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}

/// Command name and arguments for the action log.
fn serialize_command(command: &Commands) -> (String, serde_json::Value) {
    use serde_json::json;

    match command {
        Commands::Status => ("status".to_string(), json!({})),
        Commands::Today => ("today".to_string(), json!({})),
        Commands::Mark {
            category,
            task,
            status,
        } => (
            "mark".to_string(),
            json!({ "category": category, "task": task, "status": status }),
        ),
        Commands::Hardcore { state } => (
            "hardcore".to_string(),
            json!({ "state": state.map(|s| s.enabled()) }),
        ),
        Commands::Habit { id } => ("habit".to_string(), json!({ "id": id })),
        Commands::Streak => ("streak".to_string(), json!({})),
        Commands::Level => ("level".to_string(), json!({})),
        Commands::Rewards => ("rewards".to_string(), json!({})),
        Commands::Claim { reward } => ("claim".to_string(), json!({ "reward": reward })),
        Commands::Catalog { check } => ("catalog".to_string(), json!({ "check": check })),
        Commands::Coach { command } => match command {
            CoachCommands::Chat { message, history } => (
                "coach chat".to_string(),
                json!({ "message": message, "history": history }),
            ),
            CoachCommands::Mood { entry } => ("coach mood".to_string(), json!({ "entry": entry })),
            CoachCommands::Plan { habits } => {
                ("coach plan".to_string(), json!({ "habits": habits }))
            }
            CoachCommands::Scale => ("coach scale".to_string(), json!({})),
            CoachCommands::Summary => ("coach summary".to_string(), json!({})),
            CoachCommands::Insights => ("coach insights".to_string(), json!({})),
            CoachCommands::Reward => ("coach reward".to_string(), json!({})),
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => ("config show".to_string(), json!({})),
            ConfigCommands::Get { key } => {
                ("config get".to_string(), json!({ "setting": key }))
            }
            ConfigCommands::Set { key, value } => (
                "config set".to_string(),
                json!({ "setting": key, "value": value }),
            ),
        },
    }
}
