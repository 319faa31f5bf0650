mod config_cmd;
mod history;
mod plan;
mod preferences;
mod workout;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

pub use plan::parse_plan;

#[derive(Parser)]
#[command(name = "ai-trainer")]
#[command(about = "Run AI-generated workout plans in the terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable coach features (no network requests)
    #[arg(long, global = true)]
    offline: bool,

    /// Path to configuration file
    #[arg(long, global = true, env = "AI_TRAINER_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run workouts
    #[command(subcommand)]
    Workout(WorkoutSubcommands),

    /// Manage workout plans
    #[command(subcommand)]
    Plan(PlanSubcommands),

    /// Browse completed workouts
    #[command(subcommand)]
    History(HistorySubcommands),

    /// Equipment and goals used for exercise suggestions
    #[command(subcommand)]
    Preferences(PreferencesSubcommands),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigSubcommands),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum WorkoutSubcommands {
    /// Start (or resume) a workout from the active plan
    Start {
        /// Day label, e.g. "Monday"
        #[arg(short, long)]
        day: Option<String>,
    },

    /// Estimate how long each day of the active plan takes
    Estimate,

    /// Ask the coach to describe an exercise
    Describe {
        /// Exercise name
        name: String,
    },
}

#[derive(Subcommand)]
enum PlanSubcommands {
    /// Import a plan from a JSON file
    Import {
        /// Plan file
        file: PathBuf,

        /// Name for the plan
        #[arg(short, long)]
        name: Option<String>,

        /// Make it the active plan
        #[arg(long)]
        activate: bool,
    },

    /// Show the active plan
    Show {
        /// Only this day
        #[arg(short, long)]
        day: Option<String>,
    },

    /// List imported plans
    List,

    /// Set the active plan
    Use {
        /// Plan ID
        id: String,
    },
}

#[derive(Subcommand)]
enum HistorySubcommands {
    /// List recent workouts
    List {
        /// Number of workouts to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show workout details
    Show {
        /// Workout ID
        id: String,
    },

    /// Delete a workout
    Delete {
        /// Workout ID
        id: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Export all workouts as JSON
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PreferencesSubcommands {
    /// Update preferences
    Set {
        /// Available equipment, comma separated
        #[arg(short, long, value_delimiter = ',')]
        equipment: Option<Vec<String>>,

        /// Fitness level
        #[arg(short, long)]
        level: Option<String>,

        /// Training goal
        #[arg(short, long)]
        goal: Option<String>,
    },

    /// Show preferences
    Show,
}

#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Show current configuration
    Show,

    /// Edit configuration file
    Edit,

    /// Initialize configuration with defaults
    Init {
        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Whether this command takes over the terminal
    pub fn uses_terminal_ui(&self) -> bool {
        matches!(
            self.command,
            Commands::Workout(WorkoutSubcommands::Start { .. })
        )
    }

    fn config_path(&self) -> Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => Config::config_file(),
        }
    }

    pub async fn execute(self) -> Result<()> {
        let config_path = self.config_path()?;
        let load_config = || Config::load_from(&config_path);
        let offline = self.offline;

        if offline {
            tracing::info!("Offline mode");
        }

        match self.command {
            Commands::Workout(subcmd) => match subcmd {
                WorkoutSubcommands::Start { day } => {
                    workout::start_workout(&load_config()?, offline, day).await
                }
                WorkoutSubcommands::Estimate => workout::estimate().await,
                WorkoutSubcommands::Describe { name } => {
                    workout::describe(&load_config()?, offline, &name).await
                }
            },
            Commands::Plan(subcmd) => match subcmd {
                PlanSubcommands::Import {
                    file,
                    name,
                    activate,
                } => plan::import_plan(&file, name, activate).await,
                PlanSubcommands::Show { day } => plan::show_plan(day).await,
                PlanSubcommands::List => plan::list_plans().await,
                PlanSubcommands::Use { id } => plan::activate_plan(&id).await,
            },
            Commands::History(subcmd) => match subcmd {
                HistorySubcommands::List { limit } => history::list_sessions(&load_config()?, limit).await,
                HistorySubcommands::Show { id } => history::show_session(&load_config()?, &id).await,
                HistorySubcommands::Delete { id, force } => {
                    history::delete_session(&id, force).await
                }
                HistorySubcommands::Export { output } => {
                    history::export_sessions(output.as_deref()).await
                }
            },
            Commands::Preferences(subcmd) => match subcmd {
                PreferencesSubcommands::Set {
                    equipment,
                    level,
                    goal,
                } => preferences::set_preferences(equipment, level, goal).await,
                PreferencesSubcommands::Show => preferences::show_preferences().await,
            },
            Commands::Config(subcmd) => match subcmd {
                ConfigSubcommands::Show => config_cmd::show_config(&config_path).await,
                ConfigSubcommands::Edit => config_cmd::edit_config(&config_path).await,
                ConfigSubcommands::Init { force } => {
                    config_cmd::init_config(&config_path, force).await
                }
            },
            Commands::Completions { shell } => {
                generate_completions(shell);
                Ok(())
            }
        }
    }
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
