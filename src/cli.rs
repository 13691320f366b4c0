use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fitrack", version, about = "CLI workout tracker")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Emit machine-readable JSON instead of colorful text.
    #[arg(global = true, long)]
    pub json: bool,

    /// Log debug output to stderr (RUST_LOG overrides).
    #[arg(global = true, short, long)]
    pub verbose: bool,

    /// Database file (defaults to the `db` config key, then the data dir).
    #[arg(global = true, long, env = "FITRACK_DB")]
    pub db: Option<String>,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start and run workouts
    #[command(subcommand, visible_alias = "w")]
    Workout(WorkoutCmd),

    /// Finished workouts
    #[command(subcommand, visible_alias = "h")]
    History(HistoryCmd),

    /// Exercise catalog management
    #[command(subcommand, visible_alias = "ex")]
    Exercise(ExerciseCmd),

    /// Per-exercise progress notes
    #[command(subcommand, visible_alias = "p")]
    Progress(ProgressCmd),

    /// View or edit fitrack config
    #[command(subcommand)]
    Config(ConfigCmd),

    /// Show workouts in a calendar view
    #[command(visible_alias = "cal")]
    Calendar {
        /// Year to show (defaults to current year)
        #[arg(short, long)]
        year: Option<i32>,

        /// Month to show (1-12, defaults to current month)
        #[arg(short, long)]
        month: Option<u32>,
    },

    /// Show overall training status
    Status {
        /// Show a completion-rate graph
        #[arg(short, long)]
        graph: bool,
    },
}

//
// Commands
//

#[derive(Subcommand)]
pub enum WorkoutCmd {
    /// Pick exercises and run a workout interactively
    #[command(visible_alias = "s")]
    Start(StartArgs),

    /// List the ready-made workout plans
    #[command(visible_alias = "l")]
    Plans,
}

#[derive(Args, Default)]
pub struct StartArgs {
    /// Start a ready-made plan by number (see `workout plans`)
    #[arg(long, conflicts_with_all = ["goal", "body_part", "difficulty"])]
    pub plan: Option<usize>,

    /// Fitness goal, e.g. "Muscle Gain" (defaults to config `goal`, then General Fitness)
    #[arg(short, long)]
    pub goal: Option<String>,

    /// Body part to target; repeat for several
    #[arg(short, long = "body-part", value_name = "PART")]
    pub body_part: Vec<String>,

    /// beginner, intermediate or expert (defaults to config `difficulty`)
    #[arg(short, long)]
    pub difficulty: Option<String>,
}

#[derive(Subcommand)]
pub enum HistoryCmd {
    /// List finished workouts, newest first
    #[command(visible_alias = "l")]
    List,

    /// Show one workout in detail
    #[command(visible_alias = "s")]
    Show {
        /// Record id, or position from `history list`
        workout: String,
    },

    /// Delete every stored workout
    Clear {
        /// Don't ask for confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum ExerciseCmd {
    /// Add a new exercise
    #[command(visible_alias = "a")]
    Add {
        /// Exercise name
        name: String,

        /// Target muscle (e.g. chest, lats, quadriceps)
        #[arg(short, long)]
        muscle: String,

        /// Exercise type (e.g. strength, cardio, stretching)
        #[arg(short = 't', long = "type", default_value = "strength")]
        exercise_type: String,

        /// beginner, intermediate or expert
        #[arg(short, long, default_value = "beginner")]
        difficulty: String,

        /// How to perform it
        #[arg(short, long)]
        instructions: Option<String>,

        /// Equipment needed
        #[arg(short, long)]
        equipment: Option<String>,
    },

    /// Import exercises from a TOML file
    #[command(visible_alias = "i")]
    Import {
        /// Path to TOML file
        file: String,
    },

    /// List all exercises
    #[command(visible_alias = "l")]
    List {
        /// Filter by muscle
        #[arg(short, long)]
        muscle: Option<String>,
    },

    /// Delete an exercise
    #[command(visible_alias = "d")]
    Delete {
        /// Exercise index or name
        exercise: String,
    },
}

#[derive(Subcommand)]
pub enum ProgressCmd {
    /// Record progress for an exercise
    #[command(override_usage = "progress log <EXERCISE> [--sets N] [--reps N] [--weight KG] [--duration SECS]")]
    Log {
        /// Exercise name
        exercise: String,

        #[arg(short, long, default_value_t = 0)]
        sets: u32,

        #[arg(short, long, default_value_t = 0)]
        reps: u32,

        /// Weight in kg
        #[arg(short, long, default_value_t = 0.0)]
        weight: f32,

        /// Duration in seconds
        #[arg(short, long, default_value_t = 0)]
        duration: u32,
    },

    /// List recorded progress
    #[command(visible_alias = "l")]
    List {
        /// Only this exercise
        #[arg(short, long)]
        exercise: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Show all config keys
    List,

    /// Get the value of a key
    Get { key: String },

    /// Set or override a key
    Set { key: String, val: String },

    /// Remove a key
    Unset { key: String },
}
