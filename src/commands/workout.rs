use std::io::{self, Write};

use anyhow::Result;
use colored::Colorize;
use fitrack::{
    HistoryStore, SessionError, WorkoutSession,
    catalog::{self, PLANS, SqliteCatalog},
    models::{Difficulty, Exercise, SessionSetup, WorkoutRecord},
    runner::{self, TICK},
    types::{BODY_PARTS, Config, GOALS, OutputFmt, best_suggestion, canonical_body_part, canonical_goal, emit},
    utils::format_clock,
};
use sqlx::SqlitePool;
use tokio::io::BufReader;
use tracing::{info, warn};

use crate::cli::{StartArgs, WorkoutCmd};

pub async fn handle(cmd: WorkoutCmd, pool: &SqlitePool, cfg: &Config, fmt: OutputFmt) -> Result<()> {
    match cmd {
        WorkoutCmd::Plans => {
            emit(fmt, PLANS, || {
                println!("{}", "Plans:".cyan().bold());
                for (i, p) in PLANS.iter().enumerate() {
                    println!(
                        " {} • {} ({}, {}) {}",
                        format!("{}", i + 1).yellow(),
                        p.name.bold(),
                        p.difficulty,
                        p.duration,
                        format!("– {}", p.description).dimmed()
                    );
                }
                println!(
                    "\n{} start one with `fitrack workout start --plan <N>`",
                    "Note:".blue().bold()
                );
            });
            Ok(())
        }

        WorkoutCmd::Start(args) => {
            let Some(setup) = resolve_setup(args, cfg) else {
                return Ok(());
            };
            start(pool, setup, fmt).await
        }
    }
}

/// Builds the setup from a plan or from flags plus config defaults. Prints the
/// problem and returns `None` on invalid input.
fn resolve_setup(args: StartArgs, cfg: &Config) -> Option<SessionSetup> {
    if let Some(n) = args.plan {
        return match catalog::plan(n) {
            Some(p) => Some(p.setup()),
            None => {
                println!(
                    "{} no plan at index {} (see `workout plans`)",
                    "error:".red().bold(),
                    n
                );
                None
            }
        };
    }

    let defaults = SessionSetup::default();

    let goal = args
        .goal
        .or_else(|| cfg.get("goal").map(str::to_string))
        .unwrap_or(defaults.goal);
    let goal = match canonical_goal(&goal) {
        Some(g) => g.to_string(),
        None => {
            match best_suggestion(&goal, GOALS.iter().copied()) {
                Some(s) => println!(
                    "{} unknown goal `{}` -- did you mean: `{}`? training for strength",
                    "warning:".yellow().bold(),
                    goal,
                    s.green()
                ),
                None => println!(
                    "{} unknown goal `{}`, training for strength",
                    "warning:".yellow().bold(),
                    goal
                ),
            }
            goal
        }
    };

    let mut body_parts = Vec::new();
    for part in &args.body_part {
        match canonical_body_part(part) {
            Some(p) if !body_parts.iter().any(|b| b == p) => body_parts.push(p.to_string()),
            Some(_) => {}
            None => {
                match best_suggestion(part, BODY_PARTS.iter().copied()) {
                    Some(s) => println!(
                        "{} unknown body part `{}` -- did you mean: `{}`?",
                        "error:".red().bold(),
                        part,
                        s.green()
                    ),
                    None => println!("{} unknown body part `{}`", "error:".red().bold(), part),
                }
                println!("{} {}", "Allowed body parts:".cyan().bold(), BODY_PARTS.join(", "));
                return None;
            }
        }
    }

    let difficulty = match args.difficulty.or_else(|| cfg.get("difficulty").map(str::to_string)) {
        None => defaults.difficulty,
        Some(d) => match d.parse::<Difficulty>() {
            Ok(d) => d,
            Err(e) => {
                println!("{} {}", "error:".red().bold(), e);
                return None;
            }
        },
    };

    Some(SessionSetup {
        goal,
        body_parts,
        difficulty,
    })
}

/// Where interactive text goes: stdout normally, stderr under `--json` so
/// stdout carries only the final record.
fn prompt_writer(fmt: OutputFmt) -> Box<dyn Write> {
    match fmt {
        OutputFmt::Human => Box::new(io::stdout()),
        OutputFmt::Json => Box::new(io::stderr()),
    }
}

fn print_plan<W: Write>(out: &mut W, setup: &SessionSetup, exercises: &[Exercise]) -> io::Result<()> {
    let focus = if setup.body_parts.is_empty() {
        String::new()
    } else {
        format!(" focusing on {}", setup.body_parts.join(", "))
    };
    writeln!(
        out,
        "{} {} {}{}",
        "Workout:".cyan().bold(),
        setup.difficulty,
        setup.goal.to_lowercase().bold(),
        focus
    )?;

    writeln!(out, "{}", "Exercises:".cyan().bold())?;
    for (i, ex) in exercises.iter().enumerate() {
        writeln!(
            out,
            " {} • {} ({})",
            format!("{}", i + 1).yellow(),
            ex.name.bold(),
            ex.target_body_part.as_deref().unwrap_or(&ex.muscle)
        )?;
    }
    writeln!(out)?;
    runner::print_help(out)
}

async fn start(pool: &SqlitePool, setup: SessionSetup, fmt: OutputFmt) -> Result<()> {
    let mut out = prompt_writer(fmt);

    let catalog = SqliteCatalog::new(pool.clone());
    let exercises = catalog::select_for_setup(&catalog, &setup).await;

    let mut session = match WorkoutSession::start(exercises, setup) {
        Ok(s) => s,
        Err(SessionError::InvalidSession) => {
            writeln!(
                out,
                "{} no exercises to start -- import some with `exercise import` or pick another difficulty",
                "error:".red().bold()
            )?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    print_plan(&mut out, session.setup(), session.exercises())?;

    let record = runner::drive(&mut session, BufReader::new(tokio::io::stdin()), &mut out, TICK).await?;

    emit(fmt, &record, || print_summary(&record));

    let store = HistoryStore::new(pool.clone());
    match store.append(&record).await {
        Ok(true) => {
            info!(id = %record.id, "workout saved");
            writeln!(out, "{} workout saved (id: {})", "ok:".green().bold(), record.id)?;
        }
        Ok(false) => warn!(id = %record.id, "workout already in history"),
        Err(e) => {
            warn!(error = %e, "failed to save workout");
            writeln!(out, "{} workout could not be saved: {}", "warning:".yellow().bold(), e)?;
        }
    }

    Ok(())
}

fn print_summary(record: &WorkoutRecord) {
    println!(
        "\n{} completed {} of {} exercises in {}",
        "Workout complete!".green().bold(),
        record.completed_exercise_count,
        record.total_exercises,
        format_clock(record.duration_seconds)
    );
    println!(
        "{}: {}%",
        "Completion rate".cyan().bold(),
        record.completion_rate_percent
    );
}
