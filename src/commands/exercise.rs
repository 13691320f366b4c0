use std::{collections::BTreeSet, path::Path};

use anyhow::{Context, Result};
use colored::Colorize;
use fitrack::{
    catalog::{AddOutcome, CatalogEntry, SqliteCatalog},
    models::{Difficulty, Exercise},
    types::{ALLOWED_MUSCLES, ExerciseDef, ExerciseImport, OutputFmt, best_muscle_suggestion, canonical_muscle, emit},
    utils::plain_len,
};
use sqlx::SqlitePool;

use crate::cli::ExerciseCmd;

/// Why an exercise definition was refused.
#[derive(Debug, PartialEq)]
enum Rejected {
    EmptyName,
    Muscle(String),
    Difficulty(String),
}

fn validate(def: ExerciseDef) -> Result<Exercise, Rejected> {
    let name = def.name.trim();
    if name.is_empty() {
        return Err(Rejected::EmptyName);
    }

    let muscle = canonical_muscle(&def.muscle).ok_or_else(|| Rejected::Muscle(def.muscle.clone()))?;
    let difficulty = def
        .difficulty
        .parse::<Difficulty>()
        .map_err(|_| Rejected::Difficulty(def.difficulty.clone()))?;

    Ok(Exercise {
        name: name.to_string(),
        muscle,
        exercise_type: def.exercise_type.trim().to_ascii_lowercase(),
        difficulty,
        instructions: def.instructions.unwrap_or_default(),
        equipment: def.equipment,
        target_body_part: None,
    })
}

fn unknown_muscle_msg(muscle: &str) -> String {
    match best_muscle_suggestion(muscle) {
        Some(s) => format!("unknown muscle `{}` -- did you mean: `{}`?", muscle, s.green()),
        None => format!("unknown muscle `{}`", muscle),
    }
}

fn allowed_muscles() -> String {
    let mut all: Vec<_> = ALLOWED_MUSCLES.iter().copied().collect();
    all.sort_unstable();
    all.join(", ")
}

pub async fn handle(cmd: ExerciseCmd, pool: &SqlitePool, fmt: OutputFmt) -> Result<()> {
    let catalog = SqliteCatalog::new(pool.clone());

    match cmd {
        ExerciseCmd::Add {
            name,
            muscle,
            exercise_type,
            difficulty,
            instructions,
            equipment,
        } => {
            let def = ExerciseDef {
                name,
                muscle,
                exercise_type,
                difficulty,
                instructions,
                equipment,
            };

            let ex = match validate(def) {
                Ok(ex) => ex,
                Err(Rejected::EmptyName) => {
                    println!("{} exercise name must not be empty", "error:".red().bold());
                    return Ok(());
                }
                Err(Rejected::Muscle(m)) => {
                    println!("{} {}", "error:".red().bold(), unknown_muscle_msg(&m));
                    println!("{} {}", "Allowed muscles:".cyan().bold(), allowed_muscles());
                    return Ok(());
                }
                Err(Rejected::Difficulty(d)) => {
                    println!(
                        "{} unknown difficulty `{}` (beginner, intermediate or expert)",
                        "error:".red().bold(),
                        d
                    );
                    return Ok(());
                }
            };

            match catalog.add(&ex).await? {
                AddOutcome::Inserted => {
                    println!("{} Exercise \"{}\" added", "info:".blue().bold(), ex.name)
                }
                AddOutcome::AlreadyExists => println!(
                    "{} Exercise \"{}\" already exists -- use `ex list` to view all exercises",
                    "warning:".yellow().bold(),
                    ex.name
                ),
            }
        }

        ExerciseCmd::Import { file } => {
            let path = Path::new(&file);
            let toml_str = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Could not read file: `{}`", file))?;

            let import: ExerciseImport = toml::from_str(&toml_str)
                .context("Failed to parse TOML: Expected `[[exercise]] entries`")?;

            if import.exercise.is_empty() {
                println!("{}", "warning: no [[exercise]] entries found".yellow().bold());
                return Ok(());
            }

            let mut inserted = 0;
            let mut skipped = 0;
            let mut unknowns = BTreeSet::new();

            for def in import.exercise {
                let name = def.name.clone();
                let ex = match validate(def) {
                    Ok(ex) => ex,
                    Err(Rejected::EmptyName) => {
                        println!("{} entry skipped – empty name", "warning:".yellow().bold());
                        skipped += 1;
                        continue;
                    }
                    Err(Rejected::Muscle(m)) => {
                        println!(
                            "{} `{}` skipped – {}",
                            "warning:".yellow().bold(),
                            name,
                            unknown_muscle_msg(&m)
                        );
                        unknowns.insert(m);
                        skipped += 1;
                        continue;
                    }
                    Err(Rejected::Difficulty(d)) => {
                        println!(
                            "{} `{}` skipped – unknown difficulty `{}`",
                            "warning:".yellow().bold(),
                            name,
                            d
                        );
                        skipped += 1;
                        continue;
                    }
                };

                match catalog.add(&ex).await? {
                    AddOutcome::Inserted => {
                        inserted += 1;
                        println!("{} `{}`", "ok:".green().bold(), ex.name);
                    }
                    AddOutcome::AlreadyExists => {
                        skipped += 1;
                        println!("{} `{}` (already exists)", "info:".blue().bold(), ex.name);
                    }
                }
            }

            println!(
                "\n{} {} inserted, {} skipped",
                "Summary:".cyan().bold(),
                inserted,
                skipped
            );

            if !unknowns.is_empty() {
                let bad = unknowns.into_iter().collect::<Vec<_>>().join(", ");
                println!();
                println!("{} {}", "Unknown muscles:".yellow().bold(), bad);
                println!("{} {}", "Allowed muscles:".cyan().bold(), allowed_muscles());
                println!(
                    "{} Muscles are case-insensitive and spaces work too (e.g. `Lower Back` == `lower_back`)",
                    "Note:".blue().bold()
                )
            }
        }

        ExerciseCmd::List { muscle } => {
            let filter = match muscle {
                None => None,
                Some(m) => match canonical_muscle(&m) {
                    Some(c) => Some(c),
                    None => {
                        println!("{} {}", "error:".red().bold(), unknown_muscle_msg(&m));
                        return Ok(());
                    }
                },
            };

            let rows = catalog.list(filter.as_deref()).await?;
            emit(fmt, &rows, || print_list(&rows));
        }

        ExerciseCmd::Delete { exercise } => match catalog.delete(&exercise).await? {
            Some(name) => println!("{} deleted exercise `{}`", "ok:".green().bold(), name),
            None => println!("{} no such exercise `{}`", "error:".red().bold(), exercise),
        },
    }

    Ok(())
}

fn print_list(rows: &[CatalogEntry]) {
    println!("{}", "Exercises:".cyan().bold());

    if rows.is_empty() {
        println!("{}", "  (no exercises found)".dimmed());
        return;
    }

    let idx_w = rows.iter().map(|e| e.idx.to_string().len()).max().unwrap_or(1);

    let mut left = Vec::<String>::new();
    let mut right = Vec::<String>::new();

    for row in rows {
        let ex = &row.exercise;
        let idx_col = format!("{:>width$}", row.idx, width = idx_w).yellow();
        let kit = match &ex.equipment {
            Some(e) if !e.is_empty() => format!("– {}", e).dimmed().to_string(),
            _ => String::new(),
        };
        left.push(format!(
            " {} • {} ({}, {}) {}",
            idx_col,
            ex.name.bold(),
            ex.muscle.yellow(),
            ex.exercise_type,
            kit
        ));
        right.push(format!(
            "{} {}",
            ex.difficulty,
            format!("added {}", row.created_at.get(..10).unwrap_or(&row.created_at)).dimmed()
        ));
    }

    let printable_pad = left.iter().map(|s| plain_len(s)).max().unwrap_or(0);

    for (l, r) in left.into_iter().zip(right) {
        let total_pad = printable_pad + (l.chars().count() - plain_len(&l));
        println!("{:<total_pad$} {} {}", l, "|".blue(), r, total_pad = total_pad);
    }
}
