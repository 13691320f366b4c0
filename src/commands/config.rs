use anyhow::Result;
use colored::Colorize;
use fitrack::{
    models::Difficulty,
    progress::USER_KEY,
    types::{Config, GOALS, OutputFmt, best_suggestion, canonical_goal, emit},
};
use serde::Serialize;

use crate::cli::ConfigCmd;

/// Keys the program reads.
const KNOWN_KEYS: &[&str] = &[USER_KEY, "db", "difficulty", "goal"];

#[derive(Debug, PartialEq, Serialize)]
struct Entry<'a> {
    key: &'a str,
    value: Option<&'a str>,
}

/// Normalizes `val` for keys with a fixed vocabulary. `Err` carries the
/// message to show.
fn check(key: &str, val: &str) -> Result<String, String> {
    match key {
        "difficulty" => val
            .parse::<Difficulty>()
            .map(|d| d.api_value().to_string())
            .map_err(|e| e.to_string()),
        "goal" => canonical_goal(val).map(str::to_string).ok_or_else(|| {
            match best_suggestion(val, GOALS.iter().copied()) {
                Some(s) => format!("unknown goal `{}` -- did you mean: `{}`?", val, s),
                None => format!("unknown goal `{}` (one of: {})", val, GOALS.join(", ")),
            }
        }),
        "db" | USER_KEY if val.trim().is_empty() => Err(format!("`{}` must not be empty", key)),
        _ => Ok(val.to_string()),
    }
}

pub async fn handle(cmd: ConfigCmd, fmt: OutputFmt) -> Result<()> {
    let config_path = Config::path()?;
    let mut cfg = Config::load(&config_path)?;

    match cmd {
        ConfigCmd::List => emit(fmt, &cfg, || {
            if cfg.map.is_empty() {
                println!("{}", "(no config set)".dimmed());
            } else {
                println!("{}", "Config:".cyan().bold());
                for (k, v) in &cfg.map {
                    println!("  {} = {}", k.green(), v);
                }
            }
        }),

        ConfigCmd::Get { key } => {
            let entry = Entry {
                key: &key,
                value: cfg.get(&key),
            };
            emit(fmt, &entry, || match entry.value {
                Some(val) => println!("{}", val),
                None => println!("{} key `{}` not set", "warning:".yellow().bold(), key),
            });
        }

        ConfigCmd::Set { key, val } => {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                match best_suggestion(&key, KNOWN_KEYS.iter().copied()) {
                    Some(s) => println!(
                        "{} `{}` is not read by fitrack -- did you mean: `{}`?",
                        "warning:".yellow().bold(),
                        key,
                        s.green()
                    ),
                    None => println!(
                        "{} `{}` is not read by fitrack (known: {})",
                        "warning:".yellow().bold(),
                        key,
                        KNOWN_KEYS.join(", ")
                    ),
                }
            }

            let val = match check(&key, &val) {
                Ok(v) => v,
                Err(msg) => {
                    println!("{} {}", "error:".red().bold(), msg);
                    return Ok(());
                }
            };

            cfg.map.insert(key.clone(), val);
            cfg.save(&config_path)?;
            let entry = Entry {
                key: &key,
                value: cfg.get(&key),
            };
            emit(fmt, &entry, || {
                println!(
                    "{} set `{}` = `{}`",
                    "info:".blue().bold(),
                    key.green(),
                    entry.value.unwrap_or_default()
                )
            });
        }

        ConfigCmd::Unset { key } => {
            if cfg.map.remove(&key).is_some() {
                cfg.save(&config_path)?;
                println!("{} removed `{}`", "info:".blue().bold(), key.green());
            } else {
                println!("{} key `{}` not found", "warning:".yellow().bold(), key);
            }
        }
    }

    Ok(())
}
