//! Drives a [`WorkoutSession`] from a once-a-second clock and line commands.
//!
//! Both event sources go through one `select!` loop, so ticks and commands
//! never interleave inside a session call. The loop returns as soon as the
//! session terminates; the interval is dropped with it, so no tick can reach
//! a finished session.

use std::{
    io::{self, Write},
    time::Duration,
};

use anyhow::{Result, anyhow};
use colored::Colorize;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    time::{self, Instant},
};
use tracing::{debug, error, warn};

use crate::{
    models::WorkoutRecord,
    session::{Clock, Progress, SessionError, SessionState, WorkoutSession},
    utils::format_clock,
};

pub const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Complete,
    Skip,
    Pause,
    Resume,
    Finish,
    Info,
    Help,
    Nothing,
    Unknown(String),
}

pub fn parse_command(line: &str) -> Command {
    match line.trim().to_ascii_lowercase().as_str() {
        "" => Command::Nothing,
        "c" | "done" | "complete" | "next" => Command::Complete,
        "s" | "skip" => Command::Skip,
        "p" | "pause" => Command::Pause,
        "r" | "resume" => Command::Resume,
        "f" | "finish" | "q" | "quit" => Command::Finish,
        "i" | "info" | "status" => Command::Info,
        "h" | "?" | "help" => Command::Help,
        other => Command::Unknown(other.to_string()),
    }
}

pub fn print_help<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "{} {}omplete  {}kip  {}ause  {}esume  {}nfo  {}inish",
        "keys:".cyan().bold(),
        "c".yellow(),
        "s".yellow(),
        "p".yellow(),
        "r".yellow(),
        "i".yellow(),
        "f".yellow(),
    )
}

fn print_current<W: Write, C: Clock>(out: &mut W, session: &WorkoutSession<C>) -> io::Result<()> {
    let Some(ex) = session.current_exercise() else {
        return Ok(());
    };

    writeln!(
        out,
        "\n{} {} of {} • {} ({}, {})",
        "Exercise".cyan().bold(),
        session.current_index() + 1,
        session.exercises().len(),
        ex.name.bold(),
        ex.muscle.yellow(),
        ex.difficulty
    )?;
    if let Some(eq) = &ex.equipment {
        writeln!(out, "  {} {}", "equipment:".dimmed(), eq)?;
    }
    if !ex.instructions.is_empty() {
        writeln!(out, "  {}", ex.instructions.dimmed())?;
    }
    Ok(())
}

fn print_info<W: Write, C: Clock>(out: &mut W, session: &WorkoutSession<C>) -> io::Result<()> {
    let state = match session.state() {
        SessionState::Running => "running".green(),
        SessionState::Paused => "paused".yellow(),
        SessionState::Terminated => "finished".dimmed(),
    };
    writeln!(
        out,
        "{} {} | {} {}/{} done | {} left",
        "⏱".cyan(),
        format_clock(session.elapsed_seconds()),
        state,
        session.completed().len(),
        session.exercises().len(),
        session.remaining()
    )
}

/// Follows up a completed or skipped exercise: shows the next one, or hands
/// back the record if that was the last.
fn advanced<W: Write, C: Clock>(
    out: &mut W,
    session: &WorkoutSession<C>,
    p: Progress,
) -> io::Result<Option<WorkoutRecord>> {
    match p {
        Progress::Continuing(_) => print_current(out, session).map(|_| None),
        Progress::Finished(record) => Ok(Some(record)),
    }
}

fn terminated(e: SessionError) -> anyhow::Error {
    error!(error = %e, "session command issued after termination");
    anyhow!(e)
}

/// Applies one command, writing prompts to `out`. `Some(record)` once the
/// session has terminated.
pub fn apply<W: Write, C: Clock>(
    out: &mut W,
    session: &mut WorkoutSession<C>,
    cmd: Command,
) -> Result<Option<WorkoutRecord>> {
    debug!(?cmd, "session command");

    match cmd {
        Command::Complete => {
            let p = session.complete_current().map_err(terminated)?;
            Ok(advanced(out, session, p)?)
        }
        Command::Skip => {
            let p = session.skip_current().map_err(terminated)?;
            Ok(advanced(out, session, p)?)
        }
        Command::Pause => {
            session.pause().map_err(terminated)?;
            writeln!(
                out,
                "{} paused at {}",
                "info:".blue().bold(),
                format_clock(session.elapsed_seconds())
            )?;
            Ok(None)
        }
        Command::Resume => {
            session.resume().map_err(terminated)?;
            writeln!(out, "{} resumed", "info:".blue().bold())?;
            Ok(None)
        }
        Command::Finish => session.finish().map(Some).map_err(terminated),
        Command::Info => {
            print_info(out, session)?;
            Ok(None)
        }
        Command::Help => {
            print_help(out)?;
            Ok(None)
        }
        Command::Nothing => Ok(None),
        Command::Unknown(s) => {
            writeln!(out, "{} unknown command `{}`", "warning:".yellow().bold(), s)?;
            print_help(out)?;
            Ok(None)
        }
    }
}

/// Runs `session` until it terminates, writing prompts to `out`. End of
/// input, or input that can no longer be read, finishes it early so the work
/// done so far is still recorded.
pub async fn drive<R, W, C>(
    session: &mut WorkoutSession<C>,
    input: R,
    out: &mut W,
    period: Duration,
) -> Result<WorkoutRecord>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    C: Clock,
{
    let mut lines = input.lines();
    let mut ticker = time::interval_at(Instant::now() + period, period);

    print_current(out, session)?;

    loop {
        tokio::select! {
            _ = ticker.tick() => session.tick(),

            line = lines.next_line() => {
                let cmd = match line {
                    Ok(Some(l)) => parse_command(&l),
                    Ok(None) => {
                        debug!("input closed, finishing workout");
                        Command::Finish
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to read command, finishing workout");
                        Command::Finish
                    }
                };

                if let Some(record) = apply(out, session, cmd)? {
                    return Ok(record);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncWriteExt, BufReader};

    use super::*;
    use crate::models::{Difficulty, Exercise, SessionSetup};

    fn session(n: usize) -> WorkoutSession {
        let exercises = (1..=n)
            .map(|i| Exercise {
                name: format!("E{i}"),
                muscle: "chest".into(),
                exercise_type: "strength".into(),
                difficulty: Difficulty::Beginner,
                instructions: String::new(),
                equipment: None,
                target_body_part: None,
            })
            .collect();
        WorkoutSession::start(exercises, SessionSetup::default()).unwrap()
    }

    #[test]
    fn commands_parse() {
        assert_eq!(parse_command(" C "), Command::Complete);
        assert_eq!(parse_command("skip"), Command::Skip);
        assert_eq!(parse_command("p"), Command::Pause);
        assert_eq!(parse_command("resume"), Command::Resume);
        assert_eq!(parse_command("q"), Command::Finish);
        assert_eq!(parse_command(""), Command::Nothing);
        assert_eq!(parse_command("jump"), Command::Unknown("jump".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn scripted_input_runs_to_completion() {
        let mut s = session(3);
        let mut out = Vec::new();
        let record = drive(&mut s, "c\n\ns\nc\n".as_bytes(), &mut out, TICK).await.unwrap();

        assert_eq!(record.completed_exercise_count, 2);
        assert_eq!(record.completion_rate_percent, 67);
        assert_eq!(s.state(), SessionState::Terminated);

        let shown = String::from_utf8(out).unwrap();
        assert!(shown.contains("E1"));
        assert!(shown.contains("E3"));
    }

    #[tokio::test(start_paused = true)]
    async fn end_of_input_finishes_early() {
        let mut s = session(4);
        let record = drive(&mut s, "c\n".as_bytes(), &mut Vec::new(), TICK).await.unwrap();

        assert_eq!(record.completed_exercise_count, 1);
        assert_eq!(record.total_exercises, 4);
        assert_eq!(record.completion_rate_percent, 25);
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_input_keeps_the_work_done() {
        let mut s = session(3);
        let input: &[u8] = b"c\nc\n\xc3\x28\n";
        let record = drive(&mut s, input, &mut Vec::new(), TICK).await.unwrap();

        assert_eq!(s.state(), SessionState::Terminated);
        assert_eq!(record.completed_exercise_count, 2);
        assert_eq!(record.total_exercises, 3);
        assert_eq!(record.completion_rate_percent, 67);
    }

    #[tokio::test(start_paused = true)]
    async fn clock_ticks_only_while_running() {
        let (mut tx, rx) = tokio::io::duplex(64);
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(10_500)).await;
            tx.write_all(b"p\n").await.unwrap();
            time::sleep(Duration::from_secs(30)).await;
            tx.write_all(b"r\n").await.unwrap();
            time::sleep(Duration::from_millis(5_000)).await;
            tx.write_all(b"f\n").await.unwrap();
        });

        let mut s = session(2);
        let mut out = Vec::new();
        let record = drive(&mut s, BufReader::new(rx), &mut out, TICK).await.unwrap();

        assert_eq!(record.duration_seconds, 15);
        assert_eq!(record.completion_rate_percent, 0);
        let shown = String::from_utf8(out).unwrap();
        assert!(shown.contains("paused at"));
        assert!(shown.contains("resumed"));
    }

    #[test]
    fn apply_after_termination_is_an_error() {
        let mut s = session(1);
        let mut out = Vec::new();
        assert!(apply(&mut out, &mut s, Command::Finish).unwrap().is_some());
        assert!(apply(&mut out, &mut s, Command::Complete).is_err());
        assert!(apply(&mut out, &mut s, Command::Info).unwrap().is_none());
    }
}
