//! Live workout tracking.
//!
//! A [`WorkoutSession`] walks a fixed, ordered list of exercises. Elapsed time
//! only moves when the owner calls [`WorkoutSession::tick`], so whatever drives
//! the clock (an interval timer, a test loop) lives outside the session.
//! Termination produces exactly one [`WorkoutRecord`]; every mutator fails
//! with [`SessionError::Terminated`] afterwards, except `tick`, which is
//! silently dropped.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{Exercise, SessionSetup, WorkoutRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no exercises to start")]
    InvalidSession,

    #[error("workout session already terminated")]
    Terminated,
}

/// Source of wall-clock timestamps for start and end times.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Paused,
    Terminated,
}

/// Outcome of completing or skipping the current exercise.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// More exercises remain; carries the (unchanged) running/paused state.
    Continuing(SessionState),
    /// That was the last exercise.
    Finished(WorkoutRecord),
}

#[derive(Debug)]
pub struct WorkoutSession<C: Clock = SystemClock> {
    exercises: Vec<Exercise>,
    setup: SessionSetup,
    current_index: usize,
    elapsed_seconds: u64,
    running: bool,
    terminated: bool,
    completed: Vec<Exercise>,
    started_at: DateTime<Utc>,
    clock: C,
}

impl WorkoutSession<SystemClock> {
    pub fn start(exercises: Vec<Exercise>, setup: SessionSetup) -> Result<Self, SessionError> {
        Self::start_with_clock(exercises, setup, SystemClock)
    }
}

impl<C: Clock> WorkoutSession<C> {
    pub fn start_with_clock(
        exercises: Vec<Exercise>,
        setup: SessionSetup,
        clock: C,
    ) -> Result<Self, SessionError> {
        if exercises.is_empty() {
            return Err(SessionError::InvalidSession);
        }

        let started_at = clock.now();
        info!(
            exercises = exercises.len(),
            goal = %setup.goal,
            difficulty = %setup.difficulty,
            "workout session started"
        );

        Ok(Self {
            exercises,
            setup,
            current_index: 0,
            elapsed_seconds: 0,
            running: true,
            terminated: false,
            completed: Vec::new(),
            started_at,
            clock,
        })
    }

    pub fn state(&self) -> SessionState {
        if self.terminated {
            SessionState::Terminated
        } else if self.running {
            SessionState::Running
        } else {
            SessionState::Paused
        }
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn completed(&self) -> &[Exercise] {
        &self.completed
    }

    pub fn setup(&self) -> &SessionSetup {
        &self.setup
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// `None` once every exercise has been addressed or the session ended.
    pub fn current_exercise(&self) -> Option<&Exercise> {
        if self.terminated {
            return None;
        }
        self.exercises.get(self.current_index)
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Exercises not yet completed or skipped, including the current one.
    pub fn remaining(&self) -> usize {
        self.exercises.len() - self.current_index
    }

    /// One second of wall time. Ignored while paused and after termination.
    pub fn tick(&mut self) {
        if self.running && !self.terminated {
            self.elapsed_seconds += 1;
        }
    }

    pub fn pause(&mut self) -> Result<(), SessionError> {
        self.ensure_live()?;
        if self.running {
            debug!(elapsed = self.elapsed_seconds, "session paused");
        }
        self.running = false;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), SessionError> {
        self.ensure_live()?;
        if !self.running {
            debug!(elapsed = self.elapsed_seconds, "session resumed");
        }
        self.running = true;
        Ok(())
    }

    pub fn complete_current(&mut self) -> Result<Progress, SessionError> {
        self.ensure_live()?;

        let exercise = self.exercises[self.current_index].clone();
        debug!(index = self.current_index, name = %exercise.name, "exercise completed");
        self.completed.push(exercise);

        self.advance()
    }

    pub fn skip_current(&mut self) -> Result<Progress, SessionError> {
        self.ensure_live()?;
        debug!(
            index = self.current_index,
            name = %self.exercises[self.current_index].name,
            "exercise skipped"
        );

        self.advance()
    }

    /// Ends the session where it stands and returns its record.
    pub fn finish(&mut self) -> Result<WorkoutRecord, SessionError> {
        self.ensure_live()?;

        self.terminated = true;
        self.running = false;

        let end_time = self.clock.now().max(self.started_at);
        let total = self.exercises.len();
        let done = self.completed.len();
        let record = WorkoutRecord {
            id: record_id(end_time),
            date: end_time,
            start_time: self.started_at,
            end_time,
            goal: self.setup.goal.clone(),
            body_parts: self.setup.body_parts.clone(),
            difficulty: self.setup.difficulty,
            duration_seconds: self.elapsed_seconds,
            total_exercises: total,
            completed_exercise_count: done,
            completion_rate_percent: completion_rate(done, total),
            exercises: std::mem::take(&mut self.completed),
        };

        info!(
            id = %record.id,
            completed = done,
            total,
            rate = record.completion_rate_percent,
            seconds = record.duration_seconds,
            "workout session finished"
        );

        Ok(record)
    }

    fn advance(&mut self) -> Result<Progress, SessionError> {
        if self.current_index + 1 >= self.exercises.len() {
            self.current_index = self.exercises.len();
            return self.finish().map(Progress::Finished);
        }

        self.current_index += 1;
        Ok(Progress::Continuing(self.state()))
    }

    fn ensure_live(&self) -> Result<(), SessionError> {
        if self.terminated {
            Err(SessionError::Terminated)
        } else {
            Ok(())
        }
    }
}

/// `round(100 * completed / total)` with halves rounded up, clamped to 0..=100.
pub fn completion_rate(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }

    let completed = completed.min(total) as u64;
    let total = total as u64;
    ((200 * completed + total) / (2 * total)).min(100) as u8
}

fn record_id(at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", at.timestamp_millis(), &suffix[..8])
}
