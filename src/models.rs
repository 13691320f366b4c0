use std::{fmt::Display, str::FromStr};

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How hard an exercise (or a whole workout) is meant to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Beginner, Self::Intermediate, Self::Expert];

    /// Lowercase form used by exercise catalogs.
    pub fn api_value(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Expert => "expert",
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Expert => "Expert",
        };

        write!(f, "{}", s)
    }
}

impl FromStr for Difficulty {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            // Plan presets call the top tier "Advanced".
            "expert" | "advanced" => Ok(Self::Expert),
            _ => Err(anyhow!("unknown difficulty `{}` (expected beginner, intermediate or expert)", s)),
        }
    }
}

/// A single movement loaded into a session. Never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub name: String,
    pub muscle: String,
    #[serde(rename = "type")]
    pub exercise_type: String,
    pub difficulty: Difficulty,
    pub instructions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<String>,
    /// Body part the exercise was picked for, when selection was per body part.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_body_part: Option<String>,
}

/// Parameters chosen before a workout starts; copied verbatim into its record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSetup {
    pub goal: String,
    pub body_parts: Vec<String>,
    pub difficulty: Difficulty,
}

impl Default for SessionSetup {
    fn default() -> Self {
        Self {
            goal: "General Fitness".to_string(),
            body_parts: Vec::new(),
            difficulty: Difficulty::Beginner,
        }
    }
}

/// Immutable summary of a finished (or finished early) workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub id: String,
    pub date: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub goal: String,
    pub body_parts: Vec<String>,
    pub difficulty: Difficulty,
    pub duration_seconds: u64,
    pub total_exercises: usize,
    pub completed_exercise_count: usize,
    pub completion_rate_percent: u8,
    /// The completed exercises only, in the order they were completed.
    pub exercises: Vec<Exercise>,
}

/// One manual progress entry for an exercise, owned by a user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub id: String,
    pub user_id: String,
    pub exercise: String,
    pub sets: u32,
    pub reps: u32,
    pub weight: f32,
    pub duration_seconds: u32,
    pub date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parses_any_case() {
        assert_eq!("BEGINNER".parse::<Difficulty>().unwrap(), Difficulty::Beginner);
        assert_eq!("Intermediate".parse::<Difficulty>().unwrap(), Difficulty::Intermediate);
        assert_eq!(" expert ".parse::<Difficulty>().unwrap(), Difficulty::Expert);
        assert_eq!("Advanced".parse::<Difficulty>().unwrap(), Difficulty::Expert);
        assert!("hard".parse::<Difficulty>().is_err());
    }

    #[test]
    fn difficulty_display_and_api_value_differ_in_case() {
        assert_eq!(Difficulty::Expert.to_string(), "Expert");
        assert_eq!(Difficulty::Expert.api_value(), "expert");
    }

    #[test]
    fn exercise_json_uses_type_key() {
        let ex = Exercise {
            name: "Plank".into(),
            muscle: "abdominals".into(),
            exercise_type: "isometric".into(),
            difficulty: Difficulty::Beginner,
            instructions: "Hold it.".into(),
            equipment: None,
            target_body_part: Some("Core".into()),
        };
        let json = serde_json::to_value(&ex).unwrap();
        assert_eq!(json["type"], "isometric");
        assert_eq!(json["difficulty"], "beginner");
        assert_eq!(json["targetBodyPart"], "Core");
        assert!(json.get("equipment").is_none());
    }
}
