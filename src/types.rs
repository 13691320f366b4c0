use once_cell::sync::Lazy;
use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::Path,
};
use strsim::jaro_winkler;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Body parts a workout can target, in their display spelling.
pub const BODY_PARTS: &[&str] = &[
    "Chest",
    "Back",
    "Shoulders",
    "Arms",
    "Biceps",
    "Triceps",
    "Legs",
    "Quads",
    "Hamstrings",
    "Glutes",
    "Calves",
    "Core",
    "Abs",
    "Forearms",
];

pub const GOALS: &[&str] = &[
    "Weight Loss",
    "Muscle Gain",
    "Strength Building",
    "Endurance",
    "Flexibility",
    "General Fitness",
    "Cardio",
    "Olympic Training",
    "Power Training",
    "Strongman",
];

/// Muscle names understood by the exercise catalog.
pub static ALLOWED_MUSCLES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "abdominals",
        "abductors",
        "adductors",
        "biceps",
        "calves",
        "chest",
        "forearms",
        "glutes",
        "hamstrings",
        "lats",
        "lower_back",
        "middle_back",
        "neck",
        "obliques",
        "quadriceps",
        "shoulders",
        "traps",
        "triceps",
    ])
});

/// Returns the canonical lowercase muscle name or `None` if not allowed.
pub fn canonical_muscle<S: AsRef<str>>(m: S) -> Option<String> {
    let m = m.as_ref().trim().to_ascii_lowercase().replace([' ', '-'], "_");
    if ALLOWED_MUSCLES.contains(m.as_str()) {
        Some(m)
    } else {
        None
    }
}

/// Case-insensitive lookup of a body part, returning its display spelling.
pub fn canonical_body_part(part: &str) -> Option<&'static str> {
    let part = part.trim();
    BODY_PARTS.iter().copied().find(|p| p.eq_ignore_ascii_case(part))
}

pub fn canonical_goal(goal: &str) -> Option<&'static str> {
    let goal = goal.trim();
    GOALS.iter().copied().find(|g| g.eq_ignore_ascii_case(goal))
}

/// Return the closest candidate for `input`
/// if similarity ≥ 0.80 *and* clearly better than the runner-up.
/// Otherwise return `None` (no suggestion shown).
pub fn best_suggestion<'a, I>(input: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let inp = input.trim().to_ascii_lowercase();
    if inp.is_empty() {
        return None;
    }

    let mut scores: Vec<(&'a str, f64)> = candidates
        .into_iter()
        .map(|c| (c, jaro_winkler(&inp, &c.to_ascii_lowercase())))
        .collect();

    scores.sort_by(|a, b| b.1.total_cmp(&a.1));

    let (best, best_score) = *scores.first()?;
    let second_score = scores.get(1).map(|(_, s)| *s).unwrap_or(0.0);

    const MIN_SCORE: f64 = 0.80;
    const GAP: f64 = 0.02;

    if best_score >= MIN_SCORE && best_score - second_score >= GAP {
        Some(best)
    } else {
        None
    }
}

pub fn best_muscle_suggestion(input: &str) -> Option<&'static str> {
    best_suggestion(input, ALLOWED_MUSCLES.iter().copied())
}

/// `[[exercise]]` entries of an import file.
#[derive(Deserialize)]
pub struct ExerciseDef {
    pub name: String,
    pub muscle: String,
    #[serde(rename = "type")]
    pub exercise_type: String,
    pub difficulty: String,
    pub instructions: Option<String>,
    pub equipment: Option<String>,
}

#[derive(Deserialize)]
pub struct ExerciseImport {
    #[serde(default)]
    pub exercise: Vec<ExerciseDef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFmt {
    Human,
    Json,
}

impl OutputFmt {
    pub fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Human }
    }
}

/// Prints `value` as pretty JSON, or runs `human` for the colored rendering.
pub fn emit<T: Serialize + ?Sized>(fmt: OutputFmt, value: &T, human: impl FnOnce()) {
    match fmt {
        OutputFmt::Json => match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{}", s),
            Err(e) => tracing::error!(error = %e, "failed to serialize output"),
        },
        OutputFmt::Human => human(),
    }
}

/// Flat `key = "value"` settings file.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    pub map: BTreeMap<String, String>,
}

impl Config {
    pub fn path() -> Result<std::path::PathBuf> {
        dirs::config_dir()
            .map(|d| d.join("fitrack").join("config"))
            .context("Could not determine config directory")
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }

        let content = toml::to_string(self)?;
        fs::write(path, content).with_context(|| format!("Failed to save config to {}", path.display()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    /// Loads the user's config, or an empty one if it can't be located or read.
    pub fn load_default() -> Self {
        match Self::path().and_then(|p| Self::load(&p)) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable config");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn muscle_names_normalize() {
        assert_eq!(canonical_muscle("Chest").as_deref(), Some("chest"));
        assert_eq!(canonical_muscle("lower back").as_deref(), Some("lower_back"));
        assert_eq!(canonical_muscle("Middle-Back").as_deref(), Some("middle_back"));
        assert_eq!(canonical_muscle("wings"), None);
    }

    #[test]
    fn body_parts_and_goals_are_case_insensitive() {
        assert_eq!(canonical_body_part("chest"), Some("Chest"));
        assert_eq!(canonical_body_part(" CORE "), Some("Core"));
        assert_eq!(canonical_body_part("tail"), None);
        assert_eq!(canonical_goal("muscle gain"), Some("Muscle Gain"));
        assert_eq!(canonical_goal("get huge"), None);
    }

    #[test]
    fn suggestions_for_typos() {
        assert_eq!(best_muscle_suggestion("tricep"), Some("triceps"));
        assert_eq!(best_suggestion("Hamstrngs", BODY_PARTS.iter().copied()), Some("Hamstrings"));
        assert_eq!(best_muscle_suggestion("zzzz"), None);
        assert_eq!(best_muscle_suggestion("   "), None);
    }

    #[test]
    fn config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config");

        let mut cfg = Config::load(&path).unwrap();
        assert!(cfg.map.is_empty());

        cfg.map.insert("user".into(), "alice".into());
        cfg.map.insert("difficulty".into(), "expert".into());
        cfg.save(&path).unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.get("user"), Some("alice"));
        assert_eq!(cfg.get("difficulty"), Some("expert"));
        assert_eq!(cfg.get("db"), None);
    }

    #[test]
    fn import_file_parses() {
        let import: ExerciseImport = toml::from_str(
            r#"
            [[exercise]]
            name = "Push-ups"
            muscle = "chest"
            type = "strength"
            difficulty = "beginner"
            instructions = "Push."

            [[exercise]]
            name = "Kettlebell Swing"
            muscle = "glutes"
            type = "strength"
            difficulty = "intermediate"
            equipment = "kettlebell"
            "#,
        )
        .unwrap();

        assert_eq!(import.exercise.len(), 2);
        assert_eq!(import.exercise[1].equipment.as_deref(), Some("kettlebell"));
        assert!(import.exercise[1].instructions.is_none());
    }
}
