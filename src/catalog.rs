//! Where a workout's exercises come from.
//!
//! Exercises live in the local `exercises` table. A workout asks for a few per
//! targeted body part; when the table has nothing suitable (or can't be read)
//! the built-in list below fills in.

use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use tracing::{debug, warn};

use crate::models::{Difficulty, Exercise, SessionSetup};

/// Exercises taken per targeted body part.
pub const PER_BODY_PART: usize = 3;
/// Exercises taken when no body part is targeted.
pub const GENERAL_LIMIT: usize = 8;

/// Exercise type a goal trains with.
pub fn goal_to_type(goal: &str) -> &'static str {
    match goal.trim().to_ascii_lowercase().as_str() {
        "weight loss" => "cardio",
        "muscle gain" => "strength",
        "strength building" => "powerlifting",
        "endurance" => "cardio",
        "flexibility" => "stretching",
        "general fitness" => "strength",
        "cardio" => "cardio",
        "olympic training" => "olympic_weightlifting",
        "power training" => "plyometrics",
        "strongman" => "strongman",
        _ => "strength",
    }
}

/// Catalog muscle a body part is looked up by.
pub fn body_part_to_muscle(part: &str) -> String {
    let m = match part.trim().to_ascii_lowercase().as_str() {
        "chest" => "chest",
        "back" => "lats",
        "shoulders" => "shoulders",
        "arms" | "biceps" => "biceps",
        "triceps" => "triceps",
        "legs" | "quads" => "quadriceps",
        "hamstrings" => "hamstrings",
        "glutes" => "glutes",
        "calves" => "calves",
        "core" | "abs" => "abdominals",
        "forearms" => "forearms",
        other => return other.to_string(),
    };
    m.to_string()
}

#[allow(async_fn_in_trait)]
pub trait ExerciseSource {
    /// Exercises of `exercise_type`, optionally restricted to one muscle.
    async fn query(
        &self,
        muscle: Option<&str>,
        exercise_type: &str,
        difficulty: Difficulty,
    ) -> Result<Vec<Exercise>>;
}

/// Picks the exercises for a workout. Never errors: a failing or empty
/// source falls back to [`fallback_exercises`], which may itself be empty.
pub async fn select_for_setup<S: ExerciseSource>(source: &S, setup: &SessionSetup) -> Vec<Exercise> {
    match query_for_setup(source, setup).await {
        Ok(found) if !found.is_empty() => {
            debug!(count = found.len(), "exercises selected from catalog");
            found
        }
        Ok(_) => {
            warn!(
                difficulty = setup.difficulty.api_value(),
                "no catalog exercises match, using built-in list"
            );
            fallback_exercises(setup)
        }
        Err(e) => {
            warn!(error = %e, "exercise catalog unavailable, using built-in list");
            fallback_exercises(setup)
        }
    }
}

async fn query_for_setup<S: ExerciseSource>(source: &S, setup: &SessionSetup) -> Result<Vec<Exercise>> {
    let exercise_type = goal_to_type(&setup.goal);
    let matches = |e: &Exercise| e.difficulty == setup.difficulty;

    if setup.body_parts.is_empty() {
        let found = source.query(None, exercise_type, setup.difficulty).await?;
        return Ok(found.into_iter().filter(matches).take(GENERAL_LIMIT).collect());
    }

    let mut all = Vec::new();
    for part in &setup.body_parts {
        let muscle = body_part_to_muscle(part);
        let found = source
            .query(Some(&muscle), exercise_type, setup.difficulty)
            .await
            .with_context(|| format!("querying exercises for {}", part))?;

        all.extend(found.into_iter().filter(matches).take(PER_BODY_PART).map(|mut e| {
            e.target_body_part = Some(part.clone());
            e
        }));
    }
    Ok(all)
}

/// (group, name, muscle, difficulty, type, instructions)
const BUILTIN: &[(&str, &str, &str, Difficulty, &str, &str)] = &[
    ("Chest", "Push-ups", "chest", Difficulty::Beginner, "strength", "Start in plank position, lower chest to ground, push back up. Keep your body straight and core engaged."),
    ("Chest", "Incline Push-ups", "chest", Difficulty::Beginner, "strength", "Place hands on elevated surface, perform push-up motion. Great for beginners."),
    ("Chest", "Chest Squeeze", "chest", Difficulty::Beginner, "isometric", "Hold a ball or towel between palms, press hands together to activate chest muscles."),
    ("Chest", "Decline Push-ups", "chest", Difficulty::Intermediate, "strength", "Place feet on elevated surface, perform push-up motion. More challenging variation."),
    ("Chest", "Dumbbell Bench Press", "chest", Difficulty::Intermediate, "strength", "Lie on a bench, press dumbbells from chest level up until arms are extended."),
    ("Chest", "Clap Push-ups", "chest", Difficulty::Expert, "plyometric", "Perform a push-up and explode up to clap hands mid-air."),
    ("Chest", "One-arm Push-ups", "chest", Difficulty::Expert, "strength", "Perform push-ups using one arm. Maintain balance and control."),
    ("Back", "Superman", "lats", Difficulty::Beginner, "strength", "Lie face down, lift chest and legs off ground."),
    ("Back", "Bird-Dog", "lats", Difficulty::Beginner, "stability", "Extend opposite arm and leg while on all fours, alternate sides."),
    ("Back", "Reverse Fly", "lats", Difficulty::Intermediate, "strength", "Bend forward, lift arms to sides squeezing shoulder blades."),
    ("Back", "Bent-over Rows", "lats", Difficulty::Intermediate, "strength", "Hold weights, bend forward, pull elbows back like rowing."),
    ("Back", "Pull-ups", "lats", Difficulty::Expert, "strength", "Hang from bar, pull body up until chin clears bar."),
    ("Back", "Deadlifts", "lats", Difficulty::Expert, "strength", "Lift barbell from ground while keeping back straight."),
    ("Legs", "Wall Sits", "quadriceps", Difficulty::Beginner, "isometric", "Sit against wall with thighs parallel to ground. Hold for time."),
    ("Legs", "Bodyweight Squats", "quadriceps", Difficulty::Beginner, "strength", "Stand with feet shoulder-width apart, lower as if sitting in chair."),
    ("Legs", "Lunges", "quadriceps", Difficulty::Intermediate, "strength", "Step forward into lunge position, lower and return. Alternate legs."),
    ("Legs", "Jump Squats", "quadriceps", Difficulty::Expert, "plyometric", "Perform squats with explosive jump at top."),
    ("Legs", "Pistol Squats", "quadriceps", Difficulty::Expert, "strength", "Perform one-legged squats while keeping other leg extended forward."),
    ("Core", "Plank", "abdominals", Difficulty::Beginner, "isometric", "Hold plank position keeping body straight."),
    ("Core", "Leg Raises", "abdominals", Difficulty::Beginner, "strength", "Lie flat, lift legs off ground keeping them straight."),
    ("Core", "Russian Twists", "obliques", Difficulty::Intermediate, "strength", "Twist torso side to side while seated and feet raised."),
    ("Core", "Bicycle Crunches", "abdominals", Difficulty::Intermediate, "strength", "Lie on back, bring opposite elbow to knee."),
    ("Core", "V-Ups", "abdominals", Difficulty::Expert, "strength", "Raise arms and legs to meet at top, forming a V shape."),
    ("Core", "Dragon Flag", "abdominals", Difficulty::Expert, "strength", "Hold bench behind head, lift entire body straight up. Lower under control."),
];

const BUILTIN_GROUPS: [&str; 4] = ["Chest", "Back", "Legs", "Core"];

fn builtin(group: &str, difficulty: Difficulty) -> impl Iterator<Item = Exercise> + '_ {
    BUILTIN
        .iter()
        .filter(move |(g, .., d, _, _)| g.eq_ignore_ascii_case(group) && *d == difficulty)
        .map(|(_, name, muscle, d, ty, instructions)| Exercise {
            name: name.to_string(),
            muscle: muscle.to_string(),
            exercise_type: ty.to_string(),
            difficulty: *d,
            instructions: instructions.to_string(),
            equipment: None,
            target_body_part: None,
        })
}

/// Built-in exercises for `setup`: every match for each targeted body part
/// that has a built-in group, or one per group when nothing is targeted.
pub fn fallback_exercises(setup: &SessionSetup) -> Vec<Exercise> {
    if setup.body_parts.is_empty() {
        return BUILTIN_GROUPS
            .iter()
            .filter_map(|g| builtin(g, setup.difficulty).next())
            .collect();
    }

    setup
        .body_parts
        .iter()
        .flat_map(|part| {
            builtin(part, setup.difficulty).map(move |mut e| {
                e.target_body_part = Some(part.clone());
                e
            })
        })
        .collect()
}

/// A ready-made workout the user can start by number.
#[derive(Debug, Serialize)]
pub struct Plan {
    pub name: &'static str,
    pub duration: &'static str,
    pub difficulty: Difficulty,
    pub description: &'static str,
    pub goal: &'static str,
    pub body_parts: &'static [&'static str],
}

impl Plan {
    pub fn setup(&self) -> SessionSetup {
        SessionSetup {
            goal: self.goal.to_string(),
            body_parts: self.body_parts.iter().map(|p| p.to_string()).collect(),
            difficulty: self.difficulty,
        }
    }
}

pub const PLANS: &[Plan] = &[
    Plan {
        name: "Upper Body Strength",
        duration: "45 min",
        difficulty: Difficulty::Intermediate,
        description: "Focus on building upper body strength with compound movements",
        goal: "Muscle Gain",
        body_parts: &["Chest", "Back", "Shoulders"],
    },
    Plan {
        name: "Lower Body Power",
        duration: "50 min",
        difficulty: Difficulty::Expert,
        description: "Explosive lower body exercises for power and strength",
        goal: "Power Training",
        body_parts: &["Legs", "Glutes"],
    },
    Plan {
        name: "Full Body HIIT",
        duration: "30 min",
        difficulty: Difficulty::Intermediate,
        description: "High-intensity interval training for full body conditioning",
        goal: "Weight Loss",
        body_parts: &[],
    },
    Plan {
        name: "Core & Abs",
        duration: "25 min",
        difficulty: Difficulty::Beginner,
        description: "Targeted core strengthening and abdominal exercises",
        goal: "General Fitness",
        body_parts: &["Core"],
    },
    Plan {
        name: "Cardio Blast",
        duration: "35 min",
        difficulty: Difficulty::Intermediate,
        description: "High-energy cardio workout to boost endurance",
        goal: "Cardio",
        body_parts: &[],
    },
    Plan {
        name: "Flexibility & Mobility",
        duration: "40 min",
        difficulty: Difficulty::Beginner,
        description: "Improve flexibility and joint mobility with stretching",
        goal: "Flexibility",
        body_parts: &[],
    },
];

/// 1-based lookup into [`PLANS`].
pub fn plan(n: usize) -> Option<&'static Plan> {
    n.checked_sub(1).and_then(|i| PLANS.get(i))
}

/// A catalog row as listed by `exercise list`.
#[derive(Debug, Serialize)]
pub struct CatalogEntry {
    pub idx: i64,
    #[serde(flatten)]
    pub exercise: Exercise,
    pub created_at: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted,
    AlreadyExists,
}

/// The `exercises` table.
#[derive(Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

fn exercise_from_row(r: &SqliteRow) -> Result<Exercise> {
    let difficulty: String = r.get("difficulty");
    Ok(Exercise {
        name: r.get("name"),
        muscle: r.get("muscle"),
        exercise_type: r.get("exercise_type"),
        difficulty: Difficulty::from_str(&difficulty)?,
        instructions: r.get("instructions"),
        equipment: r.get("equipment"),
        target_body_part: None,
    })
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn add(&self, ex: &Exercise) -> Result<AddOutcome> {
        let res = sqlx::query(
            r#"
            INSERT OR IGNORE INTO exercises
              (name, muscle, exercise_type, difficulty, instructions, equipment, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, datetime('now'))
            "#,
        )
        .bind(&ex.name)
        .bind(&ex.muscle)
        .bind(&ex.exercise_type)
        .bind(ex.difficulty.api_value())
        .bind(&ex.instructions)
        .bind(&ex.equipment)
        .execute(&self.pool)
        .await
        .with_context(|| format!("DB error inserting `{}`", ex.name))?;

        Ok(if res.rows_affected() == 1 {
            AddOutcome::Inserted
        } else {
            AddOutcome::AlreadyExists
        })
    }

    pub async fn list(&self, muscle: Option<&str>) -> Result<Vec<CatalogEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT idx, name, muscle, exercise_type, difficulty, instructions, equipment, created_at
            FROM exercises
            WHERE ?1 IS NULL OR muscle = ?1
            ORDER BY idx
            "#,
        )
        .bind(muscle)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| {
                Ok(CatalogEntry {
                    idx: r.get("idx"),
                    exercise: exercise_from_row(r)?,
                    created_at: r.get("created_at"),
                })
            })
            .collect()
    }

    /// Deletes by index (as shown by `list`) or exact name; returns the name removed.
    pub async fn delete(&self, idx_or_name: &str) -> Result<Option<String>> {
        let row: Option<(i64, String)> = match idx_or_name.parse::<i64>() {
            Ok(idx) => sqlx::query_as("SELECT idx, name FROM exercises WHERE idx = ?")
                .bind(idx)
                .fetch_optional(&self.pool)
                .await?,
            Err(_) => sqlx::query_as("SELECT idx, name FROM exercises WHERE name = ?")
                .bind(idx_or_name)
                .fetch_optional(&self.pool)
                .await?,
        };

        let Some((idx, name)) = row else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM exercises WHERE idx = ?")
            .bind(idx)
            .execute(&self.pool)
            .await?;

        Ok(Some(name))
    }
}

impl ExerciseSource for SqliteCatalog {
    async fn query(
        &self,
        muscle: Option<&str>,
        exercise_type: &str,
        difficulty: Difficulty,
    ) -> Result<Vec<Exercise>> {
        let rows = sqlx::query(
            r#"
            SELECT name, muscle, exercise_type, difficulty, instructions, equipment
            FROM exercises
            WHERE (?1 IS NULL OR muscle = ?1)
              AND exercise_type = ?2
              AND difficulty = ?3
            ORDER BY idx
            "#,
        )
        .bind(muscle)
        .bind(exercise_type)
        .bind(difficulty.api_value())
        .fetch_all(&self.pool)
        .await
        .context("Failed to query exercise catalog")?;

        rows.iter().map(exercise_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;
    use crate::db;

    fn ex(name: &str, muscle: &str, ty: &str, difficulty: Difficulty) -> Exercise {
        Exercise {
            name: name.into(),
            muscle: muscle.into(),
            exercise_type: ty.into(),
            difficulty,
            instructions: String::new(),
            equipment: None,
            target_body_part: None,
        }
    }

    fn setup(goal: &str, parts: &[&str], difficulty: Difficulty) -> SessionSetup {
        SessionSetup {
            goal: goal.into(),
            body_parts: parts.iter().map(|p| p.to_string()).collect(),
            difficulty,
        }
    }

    struct Failing;

    impl ExerciseSource for Failing {
        async fn query(&self, _: Option<&str>, _: &str, _: Difficulty) -> Result<Vec<Exercise>> {
            Err(anyhow!("offline"))
        }
    }

    /// Ignores the difficulty filter, like some remote catalogs do.
    struct Loose(Vec<Exercise>);

    impl ExerciseSource for Loose {
        async fn query(&self, muscle: Option<&str>, _: &str, _: Difficulty) -> Result<Vec<Exercise>> {
            Ok(self
                .0
                .iter()
                .filter(|e| muscle.is_none_or(|m| e.muscle == m))
                .cloned()
                .collect())
        }
    }

    #[test]
    fn goal_and_body_part_mappings() {
        assert_eq!(goal_to_type("Weight Loss"), "cardio");
        assert_eq!(goal_to_type("strength building"), "powerlifting");
        assert_eq!(goal_to_type("Olympic Training"), "olympic_weightlifting");
        assert_eq!(goal_to_type("Something Else"), "strength");
        assert_eq!(body_part_to_muscle("Back"), "lats");
        assert_eq!(body_part_to_muscle("Core"), "abdominals");
        assert_eq!(body_part_to_muscle("Legs"), "quadriceps");
        assert_eq!(body_part_to_muscle("Neck"), "neck");
    }

    #[test]
    fn fallback_per_body_part_matches_difficulty() {
        let got = fallback_exercises(&setup("Strength", &["Chest"], Difficulty::Beginner));
        let names: Vec<_> = got.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Push-ups", "Incline Push-ups", "Chest Squeeze"]);
        assert!(got.iter().all(|e| e.target_body_part.as_deref() == Some("Chest")));
    }

    #[test]
    fn fallback_without_body_parts_takes_one_per_group() {
        let got = fallback_exercises(&setup("Strength", &[], Difficulty::Expert));
        let names: Vec<_> = got.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Clap Push-ups", "Pull-ups", "Jump Squats", "V-Ups"]);
    }

    #[test]
    fn fallback_for_unknown_part_is_empty() {
        assert!(fallback_exercises(&setup("Strength", &["Forearms"], Difficulty::Beginner)).is_empty());
    }

    #[tokio::test]
    async fn failing_source_falls_back() {
        let got = select_for_setup(&Failing, &setup("Strength", &["Core"], Difficulty::Beginner)).await;
        let names: Vec<_> = got.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Plank", "Leg Raises"]);
    }

    #[tokio::test]
    async fn selection_caps_and_filters() {
        let mut pool = Vec::new();
        for i in 0..5 {
            pool.push(ex(&format!("chest{i}"), "chest", "strength", Difficulty::Beginner));
        }
        pool.push(ex("hard chest", "chest", "strength", Difficulty::Expert));
        for i in 0..10 {
            pool.push(ex(&format!("lat{i}"), "lats", "strength", Difficulty::Beginner));
        }
        let source = Loose(pool);

        let got = select_for_setup(&source, &setup("Muscle Gain", &["Chest", "Back"], Difficulty::Beginner)).await;
        let names: Vec<_> = got.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["chest0", "chest1", "chest2", "lat0", "lat1", "lat2"]);
        assert_eq!(got[4].target_body_part.as_deref(), Some("Back"));

        let got = select_for_setup(&source, &setup("Muscle Gain", &[], Difficulty::Beginner)).await;
        assert_eq!(got.len(), GENERAL_LIMIT);
        assert!(got.iter().all(|e| e.difficulty == Difficulty::Beginner));
    }

    #[tokio::test]
    async fn sqlite_catalog_round_trip() {
        let catalog = SqliteCatalog::new(db::open_in_memory().await.unwrap());
        let push = ex("Push-ups", "chest", "strength", Difficulty::Beginner);

        assert_eq!(catalog.add(&push).await.unwrap(), AddOutcome::Inserted);
        assert_eq!(catalog.add(&push).await.unwrap(), AddOutcome::AlreadyExists);
        catalog.add(&ex("Burpees", "quadriceps", "cardio", Difficulty::Beginner)).await.unwrap();
        catalog.add(&ex("Muscle-up", "lats", "strength", Difficulty::Expert)).await.unwrap();

        let chest = catalog.query(Some("chest"), "strength", Difficulty::Beginner).await.unwrap();
        assert_eq!(chest, vec![push.clone()]);
        let cardio = catalog.query(None, "cardio", Difficulty::Beginner).await.unwrap();
        assert_eq!(cardio.len(), 1);
        assert!(catalog.query(None, "strength", Difficulty::Intermediate).await.unwrap().is_empty());

        assert_eq!(catalog.list(None).await.unwrap().len(), 3);
        assert_eq!(catalog.list(Some("lats")).await.unwrap().len(), 1);

        assert_eq!(catalog.delete("Burpees").await.unwrap().as_deref(), Some("Burpees"));
        assert_eq!(catalog.delete("1").await.unwrap().as_deref(), Some("Push-ups"));
        assert!(catalog.delete("1").await.unwrap().is_none());
        assert_eq!(catalog.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_catalog_uses_builtin_list() {
        let catalog = SqliteCatalog::new(db::open_in_memory().await.unwrap());
        let got = select_for_setup(&catalog, &setup("General Fitness", &["Legs"], Difficulty::Intermediate)).await;
        let names: Vec<_> = got.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Lunges"]);
    }

    #[test]
    fn plans_are_one_based() {
        assert_eq!(plan(1).unwrap().name, "Upper Body Strength");
        assert_eq!(plan(6).unwrap().name, "Flexibility & Mobility");
        assert!(plan(0).is_none());
        assert!(plan(7).is_none());
        assert_eq!(plan(2).unwrap().setup().difficulty, Difficulty::Expert);
    }
}
