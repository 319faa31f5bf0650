// Plan and history store on the sled embedded database.
// Values are bincode; keep stored types free of skip_serializing_if and
// internally tagged enums, which bincode cannot read back.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::{Db, Tree};
use std::path::{Path, PathBuf};

use crate::models::{CompletedWorkoutSession, DayWorkout, ExerciseReplacement, Preferences, WorkoutPlan};
use crate::workout::ActiveWorkoutSnapshot;

/// Environment variable overriding the database location
pub const DB_PATH_ENV: &str = "AI_TRAINER_DB_PATH";

const PLANS_TREE: &str = "plans";
const HISTORY_TREE: &str = "history";
const ACTIVE_TREE: &str = "active";
const META_TREE: &str = "meta";

const ACTIVE_PLAN_KEY: &str = "active_plan";
const PREFERENCES_KEY: &str = "preferences";
const ACTIVE_WORKOUT_KEY: &str = "current";

/// Storage manager for local embedded database
pub struct Storage {
    db: Db,
}

impl Storage {
    /// Database directory (~/.ai-trainer/db), or `AI_TRAINER_DB_PATH` when set
    pub fn db_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(DB_PATH_ENV) {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        let config_dir = crate::config::Config::config_dir()?;
        Ok(config_dir.join("db"))
    }

    /// Open the database at the default location
    pub fn init() -> Result<Self> {
        Self::open(&Self::db_path()?)
    }

    pub fn open(path: &Path) -> Result<Self> {
        tracing::info!("Opening sled database at {:?}", path);

        let db = sled::open(path).context("Failed to open sled database")?;

        Ok(Self { db })
    }

    fn tree(&self, name: &str) -> Result<Tree> {
        self.db
            .open_tree(name)
            .with_context(|| format!("Failed to open {} tree", name))
    }

    fn put<T: Serialize>(&self, tree: &str, key: &str, value: &T) -> Result<()> {
        let bytes = bincode::serialize(value)
            .with_context(|| format!("Failed to serialize {} entry", tree))?;

        self.tree(tree)?
            .insert(key.as_bytes(), bytes)
            .with_context(|| format!("Failed to insert into {}", tree))?;

        self.db.flush().context("Failed to flush database")?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, tree: &str, key: &str) -> Result<Option<T>> {
        match self
            .tree(tree)?
            .get(key.as_bytes())
            .with_context(|| format!("Failed to read from {}", tree))?
        {
            Some(bytes) => {
                let value = bincode::deserialize(&bytes)
                    .with_context(|| format!("Failed to deserialize {} entry", tree))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn remove(&self, tree: &str, key: &str) -> Result<bool> {
        let removed = self
            .tree(tree)?
            .remove(key.as_bytes())
            .with_context(|| format!("Failed to delete from {}", tree))?
            .is_some();

        if removed {
            self.db.flush().context("Failed to flush database")?;
        }
        Ok(removed)
    }

    fn values<T: DeserializeOwned>(&self, tree: &str) -> Result<Vec<T>> {
        let mut values = Vec::new();
        for item in self.tree(tree)?.iter() {
            let (_key, bytes) = item.with_context(|| format!("Failed to iterate {}", tree))?;
            let value = bincode::deserialize(&bytes)
                .with_context(|| format!("Failed to deserialize {} entry", tree))?;
            values.push(value);
        }
        Ok(values)
    }

    // Plans

    /// Store a plan; the first plan saved becomes the active one
    pub fn save_plan(&self, plan: &WorkoutPlan) -> Result<()> {
        self.put(PLANS_TREE, &plan.id, plan)?;
        if self.active_plan_id()?.is_none() {
            self.set_active_plan(&plan.id)?;
        }

        tracing::debug!("Saved plan {}", plan.id);
        Ok(())
    }

    pub fn get_plan(&self, id: &str) -> Result<Option<WorkoutPlan>> {
        self.get(PLANS_TREE, id)
    }

    pub fn list_plans(&self) -> Result<Vec<WorkoutPlan>> {
        let mut plans: Vec<WorkoutPlan> = self.values(PLANS_TREE)?;
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(plans)
    }

    fn active_plan_id(&self) -> Result<Option<String>> {
        self.get(META_TREE, ACTIVE_PLAN_KEY)
    }

    pub fn set_active_plan(&self, id: &str) -> Result<()> {
        if self.get_plan(id)?.is_none() {
            return Err(anyhow::anyhow!("Plan {} not found", id));
        }
        self.put(META_TREE, ACTIVE_PLAN_KEY, &id.to_string())?;

        tracing::debug!("Active plan set to {}", id);
        Ok(())
    }

    pub fn active_plan(&self) -> Result<Option<WorkoutPlan>> {
        match self.active_plan_id()? {
            Some(id) => self.get_plan(&id),
            None => Ok(None),
        }
    }

    /// A day of the active plan, by label
    pub fn find_day(&self, label: &str) -> Result<Option<DayWorkout>> {
        Ok(self
            .active_plan()?
            .and_then(|plan| plan.day(label).cloned()))
    }

    /// Persist a mid-workout swap into the stored plan.
    /// Returns false when the plan or exercise no longer exists.
    pub fn apply_replacement(&self, plan_id: &str, replacement: &ExerciseReplacement) -> Result<bool> {
        let Some(mut plan) = self.get_plan(plan_id)? else {
            tracing::warn!("Plan {} missing, replacement not persisted", plan_id);
            return Ok(false);
        };

        if !plan.apply_replacement(replacement) {
            tracing::warn!(
                "No {} on {} in plan {}",
                replacement.original_name,
                replacement.day,
                plan_id
            );
            return Ok(false);
        }

        self.put(PLANS_TREE, &plan.id, &plan)?;
        tracing::info!(
            "Replaced {} with {} on {}",
            replacement.original_name,
            replacement.replacement.name,
            replacement.day
        );
        Ok(true)
    }

    // History

    pub fn save_session(&self, session: &CompletedWorkoutSession) -> Result<()> {
        self.put(HISTORY_TREE, &session.id, session)?;

        tracing::debug!("Saved session {}", session.id);
        Ok(())
    }

    pub fn get_session(&self, id: &str) -> Result<Option<CompletedWorkoutSession>> {
        self.get(HISTORY_TREE, id)
    }

    /// All completed sessions, most recent first
    pub fn list_sessions(&self) -> Result<Vec<CompletedWorkoutSession>> {
        let mut sessions: Vec<CompletedWorkoutSession> = self.values(HISTORY_TREE)?;
        sessions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(sessions)
    }

    pub fn delete_session(&self, id: &str) -> Result<bool> {
        let deleted = self.remove(HISTORY_TREE, id)?;
        if deleted {
            tracing::debug!("Deleted session {}", id);
        }
        Ok(deleted)
    }

    // Preferences

    pub fn save_preferences(&self, preferences: &Preferences) -> Result<()> {
        self.put(META_TREE, PREFERENCES_KEY, preferences)
    }

    pub fn load_preferences(&self) -> Result<Preferences> {
        Ok(self.get(META_TREE, PREFERENCES_KEY)?.unwrap_or_default())
    }

    // In-progress workout

    pub fn save_active_workout(&self, snapshot: &ActiveWorkoutSnapshot) -> Result<()> {
        self.put(ACTIVE_TREE, ACTIVE_WORKOUT_KEY, snapshot)
    }

    pub fn load_active_workout(&self) -> Result<Option<ActiveWorkoutSnapshot>> {
        self.get(ACTIVE_TREE, ACTIVE_WORKOUT_KEY)
    }

    pub fn clear_active_workout(&self) -> Result<()> {
        if self.remove(ACTIVE_TREE, ACTIVE_WORKOUT_KEY)? {
            tracing::debug!("Cleared in-progress workout");
        }
        Ok(())
    }
}
