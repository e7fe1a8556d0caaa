//! Attempt history and progress aggregation.
//!
//! Every finished scoring pass becomes an [`AttemptRecord`]. Records are
//! append-only through the [`AttemptStore`] trait; the bundled
//! [`MemoryAttemptStore`] is the in-process implementation, and a real
//! backend can slot in behind the same trait. [`build_snapshot`] folds a
//! user's attempt history into the [`ProgressSnapshot`] the achievement
//! evaluator consumes.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::achievements::ProgressSnapshot;
use crate::challenge::{ChallengeCategory, QualityLevel};
use crate::error::StoreError;
use crate::scoring::{DimensionResult, OverallFeedback, ScoreResult};

/// One finished scoring attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub id: Uuid,
    pub challenge_id: String,
    /// The prompt as submitted.
    pub prompt: String,
    pub total_score: f64,
    pub max_score: u32,
    pub time_bonus: f64,
    pub final_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<u32>,
    pub quality_level: QualityLevel,
    pub dimensions: Vec<DimensionResult>,
    pub overall_feedback: OverallFeedback,
    pub created_at: DateTime<Utc>,
}

impl AttemptRecord {
    /// Builds a record from a scoring outcome, stamping id and time.
    pub fn from_result(
        challenge_id: impl Into<String>,
        prompt: impl Into<String>,
        elapsed_seconds: Option<u32>,
        result: &ScoreResult,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            challenge_id: challenge_id.into(),
            prompt: prompt.into(),
            total_score: result.total_score,
            max_score: result.max_score,
            time_bonus: result.time_bonus,
            final_score: result.final_score,
            elapsed_seconds,
            quality_level: result.quality_level,
            dimensions: result.dimensions.clone(),
            overall_feedback: result.overall_feedback.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Listing filter for attempt queries.
#[derive(Debug, Default, Clone)]
pub struct AttemptFilter {
    pub challenge_id: Option<String>,
}

/// Append-only attempt persistence seam.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Appends a record.
    async fn append(&self, record: AttemptRecord) -> Result<(), StoreError>;

    /// Lists records matching the filter, newest first.
    async fn list(&self, filter: &AttemptFilter) -> Result<Vec<AttemptRecord>, StoreError>;

    /// Fetches a record by id.
    async fn get(&self, id: Uuid) -> Result<Option<AttemptRecord>, StoreError>;

    /// Removes all records.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// In-memory attempt store.
#[derive(Debug, Default)]
pub struct MemoryAttemptStore {
    records: RwLock<Vec<AttemptRecord>>,
}

impl MemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttemptStore for MemoryAttemptStore {
    async fn append(&self, record: AttemptRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::Backend("attempt store lock poisoned".to_string()))?
            .push(record);
        Ok(())
    }

    async fn list(&self, filter: &AttemptFilter) -> Result<Vec<AttemptRecord>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Backend("attempt store lock poisoned".to_string()))?;
        let mut matched: Vec<AttemptRecord> = records
            .iter()
            .filter(|r| {
                filter
                    .challenge_id
                    .as_ref()
                    .map_or(true, |id| &r.challenge_id == id)
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn get(&self, id: Uuid) -> Result<Option<AttemptRecord>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Backend("attempt store lock poisoned".to_string()))?;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::Backend("attempt store lock poisoned".to_string()))?
            .clear();
        Ok(())
    }
}

/// Folds attempt history into the snapshot the achievement evaluator reads.
///
/// - completed challenges: distinct challenge ids with any attempt
/// - best score per challenge: max `finalScore`
/// - total points: sum of best scores
/// - categories: resolved through `category_of` (unresolvable ids are
///   counted as completions but contribute no category)
/// - streak: consecutive UTC days with an attempt, ending at the latest
pub fn build_snapshot(
    attempts: &[AttemptRecord],
    earned_achievement_ids: HashSet<String>,
    category_of: impl Fn(&str) -> Option<ChallengeCategory>,
) -> ProgressSnapshot {
    let mut best_scores: HashMap<String, f64> = HashMap::new();
    let mut completed: Vec<String> = Vec::new();
    let mut completed_categories: HashSet<ChallengeCategory> = HashSet::new();
    let mut par_time_beaten = false;

    for attempt in attempts {
        if !completed.contains(&attempt.challenge_id) {
            completed.push(attempt.challenge_id.clone());
        }
        let best = best_scores.entry(attempt.challenge_id.clone()).or_insert(0.0);
        if attempt.final_score > *best {
            *best = attempt.final_score;
        }
        if let Some(category) = category_of(&attempt.challenge_id) {
            completed_categories.insert(category);
        }
        if attempt.time_bonus > 0.0 {
            par_time_beaten = true;
        }
    }

    let total_points = best_scores.values().sum();

    ProgressSnapshot {
        completed_challenge_ids: completed,
        best_scores,
        total_points,
        completed_categories,
        earned_achievement_ids,
        par_time_beaten,
        streak_days: streak_days(attempts),
    }
}

/// Consecutive UTC days with at least one attempt, counted back from the
/// most recent attempt. Empty history is a streak of 0.
fn streak_days(attempts: &[AttemptRecord]) -> u32 {
    let mut days: Vec<chrono::NaiveDate> = attempts
        .iter()
        .map(|a| a.created_at.date_naive())
        .collect();
    days.sort();
    days.dedup();

    let Some(&latest) = days.last() else {
        return 0;
    };

    let mut streak = 1;
    let mut cursor = latest;
    for day in days.iter().rev().skip(1) {
        if *day == cursor - chrono::Days::new(1) {
            streak += 1;
            cursor = *day;
        } else {
            break;
        }
    }
    streak
}
