//! Achievement catalog and evaluator.
//!
//! Achievements are declarative: a static catalog pairs each entry with a
//! [`AchievementCriteria`] predicate over a [`ProgressSnapshot`]. Evaluation
//! is pure and idempotent; the caller owns the earned set and feeds it back
//! through the snapshot, so re-evaluating the same progress awards nothing
//! twice.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::challenge::ChallengeCategory;

/// Achievement rarity tier, used for display grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

/// Predicate deciding whether an achievement is earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AchievementCriteria {
    /// At least one challenge completed.
    FirstChallenge,
    /// Best final score at or above the threshold, optionally pinned to one
    /// challenge.
    ChallengeScore {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        challenge_id: Option<String>,
        threshold: f64,
    },
    /// At least `count` distinct challenges completed.
    TotalChallenges { count: usize },
    /// Cumulative best-score points at or above `points`.
    TotalPoints { points: f64 },
    /// A best final score of 100 or more, optionally pinned to one challenge.
    PerfectScore {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        challenge_id: Option<String>,
    },
    /// Par time beaten on any challenge.
    SpeedRun,
    /// Completed challenges in a specific category, or (with no category)
    /// in at least `count` distinct categories.
    CategoryMastery {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<ChallengeCategory>,
        count: usize,
    },
    /// Completed at least one challenge in every category.
    AllCategories,
    /// Attempted challenges on `days` consecutive days.
    Streak { days: u32 },
}

/// One catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementConfig {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub rarity: Rarity,
    /// Meta-points awarded for earning this achievement.
    pub points: u32,
    pub criteria: AchievementCriteria,
}

/// Aggregated user progress, the sole input to evaluation.
#[derive(Debug, Clone, Default)]
pub struct ProgressSnapshot {
    pub completed_challenge_ids: Vec<String>,
    /// Best final score per challenge id.
    pub best_scores: HashMap<String, f64>,
    /// Sum of best final scores across challenges.
    pub total_points: f64,
    /// Categories with at least one completed challenge.
    pub completed_categories: HashSet<ChallengeCategory>,
    pub earned_achievement_ids: HashSet<String>,
    /// Whether any attempt beat its challenge's par time.
    pub par_time_beaten: bool,
    /// Consecutive UTC days with at least one attempt, ending at the most
    /// recent attempt.
    pub streak_days: u32,
}

impl ProgressSnapshot {
    fn best_score(&self, challenge_id: &str) -> f64 {
        self.best_scores.get(challenge_id).copied().unwrap_or(0.0)
    }

    fn any_best_at_least(&self, threshold: f64) -> bool {
        self.best_scores.values().any(|s| *s >= threshold)
    }
}

/// Evaluates a catalog of achievements against progress snapshots.
pub struct AchievementEvaluator {
    catalog: Vec<AchievementConfig>,
}

impl AchievementEvaluator {
    /// Evaluator over a custom catalog.
    pub fn new(catalog: Vec<AchievementConfig>) -> Self {
        Self { catalog }
    }

    /// Evaluator over the built-in catalog.
    pub fn with_default_catalog() -> Self {
        Self::new(default_catalog())
    }

    /// The catalog, in evaluation order.
    pub fn catalog(&self) -> &[AchievementConfig] {
        &self.catalog
    }

    /// Looks up a catalog entry by id.
    pub fn get(&self, id: &str) -> Option<&AchievementConfig> {
        self.catalog.iter().find(|a| a.id == id)
    }

    /// Catalog entries of a given rarity, in catalog order.
    pub fn by_rarity(&self, rarity: Rarity) -> Vec<&AchievementConfig> {
        self.catalog.iter().filter(|a| a.rarity == rarity).collect()
    }

    /// Returns achievements newly earned by this snapshot, in catalog order.
    /// Entries already in `earned_achievement_ids` are never returned again.
    pub fn evaluate(&self, snapshot: &ProgressSnapshot) -> Vec<&AchievementConfig> {
        self.catalog
            .iter()
            .filter(|a| !snapshot.earned_achievement_ids.contains(&a.id))
            .filter(|a| Self::criteria_met(&a.criteria, snapshot))
            .collect()
    }

    fn criteria_met(criteria: &AchievementCriteria, snapshot: &ProgressSnapshot) -> bool {
        match criteria {
            AchievementCriteria::FirstChallenge => !snapshot.completed_challenge_ids.is_empty(),
            AchievementCriteria::ChallengeScore {
                challenge_id,
                threshold,
            } => match challenge_id {
                Some(id) => snapshot.best_score(id) >= *threshold,
                None => snapshot.any_best_at_least(*threshold),
            },
            AchievementCriteria::TotalChallenges { count } => {
                snapshot.completed_challenge_ids.len() >= *count
            }
            AchievementCriteria::TotalPoints { points } => snapshot.total_points >= *points,
            AchievementCriteria::PerfectScore { challenge_id } => match challenge_id {
                Some(id) => snapshot.best_score(id) >= 100.0,
                None => snapshot.any_best_at_least(100.0),
            },
            AchievementCriteria::SpeedRun => snapshot.par_time_beaten,
            AchievementCriteria::CategoryMastery { category, count } => match category {
                Some(cat) => snapshot.completed_categories.contains(cat),
                None => snapshot.completed_categories.len() >= *count,
            },
            AchievementCriteria::AllCategories => ChallengeCategory::ALL
                .iter()
                .all(|cat| snapshot.completed_categories.contains(cat)),
            AchievementCriteria::Streak { days } => snapshot.streak_days >= *days,
        }
    }
}

impl Default for AchievementEvaluator {
    fn default() -> Self {
        Self::with_default_catalog()
    }
}

/// The built-in achievement catalog, ordered common through legendary.
pub fn default_catalog() -> Vec<AchievementConfig> {
    fn entry(
        id: &str,
        name: &str,
        description: &str,
        icon: &str,
        rarity: Rarity,
        points: u32,
        criteria: AchievementCriteria,
    ) -> AchievementConfig {
        AchievementConfig {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            rarity,
            points,
            criteria,
        }
    }

    vec![
        entry(
            "first-swing",
            "First Swing",
            "Complete your first challenge",
            "⛳",
            Rarity::Common,
            10,
            AchievementCriteria::FirstChallenge,
        ),
        entry(
            "passing-grade",
            "Passing Grade",
            "Score 45+ on any challenge",
            "✅",
            Rarity::Common,
            10,
            AchievementCriteria::ChallengeScore {
                challenge_id: None,
                threshold: 45.0,
            },
        ),
        entry(
            "three-peat",
            "Three-Peat",
            "Complete 3 different challenges",
            "🎯",
            Rarity::Common,
            20,
            AchievementCriteria::TotalChallenges { count: 3 },
        ),
        entry(
            "getting-started",
            "Getting Started",
            "Earn 100 total points",
            "🌱",
            Rarity::Common,
            15,
            AchievementCriteria::TotalPoints { points: 100.0 },
        ),
        entry(
            "good-form",
            "Good Form",
            "Score 65+ on any challenge",
            "👍",
            Rarity::Rare,
            25,
            AchievementCriteria::ChallengeScore {
                challenge_id: None,
                threshold: 65.0,
            },
        ),
        entry(
            "half-way",
            "Halfway There",
            "Complete 5 different challenges",
            "🏔️",
            Rarity::Rare,
            30,
            AchievementCriteria::TotalChallenges { count: 5 },
        ),
        entry(
            "speed-demon",
            "Speed Demon",
            "Beat the par time on any challenge",
            "⚡",
            Rarity::Rare,
            25,
            AchievementCriteria::SpeedRun,
        ),
        entry(
            "point-collector",
            "Point Collector",
            "Earn 300 total points",
            "💰",
            Rarity::Rare,
            30,
            AchievementCriteria::TotalPoints { points: 300.0 },
        ),
        entry(
            "excellent-craft",
            "Excellent Craft",
            "Score 85+ (Excellent) on any challenge",
            "🌟",
            Rarity::Epic,
            50,
            AchievementCriteria::ChallengeScore {
                challenge_id: None,
                threshold: 85.0,
            },
        ),
        entry(
            "completionist",
            "Completionist",
            "Complete 8 different challenges",
            "🏆",
            Rarity::Epic,
            50,
            AchievementCriteria::TotalChallenges { count: 8 },
        ),
        entry(
            "versatile",
            "Versatile",
            "Complete challenges in 3 different categories",
            "🎨",
            Rarity::Epic,
            40,
            AchievementCriteria::CategoryMastery {
                category: None,
                count: 3,
            },
        ),
        entry(
            "big-scorer",
            "Big Scorer",
            "Earn 500 total points",
            "💎",
            Rarity::Epic,
            50,
            AchievementCriteria::TotalPoints { points: 500.0 },
        ),
        entry(
            "perfect-prompt",
            "Perfect Prompt",
            "Score 95+ on any challenge",
            "👑",
            Rarity::Legendary,
            100,
            AchievementCriteria::ChallengeScore {
                challenge_id: None,
                threshold: 95.0,
            },
        ),
        entry(
            "master-prompter",
            "Master Prompter",
            "Complete all 10 challenges",
            "🧙",
            Rarity::Legendary,
            100,
            AchievementCriteria::TotalChallenges { count: 10 },
        ),
        entry(
            "renaissance",
            "Renaissance",
            "Complete a challenge in every available category",
            "🌈",
            Rarity::Legendary,
            75,
            AchievementCriteria::AllCategories,
        ),
        entry(
            "elite-scorer",
            "Elite Scorer",
            "Earn 800 total points",
            "🔥",
            Rarity::Legendary,
            100,
            AchievementCriteria::TotalPoints { points: 800.0 },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_scores(scores: &[(&str, f64)]) -> ProgressSnapshot {
        let mut snapshot = ProgressSnapshot::default();
        for (id, score) in scores {
            snapshot.completed_challenge_ids.push(id.to_string());
            snapshot.best_scores.insert(id.to_string(), *score);
            snapshot.total_points += score;
        }
        snapshot
    }

    #[test]
    fn catalog_has_sixteen_unique_entries() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 16);
        let ids: HashSet<&str> = catalog.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids.len(), 16);
    }

    #[test]
    fn first_completion_earns_the_starter_set() {
        let evaluator = AchievementEvaluator::default();
        let snapshot = snapshot_with_scores(&[("email-summary", 50.0)]);

        let earned: Vec<&str> = evaluator
            .evaluate(&snapshot)
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(earned, vec!["first-swing", "passing-grade"]);
    }

    #[test]
    fn evaluation_is_idempotent_against_the_earned_set() {
        let evaluator = AchievementEvaluator::default();
        let mut snapshot = snapshot_with_scores(&[("email-summary", 50.0)]);

        for achievement in evaluator.evaluate(&snapshot) {
            snapshot
                .earned_achievement_ids
                .insert(achievement.id.clone());
        }
        assert!(evaluator.evaluate(&snapshot).is_empty());
    }

    #[test]
    fn score_thresholds_use_best_final_scores() {
        let evaluator = AchievementEvaluator::default();
        let snapshot = snapshot_with_scores(&[("a", 96.0)]);

        let earned: HashSet<&str> = evaluator
            .evaluate(&snapshot)
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert!(earned.contains("passing-grade"));
        assert!(earned.contains("good-form"));
        assert!(earned.contains("excellent-craft"));
        assert!(earned.contains("perfect-prompt"));
    }

    #[test]
    fn perfect_score_requires_one_hundred() {
        let snapshot = snapshot_with_scores(&[("a", 99.9)]);
        assert!(!AchievementEvaluator::criteria_met(
            &AchievementCriteria::PerfectScore { challenge_id: None },
            &snapshot
        ));

        // A time bonus can push the final score past 100.
        let snapshot = snapshot_with_scores(&[("a", 104.0)]);
        assert!(AchievementEvaluator::criteria_met(
            &AchievementCriteria::PerfectScore { challenge_id: None },
            &snapshot
        ));
    }

    #[test]
    fn total_points_sum_best_scores() {
        let evaluator = AchievementEvaluator::default();
        let snapshot = snapshot_with_scores(&[("a", 90.0), ("b", 85.0), ("c", 80.0), ("d", 50.0)]);

        let earned: HashSet<&str> = evaluator
            .evaluate(&snapshot)
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        // 305 points: getting-started and point-collector, not big-scorer.
        assert!(earned.contains("getting-started"));
        assert!(earned.contains("point-collector"));
        assert!(!earned.contains("big-scorer"));
    }

    #[test]
    fn all_categories_requires_every_variant() {
        let mut snapshot = ProgressSnapshot::default();
        for cat in ChallengeCategory::ALL.iter().take(8) {
            snapshot.completed_categories.insert(*cat);
        }
        assert!(!AchievementEvaluator::criteria_met(
            &AchievementCriteria::AllCategories,
            &snapshot
        ));

        snapshot.completed_categories.insert(ChallengeCategory::ALL[8]);
        assert!(AchievementEvaluator::criteria_met(
            &AchievementCriteria::AllCategories,
            &snapshot
        ));
    }

    #[test]
    fn category_mastery_counts_distinct_categories() {
        let mut snapshot = ProgressSnapshot::default();
        snapshot
            .completed_categories
            .insert(ChallengeCategory::Summarization);
        snapshot
            .completed_categories
            .insert(ChallengeCategory::Analysis);
        let any_three = AchievementCriteria::CategoryMastery {
            category: None,
            count: 3,
        };
        assert!(!AchievementEvaluator::criteria_met(&any_three, &snapshot));

        snapshot
            .completed_categories
            .insert(ChallengeCategory::Planning);
        assert!(AchievementEvaluator::criteria_met(&any_three, &snapshot));

        let specific = AchievementCriteria::CategoryMastery {
            category: Some(ChallengeCategory::Roleplay),
            count: 1,
        };
        assert!(!AchievementEvaluator::criteria_met(&specific, &snapshot));
    }

    #[test]
    fn speed_run_and_streak_read_snapshot_fields() {
        let mut snapshot = ProgressSnapshot::default();
        assert!(!AchievementEvaluator::criteria_met(
            &AchievementCriteria::SpeedRun,
            &snapshot
        ));
        snapshot.par_time_beaten = true;
        assert!(AchievementEvaluator::criteria_met(
            &AchievementCriteria::SpeedRun,
            &snapshot
        ));

        snapshot.streak_days = 2;
        assert!(!AchievementEvaluator::criteria_met(
            &AchievementCriteria::Streak { days: 3 },
            &snapshot
        ));
        snapshot.streak_days = 3;
        assert!(AchievementEvaluator::criteria_met(
            &AchievementCriteria::Streak { days: 3 },
            &snapshot
        ));
    }

    #[test]
    fn criteria_round_trip_through_tagged_serde() {
        let criteria = AchievementCriteria::ChallengeScore {
            challenge_id: Some("email-summary".to_string()),
            threshold: 85.0,
        };
        let json = serde_json::to_string(&criteria).expect("serialize");
        assert!(json.contains("\"type\":\"challenge_score\""));
        let parsed: AchievementCriteria = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, criteria);
    }
}
