//! Challenge configuration schema.
//!
//! Every challenge is an instance of [`ChallengeConfig`], loaded from a YAML
//! document and validated before it can enter the registry. Validation is
//! total: structural checks walk every field and collect every violation
//! rather than stopping at the first, so challenge authors see the complete
//! list in one pass. Cross-field business rules (weight sum, maxScore
//! consistency) run after structural validation and surface as distinct
//! error kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ChallengeError, SchemaViolation, SchemaViolations};

/// Maximum length of a challenge title.
const MAX_TITLE_LEN: usize = 100;
/// Maximum length of a challenge short description.
const MAX_SHORT_DESCRIPTION_LEN: usize = 200;

/// Root challenge configuration entity.
///
/// Immutable once loaded; the registry replaces whole configs on reload and
/// never mutates them in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeConfig {
    /// Slug-like identifier (lowercase alphanumeric + hyphen).
    pub id: String,
    /// Semantic version (`MAJOR.MINOR.PATCH`).
    pub version: String,
    pub metadata: ChallengeMetadata,
    pub content: ChallengeContent,
    pub scoring: ScoringConfig,
    pub progression: ProgressionConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<ChallengeFlags>,
}

/// Descriptive metadata for a challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeMetadata {
    pub title: String,
    pub short_description: String,
    pub category: ChallengeCategory,
    /// Difficulty tier from 1 (warm-up) to 5 (expert).
    pub difficulty: u8,
    pub estimated_minutes: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Challenge categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChallengeCategory {
    Summarization,
    Communication,
    Analysis,
    Documentation,
    Strategy,
    Automation,
    Planning,
    Roleplay,
    MetaPrompting,
}

impl ChallengeCategory {
    /// All categories, in canonical order.
    pub const ALL: [ChallengeCategory; 9] = [
        ChallengeCategory::Summarization,
        ChallengeCategory::Communication,
        ChallengeCategory::Analysis,
        ChallengeCategory::Documentation,
        ChallengeCategory::Strategy,
        ChallengeCategory::Automation,
        ChallengeCategory::Planning,
        ChallengeCategory::Roleplay,
        ChallengeCategory::MetaPrompting,
    ];

    /// Returns the wire/document representation of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeCategory::Summarization => "summarization",
            ChallengeCategory::Communication => "communication",
            ChallengeCategory::Analysis => "analysis",
            ChallengeCategory::Documentation => "documentation",
            ChallengeCategory::Strategy => "strategy",
            ChallengeCategory::Automation => "automation",
            ChallengeCategory::Planning => "planning",
            ChallengeCategory::Roleplay => "roleplay",
            ChallengeCategory::MetaPrompting => "meta-prompting",
        }
    }

    /// Parses a category from its wire representation.
    pub fn from_str_opt(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for ChallengeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-facing challenge content: the scenario, how success is judged, and
/// the educational material shown around the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeContent {
    pub scenario: Scenario,
    pub success_criteria: SuccessCriteria,
    pub educational: Educational,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_data: Option<SeedData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub headline: String,
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessCriteria {
    pub ideal_outcome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub must_include: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub must_avoid: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Educational {
    pub skills_taught: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_explanation: Option<String>,
    pub bad_example: PromptExample,
    pub good_example: PromptExample,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expert_example: Option<PromptExample>,
}

/// A worked example prompt with an optional reference score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptExample {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub explanation: String,
}

/// Optional reference material shown to the user alongside the scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    #[serde(rename = "type")]
    pub kind: SeedDataKind,
    pub content: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeedDataKind {
    Text,
    Table,
    Json,
    ImageUrl,
}

/// Scoring configuration: the judge setup, rubric dimensions, and quality
/// thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringConfig {
    /// Ceiling the judge's total score must respect.
    pub max_score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_bonus: Option<TimeBonusConfig>,
    /// Ordered rubric dimensions; weights must sum to exactly 100.
    pub dimensions: Vec<ScoringDimension>,
    pub judge: JudgeConfig,
    pub thresholds: QualityThresholds,
}

/// Time-bonus policy for beating the par time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBonusConfig {
    pub enabled: bool,
    pub max_bonus_percent: u32,
    pub par_time_seconds: u32,
}

/// Judge model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeConfig {
    /// Model identifier forwarded verbatim to the judge gateway.
    pub model: String,
    pub temperature: f64,
    /// When set, the compiled judge instructions are replaced wholesale by
    /// this text. Escape hatch for challenge authors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
}

/// Score cutoffs for quality classification, ascending.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityThresholds {
    pub excellent: u32,
    pub good: u32,
    pub passing: u32,
}

/// A single rubric dimension of a challenge's scoring config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringDimension {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Percentage contribution, 0-100. All weights in a challenge sum to 100.
    pub weight: u32,
    /// Point ceiling for this dimension.
    pub max_points: u32,
    pub rubric: Rubric,
}

/// Four-tier rubric text for a dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rubric {
    pub excellent: String,
    pub good: String,
    pub fair: String,
    pub poor: String,
}

/// Progression rules: prerequisites, unlock gates, retry policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<Vec<String>>,
    /// Minimum score each prerequisite must have been completed with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlock_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_challenges: Option<Vec<String>>,
    pub retries: RetryPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    pub unlimited: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_seconds: Option<u32>,
}

/// Feature flags controlling visibility and rollout of a challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeFlags {
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_experimental: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_tenants: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Quality tier for a scored prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QualityLevel::Excellent => "excellent",
            QualityLevel::Good => "good",
            QualityLevel::Fair => "fair",
            QualityLevel::Poor => "poor",
        };
        f.write_str(s)
    }
}

impl ChallengeConfig {
    /// Validates the full configuration.
    ///
    /// Structural checks run first and collect every violation into a single
    /// [`ChallengeError::Schema`]. Cross-field business rules (weight sum,
    /// maxScore consistency) run only on structurally valid configs and
    /// surface as their own error kinds so callers can render field-specific
    /// guidance.
    pub fn validate(&self) -> Result<(), ChallengeError> {
        let mut violations = Vec::new();

        self.validate_identity(&mut violations);
        self.metadata.validate(&mut violations);
        self.content.validate(&mut violations);
        self.scoring.validate_structure(&mut violations);

        if !violations.is_empty() {
            return Err(ChallengeError::Schema(SchemaViolations(violations)));
        }

        let weight_sum: u32 = self.scoring.dimensions.iter().map(|d| d.weight).sum();
        if weight_sum != 100 {
            return Err(ChallengeError::ScoringWeight { sum: weight_sum });
        }

        let points_sum: u32 = self.scoring.dimensions.iter().map(|d| d.max_points).sum();
        if points_sum != self.scoring.max_score {
            return Err(ChallengeError::MaxScoreMismatch {
                max_score: self.scoring.max_score,
                points_sum,
            });
        }

        Ok(())
    }

    /// Whether the challenge should be served at all.
    pub fn is_active(&self) -> bool {
        self.flags.as_ref().map_or(true, |f| f.is_active)
    }

    /// Whether the challenge is featured.
    pub fn is_featured(&self) -> bool {
        self.flags.as_ref().is_some_and(|f| f.is_featured)
    }

    /// Whether the given tenant may see this challenge. A challenge with no
    /// tenant allow-list is visible to everyone.
    pub fn allows_tenant(&self, tenant_id: &str) -> bool {
        match self.flags.as_ref().and_then(|f| f.allowed_tenants.as_ref()) {
            Some(allowed) => allowed.iter().any(|t| t == tenant_id),
            None => true,
        }
    }

    fn validate_identity(&self, violations: &mut Vec<SchemaViolation>) {
        if self.id.is_empty() {
            violations.push(SchemaViolation::new("id", "must not be empty"));
        } else if !is_slug(&self.id) {
            violations.push(SchemaViolation::new(
                "id",
                "must contain only lowercase alphanumeric characters and hyphens",
            ));
        }

        if semver::Version::parse(&self.version).is_err() {
            violations.push(SchemaViolation::new(
                "version",
                format!(
                    "'{}' is not a semantic version (expected MAJOR.MINOR.PATCH)",
                    self.version
                ),
            ));
        }
    }
}

impl ChallengeMetadata {
    fn validate(&self, violations: &mut Vec<SchemaViolation>) {
        if self.title.is_empty() || self.title.len() > MAX_TITLE_LEN {
            violations.push(SchemaViolation::new(
                "metadata.title",
                format!("must be 1-{} characters", MAX_TITLE_LEN),
            ));
        }
        if self.short_description.is_empty()
            || self.short_description.len() > MAX_SHORT_DESCRIPTION_LEN
        {
            violations.push(SchemaViolation::new(
                "metadata.shortDescription",
                format!("must be 1-{} characters", MAX_SHORT_DESCRIPTION_LEN),
            ));
        }
        if !(1..=5).contains(&self.difficulty) {
            violations.push(SchemaViolation::new(
                "metadata.difficulty",
                "must be between 1 and 5",
            ));
        }
        if !(1..=60).contains(&self.estimated_minutes) {
            violations.push(SchemaViolation::new(
                "metadata.estimatedMinutes",
                "must be between 1 and 60",
            ));
        }
    }
}

impl ChallengeContent {
    fn validate(&self, violations: &mut Vec<SchemaViolation>) {
        if self.scenario.headline.is_empty() {
            violations.push(SchemaViolation::new(
                "content.scenario.headline",
                "must not be empty",
            ));
        }
        if self.scenario.context.is_empty() {
            violations.push(SchemaViolation::new(
                "content.scenario.context",
                "must not be empty",
            ));
        }
        if self.success_criteria.ideal_outcome.is_empty() {
            violations.push(SchemaViolation::new(
                "content.successCriteria.idealOutcome",
                "must not be empty",
            ));
        }
        if self.educational.skills_taught.is_empty() {
            violations.push(SchemaViolation::new(
                "content.educational.skillsTaught",
                "must list at least one skill",
            ));
        }
        if self.educational.bad_example.prompt.is_empty() {
            violations.push(SchemaViolation::new(
                "content.educational.badExample.prompt",
                "must not be empty",
            ));
        }
        if self.educational.good_example.prompt.is_empty() {
            violations.push(SchemaViolation::new(
                "content.educational.goodExample.prompt",
                "must not be empty",
            ));
        }
    }
}

impl ScoringConfig {
    fn validate_structure(&self, violations: &mut Vec<SchemaViolation>) {
        if self.max_score == 0 {
            violations.push(SchemaViolation::new(
                "scoring.maxScore",
                "must be at least 1",
            ));
        }

        if self.dimensions.is_empty() {
            violations.push(SchemaViolation::new(
                "scoring.dimensions",
                "must contain at least one dimension",
            ));
        }

        let mut seen_ids = Vec::new();
        for (i, dim) in self.dimensions.iter().enumerate() {
            let path = format!("scoring.dimensions[{}]", i);
            if dim.id.is_empty() || !is_slug(&dim.id) {
                violations.push(SchemaViolation::new(
                    format!("{}.id", path),
                    "must be a non-empty lowercase slug",
                ));
            }
            if seen_ids.contains(&dim.id.as_str()) {
                violations.push(SchemaViolation::new(
                    format!("{}.id", path),
                    format!("duplicate dimension id '{}'", dim.id),
                ));
            }
            seen_ids.push(dim.id.as_str());

            if dim.name.is_empty() {
                violations.push(SchemaViolation::new(
                    format!("{}.name", path),
                    "must not be empty",
                ));
            }
            if dim.weight > 100 {
                violations.push(SchemaViolation::new(
                    format!("{}.weight", path),
                    "must be between 0 and 100",
                ));
            }
            if dim.max_points == 0 {
                violations.push(SchemaViolation::new(
                    format!("{}.maxPoints", path),
                    "must be at least 1",
                ));
            }
        }

        if let Some(tb) = &self.time_bonus {
            if tb.max_bonus_percent > 100 {
                violations.push(SchemaViolation::new(
                    "scoring.timeBonus.maxBonusPercent",
                    "must be between 0 and 100",
                ));
            }
            if tb.enabled && tb.par_time_seconds == 0 {
                violations.push(SchemaViolation::new(
                    "scoring.timeBonus.parTimeSeconds",
                    "must be at least 1 when the bonus is enabled",
                ));
            }
        }

        if self.judge.model.is_empty() {
            violations.push(SchemaViolation::new(
                "scoring.judge.model",
                "must not be empty",
            ));
        }
        if !(0.0..=2.0).contains(&self.judge.temperature) {
            violations.push(SchemaViolation::new(
                "scoring.judge.temperature",
                "must be between 0.0 and 2.0",
            ));
        }

        let t = &self.thresholds;
        if !(t.passing < t.good && t.good < t.excellent) {
            violations.push(SchemaViolation::new(
                "scoring.thresholds",
                "must be strictly ascending: passing < good < excellent",
            ));
        }
    }
}

impl QualityThresholds {
    /// Classifies a final score into a quality tier.
    pub fn classify(&self, score: f64) -> QualityLevel {
        if score >= f64::from(self.excellent) {
            QualityLevel::Excellent
        } else if score >= f64::from(self.good) {
            QualityLevel::Good
        } else if score >= f64::from(self.passing) {
            QualityLevel::Fair
        } else {
            QualityLevel::Poor
        }
    }
}

/// Checks the lowercase-alphanumeric-plus-hyphen slug constraint.
fn is_slug(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
