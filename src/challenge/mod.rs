//! Challenge definitions: schema types and the YAML loader.
//!
//! Challenges live one-per-file in a directory of YAML documents. The loader
//! parses and validates each document independently: a malformed or invalid
//! file is logged and skipped without aborting its siblings, so one broken
//! challenge never takes down the catalog.
//!
//! # Example
//!
//! ```ignore
//! use prompt_golf::challenge::ChallengeLoader;
//!
//! let mut loader = ChallengeLoader::new();
//! let challenges = loader.load_directory("challenges/")?;
//! println!("Loaded {} challenges", challenges.len());
//! ```

pub mod schema;

pub use schema::{
    ChallengeCategory, ChallengeConfig, ChallengeContent, ChallengeFlags, ChallengeMetadata,
    Educational, JudgeConfig, ProgressionConfig, PromptExample, QualityLevel, QualityThresholds,
    RetryPolicy, Rubric, Scenario, ScoringConfig, ScoringDimension, SeedData, SeedDataKind,
    SuccessCriteria, TimeBonusConfig,
};

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::ChallengeError;

/// Loads challenge documents from YAML and caches validated configs by id.
///
/// Challenge objects are immutable once constructed; the cache hands out
/// `Arc` clones so clearing it never invalidates configs already returned.
#[derive(Debug, Default)]
pub struct ChallengeLoader {
    cache: HashMap<String, Arc<ChallengeConfig>>,
}

impl ChallengeLoader {
    /// Creates a new empty loader.
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Parses and validates a single challenge document.
    ///
    /// Syntax errors surface as [`ChallengeError::Parse`]; a well-formed
    /// document with the wrong shape surfaces as [`ChallengeError::Schema`]
    /// naming the violating field; the weight and maxScore business rules
    /// have their own error kinds. Does not touch the cache.
    pub fn parse_str(&self, text: &str) -> Result<ChallengeConfig, ChallengeError> {
        Self::parse_document(text, "<inline>")
    }

    fn parse_document(text: &str, origin: &str) -> Result<ChallengeConfig, ChallengeError> {
        // Two-phase parse so malformed syntax and shape violations stay
        // distinct error kinds.
        let value: serde_yaml::Value =
            serde_yaml::from_str(text).map_err(|e| ChallengeError::Parse {
                path: origin.to_string(),
                message: e.to_string(),
            })?;

        let challenge: ChallengeConfig = serde_yaml::from_value(value).map_err(|e| {
            ChallengeError::Schema(crate::error::SchemaViolations(vec![
                crate::error::SchemaViolation::new("<document>", e.to_string()),
            ]))
        })?;

        challenge.validate()?;
        Ok(challenge)
    }

    /// Loads and validates a single challenge file, caching it on success.
    pub fn load_file<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<Arc<ChallengeConfig>, ChallengeError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let challenge = Self::parse_document(&content, &path.display().to_string())?;

        if self.cache.contains_key(&challenge.id) {
            return Err(ChallengeError::DuplicateId(challenge.id.clone()));
        }

        let challenge = Arc::new(challenge);
        self.cache
            .insert(challenge.id.clone(), Arc::clone(&challenge));
        Ok(challenge)
    }

    /// Loads every `.yaml`/`.yml` challenge document in a directory.
    ///
    /// Files are visited in file-name order so insertion order is
    /// deterministic. A file that fails to parse or validate is logged and
    /// skipped; only a directory-level IO failure aborts the load.
    /// Challenges whose `flags.isActive` is explicitly false are dropped.
    pub fn load_directory<P: AsRef<Path>>(
        &mut self,
        dir: P,
    ) -> Result<Vec<Arc<ChallengeConfig>>, ChallengeError> {
        let dir = dir.as_ref();

        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .map(|ext| ext == "yaml" || ext == "yml")
                        .unwrap_or(false)
            })
            .collect();
        paths.sort();

        let mut challenges = Vec::new();
        for path in paths {
            match self.load_file(&path) {
                Ok(challenge) => {
                    if challenge.is_active() {
                        challenges.push(challenge);
                    } else {
                        tracing::debug!(
                            id = %challenge.id,
                            path = %path.display(),
                            "Skipping inactive challenge"
                        );
                        self.cache.remove(&challenge.id);
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping challenge file");
                }
            }
        }

        tracing::info!(
            count = challenges.len(),
            dir = %dir.display(),
            "Loaded challenges"
        );
        Ok(challenges)
    }

    /// Returns a previously loaded challenge by id.
    pub fn cached(&self, id: &str) -> Option<Arc<ChallengeConfig>> {
        self.cache.get(id).cloned()
    }

    /// Number of cached challenges.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// True when the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Clears the cache (hot-reload support). Already-returned configs stay
    /// valid because they are reference counted.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use super::schema::*;

    /// A structurally valid challenge with four dimensions whose weights sum
    /// to 100 and whose maxPoints sum to maxScore.
    pub fn sample_challenge(id: &str) -> ChallengeConfig {
        ChallengeConfig {
            id: id.to_string(),
            version: "1.0.0".to_string(),
            metadata: ChallengeMetadata {
                title: "Summarize the Incident Email".to_string(),
                short_description: "Turn a sprawling outage email into a crisp summary".to_string(),
                category: ChallengeCategory::Summarization,
                difficulty: 2,
                estimated_minutes: 10,
                tags: vec!["email".to_string(), "crisis".to_string()],
                author: Some("course-team".to_string()),
                created_at: "2025-01-10T00:00:00Z".to_string(),
                updated_at: "2025-01-10T00:00:00Z".to_string(),
            },
            content: ChallengeContent {
                scenario: Scenario {
                    headline: "Your VP needs the outage story in 30 seconds".to_string(),
                    context: "A three-page incident email thread landed in your inbox."
                        .to_string(),
                    constraints: Some(vec!["Keep it under 150 words".to_string()]),
                    persona: Some("Engineering manager".to_string()),
                },
                success_criteria: SuccessCriteria {
                    ideal_outcome: "A prompt that yields an accurate, skimmable summary"
                        .to_string(),
                    must_include: Some(vec!["target audience".to_string()]),
                    must_avoid: Some(vec!["speculation about blame".to_string()]),
                },
                educational: Educational {
                    skills_taught: vec!["audience framing".to_string()],
                    concept_explanation: None,
                    bad_example: PromptExample {
                        prompt: "summarize this".to_string(),
                        score: Some(20.0),
                        explanation: "No audience, length, or format guidance".to_string(),
                    },
                    good_example: PromptExample {
                        prompt: "Summarize the incident email for a VP in 3 bullets".to_string(),
                        score: Some(75.0),
                        explanation: "Audience and format are explicit".to_string(),
                    },
                    expert_example: None,
                },
                seed_data: None,
            },
            scoring: ScoringConfig {
                max_score: 100,
                time_bonus: Some(TimeBonusConfig {
                    enabled: true,
                    max_bonus_percent: 20,
                    par_time_seconds: 60,
                }),
                dimensions: vec![
                    sample_dimension("clarity", "Clarity", 30, 30),
                    sample_dimension("specificity", "Specificity", 25, 25),
                    sample_dimension("context", "Context", 25, 25),
                    sample_dimension("structure", "Structure", 20, 20),
                ],
                judge: JudgeConfig {
                    model: "claude-sonnet-4-20250514".to_string(),
                    temperature: 0.3,
                    system_prompt_override: None,
                },
                thresholds: QualityThresholds {
                    excellent: 85,
                    good: 65,
                    passing: 45,
                },
            },
            progression: ProgressionConfig {
                prerequisites: None,
                unlock_score: None,
                next_challenges: None,
                retries: RetryPolicy {
                    unlimited: true,
                    max_attempts: None,
                    cooldown_seconds: None,
                },
            },
            flags: None,
        }
    }

    pub fn sample_dimension(id: &str, name: &str, weight: u32, max_points: u32) -> ScoringDimension {
        ScoringDimension {
            id: id.to_string(),
            name: name.to_string(),
            description: format!("{} of the prompt", name),
            weight,
            max_points,
            rubric: Rubric {
                excellent: format!("{} is outstanding", name),
                good: format!("{} is solid", name),
                fair: format!("{} is uneven", name),
                poor: format!("{} is missing", name),
            },
        }
    }

    /// Serializes a sample challenge to YAML for loader tests.
    pub fn sample_challenge_yaml(id: &str) -> String {
        serde_yaml::to_string(&sample_challenge(id)).expect("fixture serializes")
    }
}
