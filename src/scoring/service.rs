//! Scoring service: the full judge-and-score pipeline.
//!
//! One scoring pass compiles the judge prompt, invokes the judge through an
//! [`LlmProvider`], parses the verdict, reconciles it against the challenge's
//! dimension list, applies the time bonus, and classifies the final score.
//! The service holds no per-attempt state; a failed pass produces an error
//! and nothing else.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::challenge::{ChallengeConfig, QualityLevel, TimeBonusConfig};
use crate::error::ScoringError;
use crate::llm::{GenerationRequest, LlmProvider, Message};
use crate::registry::ChallengeRegistry;
use crate::scoring::judge_prompt::compile_judge_prompt;
use crate::scoring::response::{parse_score_payload, OverallFeedback, RawScoreResult};

/// Hard cap on submitted prompt length, in characters.
pub const MAX_PROMPT_CHARS: usize = 10_000;

/// A scoring request as submitted by a caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    pub challenge_id: String,
    pub prompt: String,
    #[serde(default)]
    pub elapsed_seconds: Option<u32>,
}

impl ScoreRequest {
    /// Validates caller-supplied fields before any judge work happens.
    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.challenge_id.is_empty() {
            return Err(ScoringError::InvalidRequest(
                "challengeId must not be empty".to_string(),
            ));
        }
        if self.prompt.trim().is_empty() {
            return Err(ScoringError::InvalidRequest(
                "prompt must not be empty".to_string(),
            ));
        }
        if self.prompt.chars().count() > MAX_PROMPT_CHARS {
            return Err(ScoringError::InvalidRequest(format!(
                "prompt exceeds {} characters",
                MAX_PROMPT_CHARS
            )));
        }
        Ok(())
    }
}

/// Per-dimension outcome in challenge-declared order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionResult {
    pub id: String,
    pub score: f64,
    pub max_points: u32,
    pub feedback: String,
}

/// The complete outcome of a scoring pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub total_score: f64,
    pub max_score: u32,
    /// `totalScore / maxScore`, rounded to a whole percent.
    pub percentage: u32,
    pub dimensions: Vec<DimensionResult>,
    pub overall_feedback: OverallFeedback,
    /// Derived from `finalScore` against the challenge thresholds; the
    /// judge's own label is ignored.
    pub quality_level: QualityLevel,
    pub time_bonus: f64,
    pub final_score: f64,
}

/// Computes the time bonus for an attempt.
///
/// Zero unless the challenge enables the bonus, the caller reported an
/// elapsed time, and that time beat par. A reported time of 0 beats any par.
pub fn compute_time_bonus(
    total_score: f64,
    time_bonus: Option<&TimeBonusConfig>,
    elapsed_seconds: Option<u32>,
) -> f64 {
    let Some(config) = time_bonus.filter(|c| c.enabled) else {
        return 0.0;
    };
    let Some(elapsed) = elapsed_seconds else {
        return 0.0;
    };
    if elapsed >= config.par_time_seconds {
        return 0.0;
    }

    let time_factor = 1.0 - f64::from(elapsed) / f64::from(config.par_time_seconds);
    (total_score * f64::from(config.max_bonus_percent) / 100.0 * time_factor).round()
}

/// Stateless scoring pipeline over a judge provider.
pub struct ScoringService {
    provider: Arc<dyn LlmProvider>,
}

impl ScoringService {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Scores a user prompt against a challenge.
    pub async fn score(
        &self,
        user_prompt: &str,
        challenge: &ChallengeConfig,
        elapsed_seconds: Option<u32>,
    ) -> Result<ScoreResult, ScoringError> {
        let system_prompt = compile_judge_prompt(challenge);
        let request = GenerationRequest::new(
            challenge.scoring.judge.model.clone(),
            vec![
                Message::system(system_prompt),
                Message::user(format!(
                    "USER'S PROMPT TO EVALUATE:\n\n{}",
                    user_prompt
                )),
            ],
        )
        .with_temperature(challenge.scoring.judge.temperature);

        tracing::info!(
            challenge_id = %challenge.id,
            model = %challenge.scoring.judge.model,
            "Scoring prompt"
        );

        let mut stream = self.provider.generate_stream(request).await?;
        let mut payload = String::new();
        while let Some(fragment) = stream.next().await {
            payload.push_str(&fragment?);
        }

        let raw = parse_score_payload(&payload)?;
        Ok(Self::assemble(challenge, raw, elapsed_seconds))
    }

    /// Validates a request, resolves its challenge, and scores it.
    pub async fn score_request(
        &self,
        registry: &ChallengeRegistry,
        request: &ScoreRequest,
    ) -> Result<ScoreResult, ScoringError> {
        request.validate()?;
        let challenge = registry
            .get_opt(&request.challenge_id)
            .ok_or_else(|| ScoringError::ChallengeNotFound(request.challenge_id.clone()))?;
        self.score(&request.prompt, &challenge, request.elapsed_seconds)
            .await
    }

    /// Reconciles the raw verdict against the challenge and computes the
    /// derived fields. Dimensions the judge omitted score 0 with empty
    /// feedback; dimensions the judge invented are dropped.
    fn assemble(
        challenge: &ChallengeConfig,
        mut raw: RawScoreResult,
        elapsed_seconds: Option<u32>,
    ) -> ScoreResult {
        let scoring = &challenge.scoring;

        let total_score = raw.total_score.clamp(0.0, f64::from(scoring.max_score));

        let dimensions: Vec<DimensionResult> = scoring
            .dimensions
            .iter()
            .map(|dim| {
                let reported = raw.dimensions.remove(&dim.id);
                let (score, feedback) = match reported {
                    Some(r) => (r.score.clamp(0.0, f64::from(dim.max_points)), r.feedback),
                    None => (0.0, String::new()),
                };
                DimensionResult {
                    id: dim.id.clone(),
                    score,
                    max_points: dim.max_points,
                    feedback,
                }
            })
            .collect();

        if !raw.dimensions.is_empty() {
            tracing::debug!(
                challenge_id = %challenge.id,
                extra = ?raw.dimensions.keys().collect::<Vec<_>>(),
                "Judge reported unknown dimensions"
            );
        }

        let time_bonus =
            compute_time_bonus(total_score, scoring.time_bonus.as_ref(), elapsed_seconds);
        let final_score = total_score + time_bonus;
        let percentage =
            (total_score / f64::from(scoring.max_score) * 100.0).round() as u32;

        ScoreResult {
            total_score,
            max_score: scoring.max_score,
            percentage,
            dimensions,
            overall_feedback: raw.overall_feedback,
            quality_level: scoring.thresholds.classify(final_score),
            time_bonus,
            final_score,
        }
    }
}
