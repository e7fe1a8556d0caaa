//! Tolerant parsing of judge model output.
//!
//! Judge models are instructed to return bare JSON but routinely wrap it in
//! markdown fences or preface it with commentary. Parsing strips fences
//! first, tries the whole payload, then falls back to scanning lines from the
//! end for the JSON object. Only when every strategy fails does the caller
//! see a [`ScoringError::Parse`].

use std::collections::HashMap;

use regex::Regex;
use serde::Deserialize;

use crate::challenge::QualityLevel;
use crate::error::ScoringError;

/// The judge's raw verdict, straight off the wire.
///
/// `dimensions` is keyed by dimension id and may be incomplete or carry
/// extra keys; the scoring service reconciles it against the challenge's
/// dimension list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawScoreResult {
    pub total_score: f64,
    #[serde(default)]
    pub dimensions: HashMap<String, RawDimensionScore>,
    pub overall_feedback: OverallFeedback,
    /// The judge's self-assessed quality label. Parsed for diagnostics but
    /// not authoritative: the service derives the level from thresholds.
    #[serde(default)]
    pub prompt_quality_level: Option<QualityLevel>,
}

/// Score and feedback for a single dimension as reported by the judge.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDimensionScore {
    pub score: f64,
    #[serde(default)]
    pub feedback: String,
}

/// Narrative feedback accompanying the numeric verdict.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallFeedback {
    pub what_you_did_well: String,
    pub primary_improvement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_improvement: Option<String>,
}

/// Strips markdown code fences (```json ... ``` or bare ``` ... ```) from
/// around a payload, returning the inner text.
pub fn strip_code_fences(text: &str) -> String {
    let fence = Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("valid fence regex");
    match fence.captures(text) {
        Some(captures) => captures[1].trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Parses a judge payload into a [`RawScoreResult`].
pub fn parse_score_payload(text: &str) -> Result<RawScoreResult, ScoringError> {
    let stripped = strip_code_fences(text);

    if let Ok(result) = serde_json::from_str::<RawScoreResult>(&stripped) {
        return Ok(result);
    }

    // Commentary around the object: walk candidate opening braces from the
    // end, so the last complete result object in the payload wins.
    let opens: Vec<usize> = stripped.match_indices('{').map(|(i, _)| i).collect();
    for offset in opens.into_iter().rev() {
        let candidate = stripped[offset..].trim_end_matches(|c: char| c != '}');
        if let Ok(result) = serde_json::from_str::<RawScoreResult>(candidate) {
            return Ok(result);
        }
    }

    Err(ScoringError::Parse(format!(
        "no valid score object in judge output ({} chars)",
        text.len()
    )))
}
