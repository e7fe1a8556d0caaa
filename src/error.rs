//! Error types for prompt-golf operations.
//!
//! Defines the error taxonomy for the major subsystems:
//! - Challenge document parsing and validation
//! - Registry lookups and lifecycle
//! - LLM judge invocation
//! - Scoring requests
//! - Attempt persistence

use std::fmt;

use thiserror::Error;

/// A single field-level constraint violation found while validating a
/// challenge document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Dotted path to the violating field (e.g. `scoring.dimensions[2].weight`).
    pub path: String,
    /// What constraint was violated.
    pub message: String,
}

impl SchemaViolation {
    /// Creates a new violation for the given field path.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// The full set of violations reported by a validation pass.
///
/// Validation is total: every field is checked and every violation is
/// collected before the error is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolations(pub Vec<SchemaViolation>);

impl fmt::Display for SchemaViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for violation in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}", violation)?;
            first = false;
        }
        Ok(())
    }
}

/// Errors that can occur while parsing and validating challenge documents.
#[derive(Debug, Error)]
pub enum ChallengeError {
    /// The document is not syntactically valid YAML.
    #[error("Failed to parse challenge document '{path}': {message}")]
    Parse { path: String, message: String },

    /// The document is well-formed but violates the type/shape contract.
    #[error("Challenge schema validation failed: {0}")]
    Schema(SchemaViolations),

    /// Business rule: dimension weights must sum to exactly 100.
    #[error("Scoring dimension weights must sum to 100, got {sum}")]
    ScoringWeight { sum: u32 },

    /// Business rule: maxScore must equal the sum of dimension maxPoints.
    #[error(
        "scoring.maxScore ({max_score}) must equal the sum of dimension maxPoints ({points_sum})"
    )]
    MaxScoreMismatch { max_score: u32, points_sum: u32 },

    #[error("Duplicate challenge id '{0}' found during loading")]
    DuplicateId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Challenge '{0}' not found in registry")]
    ChallengeNotFound(String),

    #[error("Failed to load challenges: {0}")]
    Load(#[from] ChallengeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while invoking the LLM judge.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API base URL: JUDGE_API_BASE environment variable not set")]
    MissingApiBase,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("Empty response from judge model")]
    EmptyResponse,

    #[error("Failed to read judge response: {0}")]
    ResponseRead(String),
}

/// Errors surfaced as the terminal outcome of a scoring request.
///
/// None of these are retried inside the core; retry is a caller decision.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// Caller-supplied request violates basic constraints.
    #[error("Invalid scoring request: {0}")]
    InvalidRequest(String),

    #[error("Challenge '{0}' not found")]
    ChallengeNotFound(String),

    /// The judge invocation itself failed (network, API error, timeout).
    #[error("Judge invocation failed: {0}")]
    Judge(#[from] LlmError),

    /// Judge output was not valid structured data even after fence-stripping.
    #[error("Failed to parse judge response: {0}")]
    Parse(String),
}

/// Errors from an attempt store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Attempt store backend error: {0}")]
    Backend(String),
}
