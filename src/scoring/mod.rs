//! Scoring pipeline: judge prompt compilation, response parsing, and the
//! scoring service.

pub mod judge_prompt;
pub mod response;
pub mod service;

pub use judge_prompt::compile_judge_prompt;
pub use response::{parse_score_payload, strip_code_fences, OverallFeedback, RawScoreResult};
pub use service::{
    compute_time_bonus, DimensionResult, ScoreRequest, ScoreResult, ScoringService,
    MAX_PROMPT_CHARS,
};
