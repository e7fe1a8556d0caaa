//! prompt-golf: a prompt-engineering training core.
//!
//! This library provides the server-side machinery of a gamified
//! prompt-engineering trainer: declarative challenge configs loaded from
//! YAML, a process-wide registry, an LLM-judge scoring pipeline, attempt
//! history, and a declarative achievement system.

// Core modules
pub mod achievements;
pub mod challenge;
pub mod cli;
pub mod error;
pub mod llm;
pub mod progress;
pub mod registry;
pub mod scoring;

// Re-export commonly used error types
pub use error::{ChallengeError, LlmError, RegistryError, ScoringError, StoreError};
