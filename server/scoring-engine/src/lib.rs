//! Psychometric Scoring Engine — deterministic, norm-referenced (MVP).
//!
//! Converts raw Likert responses into standardized T-scores, rolls them up
//! through the scale -> competency -> total hierarchy against a versioned
//! norm snapshot, and runs response-reliability and clinical-risk checks over
//! the same answers.
//!
//! No AI, no DB, no network; pure computation over reference data loaded
//! once per test.

pub mod aggregate;
pub mod clinical;
pub mod config;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod norms;
pub mod reliability;
pub mod types;

pub use config::Config;
pub use engine::{Engine, TestPlan};
pub use error::EngineError;
pub use norms::{NormScope, NormSnapshot};
pub use types::{InboundAttempt, InboundBundle, ScoreReport};
