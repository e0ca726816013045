//! Core domain types, validation and scoring for algojobs.
//!
//! This crate has no runtime or model dependencies:
//!
//! - [`Resume`] and [`JobTemplate`] - structured inputs and their text form
//! - [`RankRequest`], [`EmbedRequest`], [`MultiJobRankRequest`] - request
//!   contracts with [`ValidationError`] checks
//! - [`scoring`] - cosine similarity, ordering and per-candidate aggregation
//!
//! # Example
//!
//! ```rust
//! use algojobs_core::{Resume, Skill};
//!
//! let resume = Resume {
//!     candidate_id: "c-1".to_string(),
//!     name: "Ada".to_string(),
//!     summary: Some("Systems engineer".to_string()),
//!     skills: vec![Skill { name: "Rust".to_string(), level: None }],
//!     ..Default::default()
//! };
//!
//! assert_eq!(resume.to_text(), "Summary: Systems engineer\nSkills: Rust");
//! ```

mod request;
mod resume;
pub mod scoring;
pub mod text;

pub use request::{
    CandidateRecommendations, EmbedRequest, EmbedResponse, MultiJobRankRequest,
    MultiJobRankResponse, RankRequest, RankResponse, RankedResume, RecommendedJob,
    DEFAULT_TOP_K_PER_JOB, MIN_JOB_DESCRIPTION_CHARS,
};
pub use resume::{Education, Experience, JobTemplate, Project, Resume, Skill};

use thiserror::Error;

/// Request payloads that are well-formed JSON but semantically unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("job_description is empty")]
    EmptyJobDescription,

    #[error("job_description must be at least {min} characters")]
    JobDescriptionTooShort { min: usize },

    #[error("No resumes provided")]
    NoResumes,

    #[error("No texts provided")]
    NoTexts,

    #[error("texts[{index}] is empty")]
    BlankText { index: usize },

    #[error("No jobs provided")]
    NoJobs,

    #[error("{field} must be at least 1")]
    InvalidTopK { field: &'static str },

    #[error("Too many items. Max allowed is {max}, got {got}")]
    TooMany { max: usize, got: usize },
}

impl ValidationError {
    /// True when the payload was rejected for size rather than content.
    pub fn is_too_large(&self) -> bool {
        matches!(self, ValidationError::TooMany { .. })
    }
}
