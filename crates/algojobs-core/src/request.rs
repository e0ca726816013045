//! Request and response contracts for the inference routes.

use serde::{Deserialize, Serialize};

use crate::resume::{JobTemplate, Resume};
use crate::text::strip_markdown;
use crate::ValidationError;

pub const MIN_JOB_DESCRIPTION_CHARS: usize = 3;
pub const DEFAULT_TOP_K_PER_JOB: usize = 10;

// === Single-job ranking ===

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankRequest {
    pub job_description: String,
    pub resumes: Vec<Resume>,
    #[serde(default)]
    pub top_k: Option<usize>,
}

impl RankRequest {
    pub fn validate(&self, max_resumes: usize) -> Result<(), ValidationError> {
        // Length counts the raw string, surrounding whitespace included.
        if self.job_description.chars().count() < MIN_JOB_DESCRIPTION_CHARS {
            return Err(ValidationError::JobDescriptionTooShort {
                min: MIN_JOB_DESCRIPTION_CHARS,
            });
        }
        if self.job_description.trim().is_empty() {
            return Err(ValidationError::EmptyJobDescription);
        }
        if self.resumes.is_empty() {
            return Err(ValidationError::NoResumes);
        }
        if self.resumes.len() > max_resumes {
            return Err(ValidationError::TooMany {
                max: max_resumes,
                got: self.resumes.len(),
            });
        }
        if self.top_k == Some(0) {
            return Err(ValidationError::InvalidTopK { field: "top_k" });
        }
        Ok(())
    }

    /// Model input: the job description first, then one text per resume.
    pub fn model_inputs(&self) -> Vec<String> {
        std::iter::once(strip_markdown(&self.job_description).trim().to_string())
            .chain(self.resumes.iter().map(Resume::to_text))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedResume {
    pub candidate_id: String,
    pub name: String,
    pub score: f32,
    pub resume: Resume,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankResponse {
    pub total_resumes: usize,
    pub returned: usize,
    pub results: Vec<RankedResume>,
}

// === Embeddings ===

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedRequest {
    pub texts: Vec<String>,
}

impl EmbedRequest {
    pub fn validate(&self, max_texts: usize) -> Result<(), ValidationError> {
        if self.texts.is_empty() {
            return Err(ValidationError::NoTexts);
        }
        if self.texts.len() > max_texts {
            return Err(ValidationError::TooMany {
                max: max_texts,
                got: self.texts.len(),
            });
        }
        if let Some(index) = self.texts.iter().position(|t| t.trim().is_empty()) {
            return Err(ValidationError::BlankText { index });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub model: String,
    pub dimension: usize,
    pub embeddings: Vec<Vec<f32>>,
}

// === Multi-job ranking ===

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiJobRankRequest {
    pub jobs: Vec<JobTemplate>,
    pub resumes: Vec<Resume>,
    #[serde(default)]
    pub top_k_per_job: Option<usize>,
}

impl MultiJobRankRequest {
    pub fn validate(&self, max_resumes: usize) -> Result<(), ValidationError> {
        if self.jobs.is_empty() {
            return Err(ValidationError::NoJobs);
        }
        if self.resumes.is_empty() {
            return Err(ValidationError::NoResumes);
        }
        if self.resumes.len() > max_resumes {
            return Err(ValidationError::TooMany {
                max: max_resumes,
                got: self.resumes.len(),
            });
        }
        if self.top_k_per_job == Some(0) {
            return Err(ValidationError::InvalidTopK {
                field: "top_k_per_job",
            });
        }
        Ok(())
    }

    pub fn top_k_per_job(&self) -> usize {
        self.top_k_per_job.unwrap_or(DEFAULT_TOP_K_PER_JOB)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedJob {
    pub job_id: String,
    pub score: f32,
    /// 1-based position of the candidate within this job's ranking.
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecommendations {
    pub candidate_id: String,
    pub name: String,
    pub recommended_jobs: Vec<RecommendedJob>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiJobRankResponse {
    pub processed_jobs: usize,
    pub skipped_jobs: usize,
    pub candidates: Vec<CandidateRecommendations>,
}
