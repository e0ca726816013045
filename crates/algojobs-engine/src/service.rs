use algojobs_config::RankingSettings;
use algojobs_core::scoring::{aggregate_recommendations, cosine_scores, rank_resumes, JobRanking};
use algojobs_core::{
    EmbedRequest, EmbedResponse, MultiJobRankRequest, MultiJobRankResponse, RankRequest,
    RankResponse,
};
use algojobs_model::ModelInfo;
use ndarray::{s, Axis};
use tracing::{debug, info, warn};

use crate::{EngineError, InferenceHandle};

/// Validates requests, runs them through the inference worker and scores the
/// output. Each request becomes exactly one worker job.
#[derive(Clone)]
pub struct RankingService {
    handle: InferenceHandle,
    settings: RankingSettings,
}

impl RankingService {
    pub fn new(handle: InferenceHandle, settings: RankingSettings) -> Self {
        Self { handle, settings }
    }

    pub fn model(&self) -> &ModelInfo {
        self.handle.info()
    }

    /// Most resumes (or texts) accepted in one request.
    pub fn max_items(&self) -> usize {
        self.settings.max_resumes
    }

    pub fn queued(&self) -> usize {
        self.handle.queued()
    }

    pub async fn rank(&self, request: RankRequest) -> Result<RankResponse, EngineError> {
        request.validate(self.settings.max_resumes)?;

        let inputs = request.model_inputs();
        let embeddings = self.handle.submit(inputs, self.settings.embed_batch_size).await?;
        let scores = cosine_scores(embeddings.row(0), embeddings.slice(s![1.., ..]));

        let response = rank_resumes(request.resumes, &scores, request.top_k);
        debug!(
            total = response.total_resumes,
            returned = response.returned,
            "Ranked resumes"
        );
        Ok(response)
    }

    pub async fn embed(&self, request: EmbedRequest) -> Result<EmbedResponse, EngineError> {
        request.validate(self.settings.max_resumes)?;

        let embeddings = self
            .handle
            .submit(request.texts, self.settings.embed_batch_size)
            .await?;

        Ok(EmbedResponse {
            model: self.model().name.clone(),
            dimension: embeddings.ncols(),
            embeddings: embeddings.rows().into_iter().map(|r| r.to_vec()).collect(),
        })
    }

    /// Ranks every resume against every job and groups the top hits per
    /// candidate. Jobs without an id or with blank text are skipped.
    pub async fn rank_jobs(
        &self,
        request: MultiJobRankRequest,
    ) -> Result<MultiJobRankResponse, EngineError> {
        request.validate(self.settings.max_resumes)?;
        let top_k_per_job = request.top_k_per_job();

        let mut job_ids = Vec::with_capacity(request.jobs.len());
        let mut inputs = Vec::with_capacity(request.jobs.len() + request.resumes.len());
        for job in &request.jobs {
            let job_id = job.id.trim();
            if job_id.is_empty() {
                warn!("Job template missing id; skipping");
                continue;
            }
            let text = job.to_text();
            if text.trim().is_empty() {
                debug!(job_id, "Skipping job with no text");
                continue;
            }
            job_ids.push(job_id.to_string());
            inputs.push(text);
        }
        let skipped_jobs = request.jobs.len() - job_ids.len();

        if job_ids.is_empty() {
            return Ok(MultiJobRankResponse {
                processed_jobs: 0,
                skipped_jobs,
                candidates: Vec::new(),
            });
        }

        let processed_jobs = job_ids.len();
        inputs.extend(request.resumes.iter().map(|r| r.to_text()));
        let embeddings = self.handle.submit(inputs, self.settings.embed_batch_size).await?;
        let (job_rows, resume_rows) = embeddings.view().split_at(Axis(0), processed_jobs);

        let rankings: Vec<JobRanking> = job_ids
            .into_iter()
            .zip(job_rows.rows())
            .map(|(job_id, job_row)| JobRanking {
                job_id,
                scores: cosine_scores(job_row, resume_rows),
            })
            .collect();

        let candidates = aggregate_recommendations(&request.resumes, &rankings, top_k_per_job);
        info!(
            jobs = processed_jobs,
            skipped = skipped_jobs,
            candidates = candidates.len(),
            "Multi-job ranking complete"
        );

        Ok(MultiJobRankResponse {
            processed_jobs,
            skipped_jobs,
            candidates,
        })
    }
}
