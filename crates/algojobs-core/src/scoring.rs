//! Similarity scoring and ranking over embedding rows.

use std::collections::HashMap;

use ndarray::{ArrayView1, ArrayView2};

use crate::request::{CandidateRecommendations, RankResponse, RankedResume, RecommendedJob};
use crate::resume::Resume;

/// Cosine similarity of `query` against every row of `candidates`.
///
/// A zero vector on either side scores `0.0` instead of NaN.
pub fn cosine_scores(query: ArrayView1<f32>, candidates: ArrayView2<f32>) -> Vec<f32> {
    let query_norm = query.dot(&query).sqrt();
    candidates
        .rows()
        .into_iter()
        .map(|row| {
            let denom = query_norm * row.dot(&row).sqrt();
            if denom > 0.0 {
                query.dot(&row) / denom
            } else {
                0.0
            }
        })
        .collect()
}

/// Indices sorted by descending score. Stable, so equal scores keep input
/// order; NaN sorts last.
pub fn order_by_score(scores: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        let (sa, sb) = (scores[a], scores[b]);
        match (sa.is_nan(), sb.is_nan()) {
            (true, true) => std::cmp::Ordering::Equal,
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            (false, false) => sb.total_cmp(&sa),
        }
    });
    order
}

/// Pairs each resume with its score and returns the best `top_k` (all when
/// `None`).
pub fn rank_resumes(resumes: Vec<Resume>, scores: &[f32], top_k: Option<usize>) -> RankResponse {
    debug_assert_eq!(resumes.len(), scores.len());
    let total_resumes = resumes.len();
    let keep = top_k.unwrap_or(total_resumes).min(total_resumes);

    let mut slots: Vec<Option<Resume>> = resumes.into_iter().map(Some).collect();
    let results: Vec<RankedResume> = order_by_score(scores)
        .into_iter()
        .take(keep)
        .filter_map(|i| {
            let resume = slots[i].take()?;
            Some(RankedResume {
                candidate_id: resume.candidate_id.clone(),
                name: resume.name.clone(),
                score: scores[i],
                resume,
            })
        })
        .collect();

    RankResponse {
        total_resumes,
        returned: results.len(),
        results,
    }
}

/// Scores of every resume against one job.
#[derive(Debug, Clone)]
pub struct JobRanking {
    pub job_id: String,
    pub scores: Vec<f32>,
}

/// Collects, per candidate, every job where the candidate landed in that
/// job's top `top_k_per_job`.
///
/// Candidates appear in order of first recommendation; each candidate's jobs
/// are sorted by rank, then by score descending. Resumes without a
/// candidate id are left out.
pub fn aggregate_recommendations(
    resumes: &[Resume],
    rankings: &[JobRanking],
    top_k_per_job: usize,
) -> Vec<CandidateRecommendations> {
    let mut candidates: Vec<CandidateRecommendations> = Vec::new();
    let mut index_by_id: HashMap<&str, usize> = HashMap::new();

    for ranking in rankings {
        let order = order_by_score(&ranking.scores);
        for (position, resume_idx) in order.into_iter().take(top_k_per_job).enumerate() {
            let resume = &resumes[resume_idx];
            let candidate_id = resume.candidate_id.trim();
            if candidate_id.is_empty() {
                continue;
            }

            let slot = *index_by_id.entry(candidate_id).or_insert_with(|| {
                candidates.push(CandidateRecommendations {
                    candidate_id: candidate_id.to_string(),
                    name: resume.name.clone(),
                    recommended_jobs: Vec::new(),
                });
                candidates.len() - 1
            });

            candidates[slot].recommended_jobs.push(RecommendedJob {
                job_id: ranking.job_id.clone(),
                score: ranking.scores[resume_idx],
                rank: position + 1,
            });
        }
    }

    for candidate in &mut candidates {
        candidate
            .recommended_jobs
            .sort_by(|a, b| a.rank.cmp(&b.rank).then(b.score.total_cmp(&a.score)));
    }

    candidates
}
