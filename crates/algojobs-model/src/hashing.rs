//! Feature-hashing embedder.

use std::collections::{BTreeMap, HashMap, HashSet};

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::tokenize::{hash_feature, tokenize};
use crate::{Device, Embedder, ModelError, ModelInfo};

const MAX_NGRAM: usize = 3;

const DEFAULT_STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "have", "in", "is",
    "it", "its", "of", "on", "or", "our", "that", "the", "their", "this", "to", "was", "we",
    "were", "will", "with", "you", "your",
];

fn default_ngram_max() -> usize {
    2
}

/// Model artifact: everything needed to rebuild an embedder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    pub dimension: usize,
    /// Longest word n-gram hashed as a feature (1..=3).
    #[serde(default = "default_ngram_max")]
    pub ngram_max: usize,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub stopwords: Vec<String>,
    /// Per-feature weight; features not listed weigh 1.0.
    #[serde(default)]
    pub token_weights: HashMap<String, f32>,
}

impl ModelSpec {
    /// The built-in model with the given output dimension.
    pub fn builtin(dimension: usize) -> Self {
        Self {
            name: format!("hashing-{dimension}"),
            dimension,
            ngram_max: default_ngram_max(),
            seed: 0,
            stopwords: DEFAULT_STOPWORDS.iter().map(|w| w.to_string()).collect(),
            token_weights: HashMap::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.name.trim().is_empty() {
            return Err(ModelError::Invalid("name is empty".into()));
        }
        if self.dimension == 0 {
            return Err(ModelError::Invalid("dimension must be positive".into()));
        }
        if !(1..=MAX_NGRAM).contains(&self.ngram_max) {
            return Err(ModelError::Invalid(format!(
                "ngram_max must be between 1 and {MAX_NGRAM}, got {}",
                self.ngram_max
            )));
        }
        if let Some((feature, weight)) = self
            .token_weights
            .iter()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(ModelError::Invalid(format!(
                "weight for {feature:?} must be a non-negative number, got {weight}"
            )));
        }
        Ok(())
    }
}

/// Hashes word n-grams into signed buckets, weights them by
/// `1 + ln(term frequency)` and L2-normalises each row.
///
/// Output depends only on the [`ModelSpec`] and the input text.
pub struct HashingEmbedder {
    spec: ModelSpec,
    stopwords: HashSet<String>,
    info: ModelInfo,
}

impl HashingEmbedder {
    pub fn new(spec: ModelSpec, device: Device, compute_threads: usize) -> Result<Self, ModelError> {
        spec.validate()?;
        let stopwords = spec.stopwords.iter().map(|w| w.to_lowercase()).collect();
        let info = ModelInfo {
            name: spec.name.clone(),
            dimension: spec.dimension,
            device,
            compute_threads: compute_threads.max(1),
        };
        Ok(Self {
            spec,
            stopwords,
            info,
        })
    }

    fn embed_one(&self, text: &str, out: &mut [f32]) {
        let tokens = tokenize(text, &self.stopwords);

        // Ordered so bucket sums accumulate identically on every run.
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        for n in 1..=self.spec.ngram_max {
            for window in tokens.windows(n) {
                *counts.entry(window.join(" ")).or_default() += 1;
            }
        }

        let dim = self.spec.dimension as u64;
        for (feature, tf) in &counts {
            let hash = hash_feature(feature, self.spec.seed);
            let bucket = (hash % dim) as usize;
            let sign = if hash >> 63 == 1 { -1.0 } else { 1.0 };
            let weight = self.spec.token_weights.get(feature).copied().unwrap_or(1.0);
            out[bucket] += sign * weight * (1.0 + (*tf as f32).ln());
        }

        let norm = out.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            out.iter_mut().for_each(|v| *v /= norm);
        }
    }

    fn embed_chunk(&self, texts: &[String]) -> Vec<f32> {
        let dim = self.spec.dimension;
        let mut flat = vec![0.0f32; texts.len() * dim];
        for (text, row) in texts.iter().zip(flat.chunks_mut(dim)) {
            self.embed_one(text, row);
        }
        flat
    }
}

impl Embedder for HashingEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn embed(&self, texts: &[String]) -> Result<Array2<f32>, ModelError> {
        let dim = self.spec.dimension;
        let threads = self.info.compute_threads.min(texts.len());

        let flat = if threads <= 1 {
            self.embed_chunk(texts)
        } else {
            let chunk_len = texts.len().div_ceil(threads);
            std::thread::scope(|scope| {
                let handles: Vec<_> = texts
                    .chunks(chunk_len)
                    .map(|chunk| scope.spawn(move || self.embed_chunk(chunk)))
                    .collect();

                let mut flat = Vec::with_capacity(texts.len() * dim);
                for handle in handles {
                    let part = handle
                        .join()
                        .map_err(|_| ModelError::Inference("embedding thread panicked".into()))?;
                    flat.extend(part);
                }
                Ok::<_, ModelError>(flat)
            })?
        };

        Ok(Array2::from_shape_vec((texts.len(), dim), flat)?)
    }
}
