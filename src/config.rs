// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Process-wide similarity configuration consulted by the signature index's
//! `consistent` callback and the any-value set's similarity query
//! (`SPEC_FULL.md` §6).

/// Similarity metric used to compare two signature/array keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityMetric {
    /// `|a ∩ b| / sqrt(|a| * |b|)`
    Cosine,
    /// `|a ∩ b|` (raw intersection count)
    Overlap,
    /// `|a ∩ b| / (|a| + |b| - |a ∩ b|)`
    Jaccard,
}

impl Default for SimilarityMetric {
    fn default() -> Self {
        Self::Cosine
    }
}

#[derive(Clone, Debug)]
/// Similarity metric + threshold consulted by [`crate::index::signature`]'s
/// `consistent` callback.
pub struct SimilarityConfig {
    metric: SimilarityMetric,
    threshold: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            metric: SimilarityMetric::default(),
            threshold: 0.6,
        }
    }
}

impl SimilarityConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_metric(mut self, metric: SimilarityMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Sets the similarity threshold. Clamped to `[0.0, 1.0]`.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}
