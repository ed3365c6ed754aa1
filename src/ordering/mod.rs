//! Similarity-based track ordering.
//!
//! Raw feature records are min-max normalized, turned into a pairwise
//! Euclidean distance matrix, and walked with a nearest-neighbor heuristic
//! from every starting track. The shortest open path wins.

pub mod distance;
pub mod error;
pub mod features;
pub mod normalize;
pub mod optimizer;
pub mod tour;

pub use distance::DistanceMatrix;
pub use error::OrderingError;
pub use features::{Feature, FeatureRecord, FeatureSchema};
pub use normalize::FeatureNormalizer;
pub use optimizer::{EvaluationMode, TourOptimizer};
pub use tour::Tour;

use log::debug;

/// Computes a visiting order for a set of tracks
#[derive(Debug, Clone, Default)]
pub struct TrackOrderer {
    schema: FeatureSchema,
    mode: EvaluationMode,
}

impl TrackOrderer {
    pub fn new(schema: FeatureSchema, mode: EvaluationMode) -> Self {
        Self { schema, mode }
    }

    /// Order `records` so that adjacent tracks are as similar as possible.
    ///
    /// The returned tour holds a permutation of `0..records.len()`.
    pub fn order(&self, records: &[FeatureRecord]) -> Result<Tour, OrderingError> {
        let vectors = FeatureNormalizer::normalize_all(records, &self.schema)?;
        let matrix = DistanceMatrix::build(&vectors);
        debug!(
            "Built {}x{} distance matrix over {} features",
            matrix.size(),
            matrix.size(),
            self.schema.len()
        );

        TourOptimizer::shortest_tour(&matrix, self.mode).ok_or(OrderingError::EmptyInput)
    }
}
