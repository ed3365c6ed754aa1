use super::distance::DistanceMatrix;
use super::tour::{Tour, TourConstructor};
use log::debug;
use rayon::prelude::*;

/// How the per-start candidate tours are evaluated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EvaluationMode {
    #[default]
    Sequential,
    /// Evaluate starting points on the rayon pool; the reduction still runs in start order
    Parallel,
}

/// Multi-start nearest-neighbor search for the shortest open path
pub struct TourOptimizer;

impl TourOptimizer {
    /// Run the nearest-neighbor constructor from every start and keep the shortest tour.
    ///
    /// Returns `None` only for an empty matrix. Equal lengths keep the earliest start.
    pub fn shortest_tour(matrix: &DistanceMatrix, mode: EvaluationMode) -> Option<Tour> {
        let starts = 0..matrix.size();
        let candidates: Vec<Tour> = match mode {
            EvaluationMode::Sequential => starts
                .map(|start| TourConstructor::nearest_neighbor(matrix, start))
                .collect(),
            EvaluationMode::Parallel => starts
                .into_par_iter()
                .map(|start| TourConstructor::nearest_neighbor(matrix, start))
                .collect(),
        };

        Self::select_shortest(candidates)
    }

    /// Pick the first tour whose length is strictly below every earlier one
    pub fn select_shortest(candidates: impl IntoIterator<Item = Tour>) -> Option<Tour> {
        let mut best: Option<Tour> = None;
        let mut best_length = f64::INFINITY;

        for tour in candidates {
            if tour.length < best_length {
                best_length = tour.length;
                best = Some(tour);
            }
        }

        if let Some(tour) = &best {
            debug!(
                "Shortest tour starts at track {} with length {:.4}",
                tour.order[0], tour.length
            );
        }
        best
    }
}
