use super::normalize::NormalizedVector;

/// Euclidean distance between two equally sized vectors
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Symmetric pairwise distances; the diagonal holds no edge
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    size: usize,
    cells: Vec<Option<f64>>,
}

impl DistanceMatrix {
    /// Compute every pairwise distance, filling the upper triangle and mirroring it
    pub fn build(vectors: &[NormalizedVector]) -> Self {
        let size = vectors.len();
        let mut cells = vec![None; size * size];

        for i in 0..size {
            for j in (i + 1)..size {
                let distance = euclidean(&vectors[i], &vectors[j]);
                cells[i * size + j] = Some(distance);
                cells[j * size + i] = Some(distance);
            }
        }

        Self { size, cells }
    }

    /// Number of points
    pub fn size(&self) -> usize {
        self.size
    }

    /// Distance from `from` to `to`, or `None` for a self-edge
    pub fn get(&self, from: usize, to: usize) -> Option<f64> {
        self.cells[from * self.size + to]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scenario_vectors() -> Vec<NormalizedVector> {
        vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![0.1, 0.1]]
    }

    #[test]
    fn test_scenario_distances() {
        let matrix = DistanceMatrix::build(&scenario_vectors());

        assert_eq!(matrix.size(), 3);
        assert_relative_eq!(matrix.get(0, 1).unwrap(), 2.0_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(matrix.get(0, 2).unwrap(), 0.02_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(matrix.get(1, 2).unwrap(), 1.62_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_diagonal_has_no_edge() {
        let matrix = DistanceMatrix::build(&scenario_vectors());
        for i in 0..matrix.size() {
            assert_eq!(matrix.get(i, i), None);
        }
    }

    #[test]
    fn test_matrix_is_symmetric_and_non_negative() {
        let vectors = vec![
            vec![0.3, 0.9, 0.0],
            vec![0.7, 0.1, 1.0],
            vec![0.0, 0.0, 0.5],
            vec![1.0, 0.4, 0.25],
            vec![0.3, 0.9, 0.0],
        ];
        let matrix = DistanceMatrix::build(&vectors);

        for i in 0..vectors.len() {
            for j in 0..vectors.len() {
                if i == j {
                    continue;
                }
                let forward = matrix.get(i, j).unwrap();
                assert_eq!(Some(forward), matrix.get(j, i));
                assert!(forward >= 0.0);
            }
        }
        // identical vectors are a valid zero-length edge, not a missing one
        assert_eq!(matrix.get(0, 4), Some(0.0));
    }

    #[test]
    fn test_empty_and_single_inputs() {
        assert_eq!(DistanceMatrix::build(&[]).size(), 0);

        let single = DistanceMatrix::build(&[vec![0.5, 0.5]]);
        assert_eq!(single.size(), 1);
        assert_eq!(single.get(0, 0), None);
    }
}
