use super::distance::DistanceMatrix;

/// An open path visiting every point exactly once, with its total length
#[derive(Debug, Clone, PartialEq)]
pub struct Tour {
    pub order: Vec<usize>,
    pub length: f64,
}

/// Greedy nearest-neighbor path construction
pub struct TourConstructor;

impl TourConstructor {
    /// Build a path from `start`, always stepping to the closest unvisited point.
    ///
    /// Candidates are scanned in ascending index order and only a strictly
    /// shorter edge replaces the current best, so ties go to the lowest index.
    pub fn nearest_neighbor(matrix: &DistanceMatrix, start: usize) -> Tour {
        let size = matrix.size();
        let mut visited = vec![false; size];
        let mut order = Vec::with_capacity(size);
        let mut length = 0.0;

        visited[start] = true;
        order.push(start);
        let mut current = start;

        while order.len() < size {
            let mut closest: Option<(usize, f64)> = None;

            for (candidate, _) in visited.iter().enumerate().filter(|(_, seen)| !**seen) {
                let Some(distance) = matrix.get(current, candidate) else {
                    continue;
                };
                if closest.is_none_or(|(_, best)| distance < best) {
                    closest = Some((candidate, distance));
                }
            }

            // Every unvisited point differs from `current`, so an edge always exists
            let Some((next, distance)) = closest else {
                break;
            };

            visited[next] = true;
            order.push(next);
            length += distance;
            current = next;
        }

        Tour { order, length }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn path_length(order: &[usize], matrix: &DistanceMatrix) -> f64 {
        order
            .windows(2)
            .map(|pair| matrix.get(pair[0], pair[1]).unwrap())
            .sum()
    }

    fn scenario_matrix() -> DistanceMatrix {
        DistanceMatrix::build(&[vec![0.0, 0.0], vec![1.0, 1.0], vec![0.1, 0.1]])
    }

    #[test]
    fn test_scenario_tours_per_start() {
        let matrix = scenario_matrix();

        let from_zero = TourConstructor::nearest_neighbor(&matrix, 0);
        assert_eq!(from_zero.order, vec![0, 2, 1]);
        assert_relative_eq!(from_zero.length, 0.02_f64.sqrt() + 1.62_f64.sqrt(), epsilon = 1e-12);

        let from_one = TourConstructor::nearest_neighbor(&matrix, 1);
        assert_eq!(from_one.order, vec![1, 2, 0]);
        assert_relative_eq!(from_one.length, 1.62_f64.sqrt() + 0.02_f64.sqrt(), epsilon = 1e-12);

        let from_two = TourConstructor::nearest_neighbor(&matrix, 2);
        assert_eq!(from_two.order, vec![2, 0, 1]);
        assert_relative_eq!(from_two.length, 0.02_f64.sqrt() + 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_tour_is_a_permutation_for_every_start() {
        let vectors = vec![
            vec![0.9, 0.2, 0.4],
            vec![0.1, 0.8, 0.3],
            vec![0.5, 0.5, 0.5],
            vec![0.0, 0.0, 1.0],
            vec![1.0, 1.0, 0.0],
            vec![0.3, 0.6, 0.9],
        ];
        let matrix = DistanceMatrix::build(&vectors);

        for start in 0..vectors.len() {
            let tour = TourConstructor::nearest_neighbor(&matrix, start);
            assert_eq!(tour.order[0], start);

            let mut sorted = tour.order.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, (0..vectors.len()).collect::<Vec<_>>());

            assert_relative_eq!(
                tour.length,
                path_length(&tour.order, &matrix),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_ties_go_to_lowest_index() {
        // points 1 and 2 are equidistant from point 0
        let matrix = DistanceMatrix::build(&[vec![0.5], vec![0.0], vec![1.0]]);
        let tour = TourConstructor::nearest_neighbor(&matrix, 0);
        assert_eq!(tour.order, vec![0, 1, 2]);
    }

    #[test]
    fn test_single_point_tour() {
        let matrix = DistanceMatrix::build(&[vec![0.3, 0.3]]);
        let tour = TourConstructor::nearest_neighbor(&matrix, 0);
        assert_eq!(tour.order, vec![0]);
        assert_eq!(tour.length, 0.0);
    }

    #[test]
    fn test_two_point_tours_mirror_each_other() {
        let matrix = DistanceMatrix::build(&[vec![0.0, 1.0], vec![1.0, 0.0]]);
        let forward = TourConstructor::nearest_neighbor(&matrix, 0);
        let backward = TourConstructor::nearest_neighbor(&matrix, 1);

        assert_eq!(forward.order, vec![0, 1]);
        assert_eq!(backward.order, vec![1, 0]);
        assert_relative_eq!(forward.length, 2.0_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(forward.length, backward.length);
    }
}
