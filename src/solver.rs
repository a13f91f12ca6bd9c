//! Tour ordering: depot-anchored open paths over a distance matrix.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::metric::Metric;
use crate::model::{Coordinate, DeliveryPoint};
use crate::traits::{DistanceMatrixProvider, RouteStrategy, TourSolver};
use crate::zones::Zone;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TourOptions {
    /// Maximum improvement passes for 2-opt.
    pub two_opt_iterations: usize,
    pub metric: Metric,
}

impl Default for TourOptions {
    fn default() -> Self {
        Self {
            two_opt_iterations: 100,
            metric: Metric::Euclidean,
        }
    }
}

/// Cheapest-arc construction followed by 2-opt on the open path.
#[derive(Debug, Clone, Default)]
pub struct GreedyTourSolver {
    pub two_opt_iterations: usize,
}

impl GreedyTourSolver {
    pub fn new(two_opt_iterations: usize) -> Self {
        Self { two_opt_iterations }
    }
}

impl TourSolver for GreedyTourSolver {
    fn solve(&self, matrix: &[Vec<i32>], start: usize) -> Vec<usize> {
        if start >= matrix.len() {
            return Vec::new();
        }
        let mut path = cheapest_arc(matrix, start);
        for _ in 0..self.two_opt_iterations {
            if !two_opt_improve(&mut path, matrix) {
                break;
            }
        }
        path
    }
}

/// Repeatedly extends the path to the nearest unvisited node.
fn cheapest_arc(matrix: &[Vec<i32>], start: usize) -> Vec<usize> {
    let n = matrix.len();
    let mut visited = vec![false; n];
    let mut path = Vec::with_capacity(n);
    visited[start] = true;
    path.push(start);

    let mut current = start;
    while path.len() < n {
        let next = (0..n)
            .filter(|&node| !visited[node])
            .min_by_key(|&node| matrix[current][node])
            .unwrap_or(current);
        visited[next] = true;
        path.push(next);
        current = next;
    }
    path
}

fn path_cost(path: &[usize], matrix: &[Vec<i32>]) -> i64 {
    path.windows(2)
        .map(|pair| i64::from(matrix[pair[0]][pair[1]]))
        .sum()
}

/// 2-opt: reverse a segment after the fixed start if that shortens the path.
/// Returns true if an improvement was made.
fn two_opt_improve(path: &mut [usize], matrix: &[Vec<i32>]) -> bool {
    let n = path.len();
    if n < 3 {
        return false;
    }

    let current_cost = path_cost(path, matrix);
    for i in 0..n - 1 {
        for j in i + 2..n {
            path[i + 1..=j].reverse();
            if path_cost(path, matrix) < current_cost {
                return true;
            }
            path[i + 1..=j].reverse();
        }
    }

    false
}

/// Route strategy that prepends the depot, solves an open tour from it and
/// drops it again from the result.
pub struct TourOrdering<S: TourSolver> {
    solver: S,
    matrix_provider: Box<dyn DistanceMatrixProvider>,
    depot: Coordinate,
}

impl<S: TourSolver> TourOrdering<S> {
    pub fn new(solver: S, matrix_provider: Box<dyn DistanceMatrixProvider>, depot: Coordinate) -> Self {
        Self {
            solver,
            matrix_provider,
            depot,
        }
    }
}

impl TourOrdering<GreedyTourSolver> {
    pub fn greedy(options: &TourOptions, depot: Coordinate) -> Self {
        Self::new(
            GreedyTourSolver::new(options.two_opt_iterations),
            options.metric.provider(),
            depot,
        )
    }
}

impl<S: TourSolver> RouteStrategy for TourOrdering<S> {
    fn name(&self) -> &'static str {
        "tour"
    }

    fn order(&self, zone: Option<&Zone>, points: Vec<DeliveryPoint>) -> Vec<DeliveryPoint> {
        if points.is_empty() {
            return points;
        }

        let locations: Vec<Coordinate> = std::iter::once(self.depot)
            .chain(points.iter().map(|point| point.coordinate))
            .collect();
        let matrix = self.matrix_provider.matrix_for(&locations);
        let visiting = if matrix.len() == locations.len() && matrix.iter().all(|row| row.len() == locations.len()) {
            self.solver.solve(&matrix, 0)
        } else {
            warn!(
                expected = locations.len(),
                got = matrix.len(),
                "distance matrix has the wrong size, keeping input order"
            );
            Vec::new()
        };

        let order = repair_order(&visiting, points.len());
        debug!(
            zone = zone.map(|zone| zone.name.as_str()),
            stops = order.len(),
            "tour solved"
        );

        let mut slots: Vec<Option<DeliveryPoint>> = points.into_iter().map(Some).collect();
        order.into_iter().filter_map(|index| slots[index].take()).collect()
    }
}

/// Maps solver node indices (depot = 0) back to point indices.
///
/// Duplicates and unknown indices are skipped; points the solver left out
/// are appended in input order so nothing is lost.
fn repair_order(visiting: &[usize], count: usize) -> Vec<usize> {
    let mut seen = vec![false; count];
    let mut order = Vec::with_capacity(count);
    let mut rejected = 0usize;

    for &node in visiting {
        if node == 0 {
            continue;
        }
        match node.checked_sub(1).filter(|&index| index < count) {
            Some(index) if !seen[index] => {
                seen[index] = true;
                order.push(index);
            }
            _ => rejected += 1,
        }
    }

    let missing: Vec<usize> = (0..count).filter(|&index| !seen[index]).collect();
    if rejected > 0 || !missing.is_empty() {
        warn!(rejected, missing = missing.len(), "tour solver returned an invalid visiting order");
    }
    order.extend(missing);
    order
}
