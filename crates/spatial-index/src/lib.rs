//! KD-tree spatial index over source grid points.
//!
//! Wraps a kiddo KD-tree built from the 3-D Cartesian positions of every
//! source node. Queries return *Euclidean* distances (the square root is
//! applied to kiddo's squared metric) so that inverse-distance weighting and
//! distance thresholds read in chord-length units.

use interp_common::{InterpError, InterpResult};
use kiddo::float::kdtree::KdTree;
use kiddo::SquaredEuclidean;
use rayon::prelude::*;

/// KD-tree leaf bucket size.
const BUCKET_SIZE: usize = 30;

/// A single k-NN result: Euclidean distance and flat source index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryHit {
    pub distance: f64,
    pub index: usize,
}

/// Balanced KD-tree over the source points.
///
/// Read-only after construction; queries can be issued from many threads
/// concurrently.
pub struct SpatialIndex {
    tree: KdTree<f64, usize, 3, BUCKET_SIZE, u32>,
    points: Vec<[f64; 3]>,
}

impl SpatialIndex {
    /// Build the index. Fails on degenerate inputs (fewer than two nodes).
    pub fn build(points: &[[f64; 3]]) -> InterpResult<Self> {
        if points.len() < 2 {
            return Err(InterpError::DegenerateGrid(points.len()));
        }
        let mut tree: KdTree<f64, usize, 3, BUCKET_SIZE, u32> = KdTree::new();
        for (index, point) in points.iter().enumerate() {
            tree.add(point, index);
        }
        Ok(Self {
            tree,
            points: points.to_vec(),
        })
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// k nearest neighbors of one point, ascending by distance.
    pub fn query_one(&self, point: &[f64; 3], k: usize) -> Vec<QueryHit> {
        self.tree
            .nearest_n::<SquaredEuclidean>(point, k)
            .into_iter()
            .map(|hit| QueryHit {
                distance: hit.distance.sqrt(),
                index: hit.item,
            })
            .collect()
    }

    /// k nearest neighbors for a batch of points.
    ///
    /// With `parallel` the batch is partitioned across worker threads;
    /// results come back in input order either way.
    pub fn query(&self, points: &[[f64; 3]], k: usize, parallel: bool) -> Vec<Vec<QueryHit>> {
        if parallel {
            points.par_iter().map(|p| self.query_one(p, k)).collect()
        } else {
            points.iter().map(|p| self.query_one(p, k)).collect()
        }
    }

    /// Largest nearest-neighbor gap in the indexed point set.
    ///
    /// Queries every indexed point for its two nearest neighbors (the first
    /// is the point itself) and returns the maximum distance observed. This
    /// is the base quantity for out-of-domain rejection thresholds.
    pub fn max_nearest_gap(&self, parallel: bool) -> f64 {
        let gap = |p: &[f64; 3]| {
            self.query_one(p, 2)
                .into_iter()
                .map(|hit| hit.distance)
                .fold(0.0, f64::max)
        };
        if parallel {
            self.points.par_iter().map(gap).reduce(|| 0.0, f64::max)
        } else {
            self.points.iter().map(gap).fold(0.0, f64::max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_points() -> Vec<[f64; 3]> {
        [0.0, 1.0, 2.0, 5.0]
            .iter()
            .map(|&x| [x, 0.0, 0.0])
            .collect()
    }

    #[test]
    fn test_degenerate_inputs_rejected() {
        assert!(SpatialIndex::build(&[]).is_err());
        assert!(SpatialIndex::build(&[[0.0, 0.0, 0.0]]).is_err());
        assert!(SpatialIndex::build(&[[0.0; 3], [1.0, 0.0, 0.0]]).is_ok());
    }

    #[test]
    fn test_query_one_orders_by_distance() {
        let index = SpatialIndex::build(&line_points()).unwrap();
        let hits = index.query_one(&[0.9, 0.0, 0.0], 3);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].index, 1);
        assert!((hits[0].distance - 0.1).abs() < 1e-12);
        assert_eq!(hits[1].index, 0);
        assert!((hits[1].distance - 0.9).abs() < 1e-12);
        assert!(hits[1].distance <= hits[2].distance);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let index = SpatialIndex::build(&line_points()).unwrap();
        let queries: Vec<[f64; 3]> = (0..50).map(|i| [i as f64 * 0.13, 0.0, 0.0]).collect();
        let serial = index.query(&queries, 2, false);
        let parallel = index.query(&queries, 2, true);
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_max_nearest_gap() {
        let index = SpatialIndex::build(&line_points()).unwrap();
        // Gaps to nearest neighbors are 1, 1, 1 and 3 (the point at x=5).
        assert!((index.max_nearest_gap(false) - 3.0).abs() < 1e-12);
        assert!((index.max_nearest_gap(true) - 3.0).abs() < 1e-12);
    }
}
