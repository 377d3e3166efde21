//! Great-circle nearest-neighbor oracle for the grib backend.
//!
//! The grib backend does not search for neighbors itself: it consults an
//! oracle keyed by an opaque source-grid handle. Production deployments
//! back this with a GRIB library's nearest-point service; the
//! [`GreatCircleOracle`] here is the reference implementation, answering by
//! haversine distance over a registered grid.

use thiserror::Error;

/// A single neighbor reported by the oracle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OracleNeighbor {
    /// Flat index into the source value array.
    pub index: usize,
    /// Great-circle distance to the query point, meters.
    pub distance: f64,
}

/// Per-cell oracle failure, typically "point outside the grid".
///
/// Never aborts an interpolation: the affected target cell is masked and
/// counted. Oracle answers are authoritative; there are no retries.
#[derive(Debug, Error)]
#[error("oracle lookup failed: {0}")]
pub struct OracleError(pub String);

/// Geodesic nearest-neighbor service keyed by a source-grid handle.
pub trait GeodesicOracle: Send + Sync {
    /// The `npoints` nearest source nodes to (lat, lon), ascending by
    /// great-circle distance. Implementations must return exactly
    /// `npoints` neighbors or fail.
    fn find_nearest(
        &self,
        gid: i64,
        lat: f64,
        lon: f64,
        npoints: usize,
    ) -> Result<Vec<OracleNeighbor>, OracleError>;
}

/// Brute-force haversine oracle over one registered source grid.
///
/// Linear scan per query; fine for tests and moderate grids, but the point
/// of the intertable cache is that even a slow oracle is consulted once.
pub struct GreatCircleOracle {
    lats: Vec<f64>,
    lons: Vec<f64>,
    radius: f64,
}

impl GreatCircleOracle {
    /// Register a source grid (degrees) on a sphere of `radius` meters.
    pub fn new(lats: &[f64], lons: &[f64], radius: f64) -> Self {
        debug_assert_eq!(lats.len(), lons.len());
        Self {
            lats: lats.to_vec(),
            lons: lons.to_vec(),
            radius,
        }
    }
}

impl GeodesicOracle for GreatCircleOracle {
    fn find_nearest(
        &self,
        _gid: i64,
        lat: f64,
        lon: f64,
        npoints: usize,
    ) -> Result<Vec<OracleNeighbor>, OracleError> {
        if npoints == 0 || npoints > self.lats.len() {
            return Err(OracleError(format!(
                "requested {npoints} neighbors from a {}-node grid",
                self.lats.len()
            )));
        }

        // Keep the best `npoints` seen so far, sorted ascending.
        let mut best: Vec<OracleNeighbor> = Vec::with_capacity(npoints + 1);
        for (index, (&nlat, &nlon)) in self.lats.iter().zip(self.lons.iter()).enumerate() {
            let distance = haversine(lat, lon, nlat, nlon, self.radius);
            if best.len() == npoints && distance >= best[npoints - 1].distance {
                continue;
            }
            let at = best
                .iter()
                .position(|n| n.distance > distance)
                .unwrap_or(best.len());
            best.insert(at, OracleNeighbor { index, distance });
            best.truncate(npoints);
        }
        Ok(best)
    }
}

/// Great-circle distance between two points (degrees) on a sphere of
/// `radius` meters, by the haversine formula.
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64, radius: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * radius * a.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EARTH: f64 = 6371000.0;

    #[test]
    fn test_haversine_one_degree_at_equator() {
        let d = haversine(0.0, 0.0, 0.0, 1.0, EARTH);
        let expected = EARTH * 1f64.to_radians();
        assert!((d - expected).abs() < 1e-6, "{d} vs {expected}");
    }

    #[test]
    fn test_haversine_zero_distance() {
        assert_eq!(haversine(52.0, 13.0, 52.0, 13.0, EARTH), 0.0);
    }

    #[test]
    fn test_find_nearest_orders_ascending() {
        let lats = [0.0, 0.0, 0.0, 10.0];
        let lons = [0.0, 1.0, 2.0, 0.0];
        let oracle = GreatCircleOracle::new(&lats, &lons, EARTH);
        let hits = oracle.find_nearest(1, 0.0, 0.9, 3).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].index, 1);
        assert_eq!(hits[1].index, 0);
        assert_eq!(hits[2].index, 2);
        assert!(hits[0].distance <= hits[1].distance);
        assert!(hits[1].distance <= hits[2].distance);
    }

    #[test]
    fn test_find_nearest_exact_node() {
        let lats = [0.0, 5.0];
        let lons = [0.0, 5.0];
        let oracle = GreatCircleOracle::new(&lats, &lons, EARTH);
        let hits = oracle.find_nearest(1, 5.0, 5.0, 2).unwrap();
        assert_eq!(hits[0].index, 1);
        assert_eq!(hits[0].distance, 0.0);
    }

    #[test]
    fn test_too_many_neighbors_requested() {
        let oracle = GreatCircleOracle::new(&[0.0, 1.0], &[0.0, 1.0], EARTH);
        assert!(oracle.find_nearest(1, 0.0, 0.0, 4).is_err());
        assert!(oracle.find_nearest(1, 0.0, 0.0, 0).is_err());
    }
}
