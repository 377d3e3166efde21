//! Lat/lon to 3-D Cartesian conversion on a sphere.

/// Convert a single geodetic point (degrees) to Cartesian coordinates on a
/// sphere of the given radius.
#[inline]
pub fn geodetic_to_cartesian(lat_deg: f64, lon_deg: f64, radius: f64) -> [f64; 3] {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    [
        radius * lon.cos() * lat.cos(),
        radius * lon.sin() * lat.cos(),
        radius * lat.sin(),
    ]
}

/// Convert conformable lat/lon arrays (degrees) to Cartesian points.
///
/// Pass `radius = 1.0` for unit-sphere points.
pub fn to_cartesian(lats_deg: &[f64], lons_deg: &[f64], radius: f64) -> Vec<[f64; 3]> {
    debug_assert_eq!(lats_deg.len(), lons_deg.len());
    lats_deg
        .iter()
        .zip(lons_deg.iter())
        .map(|(&lat, &lon)| geodetic_to_cartesian(lat, lon, radius))
        .collect()
}

/// Convert a Cartesian point back to geodetic (lat, lon) in degrees.
///
/// The point need not be on the unit sphere; it is normalized first.
#[inline]
pub fn cartesian_to_geodetic(point: [f64; 3]) -> (f64, f64) {
    let [x, y, z] = point;
    let norm = (x * x + y * y + z * z).sqrt();
    let lat = (z / norm).asin().to_degrees();
    let lon = y.atan2(x).to_degrees();
    (lat, lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn test_cardinal_points() {
        let origin = geodetic_to_cartesian(0.0, 0.0, 1.0);
        assert!((origin[0] - 1.0).abs() < TOL);
        assert!(origin[1].abs() < TOL);
        assert!(origin[2].abs() < TOL);

        let north_pole = geodetic_to_cartesian(90.0, 0.0, 1.0);
        assert!(north_pole[0].abs() < TOL);
        assert!((north_pole[2] - 1.0).abs() < TOL);

        let east = geodetic_to_cartesian(0.0, 90.0, 1.0);
        assert!((east[1] - 1.0).abs() < TOL);
    }

    #[test]
    fn test_radius_scaling() {
        let r = 6371000.0;
        let p = geodetic_to_cartesian(45.0, 45.0, r);
        let norm = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
        assert!((norm - r).abs() < 1e-6);
    }

    #[test]
    fn test_round_trip() {
        for &(lat, lon) in &[(0.0, 0.0), (52.5, 13.4), (-33.9, 151.2), (89.0, -179.0)] {
            let p = geodetic_to_cartesian(lat, lon, 1.0);
            let (lat2, lon2) = cartesian_to_geodetic(p);
            assert!((lat - lat2).abs() < 1e-9, "lat {lat} vs {lat2}");
            assert!((lon - lon2).abs() < 1e-9, "lon {lon} vs {lon2}");
        }
    }

    #[test]
    fn test_batch_matches_scalar() {
        let lats = [10.0, 20.0, 30.0];
        let lons = [40.0, 50.0, 60.0];
        let points = to_cartesian(&lats, &lons, 2.0);
        assert_eq!(points.len(), 3);
        assert_eq!(points[1], geodetic_to_cartesian(20.0, 50.0, 2.0));
    }
}
