//! Rotated-pole grid transforms.
//!
//! A rotated lat/lon grid places its pole at a chosen (south-pole-lat,
//! south-pole-lon). Coordinates expressed in that frame must be brought back
//! to the regular geographic frame before spherical-distance queries, and
//! regular coordinates can be pushed into the rotated frame of a source
//! grid. Both directions produce unit-sphere Cartesian points.
//!
//! The two directions are distinct transforms, not matrix inverses of one
//! another: the regular-to-rotated direction uses the pole angles directly,
//! the rotated-to-regular direction negates both angles. They agree as
//! inverses only when the pole longitude is zero, which is how the grids
//! that use them are laid out.

use interp_common::PoleRotation;
use nalgebra::{Matrix3, Vector3};

/// Rotation taking regular-frame unit vectors into the rotated frame.
fn to_rotated_matrix(pole: &PoleRotation) -> Matrix3<f64> {
    let theta = (90.0 + pole.south_pole_lat).to_radians();
    let phi = pole.south_pole_lon.to_radians();
    let (sin_t, cos_t) = theta.sin_cos();
    let (sin_p, cos_p) = phi.sin_cos();
    Matrix3::new(
        cos_t * cos_p,
        cos_t * sin_p,
        sin_t,
        -sin_p,
        cos_p,
        0.0,
        -sin_t * cos_p,
        -sin_t * sin_p,
        cos_t,
    )
}

/// Rotation taking rotated-frame unit vectors back to the regular frame.
fn to_regular_matrix(pole: &PoleRotation) -> Matrix3<f64> {
    let theta = -(90.0 + pole.south_pole_lat).to_radians();
    let phi = -pole.south_pole_lon.to_radians();
    let (sin_t, cos_t) = theta.sin_cos();
    let (sin_p, cos_p) = phi.sin_cos();
    Matrix3::new(
        cos_t * cos_p,
        sin_p,
        sin_t * cos_p,
        cos_t * sin_p,
        cos_p,
        -sin_t * sin_p,
        -sin_t,
        0.0,
        cos_t,
    )
}

fn apply(matrix: &Matrix3<f64>, lats_deg: &[f64], lons_deg: &[f64]) -> Vec<[f64; 3]> {
    debug_assert_eq!(lats_deg.len(), lons_deg.len());
    lats_deg
        .iter()
        .zip(lons_deg.iter())
        .map(|(&lat, &lon)| {
            let p = crate::sphere::geodetic_to_cartesian(lat, lon, 1.0);
            let rotated = matrix * Vector3::new(p[0], p[1], p[2]);
            [rotated.x, rotated.y, rotated.z]
        })
        .collect()
}

/// Convert coordinates given in a rotated frame to regular-frame unit
/// vectors, ready for spherical-distance lookup.
pub fn rotated_to_regular(lats_deg: &[f64], lons_deg: &[f64], pole: &PoleRotation) -> Vec<[f64; 3]> {
    apply(&to_regular_matrix(pole), lats_deg, lons_deg)
}

/// Convert regular geographic coordinates to unit vectors in the rotated
/// frame of a grid with the given pole.
pub fn regular_to_rotated(lats_deg: &[f64], lons_deg: &[f64], pole: &PoleRotation) -> Vec<[f64; 3]> {
    apply(&to_rotated_matrix(pole), lats_deg, lons_deg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sphere::cartesian_to_geodetic;

    const TOL: f64 = 1e-10;

    fn pole(lat: f64, lon: f64) -> PoleRotation {
        PoleRotation {
            south_pole_lat: lat,
            south_pole_lon: lon,
            angle: 0.0,
        }
    }

    #[test]
    fn test_unrotated_pole_is_identity() {
        // South pole at the geographic south pole: both directions are no-ops.
        let p = pole(-90.0, 0.0);
        let lats = [10.0, -45.0, 72.0];
        let lons = [20.0, 135.0, -60.0];
        for points in [
            rotated_to_regular(&lats, &lons, &p),
            regular_to_rotated(&lats, &lons, &p),
        ] {
            for (i, point) in points.iter().enumerate() {
                let (lat, lon) = cartesian_to_geodetic(*point);
                assert!((lat - lats[i]).abs() < TOL);
                assert!((lon - lons[i]).abs() < TOL);
            }
        }
    }

    #[test]
    fn test_rotated_south_pole_maps_to_pole_location() {
        // The rotated frame's own south pole lands on (south_pole_lat,
        // south_pole_lon) in regular coordinates.
        let p = pole(-35.0, -15.0);
        let points = rotated_to_regular(&[-90.0], &[0.0], &p);
        let (lat, lon) = cartesian_to_geodetic(points[0]);
        assert!((lat - -35.0).abs() < TOL, "lat {lat}");
        assert!((lon - -15.0).abs() < TOL, "lon {lon}");
    }

    #[test]
    fn test_pole_location_maps_to_rotated_south_pole() {
        let p = pole(-35.0, -15.0);
        let points = regular_to_rotated(&[-35.0], &[-15.0], &p);
        let (lat, _) = cartesian_to_geodetic(points[0]);
        assert!((lat - -90.0).abs() < 1e-6, "lat {lat}");
    }

    #[test]
    fn test_round_trip_with_zero_pole_longitude() {
        // With the pole on the Greenwich meridian the two directions are
        // exact inverses.
        let p = pole(-35.0, 0.0);
        let lats = [0.0, 30.0, -20.0, 60.0];
        let lons = [0.0, 45.0, -90.0, 10.0];
        let rotated = regular_to_rotated(&lats, &lons, &p);
        let mut rot_lats = Vec::new();
        let mut rot_lons = Vec::new();
        for point in &rotated {
            let (lat, lon) = cartesian_to_geodetic(*point);
            rot_lats.push(lat);
            rot_lons.push(lon);
        }
        let back = rotated_to_regular(&rot_lats, &rot_lons, &p);
        for (i, point) in back.iter().enumerate() {
            let (lat, lon) = cartesian_to_geodetic(*point);
            assert!((lat - lats[i]).abs() < 1e-9, "lat {lat} vs {}", lats[i]);
            assert!((lon - lons[i]).abs() < 1e-9, "lon {lon} vs {}", lons[i]);
        }
    }

    #[test]
    fn test_outputs_stay_on_unit_sphere() {
        let p = pole(-47.5, 12.0);
        for point in rotated_to_regular(&[10.0, 85.0], &[170.0, -5.0], &p) {
            let norm = (point[0] * point[0] + point[1] * point[1] + point[2] * point[2]).sqrt();
            assert!((norm - 1.0).abs() < TOL);
        }
    }
}
