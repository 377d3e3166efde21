//! Coordinate transforms for geographic grids.
//!
//! Two concerns live here:
//! - conversion between geodetic (lat/lon, degrees) and 3-D Cartesian
//!   coordinates on a sphere, used to feed the spatial index;
//! - rotated-pole grid transforms, which move coordinates between a
//!   rotated frame and the regular geographic frame before any
//!   spherical-distance query is made.

pub mod rotation;
pub mod sphere;

pub use rotation::{regular_to_rotated, rotated_to_regular};
pub use sphere::{cartesian_to_geodetic, geodetic_to_cartesian, to_cartesian};
