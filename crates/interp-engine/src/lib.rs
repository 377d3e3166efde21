//! # Grid interpolation engine
//!
//! Resamples scalar fields defined on a source geographic grid (regular or
//! reduced, plain or rotated lat/lon and Gaussian families) onto an
//! arbitrary target grid of (latitude, longitude) cells.
//!
//! ## How it works
//!
//! - **Two backends**: a KD-tree backend matching points by Euclidean chord
//!   distance on the sphere (`scipy`), and an external geodesic-oracle
//!   backend using great-circle distances (`grib`).
//! - **Two modes**: single nearest neighbor (`nearest`) and
//!   inverse-distance weighting over four neighbors (`invdist`).
//! - **Persistent intertables**: the expensive neighbor search runs once per
//!   (source grid, method, mode); the resulting (indexes, weights) table is
//!   cached on disk and every later interpolation is a sub-second gather.
//!
//! ```rust,ignore
//! use interp_engine::{InterpolationOptions, Interpolator};
//!
//! let options = InterpolationOptions {
//!     store: "/var/cache/intertables/dem500".into(),
//!     ..Default::default()
//! };
//! let interpolator = Interpolator::new(&lats, &lons, descriptor, options, None)?;
//! let field = interpolator.interpolate(&values, &target_lons, &target_lats)?;
//! ```
//!
//! Note that the *target* grid is not part of the cache key: use one store
//! directory per target grid.

pub mod config;
pub mod grib;
pub mod interpolator;
pub mod oracle;
mod progress;
pub mod scipy;
pub mod store;
pub mod table;

pub use config::{InterpolationOptions, Method, Mode};
pub use grib::GribBackend;
pub use interpolator::{Backend, BuildOutcome, Interpolator};
pub use oracle::{GeodesicOracle, GreatCircleOracle, OracleError, OracleNeighbor};
pub use scipy::ScipyBackend;
pub use store::IntertableStore;
pub use table::Intertable;

pub use interp_common::{GridDescriptor, GridFamily, InterpError, InterpResult, PoleRotation, Raster};
