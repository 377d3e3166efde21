//! Common types shared across the grid interpolation workspace.

pub mod error;
pub mod grid;
pub mod raster;

pub use error::{InterpError, InterpResult};
pub use grid::{GridDescriptor, GridFamily, PoleRotation};
pub use raster::{is_missing, Raster};
