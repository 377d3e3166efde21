//! Source grid metadata.

use crate::error::{InterpError, InterpResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Grid families handled by the engine.
///
/// Reduced grids have a varying number of points per parallel, so their
/// along-parallel count is missing. Rotated grids carry a pole definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridFamily {
    RegularLl,
    ReducedLl,
    RegularGg,
    ReducedGg,
    RotatedLl,
    RotatedGg,
}

impl GridFamily {
    /// The wire token for this family, as it appears in grid ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            GridFamily::RegularLl => "regular_ll",
            GridFamily::ReducedLl => "reduced_ll",
            GridFamily::RegularGg => "regular_gg",
            GridFamily::ReducedGg => "reduced_gg",
            GridFamily::RotatedLl => "rotated_ll",
            GridFamily::RotatedGg => "rotated_gg",
        }
    }

    /// True for grids whose pole has been rotated away from the geographic pole.
    pub fn is_rotated(&self) -> bool {
        matches!(self, GridFamily::RotatedLl | GridFamily::RotatedGg)
    }

    /// True for grids with a latitude-dependent number of longitude points.
    pub fn is_reduced(&self) -> bool {
        matches!(self, GridFamily::ReducedLl | GridFamily::ReducedGg)
    }
}

impl fmt::Display for GridFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GridFamily {
    type Err = InterpError;

    fn from_str(s: &str) -> InterpResult<Self> {
        match s {
            "regular_ll" => Ok(GridFamily::RegularLl),
            "reduced_ll" => Ok(GridFamily::ReducedLl),
            "regular_gg" => Ok(GridFamily::RegularGg),
            "reduced_gg" => Ok(GridFamily::ReducedGg),
            "rotated_ll" => Ok(GridFamily::RotatedLl),
            "rotated_gg" => Ok(GridFamily::RotatedGg),
            other => Err(InterpError::config(format!("unknown grid family: {other}"))),
        }
    }
}

/// Pole definition for rotated grid families, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoleRotation {
    /// Latitude of the southern pole of projection.
    pub south_pole_lat: f64,
    /// Longitude of the southern pole of projection.
    pub south_pole_lon: f64,
    /// Angle of rotation about the new axis.
    pub angle: f64,
}

/// Immutable description of a source grid.
///
/// Built once per source dataset and consumed by the coordinate transforms
/// and the intertable store. Two descriptors with equal [`grid_id`] are
/// interpolation-equivalent: they produce identical tables for the same
/// target grid and method.
///
/// [`grid_id`]: GridDescriptor::grid_id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridDescriptor {
    pub grid_family: GridFamily,
    /// Sphere radius in meters.
    pub earth_radius: f64,
    /// Total number of source nodes.
    pub num_values: usize,
    /// Points along a parallel; `None` for reduced grids.
    pub nx: Option<usize>,
    /// Points along a meridian.
    pub ny: usize,
    /// Longitude of the first grid point, degrees.
    pub lon_first: f64,
    /// Longitude of the last grid point, degrees.
    pub lon_last: f64,
    /// Pole definition; present only for rotated families.
    pub rotation: Option<PoleRotation>,
    /// Sentinel used by the source data.
    pub missing_value: f64,
    grid_id: String,
}

impl GridDescriptor {
    /// Create a descriptor and derive its cache id.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        grid_family: GridFamily,
        earth_radius: f64,
        num_values: usize,
        nx: Option<usize>,
        ny: usize,
        lon_first: f64,
        lon_last: f64,
        missing_value: f64,
    ) -> InterpResult<Self> {
        if !(earth_radius > 0.0) {
            return Err(InterpError::config(format!(
                "earth radius must be positive, got {earth_radius}"
            )));
        }
        if num_values == 0 {
            return Err(InterpError::config("grid has no values"));
        }
        if ny == 0 {
            return Err(InterpError::config("grid has no points along meridian"));
        }

        let grid_id = build_grid_id(lon_first, lon_last, nx, ny, num_values, grid_family);
        Ok(Self {
            grid_family,
            earth_radius,
            num_values,
            nx,
            ny,
            lon_first,
            lon_last,
            rotation: None,
            missing_value,
            grid_id,
        })
    }

    /// Attach a pole definition for a rotated grid.
    ///
    /// The id deliberately omits the pole: rotated grids are already
    /// disambiguated by their first/last longitudes and counts.
    pub fn with_rotation(mut self, south_pole_lat: f64, south_pole_lon: f64, angle: f64) -> Self {
        self.rotation = Some(PoleRotation {
            south_pole_lat,
            south_pole_lon,
            angle,
        });
        self
    }

    /// Stable id used as the intertable cache key component.
    pub fn grid_id(&self) -> &str {
        &self.grid_id
    }
}

/// Render a longitude for the grid id: 4 decimals, trailing zeros and any
/// trailing dot stripped ("359.5500" -> "359.55", "0.0000" -> "0").
fn format_lon(value: f64) -> String {
    let rendered = format!("{value:.4}");
    rendered
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn build_grid_id(
    lon_first: f64,
    lon_last: f64,
    nx: Option<usize>,
    ny: usize,
    num_values: usize,
    family: GridFamily,
) -> String {
    let nx_token = match nx {
        Some(n) => n.to_string(),
        None => "M".to_string(),
    };
    format!(
        "{}${}${}${}${}${}",
        format_lon(lon_first),
        format_lon(lon_last),
        nx_token,
        ny,
        num_values,
        family
    )
}
