//! Interpolation configuration surface.

use interp_common::{InterpError, InterpResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Interpolation mode: how many neighbors contribute to a target cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Single nearest neighbor (k = 1).
    Nearest,
    /// Inverse-distance weighting over the four nearest neighbors (k = 4).
    Invdist,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Nearest => "nearest",
            Mode::Invdist => "invdist",
        }
    }

    /// Neighbor count queried for this mode.
    pub(crate) fn nnear(&self) -> usize {
        match self {
            Mode::Nearest => 1,
            Mode::Invdist => 4,
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Nearest
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = InterpError;

    fn from_str(s: &str) -> InterpResult<Self> {
        match s {
            "nearest" => Ok(Mode::Nearest),
            "invdist" => Ok(Mode::Invdist),
            other => Err(InterpError::config(format!(
                "unknown interpolation mode: {other}"
            ))),
        }
    }
}

/// Interpolation method: which backend, and therefore which distance metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// KD-tree backend; Euclidean chord distance on the sphere.
    Scipy,
    /// External geodesic oracle backend; great-circle distance in meters.
    Grib,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Scipy => "scipy",
            Method::Grib => "grib",
        }
    }
}

impl Default for Method {
    fn default() -> Self {
        Method::Scipy
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = InterpError;

    fn from_str(s: &str) -> InterpResult<Self> {
        match s {
            "scipy" => Ok(Method::Scipy),
            "grib" => Ok(Method::Grib),
            other => Err(InterpError::config(format!(
                "unknown interpolation method: {other}"
            ))),
        }
    }
}

/// Full configuration for an [`Interpolator`](crate::Interpolator).
///
/// The defaults mirror the operational pipeline: scipy nearest-neighbor,
/// NaN sentinels, parallel queries, tables cached in the working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpolationOptions {
    pub mode: Mode,
    pub method: Method,
    /// Sentinel written into out-of-domain output cells.
    pub target_mv: f64,
    /// Sentinel recognized in the source value array.
    pub source_mv: f64,
    /// Target coordinates are in the rotated frame of the source grid and
    /// must be brought back to regular coordinates before lookup.
    pub rotated_target: bool,
    /// Partition queries and weight assembly across worker threads.
    pub parallel: bool,
    /// Opaque source-grid handle for the geodesic oracle; required iff
    /// `method == Method::Grib`.
    pub gid: i64,
    /// Intertable cache directory; created if absent.
    pub store: PathBuf,
}

impl Default for InterpolationOptions {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            method: Method::default(),
            target_mv: f64::NAN,
            source_mv: f64::NAN,
            rotated_target: false,
            parallel: true,
            gid: -1,
            store: PathBuf::from("./"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_tokens() {
        assert_eq!("nearest".parse::<Mode>().unwrap(), Mode::Nearest);
        assert_eq!("invdist".parse::<Mode>().unwrap(), Mode::Invdist);
        assert_eq!("scipy".parse::<Method>().unwrap(), Method::Scipy);
        assert_eq!("grib".parse::<Method>().unwrap(), Method::Grib);
        assert!("bilinear".parse::<Mode>().is_err());
        assert!("eccodes".parse::<Method>().is_err());
    }

    #[test]
    fn test_defaults() {
        let options = InterpolationOptions::default();
        assert_eq!(options.mode, Mode::Nearest);
        assert_eq!(options.method, Method::Scipy);
        assert!(options.target_mv.is_nan());
        assert!(options.source_mv.is_nan());
        assert!(!options.rotated_target);
        assert!(options.parallel);
        assert_eq!(options.gid, -1);
        assert_eq!(options.store, PathBuf::from("./"));
    }

    #[test]
    fn test_neighbor_counts() {
        assert_eq!(Mode::Nearest.nnear(), 1);
        assert_eq!(Mode::Invdist.nnear(), 4);
    }
}
