//! Interpolation facade: backend selection, table cache consultation,
//! build-or-apply dispatch.

use crate::config::{InterpolationOptions, Method};
use crate::grib::GribBackend;
use crate::oracle::GeodesicOracle;
use crate::scipy::ScipyBackend;
use crate::store::IntertableStore;
use crate::table::Intertable;
use interp_common::{GridDescriptor, InterpError, InterpResult, Raster};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of a table build: the interpolated field, the table to persist,
/// and how many target cells were rejected as out of domain.
pub struct BuildOutcome {
    pub result: Raster,
    pub table: Intertable,
    pub outs: usize,
}

/// The closed set of interpolation backends.
///
/// Tables are backend-specific: a scipy table must never reach the grib
/// apply path or vice versa, even when the mode matches. The store encodes
/// the method into the file name and the codec tags the payload, so a
/// mismatch surfaces as a decode error rather than wrong numbers.
pub enum Backend {
    Scipy(ScipyBackend),
    Grib(GribBackend),
}

impl Backend {
    /// Produce the interpolated field and a fresh table for this target grid.
    pub fn build(
        &self,
        values: &[f64],
        target_lons: &Raster,
        target_lats: &Raster,
    ) -> InterpResult<BuildOutcome> {
        match self {
            Backend::Scipy(backend) => backend.build(values, target_lons, target_lats),
            Backend::Grib(backend) => backend.build(values, target_lons, target_lats),
        }
    }

    /// Gather source values through a precomputed table.
    pub fn apply(
        &self,
        table: &Intertable,
        values: &[f64],
        target_lons: &Raster,
        target_lats: &Raster,
    ) -> InterpResult<Raster> {
        match self {
            Backend::Scipy(backend) => backend.apply(table, values, target_lons, target_lats),
            Backend::Grib(backend) => backend.apply(table, values, target_lons, target_lats),
        }
    }
}

/// Single entry point for resampling source fields onto a target grid.
///
/// On the first `interpolate` call for a (grid id, method, mode)
/// combination the backend builds the table (potentially very slow) and the
/// store persists it; every later call loads the table and applies it in
/// well under a second.
pub struct Interpolator {
    backend: Backend,
    store: IntertableStore,
    table_name: String,
    num_values: usize,
}

impl std::fmt::Debug for Interpolator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpolator")
            .field("table_name", &self.table_name)
            .field("num_values", &self.num_values)
            .finish_non_exhaustive()
    }
}

impl Interpolator {
    /// Configure an interpolator for one source grid.
    ///
    /// `oracle` is required iff `options.method == Method::Grib`, together
    /// with a non-negative `options.gid` naming the source grid to it.
    pub fn new(
        source_lats: &[f64],
        source_lons: &[f64],
        descriptor: GridDescriptor,
        options: InterpolationOptions,
        oracle: Option<Arc<dyn GeodesicOracle>>,
    ) -> InterpResult<Self> {
        let store = IntertableStore::new(&options.store)?;
        let table_name =
            IntertableStore::table_name(descriptor.grid_id(), options.method, options.mode);
        let num_values = descriptor.num_values;

        let backend = match options.method {
            Method::Scipy => Backend::Scipy(ScipyBackend::new(
                source_lats,
                source_lons,
                descriptor,
                &options,
            )?),
            Method::Grib => {
                let oracle = oracle.ok_or_else(|| {
                    InterpError::config("grib method requires a geodesic oracle")
                })?;
                if options.gid < 0 {
                    return Err(InterpError::config(
                        "grib method requires a source grid handle (gid)",
                    ));
                }
                Backend::Grib(GribBackend::new(oracle, &options))
            }
        };

        Ok(Self {
            backend,
            store,
            table_name,
            num_values,
        })
    }

    /// File name of this interpolator's table within the store.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Full path of this interpolator's table file.
    pub fn table_path(&self) -> PathBuf {
        self.store.path_for(&self.table_name)
    }

    /// Resample `values` onto the target grid.
    ///
    /// Loads and applies the cached table when present; otherwise builds,
    /// persists the table, and returns the build's result. Both failure
    /// directions (build errors, malformed tables) are fatal; per-cell
    /// misses are masked with the target missing value.
    pub fn interpolate(
        &self,
        values: &[f64],
        target_lons: &Raster,
        target_lats: &Raster,
    ) -> InterpResult<Raster> {
        if values.len() != self.num_values {
            return Err(InterpError::shape_mismatch(
                format!("{} source values", self.num_values),
                format!("{} source values", values.len()),
            ));
        }

        match self.store.lookup(&self.table_name)? {
            Some(table) => {
                debug!(table = %self.table_name, "applying cached intertable");
                self.backend.apply(&table, values, target_lons, target_lats)
            }
            None => {
                info!(table = %self.table_name, "no intertable yet, building");
                let outcome = self.backend.build(values, target_lons, target_lats)?;
                self.store.store(&self.table_name, &outcome.table)?;
                info!(
                    table = %self.table_name,
                    outs = outcome.outs,
                    "intertable built and stored"
                );
                Ok(outcome.result)
            }
        }
    }
}
