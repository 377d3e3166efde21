//! KD-tree interpolation backend (method token `scipy`).
//!
//! Source nodes become 3-D Cartesian points on a sphere; target cells are
//! matched by Euclidean chord distance through the spatial index. Nearest
//! mode records one index per cell, inverse-distance mode records four
//! `1/d²`-weighted neighbors. Cells farther from their nearest node than
//! the derived upper bound are out of the source domain and masked.

use crate::config::{InterpolationOptions, Mode};
use crate::interpolator::BuildOutcome;
use crate::table::Intertable;
use interp_common::{is_missing, GridDescriptor, InterpError, InterpResult, Raster};
use rayon::prelude::*;
use spatial_index::{QueryHit, SpatialIndex};
use tracing::{debug, info};

/// Distance at or below which a target cell sits exactly on a source node.
const EXACT_HIT: f64 = 1e-10;

/// Target longitudes at or below this value mark invalid cells.
const INVALID_LON: f64 = -1.0e10;

/// KD-tree backend for both nearest and inverse-distance modes.
pub struct ScipyBackend {
    index: SpatialIndex,
    descriptor: GridDescriptor,
    mode: Mode,
    target_mv: f64,
    source_mv: f64,
    rotated_target: bool,
    parallel: bool,
    min_upper_bound: f64,
}

/// One inverse-distance table row.
struct WeightRow {
    indexes: [i64; 4],
    coeffs: [f64; 4],
    out: bool,
}

impl ScipyBackend {
    /// Build the spatial index over the source grid and derive the
    /// out-of-domain rejection bound.
    pub fn new(
        source_lats: &[f64],
        source_lons: &[f64],
        descriptor: GridDescriptor,
        options: &InterpolationOptions,
    ) -> InterpResult<Self> {
        if source_lats.len() != descriptor.num_values || source_lons.len() != descriptor.num_values
        {
            return Err(InterpError::shape_mismatch(
                format!("{} source nodes", descriptor.num_values),
                format!(
                    "{} latitudes, {} longitudes",
                    source_lats.len(),
                    source_lons.len()
                ),
            ));
        }

        let points = geodetic::to_cartesian(source_lats, source_lons, descriptor.earth_radius);
        let index = SpatialIndex::build(&points)?;

        // The largest legitimate nearest-neighbor gap in the source grid,
        // plus a small slack for targets just outside the bounding region.
        let gap = index.max_nearest_gap(options.parallel);
        let min_upper_bound = gap + gap * 4.0 / descriptor.ny as f64;
        debug!(
            nodes = index.len(),
            min_upper_bound, "spatial index ready; neighbors beyond the bound are out of domain"
        );

        Ok(Self {
            index,
            descriptor,
            mode: options.mode,
            target_mv: options.target_mv,
            source_mv: options.source_mv,
            rotated_target: options.rotated_target,
            parallel: options.parallel,
            min_upper_bound,
        })
    }

    /// Distance above which a target cell is rejected as out of domain.
    pub fn min_upper_bound(&self) -> f64 {
        self.min_upper_bound
    }

    /// Compute the table for a target grid and the interpolated values.
    pub fn build(
        &self,
        values: &[f64],
        target_lons: &Raster,
        target_lats: &Raster,
    ) -> InterpResult<BuildOutcome> {
        check_target_shapes(target_lons, target_lats)?;
        let points = self.target_points(target_lats, target_lons)?;

        let (table, outs) = match self.mode {
            Mode::Nearest => self.build_nearest(&points, target_lons),
            Mode::Invdist => self.build_invdist(&points, target_lons),
        };
        info!(
            cells = target_lons.len(),
            outs,
            mode = %self.mode,
            "interpolation table built"
        );

        let result = self.apply(&table, values, target_lons, target_lats)?;
        Ok(BuildOutcome {
            result,
            table,
            outs,
        })
    }

    /// Gather source values through a precomputed table.
    pub fn apply(
        &self,
        table: &Intertable,
        values: &[f64],
        target_lons: &Raster,
        target_lats: &Raster,
    ) -> InterpResult<Raster> {
        check_target_shapes(target_lons, target_lats)?;
        if values.len() != self.descriptor.num_values {
            return Err(InterpError::shape_mismatch(
                format!("{} source values", self.descriptor.num_values),
                format!("{} source values", values.len()),
            ));
        }

        match (self.mode, table) {
            (Mode::Nearest, Intertable::ScipyNearest { indexes }) => {
                self.apply_nearest(indexes, values, target_lons)
            }
            (Mode::Invdist, Intertable::ScipyInvdist { indexes, coeffs }) => {
                self.apply_invdist(indexes, coeffs, values, target_lons)
            }
            _ => Err(InterpError::decode(format!(
                "intertable does not match scipy {} apply path",
                self.mode
            ))),
        }
    }

    fn target_points(
        &self,
        target_lats: &Raster,
        target_lons: &Raster,
    ) -> InterpResult<Vec<[f64; 3]>> {
        if self.rotated_target {
            let pole = self.descriptor.rotation.ok_or_else(|| {
                InterpError::config("rotated_target requires a pole definition on the source grid")
            })?;
            Ok(geodetic::rotated_to_regular(
                target_lats.data(),
                target_lons.data(),
                &pole,
            ))
        } else {
            Ok(geodetic::to_cartesian(
                target_lats.data(),
                target_lons.data(),
                self.descriptor.earth_radius,
            ))
        }
    }

    #[inline]
    fn valid_target(&self, lon: f64) -> bool {
        lon > INVALID_LON && !is_missing(lon, self.target_mv)
    }

    fn build_nearest(&self, points: &[[f64; 3]], target_lons: &Raster) -> (Intertable, usize) {
        let sentinel = self.index.len() as i64;
        let cell = |(point, &lon): (&[f64; 3], &f64)| -> (i64, bool) {
            if !self.valid_target(lon) {
                return (sentinel, false);
            }
            let hit = self.index.query_one(point, 1)[0];
            if hit.distance <= self.min_upper_bound {
                (hit.index as i64, false)
            } else {
                (sentinel, true)
            }
        };

        let rows: Vec<(i64, bool)> = if self.parallel {
            points
                .par_iter()
                .zip(target_lons.data().par_iter())
                .map(cell)
                .collect()
        } else {
            points.iter().zip(target_lons.data()).map(cell).collect()
        };

        let outs = rows.iter().filter(|(_, out)| *out).count();
        let indexes = rows.into_iter().map(|(index, _)| index).collect();
        (Intertable::ScipyNearest { indexes }, outs)
    }

    fn build_invdist(&self, points: &[[f64; 3]], target_lons: &Raster) -> (Intertable, usize) {
        let sentinel = self.index.len() as i64;
        let masked = |out: bool| WeightRow {
            indexes: [sentinel; 4],
            coeffs: [1.0, 0.0, 0.0, 0.0],
            out,
        };

        let cell = |(point, &lon): (&[f64; 3], &f64)| -> WeightRow {
            if !self.valid_target(lon) {
                return masked(false);
            }
            let hits = self.index.query_one(point, 4.min(self.index.len()));
            if hits[0].distance <= EXACT_HIT {
                WeightRow {
                    indexes: index_row(&hits),
                    coeffs: [1.0, 0.0, 0.0, 0.0],
                    out: false,
                }
            } else if hits[0].distance <= self.min_upper_bound {
                weighted_row(&hits)
            } else {
                masked(true)
            }
        };

        let rows: Vec<WeightRow> = if self.parallel {
            points
                .par_iter()
                .zip(target_lons.data().par_iter())
                .map(cell)
                .collect()
        } else {
            points.iter().zip(target_lons.data()).map(cell).collect()
        };

        let outs = rows.iter().filter(|row| row.out).count();
        let indexes = rows.iter().map(|row| row.indexes).collect();
        let coeffs = rows.iter().map(|row| row.coeffs).collect();
        (Intertable::ScipyInvdist { indexes, coeffs }, outs)
    }

    fn apply_nearest(
        &self,
        indexes: &[i64],
        values: &[f64],
        target_lons: &Raster,
    ) -> InterpResult<Raster> {
        let n_t = target_lons.len();
        if indexes.len() != n_t {
            return Err(InterpError::shape_mismatch(
                format!("table with {n_t} rows"),
                format!("table with {} rows", indexes.len()),
            ));
        }
        let sentinel = values.len() as i64;
        if indexes.iter().any(|&index| index < 0 || index > sentinel) {
            return Err(InterpError::decode(
                "intertable index outside the source grid",
            ));
        }

        let gather = |&index: &i64| -> f64 {
            if index == sentinel {
                return self.target_mv;
            }
            let value = values[index as usize];
            if is_missing(value, self.source_mv) {
                self.target_mv
            } else {
                value
            }
        };

        let data: Vec<f64> = if self.parallel {
            indexes.par_iter().map(gather).collect()
        } else {
            indexes.iter().map(gather).collect()
        };
        Raster::from_vec(data, target_lons.rows(), target_lons.cols())
    }

    fn apply_invdist(
        &self,
        indexes: &[[i64; 4]],
        coeffs: &[[f64; 4]],
        values: &[f64],
        target_lons: &Raster,
    ) -> InterpResult<Raster> {
        let n_t = target_lons.len();
        if indexes.len() != n_t || coeffs.len() != n_t {
            return Err(InterpError::shape_mismatch(
                format!("table with {n_t} rows"),
                format!("table with {}/{} rows", indexes.len(), coeffs.len()),
            ));
        }
        let sentinel = values.len() as i64;
        if indexes
            .iter()
            .flatten()
            .any(|&index| index < 0 || index > sentinel)
        {
            return Err(InterpError::decode(
                "intertable index outside the source grid",
            ));
        }

        let gather = |(row, weights): (&[i64; 4], &[f64; 4])| -> f64 {
            let mut acc = 0.0;
            for (&index, &weight) in row.iter().zip(weights) {
                if weight == 0.0 {
                    continue;
                }
                if index == sentinel {
                    return self.target_mv;
                }
                let value = values[index as usize];
                if is_missing(value, self.source_mv) {
                    return self.target_mv;
                }
                acc += weight * value;
            }
            acc
        };

        let data: Vec<f64> = if self.parallel {
            indexes
                .par_iter()
                .zip(coeffs.par_iter())
                .map(gather)
                .collect()
        } else {
            indexes.iter().zip(coeffs).map(gather).collect()
        };
        Raster::from_vec(data, target_lons.rows(), target_lons.cols())
    }
}

fn check_target_shapes(target_lons: &Raster, target_lats: &Raster) -> InterpResult<()> {
    if target_lons.shape() != target_lats.shape() {
        return Err(InterpError::shape_mismatch(
            format!("{:?} target longitudes", target_lons.shape()),
            format!("{:?} target latitudes", target_lats.shape()),
        ));
    }
    Ok(())
}

/// The four neighbor indexes of a row, padded with the nearest index when
/// the grid has fewer than four nodes. Padding slots always carry weight 0.
fn index_row(hits: &[QueryHit]) -> [i64; 4] {
    let mut row = [hits[0].index as i64; 4];
    for (slot, hit) in row.iter_mut().zip(hits) {
        *slot = hit.index as i64;
    }
    row
}

/// Inverse-square-distance weights, normalized to sum to 1.
fn weighted_row(hits: &[QueryHit]) -> WeightRow {
    let mut coeffs = [0.0; 4];
    let mut sum = 0.0;
    for (slot, hit) in coeffs.iter_mut().zip(hits) {
        *slot = 1.0 / (hit.distance * hit.distance);
        sum += *slot;
    }
    for slot in &mut coeffs {
        *slot /= sum;
    }
    WeightRow {
        indexes: index_row(hits),
        coeffs,
        out: false,
    }
}
