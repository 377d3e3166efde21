//! Geodesic-oracle interpolation backend (method token `grib`).
//!
//! Neighbor search is delegated to an external great-circle oracle keyed by
//! an opaque source-grid handle; no spatial index or coordinate transform
//! is involved. Inverse-distance weights are *linear* (`1/d`), not squared:
//! oracle distances are great-circle meters, where the scipy backend's
//! chord-length `1/d²` convention does not apply.
//!
//! Tables carry only the surviving target cells (valid coordinates, oracle
//! answered); everything else stays at the target missing value.

use crate::config::{InterpolationOptions, Mode};
use crate::interpolator::BuildOutcome;
use crate::oracle::{GeodesicOracle, OracleNeighbor};
use crate::progress::Progress;
use crate::table::Intertable;
use interp_common::{is_missing, InterpError, InterpResult, Raster};
use std::sync::Arc;
use tracing::info;

/// Target longitudes at or below this value mark invalid cells.
const INVALID_LON: f64 = -1.0e10;

/// Oracle-backed backend for both nearest and inverse-distance modes.
pub struct GribBackend {
    oracle: Arc<dyn GeodesicOracle>,
    gid: i64,
    mode: Mode,
    target_mv: f64,
    source_mv: f64,
}

impl GribBackend {
    pub fn new(oracle: Arc<dyn GeodesicOracle>, options: &InterpolationOptions) -> Self {
        Self {
            oracle,
            gid: options.gid,
            mode: options.mode,
            target_mv: options.target_mv,
            source_mv: options.source_mv,
        }
    }

    /// Walk the target grid, consult the oracle for every valid cell, and
    /// assemble the table plus the interpolated values.
    ///
    /// The oracle is consulted serially: external nearest-point services
    /// are not assumed reentrant, and call order stays deterministic.
    pub fn build(
        &self,
        values: &[f64],
        target_lons: &Raster,
        target_lats: &Raster,
    ) -> InterpResult<BuildOutcome> {
        check_target_shapes(target_lons, target_lats)?;

        let (table, outs) = match self.mode {
            Mode::Nearest => self.build_nearest(target_lons, target_lats),
            Mode::Invdist => self.build_invdist(target_lons, target_lats),
        };
        info!(
            cells = target_lons.len(),
            kept = table.len(),
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

    /// Scatter source values over the surviving target cells of a table.
    pub fn apply(
        &self,
        table: &Intertable,
        values: &[f64],
        target_lons: &Raster,
        target_lats: &Raster,
    ) -> InterpResult<Raster> {
        check_target_shapes(target_lons, target_lats)?;
        match (self.mode, table) {
            (Mode::Nearest, Intertable::GribNearest { xs, ys, idxs }) => {
                self.apply_nearest(xs, ys, idxs, values, target_lons)
            }
            (Mode::Invdist, Intertable::GribInvdist {
                xs,
                ys,
                idxs,
                coeffs,
            }) => self.apply_invdist(xs, ys, idxs, coeffs, values, target_lons),
            _ => Err(InterpError::decode(format!(
                "intertable does not match grib {} apply path",
                self.mode
            ))),
        }
    }

    #[inline]
    fn valid_target(&self, lon: f64) -> bool {
        lon > INVALID_LON && !is_missing(lon, self.target_mv)
    }

    fn build_nearest(&self, target_lons: &Raster, target_lats: &Raster) -> (Intertable, usize) {
        let (rows, cols) = target_lons.shape();
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        let mut idxs = Vec::new();
        let mut outs = 0;
        let mut progress = Progress::new("nearest-neighbor lookup", target_lons.len());

        for row in 0..rows {
            for col in 0..cols {
                progress.tick();
                let lon = target_lons.get(row, col);
                if !self.valid_target(lon) {
                    continue;
                }
                let lat = target_lats.get(row, col);
                match self.oracle.find_nearest(self.gid, lat, lon, 1) {
                    Ok(neighbors) if !neighbors.is_empty() => {
                        xs.push(row as i32);
                        ys.push(col as i32);
                        idxs.push(neighbors[0].index as i32);
                    }
                    _ => outs += 1,
                }
            }
        }
        progress.finish(outs);
        (Intertable::GribNearest { xs, ys, idxs }, outs)
    }

    fn build_invdist(&self, target_lons: &Raster, target_lats: &Raster) -> (Intertable, usize) {
        let (rows, cols) = target_lons.shape();
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        let mut idxs: [Vec<i32>; 4] = Default::default();
        let mut coeffs: [Vec<f64>; 4] = Default::default();
        let mut outs = 0;
        let mut progress = Progress::new("inverse-distance lookup", target_lons.len());

        for row in 0..rows {
            for col in 0..cols {
                progress.tick();
                let lon = target_lons.get(row, col);
                if !self.valid_target(lon) {
                    continue;
                }
                let lat = target_lats.get(row, col);
                match self.oracle.find_nearest(self.gid, lat, lon, 4) {
                    Ok(neighbors) if neighbors.len() == 4 => {
                        let (index_row, coeff_row) = invdist_row(&neighbors);
                        xs.push(row as i32);
                        ys.push(col as i32);
                        for slot in 0..4 {
                            idxs[slot].push(index_row[slot]);
                            coeffs[slot].push(coeff_row[slot]);
                        }
                    }
                    _ => outs += 1,
                }
            }
        }
        progress.finish(outs);
        (
            Intertable::GribInvdist {
                xs,
                ys,
                idxs,
                coeffs,
            },
            outs,
        )
    }

    fn apply_nearest(
        &self,
        xs: &[i32],
        ys: &[i32],
        idxs: &[i32],
        values: &[f64],
        target_lons: &Raster,
    ) -> InterpResult<Raster> {
        if xs.len() != ys.len() || xs.len() != idxs.len() {
            return Err(InterpError::decode("ragged grib intertable"));
        }
        let (rows, cols) = target_lons.shape();
        let mut result = Raster::filled(rows, cols, self.target_mv);

        for k in 0..xs.len() {
            let (row, col) = target_cell(xs[k], ys[k], rows, cols)?;
            let value = values[source_index(idxs[k], values.len())?];
            if !is_missing(value, self.source_mv) {
                result.set(row, col, value);
            }
        }
        Ok(result)
    }

    fn apply_invdist(
        &self,
        xs: &[i32],
        ys: &[i32],
        idxs: &[Vec<i32>; 4],
        coeffs: &[Vec<f64>; 4],
        values: &[f64],
        target_lons: &Raster,
    ) -> InterpResult<Raster> {
        let len = xs.len();
        if ys.len() != len
            || idxs.iter().any(|column| column.len() != len)
            || coeffs.iter().any(|column| column.len() != len)
        {
            return Err(InterpError::decode("ragged grib intertable"));
        }
        let (rows, cols) = target_lons.shape();
        let mut result = Raster::filled(rows, cols, self.target_mv);

        'cells: for k in 0..len {
            let (row, col) = target_cell(xs[k], ys[k], rows, cols)?;
            let mut acc = 0.0;
            for slot in 0..4 {
                let weight = coeffs[slot][k];
                if weight == 0.0 {
                    // Exact-hit padding slot.
                    continue;
                }
                let value = values[source_index(idxs[slot][k], values.len())?];
                if is_missing(value, self.source_mv) {
                    continue 'cells;
                }
                acc += weight * value;
            }
            result.set(row, col, acc);
        }
        Ok(result)
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

fn target_cell(x: i32, y: i32, rows: usize, cols: usize) -> InterpResult<(usize, usize)> {
    if x < 0 || y < 0 || x as usize >= rows || y as usize >= cols {
        return Err(InterpError::shape_mismatch(
            format!("target cells within {rows}x{cols}"),
            format!("table cell ({x}, {y})"),
        ));
    }
    Ok((x as usize, y as usize))
}

fn source_index(index: i32, num_values: usize) -> InterpResult<usize> {
    if index < 0 || index as usize >= num_values {
        return Err(InterpError::decode(
            "intertable index outside the source grid",
        ));
    }
    Ok(index as usize)
}

/// Weights and indexes for one target cell from its four oracle neighbors.
///
/// A zero-distance neighbor is an exact hit: it takes the whole weight and
/// the remaining slots become zero-weight padding.
fn invdist_row(neighbors: &[OracleNeighbor]) -> ([i32; 4], [f64; 4]) {
    if let Some(exact) = neighbors.iter().position(|n| n.distance == 0.0) {
        return (
            [neighbors[exact].index as i32, 0, 0, 0],
            [1.0, 0.0, 0.0, 0.0],
        );
    }

    let mut inverses = [0.0; 4];
    let mut sum = 0.0;
    for (slot, neighbor) in inverses.iter_mut().zip(neighbors) {
        *slot = 1.0 / neighbor.distance;
        sum += *slot;
    }
    let mut coeff_row = [0.0; 4];
    for (coeff, inverse) in coeff_row.iter_mut().zip(inverses) {
        *coeff = inverse / sum;
    }
    let mut index_row = [0i32; 4];
    for (slot, neighbor) in index_row.iter_mut().zip(neighbors) {
        *slot = neighbor.index as i32;
    }
    (index_row, coeff_row)
}
