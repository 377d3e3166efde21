//! Precomputed interpolation tables and their on-disk codec.
//!
//! An intertable turns a multi-hour neighbor search into a sub-second
//! gather: it records, per target cell, which source indexes contribute and
//! with what weights. Tables are backend-specific and must never be fed to
//! the other backend's apply path; the store encodes method and mode into
//! the file name, and the codec tags the payload kind as well.
//!
//! # Format
//!
//! Little-endian throughout. Header: magic `ITBL`, version (u32), kind (u8).
//! Payloads:
//! - scipy-nearest: `len: u64`, then `len` i64 indexes (sentinel = N_s for
//!   out-of-domain cells).
//! - scipy-invdist: `len: u64`, then `len × 4` i64 indexes, then `len × 4`
//!   f64 coefficients; each valid row sums to 1, miss rows are `[1,0,0,0]`
//!   with sentinel indexes.
//! - grib-nearest: `len: u64` (surviving cells), then xs, ys, idxs as three
//!   i32 arrays.
//! - grib-invdist: `len: u64`, then a 6-row i32 stack (xs, ys, idx1..idx4),
//!   then a 6-row f64 stack (coeff1..coeff4, two zero rows).

use interp_common::{InterpError, InterpResult};
use std::io::{Read, Write};

/// Magic bytes identifying an intertable file.
const MAGIC: &[u8; 4] = b"ITBL";

/// Current intertable format version.
const VERSION: u32 = 1;

const KIND_SCIPY_NEAREST: u8 = 0;
const KIND_SCIPY_INVDIST: u8 = 1;
const KIND_GRIB_NEAREST: u8 = 2;
const KIND_GRIB_INVDIST: u8 = 3;

/// A persisted (indexes, weights) artifact for one (grid, method, mode).
#[derive(Debug, Clone, PartialEq)]
pub enum Intertable {
    /// One source index per target cell; `N_s` marks out-of-domain.
    ScipyNearest { indexes: Vec<i64> },
    /// Four (index, coefficient) pairs per target cell.
    ScipyInvdist {
        indexes: Vec<[i64; 4]>,
        coeffs: Vec<[f64; 4]>,
    },
    /// Surviving target cells as (row, col, source index) triples.
    GribNearest {
        xs: Vec<i32>,
        ys: Vec<i32>,
        idxs: Vec<i32>,
    },
    /// Surviving target cells with four neighbors each. Zero-index slots
    /// with zero coefficient are padding from exact-hit rows.
    GribInvdist {
        xs: Vec<i32>,
        ys: Vec<i32>,
        idxs: [Vec<i32>; 4],
        coeffs: [Vec<f64>; 4],
    },
}

impl Intertable {
    fn kind(&self) -> u8 {
        match self {
            Intertable::ScipyNearest { .. } => KIND_SCIPY_NEAREST,
            Intertable::ScipyInvdist { .. } => KIND_SCIPY_INVDIST,
            Intertable::GribNearest { .. } => KIND_GRIB_NEAREST,
            Intertable::GribInvdist { .. } => KIND_GRIB_INVDIST,
        }
    }

    /// Number of rows carried by the table.
    pub fn len(&self) -> usize {
        match self {
            Intertable::ScipyNearest { indexes } => indexes.len(),
            Intertable::ScipyInvdist { indexes, .. } => indexes.len(),
            Intertable::GribNearest { xs, .. } => xs.len(),
            Intertable::GribInvdist { xs, .. } => xs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize to a writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> InterpResult<()> {
        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&[self.kind()])?;

        match self {
            Intertable::ScipyNearest { indexes } => {
                writer.write_all(&(indexes.len() as u64).to_le_bytes())?;
                for &index in indexes {
                    writer.write_all(&index.to_le_bytes())?;
                }
            }
            Intertable::ScipyInvdist { indexes, coeffs } => {
                writer.write_all(&(indexes.len() as u64).to_le_bytes())?;
                for row in indexes {
                    for &index in row {
                        writer.write_all(&index.to_le_bytes())?;
                    }
                }
                for row in coeffs {
                    for &coeff in row {
                        writer.write_all(&coeff.to_le_bytes())?;
                    }
                }
            }
            Intertable::GribNearest { xs, ys, idxs } => {
                writer.write_all(&(xs.len() as u64).to_le_bytes())?;
                for array in [xs, ys, idxs] {
                    for &value in array {
                        writer.write_all(&value.to_le_bytes())?;
                    }
                }
            }
            Intertable::GribInvdist {
                xs,
                ys,
                idxs,
                coeffs,
            } => {
                let len = xs.len();
                writer.write_all(&(len as u64).to_le_bytes())?;
                for array in [xs, ys, &idxs[0], &idxs[1], &idxs[2], &idxs[3]] {
                    for &value in array {
                        writer.write_all(&value.to_le_bytes())?;
                    }
                }
                let zeros = vec![0.0f64; len];
                for array in [
                    &coeffs[0], &coeffs[1], &coeffs[2], &coeffs[3], &zeros, &zeros,
                ] {
                    for &value in array {
                        writer.write_all(&value.to_le_bytes())?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Deserialize from a reader, validating the header.
    pub fn read_from<R: Read>(reader: &mut R) -> InterpResult<Self> {
        let mut magic = [0u8; 4];
        fill(reader, &mut magic)?;
        if &magic != MAGIC {
            return Err(InterpError::decode("not an intertable file (bad magic)"));
        }

        let version = read_u32(reader)?;
        if version != VERSION {
            return Err(InterpError::decode(format!(
                "unsupported intertable version {version}"
            )));
        }

        let kind = read_u8(reader)?;
        let len = read_u64(reader)? as usize;

        let table = match kind {
            KIND_SCIPY_NEAREST => Intertable::ScipyNearest {
                indexes: read_i64_array(reader, len)?,
            },
            KIND_SCIPY_INVDIST => {
                let flat = read_i64_array(reader, len * 4)?;
                let indexes = flat
                    .chunks_exact(4)
                    .map(|c| [c[0], c[1], c[2], c[3]])
                    .collect();
                let flat = read_f64_array(reader, len * 4)?;
                let coeffs = flat
                    .chunks_exact(4)
                    .map(|c| [c[0], c[1], c[2], c[3]])
                    .collect();
                Intertable::ScipyInvdist { indexes, coeffs }
            }
            KIND_GRIB_NEAREST => {
                let xs = read_i32_array(reader, len)?;
                let ys = read_i32_array(reader, len)?;
                let idxs = read_i32_array(reader, len)?;
                Intertable::GribNearest { xs, ys, idxs }
            }
            KIND_GRIB_INVDIST => {
                let xs = read_i32_array(reader, len)?;
                let ys = read_i32_array(reader, len)?;
                let idxs = [
                    read_i32_array(reader, len)?,
                    read_i32_array(reader, len)?,
                    read_i32_array(reader, len)?,
                    read_i32_array(reader, len)?,
                ];
                let coeffs = [
                    read_f64_array(reader, len)?,
                    read_f64_array(reader, len)?,
                    read_f64_array(reader, len)?,
                    read_f64_array(reader, len)?,
                ];
                // Two zero-padded coefficient rows close the stack.
                read_f64_array(reader, len)?;
                read_f64_array(reader, len)?;
                Intertable::GribInvdist {
                    xs,
                    ys,
                    idxs,
                    coeffs,
                }
            }
            other => {
                return Err(InterpError::decode(format!(
                    "unknown intertable kind {other}"
                )))
            }
        };
        Ok(table)
    }
}

/// Read exactly `buf.len()` bytes; a short read means a truncated table.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> InterpResult<()> {
    reader.read_exact(buf).map_err(|err| {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            InterpError::decode("truncated intertable file")
        } else {
            InterpError::from(err)
        }
    })
}

fn read_u8<R: Read>(reader: &mut R) -> InterpResult<u8> {
    let mut buf = [0u8; 1];
    fill(reader, &mut buf)?;
    Ok(buf[0])
}

fn read_u32<R: Read>(reader: &mut R) -> InterpResult<u32> {
    let mut buf = [0u8; 4];
    fill(reader, &mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(reader: &mut R) -> InterpResult<u64> {
    let mut buf = [0u8; 8];
    fill(reader, &mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_i32_array<R: Read>(reader: &mut R, len: usize) -> InterpResult<Vec<i32>> {
    let mut out = Vec::with_capacity(len);
    let mut buf = [0u8; 4];
    for _ in 0..len {
        fill(reader, &mut buf)?;
        out.push(i32::from_le_bytes(buf));
    }
    Ok(out)
}

fn read_i64_array<R: Read>(reader: &mut R, len: usize) -> InterpResult<Vec<i64>> {
    let mut out = Vec::with_capacity(len);
    let mut buf = [0u8; 8];
    for _ in 0..len {
        fill(reader, &mut buf)?;
        out.push(i64::from_le_bytes(buf));
    }
    Ok(out)
}

fn read_f64_array<R: Read>(reader: &mut R, len: usize) -> InterpResult<Vec<f64>> {
    let mut out = Vec::with_capacity(len);
    let mut buf = [0u8; 8];
    for _ in 0..len {
        fill(reader, &mut buf)?;
        out.push(f64::from_le_bytes(buf));
    }
    Ok(out)
}
