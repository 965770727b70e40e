//! Seeded, octave-composable coherent noise fields.
//!
//! `NoiseField` binds a [`NoiseParams`] value set to a world seed and an
//! expected sample-grid size, and owns the result buffer that
//! `fill_map_2d`/`fill_map_3d` write into. The underlying coherent-noise
//! primitive (single-octave 2D/3D gradient noise) is treated as an
//! external collaborator: it is provided by the `noise` crate's `Perlin`
//! rather than reimplemented here, the octave sum, persistence/lacunarity
//! scaling, and the `EASED`/`ABSVALUE` flags are what this crate owns.

use noise::{NoiseFn, Perlin};

mod params;

pub use params::{NoiseFlags, NoiseParams, Spread};

/// Derive a deterministic 32-bit seed from a world seed and an arbitrary
/// salt. Used both to give each [`NoiseField`] its own independent stream
/// off of a shared world seed (the salt is `NoiseParams::seed`) and, in
/// `mapgen_core`, to derive the per-chunk block seed handed to cave/ore/
/// decoration generators.
///
/// Grounded on `procgen::terrain::deterministic_noise_seed` in the
/// ztancrell-opensst example pack: same shape (wrapping add, multiply by
/// a fixed odd constant, fold the high bits down), adapted to a 64-bit
/// world seed.
#[inline]
pub fn mix_seed(world_seed: i64, salt: i64) -> u32 {
    let seed = world_seed as u64;
    let salt = salt as u64;
    ((seed.wrapping_add(salt))
        .wrapping_mul(0x9e3779b97f4a7c15)
        .wrapping_add(salt.wrapping_mul(0x6c078965))
        >> 32) as u32
}

/// A 2D integer sample origin (x, z), as used by `fill_map_2d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin2 {
    pub x: i32,
    pub z: i32,
}

/// A 3D integer sample origin (x, y, z), as used by `fill_map_3d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin3 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dims {
    TwoD { sx: usize, sz: usize },
    ThreeD { sx: usize, sy: usize, sz: usize },
}

/// A parameter set bound to a world seed and an expected sample-grid
/// size, owning the float buffer that `fill_map_2d`/`fill_map_3d` write
/// into in place.
///
/// The buffer is allocated once at construction and never resized;
/// calling the wrong `fill_map_*`/`eval*` for the dimensionality the
/// field was constructed with is a programmer error and panics, mirroring
/// the teacher's own `panic!`-on-misuse style for setup/usage mistakes
/// (see `Biomes::load`'s validation panics in the teacher workspace).
pub struct NoiseField {
    params: NoiseParams,
    perlin: Perlin,
    dims: Dims,
    result: Vec<f32>,
    last_origin: Option<(i32, i32, i32)>,
}

impl NoiseField {
    fn base(params: NoiseParams, world_seed: i64, dims: Dims, len: usize) -> Self {
        let perlin = Perlin::new(mix_seed(world_seed, params.seed as i64));
        Self {
            params,
            perlin,
            dims,
            result: vec![0.0; len],
            last_origin: None,
        }
    }

    /// Construct a field that will only ever be sampled over 2D grids of
    /// size `sx * sz`.
    pub fn new_2d(params: NoiseParams, world_seed: i64, sx: usize, sz: usize) -> Self {
        Self::base(params, world_seed, Dims::TwoD { sx, sz }, sx * sz)
    }

    /// Construct a field that will only ever be sampled over 3D grids of
    /// size `sx * sy * sz`.
    pub fn new_3d(params: NoiseParams, world_seed: i64, sx: usize, sy: usize, sz: usize) -> Self {
        Self::base(params, world_seed, Dims::ThreeD { sx, sy, sz }, sx * sy * sz)
    }

    pub fn params(&self) -> &NoiseParams {
        &self.params
    }

    /// Last filled result buffer, valid until the next `fill_map_*` call.
    pub fn result(&self) -> &[f32] {
        &self.result
    }

    /// Octave sum at one point, offset and scaled. Does not touch the
    /// result buffer; for one-shot evaluations (spawn search, the CANYONS
    /// 3D rivers recomputation) rather than grid fills.
    pub fn eval2d(&self, x: i32, z: i32) -> f32 {
        self.octave_sum(x as f64, 0.0, z as f64)
    }

    pub fn eval3d(&self, x: i32, y: i32, z: i32) -> f32 {
        self.octave_sum(x as f64, y as f64, z as f64)
    }

    /// Fill the owned result buffer for a 2D grid whose origin is
    /// `origin`. Index `i` corresponds to `(origin.x + i % sx, origin.z +
    /// i / sx)`.
    pub fn fill_map_2d(&mut self, origin: Origin2) {
        let (sx, sz) = match self.dims {
            Dims::TwoD { sx, sz } => (sx, sz),
            Dims::ThreeD { .. } => panic!("fill_map_2d called on a 3D NoiseField"),
        };
        for rz in 0..sz {
            let z = origin.z + rz as i32;
            for rx in 0..sx {
                let x = origin.x + rx as i32;
                let index = rz * sx + rx;
                self.result[index] = self.octave_sum(x as f64, 0.0, z as f64);
            }
        }
        self.last_origin = Some((origin.x, 0, origin.z));
    }

    /// Fill the owned result buffer for a 3D grid whose origin is
    /// `origin`. Index `i` corresponds to `index = ((z - origin.z) * sy +
    /// (y - origin.y)) * sx + (x - origin.x)`, matching
    /// `ChunkGeometry::zstride_1u1d`.
    pub fn fill_map_3d(&mut self, origin: Origin3) {
        let (sx, sy, sz) = match self.dims {
            Dims::ThreeD { sx, sy, sz } => (sx, sy, sz),
            Dims::TwoD { .. } => panic!("fill_map_3d called on a 2D NoiseField"),
        };
        for rz in 0..sz {
            let z = origin.z + rz as i32;
            for ry in 0..sy {
                let y = origin.y + ry as i32;
                for rx in 0..sx {
                    let x = origin.x + rx as i32;
                    let index = (rz * sy + ry) * sx + rx;
                    self.result[index] = self.octave_sum(x as f64, y as f64, z as f64);
                }
            }
        }
        self.last_origin = Some((origin.x, origin.y, origin.z));
    }

    /// The origin of the most recent `fill_map_*` call, or `None` before
    /// the first fill.
    pub fn last_origin(&self) -> Option<(i32, i32, i32)> {
        self.last_origin
    }

    fn octave_sum(&self, x: f64, y: f64, z: f64) -> f32 {
        let p = &self.params;
        let mut freq = 1.0f64;
        let mut amp = 1.0f64;
        let mut sum = 0.0f64;
        for _ in 0..p.octaves.max(1) {
            let nx = x * freq / p.spread.x;
            let ny = y * freq / p.spread.y;
            let nz = z * freq / p.spread.z;
            let mut n = self.perlin.get([nx, ny, nz]);
            if p.flags.contains(NoiseFlags::ABSVALUE) {
                n = n.abs();
            }
            sum += amp * n;
            freq *= p.lacunarity;
            amp *= p.persistence;
        }
        (p.offset + p.scale * sum) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(seed: i32, octaves: u32) -> NoiseParams {
        NoiseParams::new(0.0, 1.0, Spread::uniform(64.0), seed, octaves, 0.5, 2.0)
    }

    #[test]
    fn determinism_same_inputs_same_output() {
        let a = NoiseField::new_2d(params(42, 4), 1234, 4, 4);
        let b = NoiseField::new_2d(params(42, 4), 1234, 4, 4);
        assert_eq!(a.eval2d(10, -3), b.eval2d(10, -3));
    }

    #[test]
    fn different_salts_diverge() {
        let a = NoiseField::new_2d(params(1, 4), 1234, 4, 4);
        let b = NoiseField::new_2d(params(2, 4), 1234, 4, 4);
        assert_ne!(a.eval2d(10, -3), b.eval2d(10, -3));
    }

    #[test]
    fn fill_map_2d_matches_eval_at_every_cell() {
        let mut field = NoiseField::new_2d(params(7, 3), 99, 5, 5);
        let origin = Origin2 { x: -2, z: 3 };
        field.fill_map_2d(origin);
        for rz in 0..5 {
            for rx in 0..5 {
                let expected = field.eval2d(origin.x + rx as i32, origin.z + rz as i32);
                let got = field.result()[rz * 5 + rx];
                assert_eq!(expected, got);
            }
        }
    }

    #[test]
    fn fill_map_3d_matches_zstride_1u1d_layout() {
        let mut field = NoiseField::new_3d(params(3, 2), 55, 3, 4, 2);
        let origin = Origin3 { x: 0, y: -1, z: 0 };
        field.fill_map_3d(origin);
        let sx = 3usize;
        let sy = 4usize;
        // zstride_1u1d = sx * sy
        let index = |x: usize, y: usize, z: usize| (z * sy + y) * sx + x;
        let expected = field.eval3d(1, 1, 1);
        assert_eq!(field.result()[index(1, 2, 1)], expected);
    }

    #[test]
    fn refilling_overwrites_stale_values() {
        let mut field = NoiseField::new_2d(params(11, 2), 20, 3, 3);
        field.fill_map_2d(Origin2 { x: 0, z: 0 });
        let first: Vec<f32> = field.result().to_vec();
        field.fill_map_2d(Origin2 { x: 1000, z: 1000 });
        let second: Vec<f32> = field.result().to_vec();
        assert_ne!(first, second);
        assert_eq!(field.last_origin(), Some((1000, 0, 1000)));
    }

    #[test]
    #[should_panic(expected = "fill_map_3d called on a 2D NoiseField")]
    fn fill_map_3d_on_2d_field_panics() {
        let mut field = NoiseField::new_2d(params(1, 1), 1, 2, 2);
        field.fill_map_3d(Origin3 { x: 0, y: 0, z: 0 });
    }

    #[test]
    fn absvalue_flag_matches_manual_abs_octave_sum() {
        let mut p = params(5, 3);
        p.flags = NoiseFlags::ABSVALUE;
        let field = NoiseField::new_2d(p, 77, 1, 1);
        // The sum of absolute octaves can never be negative when offset
        // is 0 and scale is positive.
        assert!(field.eval2d(17, -9) >= 0.0);
    }
}
