//! Chunk geometry and voxel-buffer addressing (spec.md §3, §4.2).

use glam::IVec3;

/// Nodes per chunk edge. Matches Minetest's `MAP_BLOCKSIZE`.
pub const BLOCK_SIZE: i32 = 16;

/// Converts the block-coordinate range `(blockpos_min, blockpos_max)`
/// handed to `make_chunk` into the concrete node-space bounds used for
/// addressing.
///
/// Overgeneration is Y-only (spec.md §3: "terrain and 3D noises evaluate
/// y ∈ [node_min.y−1, node_max.y+1]"). `full_node_min`/`full_node_max`
/// add one whole extra `MapBlock` on every side of every axis, but that
/// halo is only ever consumed for blockseed derivation and the
/// liquid/lighting full-volume passes (§4.5 steps 11-12) — never for 2D
/// noise-grid sizing or the terrain write loop, which both work over the
/// plain requested X/Z range (`node_min.x..=node_max.x`,
/// `node_min.z..=node_max.z`), per `mapgen_valleys.cpp`/
/// `mapgen_watershed.cpp`'s own `csize.X`/`csize.Z`-sized noise buffers
/// and `node_min..node_max` write loops. Only Y gets the narrower
/// one-node halo (`terrain_y_min`/`terrain_y_max`), used by the 3D
/// density noise and the per-voxel write loop alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkGeometry {
    pub node_min: IVec3,
    pub node_max: IVec3,
    pub full_node_min: IVec3,
    pub full_node_max: IVec3,
    pub terrain_y_min: i32,
    pub terrain_y_max: i32,
}

impl ChunkGeometry {
    pub fn new(blockpos_min: IVec3, blockpos_max: IVec3) -> Self {
        let node_min = blockpos_min * BLOCK_SIZE;
        let node_max = blockpos_max * BLOCK_SIZE + IVec3::splat(BLOCK_SIZE - 1);
        let full_node_min = (blockpos_min - IVec3::ONE) * BLOCK_SIZE;
        let full_node_max = (blockpos_max + IVec3::splat(2)) * BLOCK_SIZE - IVec3::ONE;
        Self {
            node_min,
            node_max,
            full_node_min,
            full_node_max,
            terrain_y_min: node_min.y - 1,
            terrain_y_max: node_max.y + 1,
        }
    }

    /// Requested-volume size along each axis (no halo).
    pub fn csize(&self) -> IVec3 {
        self.node_max - self.node_min + IVec3::ONE
    }

    /// Full (one-block-halo) volume size along each axis.
    pub fn full_csize(&self) -> IVec3 {
        self.full_node_max - self.full_node_min + IVec3::ONE
    }

    /// X/Z size shared by every 2D `NoiseField` and by the 3D terrain
    /// noise's X/Z extent: the plain requested `csize.X`/`csize.Z`, no
    /// halo (spec.md §4.1: noise grids are sized `sx · sz`/`sx · sy · sz`
    /// over the requested chunk, not the blockseed/liquid halo).
    pub fn sx_sz(&self) -> (usize, usize) {
        let size = self.csize();
        (size.x as usize, size.z as usize)
    }

    /// Y size of the narrower terrain/3D-density halo:
    /// `terrain_y_max - terrain_y_min + 1`.
    pub fn terrain_sy(&self) -> usize {
        (self.terrain_y_max - self.terrain_y_min + 1) as usize
    }

    /// Size of the 3D terrain/density `NoiseField` grid: plain requested
    /// extent in X/Z, narrow one-node halo in Y.
    pub fn sx_sy_sz(&self) -> (usize, usize, usize) {
        let (sx, sz) = self.sx_sz();
        (sx, self.terrain_sy(), sz)
    }

    /// `zstride_1u1d = sx * sy` (spec.md §4.1), the stride used when
    /// indexing a 3D noise buffer shaped like the terrain/density grid
    /// above.
    pub fn zstride_1u1d(&self) -> usize {
        let (sx, sy, _sz) = self.sx_sy_sz();
        sx * sy
    }

    /// Index into a 2D `NoiseField` result buffer filled with origin
    /// `(node_min.x, node_min.z)` (spec.md §4.2 `indexXZ`).
    pub fn index_2d(&self, x: i32, z: i32) -> usize {
        let (sx, _sz) = self.sx_sz();
        (z - self.node_min.z) as usize * sx + (x - self.node_min.x) as usize
    }

    /// Index into a 3D `NoiseField` result buffer filled with origin
    /// `(node_min.x, terrain_y_min, node_min.z)` (spec.md §4.2
    /// `indexXYZ`).
    pub fn index_3d(&self, x: i32, y: i32, z: i32) -> usize {
        let (sx, sy, _sz) = self.sx_sy_sz();
        let rz = (z - self.node_min.z) as usize;
        let ry = (y - self.terrain_y_min) as usize;
        let rx = (x - self.node_min.x) as usize;
        (rz * sy + ry) * sx + rx
    }
}

/// Classic Minetest `VoxelArea` addressing: a dense 3D array with node
/// `(x, y, z)` at linear index `(x - min.x) + (y - min.y) * y_stride +
/// (z - min.z) * z_stride`, X fastest, Y next, Z slowest.
///
/// `VoxelBuffer` implementations expose `min_edge`/`y_stride`/`z_stride`
/// so callers can compute this without the buffer itself exposing raw
/// storage layout (spec.md §3's "dense 3D array addressed by a linear
/// index with provided Y/Z strides").
#[inline]
pub fn voxel_index(min_edge: IVec3, y_stride: i32, z_stride: i32, pos: IVec3) -> i64 {
    let d = pos - min_edge;
    d.x as i64 + d.y as i64 * y_stride as i64 + d.z as i64 * z_stride as i64
}

/// Increment a previously computed `voxel_index` by one step along Y,
/// without recomputing from scratch. Mirrors `VoxelArea::add_y`, used by
/// both generators' innermost per-column write loops.
#[inline]
pub fn voxel_add_y(index: i64, y_stride: i32, steps: i32) -> i64 {
    index + steps as i64 * y_stride as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_has_no_xz_halo_and_a_one_node_halo_in_y() {
        let g = ChunkGeometry::new(IVec3::new(0, 0, 0), IVec3::new(0, 0, 0));
        assert_eq!(g.node_min, IVec3::new(0, 0, 0));
        assert_eq!(g.node_max, IVec3::new(15, 15, 15));
        assert_eq!(g.full_node_min, IVec3::new(-16, -16, -16));
        assert_eq!(g.full_node_max, IVec3::new(31, 31, 31));
        assert_eq!(g.csize(), IVec3::splat(16));
        assert_eq!(g.full_csize(), IVec3::splat(48));
        assert_eq!(g.terrain_y_min, -1);
        assert_eq!(g.terrain_y_max, 16);
        assert_eq!(g.terrain_sy(), 18);
        // Noise grids and the terrain write loop use the plain requested
        // X/Z extent, not the block-halo full_csize.
        assert_eq!(g.sx_sz(), (16, 16));
        assert_eq!(g.sx_sy_sz(), (16, 18, 16));
    }

    #[test]
    fn multi_block_geometry_spans_requested_blocks() {
        let g = ChunkGeometry::new(IVec3::new(-1, 0, 2), IVec3::new(0, 1, 2));
        assert_eq!(g.node_min, IVec3::new(-16, 0, 32));
        assert_eq!(g.node_max, IVec3::new(15, 31, 47));
        assert_eq!(g.csize(), IVec3::new(32, 32, 16));
        assert_eq!(g.terrain_y_min, -1);
        assert_eq!(g.terrain_y_max, 32);
    }

    #[test]
    fn voxel_index_matches_manual_stride_arithmetic() {
        let min = IVec3::new(-1, -1, -1);
        let y_stride = 18;
        let z_stride = 18 * 18;
        let pos = IVec3::new(3, 4, 5);
        let expected = (3 - (-1)) + (4 - (-1)) * y_stride + (5 - (-1)) * z_stride;
        assert_eq!(voxel_index(min, y_stride, z_stride, pos), expected as i64);
    }

    #[test]
    fn voxel_add_y_matches_recomputed_index() {
        let min = IVec3::new(0, 0, 0);
        let y_stride = 18;
        let z_stride = 18 * 18;
        let base = voxel_index(min, y_stride, z_stride, IVec3::new(2, 2, 2));
        let stepped = voxel_add_y(base, y_stride, 5);
        let recomputed = voxel_index(min, y_stride, z_stride, IVec3::new(2, 7, 2));
        assert_eq!(stepped, recomputed);
    }

    #[test]
    fn zstride_1u1d_matches_sx_times_terrain_sy() {
        let g = ChunkGeometry::new(IVec3::new(0, 0, 0), IVec3::new(0, 0, 0));
        let (sx, sy, _sz) = g.sx_sy_sz();
        assert_eq!(sy, g.terrain_sy());
        assert_eq!(g.zstride_1u1d(), sx * sy);
    }
}
