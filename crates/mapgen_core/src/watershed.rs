//! WatershedTerrain (spec.md §4.4, §4.6), cross-checked against
//! `original_source/src/mapgen/mapgen_watershed.cpp`.

use glam::IVec3;
use mapgen_noise::{mix_seed, NoiseField, Origin2, Origin3, Spread};

use crate::collab::VoxelBuffer;
use crate::content::{NodeRegistry, ResolvedContentIds};
use crate::geometry::{voxel_add_y, voxel_index, ChunkGeometry};
use crate::params::{WatershedFlags, WatershedParams};
use crate::MAX_MAP_GENERATION_LIMIT;

/// `128.0`, the unscaled vertical density-gradient span (spec.md §4.4).
const BASE_VERTICAL_SCALE: f32 = 128.0;

fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// The column-constant values computed once per `(x, z)` and reused by
/// every voxel in that column (spec.md §4.4 "Per column composition").
struct ColumnShape {
    n_base_shaped: f32,
    n_valley_sunk: f32,
    n_lowland: f32,
    n_plateau: f32,
    n_plat_select: f32,
    n_plat_sel_coast: f32,
    n_plat_sel_canyon: f32,
    n_vent_shaped: f32,
}

pub struct Watershed {
    world_seed: i64,
    params: WatershedParams,
    content: ResolvedContentIds,
    water_level: i32,
    geometry: ChunkGeometry,
    div: f32,
    vertical_scale: f32,
    base_flat: f32,

    np_vent: NoiseField,
    np_continent: NoiseField,
    np_base: NoiseField,
    np_flat: NoiseField,
    np_river1: NoiseField,
    np_river2a: NoiseField,
    np_river2b: NoiseField,
    np_mountain: NoiseField,
    np_plateau: NoiseField,
    np_plat_select: NoiseField,
    np_3d: NoiseField,
    np_big_dungeon: NoiseField,
}

impl Watershed {
    pub fn new(
        world_seed: i64,
        params: WatershedParams,
        registry: &dyn NodeRegistry,
        water_level: i32,
        blockpos_min: IVec3,
        blockpos_max: IVec3,
    ) -> Self {
        let geometry = ChunkGeometry::new(blockpos_min, blockpos_max);
        let (sx, sz) = geometry.sx_sz();
        let (sx3, sy3, sz3) = geometry.sx_sy_sz();

        let div = params.div();
        let base_flat = (params.flat_y as f32 - params.sea_y as f32) / BASE_VERTICAL_SCALE;
        let vertical_scale = BASE_VERTICAL_SCALE / div;

        let divide_spread = |mut np: mapgen_noise::NoiseParams| -> mapgen_noise::NoiseParams {
            np.spread = Spread::new(np.spread.x / div, np.spread.y / div, np.spread.z / div);
            np
        };

        Self {
            content: ResolvedContentIds::resolve(registry, true),
            np_vent: NoiseField::new_2d(divide_spread(params.np_vent.clone()), world_seed, sx, sz),
            np_continent: NoiseField::new_2d(
                divide_spread(params.np_continent.clone()),
                world_seed,
                sx,
                sz,
            ),
            np_base: NoiseField::new_2d(divide_spread(params.np_base.clone()), world_seed, sx, sz),
            np_flat: NoiseField::new_2d(divide_spread(params.np_flat.clone()), world_seed, sx, sz),
            np_river1: NoiseField::new_2d(
                divide_spread(params.np_river1.clone()),
                world_seed,
                sx,
                sz,
            ),
            np_river2a: NoiseField::new_2d(
                divide_spread(params.np_river2a.clone()),
                world_seed,
                sx,
                sz,
            ),
            np_river2b: NoiseField::new_2d(
                divide_spread(params.np_river2b.clone()),
                world_seed,
                sx,
                sz,
            ),
            np_mountain: NoiseField::new_2d(
                divide_spread(params.np_mountain.clone()),
                world_seed,
                sx,
                sz,
            ),
            np_plateau: NoiseField::new_2d(
                divide_spread(params.np_plateau.clone()),
                world_seed,
                sx,
                sz,
            ),
            np_plat_select: NoiseField::new_2d(
                divide_spread(params.np_plat_select.clone()),
                world_seed,
                sx,
                sz,
            ),
            np_3d: NoiseField::new_3d(
                divide_spread(params.np_3d.clone()),
                world_seed,
                sx3,
                sy3,
                sz3,
            ),
            np_big_dungeon: NoiseField::new_3d(params.np_big_dungeon.clone(), world_seed, 1, 1, 1),
            world_seed,
            params,
            water_level,
            geometry,
            div,
            vertical_scale,
            base_flat,
        }
    }

    pub fn content(&self) -> &ResolvedContentIds {
        &self.content
    }

    pub fn water_level(&self) -> i32 {
        self.water_level
    }

    pub fn params(&self) -> &WatershedParams {
        &self.params
    }

    pub fn geometry(&self) -> ChunkGeometry {
        self.geometry
    }

    /// `div == 1` gates every post-terrain pass (spec.md §4.5, §8
    /// "Watershed scaled mode").
    pub fn post_terrain_enabled(&self) -> bool {
        self.div == 1.0
    }

    pub fn block_seed(&self, full_node_min: IVec3) -> u32 {
        let salt = (full_node_min.x as i64)
            ^ ((full_node_min.y as i64) << 16)
            ^ ((full_node_min.z as i64) << 32);
        mix_seed(self.world_seed, salt)
    }

    /// One-shot evaluation of `np_big_dungeon` at a single 3D point, for
    /// the big-dungeon-branch gate in `mapgen_core::pipeline` (spec.md
    /// §4.5 "evaluate np_big_dungeon at node_min").
    pub fn big_dungeon_noise(&self, p: IVec3) -> f32 {
        self.np_big_dungeon.eval3d(p.x, p.y, p.z)
    }

    fn column_shape(&self, x: i32, z: i32) -> ColumnShape {
        let n_continent =
            self.params.continent_area + self.np_continent.eval2d(x, z).abs() * 2.0;
        let n_cont_tanh = (n_continent * 4.0).tanh();
        let n_base = self.np_base.eval2d(x, z);
        let n_tbase = n_cont_tanh * 0.6 + n_base - 0.2;

        let n_flat = self.np_flat.eval2d(x, z).max(0.0);
        let n_base_shaped = if n_tbase < self.base_flat {
            self.base_flat - (self.base_flat - n_tbase) * 0.2
        } else if n_tbase > self.base_flat + n_flat {
            self.base_flat + (n_tbase - (self.base_flat + n_flat)).powf(1.5) * 1.4
        } else {
            self.base_flat
        };

        let n_river1 = self.np_river1.eval2d(x, z);
        let n_river2 = if n_river1 > 0.0 {
            self.np_river2a.eval2d(x, z)
        } else {
            self.np_river2b.eval2d(x, z)
        };
        let sink = (0.8 - n_base_shaped) * self.params.river_width;
        let n_valley1_sunk = n_river1.abs() - sink;
        let n_valley2_sunk = n_river2.abs() - sink;
        let verp = ((n_valley2_sunk - n_valley1_sunk) * 16.0).tanh() * 0.5 + 0.5;
        let n_valley_sunk = verp * n_valley1_sunk + (1.0 - verp) * n_valley2_sunk;

        let n_valley_shaped = if n_valley_sunk > 0.0 {
            let blend = (n_tbase - (self.base_flat + n_flat)) / 0.3;
            let amp = if blend <= 0.0 {
                0.0
            } else if blend >= 1.0 {
                1.0
            } else {
                smoothstep(blend)
            };
            n_valley_sunk.powf(1.5) * amp * 0.5
        } else {
            let rd = if n_base_shaped < 0.0 {
                (self.params.river_depth + n_base_shaped * 4.0).max(0.0)
            } else {
                self.params.river_depth
            };
            -(-n_valley_sunk).sqrt() * rd
        };

        let n_mount_amp = n_base_shaped - 0.8;
        let n_mount = if n_mount_amp > 0.0 {
            self.np_mountain.eval2d(x, z) * n_mount_amp * n_mount_amp
        } else {
            -1000.0
        };

        let n_lowland = n_base_shaped + n_valley_shaped.max(n_mount);
        let n_plateau = self.np_plateau.eval2d(x, z).max(n_lowland);
        let n_plat_select = self.np_plat_select.eval2d(x, z);
        let n_plat_sel_coast = (n_tbase + 0.1) * 16.0;
        let n_plat_sel_canyon = if n_valley_sunk > 0.0 {
            n_base_shaped + n_valley_sunk.powi(3) * 1024.0
        } else {
            -1000.0
        };

        let n_vent = self.np_vent.eval2d(x, z);
        let n_vent_shaped = n_vent - (1.5 - n_tbase).max(0.0).powi(2);

        ColumnShape {
            n_base_shaped,
            n_valley_sunk,
            n_lowland,
            n_plateau,
            n_plat_select,
            n_plat_sel_coast,
            n_plat_sel_canyon,
            n_vent_shaped,
        }
    }

    fn density_grad(&self, y: i32) -> f32 {
        (self.params.sea_y as f32 - y as f32) / self.vertical_scale
    }

    /// generateTerrain() → stone_max_y (spec.md §4.4).
    pub fn generate_terrain(&mut self, buffer: &mut dyn VoxelBuffer) -> i32 {
        let geometry = self.geometry;
        let origin2 = Origin2 {
            x: geometry.node_min.x,
            z: geometry.node_min.z,
        };
        self.np_continent.fill_map_2d(origin2);
        self.np_base.fill_map_2d(origin2);
        self.np_flat.fill_map_2d(origin2);
        self.np_river1.fill_map_2d(origin2);
        self.np_river2a.fill_map_2d(origin2);
        self.np_river2b.fill_map_2d(origin2);
        self.np_mountain.fill_map_2d(origin2);
        self.np_plateau.fill_map_2d(origin2);
        self.np_plat_select.fill_map_2d(origin2);
        self.np_vent.fill_map_2d(origin2);
        self.np_3d.fill_map_3d(Origin3 {
            x: geometry.node_min.x,
            y: geometry.terrain_y_min,
            z: geometry.node_min.z,
        });

        let density_grad: Vec<f32> = (geometry.terrain_y_min..=geometry.terrain_y_max)
            .map(|y| self.density_grad(y))
            .collect();

        let mut stone_max_y = -MAX_MAP_GENERATION_LIMIT;
        let y_stride = buffer.y_stride();
        let z_stride = buffer.z_stride();
        let min_edge = buffer.min_edge();
        let vents = self.params.flags.contains(WatershedFlags::VENTS);

        for z in geometry.node_min.z..=geometry.node_max.z {
            for x in geometry.node_min.x..=geometry.node_max.x {
                let shape = self.column_shape(x, z);
                let base_pos = voxel_index(
                    min_edge,
                    y_stride,
                    z_stride,
                    IVec3::new(x, geometry.terrain_y_min, z),
                );
                let mut index = base_pos;

                for (i, y) in (geometry.terrain_y_min..=geometry.terrain_y_max).enumerate() {
                    let existing = buffer.get(index);
                    if !existing.is_ignore() {
                        index = voxel_add_y(index, y_stride, 1);
                        continue;
                    }

                    let idx3 = geometry.index_3d(x, y, z);
                    let n_3d = self.np_3d.result()[idx3];
                    let n_select =
                        shape.n_plat_select.min(shape.n_plat_sel_coast) + n_3d * 2.0;
                    let n_select = n_select.min(shape.n_plat_sel_canyon);
                    let n_terrain = n_select.clamp(shape.n_lowland, shape.n_plateau);

                    let grad = density_grad[i];
                    let density = n_terrain + grad;
                    let dens_base = shape.n_base_shaped + grad;

                    if density >= 0.0 {
                        let vent_wall = 0.05 + n_3d.abs() * 0.05;
                        if vents && shape.n_vent_shaped >= -vent_wall {
                            if shape.n_vent_shaped > 0.0 {
                                if dens_base >= 0.0 {
                                    buffer.set(index, self.content.c_lava);
                                } else {
                                    buffer.set(index, crate::content::ContentId::AIR);
                                }
                            } else {
                                let cone = (shape.n_vent_shaped + vent_wall) / vent_wall * 0.2;
                                if density >= cone {
                                    buffer.set(index, self.content.c_volcanic_rock);
                                } else {
                                    buffer.set(index, crate::content::ContentId::AIR);
                                }
                            }
                        } else {
                            buffer.set(index, self.content.c_stone);
                            if y > stone_max_y {
                                stone_max_y = y;
                            }
                        }
                    } else if y <= self.water_level {
                        buffer.set(index, self.content.c_water);
                    } else if dens_base >= self.params.river_bank {
                        buffer.set(index, self.content.c_river_water);
                    } else {
                        buffer.set(index, crate::content::ContentId::AIR);
                    }

                    index = voxel_add_y(index, y_stride, 1);
                }
            }
        }

        stone_max_y
    }

    /// getSpawnLevelAtPoint(p) → y (spec.md §4.6): fixed `water_level +
    /// 64` for Watershed.
    pub fn spawn_level_at_point(&self, _x: i32, _z: i32) -> i32 {
        self.water_level + 64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeRegistry;
    impl NodeRegistry for FakeRegistry {
        fn resolve(&self, name: &str) -> crate::content::ContentId {
            use crate::content::ContentId;
            match name {
                "mapgen_stone" => ContentId(1),
                "mapgen_water_source" => ContentId(2),
                "mapgen_river_water_source" => ContentId(3),
                "mapgen_lava_source" => ContentId(4),
                "mapgen_volcanic_rock" => ContentId(5),
                _ => ContentId::IGNORE,
            }
        }
    }

    struct FakeBuffer {
        min_edge: IVec3,
        y_stride: i32,
        z_stride: i32,
        cells: HashMap<i64, crate::content::ContentId>,
    }

    impl FakeBuffer {
        fn new(geometry: &ChunkGeometry) -> Self {
            let size = geometry.full_csize();
            Self {
                min_edge: geometry.full_node_min,
                y_stride: size.x,
                z_stride: size.x * size.y,
                cells: HashMap::new(),
            }
        }
    }

    impl VoxelBuffer for FakeBuffer {
        fn min_edge(&self) -> IVec3 {
            self.min_edge
        }
        fn y_stride(&self) -> i32 {
            self.y_stride
        }
        fn z_stride(&self) -> i32 {
            self.z_stride
        }
        fn get(&self, index: i64) -> crate::content::ContentId {
            self.cells
                .get(&index)
                .copied()
                .unwrap_or(crate::content::ContentId::IGNORE)
        }
        fn set(&mut self, index: i64, id: crate::content::ContentId) {
            self.cells.insert(index, id);
        }
    }

    fn make_watershed(seed: i64, map_scale: f32) -> Watershed {
        let mut params = WatershedParams::default();
        params.map_scale = map_scale;
        Watershed::new(
            seed,
            params,
            &FakeRegistry,
            1,
            IVec3::new(-32, -2, -32),
            IVec3::new(32, 1, 32),
        )
    }

    #[test]
    fn generate_terrain_is_deterministic() {
        let mut a = make_watershed(1, 1.0);
        let mut b = make_watershed(1, 1.0);
        let geometry = a.geometry();
        let mut buf_a = FakeBuffer::new(&geometry);
        let mut buf_b = FakeBuffer::new(&geometry);

        let stone_a = a.generate_terrain(&mut buf_a);
        let stone_b = b.generate_terrain(&mut buf_b);

        assert_eq!(stone_a, stone_b);
        for (idx, content) in &buf_a.cells {
            assert_eq!(buf_b.cells.get(idx), Some(content));
        }
    }

    #[test]
    fn scaled_mode_halves_vertical_scale_and_spreads() {
        let scaled = make_watershed(1, 2.0);
        assert_eq!(scaled.div, 2.0);
        assert_eq!(scaled.vertical_scale, 64.0);
        assert!(!scaled.post_terrain_enabled());

        let unscaled = make_watershed(1, 1.0);
        assert!(unscaled.post_terrain_enabled());
    }

    #[test]
    fn no_river_water_when_dens_base_below_river_bank() {
        let mut w = make_watershed(99, 1.0);
        let geometry = w.geometry();
        let mut buf = FakeBuffer::new(&geometry);
        w.generate_terrain(&mut buf);
        for content in buf.cells.values() {
            if *content == w.content.c_river_water {
                // presence alone is fine; this asserts the branch is at
                // least reachable without panicking on malformed state
                assert_ne!(*content, w.content.c_lava);
            }
        }
    }

    #[test]
    fn spawn_level_is_fixed_water_level_plus_64() {
        let w = make_watershed(1, 1.0);
        assert_eq!(w.spawn_level_at_point(10, 10), w.water_level() + 64);
    }
}
