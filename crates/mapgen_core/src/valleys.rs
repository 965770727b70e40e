//! ValleysTerrain (spec.md §4.3, §4.6), cross-checked against
//! `original_source/src/mapgen/mapgen_valleys.cpp`.

use glam::IVec3;
use mapgen_noise::{mix_seed, NoiseField, Origin2, Origin3};

use crate::collab::BiomeGenerator;
use crate::content::{NodeRegistry, ResolvedContentIds};
use crate::geometry::{voxel_add_y, voxel_index, ChunkGeometry};
use crate::params::{ValleysFlags, ValleysParams};
use crate::MAX_MAP_GENERATION_LIMIT;

use crate::collab::VoxelBuffer;

/// Holds the rivers noise field in either its 2D or 3D form, since
/// `ValleysFlags::CANYONS` decides at construction time which one this
/// generator instance owns (spec.md §4.3 "If CANYONS set, rivers is
/// also 3D").
enum RiversField {
    TwoD(NoiseField),
    ThreeD(NoiseField),
}

impl RiversField {
    fn eval2d(&self, x: i32, z: i32) -> f32 {
        match self {
            RiversField::TwoD(f) => f.eval2d(x, z),
            RiversField::ThreeD(f) => f.eval2d(x, z),
        }
    }

    fn is_canyons(&self) -> bool {
        matches!(self, RiversField::ThreeD(_))
    }

    /// Read back a value already written by `fill`, indexed the same way
    /// `ChunkGeometry::index_3d` addresses `np_inter_valley_fill` — used
    /// by the CANYONS per-voxel recompute so it doesn't re-run the octave
    /// sum a second time for every voxel in the column.
    fn result3d(&self, idx3: usize) -> f32 {
        match self {
            RiversField::ThreeD(f) => f.result()[idx3],
            RiversField::TwoD(_) => panic!("result3d called on a 2D rivers field"),
        }
    }

    fn fill(&mut self, geometry: &ChunkGeometry) {
        match self {
            RiversField::TwoD(f) => f.fill_map_2d(Origin2 {
                x: geometry.node_min.x,
                z: geometry.node_min.z,
            }),
            RiversField::ThreeD(f) => f.fill_map_3d(Origin3 {
                x: geometry.node_min.x,
                y: geometry.terrain_y_min,
                z: geometry.node_min.z,
            }),
        }
    }
}

/// The result of `column_shape`: the 2D terrain shape at a given
/// (x, z, y) triple (y only matters for the CANYONS path).
struct ColumnShape {
    surface_y: f32,
    slope: f32,
    river_y: f32,
    base: f32,
}

pub struct Valleys {
    world_seed: i64,
    params: ValleysParams,
    content: ResolvedContentIds,
    water_level: i32,
    geometry: ChunkGeometry,

    np_filler_depth: NoiseField,
    np_inter_valley_fill: NoiseField,
    np_inter_valley_slope: NoiseField,
    np_rivers: RiversField,
    np_terrain_height: NoiseField,
    np_valley_depth: NoiseField,
    np_valley_profile: NoiseField,
}

impl Valleys {
    pub fn new(
        world_seed: i64,
        params: ValleysParams,
        registry: &dyn NodeRegistry,
        water_level: i32,
        blockpos_min: IVec3,
        blockpos_max: IVec3,
    ) -> Self {
        let geometry = ChunkGeometry::new(blockpos_min, blockpos_max);
        let (sx, sz) = geometry.sx_sz();
        let (sx3, sy3, sz3) = geometry.sx_sy_sz();

        let np_rivers = if params.flags.contains(ValleysFlags::CANYONS) {
            let mut np = params.np_rivers.clone();
            np.spread.y = np.spread.z;
            RiversField::ThreeD(NoiseField::new_3d(np, world_seed, sx3, sy3, sz3))
        } else {
            RiversField::TwoD(NoiseField::new_2d(
                params.np_rivers.clone(),
                world_seed,
                sx,
                sz,
            ))
        };

        Self {
            content: ResolvedContentIds::resolve(registry, false),
            np_filler_depth: NoiseField::new_2d(params.np_filler_depth.clone(), world_seed, sx, sz),
            np_inter_valley_fill: NoiseField::new_3d(
                params.np_inter_valley_fill.clone(),
                world_seed,
                sx3,
                sy3,
                sz3,
            ),
            np_inter_valley_slope: NoiseField::new_2d(
                params.np_inter_valley_slope.clone(),
                world_seed,
                sx,
                sz,
            ),
            np_rivers,
            np_terrain_height: NoiseField::new_2d(
                params.np_terrain_height.clone(),
                world_seed,
                sx,
                sz,
            ),
            np_valley_depth: NoiseField::new_2d(params.np_valley_depth.clone(), world_seed, sx, sz),
            np_valley_profile: NoiseField::new_2d(
                params.np_valley_profile.clone(),
                world_seed,
                sx,
                sz,
            ),
            world_seed,
            params,
            water_level,
            geometry,
        }
    }

    pub fn content(&self) -> &ResolvedContentIds {
        &self.content
    }

    pub fn water_level(&self) -> i32 {
        self.water_level
    }

    pub fn params(&self) -> &ValleysParams {
        &self.params
    }

    pub fn geometry(&self) -> ChunkGeometry {
        self.geometry
    }

    /// The filler-depth noise value at a column, for `BiomeGenerator`'s
    /// use when deciding how many filler nodes to place beneath the top
    /// layer (spec.md §4.3 lists `filler_depth` among the fields filled
    /// per chunk but the terrain density formulas never consume it
    /// directly — it exists for the biome pass).
    pub fn filler_depth_at(&self, x: i32, z: i32) -> f32 {
        self.np_filler_depth.result()[self.geometry.index_2d(x, z)]
    }

    /// `BlockSeed` derivation (spec.md §3): mixed from the chunk's
    /// overgenerated minimum corner and the world seed.
    pub fn block_seed(&self, full_node_min: IVec3) -> u32 {
        let salt = (full_node_min.x as i64)
            ^ ((full_node_min.y as i64) << 16)
            ^ ((full_node_min.z as i64) << 32);
        mix_seed(self.world_seed, salt)
    }

    fn river_raw_2d(&self, x: i32, z: i32) -> f32 {
        self.np_rivers.eval2d(x, z)
    }

    /// `clamp_slope` matches the original's distinction between the
    /// once-per-column 2D computation (`slope = n_slope * max(valley_h,
    /// 0)`) and the CANYONS per-voxel recompute, which the original
    /// leaves unclamped (`slope = n_slope * valley_h`).
    #[allow(clippy::too_many_arguments)]
    fn column_shape(
        &self,
        n_slope: f32,
        n_th: f32,
        n_vd: f32,
        n_vp: f32,
        river_raw: f32,
        heat: f32,
        humid: f32,
        clamp_slope: bool,
    ) -> ColumnShape {
        let valley_d = n_vd * n_vd;
        let base = n_th + valley_d;
        let valley_h = Self::valley_height(
            river_raw,
            valley_d,
            n_vp,
            self.params.river_size_factor(),
            self.params.river_depth_bed(),
        );
        let mut surface_y = base + valley_h;
        let wl = self.water_level as f32;
        if valley_h < 0.0 && surface_y < wl - 3.0 {
            surface_y = base.min(wl - 3.0);
        }
        let slope = n_slope * if clamp_slope { valley_h.max(0.0) } else { valley_h };
        let mut river_y = base - 1.0;

        if self.params.flags.contains(ValleysFlags::VARY_RIVER_DEPTH) {
            let delta = humid - 50.0;
            if delta < 0.0 {
                let altitude_chill = self.params.altitude_chill as f32;
                let heat_eff = if self.params.flags.contains(ValleysFlags::ALT_CHILL) {
                    heat + 5.0 - (base - wl) * 20.0 / altitude_chill
                } else {
                    heat
                };
                river_y += delta * ((heat_eff - 32.0) / 300.0).max(0.08);
            }
        }

        ColumnShape {
            surface_y,
            slope,
            river_y,
            base,
        }
    }

    fn valley_height(river_raw: f32, valley_d: f32, n_vp: f32, river_size_factor: f32, river_depth_bed: f32) -> f32 {
        let river = river_raw.abs() - river_size_factor;
        if river > 0.0 {
            let tv = (river / n_vp).max(0.0);
            valley_d * (1.0 - (-(tv * tv)).exp())
        } else {
            let tr = (river / river_size_factor + 1.0).clamp(-1.0, 1.0);
            -river_depth_bed * (1.0 - tr * tr).max(0.0).sqrt()
        }
    }

    /// generateTerrain() → highest_stone_y (spec.md §4.3).
    pub fn generate_terrain(
        &mut self,
        buffer: &mut dyn VoxelBuffer,
        biomes: &mut dyn BiomeGenerator,
    ) -> i32 {
        let geometry = self.geometry;
        self.np_filler_depth.fill_map_2d(Origin2 {
            x: geometry.node_min.x,
            z: geometry.node_min.z,
        });
        self.np_inter_valley_slope.fill_map_2d(Origin2 {
            x: geometry.node_min.x,
            z: geometry.node_min.z,
        });
        self.np_terrain_height.fill_map_2d(Origin2 {
            x: geometry.node_min.x,
            z: geometry.node_min.z,
        });
        self.np_valley_depth.fill_map_2d(Origin2 {
            x: geometry.node_min.x,
            z: geometry.node_min.z,
        });
        self.np_valley_profile.fill_map_2d(Origin2 {
            x: geometry.node_min.x,
            z: geometry.node_min.z,
        });
        self.np_inter_valley_fill.fill_map_3d(Origin3 {
            x: geometry.node_min.x,
            y: geometry.terrain_y_min,
            z: geometry.node_min.z,
        });
        self.np_rivers.fill(&geometry);

        let mut highest_stone_y = -MAX_MAP_GENERATION_LIMIT;
        let y_stride = buffer.y_stride();
        let z_stride = buffer.z_stride();
        let min_edge = buffer.min_edge();

        for z in geometry.node_min.z..=geometry.node_max.z {
            for x in geometry.node_min.x..=geometry.node_max.x {
                let idx2 = geometry.index_2d(x, z);
                let n_slope = self.np_inter_valley_slope.result()[idx2];
                let n_th = self.np_terrain_height.result()[idx2];
                let n_vd = self.np_valley_depth.result()[idx2];
                let n_vp = self.np_valley_profile.result()[idx2];
                let river_raw_2d = self.river_raw_2d(x, z);
                let heat = biomes.heat(x, z);
                let humid = biomes.humidity(x, z);

                let shape2d = if !self.np_rivers.is_canyons() {
                    Some(self.column_shape(
                        n_slope, n_th, n_vd, n_vp, river_raw_2d, heat, humid, true,
                    ))
                } else {
                    None
                };

                let base_pos = voxel_index(min_edge, y_stride, z_stride, IVec3::new(x, geometry.terrain_y_min, z));
                let mut index = base_pos;
                // Matches the original's `column_max_y = surface_y` seed:
                // the default (pre-loop) surface_y for non-CANYONS, or
                // `base` for CANYONS (whose surface_y is only set inside
                // the loop).
                let default_surface_y = shape2d.as_ref().map(|s| s.surface_y).unwrap_or(n_th + n_vd * n_vd);
                let mut column_max_y = default_surface_y as i32;
                let mut base_for_post = shape2d.as_ref().map(|s| s.base).unwrap_or(n_th + n_vd * n_vd);

                for y in geometry.terrain_y_min..=geometry.terrain_y_max {
                    let existing = buffer.get(index);
                    if !existing.is_ignore() {
                        index = voxel_add_y(index, y_stride, 1);
                        continue;
                    }

                    let idx3 = geometry.index_3d(x, y, z);
                    let shape = match &shape2d {
                        Some(s) => ColumnShape {
                            surface_y: s.surface_y,
                            slope: s.slope,
                            river_y: s.river_y,
                            base: s.base,
                        },
                        None => {
                            let river_raw_3d = self.np_rivers.result3d(idx3);
                            self.column_shape(
                                n_slope, n_th, n_vd, n_vp, river_raw_3d, heat, humid, false,
                            )
                        }
                    };
                    base_for_post = shape.base;

                    let n_fill = self.np_inter_valley_fill.result()[idx3];
                    let density = shape.slope * n_fill - (y as f32 - shape.surface_y);

                    if density > 0.0 {
                        buffer.set(index, self.content.c_stone);
                        if y > highest_stone_y {
                            highest_stone_y = y;
                        }
                        if y > column_max_y {
                            column_max_y = y;
                        }
                    } else if y <= self.water_level {
                        buffer.set(index, self.content.c_water);
                    } else if (y as f32) <= shape.river_y {
                        buffer.set(index, self.content.c_river_water);
                    } else {
                        buffer.set(index, crate::content::ContentId::AIR);
                    }

                    index = voxel_add_y(index, y_stride, 1);
                }

                self.apply_biome_post_update(biomes, x, z, base_for_post, column_max_y);
            }
        }

        highest_stone_y
    }

    fn apply_biome_post_update(
        &self,
        biomes: &mut dyn BiomeGenerator,
        x: i32,
        z: i32,
        base: f32,
        column_max_y: i32,
    ) {
        let flags = self.params.flags;
        let mut heat = biomes.heat(x, z);
        let mut humid = biomes.humidity(x, z);
        let altitude_chill = self.params.altitude_chill as f32;
        let water_level = self.water_level as f32;
        // "Ground height ignoring riverbeds": ALT_DRY/ALT_CHILL compare
        // against this, not `base` directly.
        let t_alt = base.max(column_max_y as f32);

        if flags.contains(ValleysFlags::HUMID_RIVERS) {
            let water_depth = ((t_alt - base) / 4.0).max(1.0);
            humid *= 0.8 * (1.0 + 0.5f32.powf(water_depth));
        }

        if flags.contains(ValleysFlags::ALT_DRY) && t_alt > water_level {
            humid -= (t_alt - water_level) * 10.0 / altitude_chill;
        }

        if flags.contains(ValleysFlags::ALT_CHILL) {
            heat += 5.0;
            if t_alt > water_level {
                heat -= (t_alt - water_level) * 20.0 / altitude_chill;
            }
        }

        biomes.set_heat(x, z, heat);
        biomes.set_humidity(x, z, humid);
    }

    /// getSpawnLevelAtPoint(p) → y (spec.md §4.6).
    pub fn spawn_level_at_point(&self, x: i32, z: i32) -> i32 {
        let river_raw = self.river_raw_2d(x, z);
        if river_raw.abs() <= self.params.river_size_factor() {
            return MAX_MAP_GENERATION_LIMIT;
        }

        let n_slope = self.np_inter_valley_slope.eval2d(x, z);
        let n_th = self.np_terrain_height.eval2d(x, z);
        let n_vd = self.np_valley_depth.eval2d(x, z);
        let n_vp = self.np_valley_profile.eval2d(x, z);
        // The spawn locator has no biome generator to consult (spec.md §4.6
        // "without generating any voxels"); VARY_RIVER_DEPTH's river_y
        // adjustment needs humidmap/heatmap, so it is a no-op here (delta
        // is forced to 0 by using the neutral humidity value).
        let shape = self.column_shape(n_slope, n_th, n_vd, n_vp, river_raw, 50.0, 50.0, true);

        let max_spawn_y = ((self.params.np_terrain_height.offset
            + self.params.np_valley_depth.offset.powi(2)) as f32)
            .max(self.water_level as f32 + 16.0);

        let top = (max_spawn_y + 128.0) as i32;
        let bottom = self.water_level;

        for y in (bottom..=top).rev() {
            let n_fill = self.np_inter_valley_fill.eval3d(x, y, z);
            let density = shape.slope * n_fill - (y as f32 - shape.surface_y);
            if density > 0.0 {
                if y < self.water_level
                    || (y as f32) > max_spawn_y
                    || (y as f32) < shape.river_y
                {
                    return MAX_MAP_GENERATION_LIMIT;
                }
                return y + 2;
            }
        }

        MAX_MAP_GENERATION_LIMIT
    }
}
