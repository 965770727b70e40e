//! The generic `make_chunk` driver (spec.md §4.5) and the
//! `TerrainVariant` seam that lets it run either generator.

use glam::IVec3;

use crate::collab::{
    BiomeGenerator, CaveGenerator, DecorationGenerator, DungeonGenerator, DungeonParams,
    EngineFlags, HeightmapSink, LightingPass, LiquidPropagator, OreGenerator, VoxelBuffer,
};
use crate::content::ResolvedContentIds;
use crate::error::MapgenError;
use crate::geometry::ChunkGeometry;
use crate::valleys::Valleys;
use crate::watershed::Watershed;

/// Chunk bounds and the spawn-locator precondition (spec.md §3
/// `BlockMakeData`). The voxel buffer and collaborator borrows are
/// passed directly to `make_chunk` rather than bundled here, since
/// their lifetimes don't match this struct's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockMakeData {
    pub blockpos_min: IVec3,
    pub blockpos_max: IVec3,
    pub blockpos_requested: IVec3,
}

/// What the dungeon step should do this chunk (spec.md §4.5 step 8,
/// §9 `configure_big_dungeon`).
pub enum DungeonDecision {
    Skip,
    Plain,
    BigDungeon(DungeonParams),
}

/// The seam `Mapgen<V>` drives once per chunk. `Valleys` and
/// `Watershed` each already carry their own `generate_terrain`,
/// `water_level`, `content`, `block_seed` and `geometry`; this trait
/// just exposes them under one name and adds the two behaviors that
/// genuinely differ between the generators (scaled-mode early exit,
/// dungeon sizing).
pub trait TerrainVariant {
    fn geometry(&self) -> ChunkGeometry;
    fn water_level(&self) -> i32;
    fn content(&self) -> &ResolvedContentIds;
    fn block_seed(&self, full_node_min: IVec3) -> u32;

    fn generate_terrain(
        &mut self,
        buffer: &mut dyn VoxelBuffer,
        biomes: &mut dyn BiomeGenerator,
    ) -> i32;

    /// Watershed's scaled (`div > 1`) mode emits terrain only, per
    /// spec.md §8; Valleys always runs the full pipeline.
    fn post_terrain_enabled(&self) -> bool {
        true
    }

    /// `mgX_large_cave_depth`: the floor the random-walk cave pass is
    /// limited to when this chunk wasn't reported near a cavern (spec.md
    /// §6, §9).
    fn large_cave_depth(&self) -> i16;

    /// Valleys' `calcBiomeNoise(node_min)` runs once before terrain, so
    /// `generate_terrain` can read heat/humidity per column as it
    /// writes. Watershed has no such dependency and leaves this a no-op.
    fn biome_noise_before_terrain(&self, _biomes: &mut dyn BiomeGenerator, _node_min: IVec3) {}

    /// Watershed's `calcBiomeNoise(node_min)` runs after terrain, inside
    /// the same `EngineFlags::BIOMES`-gated section as `generate_biomes`
    /// (`mapgen_watershed.cpp`'s `div == 1.0f` branch); Valleys already
    /// populated its heat/humidity maps before terrain and leaves this a
    /// no-op.
    fn biome_noise_after_terrain(&self, _biomes: &mut dyn BiomeGenerator, _node_min: IVec3) {}

    fn dungeon_decision(
        &self,
        node_min: IVec3,
        node_max: IVec3,
        full_node_min: IVec3,
        full_node_max: IVec3,
        stone_max_y: i32,
        biomes: &dyn BiomeGenerator,
    ) -> DungeonDecision;
}

impl TerrainVariant for Valleys {
    fn geometry(&self) -> ChunkGeometry {
        Valleys::geometry(self)
    }

    fn water_level(&self) -> i32 {
        Valleys::water_level(self)
    }

    fn content(&self) -> &ResolvedContentIds {
        Valleys::content(self)
    }

    fn block_seed(&self, full_node_min: IVec3) -> u32 {
        Valleys::block_seed(self, full_node_min)
    }

    fn generate_terrain(
        &mut self,
        buffer: &mut dyn VoxelBuffer,
        biomes: &mut dyn BiomeGenerator,
    ) -> i32 {
        Valleys::generate_terrain(self, buffer, biomes)
    }

    fn large_cave_depth(&self) -> i16 {
        self.params().large_cave_depth
    }

    fn biome_noise_before_terrain(&self, biomes: &mut dyn BiomeGenerator, node_min: IVec3) {
        biomes.calc_biome_noise(node_min);
    }

    /// Valleys gates dungeon carving purely on `mgvalleys_dungeon_ymin`/
    /// `_ymax` (spec.md §4.6): no big-dungeon branch, no stone-depth
    /// check.
    fn dungeon_decision(
        &self,
        _node_min: IVec3,
        _node_max: IVec3,
        full_node_min: IVec3,
        full_node_max: IVec3,
        _stone_max_y: i32,
        _biomes: &dyn BiomeGenerator,
    ) -> DungeonDecision {
        let ymin = self.params().dungeon_ymin as i32;
        let ymax = self.params().dungeon_ymax as i32;
        if full_node_min.y >= ymin && full_node_max.y <= ymax {
            DungeonDecision::Plain
        } else {
            DungeonDecision::Skip
        }
    }
}

impl TerrainVariant for Watershed {
    fn geometry(&self) -> ChunkGeometry {
        Watershed::geometry(self)
    }

    fn water_level(&self) -> i32 {
        Watershed::water_level(self)
    }

    fn content(&self) -> &ResolvedContentIds {
        Watershed::content(self)
    }

    fn block_seed(&self, full_node_min: IVec3) -> u32 {
        Watershed::block_seed(self, full_node_min)
    }

    fn generate_terrain(
        &mut self,
        buffer: &mut dyn VoxelBuffer,
        _biomes: &mut dyn BiomeGenerator,
    ) -> i32 {
        Watershed::generate_terrain(self, buffer)
    }

    fn post_terrain_enabled(&self) -> bool {
        Watershed::post_terrain_enabled(self)
    }

    fn large_cave_depth(&self) -> i16 {
        self.params().large_cave_depth
    }

    fn biome_noise_after_terrain(&self, biomes: &mut dyn BiomeGenerator, node_min: IVec3) {
        biomes.calc_biome_noise(node_min);
    }

    /// `mapgen_watershed.cpp`'s dungeon branch: a chunk large enough and
    /// deep enough (`node_min.y < stone_max_y`) and positive enough on
    /// `np_big_dungeon` gets the big-dungeon treatment; otherwise it
    /// falls back to the same Y-range gate Valleys uses, reusing
    /// `big_dungeon_ymin`/`_ymax` since Watershed defines no separate
    /// plain dungeon range (spec.md §6's Watershed defaults table has
    /// none).
    fn dungeon_decision(
        &self,
        node_min: IVec3,
        node_max: IVec3,
        full_node_min: IVec3,
        full_node_max: IVec3,
        stone_max_y: i32,
        biomes: &dyn BiomeGenerator,
    ) -> DungeonDecision {
        let ymin = self.params().big_dungeon_ymin as i32;
        let ymax = self.params().big_dungeon_ymax as i32;
        if full_node_min.y < ymin || full_node_max.y > ymax {
            return DungeonDecision::Skip;
        }

        let noise = self.big_dungeon_noise(node_min);
        if noise > 1.0 && node_min.y < stone_max_y {
            let centre_x = (node_min.x + node_max.x) / 2;
            let centre_z = (node_min.z + node_max.z) / 2;
            let biome_id = biomes.biome_at(centre_x, centre_z, node_max.y);
            let wall = biomes
                .dungeon_wall_node(biome_id)
                .unwrap_or(self.content().c_stone);
            let stair = biomes.dungeon_stair_node(biome_id).unwrap_or(wall);
            DungeonDecision::BigDungeon(DungeonParams::big_dungeon(wall, stair))
        } else {
            DungeonDecision::Plain
        }
    }
}

/// The full collaborator set `make_chunk` drives through in sequence
/// (spec.md §3 "External Collaborators", §4.5's step list), gathered
/// into one bundle so `Mapgen::make_chunk` doesn't take a dozen
/// separate parameters.
pub struct Collaborators<'a> {
    pub buffer: &'a mut dyn VoxelBuffer,
    pub biomes: &'a mut dyn BiomeGenerator,
    pub caves: &'a mut dyn CaveGenerator,
    pub dungeons: &'a mut dyn DungeonGenerator,
    pub ores: &'a mut dyn OreGenerator,
    pub decorations: &'a mut dyn DecorationGenerator,
    pub liquid: &'a mut dyn LiquidPropagator,
    pub lighting: &'a mut dyn LightingPass,
    pub heightmap: &'a mut dyn HeightmapSink,
}

/// Drives a single `TerrainVariant` through the ordered `make_chunk`
/// pipeline (spec.md §4.5), gated on `EngineFlags` the way
/// `mapgen_valleys.cpp`/`mapgen_watershed.cpp`'s `makeChunk` consults
/// `Mapgen::flags`.
pub struct Mapgen<V: TerrainVariant> {
    pub variant: V,
    pub engine_flags: EngineFlags,
    generating: bool,
}

impl<V: TerrainVariant> Mapgen<V> {
    pub fn new(variant: V, engine_flags: EngineFlags) -> Self {
        Self {
            variant,
            engine_flags,
            generating: false,
        }
    }

    /// True only while `make_chunk` is on the stack, matching
    /// `Mapgen::generating` in the source (spec.md §3).
    pub fn is_generating(&self) -> bool {
        self.generating
    }

    /// makeChunk(data) → highest_stone_y (spec.md §4.5).
    pub fn make_chunk(
        &mut self,
        data: &BlockMakeData,
        collab: Collaborators<'_>,
    ) -> Result<i32, MapgenError> {
        if data.blockpos_requested.cmplt(data.blockpos_min).any()
            || data.blockpos_requested.cmpgt(data.blockpos_max).any()
        {
            return Err(MapgenError::InvalidChunkBounds {
                requested: data.blockpos_requested,
                min: data.blockpos_min,
                max: data.blockpos_max,
            });
        }

        self.generating = true;
        let Collaborators {
            buffer,
            biomes,
            caves,
            dungeons,
            ores,
            decorations,
            liquid,
            lighting,
            heightmap,
        } = collab;

        let geometry = self.variant.geometry();
        let blockseed = self.variant.block_seed(geometry.full_node_min);
        log::debug!(
            "make_chunk: node_min={:?} node_max={:?} blockseed={}",
            geometry.node_min,
            geometry.node_max,
            blockseed
        );

        self.variant.biome_noise_before_terrain(biomes, geometry.node_min);
        let stone_max_y = self.variant.generate_terrain(buffer, biomes);
        log::debug!("make_chunk: terrain done, stone_max_y={}", stone_max_y);

        if !self.variant.post_terrain_enabled() {
            log::debug!("make_chunk: scaled mode, skipping post-terrain passes");
            liquid.propagate_liquid(buffer, geometry.full_node_min, geometry.full_node_max);
            if self.engine_flags.contains(EngineFlags::LIGHT) {
                lighting.update_lighting(buffer, geometry.full_node_min, geometry.full_node_max);
            }
            self.generating = false;
            return Ok(stone_max_y);
        }

        heightmap.update_heightmap(geometry.node_min, geometry.node_max);

        if self.engine_flags.contains(EngineFlags::BIOMES) {
            self.variant.biome_noise_after_terrain(biomes, geometry.node_min);
            biomes.generate_biomes(buffer, geometry.node_min, geometry.node_max);
        }

        if self.engine_flags.contains(EngineFlags::CAVES) {
            caves.generate_tunnels(buffer, geometry.node_min, geometry.node_max);
            let near_cavern = caves.generate_caverns(buffer, geometry.node_min, geometry.node_max);
            let depth_limit = if near_cavern {
                -crate::MAX_MAP_GENERATION_LIMIT
            } else {
                self.variant.large_cave_depth() as i32
            };
            caves.generate_random_walk_caves(buffer, geometry.node_min, geometry.node_max, depth_limit);
        }

        ores.generate_ores(buffer, geometry.node_min, geometry.node_max, blockseed);

        match self.variant.dungeon_decision(
            geometry.node_min,
            geometry.node_max,
            geometry.full_node_min,
            geometry.full_node_max,
            stone_max_y,
            biomes,
        ) {
            DungeonDecision::Skip => {}
            DungeonDecision::Plain if self.engine_flags.contains(EngineFlags::DUNGEONS) => {
                dungeons.generate_dungeons(buffer, geometry.node_min, geometry.node_max, stone_max_y);
            }
            DungeonDecision::BigDungeon(params)
                if self.engine_flags.contains(EngineFlags::DUNGEONS) =>
            {
                dungeons.generate_dungeons_with_params(
                    buffer,
                    geometry.node_min,
                    geometry.node_max,
                    &params,
                );
            }
            _ => {
                log::debug!("make_chunk: dungeons disabled by engine flags");
            }
        }

        if self.engine_flags.contains(EngineFlags::DECORATIONS) {
            decorations.generate_decorations(buffer, geometry.node_min, geometry.node_max, blockseed);
        }

        if self.engine_flags.contains(EngineFlags::BIOMES) {
            crate::post::dust_top_nodes(buffer, self.variant.content(), biomes, geometry.node_min, geometry.node_max);
        }

        liquid.propagate_liquid(buffer, geometry.full_node_min, geometry.full_node_max);

        if self.engine_flags.contains(EngineFlags::LIGHT) {
            lighting.update_lighting(buffer, geometry.full_node_min, geometry.full_node_max);
        }

        self.generating = false;
        Ok(stone_max_y)
    }
}
