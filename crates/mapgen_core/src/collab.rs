//! External collaborator traits (spec.md §3 "External Collaborators").
//!
//! None of these are implemented by this crate; `Mapgen` is generic over
//! a `TerrainVariant` that is handed `&mut dyn VoxelBuffer` and borrows
//! of the rest at `make_chunk` time, the way `mapgen_valleys.cpp` and
//! `mapgen_watershed.cpp` both hold raw pointers into the hosting
//! engine's `MMVManip`/`BiomeManager`/`EmergeManager` rather than owning
//! them.

use bitflags::bitflags;
use glam::IVec3;

use crate::content::ContentId;

bitflags! {
    /// Per-chunk feature toggles threaded through from the hosting
    /// engine's map-generation settings (spec.md §3's `mg_flags`).
    /// Unlike `mapgen_noise::NoiseFlags`, every bit here has observable
    /// effect on `make_chunk`'s pass sequence.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EngineFlags: u32 {
        const CAVES       = 1 << 0;
        const DUNGEONS    = 1 << 1;
        const LIGHT       = 1 << 2;
        const DECORATIONS = 1 << 3;
        const BIOMES      = 1 << 4;
    }
}

/// The dense voxel storage a single `make_chunk` call writes into.
/// Addressed via `min_edge`/`y_stride`/`z_stride` plus the free
/// functions in `crate::geometry` (spec.md §3).
pub trait VoxelBuffer {
    fn min_edge(&self) -> IVec3;
    fn y_stride(&self) -> i32;
    fn z_stride(&self) -> i32;

    fn get(&self, index: i64) -> ContentId;
    fn set(&mut self, index: i64, id: ContentId);
}

/// Per-column biome classification and vertical node selection
/// (spec.md §3, §5 "shared resources"). The heatmap/humidmap buffers
/// this trait exposes are owned by the biome generator instance but
/// MUTATED by `ValleysTerrain`'s per-column post-updates (§4.3) before
/// being read back by `generate_biomes` — never safe to share across
/// concurrent chunks, matching §5's "per-generator-instance owned
/// buffers".
pub trait BiomeGenerator {
    /// Populate the heat/humidity maps for the column range starting at
    /// `node_min` (pipeline step 2, before terrain runs).
    fn calc_biome_noise(&mut self, node_min: IVec3);

    fn heat(&self, x: i32, z: i32) -> f32;
    fn humidity(&self, x: i32, z: i32) -> f32;
    fn set_heat(&mut self, x: i32, z: i32, value: f32);
    fn set_humidity(&mut self, x: i32, z: i32, value: f32);

    /// Resolve the biome id for a column, given its computed surface
    /// height; heat/humidity are read back via `heat`/`humidity`.
    fn biome_at(&self, x: i32, z: i32, surface_y: i32) -> u16;

    fn top_node(&self, biome_id: u16) -> ContentId;
    fn filler_node(&self, biome_id: u16) -> ContentId;
    fn filler_depth(&self, biome_id: u16) -> i32;
    fn dust_node(&self, biome_id: u16) -> Option<ContentId>;

    /// The biome's own dungeon wall/stair node, when it has one (spec.md
    /// §4.5/§9 "Watershed's big-dungeon branch ... wall/stair resolution
    /// via biome's `c_dungeon`/`c_dungeon_stair`"). Callers fall back to
    /// the generator's resolved stone id, and the stair node falls back
    /// to whatever the wall node resolved to.
    fn dungeon_wall_node(&self, biome_id: u16) -> Option<ContentId>;
    fn dungeon_stair_node(&self, biome_id: u16) -> Option<ContentId>;

    /// Lay down each column's top/filler nodes over the already-written
    /// stone (pipeline step 5, gated on `EngineFlags::BIOMES`).
    fn generate_biomes(&mut self, buffer: &mut dyn VoxelBuffer, node_min: IVec3, node_max: IVec3);
}

/// Cave carving, called once per `make_chunk` when `EngineFlags::CAVES`
/// is set (spec.md §4.5 "caves" step, shared by both generators). Split
/// into the three passes `mapgen_valleys.cpp`/`mapgen_watershed.cpp`
/// run in sequence: narrow tunnels everywhere, then large caverns (which
/// report back whether the chunk came near one), then a random-walk
/// pass whose depth limit depends on that result.
pub trait CaveGenerator {
    /// Carve `CavesNoiseIntersection`-style tunnels through the whole
    /// chunk.
    fn generate_tunnels(&mut self, buffer: &mut dyn VoxelBuffer, node_min: IVec3, node_max: IVec3);

    /// Carve large caverns; returns whether this chunk ended up near one,
    /// which gates how deep the random-walk pass below is allowed to dig.
    fn generate_caverns(&mut self, buffer: &mut dyn VoxelBuffer, node_min: IVec3, node_max: IVec3) -> bool;

    /// Randomized walker caves, limited to `depth_limit` and below.
    /// Callers pass `-MAX_MAP_GENERATION_LIMIT` when `generate_caverns`
    /// reported a nearby cavern, else the generator's own
    /// `large_cave_depth` (spec.md §6, §9).
    fn generate_random_walk_caves(
        &mut self,
        buffer: &mut dyn VoxelBuffer,
        node_min: IVec3,
        node_max: IVec3,
        depth_limit: i32,
    );
}

/// Dungeon carving (spec.md §4.5 step 8, §4.6). Two entry points mirror
/// the two call shapes in the source: Valleys' plain gate calls
/// `generate_dungeons` with just the stone-depth limit (the generator
/// already knows its own default room/corridor sizing), while
/// Watershed's big-dungeon branch configures an explicit `DungeonParams`
/// and calls `generate_dungeons_with_params`.
pub trait DungeonGenerator {
    fn generate_dungeons(
        &mut self,
        buffer: &mut dyn VoxelBuffer,
        node_min: IVec3,
        node_max: IVec3,
        stone_max_y: i32,
    );

    fn generate_dungeons_with_params(
        &mut self,
        buffer: &mut dyn VoxelBuffer,
        node_min: IVec3,
        node_max: IVec3,
        params: &DungeonParams,
    );
}

/// Parameters for a single dungeon-generation pass, resolved from
/// `mapgen_watershed.cpp`'s big-dungeon branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DungeonParams {
    pub corridor_len_min: i32,
    pub corridor_len_max: i32,
    pub num_rooms: i32,
    pub room_size_min: IVec3,
    pub room_size_max: IVec3,
    pub holesize: IVec3,
    pub diagonal_dirs: bool,
    pub wall_node: ContentId,
    pub stair_node: ContentId,
}

impl DungeonParams {
    /// The "big dungeon" sizing used when the chunk is large enough for
    /// `mapgen_watershed.cpp`'s special branch (corridor 2-16, 32 rooms,
    /// room size (8,4,8)-(16,8,16), 3x3x3 holes, orthogonal-only
    /// directions). `wall_node`/`stair_node` default to the biome's own
    /// `c_dungeon`/`c_dungeon_stair` when set, else fall back to
    /// `c_stone` (spec.md §4.6).
    pub fn big_dungeon(wall_node: ContentId, stair_node: ContentId) -> Self {
        Self {
            corridor_len_min: 2,
            corridor_len_max: 16,
            num_rooms: 32,
            room_size_min: IVec3::new(8, 4, 8),
            room_size_max: IVec3::new(16, 8, 16),
            holesize: IVec3::new(3, 3, 3),
            diagonal_dirs: false,
            wall_node,
            stair_node,
        }
    }
}

/// Ore placement, called once per `make_chunk` after terrain and caves,
/// keyed by the chunk's `BlockSeed` (spec.md §4.5 "ores" step, §3
/// `BlockSeed`).
pub trait OreGenerator {
    fn generate_ores(
        &mut self,
        buffer: &mut dyn VoxelBuffer,
        node_min: IVec3,
        node_max: IVec3,
        blockseed: u32,
    );
}

/// Surface decoration placement (trees, grass, ...), called once per
/// `make_chunk` after biomes have been resolved, keyed by the chunk's
/// `BlockSeed` (spec.md §4.5 "decorations" step).
pub trait DecorationGenerator {
    fn generate_decorations(
        &mut self,
        buffer: &mut dyn VoxelBuffer,
        node_min: IVec3,
        node_max: IVec3,
        blockseed: u32,
    );
}

/// Propagates standing liquid (the river/lake water this crate writes
/// as isolated source nodes) to a stable flowing state. Called once per
/// `make_chunk`, last among the liquid-affecting passes (spec.md §4.5
/// "liquid propagation" step).
pub trait LiquidPropagator {
    fn propagate_liquid(&mut self, buffer: &mut dyn VoxelBuffer, node_min: IVec3, node_max: IVec3);
}

/// Recomputes node lighting after all solid/liquid placement is final
/// (spec.md §4.5 "lighting" step, gated on `EngineFlags::LIGHT`).
pub trait LightingPass {
    fn update_lighting(&mut self, buffer: &mut dyn VoxelBuffer, node_min: IVec3, node_max: IVec3);
}

/// Recomputes the engine-side heightmap for a chunk once terrain and
/// every post-terrain pass has finished writing (spec.md §4.5
/// `update_heightmap`, called at Valleys' unconditional step 4 /
/// Watershed's `div == 1` branch). The heightmap lives on the
/// collaborator's side of the boundary; this crate only tells it when
/// the buffer for `[node_min, node_max]` is in its final state.
pub trait HeightmapSink {
    fn update_heightmap(&mut self, node_min: IVec3, node_max: IVec3);
}
