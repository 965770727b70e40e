//! Shared test-only collaborator stand-ins for the integration suite.
//! Mirrors the `FakeBuffer`/`FakeRegistry`/`FakeBiomes` doubles each
//! module's own unit tests already define, but exposed once here so the
//! `tests/` binaries don't each redeclare them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use glam::IVec3;
use mapgen_core::collab::{
    BiomeGenerator, CaveGenerator, DecorationGenerator, DungeonGenerator, DungeonParams,
    HeightmapSink, LightingPass, LiquidPropagator, OreGenerator, VoxelBuffer,
};
use mapgen_core::content::{ContentId, NodeRegistry};
use mapgen_core::geometry::ChunkGeometry;

pub struct FakeRegistry;

impl NodeRegistry for FakeRegistry {
    fn resolve(&self, name: &str) -> ContentId {
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

pub struct InMemoryBuffer {
    min_edge: IVec3,
    y_stride: i32,
    z_stride: i32,
    cells: HashMap<i64, ContentId>,
}

impl InMemoryBuffer {
    pub fn new(geometry: &ChunkGeometry) -> Self {
        let size = geometry.full_csize();
        Self {
            min_edge: geometry.full_node_min,
            y_stride: size.x,
            z_stride: size.x * size.y,
            cells: HashMap::new(),
        }
    }
}

impl VoxelBuffer for InMemoryBuffer {
    fn min_edge(&self) -> IVec3 {
        self.min_edge
    }
    fn y_stride(&self) -> i32 {
        self.y_stride
    }
    fn z_stride(&self) -> i32 {
        self.z_stride
    }
    fn get(&self, index: i64) -> ContentId {
        self.cells.get(&index).copied().unwrap_or(ContentId::IGNORE)
    }
    fn set(&mut self, index: i64, id: ContentId) {
        self.cells.insert(index, id);
    }
}

#[derive(Default)]
pub struct FakeBiomes {
    heat: HashMap<(i32, i32), f32>,
    humid: HashMap<(i32, i32), f32>,
}

impl BiomeGenerator for FakeBiomes {
    fn calc_biome_noise(&mut self, _node_min: IVec3) {}
    fn heat(&self, x: i32, z: i32) -> f32 {
        *self.heat.get(&(x, z)).unwrap_or(&50.0)
    }
    fn humidity(&self, x: i32, z: i32) -> f32 {
        *self.humid.get(&(x, z)).unwrap_or(&50.0)
    }
    fn set_heat(&mut self, x: i32, z: i32, value: f32) {
        self.heat.insert((x, z), value);
    }
    fn set_humidity(&mut self, x: i32, z: i32, value: f32) {
        self.humid.insert((x, z), value);
    }
    fn biome_at(&self, _x: i32, _z: i32, _surface_y: i32) -> u16 {
        0
    }
    fn top_node(&self, _biome_id: u16) -> ContentId {
        ContentId(1)
    }
    fn filler_node(&self, _biome_id: u16) -> ContentId {
        ContentId(1)
    }
    fn filler_depth(&self, _biome_id: u16) -> i32 {
        3
    }
    fn dust_node(&self, _biome_id: u16) -> Option<ContentId> {
        None
    }
    fn dungeon_wall_node(&self, _biome_id: u16) -> Option<ContentId> {
        None
    }
    fn dungeon_stair_node(&self, _biome_id: u16) -> Option<ContentId> {
        None
    }
    fn generate_biomes(&mut self, _buffer: &mut dyn VoxelBuffer, _node_min: IVec3, _node_max: IVec3) {}
}

/// Records whether each pass ran, so tests can assert `EngineFlags`
/// actually gate the pipeline rather than merely not crashing.
#[derive(Default)]
pub struct CallTracker {
    pub caves: AtomicBool,
    pub dungeons: AtomicBool,
    pub decorations: AtomicBool,
    pub ores: AtomicBool,
    pub liquid: AtomicBool,
    pub lighting: AtomicBool,
    pub heightmap: AtomicBool,
}

pub struct TrackedCaves<'a>(pub &'a CallTracker);
impl CaveGenerator for TrackedCaves<'_> {
    fn generate_tunnels(&mut self, _b: &mut dyn VoxelBuffer, _min: IVec3, _max: IVec3) {
        self.0.caves.store(true, Ordering::SeqCst);
    }
    fn generate_caverns(&mut self, _b: &mut dyn VoxelBuffer, _min: IVec3, _max: IVec3) -> bool {
        false
    }
    fn generate_random_walk_caves(
        &mut self,
        _b: &mut dyn VoxelBuffer,
        _min: IVec3,
        _max: IVec3,
        _depth_limit: i32,
    ) {
    }
}

pub struct TrackedDungeons<'a>(pub &'a CallTracker);
impl DungeonGenerator for TrackedDungeons<'_> {
    fn generate_dungeons(&mut self, _b: &mut dyn VoxelBuffer, _min: IVec3, _max: IVec3, _stone_max_y: i32) {
        self.0.dungeons.store(true, Ordering::SeqCst);
    }
    fn generate_dungeons_with_params(
        &mut self,
        _b: &mut dyn VoxelBuffer,
        _min: IVec3,
        _max: IVec3,
        _params: &DungeonParams,
    ) {
        self.0.dungeons.store(true, Ordering::SeqCst);
    }
}

pub struct TrackedOres<'a>(pub &'a CallTracker);
impl OreGenerator for TrackedOres<'_> {
    fn generate_ores(&mut self, _b: &mut dyn VoxelBuffer, _min: IVec3, _max: IVec3, _seed: u32) {
        self.0.ores.store(true, Ordering::SeqCst);
    }
}

pub struct TrackedDecorations<'a>(pub &'a CallTracker);
impl DecorationGenerator for TrackedDecorations<'_> {
    fn generate_decorations(&mut self, _b: &mut dyn VoxelBuffer, _min: IVec3, _max: IVec3, _seed: u32) {
        self.0.decorations.store(true, Ordering::SeqCst);
    }
}

pub struct TrackedLiquid<'a>(pub &'a CallTracker);
impl LiquidPropagator for TrackedLiquid<'_> {
    fn propagate_liquid(&mut self, _b: &mut dyn VoxelBuffer, _min: IVec3, _max: IVec3) {
        self.0.liquid.store(true, Ordering::SeqCst);
    }
}

pub struct TrackedLighting<'a>(pub &'a CallTracker);
impl LightingPass for TrackedLighting<'_> {
    fn update_lighting(&mut self, _b: &mut dyn VoxelBuffer, _min: IVec3, _max: IVec3) {
        self.0.lighting.store(true, Ordering::SeqCst);
    }
}

pub struct TrackedHeightmap<'a>(pub &'a CallTracker);
impl HeightmapSink for TrackedHeightmap<'_> {
    fn update_heightmap(&mut self, _node_min: IVec3, _node_max: IVec3) {
        self.0.heightmap.store(true, Ordering::SeqCst);
    }
}
