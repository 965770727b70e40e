//! `PostMapgen` (spec.md §9 "C9"): the standalone post-processing
//! bundle callers reach for when they want to re-run biome/ore/
//! decoration placement over an already-generated volume without
//! driving a full `make_chunk` (e.g. a "regenerate decorations" admin
//! command, or the engine's own post-mapgen hook after a world edit).

use glam::IVec3;

use crate::collab::{BiomeGenerator, DecorationGenerator, OreGenerator, VoxelBuffer};
use crate::content::ResolvedContentIds;
use crate::geometry::voxel_index;

/// Bundles a mutable voxel buffer and the biome/ore/decoration
/// collaborators with a fixed content-id set and working area, the way
/// `mapgen_valleys.cpp`'s post-generation hooks reuse the same
/// `BiomeManager`/`EmergeManager` handles outside of `makeChunk` proper.
pub struct PostMapgen<'a> {
    pub buffer: &'a mut dyn VoxelBuffer,
    pub content: &'a ResolvedContentIds,
    pub biomes: &'a mut dyn BiomeGenerator,
    pub ores: &'a mut dyn OreGenerator,
    pub decorations: &'a mut dyn DecorationGenerator,
    node_min: IVec3,
    node_max: IVec3,
    generating: bool,
}

impl<'a> PostMapgen<'a> {
    pub fn new(
        buffer: &'a mut dyn VoxelBuffer,
        content: &'a ResolvedContentIds,
        biomes: &'a mut dyn BiomeGenerator,
        ores: &'a mut dyn OreGenerator,
        decorations: &'a mut dyn DecorationGenerator,
    ) -> Self {
        Self {
            buffer,
            content,
            biomes,
            ores,
            decorations,
            node_min: IVec3::ZERO,
            node_max: IVec3::ZERO,
            generating: false,
        }
    }

    /// Restricts every following call to this node-space volume.
    pub fn set_area(&mut self, node_min: IVec3, node_max: IVec3) {
        self.node_min = node_min;
        self.node_max = node_max;
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn generate_biomes(&mut self) {
        self.generating = true;
        self.biomes
            .generate_biomes(self.buffer, self.node_min, self.node_max);
        self.generating = false;
    }

    pub fn generate_ores(&mut self, blockseed: u32) {
        self.generating = true;
        self.ores
            .generate_ores(self.buffer, self.node_min, self.node_max, blockseed);
        self.generating = false;
    }

    pub fn generate_decorations(&mut self, blockseed: u32) {
        self.generating = true;
        self.decorations
            .generate_decorations(self.buffer, self.node_min, self.node_max, blockseed);
        self.generating = false;
    }

    /// Drops a dust node on top of every column whose surface biome
    /// defines one, scanning down from `node_max.y` for the first solid
    /// node and writing into the node above it if that node is air
    /// (spec.md §9 "dust_top_nodes": "place biome dust node above the
    /// topmost non-air, non-liquid node in each column").
    pub fn dust_top_nodes(&mut self) {
        self.generating = true;
        dust_top_nodes(
            self.buffer,
            self.content,
            self.biomes,
            self.node_min,
            self.node_max,
        );
        self.generating = false;
    }
}

/// Shared scan driving both `PostMapgen::dust_top_nodes` and
/// `pipeline::make_chunk`'s own BIOMES-gated dust pass (spec.md §4.5
/// step 10).
pub fn dust_top_nodes(
    buffer: &mut dyn VoxelBuffer,
    content: &ResolvedContentIds,
    biomes: &mut dyn BiomeGenerator,
    node_min: IVec3,
    node_max: IVec3,
) {
    let min_edge = buffer.min_edge();
    let y_stride = buffer.y_stride();
    let z_stride = buffer.z_stride();

    for z in node_min.z..=node_max.z {
        for x in node_min.x..=node_max.x {
            for y in (node_min.y..node_max.y).rev() {
                let below = voxel_index(min_edge, y_stride, z_stride, IVec3::new(x, y, z));
                let above = voxel_index(min_edge, y_stride, z_stride, IVec3::new(x, y + 1, z));
                let below_id = buffer.get(below);
                if below_id.is_ignore()
                    || below_id == content.c_water
                    || below_id == content.c_river_water
                {
                    continue;
                }
                let above_id = buffer.get(above);
                if above_id != crate::content::ContentId::AIR {
                    break;
                }
                let biome_id = biomes.biome_at(x, z, y);
                if let Some(dust) = biomes.dust_node(biome_id) {
                    buffer.set(above, dust);
                }
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentId, NodeRegistry};
    use crate::geometry::ChunkGeometry;
    use std::collections::HashMap;

    struct FakeRegistry;
    impl NodeRegistry for FakeRegistry {
        fn resolve(&self, name: &str) -> ContentId {
            match name {
                "mapgen_stone" => ContentId(1),
                "mapgen_water_source" => ContentId(2),
                "mapgen_river_water_source" => ContentId(3),
                "mapgen_lava_source" => ContentId(4),
                _ => ContentId::IGNORE,
            }
        }
    }

    struct FakeBuffer {
        min_edge: IVec3,
        y_stride: i32,
        z_stride: i32,
        cells: HashMap<i64, ContentId>,
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
        fn get(&self, index: i64) -> ContentId {
            self.cells.get(&index).copied().unwrap_or(ContentId::IGNORE)
        }
        fn set(&mut self, index: i64, id: ContentId) {
            self.cells.insert(index, id);
        }
    }

    struct FakeBiomes {
        dust: Option<ContentId>,
    }

    impl BiomeGenerator for FakeBiomes {
        fn calc_biome_noise(&mut self, _node_min: IVec3) {}
        fn heat(&self, _x: i32, _z: i32) -> f32 {
            50.0
        }
        fn humidity(&self, _x: i32, _z: i32) -> f32 {
            50.0
        }
        fn set_heat(&mut self, _x: i32, _z: i32, _value: f32) {}
        fn set_humidity(&mut self, _x: i32, _z: i32, _value: f32) {}
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
            self.dust
        }
        fn dungeon_wall_node(&self, _biome_id: u16) -> Option<ContentId> {
            None
        }
        fn dungeon_stair_node(&self, _biome_id: u16) -> Option<ContentId> {
            None
        }
        fn generate_biomes(&mut self, _buffer: &mut dyn VoxelBuffer, _node_min: IVec3, _node_max: IVec3) {}
    }

    struct FakeOres;
    impl OreGenerator for FakeOres {
        fn generate_ores(&mut self, _b: &mut dyn VoxelBuffer, _min: IVec3, _max: IVec3, _seed: u32) {}
    }

    struct FakeDecorations;
    impl DecorationGenerator for FakeDecorations {
        fn generate_decorations(&mut self, _b: &mut dyn VoxelBuffer, _min: IVec3, _max: IVec3, _seed: u32) {}
    }

    #[test]
    fn dust_top_nodes_writes_dust_above_topmost_solid_column() {
        let geometry = ChunkGeometry::new(IVec3::ZERO, IVec3::ZERO);
        let mut buffer = FakeBuffer {
            min_edge: geometry.full_node_min,
            y_stride: geometry.full_csize().x,
            z_stride: geometry.full_csize().x * geometry.full_csize().y,
            cells: HashMap::new(),
        };
        let content = ResolvedContentIds::resolve(&FakeRegistry, false);
        let stone_y = 5;
        let solid_idx = voxel_index(
            buffer.min_edge,
            buffer.y_stride,
            buffer.z_stride,
            IVec3::new(0, stone_y, 0),
        );
        buffer.set(solid_idx, content.c_stone);

        let mut biomes = FakeBiomes {
            dust: Some(ContentId(7)),
        };
        let mut ores = FakeOres;
        let mut decorations = FakeDecorations;
        let mut post = PostMapgen::new(&mut buffer, &content, &mut biomes, &mut ores, &mut decorations);
        post.set_area(geometry.node_min, geometry.node_max);
        post.dust_top_nodes();

        let above_idx = voxel_index(
            post.buffer.min_edge(),
            post.buffer.y_stride(),
            post.buffer.z_stride(),
            IVec3::new(0, stone_y + 1, 0),
        );
        assert_eq!(post.buffer.get(above_idx), ContentId(7));
    }

    #[test]
    fn dust_top_nodes_skips_when_surface_is_liquid() {
        let geometry = ChunkGeometry::new(IVec3::ZERO, IVec3::ZERO);
        let mut buffer = FakeBuffer {
            min_edge: geometry.full_node_min,
            y_stride: geometry.full_csize().x,
            z_stride: geometry.full_csize().x * geometry.full_csize().y,
            cells: HashMap::new(),
        };
        let content = ResolvedContentIds::resolve(&FakeRegistry, false);
        let water_idx = voxel_index(
            buffer.min_edge,
            buffer.y_stride,
            buffer.z_stride,
            IVec3::new(0, 5, 0),
        );
        buffer.set(water_idx, content.c_water);

        let mut biomes = FakeBiomes {
            dust: Some(ContentId(7)),
        };
        let mut ores = FakeOres;
        let mut decorations = FakeDecorations;
        let mut post = PostMapgen::new(&mut buffer, &content, &mut biomes, &mut ores, &mut decorations);
        post.set_area(geometry.node_min, geometry.node_max);
        post.dust_top_nodes();

        let above_idx = voxel_index(
            post.buffer.min_edge(),
            post.buffer.y_stride(),
            post.buffer.z_stride(),
            IVec3::new(0, 6, 0),
        );
        assert_eq!(post.buffer.get(above_idx), ContentId::IGNORE);
    }
}
