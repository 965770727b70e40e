//! Deterministic voxel-chunk terrain generation: the Valleys and
//! Watershed mapgens.
//!
//! This crate owns the per-chunk density math and the ordered pipeline
//! that turns it into written voxels (`pipeline::Mapgen::make_chunk`);
//! everything the generators read or write through — the voxel buffer,
//! node registry, biome/cave/ore/decoration/dungeon/liquid/lighting
//! passes — is an external collaborator trait in [`collab`]. Nothing in
//! this crate performs I/O, spawns threads, or owns a world.

pub mod collab;
pub mod content;
pub mod error;
pub mod geometry;
pub mod params;
pub mod pipeline;
pub mod post;
pub mod valleys;
pub mod watershed;

pub use collab::EngineFlags;
pub use content::{ContentId, NodeRegistry, ResolvedContentIds};
pub use error::MapgenError;
pub use geometry::ChunkGeometry;
pub use params::{ValleysParams, WatershedParams};
pub use pipeline::{BlockMakeData, Collaborators, DungeonDecision, Mapgen, TerrainVariant};
pub use post::PostMapgen;
pub use valleys::Valleys;
pub use watershed::Watershed;

/// Mirrors Minetest's `MAX_MAP_GENERATION_LIMIT`: the sentinel both
/// generators' `getSpawnLevelAtPoint` return when a column has no valid
/// spawn (a river column, or a search that ran off the top of its
/// window), and the magnitude `-MAX_MAP_GENERATION_LIMIT` used to seed
/// `highest_stone_y`/`stone_max_y` before any voxel is written (spec.md
/// §4.3, §4.4, §4.6).
pub const MAX_MAP_GENERATION_LIMIT: i32 = 31000;
