//! Error types (spec.md §7).

use thiserror::Error;

/// The only error surface `make_chunk` can return. Precondition
/// violations other than bad chunk bounds (a null voxel buffer, a null
/// registry, a missing required node id) are programmer errors and
/// `panic!` instead, matching the teacher's own `Biomes::load`
/// validation style — see DESIGN.md's Open Question log for why bounds
/// checking alone gets the `Result` treatment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapgenError {
    /// `blockpos_requested` did not lie within `[blockpos_min,
    /// blockpos_max]` (spec.md §4.5 precondition, §7 kind 1).
    #[error(
        "requested block {requested:?} lies outside the generated range {min:?}..={max:?}"
    )]
    InvalidChunkBounds {
        requested: glam::IVec3,
        min: glam::IVec3,
        max: glam::IVec3,
    },

    /// A required node id (everything but `mapgen_volcanic_rock`) failed
    /// to resolve (spec.md §7 kind 3). In practice this is raised by
    /// `ResolvedContentIds::resolve` as a `panic!` at setup time, not
    /// surfaced through this variant during `make_chunk`; it is kept
    /// here so callers that choose to pre-validate a registry can do so
    /// without panicking.
    #[error("node registry has no entry for required id '{name}'")]
    MissingRegistryEntry { name: String },
}
