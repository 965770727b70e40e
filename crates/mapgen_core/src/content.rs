//! Content ids and the node-registry collaborator (spec.md §3, §6).

/// A resolved node content id. A 16-bit value, matching spec.md §3's
/// "each cell holds a 16-bit content id".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ContentId(pub u16);

impl ContentId {
    /// Sentinel meaning "not yet generated" — pre-existing cells holding
    /// any other id must never be overwritten by terrain (spec.md §8,
    /// IGNORE preservation).
    pub const IGNORE: ContentId = ContentId(u16::MAX);

    /// Fixed air sentinel (spec.md §3: "c_air is a fixed sentinel").
    pub const AIR: ContentId = ContentId(0);

    pub fn is_ignore(self) -> bool {
        self == Self::IGNORE
    }
}

/// The node-registry collaborator: resolves human-readable node names to
/// numeric content ids. Out of scope per spec.md §1; this trait specifies
/// only the interface the generators consume.
pub trait NodeRegistry {
    /// Resolve a node name to its content id, or `ContentId::IGNORE` if no
    /// node by that name is registered.
    fn resolve(&self, name: &str) -> ContentId;
}

/// The ids both generators resolve once at construction time (spec.md
/// §4.5/§6). `c_volcanic_rock` is the only one with a specified fallback
/// (to `c_stone`) should the registry not know it; the rest are required
/// and failing to resolve them is a fatal setup error (spec.md §7 kind
/// 3).
pub struct ResolvedContentIds {
    pub c_stone: ContentId,
    pub c_water: ContentId,
    pub c_river_water: ContentId,
    pub c_lava: ContentId,
    pub c_volcanic_rock: ContentId,
}

impl ResolvedContentIds {
    /// Resolve the ids required by both generators. `with_volcanic_rock`
    /// selects whether `mapgen_volcanic_rock` is looked up (Watershed
    /// only); Valleys never references it.
    ///
    /// # Panics
    /// Panics if any *required* id (everything but the volcanic rock
    /// fallback) does not resolve — a missing `mapgen_stone`,
    /// `mapgen_water_source`, `mapgen_river_water_source`, or
    /// `mapgen_lava_source` registration is a programmer error in the
    /// hosting engine's node definitions, not a per-chunk condition, and
    /// spec.md §7 classifies it as something that "must be loud".
    pub fn resolve(registry: &dyn NodeRegistry, with_volcanic_rock: bool) -> Self {
        let required = |name: &str| -> ContentId {
            let id = registry.resolve(name);
            if id.is_ignore() {
                panic!(
                    "mapgen setup failed: node registry has no entry for required id '{name}'"
                );
            }
            id
        };

        let c_stone = required("mapgen_stone");
        let c_volcanic_rock = if with_volcanic_rock {
            let id = registry.resolve("mapgen_volcanic_rock");
            if id.is_ignore() {
                log::warn!("mapgen_volcanic_rock not registered, falling back to mapgen_stone");
                c_stone
            } else {
                id
            }
        } else {
            c_stone
        };

        Self {
            c_stone,
            c_water: required("mapgen_water_source"),
            c_river_water: required("mapgen_river_water_source"),
            c_lava: required("mapgen_lava_source"),
            c_volcanic_rock,
        }
    }
}
