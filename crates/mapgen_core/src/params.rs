//! ParamStore: typed Valleys/Watershed parameter schemas plus the
//! `ConfigSource`/`ConfigSink` collaborator traits they are read from
//! and written to (spec.md §4.7, §6, §9 "typed schema").

use bitflags::bitflags;
use mapgen_noise::{NoiseFlags, NoiseParams, Spread};

/// The out-of-scope "configuration store" collaborator, read side.
/// Every recognized key is `mg<variant>_<field>`; missing keys are
/// `None` and the typed schema keeps its default (spec.md §7 kind 2).
pub trait ConfigSource {
    fn get_str(&self, key: &str) -> Option<String>;
    fn get_f32(&self, key: &str) -> Option<f32>;
    fn get_u16(&self, key: &str) -> Option<u16>;
    fn get_i16(&self, key: &str) -> Option<i16>;
    fn get_i32(&self, key: &str) -> Option<i32>;

    /// A noise-parameter value is stored as one compound key, formatted
    /// `offset, scale, (sx, sy, sz), seed, octaves, persistence,
    /// lacunarity, flags` — the same shape Minetest's own `noiseparams`
    /// config values use.
    fn get_noise_params(&self, key: &str) -> Option<NoiseParams> {
        self.get_str(key).and_then(|s| parse_noiseparams(&s))
    }
}

/// The out-of-scope "configuration store" collaborator, write side.
pub trait ConfigSink {
    fn set_str(&mut self, key: &str, value: &str);
    fn set_f32(&mut self, key: &str, value: f32);
    fn set_u16(&mut self, key: &str, value: u16);
    fn set_i16(&mut self, key: &str, value: i16);
    fn set_i32(&mut self, key: &str, value: i32);

    fn set_noise_params(&mut self, key: &str, value: &NoiseParams) {
        self.set_str(key, &format_noiseparams(value));
    }
}

fn format_noiseparams(p: &NoiseParams) -> String {
    format!(
        "{}, {}, ({}, {}, {}), {}, {}, {}, {}, {}",
        p.offset,
        p.scale,
        p.spread.x,
        p.spread.y,
        p.spread.z,
        p.seed,
        p.octaves,
        p.persistence,
        p.lacunarity,
        p.flags.to_flag_string(),
    )
}

fn parse_noiseparams(s: &str) -> Option<NoiseParams> {
    let s = s.trim();
    let (head, flag_str) = match s.splitn(2, ')').nth(1) {
        Some(rest) => (
            &s[..s.len() - rest.len() - 1],
            rest.trim_start_matches(',').trim(),
        ),
        None => (s, ""),
    };
    let open = head.find('(')?;
    let before = &head[..open];
    let inside = head[open + 1..].trim();
    let spread: Vec<f64> = inside
        .split(',')
        .map(|t| t.trim().parse().ok())
        .collect::<Option<_>>()?;
    if spread.len() != 3 {
        return None;
    }
    let mut nums = before.trim_end_matches(',').split(',');
    let offset: f64 = nums.next()?.trim().parse().ok()?;
    let scale: f64 = nums.next()?.trim().parse().ok()?;
    let after: Vec<&str> = flag_str.splitn(4, ',').collect();
    if after.len() < 4 {
        return None;
    }
    let seed: i32 = after[0].trim().parse().ok()?;
    let octaves: u32 = after[1].trim().parse().ok()?;
    let persistence: f64 = after[2].trim().parse().ok()?;
    let rest = after[3].trim();
    let (lacunarity_str, flags_str) = match rest.splitn(2, ',').collect::<Vec<_>>()[..] {
        [lac, flags] => (lac, flags.trim()),
        [lac] => (lac, ""),
        _ => return None,
    };
    let lacunarity: f64 = lacunarity_str.trim().parse().ok()?;
    Some(NoiseParams {
        offset,
        scale,
        spread: Spread::new(spread[0], spread[1], spread[2]),
        seed,
        octaves,
        persistence,
        lacunarity,
        flags: NoiseFlags::parse(flags_str),
    })
}

bitflags! {
    /// Flags recognized on `ValleysParams` (spec.md §3).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ValleysFlags: u32 {
        const ALT_CHILL        = 1 << 0;
        const HUMID_RIVERS     = 1 << 1;
        const VARY_RIVER_DEPTH = 1 << 2;
        const ALT_DRY          = 1 << 3;
        const CANYONS          = 1 << 4;
    }
}

impl ValleysFlags {
    pub fn parse(s: &str) -> Self {
        let mut flags = Self::empty();
        for raw in s.split(',') {
            let token = raw.trim();
            if token.is_empty() {
                continue;
            }
            let (negate, name) = match token.strip_prefix("no") {
                Some(rest) if Self::from_name(rest).is_some() => (true, rest),
                _ => (false, token),
            };
            if let Some(flag) = Self::from_name(name) {
                flags.set(flag, !negate);
            }
        }
        flags
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "altitude_chill" => Some(Self::ALT_CHILL),
            "humid_rivers" => Some(Self::HUMID_RIVERS),
            "vary_river_depth" => Some(Self::VARY_RIVER_DEPTH),
            "altitude_dry" => Some(Self::ALT_DRY),
            "canyons" => Some(Self::CANYONS),
            _ => None,
        }
    }

    pub fn to_flag_string(self) -> String {
        let table = [
            (Self::ALT_CHILL, "altitude_chill"),
            (Self::HUMID_RIVERS, "humid_rivers"),
            (Self::VARY_RIVER_DEPTH, "vary_river_depth"),
            (Self::ALT_DRY, "altitude_dry"),
            (Self::CANYONS, "canyons"),
        ];
        table
            .into_iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
            .collect::<Vec<_>>()
            .join(",")
    }
}

bitflags! {
    /// Flags recognized on `WatershedParams` (spec.md §3).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WatershedFlags: u32 {
        const VENTS = 1 << 0;
    }
}

impl WatershedFlags {
    pub fn parse(s: &str) -> Self {
        let mut flags = Self::empty();
        for raw in s.split(',') {
            let token = raw.trim();
            if token.is_empty() {
                continue;
            }
            let (negate, name) = match token.strip_prefix("no") {
                Some("vents") => (true, "vents"),
                _ => (false, token),
            };
            if name == "vents" {
                flags.set(Self::VENTS, !negate);
            }
        }
        flags
    }

    pub fn to_flag_string(self) -> String {
        if self.contains(Self::VENTS) {
            "vents".to_string()
        } else {
            String::new()
        }
    }
}

/// Valleys' full tunable parameter set (spec.md §6 "Valleys defaults").
#[derive(Debug, Clone, PartialEq)]
pub struct ValleysParams {
    pub seed: i32,
    pub flags: ValleysFlags,

    pub altitude_chill: i16,
    pub large_cave_depth: i16,
    pub lava_depth: i16,
    pub river_depth: f32,
    pub river_size: f32,
    pub cave_width: f32,
    pub cavern_limit: i16,
    pub cavern_taper: i16,
    pub cavern_threshold: f32,
    pub dungeon_ymin: i16,
    pub dungeon_ymax: i16,

    pub np_filler_depth: NoiseParams,
    pub np_inter_valley_fill: NoiseParams,
    pub np_inter_valley_slope: NoiseParams,
    pub np_rivers: NoiseParams,
    pub np_terrain_height: NoiseParams,
    pub np_valley_depth: NoiseParams,
    pub np_valley_profile: NoiseParams,
    pub np_cave1: NoiseParams,
    pub np_cave2: NoiseParams,
    pub np_cavern: NoiseParams,
}

impl Default for ValleysParams {
    fn default() -> Self {
        Self {
            seed: 0,
            flags: ValleysFlags::empty(),
            altitude_chill: 90,
            large_cave_depth: -33,
            lava_depth: -256,
            river_depth: 4.0,
            river_size: 5.0,
            cave_width: 0.09,
            cavern_limit: -256,
            cavern_taper: 256,
            cavern_threshold: 0.7,
            dungeon_ymin: -31000,
            dungeon_ymax: 31000,
            np_filler_depth: NoiseParams::new(0.0, 1.2, Spread::uniform(256.0), 1605, 3, 0.5, 2.0),
            np_inter_valley_fill: NoiseParams::new(
                0.0,
                1.0,
                Spread::new(256.0, 512.0, 256.0),
                1993,
                6,
                0.8,
                2.0,
            ),
            np_inter_valley_slope: NoiseParams::new(
                0.5,
                0.5,
                Spread::uniform(128.0),
                746,
                1,
                1.0,
                2.0,
            ),
            np_rivers: NoiseParams::new(0.0, 1.0, Spread::uniform(256.0), -6050, 5, 0.6, 2.0)
                .with_flags(NoiseFlags::EASED),
            np_terrain_height: NoiseParams::new(
                -10.0,
                50.0,
                Spread::uniform(1024.0),
                5202,
                6,
                0.4,
                2.0,
            ),
            np_valley_depth: NoiseParams::new(5.0, 4.0, Spread::uniform(512.0), -1914, 1, 1.0, 2.0),
            np_valley_profile: NoiseParams::new(
                0.6,
                0.5,
                Spread::uniform(512.0),
                777,
                1,
                1.0,
                2.0,
            ),
            np_cave1: NoiseParams::new(0.0, 12.0, Spread::uniform(61.0), 52534, 3, 0.5, 2.0),
            np_cave2: NoiseParams::new(0.0, 12.0, Spread::uniform(67.0), 10325, 3, 0.5, 2.0),
            np_cavern: NoiseParams::new(
                0.0,
                1.0,
                Spread::new(768.0, 256.0, 768.0),
                59033,
                6,
                0.63,
                2.0,
            ),
        }
    }
}

impl ValleysParams {
    /// `river_size_factor = river_size / 100` (spec.md §4.3).
    pub fn river_size_factor(&self) -> f32 {
        self.river_size / 100.0
    }

    /// `river_depth_bed = river_depth + 1` (spec.md §4.3).
    pub fn river_depth_bed(&self) -> f32 {
        self.river_depth + 1.0
    }

    pub fn read_params(store: &dyn ConfigSource) -> Self {
        let d = Self::default();
        Self {
            seed: store.get_i32("mgvalleys_seed").unwrap_or(d.seed),
            flags: store
                .get_str("mgvalleys_spflags")
                .map(|s| ValleysFlags::parse(&s))
                .unwrap_or(d.flags),
            altitude_chill: store
                .get_i16("mgvalleys_altitude_chill")
                .unwrap_or(d.altitude_chill),
            large_cave_depth: store
                .get_i16("mgvalleys_large_cave_depth")
                .unwrap_or(d.large_cave_depth),
            lava_depth: store
                .get_i16("mgvalleys_lava_depth")
                .unwrap_or(d.lava_depth),
            river_depth: store
                .get_f32("mgvalleys_river_depth")
                .unwrap_or(d.river_depth),
            river_size: store
                .get_f32("mgvalleys_river_size")
                .unwrap_or(d.river_size),
            cave_width: store
                .get_f32("mgvalleys_cave_width")
                .unwrap_or(d.cave_width),
            cavern_limit: store
                .get_i16("mgvalleys_cavern_limit")
                .unwrap_or(d.cavern_limit),
            cavern_taper: store
                .get_i16("mgvalleys_cavern_taper")
                .unwrap_or(d.cavern_taper),
            cavern_threshold: store
                .get_f32("mgvalleys_cavern_threshold")
                .unwrap_or(d.cavern_threshold),
            dungeon_ymin: store
                .get_i16("mgvalleys_dungeon_ymin")
                .unwrap_or(d.dungeon_ymin),
            dungeon_ymax: store
                .get_i16("mgvalleys_dungeon_ymax")
                .unwrap_or(d.dungeon_ymax),
            np_filler_depth: store
                .get_noise_params("mgvalleys_np_filler_depth")
                .unwrap_or(d.np_filler_depth),
            np_inter_valley_fill: store
                .get_noise_params("mgvalleys_np_inter_valley_fill")
                .unwrap_or(d.np_inter_valley_fill),
            np_inter_valley_slope: store
                .get_noise_params("mgvalleys_np_inter_valley_slope")
                .unwrap_or(d.np_inter_valley_slope),
            np_rivers: store
                .get_noise_params("mgvalleys_np_rivers")
                .unwrap_or(d.np_rivers),
            np_terrain_height: store
                .get_noise_params("mgvalleys_np_terrain_height")
                .unwrap_or(d.np_terrain_height),
            np_valley_depth: store
                .get_noise_params("mgvalleys_np_valley_depth")
                .unwrap_or(d.np_valley_depth),
            np_valley_profile: store
                .get_noise_params("mgvalleys_np_valley_profile")
                .unwrap_or(d.np_valley_profile),
            np_cave1: store
                .get_noise_params("mgvalleys_np_cave1")
                .unwrap_or(d.np_cave1),
            np_cave2: store
                .get_noise_params("mgvalleys_np_cave2")
                .unwrap_or(d.np_cave2),
            np_cavern: store
                .get_noise_params("mgvalleys_np_cavern")
                .unwrap_or(d.np_cavern),
        }
    }

    pub fn write_params(&self, store: &mut dyn ConfigSink) {
        store.set_i32("mgvalleys_seed", self.seed);
        store.set_str("mgvalleys_spflags", &self.flags.to_flag_string());
        store.set_i16("mgvalleys_altitude_chill", self.altitude_chill);
        store.set_i16("mgvalleys_large_cave_depth", self.large_cave_depth);
        store.set_i16("mgvalleys_lava_depth", self.lava_depth);
        store.set_f32("mgvalleys_river_depth", self.river_depth);
        store.set_f32("mgvalleys_river_size", self.river_size);
        store.set_f32("mgvalleys_cave_width", self.cave_width);
        store.set_i16("mgvalleys_cavern_limit", self.cavern_limit);
        store.set_i16("mgvalleys_cavern_taper", self.cavern_taper);
        store.set_f32("mgvalleys_cavern_threshold", self.cavern_threshold);
        store.set_i16("mgvalleys_dungeon_ymin", self.dungeon_ymin);
        store.set_i16("mgvalleys_dungeon_ymax", self.dungeon_ymax);
        store.set_noise_params("mgvalleys_np_filler_depth", &self.np_filler_depth);
        store.set_noise_params(
            "mgvalleys_np_inter_valley_fill",
            &self.np_inter_valley_fill,
        );
        store.set_noise_params(
            "mgvalleys_np_inter_valley_slope",
            &self.np_inter_valley_slope,
        );
        store.set_noise_params("mgvalleys_np_rivers", &self.np_rivers);
        store.set_noise_params("mgvalleys_np_terrain_height", &self.np_terrain_height);
        store.set_noise_params("mgvalleys_np_valley_depth", &self.np_valley_depth);
        store.set_noise_params("mgvalleys_np_valley_profile", &self.np_valley_profile);
        store.set_noise_params("mgvalleys_np_cave1", &self.np_cave1);
        store.set_noise_params("mgvalleys_np_cave2", &self.np_cave2);
        store.set_noise_params("mgvalleys_np_cavern", &self.np_cavern);
    }
}

/// Watershed's full tunable parameter set (spec.md §6 "Watershed
/// defaults").
#[derive(Debug, Clone, PartialEq)]
pub struct WatershedParams {
    pub seed: i32,
    pub flags: WatershedFlags,

    pub map_scale: f32,
    pub sea_y: i16,
    pub flat_y: i16,
    pub continent_area: f32,
    pub river_width: f32,
    pub river_depth: f32,
    pub river_bank: f32,
    pub big_dungeon_ymin: i16,
    pub big_dungeon_ymax: i16,
    pub large_cave_depth: i16,

    pub np_vent: NoiseParams,
    pub np_continent: NoiseParams,
    pub np_base: NoiseParams,
    pub np_flat: NoiseParams,
    pub np_river1: NoiseParams,
    pub np_river2a: NoiseParams,
    pub np_river2b: NoiseParams,
    pub np_mountain: NoiseParams,
    pub np_plateau: NoiseParams,
    pub np_plat_select: NoiseParams,
    pub np_3d: NoiseParams,
    pub np_big_dungeon: NoiseParams,
}

impl Default for WatershedParams {
    fn default() -> Self {
        Self {
            seed: 0,
            flags: WatershedFlags::VENTS,
            map_scale: 1.0,
            sea_y: 1,
            flat_y: 7,
            continent_area: -1.0,
            river_width: 0.06,
            river_depth: 0.25,
            river_bank: 0.01,
            big_dungeon_ymin: -31000,
            big_dungeon_ymax: 31000,
            large_cave_depth: -33,
            np_vent: NoiseParams::new(-1.0, 1.07, Spread::uniform(48.0), 692, 1, 0.5, 2.0),
            np_continent: NoiseParams::new(
                0.0,
                1.0,
                Spread::uniform(12288.0),
                4001,
                3,
                0.5,
                2.0,
            ),
            np_base: NoiseParams::new(0.0, 1.0, Spread::uniform(2048.0), 106, 3, 0.5, 2.0),
            np_flat: NoiseParams::new(0.0, 0.4, Spread::uniform(2048.0), 909, 3, 0.5, 2.0),
            np_river1: NoiseParams::new(0.0, 1.0, Spread::uniform(1024.0), 2177, 5, 0.5, 2.0),
            np_river2a: NoiseParams::new(0.0, 1.0, Spread::uniform(512.0), 5003, 5, 0.5, 2.0),
            np_river2b: NoiseParams::new(0.0, 1.0, Spread::uniform(512.0), 8839, 5, 0.5, 2.0),
            np_mountain: NoiseParams::new(2.0, -1.0, Spread::uniform(1536.0), 50001, 7, 0.6, 2.0)
                .with_flags(NoiseFlags::EASED | NoiseFlags::ABSVALUE),
            np_plateau: NoiseParams::new(0.5, 0.2, Spread::uniform(1024.0), 8111, 4, 0.4, 2.0),
            np_plat_select: NoiseParams::new(
                -2.0,
                6.0,
                Spread::uniform(2048.0),
                30089,
                8,
                0.7,
                2.0,
            ),
            np_3d: NoiseParams::new(0.0, 1.0, Spread::uniform(384.0), 70033, 5, 0.63, 2.0),
            np_big_dungeon: NoiseParams::new(
                0.0,
                1.25,
                Spread::uniform(128.0),
                23,
                1,
                0.5,
                2.0,
            ),
        }
    }
}

impl WatershedParams {
    /// `div = max(map_scale, 1)` (spec.md §4.4).
    pub fn div(&self) -> f32 {
        self.map_scale.max(1.0)
    }

    pub fn read_params(store: &dyn ConfigSource) -> Self {
        let d = Self::default();
        Self {
            seed: store.get_i32("mgwatershed_seed").unwrap_or(d.seed),
            flags: store
                .get_str("mgwatershed_spflags")
                .map(|s| WatershedFlags::parse(&s))
                .unwrap_or(d.flags),
            map_scale: store.get_f32("mgwatershed_map_scale").unwrap_or(d.map_scale),
            sea_y: store.get_i16("mgwatershed_sea_y").unwrap_or(d.sea_y),
            flat_y: store.get_i16("mgwatershed_flat_y").unwrap_or(d.flat_y),
            continent_area: store
                .get_f32("mgwatershed_continent_area")
                .unwrap_or(d.continent_area),
            river_width: store
                .get_f32("mgwatershed_river_width")
                .unwrap_or(d.river_width),
            river_depth: store
                .get_f32("mgwatershed_river_depth")
                .unwrap_or(d.river_depth),
            river_bank: store
                .get_f32("mgwatershed_river_bank")
                .unwrap_or(d.river_bank),
            big_dungeon_ymin: store
                .get_i16("mgwatershed_big_dungeon_ymin")
                .unwrap_or(d.big_dungeon_ymin),
            big_dungeon_ymax: store
                .get_i16("mgwatershed_big_dungeon_ymax")
                .unwrap_or(d.big_dungeon_ymax),
            large_cave_depth: store
                .get_i16("mgwatershed_large_cave_depth")
                .unwrap_or(d.large_cave_depth),
            np_vent: store
                .get_noise_params("mgwatershed_np_vent")
                .unwrap_or(d.np_vent),
            np_continent: store
                .get_noise_params("mgwatershed_np_continent")
                .unwrap_or(d.np_continent),
            np_base: store
                .get_noise_params("mgwatershed_np_base")
                .unwrap_or(d.np_base),
            np_flat: store
                .get_noise_params("mgwatershed_np_flat")
                .unwrap_or(d.np_flat),
            np_river1: store
                .get_noise_params("mgwatershed_np_river1")
                .unwrap_or(d.np_river1),
            np_river2a: store
                .get_noise_params("mgwatershed_np_river2a")
                .unwrap_or(d.np_river2a),
            np_river2b: store
                .get_noise_params("mgwatershed_np_river2b")
                .unwrap_or(d.np_river2b),
            np_mountain: store
                .get_noise_params("mgwatershed_np_mountain")
                .unwrap_or(d.np_mountain),
            np_plateau: store
                .get_noise_params("mgwatershed_np_plateau")
                .unwrap_or(d.np_plateau),
            np_plat_select: store
                .get_noise_params("mgwatershed_np_plat_select")
                .unwrap_or(d.np_plat_select),
            np_3d: store.get_noise_params("mgwatershed_np_3d").unwrap_or(d.np_3d),
            np_big_dungeon: store
                .get_noise_params("mgwatershed_np_big_dungeon")
                .unwrap_or(d.np_big_dungeon),
        }
    }

    pub fn write_params(&self, store: &mut dyn ConfigSink) {
        store.set_i32("mgwatershed_seed", self.seed);
        store.set_str("mgwatershed_spflags", &self.flags.to_flag_string());
        store.set_f32("mgwatershed_map_scale", self.map_scale);
        store.set_i16("mgwatershed_sea_y", self.sea_y);
        store.set_i16("mgwatershed_flat_y", self.flat_y);
        store.set_f32("mgwatershed_continent_area", self.continent_area);
        store.set_f32("mgwatershed_river_width", self.river_width);
        store.set_f32("mgwatershed_river_depth", self.river_depth);
        store.set_f32("mgwatershed_river_bank", self.river_bank);
        store.set_i16("mgwatershed_big_dungeon_ymin", self.big_dungeon_ymin);
        store.set_i16("mgwatershed_big_dungeon_ymax", self.big_dungeon_ymax);
        store.set_i16("mgwatershed_large_cave_depth", self.large_cave_depth);
        store.set_noise_params("mgwatershed_np_vent", &self.np_vent);
        store.set_noise_params("mgwatershed_np_continent", &self.np_continent);
        store.set_noise_params("mgwatershed_np_base", &self.np_base);
        store.set_noise_params("mgwatershed_np_flat", &self.np_flat);
        store.set_noise_params("mgwatershed_np_river1", &self.np_river1);
        store.set_noise_params("mgwatershed_np_river2a", &self.np_river2a);
        store.set_noise_params("mgwatershed_np_river2b", &self.np_river2b);
        store.set_noise_params("mgwatershed_np_mountain", &self.np_mountain);
        store.set_noise_params("mgwatershed_np_plateau", &self.np_plateau);
        store.set_noise_params("mgwatershed_np_plat_select", &self.np_plat_select);
        store.set_noise_params("mgwatershed_np_3d", &self.np_3d);
        store.set_noise_params("mgwatershed_np_big_dungeon", &self.np_big_dungeon);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapConfigStore {
        values: HashMap<String, String>,
    }

    impl ConfigSource for MapConfigStore {
        fn get_str(&self, key: &str) -> Option<String> {
            self.values.get(key).cloned()
        }
        fn get_f32(&self, key: &str) -> Option<f32> {
            self.values.get(key).and_then(|v| v.parse().ok())
        }
        fn get_u16(&self, key: &str) -> Option<u16> {
            self.values.get(key).and_then(|v| v.parse().ok())
        }
        fn get_i16(&self, key: &str) -> Option<i16> {
            self.values.get(key).and_then(|v| v.parse().ok())
        }
        fn get_i32(&self, key: &str) -> Option<i32> {
            self.values.get(key).and_then(|v| v.parse().ok())
        }
    }

    impl ConfigSink for MapConfigStore {
        fn set_str(&mut self, key: &str, value: &str) {
            self.values.insert(key.to_string(), value.to_string());
        }
        fn set_f32(&mut self, key: &str, value: f32) {
            self.values.insert(key.to_string(), value.to_string());
        }
        fn set_u16(&mut self, key: &str, value: u16) {
            self.values.insert(key.to_string(), value.to_string());
        }
        fn set_i16(&mut self, key: &str, value: i16) {
            self.values.insert(key.to_string(), value.to_string());
        }
        fn set_i32(&mut self, key: &str, value: i32) {
            self.values.insert(key.to_string(), value.to_string());
        }
    }

    #[test]
    fn noiseparams_round_trip_through_flag_string() {
        let p = NoiseParams::new(-10.0, 50.0, Spread::uniform(1024.0), 5202, 6, 0.4, 2.0);
        let rendered = format_noiseparams(&p);
        let parsed = parse_noiseparams(&rendered).unwrap();
        assert_eq!(p, parsed);
    }

    #[test]
    fn noiseparams_round_trip_with_flags() {
        let p = NoiseParams::new(2.0, -1.0, Spread::uniform(1536.0), 50001, 7, 0.6, 2.0)
            .with_flags(NoiseFlags::EASED | NoiseFlags::ABSVALUE);
        let rendered = format_noiseparams(&p);
        let parsed = parse_noiseparams(&rendered).unwrap();
        assert_eq!(p, parsed);
    }

    #[test]
    fn valleys_params_round_trip_is_idempotent() {
        let mut store = MapConfigStore::default();
        let mut p = ValleysParams::default();
        p.seed = 77;
        p.flags = ValleysFlags::ALT_CHILL | ValleysFlags::CANYONS;
        p.river_size = 9.5;
        p.write_params(&mut store);
        let read_back = ValleysParams::read_params(&store);
        assert_eq!(p, read_back);
    }

    #[test]
    fn watershed_params_round_trip_is_idempotent() {
        let mut store = MapConfigStore::default();
        let mut p = WatershedParams::default();
        p.seed = 123;
        p.map_scale = 2.0;
        p.flags = WatershedFlags::empty();
        p.write_params(&mut store);
        let read_back = WatershedParams::read_params(&store);
        assert_eq!(p, read_back);
    }

    #[test]
    fn missing_keys_keep_defaults() {
        let store = MapConfigStore::default();
        assert_eq!(ValleysParams::read_params(&store), ValleysParams::default());
        assert_eq!(
            WatershedParams::read_params(&store),
            WatershedParams::default()
        );
    }

    #[test]
    fn valleys_flag_negation_after_set_wins() {
        assert_eq!(
            ValleysFlags::parse("canyons,nocanyons"),
            ValleysFlags::empty()
        );
        assert_eq!(
            ValleysFlags::parse("nocanyons,canyons"),
            ValleysFlags::CANYONS
        );
    }

    #[test]
    fn watershed_flag_round_trips() {
        let flags = WatershedFlags::VENTS;
        assert_eq!(WatershedFlags::parse(&flags.to_flag_string()), flags);
        assert_eq!(WatershedFlags::parse(""), WatershedFlags::empty());
    }
}
