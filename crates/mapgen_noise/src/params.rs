use bitflags::bitflags;

/// Per-axis noise spread (the inverse of frequency along each axis).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spread {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Spread {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn uniform(v: f64) -> Self {
        Self { x: v, y: v, z: v }
    }
}

bitflags! {
    /// Flags recognized on a [`NoiseParams`] value, per spec.md §3.
    ///
    /// `EASED` and `ABSVALUE` are real shape modifiers (see
    /// `NoiseField::octave_sum`); `DEFAULTS` is a legacy config-string
    /// marker carried through for round-trip fidelity (`ParamStore`
    /// idempotence, spec.md §8) without further numeric effect, since this
    /// crate's external collaborator (the coherent-noise primitive) does
    /// not expose a distinct default-vs-explicit value mode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NoiseFlags: u32 {
        const EASED    = 1 << 0;
        const ABSVALUE = 1 << 1;
        const DEFAULTS = 1 << 2;
    }
}

impl NoiseFlags {
    /// Parse a comma-separated flag-string such as `"eased,noabsvalue"`.
    /// Tokens are applied left to right: a later `<flag>` sets it, a
    /// later `no<flag>` clears it, so `"noeased,eased"` ends up set while
    /// `"eased,noeased"` ends up cleared. Unknown tokens are ignored.
    pub fn parse(s: &str) -> Self {
        let mut flags = NoiseFlags::empty();
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

    fn from_name(name: &str) -> Option<NoiseFlags> {
        match name {
            "eased" => Some(NoiseFlags::EASED),
            "absvalue" => Some(NoiseFlags::ABSVALUE),
            "defaults" => Some(NoiseFlags::DEFAULTS),
            _ => None,
        }
    }

    /// Render as the comma-separated token list `writeParams` persists.
    pub fn to_flag_string(self) -> String {
        let mut tokens = Vec::new();
        if self.contains(NoiseFlags::EASED) {
            tokens.push("eased");
        }
        if self.contains(NoiseFlags::ABSVALUE) {
            tokens.push("absvalue");
        }
        if self.contains(NoiseFlags::DEFAULTS) {
            tokens.push("defaults");
        }
        tokens.join(",")
    }
}

/// Immutable, value-semantics noise parameter set (spec.md §3).
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseParams {
    pub offset: f64,
    pub scale: f64,
    pub spread: Spread,
    pub seed: i32,
    pub octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,
    pub flags: NoiseFlags,
}

impl NoiseParams {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        offset: f64,
        scale: f64,
        spread: Spread,
        seed: i32,
        octaves: u32,
        persistence: f64,
        lacunarity: f64,
    ) -> Self {
        Self {
            offset,
            scale,
            spread,
            seed,
            octaves,
            persistence,
            lacunarity,
            flags: NoiseFlags::empty(),
        }
    }

    pub fn with_flags(mut self, flags: NoiseFlags) -> Self {
        self.flags = flags;
        self
    }
}
