use std::num::NonZeroUsize;

/// Tunables of a single bake; read-only once the bake starts.
#[derive(Clone, Debug, PartialEq)]
pub struct BakeConfig {
    /// Texel resolution of surfaces asking for [`LightmapSize::Default`].
    pub lightmap_size: u32,

    /// Whether indirect lighting is estimated at all.
    pub gi: bool,

    /// Number of bounces traced per indirect sample.
    pub gi_bounces: u32,

    /// Multiplier applied to every indirect splat.
    pub gi_intensity: f32,

    pub gi_quality: GiQuality,

    /// Size of the shading worker pool; `None` lets the pool pick one thread
    /// per core.
    pub worker_threads: Option<NonZeroUsize>,

    /// Base seed of the per-unit random streams.
    pub seed: u64,

    /// Whether untouched texels get filled from their nearest shaded
    /// neighbour before post-processing.
    pub dilate: bool,
}

impl BakeConfig {
    pub fn with_lightmap_size(mut self, lightmap_size: u32) -> Self {
        self.lightmap_size = lightmap_size;
        self
    }

    pub fn with_gi(mut self, gi: bool) -> Self {
        self.gi = gi;
        self
    }

    pub fn with_gi_bounces(mut self, gi_bounces: u32) -> Self {
        self.gi_bounces = gi_bounces;
        self
    }

    pub fn with_gi_intensity(mut self, gi_intensity: f32) -> Self {
        self.gi_intensity = gi_intensity;
        self
    }

    pub fn with_gi_quality(mut self, gi_quality: GiQuality) -> Self {
        self.gi_quality = gi_quality;
        self
    }

    pub fn with_worker_threads(
        mut self,
        worker_threads: Option<NonZeroUsize>,
    ) -> Self {
        self.worker_threads = worker_threads;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_dilate(mut self, dilate: bool) -> Self {
        self.dilate = dilate;
        self
    }

    /// Resolves a surface's requested size into texels.
    pub fn texels(&self, size: LightmapSize) -> u32 {
        size.texels(self.lightmap_size)
    }
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            lightmap_size: 256,
            gi: true,
            gi_bounces: 1,
            gi_intensity: 0.8,
            gi_quality: GiQuality::Normal,
            worker_threads: None,
            seed: 0,
            dilate: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GiQuality {
    Low,
    #[default]
    Normal,
    High,
    VeryHigh,
}

impl GiQuality {
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(Self::Low),
            1 => Some(Self::Normal),
            2 => Some(Self::High),
            3 => Some(Self::VeryHigh),
            _ => None,
        }
    }

    /// Sampling multiplier: ordinal plus one.
    pub fn multiplier(self) -> u32 {
        match self {
            Self::Low => 1,
            Self::Normal => 2,
            Self::High => 3,
            Self::VeryHigh => 4,
        }
    }

    /// Number of indirect samples taken per lit texel and light.
    pub fn iterations(self) -> u32 {
        self.multiplier() * 4
    }
}

/// Per-surface light-map resolution, as picked in the editor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LightmapSize {
    #[default]
    Default,
    X64,
    X128,
    X256,
    X512,
    X1024,
    X2048,
    X4096,
}

impl LightmapSize {
    /// Maps the serialized enum value; unknown values fall back to
    /// [`Self::Default`].
    pub fn from_index(index: i32) -> Self {
        match index {
            1 => Self::X64,
            2 => Self::X128,
            3 => Self::X256,
            4 => Self::X512,
            5 => Self::X1024,
            6 => Self::X2048,
            7 => Self::X4096,
            _ => Self::Default,
        }
    }

    pub fn texels(self, default: u32) -> u32 {
        match self {
            Self::Default => default,
            Self::X64 => 64,
            Self::X128 => 128,
            Self::X256 => 256,
            Self::X512 => 512,
            Self::X1024 => 1024,
            Self::X2048 => 2048,
            Self::X4096 => 4096,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lightmap_sizes() {
        let expected = [
            (0, 256),
            (1, 64),
            (2, 128),
            (3, 256),
            (4, 512),
            (5, 1024),
            (6, 2048),
            (7, 4096),
        ];

        for (index, texels) in expected {
            assert_eq!(texels, LightmapSize::from_index(index).texels(256));
        }

        assert_eq!(LightmapSize::Default, LightmapSize::from_index(0));
        assert_eq!(LightmapSize::Default, LightmapSize::from_index(8));
        assert_eq!(LightmapSize::Default, LightmapSize::from_index(-1));
        assert_eq!(32, LightmapSize::from_index(42).texels(32));
    }

    #[test]
    fn gi_quality() {
        assert_eq!(Some(GiQuality::Low), GiQuality::from_index(0));
        assert_eq!(Some(GiQuality::VeryHigh), GiQuality::from_index(3));
        assert_eq!(None, GiQuality::from_index(4));

        assert_eq!(4, GiQuality::Low.iterations());
        assert_eq!(8, GiQuality::Normal.iterations());
        assert_eq!(16, GiQuality::VeryHigh.iterations());
    }

    #[test]
    fn builder() {
        let target = BakeConfig::default()
            .with_lightmap_size(64)
            .with_gi(false)
            .with_gi_bounces(3)
            .with_gi_intensity(1.5)
            .with_gi_quality(GiQuality::High)
            .with_worker_threads(NonZeroUsize::new(2))
            .with_seed(7)
            .with_dilate(true);

        assert_eq!(64, target.texels(LightmapSize::Default));
        assert_eq!(512, target.texels(LightmapSize::X512));
        assert!(!target.gi);
        assert_eq!(3, target.gi_bounces);
        assert_eq!(1.5, target.gi_intensity);
        assert_eq!(GiQuality::High, target.gi_quality);
        assert_eq!(NonZeroUsize::new(2), target.worker_threads);
        assert_eq!(7, target.seed);
        assert!(target.dilate);
    }
}
