use crate::{BakeConfig, BakeScene, LightmapRegistry, TextureCache};

/// State shared by every shading job of a single bake.
#[derive(Clone, Copy)]
pub struct BakeContext<'a> {
    pub config: &'a BakeConfig,
    pub registry: &'a LightmapRegistry,
    pub textures: &'a TextureCache,
    pub scene: &'a dyn BakeScene,
}
