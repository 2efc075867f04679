use glam::{Vec3, Vec4, Vec4Swizzles};

use crate::Texture;

/// Uniform names the baker looks materials up by.
pub mod uniforms {
    pub const ALBEDO_MAP: &str = "albedoMap";
    pub const BASE_COLOR: &str = "vColor";
    pub const EMISSION: &str = "emissionVal";
    pub const ROUGHNESS: &str = "roughnessVal";
}

/// Named-uniform view of a surface material.
pub trait Material: Send + Sync {
    /// Materials that aren't loaded are treated as missing.
    fn is_loaded(&self) -> bool {
        true
    }

    fn texture(&self, name: &str) -> Option<&Texture>;
    fn color(&self, name: &str) -> Option<Vec4>;
    fn float(&self, name: &str) -> Option<f32>;
}

/// Roughness used to jitter bounce rays when a material doesn't say
/// otherwise.
pub const DEFAULT_ROUGHNESS: f32 = 0.2;

pub(crate) fn loaded(
    material: Option<&dyn Material>,
) -> Option<&dyn Material> {
    material.filter(|material| material.is_loaded())
}

/// Returns the albedo texture together with its tint, i.e. base color scaled
/// by `emission + 1`.
pub(crate) fn albedo(material: &dyn Material) -> (Option<&Texture>, Vec3) {
    let color = material
        .color(uniforms::BASE_COLOR)
        .unwrap_or(Vec4::ONE)
        .xyz();

    let emission = material.float(uniforms::EMISSION).unwrap_or(0.0);

    (material.texture(uniforms::ALBEDO_MAP), color * (emission + 1.0))
}

pub(crate) fn roughness(material: &dyn Material) -> Option<f32> {
    material
        .float(uniforms::ROUGHNESS)
        .map(|roughness| roughness.clamp(0.1, 0.9))
}

/// Plain material with the uniforms the baker understands.
#[derive(Clone, Debug)]
pub struct StandardMaterial {
    albedo_map: Option<Texture>,
    base_color: Vec4,
    emission: f32,
    roughness: f32,
    loaded: bool,
}

impl StandardMaterial {
    pub fn with_albedo_map(mut self, albedo_map: Option<Texture>) -> Self {
        self.albedo_map = albedo_map;
        self
    }

    pub fn with_base_color(mut self, base_color: Vec4) -> Self {
        self.base_color = base_color;
        self
    }

    pub fn with_emission(mut self, emission: f32) -> Self {
        self.emission = emission;
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    pub fn with_loaded(mut self, loaded: bool) -> Self {
        self.loaded = loaded;
        self
    }
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            albedo_map: None,
            base_color: Vec4::ONE,
            emission: 0.0,
            roughness: DEFAULT_ROUGHNESS,
            loaded: true,
        }
    }
}

impl Material for StandardMaterial {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn texture(&self, name: &str) -> Option<&Texture> {
        match name {
            uniforms::ALBEDO_MAP => self.albedo_map.as_ref(),
            _ => None,
        }
    }

    fn color(&self, name: &str) -> Option<Vec4> {
        match name {
            uniforms::BASE_COLOR => Some(self.base_color),
            _ => None,
        }
    }

    fn float(&self, name: &str) -> Option<f32> {
        match name {
            uniforms::EMISSION => Some(self.emission),
            uniforms::ROUGHNESS => Some(self.roughness),
            _ => None,
        }
    }
}
