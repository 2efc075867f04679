use std::sync::Arc;

use fxhash::FxHashMap;
use glam::{Vec2, Vec3};
use image::RgbaImage;
use lightbake_math::{texel_coordinate, world_to_uv, TexelColor};
use log::warn;
use parking_lot::Mutex;

use crate::{material, Material, Texture, TextureHandle};

/// Per-bake cache of decoded textures.
///
/// Textures that fail to decode are remembered as missing and sample as
/// white, so a broken asset is reported once and never retried within the
/// same bake.
#[derive(Default)]
pub struct TextureCache {
    images: Mutex<FxHashMap<TextureHandle, Option<Arc<RgbaImage>>>>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches texel nearest to `uv`; rows are addressed bottom-up.
    ///
    /// Alpha is always `1.0`.
    pub fn sample(&self, texture: &Texture, uv: Vec2) -> TexelColor {
        let Some(image) = self.image(texture) else {
            return TexelColor::ONE;
        };

        let (width, height) = image.dimensions();

        if width == 0 || height == 0 {
            return TexelColor::ONE;
        }

        let x = texel_coordinate(uv.x, width) as u32;
        let y = texel_coordinate(uv.y, height) as u32;
        let [r, g, b, _] = image.get_pixel(x, height - 1 - y).0;

        TexelColor::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            1.0,
        )
    }

    /// Returns the tinted albedo of `material` at world-space `point` of a
    /// triangle, or white when the material has no albedo texture.
    ///
    /// Alpha of the result is always `0.0`.
    pub fn albedo(
        &self,
        material: &dyn Material,
        positions: [Vec3; 3],
        point: Vec3,
        uvs: [Vec2; 3],
    ) -> TexelColor {
        let (texture, tint) = material::albedo(material);

        let Some(texture) = texture else {
            return TexelColor::WHITE;
        };

        let uv = world_to_uv(positions, point, uvs);

        self.sample(texture, uv) * TexelColor::rgb(tint)
    }

    pub fn len(&self) -> usize {
        self.images.lock().len()
    }

    pub fn clear(&self) {
        self.images.lock().clear();
    }

    fn image(&self, texture: &Texture) -> Option<Arc<RgbaImage>> {
        if let Some(image) = self.images.lock().get(&texture.handle()) {
            return image.clone();
        }

        // Decoding happens outside of the lock; if two workers race for the
        // same texture, the first insert wins
        let image = match texture.decode() {
            Ok(image) => Some(image),

            Err(err) => {
                warn!("{}; sampling it as white", err);
                None
            }
        };

        self.images
            .lock()
            .entry(texture.handle())
            .or_insert(image)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use glam::{vec2, vec3, vec4};
    use image::Rgba;

    use super::*;
    use crate::StandardMaterial;

    fn checker() -> Texture {
        // Top row is red, bottom row is blue
        let image = RgbaImage::from_fn(2, 2, |_, y| {
            if y == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });

        Texture::from_image(TextureHandle::next(), image)
    }

    #[test]
    fn sample_rows_are_bottom_up() {
        let target = TextureCache::new();
        let texture = checker();

        assert_eq!(
            TexelColor::new(0.0, 0.0, 1.0, 1.0),
            target.sample(&texture, vec2(0.25, 0.25))
        );

        assert_eq!(
            TexelColor::new(1.0, 0.0, 0.0, 1.0),
            target.sample(&texture, vec2(0.25, 0.75))
        );

        assert_eq!(1, target.len());

        target.clear();

        assert_eq!(0, target.len());
    }

    #[test]
    fn missing_textures_sample_white() {
        let target = TextureCache::new();

        let texture = Texture::from_file(
            TextureHandle::next(),
            "/nonexistent/lightbake/albedo.png",
        );

        assert_eq!(TexelColor::ONE, target.sample(&texture, vec2(0.5, 0.5)));
        assert_eq!(TexelColor::ONE, target.sample(&texture, vec2(0.1, 0.1)));

        // Failure is cached too
        assert_eq!(1, target.len());
    }

    #[test]
    fn albedo_is_tinted() {
        let target = TextureCache::new();

        let material = StandardMaterial::default()
            .with_albedo_map(Some(checker()))
            .with_base_color(vec4(0.5, 0.5, 0.5, 1.0));

        let positions = [Vec3::ZERO, Vec3::X, Vec3::Z];
        let uvs = [vec2(0.0, 0.0), vec2(1.0, 0.0), vec2(0.0, 1.0)];

        let color = target.albedo(
            &material,
            positions,
            vec3(0.1, 0.0, 0.1),
            uvs,
        );

        assert_eq!(TexelColor::new(0.0, 0.0, 0.5, 0.0), color);

        let color = target.albedo(
            &StandardMaterial::default(),
            positions,
            vec3(0.1, 0.0, 0.1),
            uvs,
        );

        assert_eq!(TexelColor::WHITE, color);
    }
}
