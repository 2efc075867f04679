use glam::{EulerRot, Quat, Vec2, Vec3};
use lightbake_math::{
    lightmap_uv, texel_coordinate, world_to_uv, F32Ext, TexelColor,
};
use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::material::{self, DEFAULT_ROUGHNESS};
use crate::{BakeContext, LightmapUnit, Material, Ray, RaycastFilter};

/// How far rays get pushed below the surface they start from.
const SURFACE_OFFSET: f32 = 0.001;

/// Largest per-axis rotation (in degrees, at roughness `1.0`) applied to the
/// normal when picking a bounce direction.
const MAX_JITTER: f32 = 89.0;

/// Radius of the splat disc, in texels.
const SPLAT_RADIUS: i32 = 2;

/// Estimates indirect lighting by bouncing light off nearby surfaces and
/// splatting it into their indirect buffers.
pub struct BounceSampler<'a> {
    ctx: BakeContext<'a>,
    rng: StdRng,
    stats: BounceStats,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BounceStats {
    /// Number of splats written.
    pub splats: usize,

    /// Number of bounces that hit a light-mapped surface which has no unit
    /// allocated.
    pub orphan_hits: usize,
}

impl<'a> BounceSampler<'a> {
    pub fn new(ctx: BakeContext<'a>, seed: u64) -> Self {
        Self {
            ctx,
            rng: StdRng::seed_from_u64(seed),
            stats: Default::default(),
        }
    }

    pub fn stats(&self) -> BounceStats {
        self.stats
    }

    /// Traces light leaving `position` (a point lit with `energy`) and
    /// splats it wherever it lands.
    ///
    /// `material` is the material of the surface the light starts from; its
    /// roughness controls how far bounce rays stray from `normal`.
    pub fn sample(
        &mut self,
        position: Vec3,
        normal: Vec3,
        energy: TexelColor,
        material: Option<&dyn Material>,
    ) {
        let ctx = self.ctx;
        let config = ctx.config;
        let quality = config.gi_quality.multiplier() as f32;

        let roughness = material::loaded(material)
            .and_then(material::roughness)
            .unwrap_or(DEFAULT_ROUGHNESS);

        for _ in 0..config.gi_quality.iterations() {
            let mut position = position - normal * SURFACE_OFFSET;
            let mut normal = normal;
            let mut energy = energy.clamped();
            let mut roughness = roughness;

            for bounce in 0..config.gi_bounces {
                let direction = self.jitter(normal, roughness);

                let hits = ctx.scene.raycast(
                    Ray::new(position, direction),
                    RaycastFilter::BAKE,
                );

                let Some(hit) = hits.into_iter().next() else {
                    break;
                };

                let Some(key) = &hit.surface else {
                    continue;
                };

                position = hit.point;
                normal = hit.normal;

                let mut reflected = TexelColor::WHITE;

                let hit_material = material::loaded(hit.material.as_deref());

                if let Some(material) = hit_material {
                    if let Some(hit_roughness) = material::roughness(material) {
                        roughness = hit_roughness;
                    }

                    reflected = ctx.textures.albedo(
                        material,
                        hit.positions,
                        position,
                        hit.uv0s,
                    );
                }

                let uvs = hit.uv1s.map(lightmap_uv);
                let uv = world_to_uv(hit.positions, position, uvs);

                position -= hit.normal * SURFACE_OFFSET;

                if let Some(unit) = ctx.registry.find(key) {
                    let falloff = config.gi_intensity / quality * 0.1
                        / (bounce + 1) as f32;

                    let color = (energy * falloff).with_alpha(1.0).clamped();

                    self.splat(unit, uv, color);
                } else {
                    trace!("No light-map allocated for `{}`", key);
                    self.stats.orphan_hits += 1;
                }

                energy *= reflected;
            }
        }
    }

    /// Rotates `normal` by random angles, scaled by `roughness`.
    fn jitter(&mut self, normal: Vec3, roughness: f32) -> Vec3 {
        let mut angle = || {
            (self.rng.gen_range(-roughness..=roughness) * MAX_JITTER)
                .to_radians()
        };

        let (roll, pitch, yaw) = (angle(), angle(), angle());

        Quat::from_euler(EulerRot::ZYX, yaw, pitch, roll) * normal
    }

    /// Blends `color` into a small disc around `uv` of unit's indirect
    /// buffer, with a linear falloff towards the disc's edge.
    fn splat(&mut self, unit: &LightmapUnit, uv: Vec2, color: TexelColor) {
        let size = unit.size();
        let i = texel_coordinate(uv.x, size);
        let j = texel_coordinate(uv.y, size);
        let mut buffer = unit.indirect();

        for di in -SPLAT_RADIUS..=SPLAT_RADIUS {
            for dj in -SPLAT_RADIUS..=SPLAT_RADIUS {
                let Some(texel) = buffer.get_mut(i + di, j + dj) else {
                    continue;
                };

                let distance = ((di * di + dj * dj) as f32).sqrt();
                let falloff = (SPLAT_RADIUS as f32 - distance).saturate();
                let brush = TexelColor::new(falloff, falloff, falloff, 1.0);

                *texel += color * brush * (TexelColor::ONE - *texel);
                texel.clamp();
            }
        }

        self.stats.splats += 1;
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{vec3, vec4};
    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::{
        BakeConfig, BakeScene, GiQuality, LightmapRegistry, SceneSurface,
        StandardMaterial, StaticScene, SurfaceKey, Texture, TextureCache,
        TextureHandle,
    };

    /// Floor at y = 0 (facing up) under a ceiling at y = 1 (facing down).
    fn scene() -> StaticScene {
        StaticScene::new("scene")
            .with_surface(SceneSurface::plane(
                SurfaceKey::mesh_part("floor", 0),
                vec3(-1.0, 0.0, -1.0),
                vec3(0.0, 0.0, 2.0),
                vec3(2.0, 0.0, 0.0),
            ))
            .with_surface(SceneSurface::plane(
                SurfaceKey::mesh_part("ceiling", 0),
                vec3(-1.0, 1.0, -1.0),
                vec3(2.0, 0.0, 0.0),
                vec3(0.0, 0.0, 2.0),
            ))
    }

    fn sample(
        config: &BakeConfig,
        scene: &StaticScene,
        registry: &LightmapRegistry,
    ) -> BounceStats {
        let textures = TextureCache::new();

        let ctx = BakeContext {
            config,
            registry,
            textures: &textures,
            scene,
        };

        let mut target = BounceSampler::new(ctx, 1234);

        target.sample(
            vec3(0.0, 0.0, 0.0),
            Vec3::Y,
            TexelColor::new(1.0, 1.0, 1.0, 0.0),
            None,
        );

        target.stats()
    }

    #[test]
    fn splats_into_the_surface_above() {
        let config = BakeConfig::default()
            .with_lightmap_size(16)
            .with_gi_quality(GiQuality::Low);

        let scene = scene();
        let registry = LightmapRegistry::allocate(&config, scene.surfaces());
        let stats = sample(&config, &scene, &registry);

        assert_eq!(4, stats.splats);
        assert_eq!(0, stats.orphan_hits);

        let ceiling = registry
            .find(&SurfaceKey::mesh_part("ceiling", 0))
            .unwrap()
            .indirect()
            .clone();

        let floor = registry
            .find(&SurfaceKey::mesh_part("floor", 0))
            .unwrap()
            .indirect()
            .clone();

        assert!(floor.iter().all(|texel| *texel == TexelColor::ZERO));

        let brightest = ceiling
            .iter()
            .map(|texel| texel.r)
            .fold(0.0f32, f32::max);

        // Each splat's center gets 0.8 / 1 * 0.1 / 1 of energy
        assert!(brightest >= 0.08 - 1e-5);
        assert!(brightest <= 1.0);
        assert!(ceiling.iter().all(|texel| texel.a <= 1.0));
    }

    #[test]
    fn second_bounce_carries_albedo_and_half_the_energy() {
        // Yellow texture tinted down to orange
        let texture = Texture::from_image(
            TextureHandle::next(),
            RgbaImage::from_pixel(2, 2, Rgba([255, 255, 0, 255])),
        );

        let paint = StandardMaterial::default()
            .with_albedo_map(Some(texture))
            .with_base_color(vec4(1.0, 0.5, 1.0, 1.0))
            .with_roughness(0.1);

        let scene = StaticScene::new("scene")
            .with_surface(SceneSurface::plane(
                SurfaceKey::mesh_part("floor", 0),
                vec3(-1.0, 0.0, -1.0),
                vec3(0.0, 0.0, 2.0),
                vec3(2.0, 0.0, 0.0),
            ))
            .with_surface(
                SceneSurface::plane(
                    SurfaceKey::mesh_part("ceiling", 0),
                    vec3(-1.0, 1.0, -1.0),
                    vec3(2.0, 0.0, 0.0),
                    vec3(0.0, 0.0, 2.0),
                )
                .with_material(paint),
            );

        // Single-texel light-maps make every splat land on the same texel
        let config = BakeConfig::default()
            .with_lightmap_size(1)
            .with_gi_quality(GiQuality::Low)
            .with_gi_bounces(2);

        let registry = LightmapRegistry::allocate(&config, scene.surfaces());
        let stats = sample(&config, &scene, &registry);

        // Up to the ceiling, then back down to the floor
        assert_eq!(8, stats.splats);
        assert_eq!(0, stats.orphan_hits);

        let texel = |guid: &str| {
            let unit = registry.find(&SurfaceKey::mesh_part(guid, 0)).unwrap();

            unit.indirect()[(0, 0)]
        };

        // Four splats blended with `t += c * (1 - t)`
        let blended = |c: f32| 1.0 - (1.0 - c).powi(4);

        let ceiling = texel("ceiling");

        assert_relative_eq!(ceiling.r, blended(0.08), epsilon = 1e-5);
        assert_relative_eq!(ceiling.g, blended(0.08), epsilon = 1e-5);
        assert_relative_eq!(ceiling.b, blended(0.08), epsilon = 1e-5);
        assert_eq!(1.0, ceiling.a);

        let floor = texel("floor");

        assert_relative_eq!(floor.r, blended(0.04), epsilon = 1e-5);
        assert_relative_eq!(floor.g, blended(0.02), epsilon = 1e-5);
        assert_eq!(0.0, floor.b);
        assert_eq!(1.0, floor.a);
    }

    #[test]
    fn zero_bounces_means_zero_splats() {
        let config = BakeConfig::default()
            .with_lightmap_size(16)
            .with_gi_quality(GiQuality::VeryHigh)
            .with_gi_intensity(10.0)
            .with_gi_bounces(0);

        let scene = scene();
        let registry = LightmapRegistry::allocate(&config, scene.surfaces());
        let stats = sample(&config, &scene, &registry);

        assert_eq!(0, stats.splats);

        for unit in registry.iter() {
            assert!(unit.indirect().iter().all(|t| *t == TexelColor::ZERO));
        }
    }

    #[test]
    fn orphan_hits_are_skipped() {
        let config = BakeConfig::default()
            .with_lightmap_size(16)
            .with_gi_quality(GiQuality::Low);

        let scene = scene();

        // Only the floor gets a unit
        let registry = LightmapRegistry::allocate(
            &config,
            scene
                .surfaces()
                .into_iter()
                .filter(|surface| surface.key().guid == "floor"),
        );

        let stats = sample(&config, &scene, &registry);

        assert_eq!(0, stats.splats);
        assert_eq!(4, stats.orphan_hits);
    }

    #[test]
    fn jitter_stays_around_normal() {
        let config = BakeConfig::default();
        let scene = scene();
        let registry = LightmapRegistry::default();
        let textures = TextureCache::new();

        let mut target = BounceSampler::new(
            BakeContext {
                config: &config,
                registry: &registry,
                textures: &textures,
                scene: &scene,
            },
            0,
        );

        for _ in 0..64 {
            let direction = target.jitter(Vec3::Y, 0.2);

            assert_relative_eq!(direction.length(), 1.0, epsilon = 1e-4);
            assert!(direction.y > 0.8);
        }
    }
}
