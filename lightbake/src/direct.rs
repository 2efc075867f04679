use glam::Vec3;
use lightbake_math::{F32Ext, TexelColor};

use crate::{
    BakeContext, BounceSampler, Light, LightKind, Material, Ray, RaycastFilter,
};

/// Shadow rays ignore hits closer than this to their far end, so that the
/// shaded surface doesn't occlude itself.
const SHADOW_TOLERANCE: f32 = 0.001;

/// How far away directional lights are assumed to be.
const DIRECTIONAL_DISTANCE: f32 = 1000.0;

/// Computes direct lighting of texels of a single surface.
pub struct DirectShader<'a> {
    ctx: BakeContext<'a>,
    lights: &'a [Light],
    material: Option<&'a dyn Material>,
    bounces: BounceSampler<'a>,
}

impl<'a> DirectShader<'a> {
    pub fn new(
        ctx: BakeContext<'a>,
        lights: &'a [Light],
        material: Option<&'a dyn Material>,
        seed: u64,
    ) -> Self {
        Self {
            ctx,
            lights,
            material,
            bounces: BounceSampler::new(ctx, seed),
        }
    }

    pub fn bounces(&self) -> &BounceSampler<'a> {
        &self.bounces
    }

    /// Returns direct lighting at given point.
    ///
    /// `pixel` is the surface's albedo at that point; it only tints the
    /// energy handed over to the bounce sampler.
    ///
    /// Occluded lights get subtracted from the result instead of being
    /// skipped; that's what lets shadows of one light darken areas lit by
    /// another one.
    pub fn shade(
        &mut self,
        position: Vec3,
        normal: Vec3,
        pixel: TexelColor,
    ) -> TexelColor {
        let mut color = TexelColor::ZERO;

        for light in self.lights {
            let Some(incidence) = Incidence::new(light, position, normal) else {
                continue;
            };

            let occluded = light.cast_shadows && self.is_occluded(&incidence);

            if occluded {
                color -= incidence.color;
            } else {
                color += incidence.color;
            }

            color.clamp();

            if self.ctx.config.gi && !occluded {
                self.bounces.sample(
                    position,
                    normal,
                    incidence.color * pixel,
                    self.material,
                );
            }
        }

        color
    }

    fn is_occluded(&self, incidence: &Incidence) -> bool {
        let max_distance = incidence.shadow_distance - SHADOW_TOLERANCE;

        self.ctx
            .scene
            .raycast(incidence.shadow_ray, RaycastFilter::BAKE)
            .iter()
            .any(|hit| hit.distance < max_distance)
    }
}

/// Light arriving at a point from a single light source.
#[derive(Clone, Copy, Debug)]
struct Incidence {
    color: TexelColor,

    /// Ray travelling from the light towards the point.
    shadow_ray: Ray,

    /// Distance between the shadow ray's origin and the point.
    shadow_distance: f32,
}

impl Incidence {
    fn new(light: &Light, position: Vec3, normal: Vec3) -> Option<Self> {
        let (intensity, shadow_ray, shadow_distance) = match light.kind {
            LightKind::Directional { direction } => {
                let direction = direction.normalize_or_zero();
                let intensity = -direction.dot(normal) * light.intensity;

                let ray = Ray::new(
                    position - direction * DIRECTIONAL_DISTANCE,
                    direction,
                );

                (intensity, ray, DIRECTIONAL_DISTANCE)
            }

            LightKind::Point {
                position: light_position,
                radius,
            } => {
                let (light_dir, distance) =
                    Self::towards(light_position, position);

                if distance >= radius {
                    return None;
                }

                let attenuation = distance.smoothstep(radius, 0.0);

                let intensity = (light_dir.dot(normal)
                    * attenuation
                    * light.intensity)
                    .saturate();

                let ray = Ray::new(light_position, -light_dir);

                (intensity, ray, distance)
            }

            LightKind::Spot {
                position: light_position,
                direction,
                radius,
                inner_angle,
                outer_angle,
            } => {
                let (light_dir, distance) =
                    Self::towards(light_position, position);

                let attenuation = (1.0 - distance / (1.2 * radius)).saturate();

                let cone = Self::cone(
                    light_dir.dot(-direction.normalize_or_zero()).saturate(),
                    inner_angle,
                    outer_angle,
                );

                let intensity = (light_dir.dot(normal)
                    * attenuation
                    * cone
                    * light.intensity)
                    .saturate();

                let ray = Ray::new(light_position, -light_dir);

                (intensity, ray, distance)
            }
        };

        if intensity <= 0.0 || !intensity.is_finite() {
            return None;
        }

        Some(Self {
            color: TexelColor::rgb(light.color * intensity),
            shadow_ray,
            shadow_distance,
        })
    }

    /// Returns the unit vector pointing from `position` to `light` and the
    /// distance between both.
    fn towards(light: Vec3, position: Vec3) -> (Vec3, f32) {
        let offset = light - position;

        (offset.normalize_or_zero(), offset.length())
    }

    /// Falloff of a spot light's cone, for a point seen at given angle
    /// cosine; angles are in degrees.
    fn cone(cos_angle: f32, inner_angle: f32, outer_angle: f32) -> f32 {
        let inner = inner_angle.to_radians().cos();
        let outer = outer_angle.to_radians().cos();

        if (outer - inner).abs() < f32::EPSILON {
            return if cos_angle >= inner { 1.0 } else { 0.0 };
        }

        1.0 - ((cos_angle - inner) / (outer - inner)).saturate()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec3;

    use super::*;
    use crate::{
        BakeConfig, LightmapRegistry, SceneSurface, StaticScene, SurfaceKey,
        TextureCache,
    };

    fn floor() -> SceneSurface {
        SceneSurface::plane(
            SurfaceKey::mesh_part("floor", 0),
            vec3(-1.0, 0.0, -1.0),
            vec3(0.0, 0.0, 2.0),
            vec3(2.0, 0.0, 0.0),
        )
    }

    /// Small quad hovering over the floor's center, facing up.
    fn blocker() -> SceneSurface {
        SceneSurface::plane(
            SurfaceKey::mesh_part("blocker", 0),
            vec3(-0.25, 0.5, -0.25),
            vec3(0.0, 0.0, 0.5),
            vec3(0.5, 0.0, 0.0),
        )
    }

    fn shade(
        scene: &StaticScene,
        lights: &[Light],
        position: Vec3,
    ) -> TexelColor {
        let config = BakeConfig::default().with_gi(false);
        let registry = LightmapRegistry::default();
        let textures = TextureCache::new();

        let ctx = BakeContext {
            config: &config,
            registry: &registry,
            textures: &textures,
            scene,
        };

        DirectShader::new(ctx, lights, None, 0).shade(
            position,
            Vec3::Y,
            TexelColor::WHITE,
        )
    }

    #[test]
    fn directional_light() {
        let scene = StaticScene::new("scene").with_surface(floor());
        let lights = [Light::directional(-Vec3::Y)];
        let color = shade(&scene, &lights, Vec3::ZERO);

        assert_relative_eq!(color.r, 1.0, epsilon = 1e-5);
        assert_relative_eq!(color.g, 1.0, epsilon = 1e-5);
        assert_relative_eq!(color.b, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn directional_light_from_below() {
        let scene = StaticScene::new("scene").with_surface(floor());
        let lights = [Light::directional(Vec3::Y)];

        assert_eq!(TexelColor::ZERO, shade(&scene, &lights, Vec3::ZERO));
    }

    #[test]
    fn point_light_falloff() {
        let scene = StaticScene::new("scene").with_surface(floor());

        let lights = [Light::point(vec3(0.0, 1.0, 0.0), 2.0)
            .with_color(vec3(1.0, 0.5, 0.25))];

        // Halfway through the radius, smoothstep yields exactly 0.5
        let color = shade(&scene, &lights, Vec3::ZERO);

        assert_relative_eq!(color.r, 0.5, epsilon = 1e-5);
        assert_relative_eq!(color.g, 0.25, epsilon = 1e-5);
        assert_relative_eq!(color.b, 0.125, epsilon = 1e-5);

        // Out of range
        let lights = [Light::point(vec3(0.0, 3.0, 0.0), 2.0)];

        assert_eq!(TexelColor::ZERO, shade(&scene, &lights, Vec3::ZERO));

        // Right at the edge
        let lights = [Light::point(vec3(0.0, 2.0, 0.0), 2.0)];

        assert_eq!(TexelColor::ZERO, shade(&scene, &lights, Vec3::ZERO));
    }

    #[test]
    fn point_light_without_radius() {
        let scene = StaticScene::new("scene").with_surface(floor());
        let lights = [Light::point(vec3(0.0, 1.0, 0.0), 0.0)];

        assert_eq!(TexelColor::ZERO, shade(&scene, &lights, Vec3::ZERO));

        let lights = [Light::point(Vec3::ZERO, 0.0)];

        assert_eq!(TexelColor::ZERO, shade(&scene, &lights, Vec3::ZERO));
    }

    #[test]
    fn spot_light_cone() {
        let scene = StaticScene::new("scene").with_surface(floor());

        let spot = |direction| {
            Light::spot(vec3(0.0, 1.0, 0.0), direction, 10.0, 20.0, 30.0)
        };

        // Right under the spot: fully inside the cone
        let lights = [spot(-Vec3::Y)];
        let color = shade(&scene, &lights, Vec3::ZERO);

        assert_relative_eq!(color.r, 1.0 - 1.0 / 12.0, epsilon = 1e-5);

        // Pointing away
        let lights = [spot(Vec3::X)];

        assert_eq!(TexelColor::ZERO, shade(&scene, &lights, Vec3::ZERO));
    }

    #[test]
    fn bright_spot_light_saturates_its_penumbra() {
        let scene = StaticScene::new("scene").with_surface(floor());

        // Seen from the spot, the origin lies 45° off its axis, halfway
        // between the inner and outer cone
        let spot = |intensity| {
            Light::spot(vec3(1.0, 1.0, 0.0), -Vec3::Y, 10.0, 30.0, 60.0)
                .with_intensity(intensity)
        };

        let distance = 2.0f32.sqrt();
        let n_dot_l = 1.0 / distance;
        let attenuation = 1.0 - distance / 12.0;
        let inner = 30.0f32.to_radians().cos();
        let outer = 60.0f32.to_radians().cos();
        let cone = 1.0 - (n_dot_l - inner) / (outer - inner);

        let color = shade(&scene, &[spot(1.0)], Vec3::ZERO);

        assert_relative_eq!(
            color.r,
            n_dot_l * attenuation * cone,
            epsilon = 1e-5
        );

        let color = shade(&scene, &[spot(10.0)], Vec3::ZERO);

        assert_relative_eq!(color.r, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn occluded_lights_are_subtracted() {
        let scene = StaticScene::new("scene")
            .with_surface(floor())
            .with_surface(blocker());

        let sun = Light::directional(-Vec3::Y);

        let lamp = Light::point(vec3(0.9, 0.1, 0.9), 10.0)
            .with_color(vec3(0.0, 0.0, 1.0));

        // Shadowed by the blocker
        assert_eq!(
            TexelColor::ZERO,
            shade(&scene, &[sun.clone()], Vec3::ZERO)
        );

        // Not shadowed
        let color = shade(&scene, &[sun.clone()], vec3(0.75, 0.0, 0.75));

        assert_relative_eq!(color.r, 1.0, epsilon = 1e-5);

        // The lamp lights the point, but then the sun's shadow takes its
        // blue away again
        let color = shade(&scene, &[lamp, sun.clone()], Vec3::ZERO);

        assert_eq!(TexelColor::ZERO, color);

        // Shadows can be disabled per light
        let color =
            shade(&scene, &[sun.with_cast_shadows(false)], Vec3::ZERO);

        assert_relative_eq!(color.r, 1.0, epsilon = 1e-5);
    }
}
