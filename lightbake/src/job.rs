use std::sync::Arc;

use lightbake_math::TexelColor;
use log::{debug, warn};

use crate::material;
use crate::surface::world_triangles;
use crate::{
    rasterize, BakeContext, DirectShader, Light, LightmapUnit, Material,
    Vertex,
};

/// Multiplier decorrelating random streams of neighbouring units.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Everything needed to shade a single light-map unit.
pub(crate) struct ShadingJob {
    unit: usize,
    triangles: Vec<[Vertex; 3]>,
    lights: Vec<Light>,
    material: Option<Arc<dyn Material>>,
    seed: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct JobOutcome {
    pub texels: usize,
    pub splats: usize,
}

impl ShadingJob {
    pub fn new(
        id: usize,
        unit: &LightmapUnit,
        lights: &[Light],
        base_seed: u64,
    ) -> Self {
        let surface = unit.surface();
        let bounds = surface.bounds();

        let lights: Vec<_> = lights
            .iter()
            .filter(|light| light.affects(&bounds))
            .cloned()
            .collect();

        Self {
            unit: id,
            triangles: world_triangles(surface),
            lights,
            material: surface.material(),
            seed: base_seed ^ (id as u64).wrapping_mul(SEED_STRIDE),
        }
    }

    pub fn unit(&self) -> usize {
        self.unit
    }

    pub fn run(&self, ctx: BakeContext<'_>) -> JobOutcome {
        let Some(unit) = ctx.registry.get(self.unit) else {
            return Default::default();
        };

        let material = self.material.as_deref();

        // Albedo only matters for the bounced light
        let albedo = material::loaded(material).filter(|_| ctx.config.gi);

        let mut shader =
            DirectShader::new(ctx, &self.lights, material, self.seed);

        let mut buffer = unit.direct();
        let mut texels = 0;

        for triangle in &self.triangles {
            let positions = triangle.map(|vertex| vertex.position);
            let uvs = triangle.map(|vertex| vertex.uv0);

            texels += rasterize(triangle, &mut buffer, |position, normal| {
                let pixel = albedo.map_or(TexelColor::WHITE, |material| {
                    ctx.textures.albedo(material, positions, position, uvs)
                });

                shader.shade(position, normal, pixel)
            });
        }

        let stats = shader.bounces().stats();

        if stats.orphan_hits > 0 {
            warn!(
                "{} light bounces from `{}` landed on surfaces without a \
                 light-map; skipped them",
                stats.orphan_hits,
                unit.key(),
            );
        }

        debug!(
            "Shaded `{}`: {} texels, {} lights, {} splats",
            unit.key(),
            texels,
            self.lights.len(),
            stats.splats,
        );

        JobOutcome {
            texels,
            splats: stats.splats,
        }
    }
}
