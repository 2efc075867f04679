use std::sync::Arc;

use derivative::Derivative;
use fxhash::FxHashMap;
use lightbake_math::TexelBuffer;
use log::{debug, warn};
use parking_lot::{Mutex, MutexGuard};

use crate::{BakeConfig, BakeSurface, SurfaceKey, SurfaceKind};

/// Direct and indirect texel buffers of a single light-mapped surface.
///
/// The direct buffer is only ever written by the unit's own shading job; the
/// indirect buffer also receives splats from jobs of other units, hence both
/// sit behind their own locks.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct LightmapUnit {
    key: SurfaceKey,
    #[derivative(Debug = "ignore")]
    surface: Arc<dyn BakeSurface>,
    size: u32,
    direct: Mutex<TexelBuffer>,
    indirect: Mutex<TexelBuffer>,
}

impl LightmapUnit {
    pub fn new(surface: Arc<dyn BakeSurface>, size: u32) -> Self {
        Self {
            key: surface.key().clone(),
            surface,
            size,
            direct: Mutex::new(TexelBuffer::new(size)),
            indirect: Mutex::new(TexelBuffer::new(size)),
        }
    }

    pub fn key(&self) -> &SurfaceKey {
        &self.key
    }

    pub fn surface(&self) -> &dyn BakeSurface {
        self.surface.as_ref()
    }

    /// Width (and height) of the light-map, in texels.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn direct(&self) -> MutexGuard<'_, TexelBuffer> {
        self.direct.lock()
    }

    pub fn indirect(&self) -> MutexGuard<'_, TexelBuffer> {
        self.indirect.lock()
    }
}

/// All light-map units of a bake, indexed by their surface keys.
#[derive(Debug, Default)]
pub struct LightmapRegistry {
    units: Vec<LightmapUnit>,
    index: FxHashMap<SurfaceKey, usize>,
}

impl LightmapRegistry {
    /// Allocates units for all eligible surfaces: mesh parts first, then
    /// batches, then solid parts.
    ///
    /// Solid parts always use the default resolution.
    pub fn allocate(
        config: &BakeConfig,
        surfaces: impl IntoIterator<Item = Arc<dyn BakeSurface>>,
    ) -> Self {
        let mut surfaces: Vec<_> = surfaces
            .into_iter()
            .filter(|surface| surface.is_eligible())
            .collect();

        surfaces.sort_by_key(|surface| surface.key().kind);

        let mut this = Self::default();

        for surface in surfaces {
            let size = match surface.key().kind {
                SurfaceKind::SolidPart => config.lightmap_size,
                _ => config.texels(surface.lightmap_size()),
            };

            if this.index.contains_key(surface.key()) {
                warn!(
                    "Surface `{}` is listed more than once; baking it only \
                     once",
                    surface.key(),
                );

                continue;
            }

            debug!("Allocating light-map `{}` ({size}x{size})", surface.key());

            this.index.insert(surface.key().clone(), this.units.len());
            this.units.push(LightmapUnit::new(surface, size));
        }

        this
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LightmapUnit> + '_ {
        self.units.iter()
    }

    pub fn get(&self, id: usize) -> Option<&LightmapUnit> {
        self.units.get(id)
    }

    pub fn find(&self, key: &SurfaceKey) -> Option<&LightmapUnit> {
        self.index.get(key).map(|&id| &self.units[id])
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::{LightmapSize, SceneSurface};

    fn plane(key: SurfaceKey) -> SceneSurface {
        SceneSurface::plane(key, Vec3::ZERO, Vec3::Z, Vec3::X)
    }

    #[test]
    fn allocate() {
        let config = BakeConfig::default().with_lightmap_size(32);

        let surfaces: Vec<Arc<dyn BakeSurface>> = vec![
            Arc::new(
                plane(SurfaceKey::solid_part("solid"))
                    .with_lightmap_size(LightmapSize::X512),
            ),
            Arc::new(
                plane(SurfaceKey::batch("batch"))
                    .with_lightmap_size(LightmapSize::X64),
            ),
            Arc::new(plane(SurfaceKey::mesh_part("mesh", 0))),
            Arc::new(plane(SurfaceKey::mesh_part("mesh", 1))),
            Arc::new(plane(SurfaceKey::mesh_part("mesh", 1))),
            Arc::new(
                plane(SurfaceKey::mesh_part("dynamic", 0))
                    .with_lighting_static(false),
            ),
        ];

        let target = LightmapRegistry::allocate(&config, surfaces);

        assert_eq!(4, target.len());

        let keys: Vec<_> =
            target.iter().map(|unit| unit.key().file_stem()).collect();

        assert_eq!(vec!["mesh_0", "mesh_1", "batch", "solid"], keys);

        let batch = target.find(&SurfaceKey::batch("batch")).unwrap();

        assert_eq!(64, batch.size());
        assert_eq!(64 * 64, batch.direct().len());
        assert_eq!(64 * 64, batch.indirect().len());

        let solid = target.find(&SurfaceKey::solid_part("solid")).unwrap();

        assert_eq!(32, solid.size());
        assert!(solid.direct().iter().all(|texel| texel.a == 0.0));

        assert!(target
            .find(&SurfaceKey::mesh_part("dynamic", 0))
            .is_none());

        assert!(target.find(&SurfaceKey::mesh_part("mesh", 2)).is_none());
    }
}
