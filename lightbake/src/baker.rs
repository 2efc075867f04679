use std::num::NonZeroUsize;
use std::time::Duration;

use image::RgbImage;
use log::{debug, info, warn};
use parking_lot::Mutex;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::job::{JobOutcome, ShadingJob};
use crate::utils::{measure, metric};
use crate::{
    compose, dilate, post_process, BakeConfig, BakeContext, BakeScene,
    LightmapRegistry, LightmapStore, LightmapUnit, NeighborSearchPattern,
    SurfaceKind, TextureCache,
};

/// Bakes static lighting of whole scenes.
#[derive(Clone, Debug, Default)]
pub struct Baker {
    config: BakeConfig,
}

impl Baker {
    pub fn new(config: BakeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BakeConfig {
        &self.config
    }

    /// Bakes light-maps of all eligible surfaces of `scene` into `store`.
    ///
    /// Blocks until the whole scene is baked; `progress` gets called with the
    /// completed fraction (`0.0..=1.0`) and a status message as the bake
    /// goes. Failures never stop the bake: light-maps that couldn't be
    /// stored get logged and listed in the report.
    pub fn bake(
        &self,
        scene: &dyn BakeScene,
        store: &mut dyn LightmapStore,
        progress: impl FnMut(f32, &str) + Send,
    ) -> BakeReport {
        let (mut report, elapsed) =
            measure(|| self.bake_inner(scene, store, progress));

        report.elapsed = elapsed;

        info!(
            "Baked scene `{}`; units = {}, saved = {}, failed = {}, \
             texels = {}, splats = {}, tt = {:?}",
            scene.name(),
            report.units,
            report.saved.len(),
            report.failed.len(),
            report.texels,
            report.splats,
            report.elapsed,
        );

        report
    }

    fn bake_inner(
        &self,
        scene: &dyn BakeScene,
        store: &mut dyn LightmapStore,
        progress: impl FnMut(f32, &str) + Send,
    ) -> BakeReport {
        let mut stage = StageTracker::default();
        let mut report = BakeReport::default();

        // ---

        stage.enter(BakeStage::Preparing);

        let mut progress = Progress::new(progress);

        progress.report(0.0, "Baking lighting (preparing)");

        let registry = metric("preparing", || self.prepare(scene));
        let textures = TextureCache::new();

        progress.set_total(registry.len());
        report.units = registry.len();

        let ctx = BakeContext {
            config: &self.config,
            registry: &registry,
            textures: &textures,
            scene,
        };

        let pool = self.pool();

        // ---

        stage.enter(BakeStage::Shading);

        let outcome =
            metric("shading", || self.shade(ctx, pool.as_ref(), &progress));

        report.texels = outcome.texels;
        report.splats = outcome.splats;

        // ---

        stage.enter(BakeStage::PostProcess);

        let images = metric("post-processing", || {
            self.develop(&registry, pool.as_ref(), &progress)
        });

        // ---

        stage.enter(BakeStage::Saving);

        metric("saving", || {
            for (unit, image) in registry.iter().zip(&images) {
                let stem = unit.key().file_stem();

                match store.save(&stem, image) {
                    Ok(()) => {
                        unit.surface().reload_lightmap();
                        report.saved.push(stem);
                    }

                    Err(err) => {
                        warn!("{}; skipping light-map", err);
                        report.failed.push(stem);
                    }
                }

                progress.step(&status(unit));
            }

            scene.reload_lightmaps();
        });

        // ---

        stage.enter(BakeStage::Cleanup);

        drop(images);
        drop(registry);
        textures.clear();

        stage.enter(BakeStage::Idle);

        report
    }

    /// Allocates light-map units for all eligible surfaces.
    ///
    /// Every unit must exist before any of them gets shaded, since shading one
    /// unit splats light into others.
    fn prepare(&self, scene: &dyn BakeScene) -> LightmapRegistry {
        LightmapRegistry::allocate(&self.config, scene.surfaces())
    }

    fn pool(&self) -> Option<ThreadPool> {
        let threads = self.config.worker_threads.map_or(0, NonZeroUsize::get);

        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|id| format!("lightbake-{id}"))
            .build();

        match pool {
            Ok(pool) => {
                debug!("Shading on {} threads", pool.current_num_threads());
                Some(pool)
            }

            Err(err) => {
                warn!(
                    "Couldn't build worker pool ({}); shading on the current \
                     thread",
                    err
                );

                None
            }
        }
    }

    fn shade<P>(
        &self,
        ctx: BakeContext<'_>,
        pool: Option<&ThreadPool>,
        progress: &Progress<P>,
    ) -> JobOutcome
    where
        P: FnMut(f32, &str) + Send,
    {
        let lights = ctx.scene.lights();

        let jobs: Vec<_> = ctx
            .registry
            .iter()
            .enumerate()
            .map(|(id, unit)| {
                ShadingJob::new(id, unit, lights, self.config.seed)
            })
            .collect();

        let run = |job: &ShadingJob| {
            let outcome = job.run(ctx);

            if let Some(unit) = ctx.registry.get(job.unit()) {
                progress.step(&status(unit));
            }

            outcome
        };

        let outcomes: Vec<_> = match pool {
            Some(pool) => pool.install(|| jobs.par_iter().map(run).collect()),
            None => jobs.iter().map(run).collect(),
        };

        outcomes
            .into_iter()
            .fold(JobOutcome::default(), |total, outcome| JobOutcome {
                texels: total.texels + outcome.texels,
                splats: total.splats + outcome.splats,
            })
    }

    /// Denoises and composes light-maps of all units.
    fn develop<P>(
        &self,
        registry: &LightmapRegistry,
        pool: Option<&ThreadPool>,
        progress: &Progress<P>,
    ) -> Vec<RgbImage>
    where
        P: FnMut(f32, &str) + Send,
    {
        let pattern = self.config.dilate.then(NeighborSearchPattern::default);

        let run = |unit: &LightmapUnit| {
            let mut direct = unit.direct();
            let mut indirect = unit.indirect();

            if let Some(pattern) = &pattern {
                dilate(&mut direct, pattern);
                dilate(&mut indirect, pattern);
            }

            post_process(&direct, &mut indirect);

            let image = compose(&direct, &indirect);

            progress.step(&status(unit));

            image
        };

        let units: Vec<_> = registry.iter().collect();

        match pool {
            Some(pool) => pool.install(|| {
                units.par_iter().map(|&unit| run(unit)).collect()
            }),

            None => units.iter().map(|&unit| run(unit)).collect(),
        }
    }
}

/// Summary of a finished bake.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BakeReport {
    /// Number of light-map units baked.
    pub units: usize,

    /// File stems of light-maps stored successfully.
    pub saved: Vec<String>,

    /// File stems of light-maps that couldn't be stored.
    pub failed: Vec<String>,

    /// Number of texels shaded by the direct pass.
    pub texels: usize,

    /// Number of indirect-light splats.
    pub splats: usize,

    pub elapsed: Duration,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BakeStage {
    #[default]
    Idle,
    Preparing,
    Shading,
    PostProcess,
    Saving,
    Cleanup,
}

#[derive(Debug, Default)]
struct StageTracker {
    current: BakeStage,
}

impl StageTracker {
    fn enter(&mut self, next: BakeStage) {
        debug_assert!(
            next > self.current || next == BakeStage::Idle,
            "{:?} -> {:?}",
            self.current,
            next
        );

        info!("Bake stage: {:?} -> {:?}", self.current, next);

        self.current = next;
    }
}

/// Funnels progress updates from worker threads into the user's callback.
///
/// Each unit completes three steps (shading, post-processing and saving), so
/// the fraction grows by `1 / (3 * units)` per step.
struct Progress<P> {
    inner: Mutex<ProgressInner<P>>,
    total: usize,
}

struct ProgressInner<P> {
    callback: P,
    done: usize,
}

impl<P> Progress<P>
where
    P: FnMut(f32, &str) + Send,
{
    const STEPS_PER_UNIT: usize = 3;

    fn new(callback: P) -> Self {
        Self {
            inner: Mutex::new(ProgressInner { callback, done: 0 }),
            total: 0,
        }
    }

    fn set_total(&mut self, units: usize) {
        self.total = units * Self::STEPS_PER_UNIT;
    }

    fn report(&self, fraction: f32, status: &str) {
        (self.inner.lock().callback)(fraction, status);
    }

    fn step(&self, status: &str) {
        let mut inner = self.inner.lock();

        inner.done += 1;

        let fraction = if self.total == 0 {
            1.0
        } else {
            (inner.done as f32 / self.total as f32).min(1.0)
        };

        (inner.callback)(fraction, status);
    }
}

fn status(unit: &LightmapUnit) -> String {
    match unit.key().kind {
        SurfaceKind::MeshPart => {
            format!("Baking lighting: {}", unit.surface().name())
        }
        SurfaceKind::Batch => "Baking lighting (static geometry)".into(),
        SurfaceKind::SolidPart => "Baking lighting (CSG geometry)".into(),
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::PathBuf;

    use approx::assert_relative_eq;
    use glam::{vec3, Vec3};
    use lightbake_math::TexelColor;

    use super::*;
    use crate::{
        BakeError, Light, MemoryStore, SceneSurface, StaticScene, SurfaceKey,
    };

    fn floor() -> SceneSurface {
        SceneSurface::plane(
            SurfaceKey::mesh_part("floor", 0),
            vec3(-1.0, 0.0, -1.0),
            vec3(0.0, 0.0, 2.0),
            vec3(2.0, 0.0, 0.0),
        )
    }

    fn ceiling() -> SceneSurface {
        SceneSurface::plane(
            SurfaceKey::mesh_part("ceiling", 0),
            vec3(-1.0, 1.0, -1.0),
            vec3(2.0, 0.0, 0.0),
            vec3(0.0, 0.0, 2.0),
        )
    }

    fn room() -> StaticScene {
        StaticScene::new("room")
            .with_surface(floor())
            .with_surface(ceiling())
            .with_light(Light::point(vec3(0.0, 0.5, 0.0), 5.0))
    }

    fn config() -> BakeConfig {
        BakeConfig::default()
            .with_lightmap_size(8)
            .with_worker_threads(NonZeroUsize::new(2))
    }

    /// Runs the direct and indirect passes, returning the shaded units.
    fn shade(config: BakeConfig, scene: &StaticScene) -> LightmapRegistry {
        let baker = Baker::new(config);
        let registry = baker.prepare(scene);
        let textures = TextureCache::new();
        let progress = Progress::new(|_, _: &str| {});

        let ctx = BakeContext {
            config: baker.config(),
            registry: &registry,
            textures: &textures,
            scene,
        };

        baker.shade(ctx, baker.pool().as_ref(), &progress);

        registry
    }

    fn direct(
        registry: &LightmapRegistry,
        key: &SurfaceKey,
    ) -> Vec<TexelColor> {
        registry.find(key).unwrap().direct().iter().copied().collect()
    }

    fn indirect(
        registry: &LightmapRegistry,
        key: &SurfaceKey,
    ) -> Vec<TexelColor> {
        registry.find(key).unwrap().indirect().iter().copied().collect()
    }

    #[test]
    fn directional_light() {
        let scene = StaticScene::new("scene")
            .with_surface(floor())
            .with_light(Light::directional(-Vec3::Y));

        let registry = shade(config().with_gi(false), &scene);
        let texels = direct(&registry, &SurfaceKey::mesh_part("floor", 0));

        assert_eq!(64, texels.len());

        for texel in texels {
            assert_relative_eq!(texel.r, 1.0, epsilon = 1e-5);
            assert_relative_eq!(texel.g, 1.0, epsilon = 1e-5);
            assert_relative_eq!(texel.b, 1.0, epsilon = 1e-5);
            assert_eq!(1.0, texel.a);
        }
    }

    #[test]
    fn point_light_out_of_range() {
        let scene = StaticScene::new("scene")
            .with_surface(floor())
            .with_light(Light::point(vec3(0.0, 5.0, 0.0), 2.0));

        let registry = shade(config(), &scene);
        let texels = direct(&registry, &SurfaceKey::mesh_part("floor", 0));

        for texel in texels {
            assert_eq!(TexelColor::new(0.0, 0.0, 0.0, 1.0), texel);
        }
    }

    #[test]
    fn disabled_gi_leaves_indirect_buffers_empty() {
        let registry = shade(config().with_gi(false), &room());

        assert_eq!(2, registry.len());

        for unit in registry.iter() {
            assert!(unit.indirect().iter().all(|t| *t == TexelColor::ZERO));
        }
    }

    #[test]
    fn gi_bleeds_light_between_surfaces() {
        let registry = shade(config(), &room());

        for key in [
            SurfaceKey::mesh_part("floor", 0),
            SurfaceKey::mesh_part("ceiling", 0),
        ] {
            let texels = indirect(&registry, &key);

            assert!(texels.iter().any(|texel| texel.r > 0.0), "{key}");

            assert!(texels.iter().all(|texel| {
                (0.0..=1.0).contains(&texel.r) && (0.0..=1.0).contains(&texel.a)
            }));
        }
    }

    #[test]
    fn zero_bounces() {
        let baker = Baker::new(
            config()
                .with_gi_bounces(0)
                .with_gi_intensity(100.0)
                .with_gi_quality(crate::GiQuality::VeryHigh),
        );

        let report = baker.bake(&room(), &mut MemoryStore::new(), |_, _| {});

        assert_eq!(0, report.splats);
        assert!(report.texels > 0);
    }

    #[test]
    fn bake() {
        let scene = room();
        let mut store = MemoryStore::new();
        let mut updates = Vec::new();

        let report = Baker::new(config()).bake(&scene, &mut store, |f, s| {
            updates.push((f, s.to_owned()));
        });

        assert_eq!(2, report.units);
        assert_eq!(vec!["floor_0", "ceiling_0"], report.saved);
        assert!(report.failed.is_empty());
        assert_eq!(2, store.len());

        let image = store.get("floor_0").unwrap();

        assert_eq!((8, 8), image.dimensions());
        assert!(image.pixels().any(|pixel| pixel.0[0] > 0));

        for key in [
            SurfaceKey::mesh_part("floor", 0),
            SurfaceKey::mesh_part("ceiling", 0),
        ] {
            assert_eq!(1, scene.surface(&key).unwrap().reload_count());
        }

        assert_eq!(1, scene.reload_count());

        // Preparing, then three steps per unit
        assert_eq!(7, updates.len());
        assert_eq!((0.0, "Baking lighting (preparing)".into()), updates[0]);

        for (_, status) in &updates[1..] {
            assert!(
                status == "Baking lighting: floor"
                    || status == "Baking lighting: ceiling",
                "{status}"
            );
        }

        assert_relative_eq!(1.0, updates[6].0);

        assert!(updates.windows(2).all(|pair| pair[0].0 <= pair[1].0));
    }

    #[test]
    fn failed_saves_dont_stop_the_bake() {
        struct FlakyStore(MemoryStore);

        impl LightmapStore for FlakyStore {
            fn save(
                &mut self,
                stem: &str,
                image: &RgbImage,
            ) -> Result<(), BakeError> {
                if stem == "floor_0" {
                    return Err(BakeError::Io {
                        path: PathBuf::from(stem),
                        source: io::Error::new(io::ErrorKind::Other, "nope"),
                    });
                }

                self.0.save(stem, image)
            }
        }

        let scene = room();
        let mut store = FlakyStore(MemoryStore::new());
        let report = Baker::new(config()).bake(&scene, &mut store, |_, _| {});

        assert_eq!(vec!["ceiling_0"], report.saved);
        assert_eq!(vec!["floor_0"], report.failed);
        assert!(store.0.get("ceiling_0").is_some());

        let floor = scene.surface(&SurfaceKey::mesh_part("floor", 0)).unwrap();

        assert_eq!(0, floor.reload_count());
        assert_eq!(1, scene.reload_count());
    }

    #[test]
    fn empty_scene() {
        let report = Baker::default().bake(
            &StaticScene::new("empty"),
            &mut MemoryStore::new(),
            |_, _| {},
        );

        assert_eq!(BakeReport::default(), BakeReport {
            elapsed: Duration::default(),
            ..report
        });
    }
}
