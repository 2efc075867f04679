//! Bakes a Cornell-like box and writes its light-maps to disk.
//!
//! ```text
//! RUST_LOG=info cargo run --example cornell -- [scenes-dir]
//! ```

use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use glam::{vec3, Vec3, Vec4};
use lightbake::*;

fn main() {
    env_logger::init();

    let scenes_dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| env::temp_dir().join("lightbake"));

    let scene = scene();
    let mut store = DirectoryStore::for_scene(&scenes_dir, scene.name());

    let config = BakeConfig::default()
        .with_lightmap_size(128)
        .with_gi_bounces(2)
        .with_gi_quality(GiQuality::High)
        .with_worker_threads(NonZeroUsize::new(4))
        .with_dilate(true);

    let baker = Baker::new(config);

    let report = baker.bake(&scene, &mut store, |fraction, status| {
        println!("[{:>5.1}%] {}", fraction * 100.0, status);
    });

    println!();
    println!("Baked {} light-maps in {:?}", report.units, report.elapsed);
    println!("  texels: {}", report.texels);
    println!("  splats: {}", report.splats);

    for stem in &report.saved {
        println!("  saved: {}", store.path_of(stem).display());
    }

    for stem in &report.failed {
        println!("  failed: {}", stem);
    }
}

fn scene() -> StaticScene {
    let wall = |name: &str, origin: Vec3, u: Vec3, v: Vec3| {
        SceneSurface::plane(SurfaceKey::mesh_part(name, 0), origin, u, v)
    };

    let paint = |r, g, b| {
        StandardMaterial::default()
            .with_base_color(Vec4::new(r, g, b, 1.0))
            .with_roughness(0.5)
    };

    StaticScene::new("cornell")
        .with_surface(wall(
            "floor",
            vec3(-1.0, 0.0, -1.0),
            vec3(0.0, 0.0, 2.0),
            vec3(2.0, 0.0, 0.0),
        ))
        .with_surface(wall(
            "ceiling",
            vec3(-1.0, 2.0, -1.0),
            vec3(2.0, 0.0, 0.0),
            vec3(0.0, 0.0, 2.0),
        ))
        .with_surface(wall(
            "back",
            vec3(-1.0, 0.0, -1.0),
            vec3(2.0, 0.0, 0.0),
            vec3(0.0, 2.0, 0.0),
        ))
        .with_surface(
            wall(
                "left",
                vec3(-1.0, 0.0, -1.0),
                vec3(0.0, 2.0, 0.0),
                vec3(0.0, 0.0, 2.0),
            )
            .with_material(paint(0.9, 0.1, 0.1)),
        )
        .with_surface(
            wall(
                "right",
                vec3(1.0, 0.0, -1.0),
                vec3(0.0, 0.0, 2.0),
                vec3(0.0, 2.0, 0.0),
            )
            .with_material(paint(0.1, 0.9, 0.1)),
        )
        .with_surface(
            SceneSurface::plane(
                SurfaceKey::batch("pedestal-top"),
                vec3(-0.3, 0.6, -0.3),
                vec3(0.0, 0.0, 0.6),
                vec3(0.6, 0.0, 0.0),
            )
            .with_lightmap_size(LightmapSize::X64),
        )
        .with_surface(SceneSurface::plane(
            SurfaceKey::solid_part("pedestal-front"),
            vec3(-0.3, 0.0, 0.3),
            vec3(0.6, 0.0, 0.0),
            vec3(0.0, 0.6, 0.0),
        ))
        .with_light(
            Light::point(vec3(0.0, 1.8, 0.0), 4.0)
                .with_color(vec3(1.0, 0.95, 0.85)),
        )
        .with_light(
            Light::spot(vec3(0.0, 1.9, 0.0), -Vec3::Y, 3.0, 15.0, 25.0)
                .with_intensity(0.6),
        )
}
