//! Offline static-lighting baker.
//!
//! Given a scene of static surfaces and lights, computes a light-map for every
//! eligible surface: direct lighting with shadows, plus an approximation of
//! indirect lighting gathered by bouncing rays between surfaces, blurred and
//! composed into the final texture.
//!
//! ```no_run
//! use lightbake::*;
//!
//! let scene = StaticScene::new("level")
//!     .with_surface(SceneSurface::plane(
//!         SurfaceKey::mesh_part("floor", 0),
//!         Vec3::new(-1.0, 0.0, -1.0),
//!         Vec3::new(0.0, 0.0, 2.0),
//!         Vec3::new(2.0, 0.0, 0.0),
//!     ))
//!     .with_light(Light::point(Vec3::new(0.0, 1.0, 0.0), 4.0));
//!
//! let mut store = DirectoryStore::for_scene("scenes", "level");
//!
//! Baker::new(BakeConfig::default()).bake(&scene, &mut store, |_, status| {
//!     println!("{status}");
//! });
//! ```

#![allow(clippy::len_without_is_empty)]

mod baker;
mod config;
mod context;
mod denoise;
mod direct;
mod error;
mod indirect;
mod job;
mod light;
mod material;
mod rasterizer;
mod raycast;
mod registry;
mod scene;
mod store;
mod surface;
mod texture;
mod texture_cache;
mod utils;
mod world;

pub use glam::{Affine3A, Vec2, Vec3, Vec4};
pub use lightbake_math::*;

pub use self::baker::*;
pub use self::config::*;
pub use self::context::*;
pub use self::denoise::*;
pub use self::direct::*;
pub use self::error::*;
pub use self::indirect::*;
pub use self::light::*;
pub use self::material::*;
pub use self::rasterizer::*;
pub use self::raycast::*;
pub use self::registry::*;
pub use self::scene::*;
pub use self::store::*;
pub use self::surface::*;
pub use self::texture::*;
pub use self::texture_cache::*;
pub use self::world::*;
