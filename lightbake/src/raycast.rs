use std::sync::Arc;

use derivative::Derivative;
use glam::{Vec2, Vec3};

use crate::{Material, SurfaceKey};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
    inv_direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            inv_direction: 1.0 / direction,
        }
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Returns distance to the closest point of given box, or `f32::MAX` if
    /// the ray misses it.
    pub fn distance_to_box(&self, aabb_min: Vec3, aabb_max: Vec3) -> f32 {
        let hit_min = (aabb_min - self.origin) * self.inv_direction;
        let hit_max = (aabb_max - self.origin) * self.inv_direction;

        let tmin = hit_min.min(hit_max).max_element();
        let tmax = hit_min.max(hit_max).min_element();

        if tmax >= tmin && tmax >= 0.0 {
            tmin
        } else {
            f32::MAX
        }
    }
}

/// Narrows down which geometry a raycast considers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaycastFilter {
    pub static_only: bool,
    pub shadow_casters_only: bool,
    pub include_batches: bool,
    pub include_solid_geometry: bool,
}

impl RaycastFilter {
    /// Static shadow-casting geometry of every kind; used by all of the
    /// baker's queries.
    pub const BAKE: Self = Self {
        static_only: true,
        shadow_casters_only: true,
        include_batches: true,
        include_solid_geometry: true,
    };
}

impl Default for RaycastFilter {
    fn default() -> Self {
        Self::BAKE
    }
}

#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct RayHit {
    pub distance: f32,
    pub point: Vec3,

    /// Unit-length geometric normal of the hit triangle.
    pub normal: Vec3,

    pub positions: [Vec3; 3],
    pub normals: [Vec3; 3],
    pub uv0s: [Vec2; 3],

    /// Light-map UVs, as stored in the vertex data (i.e. not converted into
    /// the texel-buffer convention).
    pub uv1s: [Vec2; 3],

    #[derivative(Debug = "ignore")]
    pub material: Option<Arc<dyn Material>>,

    /// Light-mapped surface the hit belongs to, if any.
    pub surface: Option<SurfaceKey>,
}

/// Visibility query engine.
pub trait Raycaster: Sync {
    /// Returns all hits along the ray, sorted by distance (nearest first).
    ///
    /// Only front faces are reported and each surface contributes at most its
    /// nearest hit.
    fn raycast(&self, ray: Ray, filter: RaycastFilter) -> Vec<RayHit>;
}
