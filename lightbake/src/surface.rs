use std::fmt;
use std::sync::Arc;

use glam::{Affine3A, Vec2, Vec3};
use lightbake_math::{lightmap_uv, BoundingBox};
use log::warn;

use crate::{LightmapSize, Material};

/// Kind of geometry a light-map belongs to.
///
/// Units get allocated and shaded in this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SurfaceKind {
    /// Single sub-mesh of a mesh renderer.
    MeshPart,

    /// Merged static-geometry batch.
    Batch,

    /// Sub-mesh of boolean-combined solid geometry.
    SolidPart,
}

/// Stable identity of a light-mapped surface.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceKey {
    pub kind: SurfaceKind,
    pub guid: String,
    pub sub_index: Option<u32>,
}

impl SurfaceKey {
    pub fn mesh_part(guid: impl Into<String>, sub_index: u32) -> Self {
        Self {
            kind: SurfaceKind::MeshPart,
            guid: guid.into(),
            sub_index: Some(sub_index),
        }
    }

    pub fn batch(guid: impl Into<String>) -> Self {
        Self {
            kind: SurfaceKind::Batch,
            guid: guid.into(),
            sub_index: None,
        }
    }

    pub fn solid_part(guid: impl Into<String>) -> Self {
        Self {
            kind: SurfaceKind::SolidPart,
            guid: guid.into(),
            sub_index: None,
        }
    }

    /// Returns the name of the light-map file, without extension.
    pub fn file_stem(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SurfaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.guid)?;

        if let Some(sub_index) = self.sub_index {
            write!(f, "_{}", sub_index)?;
        }

        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,

    /// Primary UV, used for material sampling.
    pub uv0: Vec2,

    /// Secondary UV, used for light-map placement.
    pub uv1: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv0: Vec2, uv1: Vec2) -> Self {
        Self {
            position,
            normal,
            uv0,
            uv1,
        }
    }
}

/// Geometry that can receive a baked light-map.
pub trait BakeSurface: Send + Sync {
    fn key(&self) -> &SurfaceKey;

    /// Human-readable name, used in progress messages.
    fn name(&self) -> &str;

    /// World-space bounds.
    fn bounds(&self) -> BoundingBox;

    fn lightmap_size(&self) -> LightmapSize;

    fn material(&self) -> Option<Arc<dyn Material>>;

    /// Local-to-world transform; only mesh parts are expected to carry one,
    /// other kinds are already in world space.
    fn transform(&self) -> Affine3A {
        Affine3A::IDENTITY
    }

    fn vertices(&self) -> &[Vertex];

    /// Triangle list; every three indices form one triangle.
    fn indices(&self) -> &[u32];

    fn is_active(&self) -> bool {
        true
    }

    fn is_lighting_static(&self) -> bool {
        true
    }

    fn is_batching_static(&self) -> bool {
        false
    }

    fn is_eligible(&self) -> bool {
        match self.key().kind {
            SurfaceKind::MeshPart => {
                self.is_active()
                    && self.is_lighting_static()
                    && !self.is_batching_static()
            }

            SurfaceKind::Batch => self.is_lighting_static(),
            SurfaceKind::SolidPart => true,
        }
    }

    /// Called once the surface's light-map has been written.
    fn reload_lightmap(&self) {}
}

/// Returns surface's triangles in world space, with light-map UVs converted
/// into the texel-buffer convention.
pub(crate) fn world_triangles(
    surface: &dyn BakeSurface,
) -> Vec<[Vertex; 3]> {
    let transform = if surface.key().kind == SurfaceKind::MeshPart {
        surface.transform()
    } else {
        Affine3A::IDENTITY
    };

    let normal_transform = transform.matrix3.inverse().transpose();

    let vertices: Vec<_> = surface
        .vertices()
        .iter()
        .map(|vertex| {
            let normal = normal_transform.mul_vec3(vertex.normal);

            Vertex {
                position: transform.transform_point3(vertex.position),
                normal: normal.normalize_or_zero(),
                uv0: vertex.uv0,
                uv1: lightmap_uv(vertex.uv1),
            }
        })
        .collect();

    let indices = surface.indices();

    if indices.len() % 3 != 0 {
        warn!(
            "Surface `{}` has a dangling index buffer (len = {}); ignoring the \
             trailing indices",
            surface.key(),
            indices.len(),
        );
    }

    indices
        .chunks_exact(3)
        .filter_map(|ids| {
            let triangle = [
                *vertices.get(ids[0] as usize)?,
                *vertices.get(ids[1] as usize)?,
                *vertices.get(ids[2] as usize)?,
            ];

            Some(triangle)
        })
        .collect()
}
