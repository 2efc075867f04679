mod bvh;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use derivative::Derivative;
use fxhash::FxHashMap;
use glam::{vec2, Affine3A, Vec3};
use lightbake_math::BoundingBox;

use self::bvh::*;
use crate::{
    BakeScene, BakeSurface, Light, LightmapSize, Material, Ray, RayHit,
    RaycastFilter, Raycaster, SurfaceKey, SurfaceKind, Vertex,
};

/// In-memory scene of static surfaces and lights, with a BVH-backed
/// raycaster.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct StaticScene {
    name: String,
    surfaces: Vec<Arc<SceneSurface>>,
    lights: Vec<Light>,
    #[derivative(Debug = "ignore")]
    geometry: OnceLock<Geometry>,
    reloads: AtomicUsize,
}

impl StaticScene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            surfaces: Default::default(),
            lights: Default::default(),
            geometry: Default::default(),
            reloads: Default::default(),
        }
    }

    pub fn with_surface(mut self, surface: SceneSurface) -> Self {
        self.surfaces.push(Arc::new(surface));
        self.geometry = Default::default();
        self
    }

    pub fn with_light(mut self, light: Light) -> Self {
        self.lights.push(light);
        self
    }

    pub fn surface(&self, key: &SurfaceKey) -> Option<&SceneSurface> {
        self.surfaces
            .iter()
            .find(|surface| surface.key() == key)
            .map(|surface| surface.as_ref())
    }

    /// Number of times the scene-wide light-map reload got requested.
    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::Relaxed)
    }

    fn geometry(&self) -> &Geometry {
        self.geometry.get_or_init(|| Geometry::build(&self.surfaces))
    }
}

impl Raycaster for StaticScene {
    fn raycast(&self, ray: Ray, filter: RaycastFilter) -> Vec<RayHit> {
        let geometry = self.geometry();
        let mut nearest: FxHashMap<usize, (usize, f32)> = Default::default();

        geometry.bvh.traverse(ray, |triangle_id| {
            let triangle = &geometry.triangles[triangle_id];
            let surface = &self.surfaces[triangle.surface];

            if !surface.is_visible_to(filter) {
                return;
            }

            let Some(distance) = triangle.hit(ray) else {
                return;
            };

            let entry = nearest
                .entry(triangle.surface)
                .or_insert((triangle_id, distance));

            if distance < entry.1 {
                *entry = (triangle_id, distance);
            }
        });

        let mut hits: Vec<_> = nearest
            .into_values()
            .map(|(triangle_id, distance)| {
                let triangle = &geometry.triangles[triangle_id];
                let surface = &self.surfaces[triangle.surface];

                RayHit {
                    distance,
                    point: ray.at(distance),
                    normal: triangle.normal(),
                    positions: triangle.vertices.map(|v| v.position),
                    normals: triangle.vertices.map(|v| v.normal),
                    uv0s: triangle.vertices.map(|v| v.uv0),
                    uv1s: triangle.vertices.map(|v| v.uv1),
                    material: surface.material.clone(),
                    surface: surface
                        .lighting_static
                        .then(|| surface.key.clone()),
                }
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

impl BakeScene for StaticScene {
    fn name(&self) -> &str {
        &self.name
    }

    fn surfaces(&self) -> Vec<Arc<dyn BakeSurface>> {
        self.surfaces
            .iter()
            .map(|surface| surface.clone() as Arc<dyn BakeSurface>)
            .collect()
    }

    fn lights(&self) -> &[Light] {
        &self.lights
    }

    fn reload_lightmaps(&self) {
        self.reloads.fetch_add(1, Ordering::Relaxed);
    }
}

/// World-space triangles of all the surfaces, indexed by a BVH.
struct Geometry {
    triangles: Vec<SceneTriangle>,
    bvh: Bvh,
}

impl Geometry {
    fn build(surfaces: &[Arc<SceneSurface>]) -> Self {
        let triangles: Vec<_> = surfaces
            .iter()
            .enumerate()
            .flat_map(|(surface_id, surface)| {
                let transform = surface.transform();
                let normal_transform = transform.matrix3.inverse().transpose();

                surface.indices.chunks_exact(3).filter_map(move |ids| {
                    let vertex = |id: u32| {
                        let vertex = surface.vertices.get(id as usize)?;

                        Some(Vertex {
                            position: transform
                                .transform_point3(vertex.position),
                            normal: normal_transform
                                .mul_vec3(vertex.normal)
                                .normalize_or_zero(),
                            ..*vertex
                        })
                    };

                    Some(SceneTriangle {
                        surface: surface_id,
                        vertices: [
                            vertex(ids[0])?,
                            vertex(ids[1])?,
                            vertex(ids[2])?,
                        ],
                    })
                })
            })
            .collect();

        let bvh = Bvh::build(triangles.iter().enumerate().map(
            |(id, triangle)| BvhTriangle {
                id,
                positions: triangle.vertices.map(|v| v.position),
            },
        ));

        Self { triangles, bvh }
    }
}

struct SceneTriangle {
    surface: usize,
    vertices: [Vertex; 3],
}

impl SceneTriangle {
    fn normal(&self) -> Vec3 {
        let [p0, p1, p2] = self.vertices.map(|v| v.position);

        (p1 - p0).cross(p2 - p0).normalize_or_zero()
    }

    /// Möller-Trumbore; only triangles facing the ray are hit.
    fn hit(&self, ray: Ray) -> Option<f32> {
        let [p0, p1, p2] = self.vertices.map(|v| v.position);
        let v0v1 = p1 - p0;
        let v0v2 = p2 - p0;

        // ---

        let pvec = ray.direction().cross(v0v2);
        let det = v0v1.dot(pvec);

        if det < f32::EPSILON {
            return None;
        }

        // ---

        let inv_det = 1.0 / det;
        let tvec = ray.origin() - p0;
        let u = tvec.dot(pvec) * inv_det;
        let qvec = tvec.cross(v0v1);
        let v = ray.direction().dot(qvec) * inv_det;
        let distance = v0v2.dot(qvec) * inv_det;

        if (u < 0.0) | (u > 1.0) | (v < 0.0) | (u + v > 1.0) | (distance <= 0.0)
        {
            return None;
        }

        Some(distance)
    }
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct SceneSurface {
    key: SurfaceKey,
    name: String,
    transform: Affine3A,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    lightmap_size: LightmapSize,
    #[derivative(Debug = "ignore")]
    material: Option<Arc<dyn Material>>,
    active: bool,
    lighting_static: bool,
    batching_static: bool,
    cast_shadows: bool,
    reloads: AtomicUsize,
}

impl SceneSurface {
    pub fn new(
        key: SurfaceKey,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
    ) -> Self {
        Self {
            name: key.guid.clone(),
            key,
            transform: Affine3A::IDENTITY,
            vertices,
            indices,
            lightmap_size: LightmapSize::Default,
            material: None,
            active: true,
            lighting_static: true,
            batching_static: false,
            cast_shadows: true,
            reloads: Default::default(),
        }
    }

    /// Creates a parallelogram spanning `origin`, `origin + u` and
    /// `origin + v`, facing `u × v`.
    ///
    /// Both UV sets map the parallelogram onto the unit square.
    pub fn plane(key: SurfaceKey, origin: Vec3, u: Vec3, v: Vec3) -> Self {
        let normal = u.cross(v).normalize_or_zero();

        let corners = [
            (origin, vec2(0.0, 0.0)),
            (origin + u, vec2(1.0, 0.0)),
            (origin + u + v, vec2(1.0, 1.0)),
            (origin + v, vec2(0.0, 1.0)),
        ];

        let vertices = corners
            .into_iter()
            .map(|(position, uv)| Vertex::new(position, normal, uv, uv))
            .collect();

        Self::new(key, vertices, vec![0, 1, 2, 0, 2, 3])
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_transform(mut self, transform: Affine3A) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_lightmap_size(mut self, lightmap_size: LightmapSize) -> Self {
        self.lightmap_size = lightmap_size;
        self
    }

    pub fn with_material(
        mut self,
        material: impl Material + 'static,
    ) -> Self {
        self.material = Some(Arc::new(material));
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_lighting_static(mut self, lighting_static: bool) -> Self {
        self.lighting_static = lighting_static;
        self
    }

    pub fn with_batching_static(mut self, batching_static: bool) -> Self {
        self.batching_static = batching_static;
        self
    }

    pub fn with_cast_shadows(mut self, cast_shadows: bool) -> Self {
        self.cast_shadows = cast_shadows;
        self
    }

    /// Number of times this surface's light-map got reloaded.
    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::Relaxed)
    }

    fn is_visible_to(&self, filter: RaycastFilter) -> bool {
        if !self.active && self.key.kind != SurfaceKind::SolidPart {
            return false;
        }

        if filter.static_only && !self.lighting_static {
            return false;
        }

        if filter.shadow_casters_only && !self.cast_shadows {
            return false;
        }

        match self.key.kind {
            SurfaceKind::MeshPart => true,
            SurfaceKind::Batch => filter.include_batches,
            SurfaceKind::SolidPart => filter.include_solid_geometry,
        }
    }
}

impl BakeSurface for SceneSurface {
    fn key(&self) -> &SurfaceKey {
        &self.key
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn bounds(&self) -> BoundingBox {
        BoundingBox::from_points(
            self.vertices.iter().map(|vertex| vertex.position),
        )
        .with_transform(self.transform())
    }

    fn lightmap_size(&self) -> LightmapSize {
        self.lightmap_size
    }

    fn material(&self) -> Option<Arc<dyn Material>> {
        self.material.clone()
    }

    fn transform(&self) -> Affine3A {
        if self.key.kind == SurfaceKind::MeshPart {
            self.transform
        } else {
            Affine3A::IDENTITY
        }
    }

    fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    fn indices(&self) -> &[u32] {
        &self.indices
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn is_lighting_static(&self) -> bool {
        self.lighting_static
    }

    fn is_batching_static(&self) -> bool {
        self.batching_static
    }

    fn reload_lightmap(&self) {
        self.reloads.fetch_add(1, Ordering::Relaxed);
    }
}
