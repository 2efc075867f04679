use std::sync::Arc;

use crate::{BakeSurface, Light, Raycaster};

/// Everything a bake reads from the outside world.
pub trait BakeScene: Raycaster {
    /// Name of the scene; light-maps are stored under it.
    fn name(&self) -> &str;

    /// All surfaces of the scene, eligible or not.
    fn surfaces(&self) -> Vec<Arc<dyn BakeSurface>>;

    fn lights(&self) -> &[Light];

    /// Called after every light-map has been written.
    fn reload_lightmaps(&self) {}
}
