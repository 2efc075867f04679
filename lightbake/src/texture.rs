use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use derivative::Derivative;
use image::RgbaImage;

use crate::BakeError;

/// Identity of a texture asset; two textures with the same handle are
/// considered the same image by the sample cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(u64);

impl TextureHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates a handle that's unique within this process.
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1 << 32);

        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct Texture {
    handle: TextureHandle,
    #[derivative(Debug = "ignore")]
    origin: TextureOrigin,
}

#[derive(Clone)]
enum TextureOrigin {
    File(PathBuf),
    Decoded(Arc<RgbaImage>),
}

impl Texture {
    /// Creates a texture that gets decoded lazily, on its first sample.
    pub fn from_file(handle: TextureHandle, path: impl Into<PathBuf>) -> Self {
        Self {
            handle,
            origin: TextureOrigin::File(path.into()),
        }
    }

    pub fn from_image(handle: TextureHandle, image: RgbaImage) -> Self {
        Self {
            handle,
            origin: TextureOrigin::Decoded(Arc::new(image)),
        }
    }

    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.origin {
            TextureOrigin::File(path) => Some(path),
            TextureOrigin::Decoded(_) => None,
        }
    }

    pub(crate) fn decode(&self) -> Result<Arc<RgbaImage>, BakeError> {
        match &self.origin {
            TextureOrigin::File(path) => {
                let image = image::open(path).map_err(|source| {
                    BakeError::TextureDecode {
                        path: path.to_owned(),
                        source,
                    }
                })?;

                Ok(Arc::new(image.into_rgba8()))
            }

            TextureOrigin::Decoded(image) => Ok(image.clone()),
        }
    }
}
