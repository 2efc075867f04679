use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, RgbImage};
use log::debug;

use crate::BakeError;

/// Destination of baked light-maps.
pub trait LightmapStore {
    /// Stores light-map of the surface identified by `stem` (e.g. `guid` or
    /// `guid_subIndex`).
    fn save(&mut self, stem: &str, image: &RgbImage) -> Result<(), BakeError>;
}

/// Writes light-maps as JPEG files into a directory.
#[derive(Clone, Debug)]
pub struct DirectoryStore {
    dir: PathBuf,
}

impl DirectoryStore {
    const QUALITY: u8 = 100;

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates a store pointing at `<scenes_dir>/<scene>/Lightmaps`.
    pub fn for_scene(scenes_dir: impl AsRef<Path>, scene: &str) -> Self {
        Self::new(scenes_dir.as_ref().join(scene).join("Lightmaps"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.jpg"))
    }
}

impl LightmapStore for DirectoryStore {
    fn save(&mut self, stem: &str, image: &RgbImage) -> Result<(), BakeError> {
        let path = self.path_of(stem);

        let io_err = |source| BakeError::Io {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;

        let mut file = BufWriter::new(File::create(&path).map_err(io_err)?);

        JpegEncoder::new_with_quality(&mut file, Self::QUALITY)
            .encode(image, image.width(), image.height(), ColorType::Rgb8)
            .map_err(|source| BakeError::Encode {
                stem: stem.to_owned(),
                source,
            })?;

        file.flush().map_err(io_err)?;

        debug!("Light-map `{}` written to `{}`", stem, path.display());

        Ok(())
    }
}

/// Keeps light-maps in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    images: BTreeMap<String, RgbImage>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, stem: &str) -> Option<&RgbImage> {
        self.images.get(stem)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RgbImage)> + '_ {
        self.images
            .iter()
            .map(|(stem, image)| (stem.as_str(), image))
    }
}

impl LightmapStore for MemoryStore {
    fn save(&mut self, stem: &str, image: &RgbImage) -> Result<(), BakeError> {
        self.images.insert(stem.to_owned(), image.clone());

        Ok(())
    }
}
