use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BakeError {
    #[error("couldn't decode texture `{path}`: {source}")]
    TextureDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("couldn't encode light-map `{stem}`: {source}")]
    Encode {
        stem: String,
        #[source]
        source: image::ImageError,
    },

    #[error("couldn't write light-map to `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
