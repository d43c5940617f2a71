//! Error types for incdiff-core.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("malformed hash {0:?}: expected 40 hex characters")]
    MalformedHash(String),

    #[error("line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("{0:?} exists and is not empty")]
    PathConflict(PathBuf),

    #[error("path does not exist: {0:?}")]
    PathNotFound(PathBuf),

    #[error("unsafe manifest path {0:?}")]
    UnsafePath(String),

    #[error("path cannot be stored in a manifest (non UTF-8 or line break): {0:?}")]
    UnrepresentablePath(PathBuf),

    #[error("bad exclude pattern: {0}")]
    Glob(#[from] globset::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
