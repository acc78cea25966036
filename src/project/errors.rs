use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("invalid project path '{path}'")]
    InvalidPath { path: String },

    #[error("'{path}' conflicts with an existing entry")]
    PathConflict { path: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk project directory: {0}")]
    Walk(#[from] walkdir::Error),
}
