use std::path::PathBuf;
use thiserror::Error;

/// A source file could not be opened or decoded during analysis.
#[derive(Debug, Error)]
#[error("analysis of {path:?} failed: {message}")]
pub struct AnalysisError {
    pub path: PathBuf,
    pub message: String,
}

impl AnalysisError {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// The external decoder subprocess failed.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to spawn decoder process: {0}")]
    Spawn(std::io::Error),

    #[error("decoder process failed: {0}")]
    Decoder(String),

    #[error("frame cache I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A storyboard could not be assembled from the frame cache.
#[derive(Debug, Error)]
pub enum StoryboardError {
    #[error("frame folder {0:?} contains no frames")]
    EmptyFrameSet(PathBuf),

    #[error("failed to read frame cache: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode cached frame: {0}")]
    Decode(#[from] image::ImageError),
}

/// Concatenation failed, wrapping the underlying muxer/codec message.
#[derive(Debug, Error)]
#[error("concatenation failed: {message}")]
pub struct ConcatenationError {
    pub message: String,
}

impl ConcatenationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for ConcatenationError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(err.to_string())
    }
}
