mod analyzer;
mod concat;
mod pool;
mod storyboard;

pub use analyzer::*;
pub use concat::*;
pub use pool::*;
pub use storyboard::*;

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{AnalysisError, ConcatenationError, StoryboardError};
use crate::project::ClipMetadata;

/// Results sent from background jobs to the editor's poll loop. Workers
/// never touch timeline state; they only produce these immutable values.
#[derive(Debug)]
pub(crate) enum WorkerMsg {
    AnalysisDone(Arc<ClipMetadata>),
    AnalysisFailed(AnalysisError),
    StoryboardDone(PreviewData),
    StoryboardFailed {
        path: PathBuf,
        pixels_per_second: f32,
        error: StoryboardError,
    },
    ConcatProgress(u64),
    ConcatDone(Result<PathBuf, ConcatenationError>),
}
