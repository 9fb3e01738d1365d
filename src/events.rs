use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{AnalysisError, ConcatenationError, StoryboardError};
use crate::project::ClipMetadata;

/// Events emitted by [`crate::EditorCore`] for the embedding application.
///
/// Delivered over a crossbeam channel obtained from
/// [`crate::EditorCore::events`]; drained by a single consumer, typically
/// once per UI frame.
#[derive(Debug)]
pub enum EditorEvent {
    /// A clip finished analysis + storyboard build and now sits on the timeline.
    ItemAdded(Arc<ClipMetadata>),
    /// A timeline item became the sole selection.
    ItemSelected(Arc<ClipMetadata>),
    /// A timeline item was deleted.
    ItemRemoved(Arc<ClipMetadata>),
    /// A background analysis failed; the clip never reached the timeline.
    AnalysisFailed(AnalysisError),
    /// A storyboard build failed for the given source file.
    StoryboardFailed {
        path: PathBuf,
        error: StoryboardError,
    },
    /// All storyboard rebuilds after a zoom change have completed and the
    /// timeline has been re-packed in its original order.
    RelayoutCompleted,
    /// Concatenation started; the trigger control should be disabled.
    ConcatStarted,
    /// Frame-index progress tick from the muxer, monotonically non-decreasing.
    ConcatProgress(u64),
    /// Concatenation finished; the output file is complete.
    ConcatFinished(PathBuf),
    /// Concatenation failed; the trigger control should be re-enabled.
    ConcatFailed(ConcatenationError),
}
