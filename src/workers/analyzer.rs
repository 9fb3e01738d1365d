use std::path::Path;

use tracing::info;

use crate::config::EditorConfig;
use crate::error::AnalysisError;
use crate::ffmpeg::FFmpegWrapper;
use crate::project::{scaled_frame_width, ClipMetadata};
use crate::utils::format_time;

/// Probe `path` for duration and dimensions (no full decode), then make
/// sure its frame cache is populated at the thumbnail size.
///
/// Runs on a worker thread; the caller converts the result into an event.
/// A failure here never reaches other in-flight analyses.
pub fn analyze_clip(
    wrapper: &FFmpegWrapper,
    config: &EditorConfig,
    path: &Path,
) -> Result<ClipMetadata, AnalysisError> {
    let info = wrapper
        .probe(path)
        .map_err(|e| AnalysisError::new(path, e.to_string()))?;

    if info.width == 0 || info.height == 0 {
        return Err(AnalysisError::new(path, "source has no video stream"));
    }

    let scaled_width = scaled_frame_width(info.width, info.height, config.track_height);
    let frames_folder = wrapper
        .cache_frames(
            &config.snaps_root,
            path,
            scaled_width,
            config.track_height,
            info.duration,
        )
        .map_err(|e| AnalysisError::new(path, e.to_string()))?;

    info!(
        "analyzed {:?}: {} at {}x{}",
        path,
        format_time(info.duration),
        info.width,
        info.height
    );

    Ok(ClipMetadata::new(path, &info, config.track_height, frames_folder))
}
