use std::path::PathBuf;

use crate::ffmpeg::MediaInfo;

/// Thumbnail widths are kept on a multiple of this so downstream pixel
/// buffers stay aligned.
pub const THUMB_WIDTH_ALIGN: u32 = 4;

/// Everything the editor knows about one source video.
///
/// Created once per file when it is added to the timeline; immutable
/// afterwards and shared read-only (behind an `Arc`) between the analyzer,
/// the storyboard builder and the timeline item.
#[derive(Debug, Clone)]
pub struct ClipMetadata {
    pub path: PathBuf,
    /// Duration in seconds.
    pub duration_s: f64,
    /// Native frame width in pixels.
    pub width: u32,
    /// Native frame height in pixels.
    pub height: u32,
    /// Thumbnail width, aspect-preserving against the track height and
    /// rounded down to a multiple of [`THUMB_WIDTH_ALIGN`].
    pub scaled_width: u32,
    /// Thumbnail height; equals the timeline track height.
    pub scaled_height: u32,
    /// Folder holding the pre-extracted frame images for this file.
    pub frames_folder: PathBuf,
}

impl ClipMetadata {
    pub fn new(
        path: impl Into<PathBuf>,
        info: &MediaInfo,
        target_height: u32,
        frames_folder: impl Into<PathBuf>,
    ) -> Self {
        Self {
            path: path.into(),
            duration_s: info.duration,
            width: info.width,
            height: info.height,
            scaled_width: scaled_frame_width(info.width, info.height, target_height),
            scaled_height: target_height,
            frames_folder: frames_folder.into(),
        }
    }

    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

/// Thumbnail width for a clip scaled to `target_height`, rounded down to a
/// multiple of [`THUMB_WIDTH_ALIGN`] with a floor of one alignment unit.
pub fn scaled_frame_width(native_width: u32, native_height: u32, target_height: u32) -> u32 {
    if native_height == 0 {
        return THUMB_WIDTH_ALIGN;
    }
    let scaled = (native_width as f64 * target_height as f64 / native_height as f64) as u32;
    align_down(scaled).max(THUMB_WIDTH_ALIGN)
}

/// Round `px` down to a multiple of [`THUMB_WIDTH_ALIGN`].
pub fn align_down(px: u32) -> u32 {
    px - px % THUMB_WIDTH_ALIGN
}
