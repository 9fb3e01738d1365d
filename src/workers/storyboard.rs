use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{imageops, RgbaImage};
use tracing::warn;

use crate::error::StoryboardError;
use crate::project::{align_down, ClipMetadata, THUMB_WIDTH_ALIGN};

/// Result of one storyboard build, consumed immediately by the timeline to
/// create an item.
pub struct PreviewData {
    pub clip: Arc<ClipMetadata>,
    /// Standalone thumbnail of the first sampled frame.
    pub preview: RgbaImage,
    /// Horizontal composite of all sampled frames.
    pub storyboard: RgbaImage,
    /// How many frames went into the composite.
    pub frames_count: usize,
    /// Pixel width the composite represents on the timeline.
    pub duration_px: u32,
    /// The zoom this build was made for; stale completions are detected
    /// by comparing it to the current zoom.
    pub pixels_per_second: f32,
}

impl fmt::Debug for PreviewData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewData")
            .field("clip", &self.clip.filename())
            .field("frames_count", &self.frames_count)
            .field("duration_px", &self.duration_px)
            .field("pixels_per_second", &self.pixels_per_second)
            .finish()
    }
}

/// Assemble a storyboard strip for `clip` at the given zoom.
///
/// Picks `ceil(duration_px / scaled_width)` frames from the cache folder by
/// even index stride and joins them left to right. The final frame is
/// truncated to the duration remainder (kept on the alignment grid, and
/// never dropped outright) so the strip's total width tracks the clip's
/// duration on the ruler instead of overshooting by most of a frame.
pub fn build_storyboard(
    clip: &Arc<ClipMetadata>,
    pixels_per_second: f32,
) -> Result<PreviewData, StoryboardError> {
    let duration_px = ((clip.duration_s * pixels_per_second as f64).floor() as u32).max(1);
    let frames_needed = duration_px.div_ceil(clip.scaled_width).max(1) as usize;

    let frame_files = list_frame_files(&clip.frames_folder)?;
    if frame_files.is_empty() {
        return Err(StoryboardError::EmptyFrameSet(clip.frames_folder.clone()));
    }

    let stride = (frame_files.len() / frames_needed).max(1);
    let selected: Vec<&PathBuf> = frame_files
        .iter()
        .step_by(stride)
        .take(frames_needed)
        .collect();
    if selected.len() < frames_needed {
        warn!(
            "frame cache for {:?} holds {} frames, storyboard wanted {}",
            clip.path,
            frame_files.len(),
            frames_needed
        );
    }

    let mut frames = Vec::with_capacity(selected.len());
    for file in &selected {
        frames.push(image::open(file)?.to_rgba8());
    }

    let last_frame_width_px = duration_px % clip.scaled_width;
    if last_frame_width_px > 0 {
        if let Some(last) = frames.last_mut() {
            let keep = align_down(last_frame_width_px)
                .max(THUMB_WIDTH_ALIGN)
                .min(last.width());
            let truncated = imageops::crop_imm(last, 0, 0, keep, last.height()).to_image();
            *last = truncated;
        }
    }

    let total_width: u32 = frames.iter().map(|f| f.width()).sum();
    let mut storyboard = RgbaImage::new(total_width, clip.scaled_height);
    let mut cursor = 0i64;
    for frame in &frames {
        imageops::replace(&mut storyboard, frame, cursor, 0);
        cursor += i64::from(frame.width());
    }

    Ok(PreviewData {
        clip: clip.clone(),
        preview: frames[0].clone(),
        frames_count: frames.len(),
        storyboard,
        duration_px,
        pixels_per_second,
    })
}

/// The cache folder's PNG frames in filename order, which matches the
/// extraction's numbering.
fn list_frame_files(folder: &Path) -> Result<Vec<PathBuf>, StoryboardError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(folder)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("png"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffmpeg::MediaInfo;

    fn cached_clip(dir: &Path, duration_s: f64, frame_count: usize) -> Arc<ClipMetadata> {
        for i in 1..=frame_count {
            let frame = RgbaImage::from_pixel(40, 40, image::Rgba([i as u8, 0, 0, 255]));
            frame.save(dir.join(format!("clip{:03}.png", i))).unwrap();
        }
        let info = MediaInfo {
            duration: duration_s,
            width: 400,
            height: 400,
            ..Default::default()
        };
        Arc::new(ClipMetadata::new(Path::new("clip.mp4"), &info, 40, dir))
    }

    #[test]
    fn test_storyboard_width_tracks_duration() {
        let dir = tempfile::tempdir().unwrap();
        // 12.3s at 10 px/sec: duration_px = 123, scaled_width = 40,
        // remainder 3 rounds down to 0 and is held at the alignment floor
        let clip = cached_clip(dir.path(), 12.3, 30);

        let data = build_storyboard(&clip, 10.0).unwrap();
        assert_eq!(data.duration_px, 123);
        assert_eq!(data.frames_count, 4);
        assert_eq!(data.storyboard.width(), 3 * 40 + 4);
        assert_eq!(data.storyboard.height(), 40);
        assert!((data.storyboard.width() as i64 - data.duration_px as i64).abs() <= 3 + 1);
        assert_eq!(data.preview.dimensions(), (40, 40));
    }

    #[test]
    fn test_storyboard_exact_multiple_needs_no_truncation() {
        let dir = tempfile::tempdir().unwrap();
        // 12s at 10 px/sec: 120 px over three full 40 px frames
        let clip = cached_clip(dir.path(), 12.0, 30);

        let data = build_storyboard(&clip, 10.0).unwrap();
        assert_eq!(data.duration_px, 120);
        assert_eq!(data.frames_count, 3);
        assert_eq!(data.storyboard.width(), 120);
    }

    #[test]
    fn test_storyboard_frames_sampled_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let clip = cached_clip(dir.path(), 12.0, 30);

        let data = build_storyboard(&clip, 10.0).unwrap();
        // Stride over 30 cached frames for 3 slots is 10: frames 1, 11, 21,
        // identifiable by the red channel tag written into each frame
        assert_eq!(data.storyboard.get_pixel(0, 0)[0], 1);
        assert_eq!(data.storyboard.get_pixel(40, 0)[0], 11);
        assert_eq!(data.storyboard.get_pixel(80, 0)[0], 21);
    }

    #[test]
    fn test_empty_folder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let info = MediaInfo {
            duration: 5.0,
            width: 400,
            height: 400,
            ..Default::default()
        };
        let clip = Arc::new(ClipMetadata::new(
            Path::new("clip.mp4"),
            &info,
            40,
            dir.path(),
        ));

        assert!(matches!(
            build_storyboard(&clip, 10.0),
            Err(StoryboardError::EmptyFrameSet(_))
        ));
    }

    #[test]
    fn test_short_clip_still_yields_one_frame() {
        let dir = tempfile::tempdir().unwrap();
        // 0.05s at 0.5 px/sec floors to 0 px and is clamped to 1
        let clip = cached_clip(dir.path(), 0.05, 1);

        let data = build_storyboard(&clip, 0.5).unwrap();
        assert_eq!(data.duration_px, 1);
        assert_eq!(data.frames_count, 1);
    }
}
