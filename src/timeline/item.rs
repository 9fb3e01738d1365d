use std::fmt;
use std::sync::Arc;

use image::RgbaImage;

use crate::project::ClipMetadata;

/// One clip's visual proxy on the track: its storyboard image scaled to
/// `duration_px x track_height`, plus the current position.
///
/// Lifetime and position are owned exclusively by
/// [`super::TimelineScene`]; the clip metadata is shared read-only.
pub struct TimelineItem {
    pub id: u32,
    pub clip: Arc<ClipMetadata>,
    pub(crate) image: RgbaImage,
    pub(crate) x: f32,
    pub(crate) y: f32,
}

impl TimelineItem {
    pub(crate) fn new(id: u32, clip: Arc<ClipMetadata>, image: RgbaImage) -> Self {
        Self {
            id,
            clip,
            image,
            x: 0.0,
            y: 0.0,
        }
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn width(&self) -> f32 {
        self.image.width() as f32
    }

    pub fn height(&self) -> f32 {
        self.image.height() as f32
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Items stay vertically centered in the track; recomputed whenever the
    /// image changes since its height may differ.
    pub(crate) fn center_vertically(&mut self, track_height: u32) {
        self.y = ((track_height as f32 - self.height()) / 2.0).max(0.0);
    }
}

impl fmt::Debug for TimelineItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}; pos: {}", self.clip.filename(), self.x)
    }
}
