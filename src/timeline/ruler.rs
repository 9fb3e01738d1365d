use super::ITEMS_ROFFSET;

/// Selectable zoom levels, in pixels of track per second of video.
pub const ZOOM_VARIANTS: &[f32] = &[
    0.5, 1.0, 2.0, 5.0, 10.0, 15.0, 20.0, 30.0, 50.0, 80.0, 100.0,
];

const DEFAULT_ZOOM_INDEX: usize = 4; // 10 px/sec

const TICK_STEP_PX: f32 = 10.0;
const MAJOR_TICK_EVERY_PX: f32 = 50.0;
const LABEL_STEP_PX: f32 = 50.0;
const MINOR_TICK_HEIGHT: f32 = 10.0;
const MAJOR_TICK_HEIGHT: f32 = 20.0;

/// Minimum ruler span, in seconds of video at the current zoom.
const MIN_TIMELINE_SECONDS: f32 = 100.0;

/// One tick mark on the ruler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RulerTick {
    pub x: f32,
    pub height: f32,
}

/// One time label under the ruler.
#[derive(Debug, Clone, PartialEq)]
pub struct RulerLabel {
    pub x: f32,
    pub text: String,
}

/// Ruler state: the current zoom level plus the tick/label geometry derived
/// from it. Pure data; rendering belongs to the embedding application.
#[derive(Debug, Clone)]
pub struct TimelineRuler {
    zoom_index: usize,
}

impl TimelineRuler {
    pub fn new() -> Self {
        Self {
            zoom_index: DEFAULT_ZOOM_INDEX,
        }
    }

    pub fn pixels_per_second(&self) -> f32 {
        ZOOM_VARIANTS[self.zoom_index]
    }

    /// Step to the next zoom level. Returns false (no-op) at the top end.
    pub fn zoom_in(&mut self) -> bool {
        if self.zoom_index == ZOOM_VARIANTS.len() - 1 {
            return false;
        }
        self.zoom_index += 1;
        true
    }

    /// Step to the previous zoom level. Returns false (no-op) at the bottom end.
    pub fn zoom_out(&mut self) -> bool {
        if self.zoom_index == 0 {
            return false;
        }
        self.zoom_index -= 1;
        true
    }

    /// Width the ruler should span for a scene of `scene_width` pixels.
    pub fn timeline_width(&self, scene_width: f32) -> f32 {
        scene_width.max(MIN_TIMELINE_SECONDS * self.pixels_per_second())
    }

    /// Tick marks across `width` pixels: one every 10 px, taller at 50 px
    /// multiples, offset by the item margin.
    pub fn ticks(&self, width: f32) -> Vec<RulerTick> {
        let mut ticks = Vec::new();
        let mut px = 0.0;
        while px < width {
            let height = if px % MAJOR_TICK_EVERY_PX == 0.0 {
                MAJOR_TICK_HEIGHT
            } else {
                MINOR_TICK_HEIGHT
            };
            ticks.push(RulerTick {
                x: px + ITEMS_ROFFSET,
                height,
            });
            px += TICK_STEP_PX;
        }
        ticks
    }

    /// Second labels across `width` pixels, one per 50 px, shifted left a
    /// little so the text centers on its tick.
    pub fn labels(&self, width: f32) -> Vec<RulerLabel> {
        let mut labels = Vec::new();
        let mut px = LABEL_STEP_PX;
        while px < width {
            labels.push(RulerLabel {
                x: px + ITEMS_ROFFSET - 10.0,
                text: format!("{:.1}", px / self.pixels_per_second()),
            });
            px += LABEL_STEP_PX;
        }
        labels
    }
}

impl Default for TimelineRuler {
    fn default() -> Self {
        Self::new()
    }
}
