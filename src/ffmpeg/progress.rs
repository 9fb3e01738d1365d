/// Parse one line of `ffmpeg -progress pipe:1` output.
///
/// The progress stream is a sequence of `key=value` lines; the muxer's
/// current frame index arrives as `frame=123`. Returns `None` for every
/// other key.
pub fn parse_frame_line(line: &str) -> Option<u64> {
    line.trim().strip_prefix("frame=")?.trim().parse().ok()
}

/// Tracks the highest frame index seen so far, so progress ticks handed to
/// the caller are monotonically non-decreasing even if the underlying
/// reporting jitters.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last_frame: Option<u64>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one progress line; returns the frame index when it advanced.
    pub fn observe(&mut self, line: &str) -> Option<u64> {
        let frame = parse_frame_line(line)?;
        match self.last_frame {
            Some(last) if frame < last => None,
            _ => {
                self.last_frame = Some(frame);
                Some(frame)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_line() {
        assert_eq!(parse_frame_line("frame=123"), Some(123));
        assert_eq!(parse_frame_line("frame=  42"), Some(42));
        assert_eq!(parse_frame_line("fps=29.97"), None);
        assert_eq!(parse_frame_line("progress=continue"), None);
    }

    #[test]
    fn test_tracker_is_monotone() {
        let mut tracker = ProgressTracker::new();
        assert_eq!(tracker.observe("frame=10"), Some(10));
        assert_eq!(tracker.observe("frame=5"), None);
        assert_eq!(tracker.observe("frame=10"), Some(10));
        assert_eq!(tracker.observe("frame=11"), Some(11));
        assert_eq!(tracker.observe("out_time=00:00:01.00"), None);
    }
}
