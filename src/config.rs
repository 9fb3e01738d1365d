use std::path::PathBuf;

/// Configuration passed to [`crate::EditorCore`] at construction.
///
/// Everything an embedding application may want to tune lives here; there
/// is no global state.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Path to the ffmpeg executable.
    pub ffmpeg_path: String,
    /// Path to the ffprobe executable.
    pub ffprobe_path: String,
    /// Root directory for per-file frame caches.
    pub snaps_root: PathBuf,
    /// Height of the timeline track, and of every extracted thumbnail, in pixels.
    pub track_height: u32,
    /// Minimum width of the scene rect reported while the timeline is empty.
    pub min_scene_width: f32,
    /// Number of background worker threads.
    pub workers: usize,
    /// Enables extra diagnostics in log output.
    pub debug: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            snaps_root: PathBuf::from("snaps"),
            track_height: 40,
            min_scene_width: 800.0,
            workers: 4,
            debug: false,
        }
    }
}
