//! Frame extraction through an external ffmpeg process.
//!
//! The image2pipe muxer writes consecutive PNG images to stdout with no
//! framing of its own, so [`FrameStream`] reassembles individual images by
//! scanning the byte stream for the PNG signature and the constant tail of
//! the IEND chunk. A second entry point extracts a dense frame set into an
//! on-disk cache folder, reused on every later request for the same file.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use image::RgbaImage;
use tracing::{debug, error, warn};

use crate::error::ExtractionError;
use crate::utils::{cache_folder_name, file_stem};

use super::commands::{build_folder_extract_args, build_pipe_extract_args};

/// First eight bytes of every PNG file.
const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
/// IEND chunk type plus its CRC; constant because IEND carries no data.
const PNG_IEND: &[u8] = &[b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82];

const READ_CHUNK: usize = 8192 * 8;

/// Seconds of source video represented by one cached frame, per pixel of
/// thumbnail width. A 40 px thumbnail gets one frame every 0.4 s.
const CACHE_STEP_PER_WIDTH_PX: f64 = 1.0 / 100.0;

/// Clamp a frame sampling interval so the `fps=1/<step>` filter argument is
/// always valid and at least one frame is produced: the step must be
/// strictly positive and never exceed the clip duration.
pub fn effective_time_step(requested: f64, duration_s: f64) -> f64 {
    let ceiling = if duration_s > 0.0 { duration_s } else { 1.0 };
    if requested <= 0.0 {
        ceiling
    } else {
        requested.min(ceiling)
    }
}

/// Cuts a raw byte stream of back-to-back PNG images into single images.
#[derive(Debug, Default)]
pub struct PngStreamSplitter {
    buffer: Vec<u8>,
}

impl PngStreamSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk read from the decoder's stdout.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Take the next complete PNG image out of the buffer, if one has fully
    /// arrived. Bytes before the signature are discarded with it.
    pub fn next_image(&mut self) -> Option<Vec<u8>> {
        let start = find(&self.buffer, PNG_SIGNATURE)?;
        let end_rel = find(&self.buffer[start..], PNG_IEND)?;
        let end = start + end_rel + PNG_IEND.len();

        let image = self.buffer[start..end].to_vec();
        self.buffer.drain(..end);
        Some(image)
    }

    /// Bytes buffered but not yet forming a complete image.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Lazy, consumed-once sequence of frames sampled from a video.
///
/// Spawns ffmpeg configured to emit one PNG per `time_step` seconds at the
/// requested size and decodes images as they complete. Any subprocess or
/// decode error terminates the child process and ends the sequence; the
/// error is logged, never raised.
pub struct FrameStream {
    child: Option<Child>,
    splitter: PngStreamSplitter,
    chunk: Vec<u8>,
    finished: bool,
}

impl FrameStream {
    pub fn open(
        ffmpeg_path: &str,
        input: &Path,
        time_step: f64,
        width: u32,
        height: u32,
    ) -> Result<Self, ExtractionError> {
        let step = if time_step > 0.0 { time_step } else { 1.0 };
        let args = build_pipe_extract_args(input, step, width, height);

        let child = Command::new(ffmpeg_path)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .stdin(Stdio::null())
            .spawn()
            .map_err(ExtractionError::Spawn)?;

        Ok(Self {
            child: Some(child),
            splitter: PngStreamSplitter::new(),
            chunk: vec![0u8; READ_CHUNK],
            finished: false,
        })
    }

    /// Kill the child after a stream error. Kill + wait to avoid zombies.
    fn terminate(&mut self) {
        if let Some(ref mut child) = self.child {
            let _ = child.kill();
            let _ = child.wait();
        }
        self.child = None;
        self.finished = true;
    }

    /// Reap the child after its stdout reached EOF.
    fn reap(&mut self) {
        if let Some(mut child) = self.child.take() {
            match child.wait() {
                Ok(status) if !status.success() => {
                    warn!("frame extraction process exited with {}", status);
                }
                Err(e) => warn!("failed to reap frame extraction process: {}", e),
                _ => {}
            }
        }
        self.finished = true;
    }
}

impl Iterator for FrameStream {
    type Item = RgbaImage;

    fn next(&mut self) -> Option<RgbaImage> {
        loop {
            if let Some(bytes) = self.splitter.next_image() {
                match image::load_from_memory_with_format(&bytes, image::ImageFormat::Png) {
                    Ok(img) => return Some(img.to_rgba8()),
                    Err(e) => {
                        error!("failed to decode extracted frame: {}", e);
                        self.terminate();
                        return None;
                    }
                }
            }

            if self.finished {
                return None;
            }

            let stdout = match self.child.as_mut().and_then(|c| c.stdout.as_mut()) {
                Some(stdout) => stdout,
                None => {
                    self.finished = true;
                    return None;
                }
            };

            match stdout.read(&mut self.chunk) {
                Ok(0) => {
                    // EOF with no complete image buffered
                    self.reap();
                    return None;
                }
                Ok(n) => {
                    let chunk = std::mem::take(&mut self.chunk);
                    self.splitter.extend(&chunk[..n]);
                    self.chunk = chunk;
                }
                Err(e) => {
                    error!("frame stream read failed: {}", e);
                    self.terminate();
                    return None;
                }
            }
        }
    }
}

impl Drop for FrameStream {
    fn drop(&mut self) {
        if let Some(ref mut child) = self.child {
            let _ = child.kill();
            let _ = child.wait();
        }
        self.child = None;
    }
}

/// Extract a dense, fixed-interval frame set for `input` into
/// `<snaps_root>/<stem>-<hash>/<stem>NNN.png`, once per source file.
///
/// An existing folder is the cache-hit test; its content is never
/// revalidated against the source file. On extraction failure the partial
/// folder is removed so the next attempt starts clean.
pub fn extract_frames_to_folder(
    ffmpeg_path: &str,
    snaps_root: &Path,
    input: &Path,
    width: u32,
    height: u32,
    duration_s: f64,
) -> Result<PathBuf, ExtractionError> {
    let folder = snaps_root.join(cache_folder_name(input));
    if folder.is_dir() {
        debug!("frame cache hit for {:?}", input);
        return Ok(folder);
    }
    std::fs::create_dir_all(&folder)?;

    let time_step = effective_time_step(width as f64 * CACHE_STEP_PER_WIDTH_PX, duration_s);
    let pattern = folder.join(format!("{}%03d.png", file_stem(input)));
    let args = build_folder_extract_args(input, time_step, width, height, &pattern);

    debug!("extracting frames for {:?} every {}s", input, time_step);
    let output = match Command::new(ffmpeg_path).args(&args).stdin(Stdio::null()).output() {
        Ok(output) => output,
        Err(e) => {
            let _ = std::fs::remove_dir_all(&folder);
            return Err(ExtractionError::Spawn(e));
        }
    };

    if !output.status.success() {
        let _ = std::fs::remove_dir_all(&folder);
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExtractionError::Decoder(format!(
            "ffmpeg exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(folder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::ImageEncoder;

    fn encode_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgba8)
            .unwrap();
        bytes
    }

    #[test]
    fn test_splitter_yields_three_images_in_order() {
        let pngs = [encode_png(4, 4), encode_png(8, 4), encode_png(4, 8)];
        let stream: Vec<u8> = pngs.iter().flatten().copied().collect();

        let mut splitter = PngStreamSplitter::new();
        // Feed in small chunks to exercise buffering across boundaries
        for chunk in stream.chunks(7) {
            splitter.extend(chunk);
        }

        let mut sizes = Vec::new();
        while let Some(bytes) = splitter.next_image() {
            let img = image::load_from_memory(&bytes).unwrap();
            sizes.push((img.width(), img.height()));
        }
        assert_eq!(sizes, vec![(4, 4), (8, 4), (4, 8)]);
        assert_eq!(splitter.pending_bytes(), 0);
    }

    #[test]
    fn test_splitter_holds_partial_image() {
        let png = encode_png(4, 4);
        let mut splitter = PngStreamSplitter::new();
        splitter.extend(&png[..png.len() - 1]);
        assert!(splitter.next_image().is_none());
        splitter.extend(&png[png.len() - 1..]);
        assert!(splitter.next_image().is_some());
    }

    #[test]
    fn test_effective_time_step() {
        // Pathological zero step falls back to the clip duration
        assert_eq!(effective_time_step(0.0, 12.3), 12.3);
        // Steps longer than the clip are clamped so one frame is produced
        assert_eq!(effective_time_step(60.0, 12.3), 12.3);
        // Sensible requests pass through
        assert_eq!(effective_time_step(0.4, 12.3), 0.4);
        // Unknown duration still yields a usable positive step
        assert_eq!(effective_time_step(-1.0, 0.0), 1.0);
    }

    #[test]
    fn test_folder_cache_hit_skips_extraction() {
        let root = tempfile::tempdir().unwrap();
        let input = Path::new("/videos/sample.mp4");
        let folder = root.path().join(cache_folder_name(input));
        std::fs::create_dir_all(&folder).unwrap();

        // A bogus ffmpeg path proves the subprocess is never spawned
        let result =
            extract_frames_to_folder("/nonexistent/ffmpeg", root.path(), input, 40, 40, 5.0);
        assert_eq!(result.unwrap(), folder);
    }
}
