use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use super::commands::{build_concat_chain_args, build_concat_compose_args};
use super::extract::{extract_frames_to_folder, FrameStream};
use super::probe::{probe_file, MediaInfo};
use super::progress::ProgressTracker;
use crate::error::ExtractionError;

/// Entry point for every ffmpeg/ffprobe invocation the editor makes.
#[derive(Clone)]
pub struct FFmpegWrapper {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl FFmpegWrapper {
    pub fn new() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
        }
    }

    pub fn with_paths(ffmpeg_path: String, ffprobe_path: String) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
        }
    }

    /// Check if FFmpeg is available
    pub fn is_available(&self) -> bool {
        std::process::Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Probe a media file for duration, dimensions and codecs.
    pub fn probe(&self, path: &Path) -> Result<MediaInfo> {
        probe_file(&self.ffprobe_path, path)
    }

    /// Open a lazy stream of frames sampled every `time_step` seconds.
    pub fn frame_stream(
        &self,
        input: &Path,
        time_step: f64,
        width: u32,
        height: u32,
    ) -> Result<FrameStream, ExtractionError> {
        FrameStream::open(&self.ffmpeg_path, input, time_step, width, height)
    }

    /// Populate (or reuse) the on-disk frame cache for `input`.
    pub fn cache_frames(
        &self,
        snaps_root: &Path,
        input: &Path,
        width: u32,
        height: u32,
        duration_s: f64,
    ) -> Result<PathBuf, ExtractionError> {
        extract_frames_to_folder(&self.ffmpeg_path, snaps_root, input, width, height, duration_s)
    }

    /// Concatenate by stream copy via the concat demuxer. Requires uniform
    /// stream parameters across the inputs.
    pub async fn concat_chain(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        on_progress: impl FnMut(u64),
    ) -> Result<()> {
        // Temporary list file for the demuxer
        let list_file =
            std::env::temp_dir().join(format!("clipstitch_concat_{}.txt", std::process::id()));
        let list_content: String = inputs
            .iter()
            .map(|p| format!("file '{}'", p.to_string_lossy().replace('\'', "'\\''")))
            .collect::<Vec<_>>()
            .join("\n");

        std::fs::write(&list_file, list_content)?;

        let args = build_concat_chain_args(&list_file, output);
        let result = self.execute_with_progress(&args, on_progress).await;

        let _ = std::fs::remove_file(&list_file);

        result
    }

    /// Concatenate by re-encoding onto a common canvas, letterboxing inputs
    /// whose aspect differs.
    pub async fn concat_compose(
        &self,
        inputs: &[PathBuf],
        canvas: (u32, u32),
        output: &Path,
        on_progress: impl FnMut(u64),
    ) -> Result<()> {
        let args = build_concat_compose_args(inputs, canvas, output);
        self.execute_with_progress(&args, on_progress).await
    }

    /// Run an FFmpeg command, feeding frame-index progress ticks from its
    /// `-progress pipe:1` output to the callback.
    async fn execute_with_progress(
        &self,
        args: &[String],
        mut on_progress: impl FnMut(u64),
    ) -> Result<()> {
        let mut child = Command::new(&self.ffmpeg_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("Failed to capture stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("Failed to capture stderr"))?;

        // Drain stderr concurrently so a chatty encoder cannot fill the pipe
        // and stall the process
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut collected = Vec::new();
            while let Ok(Some(line)) = lines.next_line().await {
                collected.push(line);
            }
            collected
        });

        let mut tracker = ProgressTracker::new();
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(frame) = tracker.observe(&line) {
                on_progress(frame);
            }
        }

        let status = child.wait().await?;
        let stderr_lines = stderr_task.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            Err(anyhow!(
                "ffmpeg exited with {}: {}",
                status,
                stderr_lines.join("\n")
            ))
        }
    }
}

impl Default for FFmpegWrapper {
    fn default() -> Self {
        Self::new()
    }
}
