use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;

/// Stream facts read from a media file without decoding it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaInfo {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub format_name: String,
}

#[derive(Debug, Deserialize)]
struct FFProbeOutput {
    format: Option<FFProbeFormat>,
    streams: Option<Vec<FFProbeStream>>,
}

#[derive(Debug, Deserialize)]
struct FFProbeFormat {
    duration: Option<String>,
    format_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FFProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

pub fn probe_file(ffprobe_path: &str, path: &Path) -> Result<MediaInfo> {
    let output = Command::new(ffprobe_path)
        .args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("ffprobe failed: {}", stderr));
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parse the JSON printed by `ffprobe -print_format json`.
fn parse_probe_output(json_str: &str) -> Result<MediaInfo> {
    let probe_output: FFProbeOutput = serde_json::from_str(json_str)
        .map_err(|e| anyhow!("Failed to parse ffprobe output: {}", e))?;

    let mut info = MediaInfo::default();

    if let Some(format) = probe_output.format {
        info.duration = format.duration
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);
        info.format_name = format.format_name.unwrap_or_default();
    }

    if let Some(streams) = probe_output.streams {
        for stream in streams {
            match stream.codec_type.as_deref().unwrap_or("") {
                "video" => {
                    info.video_codec = stream.codec_name;
                    info.width = stream.width.unwrap_or(0);
                    info.height = stream.height.unwrap_or(0);
                }
                "audio" => {
                    info.audio_codec = stream.codec_name;
                }
                _ => {}
            }
        }
    }

    Ok(info)
}
