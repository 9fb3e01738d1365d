use std::path::{Path, PathBuf};

/// Build FFmpeg arguments for streaming PNG frames to stdout.
///
/// One frame per `time_step` seconds, downscaled to `width`x`height`. The
/// image2pipe muxer writes the images back to back with no framing; the
/// stream is cut apart again by [`super::FrameStream`].
pub fn build_pipe_extract_args(input: &Path, time_step: f64, width: u32, height: u32) -> Vec<String> {
    vec![
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-vf".to_string(),
        format!("fps=1/{}", time_step),
        "-s".to_string(),
        format!("{}x{}", width, height),
        "-f".to_string(),
        "image2pipe".to_string(),
        "-vcodec".to_string(),
        "png".to_string(),
        "-".to_string(),
    ]
}

/// Build FFmpeg arguments for extracting numbered PNG frames into a cache
/// folder. `output_pattern` must contain a `%03d` placeholder.
pub fn build_folder_extract_args(
    input: &Path,
    time_step: f64,
    width: u32,
    height: u32,
    output_pattern: &Path,
) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
        "-vf".to_string(),
        format!("fps=1/{}", time_step),
        "-s".to_string(),
        format!("{}x{}", width, height),
        "-vcodec".to_string(),
        "png".to_string(),
        output_pattern.to_string_lossy().to_string(),
    ]
}

/// Build FFmpeg arguments for stream-copy concatenation via the concat
/// demuxer. Fast, but every input must share identical stream parameters.
pub fn build_concat_chain_args(list_file: &Path, output: &Path) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        list_file.to_string_lossy().to_string(),
        "-c".to_string(),
        "copy".to_string(),
    ];
    args.extend(progress_args());
    args.push(output.to_string_lossy().to_string());
    args
}

/// Build FFmpeg arguments for re-encoding concatenation via the concat
/// filter: every input is scaled and letterbox-padded onto the common
/// `canvas` before joining, so mixed resolutions are fine.
pub fn build_concat_compose_args(
    inputs: &[PathBuf],
    canvas: (u32, u32),
    output: &Path,
) -> Vec<String> {
    let (width, height) = canvas;
    let mut args = vec!["-y".to_string()];

    for input in inputs {
        args.push("-i".to_string());
        args.push(input.to_string_lossy().to_string());
    }

    let mut filter = String::new();
    for i in 0..inputs.len() {
        filter.push_str(&format!(
            "[{i}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1[v{i}];",
            i = i,
            w = width,
            h = height,
        ));
    }
    for i in 0..inputs.len() {
        filter.push_str(&format!("[v{i}][{i}:a]", i = i));
    }
    filter.push_str(&format!("concat=n={}:v=1:a=1[v][a]", inputs.len()));

    args.push("-filter_complex".to_string());
    args.push(filter);
    args.extend([
        "-map".to_string(),
        "[v]".to_string(),
        "-map".to_string(),
        "[a]".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "medium".to_string(),
        "-crf".to_string(),
        "23".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        "192k".to_string(),
    ]);
    args.extend(progress_args());
    args.push(output.to_string_lossy().to_string());
    args
}

/// The compose canvas: the largest width and height over all inputs,
/// rounded down to even values for the encoder.
pub fn compose_canvas(dimensions: &[(u32, u32)]) -> (u32, u32) {
    let width = dimensions.iter().map(|d| d.0).max().unwrap_or(0);
    let height = dimensions.iter().map(|d| d.1).max().unwrap_or(0);
    (width & !1, height & !1)
}

/// Machine-readable progress on stdout, human noise suppressed.
fn progress_args() -> [String; 5] {
    [
        "-progress".to_string(),
        "pipe:1".to_string(),
        "-nostats".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipe_extract_args() {
        let args = build_pipe_extract_args(Path::new("in.mp4"), 0.4, 40, 40);
        assert!(args.contains(&"fps=1/0.4".to_string()));
        assert!(args.contains(&"image2pipe".to_string()));
        assert_eq!(args.last().unwrap(), "-");
    }

    #[test]
    fn test_chain_args_copy_codec() {
        let args = build_concat_chain_args(Path::new("list.txt"), Path::new("out.mp4"));
        assert!(args.contains(&"concat".to_string()));
        assert!(args.contains(&"copy".to_string()));
        assert_eq!(args.last().unwrap(), "out.mp4");
    }

    #[test]
    fn test_compose_filter_graph() {
        let inputs = [PathBuf::from("a.mp4"), PathBuf::from("b.mp4")];
        let args = build_concat_compose_args(&inputs, (1280, 720), Path::new("out.mp4"));
        let filter = &args[args.iter().position(|a| a == "-filter_complex").unwrap() + 1];
        assert!(filter.contains("[0:v]scale=1280:720"));
        assert!(filter.contains("[1:v]scale=1280:720"));
        assert!(filter.ends_with("concat=n=2:v=1:a=1[v][a]"));
    }

    #[test]
    fn test_compose_canvas() {
        assert_eq!(compose_canvas(&[(640, 480), (1281, 721)]), (1280, 720));
        assert_eq!(compose_canvas(&[]), (0, 0));
    }
}
