use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam_channel::Sender;
use tokio::runtime::Handle;
use tracing::{error, info};

use crate::error::ConcatenationError;
use crate::ffmpeg::{compose_canvas, FFmpegWrapper};
use crate::project::ClipMetadata;
use crate::utils::format_time;

use super::WorkerMsg;

/// Stitching strategy for the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcatMethod {
    /// Stream copy through the concat demuxer. Fast, but every input must
    /// share identical frame dimensions and stream parameters.
    Chain,
    /// Re-encode onto a common canvas, letterboxing mismatched inputs.
    Compose,
}

impl ConcatMethod {
    pub fn name(&self) -> &'static str {
        match self {
            ConcatMethod::Chain => "chain",
            ConcatMethod::Compose => "compose",
        }
    }
}

/// Whether `clips` satisfy the chain method's uniform-dimensions requirement.
pub fn chain_compatible(clips: &[Arc<ClipMetadata>]) -> bool {
    clips
        .windows(2)
        .all(|pair| pair[0].width == pair[1].width && pair[0].height == pair[1].height)
}

/// Join `clips` into `output` in timeline order, reporting frame-index
/// progress ticks and the terminal result as [`WorkerMsg`]s.
///
/// Runs on a worker thread; the actual ffmpeg invocation is async and is
/// driven by the editor's runtime through `handle`.
pub(crate) fn run_concatenation(
    wrapper: FFmpegWrapper,
    handle: Handle,
    clips: Vec<Arc<ClipMetadata>>,
    output: PathBuf,
    method: ConcatMethod,
    tx: Sender<WorkerMsg>,
) {
    let result = concatenate(&wrapper, &handle, &clips, &output, method, &tx);
    if let Err(ref e) = result {
        error!("{}", e);
    }
    let _ = tx.send(WorkerMsg::ConcatDone(result.map(|_| output)));
}

fn concatenate(
    wrapper: &FFmpegWrapper,
    handle: &Handle,
    clips: &[Arc<ClipMetadata>],
    output: &Path,
    method: ConcatMethod,
    tx: &Sender<WorkerMsg>,
) -> Result<(), ConcatenationError> {
    let inputs: Vec<PathBuf> = clips.iter().map(|c| c.path.clone()).collect();
    let total_duration: f64 = clips.iter().map(|c| c.duration_s).sum();
    info!(
        "concatenating {} clips ({}) via {}",
        clips.len(),
        format_time(total_duration),
        method.name()
    );

    let progress_tx = tx.clone();
    let on_progress = move |frame: u64| {
        let _ = progress_tx.send(WorkerMsg::ConcatProgress(frame));
    };

    let result = match method {
        ConcatMethod::Chain => {
            if !chain_compatible(clips) {
                return Err(ConcatenationError::new(
                    "chain concatenation requires uniform frame dimensions; \
                     use compose for mixed inputs",
                ));
            }
            handle.block_on(wrapper.concat_chain(&inputs, output, on_progress))
        }
        ConcatMethod::Compose => {
            let dimensions: Vec<(u32, u32)> =
                clips.iter().map(|c| (c.width, c.height)).collect();
            handle.block_on(wrapper.concat_compose(
                &inputs,
                compose_canvas(&dimensions),
                output,
                on_progress,
            ))
        }
    };

    result.map_err(ConcatenationError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffmpeg::MediaInfo;

    fn clip(width: u32, height: u32) -> Arc<ClipMetadata> {
        let info = MediaInfo {
            duration: 5.0,
            width,
            height,
            ..Default::default()
        };
        Arc::new(ClipMetadata::new(Path::new("c.mp4"), &info, 40, "snaps/c"))
    }

    #[test]
    fn test_chain_compatibility() {
        assert!(chain_compatible(&[]));
        assert!(chain_compatible(&[clip(1280, 720)]));
        assert!(chain_compatible(&[clip(1280, 720), clip(1280, 720)]));
        assert!(!chain_compatible(&[clip(1280, 720), clip(640, 480)]));
    }

    #[test]
    fn test_method_names() {
        assert_eq!(ConcatMethod::Chain.name(), "chain");
        assert_eq!(ConcatMethod::Compose.name(), "compose");
    }
}
