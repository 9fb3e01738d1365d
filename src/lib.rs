//! Core of a desktop video-clip concatenation editor.
//!
//! Clips added to the horizontal timeline are probed in the background,
//! turned into storyboard thumbnail strips, laid out left to right,
//! reordered by drag, rescaled on zoom and finally concatenated into a
//! single output file. Window chrome and the playback widget are external
//! collaborators: the library consumes a [`Player`] capability and reports
//! everything else through [`EditorEvent`]s.

mod app;
mod config;
mod error;
mod events;
pub mod ffmpeg;
mod player;
pub mod project;
pub mod timeline;
pub mod utils;
pub mod workers;

pub use app::EditorCore;
pub use config::EditorConfig;
pub use error::{AnalysisError, ConcatenationError, ExtractionError, StoryboardError};
pub use events::EditorEvent;
pub use player::{NullPlayer, Player};
pub use project::ClipMetadata;
pub use workers::{ConcatMethod, PreviewData};
