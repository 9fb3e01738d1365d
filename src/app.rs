use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use image::imageops::{self, FilterType};
use tokio::runtime::Runtime;
use tracing::{debug, warn};

use crate::config::EditorConfig;
use crate::error::StoryboardError;
use crate::events::EditorEvent;
use crate::ffmpeg::FFmpegWrapper;
use crate::player::{NullPlayer, Player};
use crate::project::ClipMetadata;
use crate::timeline::{SceneRect, TimelineItem, TimelineRuler, TimelineScene};
use crate::workers::{
    analyze_clip, build_storyboard, run_concatenation, ConcatMethod, PreviewData, WorkerMsg,
    WorkerPool,
};

/// The interactive-thread coordinator of the editor.
///
/// Owns all timeline state and mutates it only inside [`EditorCore::poll`],
/// which drains results that background workers sent over a channel. The
/// embedding application calls `poll` once per frame, reacts to
/// [`EditorEvent`]s, and forwards user input to the public methods here.
pub struct EditorCore {
    config: EditorConfig,
    ffmpeg: FFmpegWrapper,
    // Declared before the runtime so the pool joins its workers (which may
    // hold a runtime handle) before the runtime shuts down
    pool: WorkerPool,
    runtime: Runtime,
    scene: TimelineScene,
    ruler: TimelineRuler,
    player: Box<dyn Player>,

    selected: Option<u32>,
    /// File currently loaded into the player, if any.
    loaded_file: Option<PathBuf>,

    /// Clips on their way to the timeline (analysis or storyboard still in
    /// flight). A completion for a path not in here belongs to a clip the
    /// user got rid of and is dropped.
    pending_adds: Vec<PathBuf>,
    /// Completions for fresh clips that arrived mid-relayout; appended once
    /// the relayout settles.
    deferred_adds: Vec<PreviewData>,

    // Zoom rebuild barrier: the item order captured before the scene was
    // cleared, results held back until every rebuild reported in.
    relayout_order: Vec<PathBuf>,
    relayout_results: Vec<PreviewData>,
    pending_previews: usize,

    /// True while a concatenation runs; gates the trigger.
    is_processing: bool,

    worker_tx: Sender<WorkerMsg>,
    worker_rx: Receiver<WorkerMsg>,
    events_tx: Sender<EditorEvent>,
    events_rx: Receiver<EditorEvent>,
}

impl EditorCore {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_player(config, Box::new(NullPlayer))
    }

    pub fn with_player(config: EditorConfig, player: Box<dyn Player>) -> Self {
        let (worker_tx, worker_rx) = unbounded();
        let (events_tx, events_rx) = unbounded();
        let ffmpeg =
            FFmpegWrapper::with_paths(config.ffmpeg_path.clone(), config.ffprobe_path.clone());

        Self {
            pool: WorkerPool::new(config.workers),
            runtime: Runtime::new().expect("Failed to create Tokio runtime"),
            ffmpeg,
            config,
            player,
            scene: TimelineScene::new(),
            ruler: TimelineRuler::new(),
            selected: None,
            loaded_file: None,
            pending_adds: Vec::new(),
            deferred_adds: Vec::new(),
            relayout_order: Vec::new(),
            relayout_results: Vec::new(),
            pending_previews: 0,
            is_processing: false,
            worker_tx,
            worker_rx,
            events_tx,
            events_rx,
        }
    }

    /// Event stream for the embedding application. Single consumer; drain
    /// it alongside [`EditorCore::poll`].
    pub fn events(&self) -> Receiver<EditorEvent> {
        self.events_rx.clone()
    }

    pub fn scene(&self) -> &TimelineScene {
        &self.scene
    }

    pub fn ruler(&self) -> &TimelineRuler {
        &self.ruler
    }

    pub fn pixels_per_second(&self) -> f32 {
        self.ruler.pixels_per_second()
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    /// The visible scrollable area: the items' bounding box, or the
    /// configured minimum when the timeline is empty.
    pub fn scene_rect(&self) -> SceneRect {
        self.scene
            .bounding_rect(self.config.min_scene_width, self.config.track_height as f32)
    }

    // ---- Adding clips ----

    /// Analyze a dropped file in the background; the clip appears on the
    /// timeline once its storyboard is built.
    pub fn add_clip(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.pending_adds.push(path.clone());

        let wrapper = self.ffmpeg.clone();
        let config = self.config.clone();
        let tx = self.worker_tx.clone();
        self.pool.execute(move || {
            let msg = match analyze_clip(&wrapper, &config, &path) {
                Ok(clip) => WorkerMsg::AnalysisDone(Arc::new(clip)),
                Err(e) => WorkerMsg::AnalysisFailed(e),
            };
            let _ = tx.send(msg);
        });
    }

    /// Drain background results and apply them to the timeline. Must be
    /// called from the interactive thread, typically once per frame.
    pub fn poll(&mut self) {
        while let Ok(msg) = self.worker_rx.try_recv() {
            self.handle_worker_msg(msg);
        }
    }

    // ---- Selection and playback ----

    /// Make `id` the sole selection and load its clip into the player.
    pub fn select_item(&mut self, id: u32) {
        let clip = match self.scene.item(id) {
            Some(item) => item.clip.clone(),
            None => return,
        };
        self.selected = Some(id);
        self.player.load(&clip.path);
        self.loaded_file = Some(clip.path.clone());
        self.emit(EditorEvent::ItemSelected(clip));
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected_item(&self) -> Option<&TimelineItem> {
        self.selected.and_then(|id| self.scene.item(id))
    }

    /// Load a file straight into the player, bypassing the timeline.
    pub fn play_file(&mut self, path: &Path) {
        self.player.load(path);
        self.loaded_file = Some(path.to_path_buf());
    }

    // ---- Item manipulation ----

    /// Free item movement while a drag is in progress.
    pub fn drag_item(&mut self, id: u32, x: f32) {
        self.scene.set_position(id, x);
    }

    /// Settle a drag: reflow the timeline around the drop position.
    pub fn drop_item(&mut self, id: u32, x: f32) {
        self.scene.reorder_on_drop(id, x);
    }

    pub fn remove_selected(&mut self) {
        let id = match self.selected.take() {
            Some(id) => id,
            None => return,
        };
        self.remove_item(id);
    }

    /// Delete an item, close the gap it leaves, and stop the player if it
    /// was playing this clip.
    pub fn remove_item(&mut self, id: u32) {
        let item = match self.scene.remove(id) {
            Some(item) => item,
            None => return,
        };
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.scene.remove_gaps();

        if self.loaded_file.as_deref() == Some(item.clip.path.as_path()) {
            self.player.stop();
            self.loaded_file = None;
        }
        self.emit(EditorEvent::ItemRemoved(item.clip));
    }

    // ---- Zoom ----

    pub fn zoom_in(&mut self) {
        if self.relayout_in_progress() {
            warn!("zoom ignored while a relayout is pending");
            return;
        }
        if self.ruler.zoom_in() {
            self.rebuild_previews();
        }
    }

    pub fn zoom_out(&mut self) {
        if self.relayout_in_progress() {
            warn!("zoom ignored while a relayout is pending");
            return;
        }
        if self.ruler.zoom_out() {
            self.rebuild_previews();
        }
    }

    /// Capture the current item order, clear the scene and rebuild every
    /// storyboard at the new zoom. Items return to the timeline in the
    /// captured order once the last rebuild reports in, regardless of the
    /// order completions arrive in.
    fn rebuild_previews(&mut self) {
        let items = self.scene.clear();
        self.selected = None;
        if items.is_empty() {
            return;
        }

        self.relayout_order = items.iter().map(|i| i.clip.path.clone()).collect();
        self.relayout_results.clear();
        self.pending_previews = items.len();

        for item in items {
            self.schedule_storyboard(item.clip);
        }
    }

    fn relayout_in_progress(&self) -> bool {
        self.pending_previews > 0
    }

    // ---- Concatenation ----

    /// Join the timeline's clips, in x order, into `output`. Progress and
    /// the terminal result arrive as events; while a run is active further
    /// requests are ignored.
    pub fn concatenate(&mut self, output: impl Into<PathBuf>, method: ConcatMethod) {
        if self.is_processing {
            warn!("concatenation already running");
            return;
        }
        let clips = self.scene.clip_sequence();
        if clips.is_empty() {
            warn!("nothing to concatenate");
            return;
        }

        self.is_processing = true;
        self.emit(EditorEvent::ConcatStarted);

        let wrapper = self.ffmpeg.clone();
        let handle = self.runtime.handle().clone();
        let tx = self.worker_tx.clone();
        let output = output.into();
        self.pool
            .execute(move || run_concatenation(wrapper, handle, clips, output, method, tx));
    }

    /// Suggested output filename for the current clip sequence.
    pub fn default_output_name(&self) -> String {
        let paths: Vec<PathBuf> = self
            .scene
            .clip_sequence()
            .iter()
            .map(|c| c.path.clone())
            .collect();
        crate::utils::default_output_name(&paths)
    }

    // ---- Worker completions ----

    fn handle_worker_msg(&mut self, msg: WorkerMsg) {
        match msg {
            WorkerMsg::AnalysisDone(clip) => self.schedule_storyboard(clip),
            WorkerMsg::AnalysisFailed(error) => {
                warn!("{}", error);
                self.take_pending_add(&error.path);
                self.emit(EditorEvent::AnalysisFailed(error));
            }
            WorkerMsg::StoryboardDone(data) => self.on_storyboard_done(data),
            WorkerMsg::StoryboardFailed {
                path,
                pixels_per_second,
                error,
            } => self.on_storyboard_failed(path, pixels_per_second, error),
            WorkerMsg::ConcatProgress(frame) => self.emit(EditorEvent::ConcatProgress(frame)),
            WorkerMsg::ConcatDone(result) => {
                self.is_processing = false;
                match result {
                    Ok(path) => self.emit(EditorEvent::ConcatFinished(path)),
                    Err(e) => self.emit(EditorEvent::ConcatFailed(e)),
                }
            }
        }
    }

    fn schedule_storyboard(&self, clip: Arc<ClipMetadata>) {
        let pixels_per_second = self.ruler.pixels_per_second();
        let tx = self.worker_tx.clone();
        self.pool.execute(move || {
            let msg = match build_storyboard(&clip, pixels_per_second) {
                Ok(data) => WorkerMsg::StoryboardDone(data),
                Err(error) => WorkerMsg::StoryboardFailed {
                    path: clip.path.clone(),
                    pixels_per_second,
                    error,
                },
            };
            let _ = tx.send(msg);
        });
    }

    fn on_storyboard_done(&mut self, data: PreviewData) {
        let current = self.ruler.pixels_per_second();

        if self.relayout_in_progress() {
            if data.pixels_per_second == current && self.expects_relayout(&data.clip.path) {
                self.relayout_results.push(data);
                self.pending_previews -= 1;
                if self.pending_previews == 0 {
                    self.finish_relayout();
                }
            } else if self.pending_adds.contains(&data.clip.path) {
                if data.pixels_per_second == current {
                    self.take_pending_add(&data.clip.path);
                    self.deferred_adds.push(data);
                } else {
                    // Built for a zoom that no longer exists; try again
                    self.schedule_storyboard(data.clip.clone());
                }
            } else {
                debug!("discarding stale storyboard for {:?}", data.clip.path);
            }
            return;
        }

        if self.pending_adds.contains(&data.clip.path) {
            if data.pixels_per_second == current {
                self.take_pending_add(&data.clip.path);
                self.add_preview_item(data);
            } else {
                self.schedule_storyboard(data.clip.clone());
            }
        } else {
            debug!("discarding storyboard for removed clip {:?}", data.clip.path);
        }
    }

    fn on_storyboard_failed(&mut self, path: PathBuf, pixels_per_second: f32, error: StoryboardError) {
        warn!("storyboard build failed for {:?}: {}", path, error);

        if self.relayout_in_progress() && pixels_per_second == self.ruler.pixels_per_second() {
            // The barrier must not hang on a failure: count it and move on.
            // The failed clip drops off the timeline.
            self.pending_previews -= 1;
            self.emit(EditorEvent::StoryboardFailed { path, error });
            if self.pending_previews == 0 {
                self.finish_relayout();
            }
        } else {
            self.take_pending_add(&path);
            self.emit(EditorEvent::StoryboardFailed { path, error });
        }
    }

    /// All pending rebuilds have reported in: re-insert the held results in
    /// the captured pre-zoom order, then anything that was added meanwhile.
    fn finish_relayout(&mut self) {
        let order = std::mem::take(&mut self.relayout_order);
        let mut results = std::mem::take(&mut self.relayout_results);

        for path in &order {
            if let Some(pos) = results.iter().position(|d| &d.clip.path == path) {
                let data = results.remove(pos);
                self.insert_item(data);
            }
        }
        for data in std::mem::take(&mut self.deferred_adds) {
            let clip = data.clip.clone();
            self.insert_item(data);
            self.emit(EditorEvent::ItemAdded(clip));
        }
        self.emit(EditorEvent::RelayoutCompleted);
    }

    /// How many results for `path` the relayout still owes.
    fn expects_relayout(&self, path: &Path) -> bool {
        let wanted = self
            .relayout_order
            .iter()
            .filter(|p| p.as_path() == path)
            .count();
        let have = self
            .relayout_results
            .iter()
            .filter(|d| d.clip.path == path)
            .count();
        have < wanted
    }

    fn take_pending_add(&mut self, path: &Path) -> bool {
        if let Some(pos) = self.pending_adds.iter().position(|p| p == path) {
            self.pending_adds.remove(pos);
            true
        } else {
            false
        }
    }

    fn add_preview_item(&mut self, data: PreviewData) {
        let clip = data.clip.clone();
        self.insert_item(data);
        self.emit(EditorEvent::ItemAdded(clip));
    }

    /// Scale the storyboard to exactly `duration_px x track_height` and
    /// append it to the timeline.
    fn insert_item(&mut self, data: PreviewData) -> u32 {
        let image = imageops::resize(
            &data.storyboard,
            data.duration_px.max(1),
            self.config.track_height,
            FilterType::Triangle,
        );
        self.scene
            .append(data.clip, image, self.config.track_height)
    }

    fn emit(&self, event: EditorEvent) {
        let _ = self.events_tx.send(event);
    }

    /// Log the current item layout. No-op unless the config enables debug.
    pub fn debug_dump(&self) {
        if !self.config.debug {
            return;
        }
        for item in self.scene.items() {
            debug!("{:?}", item);
        }
    }
}
