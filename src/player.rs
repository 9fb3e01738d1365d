use std::path::Path;

/// Playback capability consumed by the editor.
///
/// The editor calls this when a timeline item becomes the sole selection or
/// a file is dropped directly onto the player, and stops playback when the
/// clip being played is removed from the timeline. The actual media widget
/// lives in the embedding application.
pub trait Player: Send {
    fn load(&mut self, path: &Path);
    fn stop(&mut self);
}

/// Player used when no playback collaborator is wired in.
#[derive(Debug, Default)]
pub struct NullPlayer;

impl Player for NullPlayer {
    fn load(&mut self, _path: &Path) {}
    fn stop(&mut self) {}
}
