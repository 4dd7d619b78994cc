//! Timeline collaborators.
//!
//! The capture state machine only talks to a timeline through [`Timeline`] and to the drawable
//! scene through [`Scene`]. [`Director`] implements both for JSON-described shape animations.

/// Playback director over a [`model::SceneDef`].
pub mod director;
/// Boundary scene model (serde).
pub mod model;
/// Drawable scene view.
pub mod scene;

use crate::foundation::error::CaptureResult;

/// Snapshot of one track's capture-relevant properties.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackInfo {
    /// Track name.
    pub name: String,
    /// Current mute flag.
    pub muted: bool,
    /// Time extent of the track's content in seconds.
    pub duration: f64,
}

/// A flat, ordered list of mutually exclusive tracks with a single play cursor.
///
/// Mute changes become visible only after [`Timeline::rebuild_graph`].
pub trait Timeline {
    /// Number of top-level tracks.
    fn track_count(&self) -> usize;

    /// Properties of track `index`, or `None` when out of range.
    fn track(&self, index: usize) -> Option<TrackInfo>;

    /// Set the mute flag of track `index`.
    fn set_muted(&mut self, index: usize, muted: bool) -> CaptureResult<()>;

    /// Duration of the currently built (unmuted) track set, in seconds.
    fn active_duration(&self) -> f64;

    /// Move the play cursor to `time` seconds.
    fn set_play_cursor(&mut self, time: f64);

    /// Current play cursor in seconds.
    fn play_cursor(&self) -> f64;

    /// Resume playback.
    fn play(&mut self);

    /// Whether playback is currently paused.
    fn is_paused(&self) -> bool;

    /// Rebuild the playback graph from the current mute flags.
    fn rebuild_graph(&mut self);
}
