use std::sync::Arc;

use crate::{
    foundation::core::{Affine, BezPath, Rgba8},
    foundation::error::{CaptureError, CaptureResult},
    timeline::model::{ClipDef, SceneDef},
    timeline::scene::{Scene, ShapeInstance},
    timeline::{Timeline, TrackInfo},
};

/// Playback state of a [`Director`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayState {
    /// Cursor is held; nothing is evaluating.
    Paused,
    /// Graph is live.
    Playing,
}

/// Plays a [`SceneDef`]: owns the mute flags, the play cursor and the built graph.
///
/// A freshly built director is paused. Rebuilding the graph with no unmuted tracks pauses it
/// again, the same way an engine director stops when it has nothing to play.
#[derive(Debug)]
pub struct Director {
    scene: SceneDef,
    muted: Vec<bool>,
    // Prebuilt fill paths, indexed [track][clip].
    paths: Vec<Vec<Arc<BezPath>>>,
    cursor: f64,
    state: PlayState,
    graph: Vec<usize>,
}

impl Director {
    /// Validate `scene` and build a director over it.
    pub fn new(scene: SceneDef) -> CaptureResult<Self> {
        scene.validate()?;

        let paths = scene
            .tracks
            .iter()
            .map(|t| {
                t.clips
                    .iter()
                    .map(|c| c.shape.to_path().map(Arc::new))
                    .collect::<CaptureResult<Vec<_>>>()
            })
            .collect::<CaptureResult<Vec<_>>>()?;
        let muted = scene.tracks.iter().map(|t| t.muted).collect();

        let mut out = Self {
            scene,
            muted,
            paths,
            cursor: 0.0,
            state: PlayState::Paused,
            graph: Vec::new(),
        };
        out.rebuild_graph();
        Ok(out)
    }

    /// Parse, validate and wrap a JSON scene.
    pub fn from_json_str(s: &str) -> CaptureResult<Self> {
        Self::new(SceneDef::from_json_str(s)?)
    }

    /// The underlying scene description.
    pub fn scene(&self) -> &SceneDef {
        &self.scene
    }

    /// Current playback state.
    pub fn state(&self) -> PlayState {
        self.state
    }

    /// Track indices in the built graph, in draw order.
    pub fn graph(&self) -> &[usize] {
        &self.graph
    }

    fn sample_clip(
        clip: &ClipDef,
        path: &Arc<BezPath>,
        time: f64,
    ) -> CaptureResult<Option<ShapeInstance>> {
        let local = time - clip.start;
        let position = clip.position.sample(local)?;
        let rotation = clip.rotation_deg.sample(local)?.to_radians();
        let scale = clip.scale.sample(local)?;
        let opacity = clip.opacity.sample(local)?.clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return Ok(None);
        }

        let transform = Affine::translate(position)
            * Affine::rotate(rotation)
            * Affine::scale_non_uniform(scale.x, scale.y);
        Ok(Some(ShapeInstance {
            path: Arc::clone(path),
            transform,
            fill: clip.fill,
            opacity,
        }))
    }
}

/// Whether `clip` is on screen at `time` on a track that ends at `track_end`.
///
/// Ranges are half-open, except that the track's final instant stays visible so that a capture
/// at normalized time 1.0 still shows the last pose.
fn clip_visible(clip: &ClipDef, time: f64, track_end: f64) -> bool {
    clip.start <= time && (time < clip.end || (time == clip.end && clip.end >= track_end))
}

impl Timeline for Director {
    fn track_count(&self) -> usize {
        self.scene.tracks.len()
    }

    fn track(&self, index: usize) -> Option<TrackInfo> {
        let t = self.scene.tracks.get(index)?;
        Some(TrackInfo {
            name: t.name.clone(),
            muted: self.muted[index],
            duration: t.duration(),
        })
    }

    fn set_muted(&mut self, index: usize, muted: bool) -> CaptureResult<()> {
        let count = self.muted.len();
        let slot = self.muted.get_mut(index).ok_or_else(|| {
            CaptureError::timeline(format!("track index {index} out of range ({count} tracks)"))
        })?;
        *slot = muted;
        Ok(())
    }

    fn active_duration(&self) -> f64 {
        self.graph
            .iter()
            .map(|&i| self.scene.tracks[i].duration())
            .fold(0.0, f64::max)
    }

    fn set_play_cursor(&mut self, time: f64) {
        if time.is_finite() {
            self.cursor = time.max(0.0);
        }
    }

    fn play_cursor(&self) -> f64 {
        self.cursor
    }

    fn play(&mut self) {
        self.state = PlayState::Playing;
    }

    fn is_paused(&self) -> bool {
        self.state == PlayState::Paused
    }

    fn rebuild_graph(&mut self) {
        self.graph = (0..self.scene.tracks.len())
            .filter(|&i| !self.muted[i])
            .collect();
        if self.graph.is_empty() {
            self.state = PlayState::Paused;
        }
        tracing::debug!(graph = ?self.graph, "rebuilt playback graph");
    }
}

impl Scene for Director {
    fn background(&self) -> Rgba8 {
        self.scene.background
    }

    fn visible_shapes(&self) -> CaptureResult<Vec<ShapeInstance>> {
        let mut out = Vec::new();
        for &ti in &self.graph {
            let track = &self.scene.tracks[ti];
            let track_end = track.duration();
            for (clip, path) in track.clips.iter().zip(&self.paths[ti]) {
                if !clip_visible(clip, self.cursor, track_end) {
                    continue;
                }
                if let Some(shape) = Self::sample_clip(clip, path, self.cursor)? {
                    out.push(shape);
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/director.rs"]
mod tests;
