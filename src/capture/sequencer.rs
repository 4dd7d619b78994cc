use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{
    capture::capturer::{Camera, FrameCapturer},
    capture::config::CaptureConfig,
    foundation::clock::{Clock, SystemClock},
    foundation::error::{CaptureError, CaptureResult},
    timeline::Timeline,
};

/// States of the capture state machine. The machine is cyclic and starts in `Preview`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureState {
    /// Idle: live scrubbing, waiting for a start request.
    Preview,
    /// Pick (or skip) the next track, or finish the session.
    TrackSelect,
    /// Let the rebuilt graph settle before sampling.
    Delay,
    /// Per-track initialization.
    Start,
    /// One frame per tick.
    Capture,
}

/// What a single [`CaptureSequencer::step`] did.
#[derive(Clone, Debug, PartialEq)]
pub enum StepOutcome {
    /// Preview tick; no session running.
    Previewed,
    /// A start request was rejected; still in preview.
    StartRejected {
        /// Diagnostic for the rejection.
        reason: String,
    },
    /// Mute states snapshotted; track selection begins next tick.
    SessionStarted {
        /// Number of tracks the session will visit.
        tracks: usize,
    },
    /// Track was muted when the session started and is left alone.
    TrackSkipped {
        /// Track index.
        index: usize,
    },
    /// Track isolated; settle delay armed.
    TrackSelected {
        /// Track index.
        index: usize,
    },
    /// Settle delay still running.
    Waiting,
    /// Settle delay elapsed.
    Settled,
    /// Track initialized; output folder exists.
    TrackStarted {
        /// Track index.
        index: usize,
        /// Output base name derived from the track name.
        base_name: String,
    },
    /// One frame was written.
    FrameCaptured {
        /// Track index.
        index: usize,
        /// 0-based frame number within the track.
        frame: u32,
        /// File written.
        path: PathBuf,
        /// Normalized time the frame was sampled at.
        normalized_time: f64,
    },
    /// A failure ended this track early.
    TrackAborted {
        /// Track index.
        index: usize,
        /// Diagnostic for the failure.
        reason: String,
    },
    /// All frames of the track were written.
    TrackFinished {
        /// Track index.
        index: usize,
        /// Frames written.
        frames: u32,
    },
    /// Mute states restored; back in preview.
    SessionFinished,
}

/// Per-track result of a session.
#[derive(Clone, Debug, PartialEq)]
pub enum TrackStatus {
    /// Every frame was written.
    Captured {
        /// Frames written.
        frames: u32,
    },
    /// Track was muted at session start.
    Skipped,
    /// Track stopped early on an error.
    Aborted {
        /// Frames written before the failure.
        frames: u32,
        /// Diagnostic for the failure.
        reason: String,
    },
}

/// One track's entry in a [`SessionReport`].
#[derive(Clone, Debug, PartialEq)]
pub struct TrackReport {
    /// Track index.
    pub index: usize,
    /// Track name at selection time.
    pub name: String,
    /// Outcome.
    pub status: TrackStatus,
}

/// Summary of a completed session, in track order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionReport {
    /// One entry per visited track.
    pub tracks: Vec<TrackReport>,
    /// Output folders reached by more than one track; later tracks overwrote earlier frames.
    pub shared_folders: Vec<String>,
}

impl SessionReport {
    /// Total frames written across all tracks.
    pub fn frames_written(&self) -> u32 {
        self.tracks
            .iter()
            .map(|t| match &t.status {
                TrackStatus::Captured { frames } | TrackStatus::Aborted { frames, .. } => *frames,
                TrackStatus::Skipped => 0,
            })
            .sum()
    }

    /// Whether any track was aborted.
    pub fn has_failures(&self) -> bool {
        self.tracks
            .iter()
            .any(|t| matches!(t.status, TrackStatus::Aborted { .. }))
    }
}

#[derive(Debug)]
struct CaptureSession {
    config: CaptureConfig,
    track_index: usize,
    saved_mute_states: Vec<bool>,
    active_track: Option<usize>,
    frame_index: u32,
    frame_stop_count: u32,
    normalized_time: f64,
    duration: f64,
    delay_deadline: Duration,
    base_name: String,
    used_base_names: HashSet<String>,
    report: SessionReport,
}

impl CaptureSession {
    fn finish_track(&mut self, index: usize, name: String, status: TrackStatus) {
        self.active_track = None;
        self.report.tracks.push(TrackReport {
            index,
            name,
            status,
        });
    }
}

/// Drives per-track isolated captures of a [`Timeline`], one state per tick.
///
/// The sequencer owns the timeline's mute flags and play cursor for the duration of a session;
/// [`CaptureSequencer::timeline_mut`] is unavailable until it returns to
/// [`CaptureState::Preview`].
pub struct CaptureSequencer<T, C, K = SystemClock> {
    timeline: T,
    capturer: C,
    clock: K,
    config: CaptureConfig,
    state: CaptureState,
    start_requested: bool,
    session: Option<CaptureSession>,
    last_report: Option<SessionReport>,
}

impl<T, C, K> CaptureSequencer<T, C, K>
where
    T: Timeline,
    C: Camera + FrameCapturer<T>,
    K: Clock,
{
    /// Build an idle sequencer and start the timeline playing.
    pub fn new(mut timeline: T, capturer: C, clock: K, config: CaptureConfig) -> Self {
        timeline.play();
        Self {
            timeline,
            capturer,
            clock,
            config,
            state: CaptureState::Preview,
            start_requested: false,
            session: None,
            last_report: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Whether no session is running.
    pub fn is_idle(&self) -> bool {
        self.state == CaptureState::Preview
    }

    /// Active configuration.
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Edit the configuration. A running session keeps the values it started with.
    pub fn config_mut(&mut self) -> &mut CaptureConfig {
        &mut self.config
    }

    /// Set the preview scrub position, clamped to `[0, 1]`.
    pub fn set_preview_time(&mut self, t: f64) {
        if t.is_finite() {
            self.config.preview_time = t.clamp(0.0, 1.0);
        }
    }

    /// Arm the one-shot start trigger.
    ///
    /// Returns `false` (and arms nothing) while a session is running.
    pub fn request_start(&mut self) -> bool {
        if !self.is_idle() {
            tracing::debug!(state = ?self.state, "start request ignored: session running");
            return false;
        }
        self.start_requested = true;
        true
    }

    /// Borrow the timeline.
    pub fn timeline(&self) -> &T {
        &self.timeline
    }

    /// Mutably borrow the timeline; `None` while a session owns it.
    pub fn timeline_mut(&mut self) -> Option<&mut T> {
        if self.is_idle() {
            Some(&mut self.timeline)
        } else {
            None
        }
    }

    /// Borrow the capturer.
    pub fn capturer(&self) -> &C {
        &self.capturer
    }

    /// Borrow the clock.
    pub fn clock(&self) -> &K {
        &self.clock
    }

    /// Report of the most recently completed session.
    pub fn last_report(&self) -> Option<&SessionReport> {
        self.last_report.as_ref()
    }

    /// Tear down into `(timeline, capturer, clock)`.
    pub fn into_parts(self) -> (T, C, K) {
        (self.timeline, self.capturer, self.clock)
    }

    /// Advance the state machine by exactly one step.
    ///
    /// Never fails: errors are logged, recorded in the session report and leave the machine in
    /// a well-defined state.
    pub fn step(&mut self) -> StepOutcome {
        match self.state {
            CaptureState::Preview => self.step_preview(),
            CaptureState::TrackSelect => self.step_track_select(),
            CaptureState::Delay => self.step_delay(),
            CaptureState::Start => self.step_start(),
            CaptureState::Capture => self.step_capture(),
        }
    }

    /// Request a start and step until the session completes.
    ///
    /// `after_tick` runs after every step; drivers use it to advance a manual clock. Fails if
    /// the start is rejected or the session needs more than `max_ticks` steps.
    pub fn run_session(
        &mut self,
        max_ticks: u64,
        mut after_tick: impl FnMut(&StepOutcome),
    ) -> CaptureResult<SessionReport> {
        if !self.request_start() {
            return Err(CaptureError::validation("a capture session is already running"));
        }
        for _ in 0..max_ticks {
            let outcome = self.step();
            after_tick(&outcome);
            match outcome {
                StepOutcome::StartRejected { reason } => {
                    return Err(CaptureError::validation(reason));
                }
                StepOutcome::SessionFinished => {
                    return Ok(self.last_report.clone().unwrap_or_default());
                }
                _ => {}
            }
        }
        Err(CaptureError::Other(anyhow::anyhow!(
            "capture session did not finish within {max_ticks} ticks (state {:?})",
            self.state
        )))
    }

    fn step_preview(&mut self) -> StepOutcome {
        // Duration queries are only meaningful while the timeline plays.
        if self.timeline.is_paused() {
            self.timeline.play();
        }
        let duration = self.timeline.active_duration();
        self.capturer.set_zoom(self.config.zoom);
        self.timeline.set_play_cursor(self.config.preview_time * duration);

        if !std::mem::take(&mut self.start_requested) {
            return StepOutcome::Previewed;
        }

        if let Err(e) = self.config.validate() {
            tracing::error!(error = %e, "capture not started");
            return StepOutcome::StartRejected {
                reason: e.to_string(),
            };
        }
        for w in self.config.warnings() {
            tracing::warn!("{w}");
        }

        let count = self.timeline.track_count();
        let saved_mute_states = match (0..count)
            .map(|i| self.timeline.track(i).map(|t| t.muted))
            .collect::<Option<Vec<_>>>()
        {
            Some(v) => v,
            None => {
                let reason = format!("timeline reports {count} tracks but not all are readable");
                tracing::error!("capture not started: {reason}");
                return StepOutcome::StartRejected { reason };
            }
        };

        let config = self.config.clone();
        self.capturer.set_output_size(config.output_size);
        tracing::info!(
            tracks = count,
            frames = config.frame_count,
            include_final = config.include_final_frame,
            width = config.output_size.width,
            height = config.output_size.height,
            "capture session started"
        );

        self.session = Some(CaptureSession {
            frame_stop_count: config.frame_stop_count(),
            config,
            track_index: 0,
            saved_mute_states,
            active_track: None,
            frame_index: 0,
            normalized_time: 0.0,
            duration: 0.0,
            delay_deadline: Duration::ZERO,
            base_name: String::new(),
            used_base_names: HashSet::new(),
            report: SessionReport::default(),
        });
        self.state = CaptureState::TrackSelect;
        StepOutcome::SessionStarted { tracks: count }
    }

    fn step_track_select(&mut self) -> StepOutcome {
        let Some(session) = self.session.as_mut() else {
            return self.lost_session();
        };
        let count = self.timeline.track_count();
        assert_eq!(
            session.saved_mute_states.len(),
            count,
            "mute-state snapshot no longer matches the timeline's track count"
        );

        if session.track_index == count {
            for (i, &muted) in session.saved_mute_states.iter().enumerate() {
                if let Err(e) = self.timeline.set_muted(i, muted) {
                    tracing::error!(track = i, error = %e, "failed to restore mute state");
                }
            }
            self.timeline.rebuild_graph();

            let report = std::mem::take(&mut session.report);
            tracing::info!(
                frames = report.frames_written(),
                failures = report.has_failures(),
                "capture session finished"
            );
            self.last_report = Some(report);
            self.session = None;
            self.state = CaptureState::Preview;
            return StepOutcome::SessionFinished;
        }

        let index = session.track_index;
        session.track_index += 1;
        let name = self
            .timeline
            .track(index)
            .map(|t| t.name)
            .unwrap_or_default();

        if session.saved_mute_states[index] {
            tracing::info!(track = index, name = %name, "skipping muted track");
            session.finish_track(index, name, TrackStatus::Skipped);
            return StepOutcome::TrackSkipped { index };
        }

        if let Err(e) = isolate_track(&mut self.timeline, index) {
            tracing::error!(track = index, error = %e, "failed to isolate track");
            let reason = e.to_string();
            session.finish_track(
                index,
                name,
                TrackStatus::Aborted {
                    frames: 0,
                    reason: reason.clone(),
                },
            );
            return StepOutcome::TrackAborted { index, reason };
        }

        session.active_track = Some(index);
        let settle = session.config.settle_delay();
        session.delay_deadline = self.clock.now().saturating_add(settle);
        self.state = CaptureState::Delay;
        StepOutcome::TrackSelected { index }
    }

    fn step_delay(&mut self) -> StepOutcome {
        let Some(session) = self.session.as_ref() else {
            return self.lost_session();
        };
        if self.clock.now() < session.delay_deadline {
            return StepOutcome::Waiting;
        }
        self.state = CaptureState::Start;
        StepOutcome::Settled
    }

    fn step_start(&mut self) -> StepOutcome {
        let Some(session) = self.session.as_mut() else {
            return self.lost_session();
        };
        let Some(index) = session.active_track else {
            self.state = CaptureState::TrackSelect;
            return StepOutcome::TrackAborted {
                index: session.track_index.saturating_sub(1),
                reason: "no active track to start".to_owned(),
            };
        };
        let Some(track) = self.timeline.track(index) else {
            let reason = format!("track {index} disappeared from the timeline");
            tracing::error!(track = index, "{reason}");
            session.finish_track(
                index,
                String::new(),
                TrackStatus::Aborted {
                    frames: 0,
                    reason: reason.clone(),
                },
            );
            self.state = CaptureState::TrackSelect;
            return StepOutcome::TrackAborted { index, reason };
        };

        session.duration = track.duration;
        session.frame_index = 0;
        session.normalized_time = 0.0;
        self.timeline.set_play_cursor(0.0);
        self.timeline.play();

        session.base_name = output_base_name(&track.name, index);
        if !session.used_base_names.insert(session.base_name.clone()) {
            tracing::warn!(
                track = index,
                folder = %session.base_name,
                "output folder already used by an earlier track; its frames will be overwritten"
            );
            session.report.shared_folders.push(session.base_name.clone());
        }
        let dir = session.config.output_root.join(&session.base_name);
        if let Err(e) = std::fs::create_dir_all(&dir) {
            let e = CaptureError::io(&dir, e);
            tracing::error!(track = index, error = %e, "cannot create output folder");
            let reason = e.to_string();
            session.finish_track(
                index,
                track.name,
                TrackStatus::Aborted {
                    frames: 0,
                    reason: reason.clone(),
                },
            );
            self.state = CaptureState::TrackSelect;
            return StepOutcome::TrackAborted { index, reason };
        }

        tracing::info!(
            track = index,
            name = %track.name,
            duration = track.duration,
            "processing track"
        );
        self.state = CaptureState::Capture;
        StepOutcome::TrackStarted {
            index,
            base_name: session.base_name.clone(),
        }
    }

    fn step_capture(&mut self) -> StepOutcome {
        let Some(session) = self.session.as_mut() else {
            return self.lost_session();
        };
        let Some(index) = session.active_track else {
            self.state = CaptureState::TrackSelect;
            return StepOutcome::TrackAborted {
                index: session.track_index.saturating_sub(1),
                reason: "no active track to capture".to_owned(),
            };
        };
        let name = self
            .timeline
            .track(index)
            .map(|t| t.name)
            .unwrap_or_default();

        if session.frame_index == session.frame_stop_count {
            let frames = session.frame_index;
            session.finish_track(index, name, TrackStatus::Captured { frames });
            self.state = CaptureState::TrackSelect;
            return StepOutcome::TrackFinished { index, frames };
        }

        let frame = session.frame_index;
        let path = frame_path(&session.config.output_root, &session.base_name, frame);
        let sampled_at = session.normalized_time;

        if let Err(e) = self.capturer.capture(&self.timeline, &path) {
            tracing::error!(track = index, frame, error = %e, "frame capture failed");
            let reason = e.to_string();
            session.finish_track(
                index,
                name,
                TrackStatus::Aborted {
                    frames: frame,
                    reason: reason.clone(),
                },
            );
            self.state = CaptureState::TrackSelect;
            return StepOutcome::TrackAborted { index, reason };
        }
        tracing::debug!(
            track = index,
            frame,
            normalized_time = sampled_at,
            path = %path.display(),
            "captured frame"
        );

        session.frame_index += 1;
        // Divides by the requested count, not the stop count: with the final frame included,
        // the last sample lands exactly on 1.0.
        session.normalized_time =
            f64::from(session.frame_index) / f64::from(session.config.frame_count);
        self.timeline.set_play_cursor(session.normalized_time * session.duration);

        StepOutcome::FrameCaptured {
            index,
            frame,
            path,
            normalized_time: sampled_at,
        }
    }

    fn lost_session(&mut self) -> StepOutcome {
        tracing::error!(state = ?self.state, "no capture session; returning to preview");
        self.state = CaptureState::Preview;
        StepOutcome::Previewed
    }
}

/// Mute every track, then unmute `index` and rebuild so the change is live.
fn isolate_track<T: Timeline + ?Sized>(timeline: &mut T, index: usize) -> CaptureResult<()> {
    for i in 0..timeline.track_count() {
        timeline.set_muted(i, true)?;
    }
    timeline.set_muted(index, false)?;
    timeline.rebuild_graph();
    Ok(())
}

/// Folder and file stem for a track's frames.
///
/// Path separators and characters that are invalid in file names become `_`; an empty name
/// falls back to `track<index>`.
pub fn output_base_name(track_name: &str, index: usize) -> String {
    let cleaned: String = track_name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        format!("track{index}")
    } else {
        cleaned
    }
}

/// `<root>/<base>/<base><NNN>.png`, with `NNN` zero padded to three digits.
pub fn frame_path(root: &Path, base_name: &str, frame: u32) -> PathBuf {
    root.join(base_name).join(format!("{base_name}{frame:03}.png"))
}

#[cfg(test)]
#[path = "../../tests/unit/capture/sequencer.rs"]
mod tests;
