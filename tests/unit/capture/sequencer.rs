use super::*;
use crate::foundation::clock::ManualClock;
use crate::foundation::core::OutputSize;
use crate::timeline::TrackInfo;

/// Timeline that records how many tracks are unmuted after every mute change.
#[derive(Debug, Default)]
struct FakeTimeline {
    tracks: Vec<(String, bool, f64)>,
    cursor: f64,
    paused: bool,
    rebuilds: usize,
    unmuted_history: Vec<usize>,
}

impl FakeTimeline {
    fn new(tracks: &[(&str, bool, f64)]) -> Self {
        Self {
            tracks: tracks
                .iter()
                .map(|(n, m, d)| ((*n).to_owned(), *m, *d))
                .collect(),
            paused: true,
            ..Self::default()
        }
    }

    fn mutes(&self) -> Vec<bool> {
        self.tracks.iter().map(|t| t.1).collect()
    }
}

impl Timeline for FakeTimeline {
    fn track_count(&self) -> usize {
        self.tracks.len()
    }

    fn track(&self, index: usize) -> Option<TrackInfo> {
        self.tracks.get(index).map(|(n, m, d)| TrackInfo {
            name: n.clone(),
            muted: *m,
            duration: *d,
        })
    }

    fn set_muted(&mut self, index: usize, muted: bool) -> CaptureResult<()> {
        let t = self
            .tracks
            .get_mut(index)
            .ok_or_else(|| CaptureError::timeline("bad index"))?;
        t.1 = muted;
        let unmuted = self.tracks.iter().filter(|t| !t.1).count();
        self.unmuted_history.push(unmuted);
        Ok(())
    }

    fn active_duration(&self) -> f64 {
        self.tracks
            .iter()
            .filter(|t| !t.1)
            .map(|t| t.2)
            .fold(0.0, f64::max)
    }

    fn set_play_cursor(&mut self, time: f64) {
        self.cursor = time;
    }

    fn play_cursor(&self) -> f64 {
        self.cursor
    }

    fn play(&mut self) {
        self.paused = false;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn rebuild_graph(&mut self) {
        self.rebuilds += 1;
    }
}

/// Records every capture instead of rendering; optionally fails the n-th call.
#[derive(Debug, Default)]
struct RecordingCapturer {
    zoom: Option<f64>,
    size: Option<OutputSize>,
    shots: Vec<(PathBuf, f64, Vec<bool>)>,
    fail_on_call: Option<usize>,
    calls: usize,
}

impl Camera for RecordingCapturer {
    fn set_zoom(&mut self, zoom: f64) {
        self.zoom = Some(zoom);
    }
}

impl FrameCapturer<FakeTimeline> for RecordingCapturer {
    fn set_output_size(&mut self, size: OutputSize) {
        self.size = Some(size);
    }

    fn capture(&mut self, scene: &FakeTimeline, path: &Path) -> CaptureResult<()> {
        let call = self.calls;
        self.calls += 1;
        if self.fail_on_call == Some(call) {
            return Err(CaptureError::io(path, std::io::Error::other("injected")));
        }
        self.shots.push((path.to_path_buf(), scene.play_cursor(), scene.mutes()));
        Ok(())
    }
}

type Seq = CaptureSequencer<FakeTimeline, RecordingCapturer, ManualClock>;

fn config(root: &str, frames: u32, include_final: bool) -> CaptureConfig {
    CaptureConfig {
        frame_count: frames,
        include_final_frame: include_final,
        output_root: PathBuf::from("target").join("unit_sequencer").join(root),
        ..CaptureConfig::default()
    }
}

fn sequencer(tracks: &[(&str, bool, f64)], cfg: CaptureConfig) -> (Seq, ManualClock) {
    let clock = ManualClock::new();
    let seq = CaptureSequencer::new(
        FakeTimeline::new(tracks),
        RecordingCapturer::default(),
        clock.clone(),
        cfg,
    );
    (seq, clock)
}

/// Step until back in preview, advancing the clock 1/60 s per tick.
fn run(seq: &mut Seq, clock: &ManualClock) -> Vec<StepOutcome> {
    assert!(seq.request_start());
    let mut out = Vec::new();
    for _ in 0..10_000 {
        let o = seq.step();
        clock.advance(Duration::from_micros(16_667));
        let done = matches!(
            o,
            StepOutcome::SessionFinished | StepOutcome::StartRejected { .. }
        );
        out.push(o);
        if done {
            return out;
        }
    }
    panic!("session did not finish");
}

#[test]
fn construction_starts_playback() {
    let (seq, _) = sequencer(&[("a", false, 1.0)], config("construct", 1, false));
    assert!(!seq.timeline().is_paused());
    assert_eq!(seq.state(), CaptureState::Preview);
}

#[test]
fn preview_resumes_playback_and_scrubs() {
    let (mut seq, _) = sequencer(
        &[("a", false, 2.0), ("b", false, 4.0)],
        config("preview", 1, false),
    );
    seq.timeline_mut().unwrap().paused = true;
    seq.set_preview_time(0.5);
    seq.config_mut().zoom = 2.5;

    assert_eq!(seq.step(), StepOutcome::Previewed);
    assert!(!seq.timeline().is_paused());
    assert_eq!(seq.timeline().play_cursor(), 2.0);
    assert_eq!(seq.capturer().zoom, Some(2.5));
}

#[test]
fn preview_time_is_clamped() {
    let (mut seq, _) = sequencer(&[("a", false, 1.0)], config("clamp", 1, false));
    seq.set_preview_time(3.0);
    assert_eq!(seq.config().preview_time, 1.0);
    seq.set_preview_time(-1.0);
    assert_eq!(seq.config().preview_time, 0.0);
}

#[test]
fn zero_frames_rejects_start_without_side_effects() {
    let (mut seq, _) = sequencer(
        &[("a", false, 1.0), ("b", true, 1.0)],
        config("zero", 0, false),
    );
    assert!(seq.request_start());
    let outcome = seq.step();
    assert!(matches!(outcome, StepOutcome::StartRejected { .. }));
    assert_eq!(seq.state(), CaptureState::Preview);
    assert_eq!(seq.timeline().mutes(), vec![false, true]);
    assert_eq!(seq.timeline().rebuilds, 0);
    assert!(seq.capturer().size.is_none());

    // The trigger was consumed: the next tick is a plain preview.
    assert_eq!(seq.step(), StepOutcome::Previewed);
}

#[test]
fn oversized_frame_count_rejects_start_without_panicking() {
    let (mut seq, _) = sequencer(&[("a", false, 1.0)], config("oversized", u32::MAX, true));
    assert!(seq.request_start());
    let outcome = seq.step();
    assert!(matches!(outcome, StepOutcome::StartRejected { .. }));
    assert_eq!(seq.state(), CaptureState::Preview);
    assert_eq!(seq.timeline().mutes(), vec![false]);
    assert!(seq.capturer().size.is_none());
}

#[test]
fn start_trigger_is_one_shot_and_ignored_mid_session() {
    let (mut seq, _) = sequencer(&[("a", false, 1.0)], config("one_shot", 1, false));
    assert!(seq.request_start());
    assert!(matches!(seq.step(), StepOutcome::SessionStarted { tracks: 1 }));
    assert!(!seq.request_start());
    assert!(seq.timeline_mut().is_none());
}

#[test]
fn start_propagates_output_size() {
    let mut cfg = config("size", 1, false);
    cfg.output_size = OutputSize {
        width: 96,
        height: 48,
    };
    let (mut seq, _) = sequencer(&[("a", false, 1.0)], cfg);
    seq.request_start();
    assert!(matches!(seq.step(), StepOutcome::SessionStarted { .. }));
    assert_eq!(
        seq.capturer().size,
        Some(OutputSize {
            width: 96,
            height: 48
        })
    );
}

#[test]
fn delay_waits_for_the_clock() {
    let (mut seq, clock) = sequencer(&[("a", false, 1.0)], config("delay", 1, false));
    seq.request_start();
    seq.step();
    assert_eq!(seq.step(), StepOutcome::TrackSelected { index: 0 });
    assert_eq!(seq.state(), CaptureState::Delay);

    for _ in 0..5 {
        assert_eq!(seq.step(), StepOutcome::Waiting);
    }
    clock.advance(Duration::from_millis(249));
    assert_eq!(seq.step(), StepOutcome::Waiting);
    clock.advance(Duration::from_millis(1));
    assert_eq!(seq.step(), StepOutcome::Settled);
    assert_eq!(seq.state(), CaptureState::Start);
}

#[test]
fn one_decision_per_tick_in_track_select() {
    let (mut seq, _) = sequencer(
        &[("a", true, 1.0), ("b", true, 1.0), ("c", false, 1.0)],
        config("one_decision", 1, false),
    );
    seq.request_start();
    seq.step();
    assert_eq!(seq.step(), StepOutcome::TrackSkipped { index: 0 });
    assert_eq!(seq.state(), CaptureState::TrackSelect);
    assert_eq!(seq.step(), StepOutcome::TrackSkipped { index: 1 });
    assert_eq!(seq.step(), StepOutcome::TrackSelected { index: 2 });
}

#[test]
fn frame_count_and_names_per_track() {
    let (mut seq, clock) = sequencer(&[("walk", false, 2.0)], config("names", 3, false));
    run(&mut seq, &clock);

    let shots = &seq.capturer().shots;
    let names: Vec<_> = shots
        .iter()
        .map(|s| s.0.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["walk000.png", "walk001.png", "walk002.png"]);
    assert!(shots.iter().all(|s| s.0.parent().unwrap().ends_with("walk")));

    let cursors: Vec<f64> = shots.iter().map(|s| s.1).collect();
    assert_eq!(cursors, [0.0, 2.0 / 3.0, 4.0 / 3.0]);
}

#[test]
fn final_frame_lands_on_normalized_one() {
    let (mut seq, clock) = sequencer(&[("spin", false, 3.0)], config("final", 4, true));
    let outcomes = run(&mut seq, &clock);

    let times: Vec<f64> = outcomes
        .iter()
        .filter_map(|o| match o {
            StepOutcome::FrameCaptured {
                normalized_time, ..
            } => Some(*normalized_time),
            _ => None,
        })
        .collect();
    assert_eq!(times, [0.0, 0.25, 0.5, 0.75, 1.0]);
    assert_eq!(seq.capturer().shots.last().unwrap().1, 3.0);
}

#[test]
fn exactly_one_capture_per_capture_tick() {
    let (mut seq, clock) = sequencer(&[("a", false, 1.0)], config("per_tick", 2, false));
    seq.request_start();
    let mut before = 0;
    for _ in 0..200 {
        let state = seq.state();
        let o = seq.step();
        clock.advance(Duration::from_millis(20));
        let after = seq.capturer().calls;
        if state == CaptureState::Capture && !matches!(o, StepOutcome::TrackFinished { .. }) {
            assert_eq!(after, before + 1);
        } else {
            assert_eq!(after, before);
        }
        before = after;
        if o == StepOutcome::SessionFinished {
            return;
        }
    }
    panic!("session did not finish");
}

#[test]
fn isolation_keeps_at_most_one_track_unmuted() {
    let (mut seq, clock) = sequencer(
        &[("a", false, 1.0), ("b", false, 1.0), ("c", true, 1.0)],
        config("isolation", 1, false),
    );
    run(&mut seq, &clock);

    let shots = &seq.capturer().shots;
    assert_eq!(shots[0].2, vec![false, true, true]);
    assert_eq!(shots[1].2, vec![true, false, true]);

    // The last three changes are the end-of-session restore, which unmutes two tracks.
    let history = &seq.timeline().unmuted_history;
    let (isolating, restoring) = history.split_at(history.len() - 3);
    assert!(isolating.iter().all(|&n| n <= 1), "{isolating:?}");
    assert_eq!(restoring.last(), Some(&2));
    assert_eq!(seq.timeline().mutes(), vec![false, false, true]);
}

#[test]
fn three_track_scenario_skips_pre_muted() {
    let (mut seq, clock) = sequencer(
        &[("t0", false, 1.0), ("t1", true, 1.0), ("t2", false, 2.0)],
        config("scenario", 2, true),
    );
    run(&mut seq, &clock);

    let files: Vec<_> = seq
        .capturer()
        .shots
        .iter()
        .map(|s| s.0.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        files,
        [
            "t0000.png",
            "t0001.png",
            "t0002.png",
            "t2000.png",
            "t2001.png",
            "t2002.png"
        ]
    );
    assert!(
        seq.capturer().shots.iter().all(|s| s.2[1]),
        "pre-muted track must never be unmuted"
    );
    assert_eq!(seq.timeline().mutes(), vec![false, true, false]);

    let report = seq.last_report().unwrap();
    assert_eq!(report.tracks[1].status, TrackStatus::Skipped);
    assert_eq!(report.frames_written(), 6);
}

#[test]
fn capture_failure_aborts_only_that_track() {
    let (mut seq, clock) = sequencer(
        &[("a", false, 1.0), ("b", false, 1.0)],
        config("failure", 3, false),
    );
    let mut cap = RecordingCapturer {
        fail_on_call: Some(1),
        ..RecordingCapturer::default()
    };
    std::mem::swap(&mut seq.capturer, &mut cap);

    let outcomes = run(&mut seq, &clock);
    assert!(
        outcomes
            .iter()
            .any(|o| matches!(o, StepOutcome::TrackAborted { index: 0, .. }))
    );

    let report = seq.last_report().unwrap();
    assert!(matches!(
        report.tracks[0].status,
        TrackStatus::Aborted { frames: 1, .. }
    ));
    assert_eq!(report.tracks[1].status, TrackStatus::Captured { frames: 3 });
    assert!(report.has_failures());
    assert_eq!(seq.timeline().mutes(), vec![false, false]);
    assert_eq!(seq.state(), CaptureState::Preview);
}

#[test]
fn config_edits_mid_session_apply_next_time() {
    let (mut seq, clock) = sequencer(&[("a", false, 1.0)], config("mid_edit", 2, false));
    seq.request_start();
    seq.step();
    seq.config_mut().frame_count = 5;
    for _ in 0..100 {
        let o = seq.step();
        clock.advance(Duration::from_millis(50));
        if o == StepOutcome::SessionFinished {
            break;
        }
    }
    assert_eq!(seq.capturer().shots.len(), 2);
}

#[test]
fn empty_timeline_finishes_immediately() {
    let (mut seq, clock) = sequencer(&[], config("empty", 2, false));
    let outcomes = run(&mut seq, &clock);
    assert_eq!(
        outcomes,
        [
            StepOutcome::SessionStarted { tracks: 0 },
            StepOutcome::SessionFinished
        ]
    );
}

#[test]
#[should_panic(expected = "mute-state snapshot")]
fn track_count_change_mid_session_panics() {
    let (mut seq, _) = sequencer(&[("a", false, 1.0)], config("count_change", 1, false));
    seq.request_start();
    seq.step();
    seq.timeline.tracks.push(("late".to_owned(), false, 1.0));
    seq.step();
}

#[test]
fn run_session_reports_rejection() {
    let (mut seq, clock) = sequencer(&[("a", false, 1.0)], config("run_reject", 0, false));
    let err = seq
        .run_session(10, |_| clock.advance(Duration::from_millis(20)))
        .unwrap_err();
    assert!(matches!(err, CaptureError::Validation(_)));
}

#[test]
fn run_session_gives_up_after_max_ticks() {
    let (mut seq, _) = sequencer(&[("a", false, 1.0)], config("run_limit", 1, false));
    // Clock never advances, so the delay never elapses.
    assert!(seq.run_session(50, |_| {}).is_err());
    assert_eq!(seq.state(), CaptureState::Delay);
}

#[test]
fn base_names_are_filesystem_safe() {
    assert_eq!(output_base_name("walk", 0), "walk");
    assert_eq!(output_base_name("run/left", 1), "run_left");
    assert_eq!(output_base_name("a:b*c", 2), "a_b_c");
    assert_eq!(output_base_name("   ", 3), "track3");
    assert_eq!(output_base_name("..", 4), "track4");
}

#[test]
fn frame_paths_are_zero_padded() {
    let p = frame_path(Path::new("Output"), "idle", 7);
    assert_eq!(p, Path::new("Output").join("idle").join("idle007.png"));
    let p = frame_path(Path::new("Output"), "idle", 1234);
    assert!(p.ends_with("idle1234.png"));
}

#[test]
fn mute_states_restored_for_every_initial_configuration() {
    for bits in 0u8..8 {
        let initial: Vec<bool> = (0..3).map(|i| bits & (1 << i) != 0).collect();
        let tracks: Vec<(&str, bool, f64)> = ["a", "b", "c"]
            .iter()
            .zip(&initial)
            .map(|(n, &m)| (*n, m, 1.0))
            .collect();
        let (mut seq, clock) = sequencer(&tracks, config("all_mutes", 2, true));
        run(&mut seq, &clock);

        assert_eq!(seq.timeline().mutes(), initial, "initial {initial:?}");
        let unmuted_initially = initial.iter().filter(|&&m| !m).count();
        assert_eq!(seq.capturer().shots.len(), unmuted_initially * 3);
        for (path, _, mutes) in &seq.capturer().shots {
            for (i, &was_muted) in initial.iter().enumerate() {
                assert!(
                    !was_muted || mutes[i],
                    "track {i} unmuted while capturing {path:?} (initial {initial:?})"
                );
            }
        }
        let report = seq.last_report().unwrap();
        let skipped = report
            .tracks
            .iter()
            .filter(|t| t.status == TrackStatus::Skipped)
            .count();
        assert_eq!(skipped, 3 - unmuted_initially);
    }
}

#[test]
fn colliding_output_folders_are_reported() {
    let (mut seq, clock) = sequencer(
        &[("run/left", false, 1.0), ("run_left", false, 1.0), ("idle", false, 1.0)],
        config("collide", 1, false),
    );
    run(&mut seq, &clock);

    let report = seq.last_report().unwrap();
    assert_eq!(report.shared_folders, ["run_left"]);
    assert_eq!(report.frames_written(), 3);
    assert!(!report.has_failures());
}
