//! spritecap drives deterministic, frame-accurate offscreen captures of an animation timeline.
//!
//! A timeline is a flat list of mutually exclusive tracks. [`CaptureSequencer`] visits each
//! unmuted track in isolation, steps it through evenly spaced normalized times and writes one
//! PNG per step to `<output_root>/<track>/<track><NNN>.png`. Mute states are restored once the
//! last track is done.
//!
//! # Tick model
//!
//! The sequencer never blocks. Each call to [`CaptureSequencer::step`] performs exactly one
//! state-machine step, so it can be driven by any render loop, a test harness, or the bundled
//! `spritecap` CLI:
//!
//! 1. **Preview**: keep the timeline playing, scrub to the preview time, wait for a start request
//! 2. **TrackSelect**: skip tracks that were muted at session start, isolate the next one
//! 3. **Delay**: wait out the settle delay on the [`Clock`]
//! 4. **Start**: rewind the track and create its output folder
//! 5. **Capture**: one [`FrameCapturer::capture`] per tick
//!
//! # Collaborators
//!
//! The engine is reached only through traits: [`Timeline`], [`Scene`], [`Camera`],
//! [`FrameCapturer`] and [`RenderDevice`]. The crate ships [`Director`] (JSON shape timelines),
//! [`CpuDevice`] (a `vello_cpu` rasterizer) and [`OffscreenCapturer`] as ready-made
//! implementations.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod capture;
mod foundation;
mod render;
/// Timeline collaborators and the bundled shape timeline.
pub mod timeline;

pub use animation::anim::{Anim, Keyframe, Keyframes, Lerp};
pub use animation::ease::Ease;
pub use capture::capturer::{Camera, FrameCapturer, OffscreenCapturer, OffscreenTarget};
pub use capture::config::{CaptureConfig, MAX_FRAME_COUNT, MAX_SETTLE_DELAY_MS};
pub use capture::sequencer::{
    CaptureSequencer, CaptureState, SessionReport, StepOutcome, TrackReport, TrackStatus,
    frame_path, output_base_name,
};
pub use foundation::clock::{Clock, ManualClock, SystemClock};
pub use foundation::core::{Affine, BezPath, OutputSize, Point, Rect, Rgba8, Vec2};
pub use foundation::error::{CaptureError, CaptureResult};
pub use render::cpu::{CpuDevice, CpuDeviceOpts};
pub use render::device::{RenderDevice, TargetId};
pub use render::frame::FrameRGBA;
pub use timeline::director::{Director, PlayState};
pub use timeline::model::{ClipDef, SceneDef, ShapeDef, TrackDef};
pub use timeline::scene::{Scene, ShapeInstance};
pub use timeline::{Timeline, TrackInfo};
