use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{
    foundation::core::OutputSize,
    foundation::error::{CaptureError, CaptureResult},
};

/// User-facing capture parameters.
///
/// Read at session start; edits made while a session runs apply to the next one.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Evenly spaced frames per track. Must be at least 1.
    pub frame_count: u32,
    /// Also capture normalized time 1.0, for `frame_count + 1` files per track.
    pub include_final_frame: bool,
    /// Pixel size of each capture. Non-square sizes are allowed but untested.
    pub output_size: OutputSize,
    /// Orthographic camera zoom (half-height of the view in world units).
    pub zoom: f64,
    /// Preview scrub position in `[0, 1]` of the active duration.
    pub preview_time: f64,
    /// Root folder that receives one sub-folder per captured track.
    pub output_root: PathBuf,
    /// Wait after isolating a track before sampling it, in milliseconds.
    pub settle_delay_ms: u64,
}

/// Largest accepted `frame_count`; keeps every frame number within the three-digit file suffix.
pub const MAX_FRAME_COUNT: u32 = 999;

/// Largest accepted `settle_delay_ms` (one minute).
pub const MAX_SETTLE_DELAY_MS: u64 = 60_000;

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            frame_count: 4,
            include_final_frame: false,
            output_size: OutputSize::default(),
            zoom: 1.0,
            preview_time: 0.0,
            output_root: PathBuf::from("Output"),
            settle_delay_ms: 250,
        }
    }
}

impl CaptureConfig {
    /// Load a (possibly partial) JSON config; missing fields take defaults.
    pub fn from_json_file(path: &Path) -> CaptureResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CaptureError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| {
            CaptureError::validation(format!("invalid capture config '{}': {e}", path.display()))
        })
    }

    /// Files written per processed track.
    pub fn frame_stop_count(&self) -> u32 {
        self.frame_count.saturating_add(u32::from(self.include_final_frame))
    }

    /// Settle delay as a [`Duration`].
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Hard checks that must pass before a session may start.
    pub fn validate(&self) -> CaptureResult<()> {
        if !(1..=MAX_FRAME_COUNT).contains(&self.frame_count) {
            return Err(CaptureError::validation(format!(
                "frame_count must be in 1..={MAX_FRAME_COUNT} (got {})",
                self.frame_count
            )));
        }
        self.output_size.validate()?;
        if self.settle_delay_ms > MAX_SETTLE_DELAY_MS {
            return Err(CaptureError::validation(format!(
                "settle_delay_ms must be <= {MAX_SETTLE_DELAY_MS} (got {})",
                self.settle_delay_ms
            )));
        }
        if !self.zoom.is_finite() || self.zoom <= 0.0 {
            return Err(CaptureError::validation(format!(
                "zoom must be finite and > 0 (got {})",
                self.zoom
            )));
        }
        Ok(())
    }

    /// Soft checks: problems worth a warning that do not block a session.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if !self.output_size.is_square() {
            out.push(format!(
                "output image is not square ({}x{}); this is not fully supported",
                self.output_size.width, self.output_size.height
            ));
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/config.rs"]
mod tests;
