use std::str::FromStr;

use crate::foundation::error::{CaptureError, CaptureResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Output image dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OutputSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl OutputSize {
    /// Square output of `side × side` pixels.
    pub fn square(side: u32) -> Self {
        Self {
            width: side,
            height: side,
        }
    }

    /// Return `true` when width and height match.
    pub fn is_square(self) -> bool {
        self.width == self.height
    }

    /// Check that the size can back a render target.
    pub fn validate(self) -> CaptureResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CaptureError::validation(format!(
                "output size must be non-zero (got {}x{})",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Default for OutputSize {
    fn default() -> Self {
        Self::square(256)
    }
}

impl FromStr for OutputSize {
    type Err = CaptureError;

    /// Parse `"256"` (square) or `"320x240"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|e| CaptureError::validation(format!("invalid size '{s}': {e}")))
        };
        match s.split_once(['x', 'X']) {
            Some((w, h)) => Ok(Self {
                width: parse(w)?,
                height: parse(h)?,
            }),
            None => Ok(Self::square(parse(s)?)),
        }
    }
}

/// Straight-alpha RGBA8 color, serialized as `[r, g, b, a]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[u8; 4]", into = "[u8; 4]")]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Construct from channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully transparent black.
    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Opaque white.
    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }
}

impl From<[u8; 4]> for Rgba8 {
    fn from(v: [u8; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Rgba8> for [u8; 4] {
    fn from(c: Rgba8) -> Self {
        [c.r, c.g, c.b, c.a]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
