use crate::{
    animation::anim::Anim,
    foundation::core::{BezPath, Rect, Rgba8, Vec2},
    foundation::error::{CaptureError, CaptureResult},
};
use kurbo::Shape;

/// Boundary scene description: a flat list of tracks of keyframed 2D shapes.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SceneDef {
    /// Color the camera clears to before drawing.
    #[serde(default = "Rgba8::transparent")]
    pub background: Rgba8,
    /// Top-level tracks, in capture order.
    pub tracks: Vec<TrackDef>,
}

/// One timeline track.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TrackDef {
    /// Track name; also names the capture output folder.
    pub name: String,
    /// Initial mute flag.
    #[serde(default)]
    pub muted: bool,
    /// Clips on this track. Overlap is allowed; later clips draw on top.
    #[serde(default)]
    pub clips: Vec<ClipDef>,
}

impl TrackDef {
    /// Time extent of the track's content: the end of its last clip.
    pub fn duration(&self) -> f64 {
        self.clips.iter().map(|c| c.end).fold(0.0, f64::max)
    }
}

/// A shape animated over `[start, end]` seconds of timeline time.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ClipDef {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Geometry, centered on the clip origin.
    pub shape: ShapeDef,
    /// Fill color.
    #[serde(default = "Rgba8::white")]
    pub fill: Rgba8,
    /// World-space position of the clip origin.
    #[serde(default = "default_position")]
    pub position: Anim<Vec2>,
    /// Counter-clockwise rotation in degrees.
    #[serde(default = "default_rotation")]
    pub rotation_deg: Anim<f64>,
    /// Non-uniform scale.
    #[serde(default = "default_scale")]
    pub scale: Anim<Vec2>,
    /// Opacity, clamped to `[0, 1]` when sampled.
    #[serde(default = "default_opacity")]
    pub opacity: Anim<f64>,
}

fn default_position() -> Anim<Vec2> {
    Anim::Constant(Vec2::ZERO)
}

fn default_rotation() -> Anim<f64> {
    Anim::Constant(0.0)
}

fn default_scale() -> Anim<Vec2> {
    Anim::Constant(Vec2::new(1.0, 1.0))
}

fn default_opacity() -> Anim<f64> {
    Anim::Constant(1.0)
}

/// Clip geometry in world units.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub enum ShapeDef {
    /// Axis-aligned rectangle centered on the origin.
    Rect {
        /// Width in world units.
        width: f64,
        /// Height in world units.
        height: f64,
    },
    /// Ellipse centered on the origin.
    Ellipse {
        /// Horizontal radius.
        rx: f64,
        /// Vertical radius.
        ry: f64,
    },
    /// SVG path data in world units.
    Path {
        /// SVG `d` attribute.
        d: String,
    },
}

impl ShapeDef {
    /// Build the fill path for this shape.
    pub fn to_path(&self) -> CaptureResult<BezPath> {
        match self {
            Self::Rect { width, height } => {
                let (hw, hh) = (width / 2.0, height / 2.0);
                Ok(Rect::new(-hw, -hh, hw, hh).to_path(0.1))
            }
            Self::Ellipse { rx, ry } => {
                Ok(kurbo::Ellipse::new((0.0, 0.0), (*rx, *ry), 0.0).to_path(0.01))
            }
            Self::Path { d } => BezPath::from_svg(d.trim())
                .map_err(|e| CaptureError::timeline(format!("invalid svg path data: {e}"))),
        }
    }
}

impl SceneDef {
    /// Parse a scene from JSON text and validate it.
    pub fn from_json_str(s: &str) -> CaptureResult<Self> {
        let scene: Self = serde_json::from_str(s)
            .map_err(|e| CaptureError::timeline(format!("invalid scene json: {e}")))?;
        scene.validate()?;
        Ok(scene)
    }

    /// Check clip ranges, shapes and animation keys.
    pub fn validate(&self) -> CaptureResult<()> {
        for track in &self.tracks {
            for (i, clip) in track.clips.iter().enumerate() {
                let ctx = |msg: &str| {
                    CaptureError::timeline(format!("track '{}' clip {i}: {msg}", track.name))
                };
                if !clip.start.is_finite() || !clip.end.is_finite() {
                    return Err(ctx("start/end must be finite"));
                }
                if clip.start < 0.0 || clip.start > clip.end {
                    return Err(ctx("range must satisfy 0 <= start <= end"));
                }
                match &clip.shape {
                    ShapeDef::Rect { width, height } if *width <= 0.0 || *height <= 0.0 => {
                        return Err(ctx("rect size must be > 0"));
                    }
                    ShapeDef::Ellipse { rx, ry } if *rx <= 0.0 || *ry <= 0.0 => {
                        return Err(ctx("ellipse radii must be > 0"));
                    }
                    _ => {}
                }
                let check = |r: CaptureResult<()>| r.map_err(|e| ctx(&e.to_string()));
                check(clip.shape.to_path().map(|_| ()))?;
                check(clip.position.validate())?;
                check(clip.rotation_deg.validate())?;
                check(clip.scale.validate())?;
                check(clip.opacity.validate())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/model.rs"]
mod tests;
