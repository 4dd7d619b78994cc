use std::sync::Arc;

use crate::foundation::{
    core::{Affine, BezPath, Rgba8},
    error::CaptureResult,
};

/// One filled shape in world space, ready to rasterize.
#[derive(Clone, Debug)]
pub struct ShapeInstance {
    /// Fill geometry in shape-local units.
    pub path: Arc<BezPath>,
    /// Shape-local to world transform.
    pub transform: Affine,
    /// Straight-alpha fill color.
    pub fill: Rgba8,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
}

/// Anything a camera can draw: the posed scene at the current play cursor.
pub trait Scene {
    /// Clear color behind all shapes.
    fn background(&self) -> Rgba8;

    /// Shapes visible at the current cursor, back to front.
    fn visible_shapes(&self) -> CaptureResult<Vec<ShapeInstance>>;
}
