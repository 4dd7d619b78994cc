use crate::{
    foundation::core::{OutputSize, Rgba8},
    foundation::error::CaptureResult,
    render::frame::FrameRGBA,
    timeline::scene::ShapeInstance,
};

/// Handle to an offscreen render target owned by a [`RenderDevice`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u64);

/// A renderer with one orthographic camera and a global active target.
///
/// Mirrors the engine model the capturer relies on:
/// - the camera draws into its own target, or into the screen when it has none;
/// - pixel read-back reads the global active target, or the screen when none is active.
pub trait RenderDevice {
    /// Allocate an offscreen target. Degenerate sizes fail.
    fn create_target(&mut self, size: OutputSize) -> CaptureResult<TargetId>;

    /// Free an offscreen target. Unknown ids are ignored.
    fn release_target(&mut self, id: TargetId);

    /// The global active target.
    fn active_target(&self) -> Option<TargetId>;

    /// Replace the global active target.
    fn set_active_target(&mut self, id: Option<TargetId>);

    /// Where the camera currently renders.
    fn camera_target(&self) -> Option<TargetId>;

    /// Redirect the camera's output.
    fn set_camera_target(&mut self, id: Option<TargetId>);

    /// Orthographic half-height of the camera view, in world units.
    fn set_camera_zoom(&mut self, zoom: f64);

    /// Synchronously render `shapes` through the camera into its current target.
    fn render_camera(&mut self, background: Rgba8, shapes: &[ShapeInstance]) -> CaptureResult<()>;

    /// Read back the pixels of the active target.
    fn read_pixels(&self) -> CaptureResult<FrameRGBA>;
}
