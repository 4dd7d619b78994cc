use std::path::Path;

use crate::{
    foundation::core::OutputSize,
    foundation::error::{CaptureError, CaptureResult},
    render::device::{RenderDevice, TargetId},
    timeline::scene::Scene,
};

/// Camera controls the sequencer drives during preview.
pub trait Camera {
    /// Set the orthographic zoom (half-height of the view in world units).
    fn set_zoom(&mut self, zoom: f64);
}

/// Renders exactly one frame of the current scene state to a file.
///
/// Implementations keep no state across calls except the configured output size.
pub trait FrameCapturer<S: ?Sized> {
    /// Configure the size of subsequent captures.
    fn set_output_size(&mut self, size: OutputSize);

    /// Render `scene` offscreen and write it to `path` as PNG.
    fn capture(&mut self, scene: &S, path: &Path) -> CaptureResult<()>;
}

/// Scoped offscreen render target.
///
/// Acquiring allocates a target and points both the camera and the global active target at
/// it. Dropping restores whatever both pointed at before and releases the target, on every
/// exit path.
pub struct OffscreenTarget<'a, D: RenderDevice + ?Sized> {
    device: &'a mut D,
    id: TargetId,
    prev_camera: Option<TargetId>,
    prev_active: Option<TargetId>,
}

impl<'a, D: RenderDevice + ?Sized> OffscreenTarget<'a, D> {
    /// Allocate a `size` target and redirect rendering and read-back to it.
    pub fn acquire(device: &'a mut D, size: OutputSize) -> CaptureResult<Self> {
        let id = device.create_target(size)?;
        let prev_camera = device.camera_target();
        let prev_active = device.active_target();
        device.set_camera_target(Some(id));
        device.set_active_target(Some(id));
        Ok(Self {
            device,
            id,
            prev_camera,
            prev_active,
        })
    }

    /// The target being rendered to.
    pub fn id(&self) -> TargetId {
        self.id
    }

    /// The device, with camera and active target redirected.
    pub fn device(&mut self) -> &mut D {
        self.device
    }
}

impl<D: RenderDevice + ?Sized> Drop for OffscreenTarget<'_, D> {
    fn drop(&mut self) {
        self.device.set_camera_target(self.prev_camera);
        self.device.set_active_target(self.prev_active);
        self.device.release_target(self.id);
    }
}

/// [`FrameCapturer`] that renders through a [`RenderDevice`] camera into a temporary target.
pub struct OffscreenCapturer<D> {
    device: D,
    size: OutputSize,
}

impl<D: RenderDevice> OffscreenCapturer<D> {
    /// Wrap `device`; captures default to 256×256 until configured.
    pub fn new(device: D) -> Self {
        Self {
            device,
            size: OutputSize::default(),
        }
    }

    /// Currently configured capture size.
    pub fn output_size(&self) -> OutputSize {
        self.size
    }

    /// Borrow the device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Mutably borrow the device.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Unwrap the device.
    pub fn into_device(self) -> D {
        self.device
    }
}

impl<D: RenderDevice> Camera for OffscreenCapturer<D> {
    fn set_zoom(&mut self, zoom: f64) {
        self.device.set_camera_zoom(zoom);
    }
}

impl<D: RenderDevice, S: Scene + ?Sized> FrameCapturer<S> for OffscreenCapturer<D> {
    fn set_output_size(&mut self, size: OutputSize) {
        self.size = size;
    }

    #[tracing::instrument(skip(self, scene), fields(path = %path.display()))]
    fn capture(&mut self, scene: &S, path: &Path) -> CaptureResult<()> {
        let shapes = scene.visible_shapes()?;

        let frame = {
            let mut target = OffscreenTarget::acquire(&mut self.device, self.size)?;
            target.device().render_camera(scene.background(), &shapes)?;
            target.device().read_pixels()?
        };

        let bytes = frame.encode_png()?;
        std::fs::write(path, &bytes).map_err(|e| CaptureError::io(path, e))?;
        tracing::trace!(bytes = bytes.len(), "wrote frame");
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/capturer.rs"]
mod tests;
