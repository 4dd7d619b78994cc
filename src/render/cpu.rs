use std::collections::HashMap;

use crate::{
    foundation::core::{Affine, BezPath, OutputSize, Rgba8},
    foundation::error::{CaptureError, CaptureResult},
    render::device::{RenderDevice, TargetId},
    render::frame::FrameRGBA,
    timeline::scene::ShapeInstance,
};

/// Options for [`CpuDevice`].
#[derive(Debug, Clone, Copy)]
pub struct CpuDeviceOpts {
    /// Size of the on-screen surface the camera draws to when it has no target.
    pub screen: OutputSize,
    /// Initial orthographic half-height.
    pub zoom: f64,
}

impl Default for CpuDeviceOpts {
    fn default() -> Self {
        Self {
            screen: OutputSize::square(64),
            zoom: 1.0,
        }
    }
}

/// CPU raster device powered by `vello_cpu`.
///
/// The camera sits at the world origin looking down -z with +y up; `zoom` is the half-height
/// of the view in world units, so the horizontal extent widens with the aspect ratio.
pub struct CpuDevice {
    screen: vello_cpu::Pixmap,
    targets: HashMap<TargetId, vello_cpu::Pixmap>,
    next_id: u64,
    active: Option<TargetId>,
    camera_target: Option<TargetId>,
    zoom: f64,
}

impl CpuDevice {
    /// Create a device with its screen surface allocated.
    pub fn new(opts: CpuDeviceOpts) -> CaptureResult<Self> {
        let (w, h) = pixmap_dims(opts.screen)?;
        Ok(Self {
            screen: vello_cpu::Pixmap::new(w, h),
            targets: HashMap::new(),
            next_id: 1,
            active: None,
            camera_target: None,
            zoom: opts.zoom,
        })
    }

    /// Number of live offscreen targets.
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Current orthographic half-height.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    fn view_transform(&self, width: u16, height: u16) -> CaptureResult<Affine> {
        if !self.zoom.is_finite() || self.zoom <= 0.0 {
            return Err(CaptureError::render(format!(
                "camera zoom must be finite and > 0 (got {})",
                self.zoom
            )));
        }
        let (w, h) = (f64::from(width), f64::from(height));
        let s = h / (2.0 * self.zoom);
        Ok(Affine::new([s, 0.0, 0.0, -s, w / 2.0, h / 2.0]))
    }
}

fn pixmap_dims(size: OutputSize) -> CaptureResult<(u16, u16)> {
    let conv = |v: u32| u16::try_from(v).ok().filter(|&v| v > 0);
    match (conv(size.width), conv(size.height)) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(CaptureError::render(format!(
            "cannot allocate a {}x{} target (each side must be in 1..={})",
            size.width,
            size.height,
            u16::MAX
        ))),
    }
}

fn draw_shapes(
    pixmap: &mut vello_cpu::Pixmap,
    view: Affine,
    background: Rgba8,
    shapes: &[ShapeInstance],
) {
    let (w, h) = (pixmap.width(), pixmap.height());
    pixmap.data_as_u8_slice_mut().fill(0);

    let mut ctx = vello_cpu::RenderContext::new(w, h);
    if background.a > 0 {
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            background.r,
            background.g,
            background.b,
            background.a,
        ));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(w),
            f64::from(h),
        ));
    }

    for shape in shapes {
        let c = shape.fill;
        ctx.set_transform(affine_to_cpu(view * shape.transform));
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
        let opacity = shape.opacity.clamp(0.0, 1.0) as f32;
        if opacity < 1.0 {
            ctx.push_opacity_layer(opacity);
        }
        ctx.fill_path(&bezpath_to_cpu(&shape.path));
        if opacity < 1.0 {
            ctx.pop_layer();
        }
    }

    ctx.flush();
    ctx.render_to_pixmap(pixmap);
}

impl RenderDevice for CpuDevice {
    fn create_target(&mut self, size: OutputSize) -> CaptureResult<TargetId> {
        let (w, h) = pixmap_dims(size)?;
        let id = TargetId(self.next_id);
        self.next_id += 1;
        self.targets.insert(id, vello_cpu::Pixmap::new(w, h));
        Ok(id)
    }

    fn release_target(&mut self, id: TargetId) {
        self.targets.remove(&id);
    }

    fn active_target(&self) -> Option<TargetId> {
        self.active
    }

    fn set_active_target(&mut self, id: Option<TargetId>) {
        self.active = id;
    }

    fn camera_target(&self) -> Option<TargetId> {
        self.camera_target
    }

    fn set_camera_target(&mut self, id: Option<TargetId>) {
        self.camera_target = id;
    }

    fn set_camera_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    fn render_camera(&mut self, background: Rgba8, shapes: &[ShapeInstance]) -> CaptureResult<()> {
        let (w, h) = match self.camera_target {
            None => (self.screen.width(), self.screen.height()),
            Some(id) => {
                let p = self.targets.get(&id).ok_or_else(|| {
                    CaptureError::render(format!("camera target {id:?} is not allocated"))
                })?;
                (p.width(), p.height())
            }
        };
        let view = self.view_transform(w, h)?;

        let pixmap = match self.camera_target {
            None => &mut self.screen,
            Some(id) => self
                .targets
                .get_mut(&id)
                .ok_or_else(|| CaptureError::render(format!("target {id:?} vanished")))?,
        };
        draw_shapes(pixmap, view, background, shapes);
        Ok(())
    }

    fn read_pixels(&self) -> CaptureResult<FrameRGBA> {
        let pixmap = match self.active {
            None => &self.screen,
            Some(id) => self.targets.get(&id).ok_or_else(|| {
                CaptureError::render(format!("active target {id:?} is not allocated"))
            })?,
        };
        Ok(FrameRGBA {
            width: u32::from(pixmap.width()),
            height: u32::from(pixmap.height()),
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
