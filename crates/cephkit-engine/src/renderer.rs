//! Annotation renderer.
//!
//! Draws the scene into a tiny-skia pixmap with a full clear and redraw:
//! - The raster, letterbox-fitted with the active user view
//! - Visible reference lines and angle overlays
//! - Landmark markers with id labels, the selection highlighted
//! - Calibration markers while calibrating
//! - Annotation markers
//!
//! The same routine renders the magnifier inset through a magnified mapper,
//! so both views always agree.

use cephkit_core::constants::{ANGLE_ARC_RADIUS_PX, ANGLE_ARC_SEGMENTS, LABEL_SIZE_PX, POINT_RADIUS_PX};
use cephkit_core::InputError;
use image::{Rgba as ImageRgba, RgbaImage};
use rusttype::{point as rt_point, Scale};
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::catalogue::{ProjectionConfig, Rgba};
use crate::controller::{Controller, EngineState};
use crate::font;
use crate::geometry::angle_arc;
use crate::model::{CanvasPoint, Size};
use crate::tools::ToolMode;
use crate::viewport::CoordinateMapper;

/// Colours and sizes used by the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    pub background: Rgba,
    pub point: Rgba,
    pub selected: Rgba,
    pub label: Rgba,
    pub calibration: Rgba,
    pub annotation: Rgba,
    pub point_radius: f32,
    pub label_size: f32,
    pub show_labels: bool,
    pub arc_radius: f64,
    pub arc_segments: usize,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            background: Rgba::rgb(0, 0, 0),
            point: Rgba::rgb(231, 76, 60),
            selected: Rgba::rgb(255, 235, 59),
            label: Rgba::rgb(255, 255, 255),
            calibration: Rgba::rgb(46, 204, 113),
            annotation: Rgba::rgb(52, 152, 219),
            point_radius: POINT_RADIUS_PX,
            label_size: LABEL_SIZE_PX,
            show_labels: true,
            arc_radius: ANGLE_ARC_RADIUS_PX,
            arc_segments: ANGLE_ARC_SEGMENTS,
        }
    }
}

fn color(c: Rgba) -> Color {
    Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn paint(c: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color(c));
    paint.anti_alias = true;
    paint
}

/// Everything a frame is drawn from
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub state: &'a EngineState,
    pub config: &'a ProjectionConfig,
}

impl<'a> Scene<'a> {
    pub fn new(state: &'a EngineState, config: &'a ProjectionConfig) -> Self {
        Self { state, config }
    }

    pub fn from_controller(controller: &'a Controller) -> cephkit_core::Result<Self> {
        Ok(Self::new(controller.state(), controller.active_config()?))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Renderer {
    style: RenderStyle,
}

impl Renderer {
    pub fn new(style: RenderStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    /// Clears `pixmap` and draws the scene with the state's own mapper.
    pub fn render_into(&self, pixmap: &mut Pixmap, scene: &Scene<'_>) {
        self.draw(pixmap, scene, scene.state.mapper());
    }

    /// Renders a frame the size of the mapper's canvas.
    pub fn render(&self, scene: &Scene<'_>) -> Result<Pixmap, InputError> {
        let mut pixmap = new_pixmap(scene.state.mapper().canvas_size())?;
        self.render_into(&mut pixmap, scene);
        Ok(pixmap)
    }

    /// Renders the magnifier inset, if the magnifier is on.
    ///
    /// # Arguments
    /// * `zoom` - Magnification relative to the main view
    /// * `size_px` - Edge length of the square inset
    pub fn render_magnifier(&self, scene: &Scene<'_>, zoom: f64, size_px: u32) -> Result<Option<Pixmap>, InputError> {
        let magnifier = scene.state.magnifier();
        let (true, Some(center)) = (magnifier.enabled, magnifier.center) else {
            return Ok(None);
        };
        let size = Size::new(size_px as f64, size_px as f64);
        let mapper = scene.state.mapper().magnified(&center, zoom, size);
        let mut pixmap = new_pixmap(size)?;
        self.draw(&mut pixmap, scene, &mapper);
        Ok(Some(pixmap))
    }

    fn draw(&self, pixmap: &mut Pixmap, scene: &Scene<'_>, mapper: &CoordinateMapper) {
        let state = scene.state;
        let points = state.points();
        let at = |id: &str| points.get(id).map(|p| mapper.to_canvas_space(&p));

        pixmap.fill(color(self.style.background));

        if let Some(raster) = state.raster() {
            let (s, ox, oy) = mapper.affine();
            let transform = Transform::from_row(s as f32, 0.0, 0.0, s as f32, ox as f32, oy as f32);
            raster.handle.draw(pixmap, transform);
        }

        for line in &scene.config.reference_lines {
            if !state.overlays().line_visible(&line.key) {
                continue;
            }
            if let (Some(a), Some(b)) = (at(&line.from), at(&line.to)) {
                stroke_polyline(pixmap, &[a, b], line.color, line.width);
            }
        }

        for overlay in &scene.config.angle_overlays {
            if !state.overlays().angle_visible(&overlay.key) {
                continue;
            }
            let (Some(a1), Some(v), Some(a2)) = (at(&overlay.arm1), at(&overlay.vertex), at(&overlay.arm2)) else {
                continue;
            };
            stroke_polyline(pixmap, &[a1, v, a2], overlay.color, overlay.width);
            let arc = angle_arc(&a1, &v, &a2, self.style.arc_radius, self.style.arc_segments);
            stroke_polyline(pixmap, &arc, overlay.color, overlay.width);
        }

        let selected = points.selected();
        for (id, p) in points.iter() {
            let c = mapper.to_canvas_space(&p);
            let is_selected = selected == Some(id);
            let (fill, radius) = if is_selected {
                (self.style.selected, self.style.point_radius * 1.5)
            } else {
                (self.style.point, self.style.point_radius)
            };
            fill_circle(pixmap, c, radius, fill);
            self.label(pixmap, id, c.offset(radius as f64 + 2.0, -(radius as f64) - 2.0), fill);
        }

        let calibration = state.calibration();
        if state.tool() == ToolMode::Calibrate || calibration.is_in_progress() {
            let labels = calibration.mode().point_labels();
            let marks: Vec<CanvasPoint> = calibration.points().iter().map(|p| mapper.to_canvas_space(p)).collect();
            if marks.len() == 2 {
                stroke_polyline(pixmap, &marks, self.style.calibration, 1.5);
            }
            for (mark, label) in marks.iter().zip(labels) {
                stroke_cross(pixmap, *mark, 6.0, self.style.calibration);
                self.label(pixmap, label, mark.offset(8.0, -8.0), self.style.calibration);
            }
        }

        for annotation in state.annotations() {
            let c = mapper.to_canvas_space(&annotation.point());
            stroke_diamond(pixmap, c, 6.0, self.style.annotation);
            if let Some(text) = &annotation.text {
                self.label(pixmap, text, c.offset(9.0, -9.0), self.style.annotation);
            }
        }
    }

    fn label(&self, pixmap: &mut Pixmap, text: &str, at: CanvasPoint, c: Rgba) {
        if !self.style.show_labels {
            return;
        }
        if let Some(font) = font::label_font() {
            draw_text(pixmap, font, text, at, self.style.label_size, c);
        }
    }
}

fn new_pixmap(size: Size) -> Result<Pixmap, InputError> {
    let (w, h) = (size.width.round(), size.height.round());
    if !(w >= 1.0 && h >= 1.0 && w <= u32::MAX as f64 && h <= u32::MAX as f64) {
        return Err(InputError::InvalidRaster {
            reason: format!("canvas size {} cannot be rendered", size),
        });
    }
    Pixmap::new(w as u32, h as u32).ok_or_else(|| InputError::InvalidRaster {
        reason: format!("canvas size {} cannot be rendered", size),
    })
}

fn stroke_polyline(pixmap: &mut Pixmap, points: &[CanvasPoint], c: Rgba, width: f32) {
    let mut pb = PathBuilder::new();
    let mut iter = points.iter();
    let Some(first) = iter.next() else {
        return;
    };
    pb.move_to(first.x as f32, first.y as f32);
    for p in iter {
        pb.line_to(p.x as f32, p.y as f32);
    }
    if let Some(path) = pb.finish() {
        let stroke = Stroke {
            width,
            ..Default::default()
        };
        pixmap.stroke_path(&path, &paint(c), &stroke, Transform::identity(), None);
    }
}

fn fill_circle(pixmap: &mut Pixmap, center: CanvasPoint, radius: f32, c: Rgba) {
    if let Some(path) = PathBuilder::from_circle(center.x as f32, center.y as f32, radius) {
        pixmap.fill_path(&path, &paint(c), FillRule::Winding, Transform::identity(), None);
    }
}

fn stroke_cross(pixmap: &mut Pixmap, center: CanvasPoint, half: f64, c: Rgba) {
    stroke_polyline(pixmap, &[center.offset(-half, 0.0), center.offset(half, 0.0)], c, 1.5);
    stroke_polyline(pixmap, &[center.offset(0.0, -half), center.offset(0.0, half)], c, 1.5);
}

fn stroke_diamond(pixmap: &mut Pixmap, center: CanvasPoint, half: f64, c: Rgba) {
    let corners = [
        center.offset(0.0, -half),
        center.offset(half, 0.0),
        center.offset(0.0, half),
        center.offset(-half, 0.0),
        center.offset(0.0, -half),
    ];
    stroke_polyline(pixmap, &corners, c, 2.0);
}

/// Rasterises `text` with its baseline-left corner offset so that the top
/// of the glyphs sits at `at`. Coverage is blended source-over into the
/// premultiplied pixmap.
fn draw_text(pixmap: &mut Pixmap, font: &rusttype::Font<'static>, text: &str, at: CanvasPoint, size: f32, c: Rgba) {
    let scale = Scale::uniform(size);
    let v_metrics = font.v_metrics(scale);
    let start = rt_point(at.x as f32, at.y as f32 + v_metrics.ascent);
    let (width, height) = (pixmap.width() as i32, pixmap.height() as i32);
    let data = pixmap.data_mut();

    for glyph in font.layout(text, scale, start) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, v| {
            let px = gx as i32 + bb.min.x;
            let py = gy as i32 + bb.min.y;
            if px < 0 || py < 0 || px >= width || py >= height {
                return;
            }
            let sa = v.clamp(0.0, 1.0) * c.a as f32 / 255.0;
            if sa <= 0.0 {
                return;
            }
            let idx = ((py * width + px) * 4) as usize;
            let pixel = &mut data[idx..idx + 4];
            let src = [c.r, c.g, c.b, 255];
            for (dst, s) in pixel.iter_mut().zip(src) {
                *dst = (s as f32 * sa + *dst as f32 * (1.0 - sa)).round() as u8;
            }
        });
    }
}

/// Converts a premultiplied pixmap to a straight-alpha image.
pub fn to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = ImageRgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    image
}
