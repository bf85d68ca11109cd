//! Coordinate mapping between image space and canvas space.
//!
//! The image is letterbox-fitted into the canvas by a [`FitTransform`].
//! Under [`ViewportPolicy::FitWithUserZoom`] an independent [`UserView`]
//! (zoom about the canvas centre plus pan) is composed on top of the fit.
//! The two are never merged, so stored landmark coordinates stay
//! independent of canvas size, zoom and pan.

use std::fmt;

use cephkit_core::constants::{MAX_USER_ZOOM, MIN_USER_ZOOM, USER_ZOOM_STEP};
use cephkit_core::{InputError, ViewportPolicy};

use crate::model::{CanvasPoint, Point, Size};

/// Letterbox fit of the image inside the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTransform {
    /// Canvas pixels per image pixel
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl FitTransform {
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    /// Largest uniform scale that fits `image` in `canvas`, centred.
    pub fn letterbox(image: Size, canvas: Size) -> Self {
        let scale = (canvas.width / image.width).min(canvas.height / image.height);
        Self {
            scale,
            offset_x: (canvas.width - image.width * scale) / 2.0,
            offset_y: (canvas.height - image.height * scale) / 2.0,
        }
    }
}

impl Default for FitTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Optional user zoom/pan layered on the fit transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserView {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl UserView {
    pub fn is_identity(&self) -> bool {
        self.zoom == 1.0 && self.pan_x == 0.0 && self.pan_y == 0.0
    }
}

impl Default for UserView {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

/// Maps points between the raster's pixel grid and the display canvas.
#[derive(Debug, Clone)]
pub struct CoordinateMapper {
    policy: ViewportPolicy,
    image: Option<Size>,
    canvas: Size,
    fit: FitTransform,
    view: UserView,
}

impl CoordinateMapper {
    /// Creates a mapper with no image and an empty canvas.
    pub fn new(policy: ViewportPolicy) -> Self {
        Self {
            policy,
            image: None,
            canvas: Size::default(),
            fit: FitTransform::identity(),
            view: UserView::default(),
        }
    }

    /// Initializes the fit for an image shown on a canvas.
    ///
    /// Both sizes must be finite and strictly positive; on error the mapper
    /// is left unchanged.
    pub fn init(&mut self, image: Size, canvas: Size) -> Result<(), InputError> {
        check_size("image", image)?;
        check_size("canvas", canvas)?;
        self.image = Some(image);
        self.canvas = canvas;
        self.refit();
        Ok(())
    }

    /// Re-fits after the host canvas was resized.
    pub fn set_canvas_size(&mut self, canvas: Size) -> Result<(), InputError> {
        check_size("canvas", canvas)?;
        self.canvas = canvas;
        self.refit();
        Ok(())
    }

    /// Re-fits after an image or projection swap. The user view is reset.
    pub fn set_image_size(&mut self, image: Size) -> Result<(), InputError> {
        check_size("image", image)?;
        self.image = Some(image);
        self.view = UserView::default();
        self.refit();
        Ok(())
    }

    /// Forgets the image; the fit falls back to identity.
    pub fn clear_image(&mut self) {
        self.image = None;
        self.view = UserView::default();
        self.refit();
    }

    fn refit(&mut self) {
        self.fit = match self.image {
            Some(image) if self.canvas.is_usable() => FitTransform::letterbox(image, self.canvas),
            _ => FitTransform::identity(),
        };
    }

    /// True once both an image and a canvas size are known.
    pub fn is_ready(&self) -> bool {
        self.image.is_some() && self.canvas.is_usable()
    }

    pub fn policy(&self) -> ViewportPolicy {
        self.policy
    }

    pub fn image_size(&self) -> Option<Size> {
        self.image
    }

    pub fn canvas_size(&self) -> Size {
        self.canvas
    }

    pub fn fit(&self) -> FitTransform {
        self.fit
    }

    pub fn view(&self) -> UserView {
        self.view
    }

    /// Canvas pixels per image pixel, including user zoom.
    pub fn effective_scale(&self) -> f64 {
        self.fit.scale * self.view.zoom
    }

    /// Composite transform as `(scale, offset_x, offset_y)` such that
    /// `canvas = image * scale + offset`.
    pub fn affine(&self) -> (f64, f64, f64) {
        let cx = self.canvas.width / 2.0;
        let cy = self.canvas.height / 2.0;
        let z = self.view.zoom;
        (
            self.fit.scale * z,
            (self.fit.offset_x - cx) * z + cx + self.view.pan_x,
            (self.fit.offset_y - cy) * z + cy + self.view.pan_y,
        )
    }

    /// Converts a canvas position to image space.
    ///
    /// Undoes the user view first, then the fit.
    pub fn to_image_space(&self, p: &CanvasPoint) -> Point {
        let cx = self.canvas.width / 2.0;
        let cy = self.canvas.height / 2.0;
        let qx = (p.x - cx - self.view.pan_x) / self.view.zoom + cx;
        let qy = (p.y - cy - self.view.pan_y) / self.view.zoom + cy;
        Point::new(
            (qx - self.fit.offset_x) / self.fit.scale,
            (qy - self.fit.offset_y) / self.fit.scale,
        )
    }

    /// Converts an image position to canvas space.
    pub fn to_canvas_space(&self, p: &Point) -> CanvasPoint {
        let cx = self.canvas.width / 2.0;
        let cy = self.canvas.height / 2.0;
        let qx = p.x * self.fit.scale + self.fit.offset_x;
        let qy = p.y * self.fit.scale + self.fit.offset_y;
        CanvasPoint::new(
            (qx - cx) * self.view.zoom + cx + self.view.pan_x,
            (qy - cy) * self.view.zoom + cy + self.view.pan_y,
        )
    }

    /// Whether a canvas position falls on the image.
    pub fn contains_canvas_point(&self, p: &CanvasPoint) -> bool {
        let Some(image) = self.image else {
            return false;
        };
        let ip = self.to_image_space(p);
        ip.x >= 0.0 && ip.y >= 0.0 && ip.x <= image.width && ip.y <= image.height
    }

    /// Sets the user zoom, clamped to the allowed range.
    ///
    /// Returns `false` (and does nothing) under `FitOnly`.
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        if !self.policy.allows_user_zoom() || !zoom.is_finite() {
            return false;
        }
        self.view.zoom = zoom.clamp(MIN_USER_ZOOM, MAX_USER_ZOOM);
        true
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set_zoom(self.view.zoom * USER_ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_zoom(self.view.zoom / USER_ZOOM_STEP)
    }

    /// Pans the user view by a canvas-pixel delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> bool {
        if !self.policy.allows_user_zoom() || !dx.is_finite() || !dy.is_finite() {
            return false;
        }
        self.view.pan_x += dx;
        self.view.pan_y += dy;
        true
    }

    /// Restores the identity user view.
    pub fn reset_view(&mut self) -> bool {
        if !self.policy.allows_user_zoom() {
            return false;
        }
        self.view = UserView::default();
        true
    }

    /// Mapper for a magnifier inset of `size`, centred on the canvas
    /// position `center` and magnified by `factor` relative to this view.
    pub fn magnified(&self, center: &CanvasPoint, factor: f64, size: Size) -> CoordinateMapper {
        let (scale, ox, oy) = self.affine();
        CoordinateMapper {
            policy: ViewportPolicy::FitOnly,
            image: self.image,
            canvas: size,
            fit: FitTransform {
                scale: scale * factor,
                offset_x: (ox - center.x) * factor + size.width / 2.0,
                offset_y: (oy - center.y) * factor + size.height / 2.0,
            },
            view: UserView::default(),
        }
    }
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::new(ViewportPolicy::default())
    }
}

impl fmt::Display for CoordinateMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fit: {:.3}x @ ({:.1}, {:.1}), View: {:.0}% pan ({:.1}, {:.1})",
            self.fit.scale,
            self.fit.offset_x,
            self.fit.offset_y,
            self.view.zoom * 100.0,
            self.view.pan_x,
            self.view.pan_y
        )
    }
}

fn check_size(what: &str, size: Size) -> Result<(), InputError> {
    if size.is_usable() {
        Ok(())
    } else {
        Err(InputError::InvalidRaster {
            reason: format!("{} size {} must be positive", what, size),
        })
    }
}
