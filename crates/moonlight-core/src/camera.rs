//! Camera module for the screen↔scene transform.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Camera derives the view transform from the SVG viewBox and a zoom
/// factor.
///
/// The viewBox is scaled uniformly to fit the viewport, then multiplied by
/// `zoom`. Pointer input is converted with the inverse before it reaches the
/// model, so the scene never stores screen coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Size of the host viewport in screen pixels.
    pub viewport: Size,
    /// Visible scene region at zoom 1.
    pub view_box: Rect,
    /// Current zoom level (1.0 = 100%).
    pub zoom: f64,
    /// Minimum allowed zoom level
    pub min_zoom: f64,
    /// Maximum allowed zoom level
    pub max_zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Size::new(800.0, 600.0), 1.0)
    }
}

impl Camera {
    /// Create a camera whose viewBox matches the viewport.
    pub fn new(viewport: Size, zoom: f64) -> Self {
        Self {
            viewport,
            view_box: Rect::from_origin_size(Point::ZERO, viewport),
            zoom,
            min_zoom: 0.1,
            max_zoom: 10.0,
        }
    }

    /// Scale from scene units to screen pixels.
    pub fn scale(&self) -> f64 {
        let vb_w = self.view_box.width().max(f64::EPSILON);
        let vb_h = self.view_box.height().max(f64::EPSILON);
        (self.viewport.width / vb_w).min(self.viewport.height / vb_h) * self.zoom
    }

    /// Get the affine transform for rendering (scene → screen).
    pub fn transform(&self) -> Affine {
        Affine::scale(self.scale()) * Affine::translate(-self.view_box.origin().to_vec2())
    }

    /// Get the inverse transform for input handling (screen → scene).
    pub fn inverse_transform(&self) -> Affine {
        self.transform().inverse()
    }

    pub fn screen_to_scene(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn scene_to_screen(&self, scene_point: Point) -> Point {
        self.transform() * scene_point
    }

    /// Convert a length in screen pixels to scene units.
    pub fn screen_len(&self, pixels: f64) -> f64 {
        pixels / self.scale()
    }

    /// Pan by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        let scene_delta = delta / self.scale();
        self.view_box = self.view_box - scene_delta;
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Zoom the camera, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let scene_point = self.screen_to_scene(screen_point);
        self.zoom = new_zoom;

        // Shift the viewBox so scene_point stays under screen_point
        let drift = self.screen_to_scene(screen_point) - scene_point;
        self.view_box = self.view_box - drift;
    }

    /// Adopt a viewBox, e.g. from imported markup.
    pub fn set_view_box(&mut self, view_box: Rect) {
        if view_box.width() > 0.0 && view_box.height() > 0.0 {
            self.view_box = view_box;
        }
    }

    /// Centre of the visible region in scene coordinates.
    pub fn visible_center(&self) -> Point {
        self.screen_to_scene(Point::new(
            self.viewport.width / 2.0,
            self.viewport.height / 2.0,
        ))
    }

    /// Reset to the viewport-sized viewBox at zoom 1.
    pub fn reset(&mut self) {
        self.view_box = Rect::from_origin_size(Point::ZERO, self.viewport);
        self.zoom = 1.0;
    }
}
