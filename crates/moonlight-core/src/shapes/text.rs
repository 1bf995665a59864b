//! Text shape.

use super::{ElementId, ShapeGeometry};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Default font size in scene units.
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

/// Approximate glyph advance as a fraction of the font size.
const CHAR_WIDTH_FACTOR: f64 = 0.6;
/// Line height as a multiple of the font size.
const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// A multi-line text element.
///
/// `position` is the left end of the first line's baseline. Without a text
/// layout engine the bounds are estimated from the font size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub position: Point,
    pub lines: Vec<String>,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    /// Shape this text is the inline label of.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_shape: Option<ElementId>,
}

fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE
}

impl Text {
    pub fn new(position: Point, content: &str) -> Self {
        Self {
            position,
            lines: split_lines(content),
            font_size: DEFAULT_FONT_SIZE,
            anchor_shape: None,
        }
    }

    /// Text content with lines joined by `\n`.
    pub fn content(&self) -> String {
        self.lines.join("\n")
    }

    pub fn set_content(&mut self, content: &str) {
        self.lines = split_lines(content);
    }

    pub fn line_height(&self) -> f64 {
        self.font_size * LINE_HEIGHT_FACTOR
    }

    fn size(&self) -> (f64, f64) {
        let longest = self
            .lines
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0)
            .max(1);
        let width = longest as f64 * self.font_size * CHAR_WIDTH_FACTOR;
        let height = self.lines.len().max(1) as f64 * self.line_height();
        (width, height)
    }

    /// Move the text so its estimated box is centred in `rect`.
    pub fn center_in(&mut self, rect: Rect) {
        let (width, height) = self.size();
        let center = rect.center();
        self.position = Point::new(
            (center.x - width / 2.0).round(),
            (center.y - height / 2.0 + self.font_size).round(),
        );
    }
}

fn split_lines(content: &str) -> Vec<String> {
    content.split('\n').map(str::to_string).collect()
}

impl ShapeGeometry for Text {
    fn bounds(&self) -> Rect {
        let (width, height) = self.size();
        let top = self.position.y - self.font_size;
        Rect::new(
            self.position.x,
            top,
            self.position.x + width,
            top + height,
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64, _filled: bool) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    fn round(&mut self) {
        self.position = self.position.round();
    }
}
