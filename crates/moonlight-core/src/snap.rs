//! Snap functionality for aligning coordinates to the grid and to anchors.

use crate::shapes::{AnchorName, ElementId};
use kurbo::{Point, Vec2};

/// Default grid size for snapping (matches the visual grid).
pub const GRID_SIZE: f64 = 20.0;

/// Distance, in screen pixels, within which a dropped endpoint binds to an
/// anchor.
pub const ANCHOR_SNAP_TOLERANCE: f64 = 15.0;

/// Snap a single value to the nearest multiple of `grid_size`.
pub fn snap_to_grid(value: f64, grid_size: f64) -> f64 {
    if grid_size <= 0.0 {
        return value.round();
    }
    (value / grid_size).round() * grid_size
}

/// Smallest multiple of `grid_size` that is `>= value`.
pub fn snap_up(value: f64, grid_size: f64) -> f64 {
    if grid_size <= 0.0 {
        return value.ceil();
    }
    (value / grid_size).ceil() * grid_size
}

/// Largest multiple of `grid_size` that is `<= value`.
pub fn snap_down(value: f64, grid_size: f64) -> f64 {
    if grid_size <= 0.0 {
        return value.floor();
    }
    (value / grid_size).floor() * grid_size
}

/// Grid settings of an editor instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub enabled: bool,
    pub size: f64,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            enabled: false,
            size: GRID_SIZE,
        }
    }
}

impl Grid {
    pub fn new(enabled: bool, size: f64) -> Self {
        Self { enabled, size }
    }

    /// Snap a point per axis when enabled; otherwise round to integers.
    pub fn snap_point(&self, point: Point) -> Point {
        if self.enabled {
            Point::new(
                snap_to_grid(point.x, self.size),
                snap_to_grid(point.y, self.size),
            )
        } else {
            point.round()
        }
    }

    /// Adjust a move delta so that `origin + delta` lands on the grid when
    /// enabled; otherwise round the delta.
    pub fn snap_delta(&self, origin: Point, delta: Vec2) -> Vec2 {
        if self.enabled {
            self.snap_point(origin + delta) - origin
        } else {
            delta.round()
        }
    }
}

/// An anchor a line endpoint could bind to.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapTarget {
    pub point: Point,
    pub element: ElementId,
    pub anchor: AnchorName,
}

/// Find the nearest target within `threshold` of `point`.
pub fn snap_to_anchors<'a>(
    point: Point,
    targets: &'a [SnapTarget],
    threshold: f64,
) -> Option<&'a SnapTarget> {
    let mut best_target = None;
    let mut best_dist_sq = threshold * threshold;

    for target in targets {
        let dist_sq = (point - target.point).hypot2();
        if dist_sq <= best_dist_sq {
            best_dist_sq = dist_sq;
            best_target = Some(target);
        }
    }

    best_target
}
