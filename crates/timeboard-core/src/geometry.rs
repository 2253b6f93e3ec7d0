//! Geometry helpers: pin layout, anchor resolution, arrow clipping and
//! proportional resize math.

use crate::cell::{Cell, CellId, CellKind};
use crate::timeline::{Orientation, TimelineConfig};
use kurbo::{Point, Rect, Vec2};
use std::collections::HashMap;

/// Main-axis extent of one tick slot when the timeline has not been
/// manually resized.
pub const TICK_DEFAULT_EXTENT: f64 = 60.0;

/// Resize handle hit tolerance in screen pixels (divide by zoom for world).
pub const HANDLE_HIT_TOLERANCE: f64 = 8.0;

/// Number of pins (tick slots) a cell exposes. Zero for non-timelines.
pub fn pin_count(cell: &Cell) -> usize {
    cell.kind.as_timeline().map_or(0, TimelineConfig::tick_count)
}

/// Rectangle of one tick slot.
///
/// Manually resized cells divide the actual main-axis extent by the tick
/// count; otherwise each slot takes the fixed default extent. The cross
/// axis always spans the cell.
pub fn pin_rect(cell: &Cell, cfg: &TimelineConfig, index: usize) -> Rect {
    let count = cfg.tick_count().max(1) as f64;
    let i = index as f64;
    let rect = cell.rect();
    match cfg.orientation {
        Orientation::Horizontal => {
            let slot = if cell.manually_resized {
                cell.width / count
            } else {
                TICK_DEFAULT_EXTENT
            };
            Rect::new(
                rect.x0 + i * slot,
                rect.y0,
                rect.x0 + (i + 1.0) * slot,
                rect.y1,
            )
        }
        Orientation::Vertical => {
            let slot = if cell.manually_resized {
                cell.height / count
            } else {
                TICK_DEFAULT_EXTENT
            };
            Rect::new(
                rect.x0,
                rect.y0 + i * slot,
                rect.x1,
                rect.y0 + (i + 1.0) * slot,
            )
        }
    }
}

/// Find the pin under a world-space point, if the cell is a timeline.
pub fn pin_at_point(cell: &Cell, point: Point) -> Option<usize> {
    let cfg = cell.kind.as_timeline()?;
    (0..cfg.tick_count()).find(|&i| pin_rect(cell, cfg, i).contains(point))
}

/// Resolved draw point of a connection endpoint.
///
/// Defaults to the cell center; a timeline endpoint with an in-range pin
/// index resolves to that pin slot's center.
pub fn anchor_point(cell: &Cell, pin: Option<usize>) -> Point {
    if let (CellKind::Timeline(cfg), Some(index)) = (&cell.kind, pin) {
        if index < cfg.tick_count() {
            return pin_rect(cell, cfg, index).center();
        }
    }
    cell.center()
}

/// Clip the segment source→target at the boundary of `rect`.
///
/// Tests all four edges parametrically, keeps intersections with parameter
/// in (0, 1] that fall within the perpendicular bound of the edge, and
/// returns the one nearest the source. Falls back to the unclipped target
/// when no edge qualifies (e.g. the source lies inside the rectangle's
/// shadow or the segment is degenerate).
pub fn clip_point_at_rect(source: Point, target: Point, rect: Rect) -> Point {
    let d = target - source;
    let mut best: Option<(f64, Point)> = None;

    let mut consider = |t: f64, p: Point| {
        if t > 0.0 && t <= 1.0 && best.map_or(true, |(bt, _)| t < bt) {
            best = Some((t, p));
        }
    };

    if d.x.abs() > f64::EPSILON {
        for x in [rect.x0, rect.x1] {
            let t = (x - source.x) / d.x;
            let y = source.y + t * d.y;
            if y >= rect.y0 && y <= rect.y1 {
                consider(t, Point::new(x, y));
            }
        }
    }
    if d.y.abs() > f64::EPSILON {
        for y in [rect.y0, rect.y1] {
            let t = (y - source.y) / d.y;
            let x = source.x + t * d.x;
            if x >= rect.x0 && x <= rect.x1 {
                consider(t, Point::new(x, y));
            }
        }
    }

    best.map_or(target, |(_, p)| p)
}

/// Direction of an active resize handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeDirection {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl ResizeDirection {
    pub fn all() -> [ResizeDirection; 8] {
        [
            ResizeDirection::North,
            ResizeDirection::NorthEast,
            ResizeDirection::East,
            ResizeDirection::SouthEast,
            ResizeDirection::South,
            ResizeDirection::SouthWest,
            ResizeDirection::West,
            ResizeDirection::NorthWest,
        ]
    }

    pub fn has_north(&self) -> bool {
        matches!(
            self,
            ResizeDirection::North | ResizeDirection::NorthEast | ResizeDirection::NorthWest
        )
    }

    pub fn has_south(&self) -> bool {
        matches!(
            self,
            ResizeDirection::South | ResizeDirection::SouthEast | ResizeDirection::SouthWest
        )
    }

    pub fn has_east(&self) -> bool {
        matches!(
            self,
            ResizeDirection::East | ResizeDirection::NorthEast | ResizeDirection::SouthEast
        )
    }

    pub fn has_west(&self) -> bool {
        matches!(
            self,
            ResizeDirection::West | ResizeDirection::NorthWest | ResizeDirection::SouthWest
        )
    }
}

/// Position of a resize handle on a cell rectangle.
pub fn handle_position(rect: Rect, direction: ResizeDirection) -> Point {
    let cx = rect.center().x;
    let cy = rect.center().y;
    match direction {
        ResizeDirection::North => Point::new(cx, rect.y0),
        ResizeDirection::NorthEast => Point::new(rect.x1, rect.y0),
        ResizeDirection::East => Point::new(rect.x1, cy),
        ResizeDirection::SouthEast => Point::new(rect.x1, rect.y1),
        ResizeDirection::South => Point::new(cx, rect.y1),
        ResizeDirection::SouthWest => Point::new(rect.x0, rect.y1),
        ResizeDirection::West => Point::new(rect.x0, cy),
        ResizeDirection::NorthWest => Point::new(rect.x0, rect.y0),
    }
}

/// Find the resize handle under a world-space point, corners first.
pub fn handle_at_point(rect: Rect, point: Point, tolerance: f64) -> Option<ResizeDirection> {
    let mut directions = ResizeDirection::all();
    // Corners take priority over edge midpoints where they overlap.
    directions.sort_by_key(|d| match d {
        ResizeDirection::NorthEast
        | ResizeDirection::SouthEast
        | ResizeDirection::SouthWest
        | ResizeDirection::NorthWest => 0,
        _ => 1,
    });
    directions.into_iter().find(|&dir| {
        let handle = handle_position(rect, dir);
        let dx = point.x - handle.x;
        let dy = point.y - handle.y;
        dx * dx + dy * dy <= tolerance * tolerance
    })
}

/// Resize the dragged cell's rectangle directly from the pointer delta.
///
/// East/west affect width, north/south affect height; west/north hold the
/// opposite edge fixed by shifting the position. Results are clamped to
/// the minimum floors.
pub fn resize_rect(origin: Rect, direction: ResizeDirection, delta: Vec2) -> Rect {
    let mut width = origin.width();
    let mut height = origin.height();

    if direction.has_east() {
        width += delta.x;
    } else if direction.has_west() {
        width -= delta.x;
    }
    if direction.has_south() {
        height += delta.y;
    } else if direction.has_north() {
        height -= delta.y;
    }

    width = width.max(Cell::MIN_WIDTH);
    height = height.max(Cell::MIN_HEIGHT);

    let x0 = if direction.has_west() { origin.x1 - width } else { origin.x0 };
    let y0 = if direction.has_north() { origin.y1 - height } else { origin.y0 };
    Rect::new(x0, y0, x0 + width, y0 + height)
}

/// Scale a co-selected cell's rectangle by the dragged cell's ratios.
///
/// The floors are applied per cell, which can desynchronize the ratios
/// across the selection at extremes; that is accepted behavior.
pub fn scale_rect(origin: Rect, direction: ResizeDirection, width_ratio: f64, height_ratio: f64) -> Rect {
    let width = (origin.width() * width_ratio).max(Cell::MIN_WIDTH);
    let height = (origin.height() * height_ratio).max(Cell::MIN_HEIGHT);
    let x0 = if direction.has_west() { origin.x1 - width } else { origin.x0 };
    let y0 = if direction.has_north() { origin.y1 - height } else { origin.y0 };
    Rect::new(x0, y0, x0 + width, y0 + height)
}

/// Proportional multi-resize of a selection.
///
/// The anchor (dragged) cell is resized from the pointer delta; every other
/// cell is scaled by the resulting width/height ratios relative to its own
/// pre-gesture rectangle. Returns the new rectangle per cell id.
pub fn resize_cells(
    origins: &HashMap<CellId, Rect>,
    anchor: CellId,
    direction: ResizeDirection,
    delta: Vec2,
) -> HashMap<CellId, Rect> {
    let Some(&anchor_origin) = origins.get(&anchor) else {
        return HashMap::new();
    };
    let anchor_rect = resize_rect(anchor_origin, direction, delta);
    let width_ratio = anchor_rect.width() / anchor_origin.width().max(f64::EPSILON);
    let height_ratio = anchor_rect.height() / anchor_origin.height().max(f64::EPSILON);

    origins
        .iter()
        .map(|(&id, &origin)| {
            let rect = if id == anchor {
                anchor_rect
            } else {
                scale_rect(origin, direction, width_ratio, height_ratio)
            };
            (id, rect)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::TimelineConfig;
    use uuid::Uuid;

    fn timeline_cell(start: i64, end: i64, width: f64, height: f64) -> Cell {
        Cell::new(Point::ZERO, width, height)
            .with_kind(CellKind::Timeline(TimelineConfig::new(start, end)))
    }

    #[test]
    fn test_anchor_defaults_to_center() {
        let cell = Cell::new(Point::new(10.0, 10.0), 100.0, 50.0);
        let anchor = anchor_point(&cell, None);
        assert!((anchor.x - 60.0).abs() < f64::EPSILON);
        assert!((anchor.y - 35.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_anchor_pin_resolution_manual() {
        let mut cell = timeline_cell(1, 4, 400.0, 40.0);
        cell.manually_resized = true;
        // Four ticks across 400 units: slot 0 centered at x=50.
        let anchor = anchor_point(&cell, Some(0));
        assert!((anchor.x - 50.0).abs() < f64::EPSILON);
        assert!((anchor.y - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_anchor_pin_resolution_default_extent() {
        let cell = timeline_cell(1, 4, 400.0, 40.0);
        let anchor = anchor_point(&cell, Some(1));
        assert!((anchor.x - TICK_DEFAULT_EXTENT * 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_anchor_out_of_range_pin_falls_back() {
        let cell = timeline_cell(1, 4, 400.0, 40.0);
        let anchor = anchor_point(&cell, Some(99));
        assert_eq!(anchor, cell.center());
    }

    #[test]
    fn test_anchor_pin_ignored_for_plain_cell() {
        let cell = Cell::new(Point::ZERO, 100.0, 100.0);
        assert_eq!(anchor_point(&cell, Some(0)), cell.center());
    }

    #[test]
    fn test_pin_at_point_vertical() {
        let mut cell = Cell::new(Point::ZERO, 80.0, 300.0);
        let mut cfg = TimelineConfig::new(1, 3);
        cfg.orientation = Orientation::Vertical;
        cell.kind = CellKind::Timeline(cfg);
        cell.manually_resized = true;
        // Three slots of 100 each.
        assert_eq!(pin_at_point(&cell, Point::new(40.0, 50.0)), Some(0));
        assert_eq!(pin_at_point(&cell, Point::new(40.0, 150.0)), Some(1));
        assert_eq!(pin_at_point(&cell, Point::new(40.0, 250.0)), Some(2));
        assert_eq!(pin_at_point(&cell, Point::new(40.0, 500.0)), None);
    }

    #[test]
    fn test_clip_lands_on_boundary() {
        let rect = Rect::new(100.0, 100.0, 200.0, 200.0);
        let source = Point::new(0.0, 150.0);
        let clipped = clip_point_at_rect(source, rect.center(), rect);
        assert!((clipped.x - 100.0).abs() < f64::EPSILON);
        assert!((clipped.y - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clip_picks_nearest_edge() {
        let rect = Rect::new(100.0, 0.0, 200.0, 100.0);
        // Approaching from the left: the left edge comes first.
        let clipped = clip_point_at_rect(Point::new(0.0, 50.0), Point::new(150.0, 50.0), rect);
        assert!((clipped.x - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clip_degenerate_falls_back() {
        let rect = Rect::new(100.0, 100.0, 200.0, 200.0);
        let p = Point::new(150.0, 150.0);
        // Zero-length segment: no edge qualifies.
        assert_eq!(clip_point_at_rect(p, p, rect), p);
    }

    #[test]
    fn test_resize_east_grows_width() {
        let origin = Rect::new(0.0, 0.0, 100.0, 100.0);
        let resized = resize_rect(origin, ResizeDirection::East, Vec2::new(50.0, 0.0));
        assert!((resized.width() - 150.0).abs() < f64::EPSILON);
        assert!((resized.x0 - 0.0).abs() < f64::EPSILON);
        assert!((resized.height() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resize_west_keeps_right_edge() {
        let origin = Rect::new(0.0, 0.0, 100.0, 100.0);
        let resized = resize_rect(origin, ResizeDirection::West, Vec2::new(30.0, 0.0));
        assert!((resized.width() - 70.0).abs() < f64::EPSILON);
        assert!((resized.x1 - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resize_clamps_to_floor() {
        let origin = Rect::new(0.0, 0.0, 100.0, 100.0);
        let resized = resize_rect(origin, ResizeDirection::SouthEast, Vec2::new(-500.0, -500.0));
        assert!((resized.width() - Cell::MIN_WIDTH).abs() < f64::EPSILON);
        assert!((resized.height() - Cell::MIN_HEIGHT).abs() < f64::EPSILON);
    }

    #[test]
    fn test_proportional_resize_scales_peers() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut origins = HashMap::new();
        origins.insert(a, Rect::new(0.0, 0.0, 100.0, 100.0));
        origins.insert(b, Rect::new(200.0, 0.0, 280.0, 60.0));

        // Drag the anchor's east handle by +100: width ratio 2.0.
        let rects = resize_cells(&origins, a, ResizeDirection::East, Vec2::new(100.0, 0.0));
        assert!((rects[&a].width() - 200.0).abs() < f64::EPSILON);
        assert!((rects[&b].width() - 160.0).abs() < f64::EPSILON);
        // Heights untouched by an east drag.
        assert!((rects[&b].height() - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_proportional_west_resize_fixes_right_edges() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut origins = HashMap::new();
        origins.insert(a, Rect::new(0.0, 0.0, 100.0, 100.0));
        origins.insert(b, Rect::new(200.0, 50.0, 300.0, 150.0));

        let rects = resize_cells(&origins, a, ResizeDirection::West, Vec2::new(20.0, 0.0));
        // Right edge of every affected cell stays put.
        assert!((rects[&a].x1 - 100.0).abs() < f64::EPSILON);
        assert!((rects[&b].x1 - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_proportional_floor_desync_accepted() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut origins = HashMap::new();
        origins.insert(a, Rect::new(0.0, 0.0, 200.0, 100.0));
        origins.insert(b, Rect::new(300.0, 0.0, 360.0, 100.0));

        // Shrink hard: the small cell bottoms out at the floor first.
        let rects = resize_cells(&origins, a, ResizeDirection::East, Vec2::new(-120.0, 0.0));
        let ratio_a = rects[&a].width() / 200.0;
        let ratio_b = rects[&b].width() / 60.0;
        assert!((rects[&b].width() - Cell::MIN_WIDTH).abs() < f64::EPSILON);
        assert!(ratio_b > ratio_a);
    }

    #[test]
    fn test_handle_at_point_prefers_corner() {
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        // Top-right corner, also close to the top and right edge midpoints.
        let hit = handle_at_point(rect, Point::new(99.0, 1.0), 8.0);
        assert_eq!(hit, Some(ResizeDirection::NorthEast));
        assert_eq!(handle_at_point(rect, Point::new(50.0, 50.0), 8.0), None);
    }
}
