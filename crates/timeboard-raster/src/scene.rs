//! Vector scene assembly.
//!
//! Builds an in-memory SVG document for the included slice of the board;
//! `export` rasterizes it in-process. This is a rasterization
//! intermediate, not an export surface.

use crate::export::EXPORT_PADDING;
use kurbo::{Point, Rect, Vec2};
use std::collections::HashSet;
use std::fmt::Write;
use timeboard_core::cell::{Cell, CellKind, DotShape};
use timeboard_core::color::Rgba;
use timeboard_core::connection::{Connection, LinkStyle};
use timeboard_core::document::Document;
use timeboard_core::geometry;
use timeboard_core::layout::{self, FontContext, LINE_HEIGHT_FACTOR, TEXT_INSET};
use timeboard_core::timeline::TimelineConfig;

/// Arrowhead size in world units.
const ARROW_HEAD_SIZE: f64 = 12.0;

/// Assembled scene with its output dimensions.
pub(crate) struct Scene {
    pub svg: String,
    pub width: f64,
    pub height: f64,
}

/// Build the scene for the document, optionally restricted to a region.
///
/// Returns None when nothing is included (empty export is a no-op).
pub(crate) fn build_scene(doc: &Document, region: Option<Rect>) -> Option<Scene> {
    let cells: Vec<&Cell> = doc
        .cells()
        .iter()
        .filter(|cell| region.is_none_or(|r| cell.intersects(r)))
        .collect();
    if cells.is_empty() {
        return None;
    }

    let included: HashSet<_> = cells.iter().map(|c| c.id).collect();
    let connections: Vec<&Connection> = doc
        .connections()
        .iter()
        .filter(|conn| included.contains(&conn.source) && included.contains(&conn.target))
        .collect();

    let mut bounds = cells
        .iter()
        .map(|c| c.rect())
        .reduce(|a, b| a.union(b))?;
    bounds = bounds.inflate(EXPORT_PADDING, EXPORT_PADDING);

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{:.2}" height="{:.2}" viewBox="{:.2} {:.2} {:.2} {:.2}" xml:space="preserve">"#,
        bounds.width(),
        bounds.height(),
        bounds.x0,
        bounds.y0,
        bounds.width(),
        bounds.height(),
    );
    svg.push('\n');

    // Background.
    let _ = write!(
        svg,
        r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" fill-opacity="{:.3}"/>"#,
        bounds.x0,
        bounds.y0,
        bounds.width(),
        bounds.height(),
        css(doc.background),
        doc.background.opacity(),
    );
    svg.push('\n');

    // Connections first so cells paint above them.
    for conn in &connections {
        let source = doc.cell(conn.source);
        let target = doc.cell(conn.target);
        if let (Some(source), Some(target)) = (source, target) {
            push_connection(&mut svg, conn, source, target);
        }
    }

    for (index, cell) in cells.iter().enumerate() {
        push_cell(&mut svg, cell, index);
    }

    svg.push_str("</svg>\n");
    Some(Scene {
        svg,
        width: bounds.width(),
        height: bounds.height(),
    })
}

fn css(color: Rgba) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

fn esc(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn push_connection(svg: &mut String, conn: &Connection, source: &Cell, target: &Cell) {
    let start = geometry::anchor_point(source, conn.source_pin);
    let raw_end = geometry::anchor_point(target, conn.target_pin);
    let end = if conn.style == LinkStyle::Arrow {
        geometry::clip_point_at_rect(start, raw_end, target.rect())
    } else {
        raw_end
    };

    let dash = conn
        .style
        .dash_pattern()
        .map(|pattern| {
            let parts: Vec<String> = pattern.iter().map(|v| format!("{v:.1}")).collect();
            format!(r#" stroke-dasharray="{}""#, parts.join(" "))
        })
        .unwrap_or_default();

    let _ = write!(
        svg,
        r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-opacity="{:.3}" stroke-width="{:.2}"{}/>"#,
        start.x,
        start.y,
        end.x,
        end.y,
        css(conn.color),
        conn.color.opacity(),
        conn.line_width(),
        dash,
    );
    svg.push('\n');

    if conn.style == LinkStyle::Arrow {
        push_arrow_head(svg, conn, start, end);
    }
}

/// Filled triangle head pointing along the final segment.
fn push_arrow_head(svg: &mut String, conn: &Connection, start: Point, end: Point) {
    let d = end - start;
    let len = d.hypot();
    let dir = if len < f64::EPSILON {
        Vec2::new(1.0, 0.0)
    } else {
        d / len
    };
    let perp = Vec2::new(-dir.y, dir.x);

    let back = Point::new(
        end.x - dir.x * ARROW_HEAD_SIZE,
        end.y - dir.y * ARROW_HEAD_SIZE,
    );
    let left = Point::new(
        back.x + perp.x * ARROW_HEAD_SIZE * 0.5,
        back.y + perp.y * ARROW_HEAD_SIZE * 0.5,
    );
    let right = Point::new(
        back.x - perp.x * ARROW_HEAD_SIZE * 0.5,
        back.y - perp.y * ARROW_HEAD_SIZE * 0.5,
    );

    let _ = write!(
        svg,
        r#"<polygon points="{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}" fill="{}" fill-opacity="{:.3}"/>"#,
        end.x,
        end.y,
        left.x,
        left.y,
        right.x,
        right.y,
        css(conn.color),
        conn.color.opacity(),
    );
    svg.push('\n');
}

fn push_cell(svg: &mut String, cell: &Cell, index: usize) {
    let rect = cell.rect();
    let clip_id = format!("cell-clip-{index}");

    let _ = write!(
        svg,
        r#"<defs><clipPath id="{}"><rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="{:.2}"/></clipPath></defs>"#,
        clip_id,
        rect.x0,
        rect.y0,
        rect.width(),
        rect.height(),
        cell.style.corner_radius,
    );
    svg.push('\n');
    let _ = write!(svg, r#"<g clip-path="url(#{clip_id})">"#);
    svg.push('\n');

    match &cell.kind {
        CellKind::Dot(shape) => {
            push_dot(svg, cell, *shape);
            push_text(svg, cell);
        }
        CellKind::Timeline(cfg) => {
            push_border(svg, cell);
            push_timeline(svg, cell, cfg);
        }
        CellKind::Image(payload) => {
            push_border(svg, cell);
            push_image(svg, cell, payload);
            push_text(svg, cell);
        }
        CellKind::Plain => {
            push_border(svg, cell);
            push_text(svg, cell);
        }
    }

    svg.push_str("</g>\n");
}

/// Fill plus border of the cell body.
fn push_border(svg: &mut String, cell: &Cell) {
    let rect = cell.rect();
    let _ = write!(
        svg,
        r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="{:.2}" fill="{}" fill-opacity="{:.3}" stroke="{}" stroke-opacity="{:.3}" stroke-width="{:.2}"/>"#,
        rect.x0,
        rect.y0,
        rect.width(),
        rect.height(),
        cell.style.corner_radius,
        css(cell.style.fill_color),
        cell.style.fill_color.opacity(),
        css(cell.style.border_color),
        cell.style.border_color.opacity(),
        cell.style.border_width,
    );
    svg.push('\n');
}

fn push_dot(svg: &mut String, cell: &Cell, shape: DotShape) {
    let rect = cell.rect();
    let center = rect.center();
    let radius = (rect.width().min(rect.height()) / 2.0 - cell.style.border_width / 2.0).max(1.0);
    let fill = format!(
        r#"fill="{}" fill-opacity="{:.3}" stroke="{}" stroke-opacity="{:.3}" stroke-width="{:.2}""#,
        css(cell.style.fill_color),
        cell.style.fill_color.opacity(),
        css(cell.style.border_color),
        cell.style.border_color.opacity(),
        cell.style.border_width,
    );

    match shape {
        DotShape::Circle => {
            let _ = write!(
                svg,
                r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" {}/>"#,
                center.x, center.y, radius, fill,
            );
        }
        DotShape::Square => {
            let _ = write!(
                svg,
                r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" {}/>"#,
                center.x - radius,
                center.y - radius,
                radius * 2.0,
                radius * 2.0,
                fill,
            );
        }
        DotShape::Diamond => {
            let _ = write!(
                svg,
                r#"<polygon points="{:.2},{:.2} {:.2},{:.2} {:.2},{:.2} {:.2},{:.2}" {}/>"#,
                center.x,
                center.y - radius,
                center.x + radius,
                center.y,
                center.x,
                center.y + radius,
                center.x - radius,
                center.y,
                fill,
            );
        }
    }
    svg.push('\n');
}

/// Tick slots: a centered label per slot with divider lines between slots.
fn push_timeline(svg: &mut String, cell: &Cell, cfg: &TimelineConfig) {
    let ticks = cfg.ticks();
    let size = cell.style.font_size;
    for (index, tick) in ticks.iter().enumerate() {
        let slot = geometry::pin_rect(cell, cfg, index);
        if index > 0 {
            let _ = write!(
                svg,
                r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="1"/>"#,
                slot.x0,
                slot.y0,
                match cfg.orientation {
                    timeboard_core::timeline::Orientation::Horizontal => slot.x0,
                    timeboard_core::timeline::Orientation::Vertical => slot.x1,
                },
                match cfg.orientation {
                    timeboard_core::timeline::Orientation::Horizontal => slot.y1,
                    timeboard_core::timeline::Orientation::Vertical => slot.y0,
                },
                css(cell.style.border_color),
            );
            svg.push('\n');
        }
        let center = slot.center();
        let _ = write!(
            svg,
            r#"<text x="{:.2}" y="{:.2}" text-anchor="middle" font-family="{}" font-size="{:.2}" fill="{}">{}</text>"#,
            center.x,
            center.y + size * 0.35,
            cell.style.font_family.css_name(),
            size,
            css(cell.style.text_color),
            esc(&cfg.label_for(*tick)),
        );
        svg.push('\n');
    }
}

/// Image payload scaled so the crop window fills the cell.
fn push_image(svg: &mut String, cell: &Cell, payload: &timeboard_core::cell::ImagePayload) {
    let rect = cell.rect();
    let crop = payload.crop.clamped();
    let draw_w = rect.width() / crop.width;
    let draw_h = rect.height() / crop.height;
    let x = rect.x0 - crop.x * draw_w;
    let y = rect.y0 - crop.y * draw_h;
    let _ = write!(
        svg,
        r#"<image x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" preserveAspectRatio="none" href="data:{};base64,{}"/>"#,
        x,
        y,
        draw_w,
        draw_h,
        payload.format.mime_type(),
        payload.data_base64,
    );
    svg.push('\n');
}

/// Laid-out rich text: one `<text>` per segment plus explicit
/// underline/strikethrough strokes.
fn push_text(svg: &mut String, cell: &Cell) {
    if cell.content.is_empty() {
        return;
    }
    let rect = cell.rect();
    let font = FontContext::from_style(&cell.style);
    let inner = (rect.width() - 2.0 * TEXT_INSET).max(1.0);
    let lines = layout::layout(&cell.content, &font, inner);

    let mut y = rect.y0 + TEXT_INSET;
    for line in &lines {
        let line_x = rect.x0 + TEXT_INSET + layout::line_offset(line, inner);
        let size = line.height / LINE_HEIGHT_FACTOR;
        let baseline = y + size * 0.95;

        for segment in &line.segments {
            let color = segment.style.color.unwrap_or(cell.style.text_color);
            let x = line_x + segment.x;
            let weight = if segment.style.bold { " font-weight=\"bold\"" } else { "" };
            let style = if segment.style.italic { " font-style=\"italic\"" } else { "" };
            let _ = write!(
                svg,
                r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.2}"{}{} fill="{}" fill-opacity="{:.3}">{}</text>"#,
                x,
                baseline,
                cell.style.font_family.css_name(),
                segment.style.size,
                weight,
                style,
                css(color),
                color.opacity(),
                esc(&segment.text),
            );
            svg.push('\n');

            let stroke_width = (segment.style.size / 14.0).max(1.0);
            if segment.style.underline {
                push_decoration(svg, x, segment.width, baseline + segment.style.size * 0.15, color, stroke_width);
            }
            if segment.style.strikethrough {
                push_decoration(svg, x, segment.width, baseline - segment.style.size * 0.3, color, stroke_width);
            }
        }
        y += line.height;
    }
}

fn push_decoration(svg: &mut String, x: f64, width: f64, y: f64, color: Rgba, stroke_width: f64) {
    let _ = write!(
        svg,
        r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-opacity="{:.3}" stroke-width="{:.2}"/>"#,
        x,
        y,
        x + width,
        y,
        css(color),
        color.opacity(),
        stroke_width,
    );
    svg.push('\n');
}
