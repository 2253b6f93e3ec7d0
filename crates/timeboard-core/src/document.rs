//! Document store: cells, connections, selection, view and history.
//!
//! All mutation passes through this type. Continuous gesture updates apply
//! immediately without touching history; the interaction layer calls
//! `save_history` exactly once when a gesture completes.

use crate::camera::Camera;
use crate::cell::{Cell, CellId, CellKind, CellStyle, GroupId};
use crate::color::Rgba;
use crate::connection::{Connection, ConnectionId, LinkStyle};
use crate::content::RichText;
use crate::geometry;
use crate::history::{History, Snapshot};
use crate::layout::{self, FontContext, TEXT_INSET};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Smallest and largest font size reachable via the step commands.
pub const FONT_SIZE_MIN: f64 = 6.0;
pub const FONT_SIZE_MAX: f64 = 96.0;

/// Default grid spacing in world units.
pub const DEFAULT_GRID_SIZE: f64 = 20.0;

/// Document errors surfaced to the import boundary.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid document data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid document structure: {0}")]
    Validation(String),
}

/// Change notifications drained by the embedding shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEvent {
    CellsChanged,
    ConnectionsChanged,
    SelectionChanged,
    ViewChanged,
    DocumentReplaced,
}

/// A named camera bookmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinnedLocation {
    pub name: String,
    pub offset: Vec2,
    pub zoom: f64,
}

/// View and grid settings of the exchange format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSettings {
    #[serde(default)]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    #[serde(default)]
    pub grid_enabled: bool,
    #[serde(default = "default_grid_size")]
    pub grid_size: f64,
}

fn default_zoom() -> f64 {
    1.0
}

fn default_grid_size() -> f64 {
    DEFAULT_GRID_SIZE
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            zoom: 1.0,
            grid_enabled: false,
            grid_size: DEFAULT_GRID_SIZE,
        }
    }
}

/// The persisted/exchanged document shape. Every field is optional on the
/// wire; missing fields fall back to the documented defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentData {
    #[serde(default)]
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default = "default_background")]
    pub canvas_background_color: Rgba,
    #[serde(default)]
    pub color_presets: Vec<Rgba>,
    #[serde(default)]
    pub default_cell_style: CellStyle,
    #[serde(default)]
    pub pinned_locations: Vec<PinnedLocation>,
    #[serde(default)]
    pub view: ViewSettings,
}

fn default_background() -> Rgba {
    Rgba::white()
}

/// Partial update applied to a cell; `None` fields keep current values.
#[derive(Debug, Clone, Default)]
pub struct CellPatch {
    pub position: Option<Point>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub content: Option<RichText>,
    pub style: Option<CellStyle>,
    pub kind: Option<CellKind>,
    pub group: Option<Option<GroupId>>,
    pub manually_resized: Option<bool>,
}

/// Partial update applied to a connection.
#[derive(Debug, Clone, Default)]
pub struct ConnectionPatch {
    pub source_pin: Option<Option<usize>>,
    pub target_pin: Option<Option<usize>>,
    pub color: Option<Rgba>,
    pub style: Option<LinkStyle>,
    pub stroke_width: Option<Option<f64>>,
}

/// A canvas document owning all cells, connections and view state.
#[derive(Debug, Clone)]
pub struct Document {
    cells: Vec<Cell>,
    connections: Vec<Connection>,
    selection: HashSet<CellId>,
    pub camera: Camera,
    pub background: Rgba,
    pub color_presets: Vec<Rgba>,
    pub default_cell_style: CellStyle,
    pub pinned_locations: Vec<PinnedLocation>,
    pub grid_enabled: bool,
    pub grid_size: f64,
    history: History,
    events: Vec<DocumentEvent>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            connections: Vec::new(),
            selection: HashSet::new(),
            camera: Camera::new(),
            background: Rgba::white(),
            color_presets: Vec::new(),
            default_cell_style: CellStyle::default(),
            pinned_locations: Vec::new(),
            grid_enabled: false,
            grid_size: DEFAULT_GRID_SIZE,
            history: History::new(Snapshot {
                cells: Vec::new(),
                connections: Vec::new(),
            }),
            events: Vec::new(),
        }
    }

    // --- accessors -------------------------------------------------------

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.iter().find(|c| c.id == id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    pub fn selection(&self) -> &HashSet<CellId> {
        &self.selection
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Union of all cell bounding boxes.
    pub fn bounds(&self) -> Option<Rect> {
        let mut result: Option<Rect> = None;
        for cell in &self.cells {
            let rect = cell.rect();
            result = Some(match result {
                Some(r) => r.union(rect),
                None => rect,
            });
        }
        result
    }

    /// Topmost cell under a world-space point. Array order is z-order,
    /// so scan back to front.
    pub fn cell_at_point(&self, point: Point, tolerance: f64) -> Option<CellId> {
        self.cells
            .iter()
            .rev()
            .find(|c| c.hit_test(point, tolerance))
            .map(|c| c.id)
    }

    /// Cells whose bounding box intersects a rectangle.
    pub fn cells_in_rect(&self, rect: Rect) -> Vec<CellId> {
        self.cells
            .iter()
            .filter(|c| c.intersects(rect))
            .map(|c| c.id)
            .collect()
    }

    // --- cell operations -------------------------------------------------

    pub fn add_cell(&mut self, cell: Cell) -> CellId {
        let id = cell.id;
        self.cells.push(cell);
        self.push_event(DocumentEvent::CellsChanged);
        id
    }

    /// Apply a partial update. Does not push history.
    pub fn update_cell(&mut self, id: CellId, patch: CellPatch) -> bool {
        let Some(cell) = self.cells.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        if let Some(position) = patch.position {
            cell.position = position;
        }
        if let Some(width) = patch.width {
            cell.width = width.max(Cell::MIN_WIDTH);
        }
        if let Some(height) = patch.height {
            cell.height = height.max(Cell::MIN_HEIGHT);
        }
        if let Some(content) = patch.content {
            cell.content = content;
        }
        if let Some(style) = patch.style {
            cell.style = style;
        }
        if let Some(kind) = patch.kind {
            cell.kind = kind;
        }
        if let Some(group) = patch.group {
            cell.group = group;
        }
        if let Some(manually_resized) = patch.manually_resized {
            cell.manually_resized = manually_resized;
        }
        self.push_event(DocumentEvent::CellsChanged);
        true
    }

    /// Replace a cell's content, auto-fitting the height unless the cell
    /// was manually resized.
    pub fn set_cell_content(&mut self, id: CellId, content: RichText) -> bool {
        let Some(cell) = self.cells.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        cell.content = content;
        if !cell.manually_resized {
            autofit(cell);
        }
        self.push_event(DocumentEvent::CellsChanged);
        true
    }

    /// Translate cells by a world-space delta. Does not push history.
    pub fn translate_cells(&mut self, ids: &[CellId], delta: Vec2) {
        for cell in self.cells.iter_mut().filter(|c| ids.contains(&c.id)) {
            cell.position += delta;
        }
        self.push_event(DocumentEvent::CellsChanged);
    }

    /// Replace a cell's geometry. Does not push history.
    pub fn set_cell_rect(&mut self, id: CellId, rect: Rect) -> bool {
        let Some(cell) = self.cells.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        cell.set_rect(rect);
        self.push_event(DocumentEvent::CellsChanged);
        true
    }

    /// Delete cells and cascade to every connection touching them.
    pub fn delete_cells(&mut self, ids: &[CellId]) {
        if ids.is_empty() {
            return;
        }
        self.cells.retain(|c| !ids.contains(&c.id));
        let before = self.connections.len();
        self.connections
            .retain(|conn| !ids.iter().any(|&id| conn.touches(id)));
        let selection_changed = ids.iter().any(|id| self.selection.remove(id));

        self.push_event(DocumentEvent::CellsChanged);
        if self.connections.len() != before {
            self.push_event(DocumentEvent::ConnectionsChanged);
        }
        if selection_changed {
            self.push_event(DocumentEvent::SelectionChanged);
        }
    }

    /// Step the base font size of every selected cell, shifting run-level
    /// overrides by the same amount.
    pub fn step_font_size(&mut self, delta: f64) {
        let ids: Vec<CellId> = self.selection.iter().copied().collect();
        for cell in self.cells.iter_mut().filter(|c| ids.contains(&c.id)) {
            cell.style.font_size =
                (cell.style.font_size + delta).clamp(FONT_SIZE_MIN, FONT_SIZE_MAX);
            cell.content
                .adjust_font_sizes(delta, FONT_SIZE_MIN, FONT_SIZE_MAX);
            if !cell.manually_resized {
                autofit(cell);
            }
        }
        if !ids.is_empty() {
            self.push_event(DocumentEvent::CellsChanged);
        }
    }

    // --- connection operations -------------------------------------------

    /// Add a connection after validating both endpoints exist. Pin indices
    /// that are meaningless (non-timeline endpoint or out of range) are
    /// normalized away rather than rejected.
    pub fn add_connection(&mut self, mut connection: Connection) -> Result<ConnectionId, DocumentError> {
        let Some(source) = self.cell(connection.source) else {
            return Err(DocumentError::Validation(format!(
                "connection source {} does not exist",
                connection.source
            )));
        };
        let Some(target) = self.cell(connection.target) else {
            return Err(DocumentError::Validation(format!(
                "connection target {} does not exist",
                connection.target
            )));
        };
        connection.source_pin = normalize_pin(source, connection.source_pin);
        connection.target_pin = normalize_pin(target, connection.target_pin);

        let id = connection.id;
        self.connections.push(connection);
        self.push_event(DocumentEvent::ConnectionsChanged);
        Ok(id)
    }

    /// Apply a partial update. Does not push history.
    pub fn update_connection(&mut self, id: ConnectionId, patch: ConnectionPatch) -> bool {
        let Some(index) = self.connections.iter().position(|c| c.id == id) else {
            return false;
        };
        {
            let conn = &mut self.connections[index];
            if let Some(pin) = patch.source_pin {
                conn.source_pin = pin;
            }
            if let Some(pin) = patch.target_pin {
                conn.target_pin = pin;
            }
            if let Some(color) = patch.color {
                conn.color = color;
            }
            if let Some(style) = patch.style {
                conn.style = style;
            }
            if let Some(width) = patch.stroke_width {
                conn.stroke_width = width;
            }
        }
        // Re-normalize pins against the (possibly changed) endpoints.
        let source_pin = self
            .cell(self.connections[index].source)
            .and_then(|cell| normalize_pin(cell, self.connections[index].source_pin));
        let target_pin = self
            .cell(self.connections[index].target)
            .and_then(|cell| normalize_pin(cell, self.connections[index].target_pin));
        self.connections[index].source_pin = source_pin;
        self.connections[index].target_pin = target_pin;

        self.push_event(DocumentEvent::ConnectionsChanged);
        true
    }

    pub fn delete_connection(&mut self, id: ConnectionId) {
        let before = self.connections.len();
        self.connections.retain(|c| c.id != id);
        if self.connections.len() != before {
            self.push_event(DocumentEvent::ConnectionsChanged);
        }
    }

    /// Remove every connection with an endpoint among `ids`.
    pub fn delete_connections_touching(&mut self, ids: &[CellId]) {
        let before = self.connections.len();
        self.connections
            .retain(|conn| !ids.iter().any(|&id| conn.touches(id)));
        if self.connections.len() != before {
            self.push_event(DocumentEvent::ConnectionsChanged);
        }
    }

    // --- selection and view ----------------------------------------------

    /// Replace the selection; ids without a live cell are dropped.
    pub fn set_selection(&mut self, ids: &[CellId]) {
        let next: HashSet<CellId> = ids
            .iter()
            .copied()
            .filter(|&id| self.cell(id).is_some())
            .collect();
        if next != self.selection {
            self.selection = next;
            self.push_event(DocumentEvent::SelectionChanged);
        }
    }

    pub fn select_all(&mut self) {
        let all: Vec<CellId> = self.cells.iter().map(|c| c.id).collect();
        self.set_selection(&all);
    }

    pub fn set_view(&mut self, offset: Vec2, zoom: f64) {
        self.camera.offset = offset;
        self.camera.set_zoom(zoom);
        self.push_event(DocumentEvent::ViewChanged);
    }

    /// Pan the view by a screen-space delta.
    pub fn pan_view(&mut self, delta: Vec2) {
        self.camera.pan(delta);
        self.push_event(DocumentEvent::ViewChanged);
    }

    // --- history ---------------------------------------------------------

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            cells: self.cells.clone(),
            connections: self.connections.clone(),
        }
    }

    /// Record the current state; the transaction boundary of one gesture.
    pub fn save_history(&mut self) {
        let snapshot = self.snapshot();
        self.history.push(snapshot);
        log::debug!(
            "history snapshot saved ({} cells, {} connections)",
            self.cells.len(),
            self.connections.len()
        );
    }

    /// Restore the previous snapshot. Returns false at the start of history.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(snapshot);
        true
    }

    /// Restore the next snapshot. Returns false at the end of history.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(snapshot);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.cells = snapshot.cells;
        self.connections = snapshot.connections;
        let live: HashSet<CellId> = self.cells.iter().map(|c| c.id).collect();
        let before = self.selection.len();
        self.selection.retain(|id| live.contains(id));
        self.push_event(DocumentEvent::CellsChanged);
        self.push_event(DocumentEvent::ConnectionsChanged);
        if self.selection.len() != before {
            self.push_event(DocumentEvent::SelectionChanged);
        }
    }

    // --- load / serialize / reset ----------------------------------------

    /// Load an exchanged document, merging missing fields over defaults.
    ///
    /// Malformed data leaves the current document untouched and reports
    /// the failure upward. One history snapshot is pushed on success.
    pub fn load(&mut self, raw: &str) -> Result<(), DocumentError> {
        let data: DocumentData = serde_json::from_str(raw)?;
        self.apply_data(data);
        Ok(())
    }

    /// Install already-parsed document data.
    pub fn apply_data(&mut self, data: DocumentData) {
        let live: HashSet<CellId> = data.cells.iter().map(|c| c.id).collect();
        let mut connections = data.connections;
        connections.retain(|conn| {
            let ok = live.contains(&conn.source) && live.contains(&conn.target);
            if !ok {
                log::warn!("dropping connection {} with missing endpoint", conn.id);
            }
            ok
        });
        let cells = data.cells;
        for conn in &mut connections {
            if let Some(cell) = cells.iter().find(|c| c.id == conn.source) {
                conn.source_pin = normalize_pin(cell, conn.source_pin);
            }
            if let Some(cell) = cells.iter().find(|c| c.id == conn.target) {
                conn.target_pin = normalize_pin(cell, conn.target_pin);
            }
        }

        self.cells = cells;
        self.connections = connections;
        self.selection.clear();
        self.background = data.canvas_background_color;
        self.color_presets = data.color_presets;
        self.default_cell_style = data.default_cell_style;
        self.pinned_locations = data.pinned_locations;
        self.grid_enabled = data.view.grid_enabled;
        self.grid_size = data.view.grid_size;
        self.camera.offset = Vec2::new(data.view.offset_x, data.view.offset_y);
        self.camera.set_zoom(data.view.zoom);

        let snapshot = self.snapshot();
        self.history.reset(snapshot);
        self.push_event(DocumentEvent::DocumentReplaced);
    }

    /// Export the exchangeable document shape.
    pub fn to_data(&self) -> DocumentData {
        DocumentData {
            cells: self.cells.clone(),
            connections: self.connections.clone(),
            canvas_background_color: self.background,
            color_presets: self.color_presets.clone(),
            default_cell_style: self.default_cell_style.clone(),
            pinned_locations: self.pinned_locations.clone(),
            view: ViewSettings {
                offset_x: self.camera.offset.x,
                offset_y: self.camera.offset.y,
                zoom: self.camera.zoom,
                grid_enabled: self.grid_enabled,
                grid_size: self.grid_size,
            },
        }
    }

    /// Serialize for the persistence/export collaborators.
    pub fn serialize(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(&self.to_data())?)
    }

    /// Clear back to an empty default document.
    pub fn reset(&mut self) {
        *self = Self::new();
        self.push_event(DocumentEvent::DocumentReplaced);
    }

    // --- events ----------------------------------------------------------

    fn push_event(&mut self, event: DocumentEvent) {
        self.events.push(event);
    }

    /// Drain pending change notifications.
    pub fn drain_events(&mut self) -> Vec<DocumentEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Fit a cell's height to its laid-out content.
fn autofit(cell: &mut Cell) {
    let font = FontContext::from_style(&cell.style);
    let inner = (cell.width - 2.0 * TEXT_INSET).max(1.0);
    let height = layout::content_height(&cell.content, &font, inner) + 2.0 * TEXT_INSET;
    cell.height = height.max(Cell::MIN_HEIGHT);
}

/// Strip pin indices that are meaningless for the given endpoint cell.
fn normalize_pin(cell: &Cell, pin: Option<usize>) -> Option<usize> {
    match pin {
        Some(index) if index < geometry::pin_count(cell) => Some(index),
        Some(index) => {
            log::debug!("dropping out-of-range pin {} on cell {}", index, cell.id);
            None
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::TimelineConfig;

    fn doc_with_two_cells() -> (Document, CellId, CellId) {
        let mut doc = Document::new();
        let a = doc.add_cell(Cell::new(Point::new(0.0, 0.0), 100.0, 50.0));
        let b = doc.add_cell(Cell::new(Point::new(200.0, 0.0), 100.0, 50.0));
        (doc, a, b)
    }

    #[test]
    fn test_delete_cascades_connections() {
        let (mut doc, a, b) = doc_with_two_cells();
        let c = doc.add_cell(Cell::new(Point::new(400.0, 0.0), 100.0, 50.0));
        doc.add_connection(Connection::new(a, b)).unwrap();
        doc.add_connection(Connection::new(b, c)).unwrap();
        doc.add_connection(Connection::new(a, c)).unwrap();

        doc.delete_cells(&[b]);

        assert_eq!(doc.cells().len(), 2);
        assert_eq!(doc.connections().len(), 1);
        assert!(doc.connections().iter().all(|conn| !conn.touches(b)));
    }

    #[test]
    fn test_connection_requires_live_endpoints() {
        let (mut doc, a, _) = doc_with_two_cells();
        let ghost = uuid::Uuid::new_v4();
        assert!(doc.add_connection(Connection::new(a, ghost)).is_err());
        assert!(doc.connections().is_empty());
    }

    #[test]
    fn test_out_of_range_pin_normalized() {
        let mut doc = Document::new();
        let timeline = doc.add_cell(
            Cell::new(Point::ZERO, 300.0, 40.0)
                .with_kind(CellKind::Timeline(TimelineConfig::new(1, 3))),
        );
        let plain = doc.add_cell(Cell::new(Point::new(400.0, 0.0), 100.0, 50.0));

        let id = doc
            .add_connection(Connection::new(timeline, plain).with_pins(Some(99), Some(0)))
            .unwrap();
        let conn = doc.connection(id).unwrap();
        assert_eq!(conn.source_pin, None);
        // A pin on a non-timeline endpoint is meaningless too.
        assert_eq!(conn.target_pin, None);

        let id2 = doc
            .add_connection(Connection::new(timeline, plain).with_pins(Some(2), None))
            .unwrap();
        assert_eq!(doc.connection(id2).unwrap().source_pin, Some(2));
    }

    #[test]
    fn test_undo_restores_pre_gesture_state() {
        let (mut doc, a, _) = doc_with_two_cells();
        doc.save_history();

        doc.translate_cells(&[a], Vec2::new(50.0, 25.0));
        doc.save_history();

        let moved = doc.cell(a).unwrap().position;
        assert!((moved.x - 50.0).abs() < f64::EPSILON);

        assert!(doc.undo());
        let back = doc.cell(a).unwrap().position;
        assert!((back.x - 0.0).abs() < f64::EPSILON);

        assert!(doc.redo());
        let again = doc.cell(a).unwrap().position;
        assert!((again.x - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_undo_past_start_is_noop() {
        let mut doc = Document::new();
        assert!(!doc.undo());
        assert!(!doc.redo());
    }

    #[test]
    fn test_undo_sequence_of_gestures() {
        let mut doc = Document::new();
        let a = doc.add_cell(Cell::new(Point::ZERO, 100.0, 50.0));
        doc.save_history();

        for step in 1..=3 {
            doc.translate_cells(&[a], Vec2::new(10.0, 0.0));
            doc.save_history();
            let x = doc.cell(a).unwrap().position.x;
            assert!((x - step as f64 * 10.0).abs() < f64::EPSILON);
        }

        // Walk back gesture by gesture.
        for step in (0..3).rev() {
            assert!(doc.undo());
            let x = doc.cell(a).unwrap().position.x;
            assert!((x - step as f64 * 10.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_update_does_not_push_history() {
        let (mut doc, a, _) = doc_with_two_cells();
        assert!(!doc.can_undo());
        doc.update_cell(
            a,
            CellPatch {
                width: Some(150.0),
                ..CellPatch::default()
            },
        );
        assert!(!doc.can_undo());
    }

    #[test]
    fn test_selection_is_subset_of_cells() {
        let (mut doc, a, _) = doc_with_two_cells();
        let ghost = uuid::Uuid::new_v4();
        doc.set_selection(&[a, ghost]);
        assert_eq!(doc.selection().len(), 1);
        assert!(doc.selection().contains(&a));

        doc.delete_cells(&[a]);
        assert!(doc.selection().is_empty());
    }

    #[test]
    fn test_load_merges_defaults() {
        let mut doc = Document::new();
        doc.load("{}").unwrap();
        assert!(doc.is_empty());
        assert!(!doc.grid_enabled);
        assert!((doc.camera.zoom - 1.0).abs() < f64::EPSILON);
        assert_eq!(doc.camera.offset, Vec2::ZERO);
        assert_eq!(doc.background, Rgba::white());
    }

    #[test]
    fn test_load_malformed_preserves_document() {
        let (mut doc, a, _) = doc_with_two_cells();
        let result = doc.load("{not json");
        assert!(result.is_err());
        assert_eq!(doc.cells().len(), 2);
        assert!(doc.cell(a).is_some());
    }

    #[test]
    fn test_load_drops_dangling_connections() {
        let (doc, _, _) = doc_with_two_cells();
        let mut data = doc.to_data();
        data.connections
            .push(Connection::new(uuid::Uuid::new_v4(), uuid::Uuid::new_v4()));

        let raw = serde_json::to_string(&data).unwrap();
        let mut fresh = Document::new();
        fresh.load(&raw).unwrap();
        assert_eq!(fresh.cells().len(), 2);
        assert!(fresh.connections().is_empty());
    }

    #[test]
    fn test_serialize_load_roundtrip() {
        let (mut doc, a, b) = doc_with_two_cells();
        doc.add_connection(Connection::new(a, b)).unwrap();
        doc.background = Rgba::new(250, 250, 240, 255);
        doc.set_view(Vec2::new(12.0, -7.0), 2.0);

        let raw = doc.serialize().unwrap();
        let mut other = Document::new();
        other.load(&raw).unwrap();

        assert_eq!(other.cells(), doc.cells());
        assert_eq!(other.connections(), doc.connections());
        assert_eq!(other.background, doc.background);
        assert!((other.camera.zoom - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_pushes_one_snapshot() {
        let (doc, _, _) = doc_with_two_cells();
        let raw = doc.serialize().unwrap();

        let mut fresh = Document::new();
        fresh.load(&raw).unwrap();
        // The loaded state is the history floor: nothing to undo into.
        assert!(!fresh.can_undo());
        fresh.delete_cells(&[fresh.cells()[0].id]);
        fresh.save_history();
        assert!(fresh.undo());
        assert_eq!(fresh.cells().len(), 2);
    }

    #[test]
    fn test_autofit_on_content_edit() {
        let mut doc = Document::new();
        let id = doc.add_cell(Cell::new(Point::ZERO, 120.0, 30.0));
        doc.set_cell_content(id, RichText::plain("a\nb\nc\nd\ne"));
        let grown = doc.cell(id).unwrap().height;
        assert!(grown > 30.0);

        // Manually resized cells are never auto-fitted.
        doc.update_cell(
            id,
            CellPatch {
                manually_resized: Some(true),
                height: Some(40.0),
                ..CellPatch::default()
            },
        );
        doc.set_cell_content(id, RichText::plain("a\nb\nc\nd\ne\nf\ng"));
        assert!((doc.cell(id).unwrap().height - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_step_font_size_clamped() {
        let mut doc = Document::new();
        let id = doc.add_cell(Cell::new(Point::ZERO, 100.0, 50.0));
        doc.set_selection(&[id]);
        for _ in 0..100 {
            doc.step_font_size(2.0);
        }
        assert!((doc.cell(id).unwrap().style.font_size - FONT_SIZE_MAX).abs() < f64::EPSILON);
    }

    #[test]
    fn test_events_drained() {
        let mut doc = Document::new();
        doc.add_cell(Cell::new(Point::ZERO, 100.0, 50.0));
        let events = doc.drain_events();
        assert!(events.contains(&DocumentEvent::CellsChanged));
        assert!(doc.drain_events().is_empty());
    }

    #[test]
    fn test_reset() {
        let (mut doc, _, _) = doc_with_two_cells();
        doc.reset();
        assert!(doc.is_empty());
        assert!(doc.connections().is_empty());
        assert!(!doc.can_undo());
    }

    #[test]
    fn test_cell_at_point_prefers_topmost() {
        let mut doc = Document::new();
        let below = doc.add_cell(Cell::new(Point::ZERO, 100.0, 100.0));
        let above = doc.add_cell(Cell::new(Point::new(50.0, 50.0), 100.0, 100.0));

        assert_eq!(doc.cell_at_point(Point::new(75.0, 75.0), 0.0), Some(above));
        assert_eq!(doc.cell_at_point(Point::new(25.0, 25.0), 0.0), Some(below));
        assert_eq!(doc.cell_at_point(Point::new(500.0, 500.0), 0.0), None);
    }
}
