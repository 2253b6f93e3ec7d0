//! Pointer and keyboard gesture state machine.
//!
//! One gesture is active at a time by construction; a gesture is bounded
//! by pointer-down and pointer-up and committed with a single
//! `save_history` call on the document.

use crate::cell::{Cell, CellId, GroupId};
use crate::connection::Connection;
use crate::document::Document;
use crate::geometry::{self, ResizeDirection, HANDLE_HIT_TOLERANCE};
use kurbo::{Point, Rect, Vec2};
use std::collections::HashMap;

/// Offset applied to pasted cells so clones don't sit on their originals.
pub const PASTE_OFFSET: Vec2 = Vec2::new(16.0, 16.0);

/// Arrow-key nudge distances in world units.
pub const NUDGE_STEP: f64 = 1.0;
pub const NUDGE_STEP_LARGE: f64 = 10.0;

/// Font size change per step command.
pub const FONT_SIZE_STEP: f64 = 2.0;

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// The platform "secondary" modifier that turns a cell press into a
    /// connect drag (Cmd on macOS, Ctrl elsewhere).
    pub fn secondary(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Keyboard commands routed to the controller by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Copy,
    Cut,
    Paste,
    PastePlain,
    Delete,
    NudgeLeft,
    NudgeRight,
    NudgeUp,
    NudgeDown,
    SelectAll,
    Undo,
    Redo,
    Find,
    FontSizeUp,
    FontSizeDown,
}

/// The active gesture, carrying its gesture-scoped payload.
#[derive(Debug, Clone, Default)]
pub enum Gesture {
    #[default]
    Idle,
    SelectBox {
        start: Point,
        current: Point,
        additive: bool,
    },
    DragCells {
        last: Point,
    },
    ResizeCells {
        direction: ResizeDirection,
        start: Point,
        anchor: CellId,
        /// Pre-gesture rectangles of every selected cell.
        origins: HashMap<CellId, Rect>,
    },
    Connect {
        source: CellId,
        source_pin: Option<usize>,
        current: Point,
        /// Hovered drop target and its pin, refreshed on every move.
        target: Option<(CellId, Option<usize>)>,
    },
    Pan {
        /// Last pointer position in screen coordinates.
        last: Point,
    },
    RegionExport {
        start: Point,
        current: Point,
    },
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }
}

/// Outcome handed to a collaborator when a gesture or command completes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerSignal {
    /// A region-export drag finished over this world-space rectangle.
    RegionSelected(Rect),
    /// Open the search collaborator.
    OpenFind,
}

#[derive(Debug, Clone)]
struct ClipboardPayload {
    cells: Vec<Cell>,
    connections: Vec<Connection>,
}

/// The pointer/keyboard gesture state machine.
#[derive(Debug, Clone, Default)]
pub struct Controller {
    pub gesture: Gesture,
    /// When armed, the next empty-canvas drag selects an export region.
    pub region_export_armed: bool,
    clipboard: Option<ClipboardPayload>,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm or disarm region-export mode.
    pub fn set_region_export_armed(&mut self, armed: bool) {
        self.region_export_armed = armed;
    }

    /// Handle pointer-down in screen coordinates.
    pub fn pointer_down(
        &mut self,
        doc: &mut Document,
        screen: Point,
        button: PointerButton,
        modifiers: Modifiers,
    ) {
        if !self.gesture.is_idle() {
            return;
        }
        if button == PointerButton::Middle {
            self.gesture = Gesture::Pan { last: screen };
            return;
        }

        let world = doc.camera.screen_to_world(screen);
        let tolerance = HANDLE_HIT_TOLERANCE / doc.camera.zoom;

        // Resize handles of selected cells win over cell bodies.
        if let Some((id, direction)) = self.handle_under(doc, world, tolerance) {
            let origins: HashMap<CellId, Rect> = doc
                .selection()
                .iter()
                .filter_map(|&sid| doc.cell(sid).map(|c| (sid, c.rect())))
                .collect();
            self.gesture = Gesture::ResizeCells {
                direction,
                start: world,
                anchor: id,
                origins,
            };
            return;
        }

        if let Some(id) = doc.cell_at_point(world, 0.0) {
            if modifiers.secondary() {
                let source_pin = doc.cell(id).and_then(|c| geometry::pin_at_point(c, world));
                self.gesture = Gesture::Connect {
                    source: id,
                    source_pin,
                    current: world,
                    target: None,
                };
            } else {
                if !doc.selection().contains(&id) {
                    if modifiers.shift {
                        let mut ids: Vec<CellId> = doc.selection().iter().copied().collect();
                        ids.push(id);
                        doc.set_selection(&ids);
                    } else {
                        doc.set_selection(&[id]);
                    }
                }
                self.gesture = Gesture::DragCells { last: world };
            }
        } else if self.region_export_armed {
            self.gesture = Gesture::RegionExport {
                start: world,
                current: world,
            };
        } else {
            self.gesture = Gesture::SelectBox {
                start: world,
                current: world,
                additive: modifiers.shift,
            };
        }
    }

    /// Handle pointer-move in screen coordinates.
    pub fn pointer_move(&mut self, doc: &mut Document, screen: Point) {
        let world = doc.camera.screen_to_world(screen);
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::SelectBox { current, .. } | Gesture::RegionExport { current, .. } => {
                *current = world;
            }
            Gesture::DragCells { last } => {
                let delta = world - *last;
                *last = world;
                let ids: Vec<CellId> = doc.selection().iter().copied().collect();
                doc.translate_cells(&ids, delta);
            }
            Gesture::ResizeCells {
                direction,
                start,
                anchor,
                origins,
            } => {
                let delta = world - *start;
                let rects = geometry::resize_cells(origins, *anchor, *direction, delta);
                for (id, rect) in rects {
                    doc.set_cell_rect(id, rect);
                }
            }
            Gesture::Connect {
                source,
                current,
                target,
                ..
            } => {
                *current = world;
                *target = doc
                    .cell_at_point(world, 0.0)
                    .filter(|id| *id != *source)
                    .map(|id| {
                        let pin = doc.cell(id).and_then(|c| geometry::pin_at_point(c, world));
                        (id, pin)
                    });
            }
            Gesture::Pan { last } => {
                let delta = screen - *last;
                *last = screen;
                doc.pan_view(delta);
            }
        }
    }

    /// Handle pointer-up; commits the active gesture.
    pub fn pointer_up(&mut self, doc: &mut Document, screen: Point) -> Option<ControllerSignal> {
        self.pointer_move(doc, screen);
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle | Gesture::Pan { .. } => None,
            Gesture::SelectBox {
                start,
                current,
                additive,
            } => {
                let rect = Rect::from_points(start, current);
                let mut hits = doc.cells_in_rect(rect);
                if additive {
                    hits.extend(doc.selection().iter().copied());
                }
                doc.set_selection(&hits);
                None
            }
            Gesture::DragCells { .. } | Gesture::ResizeCells { .. } => {
                doc.save_history();
                None
            }
            Gesture::Connect {
                source,
                source_pin,
                target,
                ..
            } => {
                // No valid drop target: discard silently.
                if let Some((target_id, target_pin)) = target {
                    let connection =
                        Connection::new(source, target_id).with_pins(source_pin, target_pin);
                    if doc.add_connection(connection).is_ok() {
                        doc.save_history();
                    }
                }
                None
            }
            Gesture::RegionExport { start, current } => {
                self.region_export_armed = false;
                Some(ControllerSignal::RegionSelected(Rect::from_points(
                    start, current,
                )))
            }
        }
    }

    /// Escape: cancel any in-progress box/region/resize/connect gesture
    /// without committing. Returns the state machine to idle without
    /// calling into the document store.
    pub fn cancel(&mut self) {
        match self.gesture {
            Gesture::SelectBox { .. }
            | Gesture::RegionExport { .. }
            | Gesture::ResizeCells { .. }
            | Gesture::Connect { .. } => {
                self.gesture = Gesture::Idle;
            }
            _ => {}
        }
    }

    /// Handle a keyboard command. The layer is disabled while an in-place
    /// text edit has focus.
    pub fn key_command(
        &mut self,
        doc: &mut Document,
        command: KeyCommand,
        modifiers: Modifiers,
        text_editing: bool,
    ) -> Option<ControllerSignal> {
        if text_editing {
            return None;
        }
        match command {
            KeyCommand::Copy => {
                self.copy_selection(doc);
                None
            }
            KeyCommand::Cut => {
                self.copy_selection(doc);
                let ids: Vec<CellId> = doc.selection().iter().copied().collect();
                if !ids.is_empty() {
                    doc.delete_cells(&ids);
                    doc.save_history();
                }
                None
            }
            KeyCommand::Paste => {
                self.paste(doc, false);
                None
            }
            KeyCommand::PastePlain => {
                self.paste(doc, true);
                None
            }
            KeyCommand::Delete => {
                let ids: Vec<CellId> = doc.selection().iter().copied().collect();
                if !ids.is_empty() {
                    doc.delete_cells(&ids);
                    doc.save_history();
                }
                None
            }
            KeyCommand::NudgeLeft => self.nudge(doc, Vec2::new(-1.0, 0.0), modifiers),
            KeyCommand::NudgeRight => self.nudge(doc, Vec2::new(1.0, 0.0), modifiers),
            KeyCommand::NudgeUp => self.nudge(doc, Vec2::new(0.0, -1.0), modifiers),
            KeyCommand::NudgeDown => self.nudge(doc, Vec2::new(0.0, 1.0), modifiers),
            KeyCommand::SelectAll => {
                doc.select_all();
                None
            }
            KeyCommand::Undo => {
                doc.undo();
                None
            }
            KeyCommand::Redo => {
                doc.redo();
                None
            }
            KeyCommand::Find => Some(ControllerSignal::OpenFind),
            KeyCommand::FontSizeUp => {
                if !doc.selection().is_empty() {
                    doc.step_font_size(FONT_SIZE_STEP);
                    doc.save_history();
                }
                None
            }
            KeyCommand::FontSizeDown => {
                if !doc.selection().is_empty() {
                    doc.step_font_size(-FONT_SIZE_STEP);
                    doc.save_history();
                }
                None
            }
        }
    }

    /// True while a clipboard payload is available to paste.
    pub fn can_paste(&self) -> bool {
        self.clipboard.is_some()
    }

    fn nudge(
        &mut self,
        doc: &mut Document,
        direction: Vec2,
        modifiers: Modifiers,
    ) -> Option<ControllerSignal> {
        let ids: Vec<CellId> = doc.selection().iter().copied().collect();
        if ids.is_empty() {
            return None;
        }
        let step = if modifiers.shift {
            NUDGE_STEP_LARGE
        } else {
            NUDGE_STEP
        };
        doc.translate_cells(&ids, direction * step);
        doc.save_history();
        None
    }

    fn handle_under(
        &self,
        doc: &Document,
        world: Point,
        tolerance: f64,
    ) -> Option<(CellId, ResizeDirection)> {
        doc.selection().iter().find_map(|&id| {
            let cell = doc.cell(id)?;
            geometry::handle_at_point(cell.rect(), world, tolerance).map(|dir| (id, dir))
        })
    }

    /// Deep-clone the selected cells plus the connections whose both
    /// endpoints are selected.
    fn copy_selection(&mut self, doc: &Document) {
        let selected = doc.selection();
        if selected.is_empty() {
            return;
        }
        let cells: Vec<Cell> = doc
            .cells()
            .iter()
            .filter(|c| selected.contains(&c.id))
            .cloned()
            .collect();
        let connections: Vec<Connection> = doc
            .connections()
            .iter()
            .filter(|conn| selected.contains(&conn.source) && selected.contains(&conn.target))
            .cloned()
            .collect();
        self.clipboard = Some(ClipboardPayload { cells, connections });
    }

    /// Paste the clipboard with fresh cell ids and group tags, endpoints
    /// remapped, positions offset. Selects the pasted cells.
    fn paste(&mut self, doc: &mut Document, strip_formatting: bool) {
        let Some(payload) = self.clipboard.clone() else {
            return;
        };

        let mut id_map: HashMap<CellId, CellId> = HashMap::new();
        let mut group_map: HashMap<GroupId, GroupId> = HashMap::new();
        let mut pasted: Vec<CellId> = Vec::new();

        for mut cell in payload.cells {
            let old_id = cell.id;
            let new_id = cell.regenerate_id();
            id_map.insert(old_id, new_id);
            if let Some(group) = cell.group {
                cell.group = Some(
                    *group_map
                        .entry(group)
                        .or_insert_with(uuid::Uuid::new_v4),
                );
            }
            cell.position += PASTE_OFFSET;
            if strip_formatting {
                cell.content = cell.content.stripped();
            }
            pasted.push(new_id);
            doc.add_cell(cell);
        }

        for mut conn in payload.connections {
            let (Some(&source), Some(&target)) =
                (id_map.get(&conn.source), id_map.get(&conn.target))
            else {
                continue;
            };
            conn.id = uuid::Uuid::new_v4();
            conn.source = source;
            conn.target = target;
            if doc.add_connection(conn).is_err() {
                log::warn!("dropping pasted connection with unmapped endpoint");
            }
        }

        if !pasted.is_empty() {
            doc.set_selection(&pasted);
            doc.save_history();
        }
    }
}
