//! Pointer interaction state machine.
//!
//! Classifies gestures into canvas moves, layer-list reorders and external
//! file drops, runs the alignment engine while an element is dragged, and
//! commits the result to history when the gesture ends.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::canvas::Canvas;
use crate::element::ElementId;
use crate::history::History;
use crate::input::{DragData, DragEvent, DroppedFile};
use crate::snap::{AssistSettings, Guideline, SNAP_THRESHOLD, compute_guidelines, compute_snap};

/// Transfer payload attached to a layer-list drag.
///
/// Marks the drag as an internal, ordering-only operation so drop handlers
/// can tell it apart from files dragged in from the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerTransfer {
    pub index: usize,
    pub is_internal: bool,
    pub is_layer_sort: bool,
}

impl LayerTransfer {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            is_internal: true,
            is_layer_sort: true,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a drag text payload. Returns `None` for anything that is not an
    /// internal layer-sort payload.
    pub fn from_json(text: &str) -> Option<Self> {
        serde_json::from_str::<Self>(text)
            .ok()
            .filter(|t| t.is_internal && t.is_layer_sort)
    }
}

/// State of an element being dragged on the canvas.
#[derive(Debug, Clone)]
pub struct CanvasDrag {
    pub element_id: ElementId,
    /// Pointer position relative to the top-left of the element's box at grab time.
    pub grab_offset: Vec2,
    pub start_point: Point,
    pub current_point: Point,
    /// Guidelines computed once at gesture start (empty when alignment is off).
    pub guidelines: Vec<Guideline>,
}

impl CanvasDrag {
    /// Get the drag delta.
    pub fn delta(&self) -> Vec2 {
        self.current_point - self.start_point
    }
}

/// State of a layer-list entry being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerDrag {
    pub from_index: usize,
    pub element_id: ElementId,
}

/// Current gesture.
#[derive(Debug, Clone, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    DraggingCanvasElement(CanvasDrag),
    DraggingLayerEntry(LayerDrag),
    /// An external drag (e.g. OS files) is hovering over the canvas.
    DropTargetHover,
}

impl InteractionState {
    /// Whether a drag started inside the editor is in progress.
    pub fn is_internal_drag(&self) -> bool {
        matches!(
            self,
            InteractionState::DraggingCanvasElement(_) | InteractionState::DraggingLayerEntry(_)
        )
    }
}

/// Drives gestures against a canvas and its history.
#[derive(Debug, Clone, Default)]
pub struct Interaction {
    state: InteractionState,
    /// Guidelines highlighted for the current frame.
    active_guidelines: Vec<Guideline>,
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, InteractionState::Idle)
    }

    /// Guidelines to draw for the current frame.
    pub fn active_guidelines(&self) -> &[Guideline] {
        &self.active_guidelines
    }

    pub fn clear_guidelines(&mut self) {
        self.active_guidelines.clear();
    }

    /// Element being dragged on the canvas, if any.
    pub fn dragged_element(&self) -> Option<ElementId> {
        match &self.state {
            InteractionState::DraggingCanvasElement(drag) => Some(drag.element_id),
            _ => None,
        }
    }

    /// Layer-list index carrying the "dragging" marker, if any.
    pub fn dragging_layer_index(&self) -> Option<usize> {
        match &self.state {
            InteractionState::DraggingLayerEntry(drag) => Some(drag.from_index),
            _ => None,
        }
    }

    pub fn is_drop_target_active(&self) -> bool {
        matches!(self.state, InteractionState::DropTargetHover)
    }

    /// A pointer press or layer grab means no native drag is in progress, so
    /// a hover that never received its closing leave is dropped.
    fn discard_stale_hover(&mut self) {
        if self.is_drop_target_active() {
            log::debug!("Discarding stale drop hover");
            self.state = InteractionState::Idle;
        }
    }

    /// Start dragging the topmost visible element under `position`.
    ///
    /// Returns false (and leaves the state untouched) when no gesture is
    /// started: another gesture is active, nothing hit, or the element is
    /// being text-edited.
    pub fn pointer_down(&mut self, canvas: &mut Canvas, assist: &AssistSettings, position: Point) -> bool {
        self.discard_stale_hover();
        if !self.is_idle() {
            return false;
        }
        match canvas.element_at(position) {
            Some(id) => self.begin_element_drag(canvas, assist, id, position),
            None => false,
        }
    }

    /// Start dragging a specific element grabbed at `position`.
    pub fn begin_element_drag(
        &mut self,
        canvas: &mut Canvas,
        assist: &AssistSettings,
        id: ElementId,
        position: Point,
    ) -> bool {
        self.discard_stale_hover();
        if !self.is_idle() || canvas.is_editing(id) || !canvas.widgets.is_visible(id) {
            return false;
        }
        let Some(element) = canvas.store.get(id) else {
            return false;
        };

        let grab_offset = position - element.bounds_in(canvas.container).origin();
        let guidelines = if assist.alignment_enabled() {
            compute_guidelines(canvas.container, canvas.visible_elements(), Some(id))
        } else {
            Vec::new()
        };

        canvas.select(id);
        log::debug!("Canvas drag started for {} ({} guidelines)", id, guidelines.len());
        self.state = InteractionState::DraggingCanvasElement(CanvasDrag {
            element_id: id,
            grab_offset,
            start_point: position,
            current_point: position,
            guidelines,
        });
        true
    }

    /// Move the dragged element so it tracks the grab point, applying snap
    /// corrections. Returns true if an element moved.
    pub fn pointer_move(&mut self, canvas: &mut Canvas, assist: &AssistSettings, position: Point) -> bool {
        let InteractionState::DraggingCanvasElement(drag) = &mut self.state else {
            return false;
        };
        drag.current_point = position;

        let Some(element) = canvas.store.get_mut(drag.element_id) else {
            log::warn!("Dragged element {} disappeared, ending drag", drag.element_id);
            self.state = InteractionState::Idle;
            self.active_guidelines.clear();
            return false;
        };

        let raw = Rect::from_origin_size(position - drag.grab_offset, element.box_size());
        let target = if assist.alignment_enabled() {
            let snap = compute_snap(raw, &drag.guidelines, SNAP_THRESHOLD);
            self.active_guidelines = if assist.show_guidelines {
                snap.active.clone()
            } else {
                Vec::new()
            };
            if assist.enable_snapping {
                snap.apply(raw)
            } else {
                raw
            }
        } else {
            raw
        };

        element.geometry.set_center(target.center());
        true
    }

    /// Finish the current gesture on pointer release.
    ///
    /// For a canvas drag this clears guidelines, re-caches the element's
    /// center and commits to history. Returns true if a snapshot was recorded.
    pub fn pointer_up(&mut self, canvas: &mut Canvas, history: &mut History) -> bool {
        match std::mem::take(&mut self.state) {
            InteractionState::DraggingCanvasElement(drag) => {
                self.active_guidelines.clear();
                canvas.refresh_initial_center(drag.element_id);
                let committed = history.commit(canvas.store.elements());
                log::debug!(
                    "Canvas drag ended for {} (moved {:?}, committed: {})",
                    drag.element_id,
                    drag.delta(),
                    committed
                );
                committed
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    /// Abandon any gesture (window blur, pointer left the window).
    ///
    /// A canvas drag is finalized exactly like a pointer-up; other gestures
    /// are dropped. Always ends in `Idle`. Returns true if a snapshot was recorded.
    pub fn cancel(&mut self, canvas: &mut Canvas, history: &mut History) -> bool {
        let committed = self.pointer_up(canvas, history);
        if !self.is_idle() {
            log::debug!("Gesture cancelled");
        }
        self.state = InteractionState::Idle;
        self.active_guidelines.clear();
        committed
    }

    /// Start dragging the layer-list entry at `index`.
    ///
    /// Returns the transfer payload to attach to the drag, or `None` when the
    /// drag is rejected (not idle, bad index, or the element is being edited).
    pub fn begin_layer_drag(&mut self, canvas: &Canvas, index: usize) -> Option<LayerTransfer> {
        self.discard_stale_hover();
        if !self.is_idle() {
            return None;
        }
        let element_id = canvas.store.get_at(index)?.id();
        if canvas.is_editing(element_id) {
            return None;
        }
        self.state = InteractionState::DraggingLayerEntry(LayerDrag {
            from_index: index,
            element_id,
        });
        Some(LayerTransfer::new(index))
    }

    /// Drop the dragged layer entry at `target_index`, reordering the store.
    /// Returns true if a snapshot was recorded.
    pub fn layer_drop(&mut self, canvas: &mut Canvas, history: &mut History, target_index: usize) -> bool {
        let InteractionState::DraggingLayerEntry(drag) = self.state else {
            return false;
        };
        self.state = InteractionState::Idle;

        // The entry may have moved since the drag began.
        let Some(from) = canvas.store.index_of(drag.element_id) else {
            return false;
        };
        if !canvas.store.reorder(from, target_index) {
            return false;
        }
        history.commit(canvas.store.elements())
    }

    /// End a layer drag without a drop (dropped outside the list).
    pub fn layer_drag_end(&mut self) {
        if matches!(self.state, InteractionState::DraggingLayerEntry(_)) {
            self.state = InteractionState::Idle;
        }
    }

    /// Handle a native drag event over the canvas container.
    ///
    /// Returns the dropped files when an external drop lands on the canvas.
    pub fn drag_event(&mut self, event: &DragEvent, container: Rect, modal_open: bool) -> Option<Vec<DroppedFile>> {
        match event {
            DragEvent::Enter { .. } => {
                if self.is_idle() && !modal_open {
                    self.state = InteractionState::DropTargetHover;
                }
                None
            }
            DragEvent::Over { .. } => None,
            DragEvent::Leave { position } => {
                if self.is_drop_target_active() && is_outside(*position, container) {
                    self.state = InteractionState::Idle;
                }
                None
            }
            DragEvent::Drop { data, .. } => self.drop_external(data),
        }
    }

    fn drop_external(&mut self, data: &DragData) -> Option<Vec<DroppedFile>> {
        if !self.is_drop_target_active() {
            return None;
        }
        self.state = InteractionState::Idle;
        if data.text.as_deref().and_then(LayerTransfer::from_json).is_some() {
            return None;
        }
        Some(data.files.clone())
    }
}

/// Whether a pointer has truly left the container (on or beyond any edge).
fn is_outside(point: Point, container: Rect) -> bool {
    point.x <= container.x0 || point.x >= container.x1 || point.y <= container.y0 || point.y >= container.y1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;

    fn assist_all() -> AssistSettings {
        AssistSettings {
            show_guidelines: true,
            enable_snapping: true,
            show_other_boundaries: false,
        }
    }

    fn setup() -> (Canvas, History, ElementId, ElementId) {
        let mut canvas = Canvas::new();
        let anchor = Element::text("anchor")
            .with_size(100.0, 40.0)
            .with_center(Point::new(200.0, 200.0));
        let mover = Element::text("mover")
            .with_size(50.0, 50.0)
            .with_center(Point::new(100.0, 100.0));
        let (anchor_id, mover_id) = (anchor.id(), mover.id());
        canvas.store.add(anchor);
        canvas.store.add(mover);
        let mut history = History::new();
        history.initialize(canvas.store.elements());
        (canvas, history, anchor_id, mover_id)
    }

    #[test]
    fn test_drag_snaps_and_commits() {
        let (mut canvas, mut history, _, mover) = setup();
        let mut interaction = Interaction::new();
        let assist = assist_all();

        assert!(interaction.pointer_down(&mut canvas, &assist, Point::new(100.0, 100.0)));
        assert!(canvas.is_selected(mover));
        assert_eq!(interaction.dragged_element(), Some(mover));

        assert!(interaction.pointer_move(&mut canvas, &assist, Point::new(205.0, 199.0)));
        let center = canvas.store.get(mover).unwrap().center_in(canvas.container);
        assert_eq!(center, Point::new(200.0, 200.0));
        assert!(!interaction.active_guidelines().is_empty());
        assert_eq!(history.len(), 1);

        assert!(interaction.pointer_up(&mut canvas, &mut history));
        assert!(interaction.is_idle());
        assert!(interaction.active_guidelines().is_empty());
        assert_eq!(history.len(), 2);
        assert_eq!(canvas.store.get(mover).unwrap().initial_center, Point::new(200.0, 200.0));
    }

    #[test]
    fn test_drag_tracks_grab_point_without_snapping() {
        let (mut canvas, mut history, _, mover) = setup();
        let mut interaction = Interaction::new();
        let assist = AssistSettings::default();

        // Grab 10px right of the element center.
        assert!(interaction.pointer_down(&mut canvas, &assist, Point::new(110.0, 100.0)));
        interaction.pointer_move(&mut canvas, &assist, Point::new(315.0, 299.0));
        let center = canvas.store.get(mover).unwrap().center_in(canvas.container);
        assert_eq!(center, Point::new(305.0, 299.0));
        assert!(interaction.active_guidelines().is_empty());
        interaction.pointer_up(&mut canvas, &mut history);
    }

    #[test]
    fn test_guidelines_only_highlights_without_moving() {
        let (mut canvas, _, _, mover) = setup();
        let mut interaction = Interaction::new();
        let assist = AssistSettings {
            show_guidelines: true,
            ..AssistSettings::default()
        };

        interaction.pointer_down(&mut canvas, &assist, Point::new(100.0, 100.0));
        interaction.pointer_move(&mut canvas, &assist, Point::new(205.0, 199.0));
        let center = canvas.store.get(mover).unwrap().center_in(canvas.container);
        assert_eq!(center, Point::new(205.0, 199.0));
        assert!(!interaction.active_guidelines().is_empty());
    }

    #[test]
    fn test_no_move_drag_adds_no_history() {
        let (mut canvas, mut history, _, _) = setup();
        let mut interaction = Interaction::new();
        let assist = assist_all();

        assert!(interaction.pointer_down(&mut canvas, &assist, Point::new(100.0, 100.0)));
        assert!(!interaction.pointer_up(&mut canvas, &mut history));
        assert!(interaction.is_idle());
        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), 0);
    }

    #[test]
    fn test_editing_element_rejects_drags() {
        let (mut canvas, _, _, mover) = setup();
        let mut interaction = Interaction::new();
        canvas.enter_text_editing(mover);

        assert!(!interaction.pointer_down(&mut canvas, &assist_all(), Point::new(100.0, 100.0)));
        assert!(interaction.is_idle());
        assert_eq!(interaction.begin_layer_drag(&canvas, 1), None);
        assert!(interaction.is_idle());
    }

    #[test]
    fn test_pointer_down_on_empty_space() {
        let (mut canvas, _, _, _) = setup();
        let mut interaction = Interaction::new();
        assert!(!interaction.pointer_down(&mut canvas, &assist_all(), Point::new(390.0, 10.0)));
        assert!(interaction.is_idle());
    }

    #[test]
    fn test_cancel_reaches_idle_and_commits() {
        let (mut canvas, mut history, _, _) = setup();
        let mut interaction = Interaction::new();
        let assist = AssistSettings::default();

        interaction.pointer_down(&mut canvas, &assist, Point::new(100.0, 100.0));
        interaction.pointer_move(&mut canvas, &assist, Point::new(150.0, 100.0));
        assert!(interaction.cancel(&mut canvas, &mut history));
        assert!(interaction.is_idle());

        interaction.begin_layer_drag(&canvas, 0);
        assert!(!interaction.cancel(&mut canvas, &mut history));
        assert!(interaction.is_idle());
    }

    #[test]
    fn test_layer_drag_reorders_and_commits() {
        let (mut canvas, mut history, anchor, _) = setup();
        let mut interaction = Interaction::new();

        let transfer = interaction.begin_layer_drag(&canvas, 0).unwrap();
        assert_eq!(transfer, LayerTransfer::new(0));
        assert_eq!(interaction.dragging_layer_index(), Some(0));

        assert!(interaction.layer_drop(&mut canvas, &mut history, 1));
        assert_eq!(canvas.store.index_of(anchor), Some(1));
        assert!(interaction.is_idle());
        assert_eq!(interaction.dragging_layer_index(), None);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_layer_drop_in_place_is_noop() {
        let (mut canvas, mut history, _, _) = setup();
        let mut interaction = Interaction::new();

        interaction.begin_layer_drag(&canvas, 1);
        assert!(!interaction.layer_drop(&mut canvas, &mut history, 1));
        assert_eq!(history.len(), 1);

        interaction.begin_layer_drag(&canvas, 1);
        interaction.layer_drag_end();
        assert!(interaction.is_idle());
    }

    #[test]
    fn test_layer_transfer_json() {
        let json = LayerTransfer::new(3).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["index"], 3);
        assert_eq!(value["isInternal"], true);
        assert_eq!(value["isLayerSort"], true);

        assert_eq!(LayerTransfer::from_json(&json), Some(LayerTransfer::new(3)));
        assert_eq!(LayerTransfer::from_json("hello"), None);
        assert_eq!(
            LayerTransfer::from_json(r#"{"index":1,"isInternal":false,"isLayerSort":true}"#),
            None
        );
    }

    #[test]
    fn test_drag_enter_ignored_during_internal_drag_or_modal() {
        let (canvas, _, _, _) = setup();
        let mut interaction = Interaction::new();
        let rect = canvas.container_rect();
        let enter = DragEvent::Enter {
            position: Point::new(10.0, 10.0),
        };

        interaction.drag_event(&enter, rect, true);
        assert!(interaction.is_idle());

        interaction.begin_layer_drag(&canvas, 0);
        interaction.drag_event(&enter, rect, false);
        assert!(interaction.state().is_internal_drag());
        interaction.layer_drag_end();

        interaction.drag_event(&enter, rect, false);
        assert!(interaction.is_drop_target_active());
    }

    #[test]
    fn test_drag_leave_requires_exiting_container() {
        let (canvas, _, _, _) = setup();
        let mut interaction = Interaction::new();
        let rect = canvas.container_rect();
        interaction.drag_event(&DragEvent::Enter { position: Point::new(5.0, 5.0) }, rect, false);

        // Leaving a child element while still inside.
        interaction.drag_event(&DragEvent::Leave { position: Point::new(200.0, 200.0) }, rect, false);
        assert!(interaction.is_drop_target_active());

        // Exactly on the edge counts as outside.
        interaction.drag_event(&DragEvent::Leave { position: Point::new(400.0, 200.0) }, rect, false);
        assert!(interaction.is_idle());

        for position in [Point::new(-1.0, 50.0), Point::new(50.0, 0.0), Point::new(50.0, 401.0)] {
            interaction.drag_event(&DragEvent::Enter { position: Point::new(5.0, 5.0) }, rect, false);
            interaction.drag_event(&DragEvent::Leave { position }, rect, false);
            assert!(interaction.is_idle());
        }
    }

    #[test]
    fn test_stale_hover_does_not_block_drags() {
        let (mut canvas, _, anchor, _) = setup();
        let mut interaction = Interaction::new();
        let rect = canvas.container_rect();
        let assist = AssistSettings::default();

        // An OS drag cancelled over the canvas reports its leave inside the container.
        interaction.drag_event(&DragEvent::Enter { position: Point::new(100.0, 100.0) }, rect, false);
        interaction.drag_event(&DragEvent::Leave { position: Point::new(100.0, 100.0) }, rect, false);
        assert!(interaction.is_drop_target_active());

        assert!(interaction.pointer_down(&mut canvas, &assist, Point::new(200.0, 200.0)));
        assert_eq!(interaction.dragged_element(), Some(anchor));

        let mut interaction = Interaction::new();
        interaction.drag_event(&DragEvent::Enter { position: Point::new(100.0, 100.0) }, rect, false);
        assert!(interaction.begin_layer_drag(&canvas, 1).is_some());
        assert_eq!(interaction.dragging_layer_index(), Some(1));
    }

    #[test]
    fn test_hidden_elements_ignored() {
        let (mut canvas, _, anchor, mover) = setup();
        let mut interaction = Interaction::new();
        let assist = assist_all();

        canvas.widgets.set_visible(anchor, false);
        assert!(!interaction.pointer_down(&mut canvas, &assist, Point::new(200.0, 200.0)));
        assert!(!interaction.begin_element_drag(&mut canvas, &assist, anchor, Point::new(200.0, 200.0)));
        assert!(!canvas.is_selected(anchor));

        // The hidden anchor contributes no guidelines, so only the container's remain.
        assert!(interaction.pointer_down(&mut canvas, &assist, Point::new(100.0, 100.0)));
        let InteractionState::DraggingCanvasElement(drag) = interaction.state() else {
            panic!("expected a canvas drag");
        };
        assert_eq!(drag.guidelines.len(), 6);
        assert!(drag.guidelines.iter().all(|g| g.is_container()));
        assert_eq!(interaction.dragged_element(), Some(mover));
    }

    #[test]
    fn test_external_drop_yields_files() {
        let (canvas, _, _, _) = setup();
        let mut interaction = Interaction::new();
        let rect = canvas.container_rect();
        let file = DroppedFile {
            name: "a.png".to_string(),
            mime: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        };
        let drop = DragEvent::Drop {
            position: Point::new(10.0, 10.0),
            data: DragData::files(vec![file.clone()]),
        };

        // A drop without a preceding enter is not ours.
        assert_eq!(interaction.drag_event(&drop, rect, false), None);

        interaction.drag_event(&DragEvent::Enter { position: Point::new(5.0, 5.0) }, rect, false);
        assert_eq!(interaction.drag_event(&drop, rect, false), Some(vec![file]));
        assert!(interaction.is_idle());

        interaction.drag_event(&DragEvent::Enter { position: Point::new(5.0, 5.0) }, rect, false);
        let layer_drop = DragEvent::Drop {
            position: Point::new(10.0, 10.0),
            data: DragData::text(LayerTransfer::new(0).to_json().unwrap()),
        };
        assert_eq!(interaction.drag_event(&layer_drop, rect, false), None);
    }
}
