//! Widget manager for tracking UI state of elements.

use std::collections::{HashMap, HashSet};

use super::state::WidgetState;
use crate::element::ElementId;

/// Manages UI state for all elements on the canvas.
///
/// At most one element is selected at a time, and only the selected
/// element can be in editing mode.
#[derive(Debug, Clone, Default)]
pub struct WidgetManager {
    /// UI state for each element that is not `Normal`.
    states: HashMap<ElementId, WidgetState>,
    /// Currently selected element.
    selected: Option<ElementId>,
    /// Elements hidden on the canvas.
    hidden: HashSet<ElementId>,
}

impl WidgetManager {
    /// Create a new widget manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the state of an element.
    pub fn state(&self, id: ElementId) -> WidgetState {
        self.states.get(&id).copied().unwrap_or_default()
    }

    fn set_state(&mut self, id: ElementId, state: WidgetState) {
        if state == WidgetState::Normal {
            self.states.remove(&id);
        } else {
            self.states.insert(id, state);
        }
    }

    /// Select a single element (clears the previous selection and any editing).
    pub fn select(&mut self, id: ElementId) {
        if self.selected == Some(id) {
            return;
        }
        self.clear_selection();
        self.selected = Some(id);
        self.set_state(id, WidgetState::Selected);
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        if let Some(id) = self.selected.take() {
            self.set_state(id, WidgetState::Normal);
        }
    }

    /// Get the selected element ID (if any).
    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    /// Check if an element is selected.
    pub fn is_selected(&self, id: ElementId) -> bool {
        self.selected == Some(id)
    }

    /// Enter editing mode for an element (selecting it).
    pub fn enter_editing(&mut self, id: ElementId) {
        self.select(id);
        self.set_state(id, WidgetState::Editing);
    }

    /// Exit editing mode, keeping the element selected.
    pub fn exit_editing(&mut self) {
        if let Some(id) = self.editing() {
            self.set_state(id, WidgetState::Selected);
        }
    }

    /// Get the element being edited (if any).
    pub fn editing(&self) -> Option<ElementId> {
        self.selected.filter(|&id| self.state(id).is_editing())
    }

    /// Check if currently in editing mode.
    pub fn is_editing(&self) -> bool {
        self.editing().is_some()
    }

    /// Check if a specific element is being edited.
    pub fn is_editing_element(&self, id: ElementId) -> bool {
        self.state(id).is_editing()
    }

    /// Show or hide an element on the canvas.
    pub fn set_visible(&mut self, id: ElementId, visible: bool) {
        if visible {
            self.hidden.remove(&id);
        } else {
            self.hidden.insert(id);
        }
    }

    pub fn is_visible(&self, id: ElementId) -> bool {
        !self.hidden.contains(&id)
    }

    /// Remove state for a deleted element.
    pub fn remove(&mut self, id: ElementId) {
        self.states.remove(&id);
        self.hidden.remove(&id);
        if self.selected == Some(id) {
            self.selected = None;
        }
    }

    /// Drop state for elements that no longer exist (after undo/redo).
    pub fn retain(&mut self, mut exists: impl FnMut(ElementId) -> bool) {
        self.states.retain(|&id, _| exists(id));
        self.hidden.retain(|&id| exists(id));
        if let Some(id) = self.selected {
            if !exists(id) {
                self.selected = None;
            }
        }
    }
}
