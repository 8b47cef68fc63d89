//! Element store and runtime canvas state.

use crate::element::{Element, ElementId};
use crate::widget::{WidgetManager, WidgetState};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Container size used until the presentation layer reports one.
pub const DEFAULT_CONTAINER_SIZE: Size = Size::new(400.0, 400.0);

/// The canonical ordered sequence of layer elements.
///
/// Sequence order is z-order: later elements are drawn on top.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementStore {
    elements: Vec<Element>,
}

impl ElementStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from an existing sequence.
    ///
    /// Later elements that reuse an earlier id are dropped.
    pub fn from_elements(elements: Vec<Element>) -> Self {
        let mut store = Self::new();
        store.replace_all(elements);
        store
    }

    /// All elements in z-order (back to front).
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Replace the whole sequence (used when applying history snapshots).
    pub fn replace_all(&mut self, elements: Vec<Element>) {
        self.elements.clear();
        for element in elements {
            if self.contains(element.id()) {
                log::warn!("Dropping element with duplicate id {}", element.id());
                continue;
            }
            self.elements.push(element);
        }
    }

    /// Append an element on top. Returns false if its id is already present.
    pub fn add(&mut self, element: Element) -> bool {
        if self.contains(element.id()) {
            return false;
        }
        self.elements.push(element);
        true
    }

    /// Remove an element.
    pub fn remove(&mut self, id: ElementId) -> Option<Element> {
        let index = self.index_of(id)?;
        Some(self.elements.remove(index))
    }

    /// Clear all elements.
    pub fn clear(&mut self) {
        self.elements.clear();
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.index_of(id).is_some()
    }

    /// Get the z-order index of an element.
    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id() == id)
    }

    /// Get an element by ID.
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id() == id)
    }

    /// Get a mutable reference to an element by ID.
    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id() == id)
    }

    /// Get an element by z-order index.
    pub fn get_at(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.elements.iter_mut()
    }

    /// Move the element at `from` so that it ends up at index `to`.
    /// Returns true if the order changed.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if from >= self.elements.len() || to >= self.elements.len() || from == to {
            return false;
        }
        let element = self.elements.remove(from);
        self.elements.insert(to, element);
        true
    }

    /// Bring an element to the front (topmost).
    /// Returns true if the element was moved.
    pub fn move_to_top(&mut self, id: ElementId) -> bool {
        match self.index_of(id) {
            Some(index) => self.reorder(index, self.elements.len() - 1),
            None => false,
        }
    }

    /// Send an element to the back (bottommost).
    /// Returns true if the element was moved.
    pub fn move_to_bottom(&mut self, id: ElementId) -> bool {
        match self.index_of(id) {
            Some(index) => self.reorder(index, 0),
            None => false,
        }
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Get the number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Serialize the sequence to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize a well-formed sequence from JSON.
    ///
    /// For untrusted input use [`crate::storage::recover_elements`], which
    /// drops bad entries instead of failing.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let elements: Vec<Element> = serde_json::from_str(json)?;
        Ok(Self::from_elements(elements))
    }
}

/// Runtime canvas state: the element store plus container geometry and
/// session-only widget state (not persisted).
#[derive(Debug, Clone)]
pub struct Canvas {
    /// The elements being composed.
    pub store: ElementStore,
    /// Container (canvas) size in pixels.
    pub container: Size,
    /// Widget manager for UI state (selection, editing, visibility).
    pub widgets: WidgetManager,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    /// Create a new canvas with an empty store.
    pub fn new() -> Self {
        Self::with_store(ElementStore::new())
    }

    /// Create a canvas with an existing store.
    pub fn with_store(store: ElementStore) -> Self {
        Self {
            store,
            container: DEFAULT_CONTAINER_SIZE,
            widgets: WidgetManager::new(),
        }
    }

    /// Set the container size.
    pub fn set_container_size(&mut self, width: f64, height: f64) {
        self.container = Size::new(width, height);
    }

    /// Container rectangle in container coordinates.
    pub fn container_rect(&self) -> Rect {
        self.container.to_rect()
    }

    /// Elements currently shown on the canvas, bottom to top.
    pub fn visible_elements(&self) -> impl Iterator<Item = &Element> {
        self.store
            .elements()
            .iter()
            .filter(|e| self.widgets.is_visible(e.id()))
    }

    /// Find the topmost visible element at a container point.
    pub fn element_at(&self, point: Point) -> Option<ElementId> {
        self.store
            .elements()
            .iter()
            .rev()
            .filter(|e| self.widgets.is_visible(e.id()))
            .find(|e| e.hit_test(point, self.container))
            .map(|e| e.id())
    }

    /// Select an element (clears previous selection).
    pub fn select(&mut self, id: ElementId) {
        if self.store.contains(id) {
            self.widgets.select(id);
        }
    }

    /// Clear selection.
    pub fn clear_selection(&mut self) {
        self.widgets.clear_selection();
    }

    /// Get the selected element ID (if any).
    pub fn selected(&self) -> Option<ElementId> {
        self.widgets.selected()
    }

    /// Get the selected element (if any).
    pub fn selected_element(&self) -> Option<&Element> {
        self.selected().and_then(|id| self.store.get(id))
    }

    /// Check if an element is selected.
    pub fn is_selected(&self, id: ElementId) -> bool {
        self.widgets.is_selected(id)
    }

    /// Enter text editing mode for a text element.
    /// Returns false for unknown ids and image elements.
    pub fn enter_text_editing(&mut self, id: ElementId) -> bool {
        match self.store.get(id) {
            Some(element) if element.is_text() => {
                self.widgets.enter_editing(id);
                true
            }
            _ => false,
        }
    }

    /// Exit text editing mode.
    pub fn exit_text_editing(&mut self) {
        self.widgets.exit_editing();
    }

    /// Get the element currently being edited (if any).
    pub fn editing_element(&self) -> Option<ElementId> {
        self.widgets.editing()
    }

    /// Check if an element is being edited.
    pub fn is_editing(&self, id: ElementId) -> bool {
        self.widgets.is_editing_element(id)
    }

    /// Get widget state for an element.
    pub fn widget_state(&self, id: ElementId) -> WidgetState {
        self.widgets.state(id)
    }

    /// Remove an element from the canvas.
    pub fn remove_element(&mut self, id: ElementId) -> Option<Element> {
        self.widgets.remove(id);
        self.store.remove(id)
    }

    /// Delete the selected element.
    pub fn delete_selected(&mut self) -> Option<Element> {
        let id = self.selected()?;
        self.remove_element(id)
    }

    /// Center an element in the container.
    pub fn move_to_center(&mut self, id: ElementId) -> bool {
        let center = self.container_rect().center();
        match self.store.get_mut(id) {
            Some(element) => {
                element.geometry.set_center(center);
                true
            }
            None => false,
        }
    }

    /// Recompute the cached center of one element.
    pub fn refresh_initial_center(&mut self, id: ElementId) {
        let container = self.container;
        if let Some(element) = self.store.get_mut(id) {
            element.refresh_initial_center(container);
        }
    }

    /// Recompute the cached centers of all elements.
    pub fn refresh_initial_centers(&mut self) {
        let container = self.container;
        for element in self.store.iter_mut() {
            element.refresh_initial_center(container);
        }
    }

    /// Replace the sequence with a history snapshot, dropping widget state of
    /// elements that no longer exist.
    pub fn apply_snapshot(&mut self, elements: Vec<Element>) {
        self.store.replace_all(elements);
        let store = &self.store;
        self.widgets.retain(|id| store.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;

    fn boxed(center: (f64, f64)) -> Element {
        Element::text("x")
            .with_size(100.0, 100.0)
            .with_center(Point::new(center.0, center.1))
    }

    #[test]
    fn test_store_creation() {
        let store = ElementStore::new();
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_element() {
        let mut store = ElementStore::new();
        let element = Element::text("hello");
        let id = element.id();

        assert!(store.add(element.clone()));
        assert_eq!(store.len(), 1);
        assert!(store.get(id).is_some());
        // Ids stay unique
        assert!(!store.add(element));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_element() {
        let mut store = ElementStore::new();
        let element = Element::text("hello");
        let id = element.id();

        store.add(element);
        let removed = store.remove(id);

        assert!(removed.is_some());
        assert!(store.is_empty());
        assert!(store.remove(id).is_none());
    }

    #[test]
    fn test_z_order() {
        let mut store = ElementStore::new();
        let a = Element::text("a");
        let b = Element::text("b");
        let c = Element::text("c");
        let (id_a, id_b, id_c) = (a.id(), b.id(), c.id());
        store.add(a);
        store.add(b);
        store.add(c);

        assert!(store.move_to_top(id_a));
        assert_eq!(store.index_of(id_a), Some(2));
        assert!(!store.move_to_top(id_a));

        assert!(store.move_to_bottom(id_a));
        assert_eq!(store.index_of(id_a), Some(0));
        assert_eq!(store.index_of(id_b), Some(1));
        assert_eq!(store.index_of(id_c), Some(2));
    }

    #[test]
    fn test_reorder_bounds() {
        let mut store = ElementStore::new();
        store.add(Element::text("a"));
        store.add(Element::text("b"));

        assert!(!store.reorder(0, 0));
        assert!(!store.reorder(0, 5));
        assert!(store.reorder(1, 0));
        assert_eq!(store.get_at(0).map(|e| e.content.as_str()), Some("b"));
    }

    #[test]
    fn test_element_at_prefers_topmost() {
        let mut canvas = Canvas::new();
        let back = boxed((100.0, 100.0));
        let front = boxed((150.0, 150.0));
        let (back_id, front_id) = (back.id(), front.id());
        canvas.store.add(back);
        canvas.store.add(front);

        assert_eq!(canvas.element_at(Point::new(125.0, 125.0)), Some(front_id));
        assert_eq!(canvas.element_at(Point::new(60.0, 60.0)), Some(back_id));
        assert_eq!(canvas.element_at(Point::new(390.0, 10.0)), None);
    }

    #[test]
    fn test_element_at_skips_hidden() {
        let mut canvas = Canvas::new();
        let back = boxed((100.0, 100.0));
        let front = boxed((150.0, 150.0));
        let (back_id, front_id) = (back.id(), front.id());
        canvas.store.add(back);
        canvas.store.add(front);

        canvas.widgets.set_visible(front_id, false);
        assert_eq!(canvas.element_at(Point::new(125.0, 125.0)), Some(back_id));
        assert_eq!(canvas.element_at(Point::new(190.0, 190.0)), None);
        assert_eq!(canvas.visible_elements().count(), 1);

        canvas.widgets.set_visible(front_id, true);
        assert_eq!(canvas.element_at(Point::new(125.0, 125.0)), Some(front_id));
    }

    #[test]
    fn test_json_roundtrip_drops_duplicates() {
        let element = Element::text("dup");
        let json = serde_json::to_string(&vec![element.clone(), element]).unwrap();
        let store = ElementStore::from_json(&json).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.to_json().unwrap(), serde_json::to_string(store.elements()).unwrap());
    }

    #[test]
    fn test_canvas_selection() {
        let mut canvas = Canvas::new();
        let element = Element::text("hi");
        let id = element.id();
        canvas.store.add(element);

        assert!(!canvas.is_selected(id));
        canvas.select(id);
        assert!(canvas.is_selected(id));
        canvas.clear_selection();
        assert!(!canvas.is_selected(id));
    }

    #[test]
    fn test_only_text_can_be_edited() {
        let mut canvas = Canvas::new();
        let text = Element::text("hi");
        let image = Element::new(crate::element::ElementKind::Image, "data:image/png;base64,");
        let (text_id, image_id) = (text.id(), image.id());
        canvas.store.add(text);
        canvas.store.add(image);

        assert!(canvas.enter_text_editing(text_id));
        assert!(canvas.is_editing(text_id));
        assert!(!canvas.enter_text_editing(image_id));
        assert_eq!(canvas.editing_element(), Some(text_id));
    }

    #[test]
    fn test_delete_selected() {
        let mut canvas = Canvas::new();
        let element = Element::text("hi");
        let id = element.id();

        canvas.store.add(element);
        canvas.select(id);
        assert!(canvas.delete_selected().is_some());

        assert!(canvas.store.is_empty());
        assert!(canvas.selected().is_none());
        assert!(canvas.delete_selected().is_none());
    }

    #[test]
    fn test_move_to_center() {
        let mut canvas = Canvas::new();
        canvas.set_container_size(600.0, 300.0);
        let element = boxed((10.0, 10.0));
        let id = element.id();
        canvas.store.add(element);

        assert!(canvas.move_to_center(id));
        canvas.refresh_initial_center(id);
        assert_eq!(
            canvas.store.get(id).unwrap().initial_center,
            Point::new(300.0, 150.0)
        );
    }

    #[test]
    fn test_apply_snapshot_prunes_selection() {
        let mut canvas = Canvas::new();
        let element = Element::text("hi");
        let id = element.id();
        canvas.store.add(element);
        canvas.select(id);

        canvas.apply_snapshot(Vec::new());
        assert!(canvas.selected().is_none());
    }
}
