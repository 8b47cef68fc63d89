//! Editor services wired together.
//!
//! The editor owns the canvas, history, alignment settings, gesture state,
//! export pipeline and settings persistence. Every committed mutation
//! re-caches element centers, commits to history and saves the sequence.

use std::sync::Arc;

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

use kurbo::Size;

use crate::canvas::{Canvas, ElementStore};
use crate::element::{Element, ElementId, ImageFormat, ImagePayload, PayloadError, VisualStyle};
use crate::export::{ExportArtifact, ExportPipeline, ExportResult, ExportSettingsUpdate, RenderSurface, SceneView};
use crate::history::History;
use crate::input::{DragEvent, DroppedFile, MouseButton, PointerEvent, KeyPress};
use crate::interaction::{Interaction, LayerTransfer};
use crate::keyboard::{Clipboard, KeyAction, PasteContent, ShortcutRegistry, read_paste};
use crate::language::Language;
use crate::snap::AssistSettings;
use crate::storage::{SettingsManager, Storage};

/// The emoji composer: canvas, history, alignment, gestures and export.
pub struct Editor<S: Storage> {
    canvas: Canvas,
    history: History,
    assist: AssistSettings,
    interaction: Interaction,
    export: ExportPipeline,
    language: Language,
    settings: SettingsManager<S>,
}

impl<S: Storage> Editor<S> {
    /// Load persisted state and initialize history with it.
    pub fn boot(storage: Arc<S>) -> Self {
        let settings = SettingsManager::new(storage);
        let elements = settings.load_elements();
        let assist = settings.load_assist();
        let language = settings.load_language();

        let canvas = Canvas::with_store(ElementStore::from_elements(elements));
        let mut history = History::new();
        history.initialize(canvas.store.elements());

        log::info!(
            "Editor ready: {} elements, language {}, guidelines {}, snapping {}",
            canvas.store.len(),
            language.code(),
            assist.show_guidelines,
            assist.enable_snapping
        );

        Self {
            canvas,
            history,
            assist,
            interaction: Interaction::new(),
            export: ExportPipeline::new(),
            language,
            settings,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn elements(&self) -> &[Element] {
        self.canvas.store.elements()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn assist(&self) -> &AssistSettings {
        &self.assist
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn export(&self) -> &ExportPipeline {
        &self.export
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn settings(&self) -> &SettingsManager<S> {
        &self.settings
    }

    /// Record the current sequence: re-cache centers, commit, save.
    /// Returns true if a history snapshot was recorded.
    fn record(&mut self) -> bool {
        self.canvas.refresh_initial_centers();
        let committed = self.history.commit(self.canvas.store.elements());
        if committed {
            self.save();
        }
        committed
    }

    fn save(&self) {
        if let Err(e) = self.settings.save_elements(self.canvas.store.elements()) {
            log::warn!("Failed to save elements: {}", e);
        }
    }

    /// Set the container size reported by the presentation layer.
    pub fn set_container_size(&mut self, width: f64, height: f64) {
        self.canvas.set_container_size(width, height);
    }

    pub fn container_size(&self) -> Size {
        self.canvas.container
    }

    /// Report the laid-out size of an element (not recorded in history).
    pub fn set_measured_size(&mut self, id: ElementId, size: Size) {
        if let Some(element) = self.canvas.store.get_mut(id) {
            element.set_measured_size(size);
        }
    }

    // --- Element CRUD ---

    /// Append an element on top and select it.
    pub fn add_element(&mut self, element: Element) -> Option<ElementId> {
        let id = element.id();
        if self.canvas.store.contains(id) {
            log::warn!("Element {} already exists", id);
            return None;
        }
        self.finish_text_editing(None);
        self.canvas.store.add(element);
        self.canvas.select(id);
        self.record();
        Some(id)
    }

    /// Add a text element with the default text style.
    pub fn add_text(&mut self, content: impl Into<String>) -> Option<ElementId> {
        self.add_element(Element::text(content))
    }

    /// Add an image element at the default width.
    pub fn add_image(&mut self, payload: &ImagePayload) -> Option<ElementId> {
        self.add_element(Element::image(payload))
    }

    /// Add an image element from a data URL.
    pub fn add_image_data_url(&mut self, url: &str) -> Result<Option<ElementId>, PayloadError> {
        let payload = ImagePayload::from_data_url(url)?;
        Ok(self.add_image(&payload))
    }

    pub fn delete_element(&mut self, id: ElementId) -> bool {
        if self.canvas.remove_element(id).is_none() {
            return false;
        }
        self.record();
        true
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.canvas.selected() {
            Some(id) => self.delete_element(id),
            None => false,
        }
    }

    /// Remove every element.
    pub fn clear(&mut self) -> bool {
        if self.canvas.store.is_empty() {
            return false;
        }
        let ids: Vec<ElementId> = self.canvas.store.elements().iter().map(|e| e.id()).collect();
        for id in ids {
            self.canvas.remove_element(id);
        }
        self.record()
    }

    /// Apply an edit to one element and record it.
    pub fn update_element(&mut self, id: ElementId, edit: impl FnOnce(&mut Element)) -> bool {
        let Some(element) = self.canvas.store.get_mut(id) else {
            return false;
        };
        edit(element);
        element.invalidate_measurement();
        element.geometry.sanitize();
        element.style.sanitize();
        self.record()
    }

    pub fn update_content(&mut self, id: ElementId, content: impl Into<String>) -> bool {
        let content = content.into();
        self.update_element(id, |e| e.content = content)
    }

    pub fn update_style(&mut self, id: ElementId, style: VisualStyle) -> bool {
        self.update_element(id, |e| e.style = style)
    }

    /// Set rotation in degrees.
    pub fn set_rotation(&mut self, id: ElementId, degrees: f64) -> bool {
        self.update_element(id, |e| e.geometry.rotation = degrees)
    }

    /// Set explicit dimensions (`None` = sized by content).
    pub fn set_size(&mut self, id: ElementId, width: Option<f64>, height: Option<f64>) -> bool {
        self.update_element(id, |e| {
            e.geometry.width = width;
            e.geometry.height = height;
        })
    }

    pub fn move_to_top(&mut self, id: ElementId) -> bool {
        self.canvas.store.move_to_top(id) && self.record()
    }

    pub fn move_to_bottom(&mut self, id: ElementId) -> bool {
        self.canvas.store.move_to_bottom(id) && self.record()
    }

    pub fn move_to_center(&mut self, id: ElementId) -> bool {
        self.canvas.move_to_center(id) && self.record()
    }

    /// Show or hide an element on the canvas (session only).
    pub fn set_visible(&mut self, id: ElementId, visible: bool) {
        self.canvas.widgets.set_visible(id, visible);
    }

    pub fn select(&mut self, id: ElementId) {
        if self.canvas.store.contains(id) {
            self.finish_text_editing(Some(id));
            self.canvas.select(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.finish_text_editing(None);
        self.canvas.clear_selection();
    }

    // --- Text editing ---

    /// Enter text editing for a text element. Rejected mid-gesture.
    pub fn enter_text_editing(&mut self, id: ElementId) -> bool {
        let editable = self.canvas.store.get(id).is_some_and(|e| e.is_text());
        if !self.interaction.is_idle() || !editable {
            return false;
        }
        self.finish_text_editing(Some(id));
        self.canvas.enter_text_editing(id)
    }

    /// Replace the text of the element being edited without recording.
    pub fn edit_text(&mut self, content: impl Into<String>) -> bool {
        let Some(id) = self.canvas.editing_element() else {
            return false;
        };
        match self.canvas.store.get_mut(id) {
            Some(element) => {
                element.content = content.into();
                element.invalidate_measurement();
                true
            }
            None => false,
        }
    }

    /// Leave text editing, recording the edited text.
    pub fn exit_text_editing(&mut self) -> bool {
        if self.canvas.editing_element().is_none() {
            return false;
        }
        self.canvas.exit_text_editing();
        self.record()
    }

    /// Leave text editing before the selection moves away from the edited
    /// element, so the edit is recorded. `keep` is the element about to be
    /// selected.
    fn finish_text_editing(&mut self, keep: Option<ElementId>) {
        match self.canvas.editing_element() {
            Some(id) if Some(id) != keep => {
                self.exit_text_editing();
            }
            _ => {}
        }
    }

    // --- History ---

    pub fn undo(&mut self) -> bool {
        self.end_gesture();
        match self.history.undo() {
            Some(elements) => {
                self.apply_snapshot(elements);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        self.end_gesture();
        match self.history.redo() {
            Some(elements) => {
                self.apply_snapshot(elements);
                true
            }
            None => false,
        }
    }

    /// Finalize any gesture or text edit so its result is in history before
    /// replaying.
    fn end_gesture(&mut self) {
        self.finish_text_editing(None);
        if !self.interaction.is_idle() {
            self.finish(|interaction, canvas, history| interaction.cancel(canvas, history));
        }
    }

    fn apply_snapshot(&mut self, elements: Vec<Element>) {
        self.canvas.apply_snapshot(elements);
        self.interaction.clear_guidelines();
        self.save();
    }

    // --- Alignment assist ---

    /// Toggle guidelines; hiding them also disables snapping.
    pub fn toggle_guidelines(&mut self) {
        self.assist.toggle_guidelines();
        if !self.assist.show_guidelines {
            self.interaction.clear_guidelines();
        }
        self.save_assist();
    }

    /// Toggle snapping; enabling it also shows guidelines.
    pub fn toggle_snapping(&mut self) {
        self.assist.toggle_snapping();
        self.save_assist();
    }

    pub fn toggle_other_boundaries(&mut self) {
        self.assist.toggle_other_boundaries();
        self.save_assist();
    }

    fn save_assist(&self) {
        if let Err(e) = self.settings.save_assist(&self.assist) {
            log::warn!("Failed to save alignment settings: {}", e);
        }
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        if let Err(e) = self.settings.save_language(language) {
            log::warn!("Failed to save language: {}", e);
        }
    }

    // --- Pointer gestures ---

    /// Feed a canvas pointer event. Returns true if the canvas changed.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        match event {
            PointerEvent::Down {
                position,
                button: MouseButton::Left,
            } => {
                let hit = self.canvas.element_at(position);
                self.finish_text_editing(hit);
                if self.interaction.pointer_down(&mut self.canvas, &self.assist, position) {
                    return true;
                }
                if self.interaction.is_idle() && hit.is_none() {
                    self.canvas.clear_selection();
                }
                false
            }
            PointerEvent::Down { .. } => false,
            PointerEvent::Move { position } => {
                self.interaction.pointer_move(&mut self.canvas, &self.assist, position)
            }
            PointerEvent::Up { .. } => self.finish(|interaction, canvas, history| {
                interaction.pointer_up(canvas, history)
            }),
            PointerEvent::Cancel => self.finish(|interaction, canvas, history| {
                interaction.cancel(canvas, history)
            }),
        }
    }

    fn finish(&mut self, end: impl FnOnce(&mut Interaction, &mut Canvas, &mut History) -> bool) -> bool {
        let committed = end(&mut self.interaction, &mut self.canvas, &mut self.history);
        if committed {
            self.save();
        }
        committed
    }

    // --- Layer list ---

    /// Start dragging a layer-list entry; returns the payload to attach.
    pub fn begin_layer_drag(&mut self, index: usize) -> Option<LayerTransfer> {
        self.interaction.begin_layer_drag(&self.canvas, index)
    }

    /// Drop the dragged layer entry at `target_index`.
    pub fn layer_drop(&mut self, target_index: usize) -> bool {
        self.finish(|interaction, canvas, history| interaction.layer_drop(canvas, history, target_index))
    }

    pub fn layer_drag_end(&mut self) {
        self.interaction.layer_drag_end();
    }

    // --- External drops ---

    /// Feed a native drag event over the canvas. Dropped images are added;
    /// returns the ids of the new elements.
    ///
    /// `confirm_open` reports a confirmation dialog owned by the caller; the
    /// export dialog is tracked here.
    pub fn handle_drag(&mut self, event: &DragEvent, confirm_open: bool) -> Vec<ElementId> {
        let modal_open = confirm_open || self.export.is_dialog_visible();
        let container = self.canvas.container_rect();
        let Some(files) = self.interaction.drag_event(event, container, modal_open) else {
            return Vec::new();
        };

        let mut added = Vec::new();
        for file in &files {
            match payload_from_file(file) {
                Ok(payload) => {
                    log::info!("Dropped image: {} ({:?})", file.name, payload.format);
                    added.extend(self.add_image(&payload));
                }
                Err(e) => log::warn!("Ignoring dropped file {}: {}", file.name, e),
            }
        }
        added
    }

    // --- Keyboard ---

    /// Resolve and apply a key press. Returns the applied action.
    pub fn handle_key(&mut self, press: &KeyPress, clipboard: &mut dyn Clipboard) -> Option<KeyAction> {
        let editing = self.canvas.editing_element().is_some();
        let action = ShortcutRegistry::resolve(press, editing, self.canvas.selected().is_some())?;
        match action {
            KeyAction::Undo => {
                self.undo();
            }
            KeyAction::Redo => {
                self.redo();
            }
            KeyAction::Paste => {
                self.paste(clipboard);
            }
            KeyAction::DeleteSelected => {
                self.delete_selected();
            }
        }
        Some(action)
    }

    /// Paste clipboard content as a new element.
    pub fn paste(&mut self, clipboard: &mut dyn Clipboard) -> Option<ElementId> {
        match read_paste(clipboard)? {
            PasteContent::Image(payload) => self.add_image(&payload),
            PasteContent::Text(text) => self.add_text(text),
        }
    }

    // --- Export ---

    /// Current scene as displayed, including interaction affordances.
    pub fn scene_view(&self) -> SceneView {
        SceneView::capture(
            &self.canvas,
            self.interaction.active_guidelines(),
            self.assist.show_other_boundaries,
        )
    }

    pub fn show_export_dialog(&mut self) {
        self.export.show_dialog(Instant::now());
    }

    pub fn hide_export_dialog(&mut self) {
        self.export.hide_dialog();
    }

    pub fn update_export_settings(&mut self, update: ExportSettingsUpdate) {
        self.export.update_settings(update, Instant::now());
    }

    /// Refresh the export preview once the debounce delay has passed.
    pub fn poll_export_preview(&mut self, surface: &mut dyn RenderSurface) -> bool {
        let scene = self.scene_view();
        self.export.poll_preview(Instant::now(), surface, &scene)
    }

    pub fn export_image(&mut self, surface: &mut dyn RenderSurface) -> ExportResult<ExportArtifact> {
        let scene = self.scene_view();
        self.export.export(surface, &scene)
    }
}

/// Decode a dropped file: declared MIME type, then magic bytes, then extension.
fn payload_from_file(file: &DroppedFile) -> Result<ImagePayload, PayloadError> {
    ImagePayload::from_bytes_with_mime(&file.mime, file.bytes.clone()).or_else(|e| {
        let format = file
            .name
            .rsplit_once('.')
            .and_then(|(_, ext)| ImageFormat::from_extension(ext))
            .ok_or(e)?;
        Ok(ImagePayload {
            format,
            bytes: file.bytes.clone(),
        })
    })
}
