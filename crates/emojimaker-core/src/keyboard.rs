//! Keyboard shortcut resolution and clipboard paste.

use thiserror::Error;

use crate::element::ImagePayload;
use crate::input::KeyPress;

/// Editor action triggered by a shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    Undo,
    Redo,
    Paste,
    DeleteSelected,
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    /// Requires the platform command modifier (Ctrl/Cmd).
    pub command: bool,
    /// Required Shift state (`None` = either).
    pub shift: Option<bool>,
    pub action: KeyAction,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        command: bool,
        shift: Option<bool>,
        action: KeyAction,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            command,
            shift,
            action,
            description,
        }
    }

    /// Check whether a key press triggers this shortcut.
    pub fn matches(&self, press: &KeyPress) -> bool {
        press.key.eq_ignore_ascii_case(self.key)
            && press.modifiers.command() == self.command
            && self.shift.is_none_or(|shift| press.modifiers.shift == shift)
    }

    /// Format the shortcut for display on the current platform
    /// (e.g., "Ctrl+Shift+Z", or "Cmd+Shift+Z" on macOS).
    pub fn format(&self) -> String {
        self.format_for(cfg!(target_os = "macos"))
    }

    /// Format the shortcut with the Cmd (`mac`) or Ctrl command label.
    pub fn format_for(&self, mac: bool) -> String {
        let mut parts = Vec::new();
        if self.command {
            parts.push(if mac { "Cmd" } else { "Ctrl" });
        }
        if self.shift == Some(true) {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("Z", true, Some(false), KeyAction::Undo, "Undo"),
            Shortcut::new("Z", true, Some(true), KeyAction::Redo, "Redo"),
            Shortcut::new("V", true, None, KeyAction::Paste, "Paste image or text"),
            Shortcut::new("Delete", false, None, KeyAction::DeleteSelected, "Delete selected element"),
            Shortcut::new("Backspace", false, None, KeyAction::DeleteSelected, "Delete selected element"),
        ]
    }

    /// Resolve a key press to an action.
    ///
    /// Nothing resolves while an element is being text-edited, and delete
    /// only resolves with a selection.
    pub fn resolve(press: &KeyPress, editing: bool, has_selection: bool) -> Option<KeyAction> {
        if editing {
            return None;
        }
        Self::all()
            .into_iter()
            .find(|shortcut| shortcut.matches(press))
            .map(|shortcut| shortcut.action)
            .filter(|action| *action != KeyAction::DeleteSelected || has_selection)
    }
}

/// One representation offered by the clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardItem {
    Image { mime: String, bytes: Vec<u8> },
    Text(String),
}

/// Clipboard read failures.
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Clipboard access denied")]
    Denied,
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),
}

/// Clipboard access provided by the platform layer.
pub trait Clipboard {
    fn read(&mut self) -> Result<Vec<ClipboardItem>, ClipboardError>;
}

/// Content chosen for a paste.
#[derive(Debug, Clone, PartialEq)]
pub enum PasteContent {
    Image(ImagePayload),
    Text(String),
}

/// Pick what to paste: the first decodable image, otherwise the first
/// non-blank text.
pub fn pick_paste(items: Vec<ClipboardItem>) -> Option<PasteContent> {
    let mut text = None;
    for item in items {
        match item {
            ClipboardItem::Image { mime, bytes } => match ImagePayload::from_bytes_with_mime(&mime, bytes) {
                Ok(payload) => return Some(PasteContent::Image(payload)),
                Err(e) => log::debug!("Skipping clipboard image ({}): {}", mime, e),
            },
            ClipboardItem::Text(s) if text.is_none() && !s.trim().is_empty() => text = Some(s),
            ClipboardItem::Text(_) => {}
        }
    }
    text.map(PasteContent::Text)
}

/// Read the clipboard and pick what to paste.
///
/// Access failures are treated as an empty clipboard.
pub fn read_paste(clipboard: &mut dyn Clipboard) -> Option<PasteContent> {
    match clipboard.read() {
        Ok(items) => pick_paste(items),
        Err(e) => {
            log::debug!("Nothing to paste: {}", e);
            None
        }
    }
}
