//! Raw pointer, drag and keyboard events fed into the editor.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Platform command modifier (Ctrl, or Cmd on macOS).
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer event in container coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    /// The pointer left the window or the window lost focus mid-gesture.
    Cancel,
}

impl PointerEvent {
    /// Pointer position, if the event carries one.
    pub fn position(&self) -> Option<Point> {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Move { position } => Some(*position),
            PointerEvent::Cancel => None,
        }
    }
}

/// A file carried by a native drag-and-drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedFile {
    pub name: String,
    /// MIME type reported by the platform (may be empty).
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Data attached to a drag: a text payload and/or files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragData {
    pub text: Option<String>,
    pub files: Vec<DroppedFile>,
}

impl DragData {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            files: Vec::new(),
        }
    }

    pub fn files(files: Vec<DroppedFile>) -> Self {
        Self { text: None, files }
    }
}

/// HTML5-style drag events over the canvas container.
#[derive(Debug, Clone, PartialEq)]
pub enum DragEvent {
    Enter { position: Point },
    Over { position: Point },
    Leave { position: Point },
    Drop { position: Point, data: DragData },
}

/// A key press with its modifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    /// Key name as reported by the platform ("z", "Delete", "Backspace", ...).
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyPress {
    pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
        }
    }

    /// Key name lowercased, so "Z" with shift matches "z".
    pub fn normalized_key(&self) -> String {
        self.key.to_lowercase()
    }
}
