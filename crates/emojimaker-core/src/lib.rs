//! Emoji Maker Core Library
//!
//! Platform-agnostic element model, undo history, alignment engine and
//! interaction state machine for the emoji composer.

pub mod canvas;
pub mod editor;
pub mod element;
pub mod export;
pub mod history;
pub mod input;
pub mod interaction;
pub mod keyboard;
pub mod language;
pub mod snap;
pub mod storage;
pub mod widget;

pub use canvas::{Canvas, ElementStore};
pub use editor::Editor;
pub use element::{Element, ElementId, ElementKind, Geometry, ImageFormat, ImagePayload, Length, VisualStyle};
pub use export::{ExportPipeline, ExportSettings, RenderSurface, SceneView};
pub use history::{History, MAX_HISTORY};
pub use input::{DragEvent, KeyPress, Modifiers, MouseButton, PointerEvent};
pub use interaction::{Interaction, InteractionState, LayerTransfer};
pub use keyboard::{Clipboard, KeyAction, ShortcutRegistry};
pub use language::Language;
pub use snap::{AssistSettings, Axis, Guideline, SNAP_THRESHOLD, SnapResult, compute_guidelines, compute_snap};
pub use storage::{MemoryStorage, SettingsManager, Storage, StorageError};
pub use widget::{WidgetManager, WidgetState};
