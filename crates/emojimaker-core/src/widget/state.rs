//! Widget state definitions.

/// The UI state of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetState {
    /// Normal display state - no interaction.
    #[default]
    Normal,
    /// Element is selected (shows its outline, can be dragged).
    Selected,
    /// Element text is being edited in place.
    Editing,
}

impl WidgetState {
    /// Check if element is selected (either just selected or editing).
    pub fn is_selected(&self) -> bool {
        matches!(self, Self::Selected | Self::Editing)
    }

    /// Check if element is in editing mode.
    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Editing)
    }
}
