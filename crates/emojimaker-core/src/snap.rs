//! Alignment guidelines and snapping for elements being dragged.

use crate::element::{Element, ElementId, SerializableColor};
use kurbo::{Rect, Size, Vec2};

/// Distance threshold for snapping (in container pixels).
pub const SNAP_THRESHOLD: f64 = 10.0;

/// Color of guidelines derived from the container.
pub const CONTAINER_GUIDELINE_COLOR: SerializableColor = SerializableColor::new(255, 0, 0, 255);

/// Color of guidelines derived from other elements.
pub const ELEMENT_GUIDELINE_COLOR: SerializableColor = SerializableColor::new(0, 168, 255, 255);

/// Orientation of a guideline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// A horizontal line at `y = position`; constrains vertical movement.
    Horizontal,
    /// A vertical line at `x = position`; constrains horizontal movement.
    Vertical,
}

/// Where a guideline comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuidelineSource {
    Container,
    Element(ElementId),
}

/// A candidate alignment line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Guideline {
    /// Pixel offset along the axis it constrains.
    pub position: f64,
    pub axis: Axis,
    pub color: SerializableColor,
    pub source: GuidelineSource,
}

impl Guideline {
    fn container(position: f64, axis: Axis) -> Self {
        Self {
            position,
            axis,
            color: CONTAINER_GUIDELINE_COLOR,
            source: GuidelineSource::Container,
        }
    }

    fn element(position: f64, axis: Axis, id: ElementId) -> Self {
        Self {
            position,
            axis,
            color: ELEMENT_GUIDELINE_COLOR,
            source: GuidelineSource::Element(id),
        }
    }

    pub fn is_container(&self) -> bool {
        self.source == GuidelineSource::Container
    }
}

/// Leading edge, center and trailing edge of a box along an axis.
fn features(bounds: Rect, axis: Axis) -> [f64; 3] {
    match axis {
        Axis::Vertical => [bounds.x0, bounds.center().x, bounds.x1],
        Axis::Horizontal => [bounds.y0, bounds.center().y, bounds.y1],
    }
}

fn push_box_guidelines(out: &mut Vec<Guideline>, bounds: Rect, make: impl Fn(f64, Axis) -> Guideline) {
    for axis in [Axis::Vertical, Axis::Horizontal] {
        for position in features(bounds, axis) {
            out.push(make(position, axis));
        }
    }
}

/// Collect candidate guidelines: the container's edges and center lines
/// first, then the edges and center lines of every element except `excluding`.
///
/// Element boxes are placed at their cached `initial_center`. A zero-sized
/// element contributes coincident guidelines.
pub fn compute_guidelines<'a>(
    container: Size,
    elements: impl IntoIterator<Item = &'a Element>,
    excluding: Option<ElementId>,
) -> Vec<Guideline> {
    let elements = elements.into_iter();
    let mut guidelines = Vec::with_capacity(6 * (elements.size_hint().0 + 1));

    push_box_guidelines(&mut guidelines, container.to_rect(), Guideline::container);

    for element in elements {
        let id = element.id();
        if Some(id) == excluding {
            continue;
        }
        push_box_guidelines(&mut guidelines, element.alignment_bounds(), |position, axis| {
            Guideline::element(position, axis, id)
        });
    }

    guidelines
}

/// Snap outcome along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisSnap {
    pub axis: Axis,
    pub snapped: bool,
    /// Position of the guideline snapped to (meaningless when not snapped).
    pub target_position: f64,
    /// Correction to apply along the axis (zero when not snapped).
    pub offset: f64,
    /// The guideline snapped to.
    pub guideline: Option<Guideline>,
}

impl AxisSnap {
    /// Create a result with no snapping.
    pub fn none(axis: Axis) -> Self {
        Self {
            axis,
            snapped: false,
            target_position: 0.0,
            offset: 0.0,
            guideline: None,
        }
    }

    /// Distance moved by the correction.
    pub fn distance(&self) -> f64 {
        self.offset.abs()
    }
}

/// Result of a snap query for a moving box.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapResult {
    /// Snap along x, against vertical guidelines.
    pub vertical: AxisSnap,
    /// Snap along y, against horizontal guidelines.
    pub horizontal: AxisSnap,
    /// Guidelines within the threshold of the moving box, for highlighting.
    pub active: Vec<Guideline>,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none() -> Self {
        Self {
            vertical: AxisSnap::none(Axis::Vertical),
            horizontal: AxisSnap::none(Axis::Horizontal),
            active: Vec::new(),
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.vertical.snapped || self.horizontal.snapped
    }

    /// Position correction for the moving box.
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.vertical.offset, self.horizontal.offset)
    }

    /// Apply the correction to a box.
    pub fn apply(&self, bounds: Rect) -> Rect {
        bounds + self.offset()
    }
}

fn snap_axis(bounds: Rect, axis: Axis, guidelines: &[Guideline], threshold: f64) -> AxisSnap {
    let mut best: Option<(f64, &Guideline)> = None;

    for guideline in guidelines.iter().filter(|g| g.axis == axis) {
        for feature in features(bounds, axis) {
            let offset = guideline.position - feature;
            if offset.abs() > threshold {
                continue;
            }
            let better = match best {
                None => true,
                Some((best_offset, best_guideline)) => {
                    let (d, best_d) = (offset.abs(), best_offset.abs());
                    // Nearest wins; on a tie the container beats an element.
                    d < best_d
                        || (d == best_d && guideline.is_container() && !best_guideline.is_container())
                }
            };
            if better {
                best = Some((offset, guideline));
            }
        }
    }

    match best {
        Some((offset, guideline)) => AxisSnap {
            axis,
            snapped: true,
            target_position: guideline.position,
            offset,
            guideline: Some(*guideline),
        },
        None => AxisSnap::none(axis),
    }
}

/// Find, per axis, the nearest guideline within `threshold` of the moving
/// box's leading edge, center or trailing edge.
///
/// At most one guideline is snapped to per axis. An empty guideline set
/// never snaps.
pub fn compute_snap(moving: Rect, guidelines: &[Guideline], threshold: f64) -> SnapResult {
    let vertical = snap_axis(moving, Axis::Vertical, guidelines, threshold);
    let horizontal = snap_axis(moving, Axis::Horizontal, guidelines, threshold);

    let active = guidelines
        .iter()
        .filter(|g| {
            features(moving, g.axis)
                .iter()
                .any(|f| (g.position - f).abs() <= threshold)
        })
        .copied()
        .collect();

    SnapResult {
        vertical,
        horizontal,
        active,
    }
}

/// User-facing alignment assist switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssistSettings {
    /// Draw guidelines while dragging.
    pub show_guidelines: bool,
    /// Snap dragged elements to guidelines.
    pub enable_snapping: bool,
    /// Outline the elements that are not selected.
    pub show_other_boundaries: bool,
}

impl AssistSettings {
    /// Toggle guideline display. Hiding guidelines also disables snapping.
    pub fn toggle_guidelines(&mut self) {
        self.show_guidelines = !self.show_guidelines;
        if !self.show_guidelines {
            self.enable_snapping = false;
        }
    }

    /// Toggle snapping. Enabling snapping also shows guidelines.
    pub fn toggle_snapping(&mut self) {
        self.enable_snapping = !self.enable_snapping;
        if self.enable_snapping {
            self.show_guidelines = true;
        }
    }

    pub fn toggle_other_boundaries(&mut self) {
        self.show_other_boundaries = !self.show_other_boundaries;
    }

    /// Whether the alignment engine needs to run at all.
    pub fn alignment_enabled(&self) -> bool {
        self.show_guidelines || self.enable_snapping
    }
}
