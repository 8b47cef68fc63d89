//! Layer elements placed on the canvas.

mod image;
mod style;

pub use image::{ImageFormat, ImagePayload, PayloadError};
pub use style::{BorderStyle, Padding, SerializableColor, VisualStyle};

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for elements, stable across history snapshots.
pub type ElementId = Uuid;

/// Center assumed for elements whose cached center was never computed.
pub const DEFAULT_INITIAL_CENTER: Point = Point::new(200.0, 200.0);

/// Display width given to newly added images.
pub const DEFAULT_IMAGE_WIDTH: f64 = 200.0;

/// Font size given to newly added or pasted text.
pub const DEFAULT_TEXT_FONT_SIZE: f64 = 24.0;

/// What an element displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    #[default]
    Text,
    Image,
}

/// A coordinate along one container axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "lowercase")]
pub enum Length {
    /// Absolute pixels from the container's leading edge.
    Px(f64),
    /// Percentage of the container extent.
    Percent(f64),
}

impl Length {
    /// Resolve to pixels for a container extent.
    pub fn resolve(self, extent: f64) -> f64 {
        match self {
            Length::Px(px) => px,
            Length::Percent(pct) => extent * pct / 100.0,
        }
    }
}

/// Placement of an element inside the container.
///
/// `left`/`top` locate the element's center (anchor = center).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    pub left: Length,
    pub top: Length,
    /// Rotation in degrees around the center.
    pub rotation: f64,
    /// Explicit width in pixels (`None` = sized by content).
    pub width: Option<f64>,
    /// Explicit height in pixels (`None` = sized by content).
    pub height: Option<f64>,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            left: Length::Percent(50.0),
            top: Length::Percent(50.0),
            rotation: 0.0,
            width: None,
            height: None,
        }
    }
}

impl Geometry {
    /// Center in container pixel coordinates.
    pub fn center_in(&self, container: Size) -> Point {
        Point::new(
            self.left.resolve(container.width),
            self.top.resolve(container.height),
        )
    }

    /// Pin the center to absolute container pixels.
    pub fn set_center(&mut self, center: Point) {
        self.left = Length::Px(center.x);
        self.top = Length::Px(center.y);
    }

    /// Replace non-finite values a malformed record may carry.
    pub fn sanitize(&mut self) {
        let finite = |len: Length| match len {
            Length::Px(v) if !v.is_finite() => Length::Percent(50.0),
            Length::Percent(v) if !v.is_finite() => Length::Percent(50.0),
            other => other,
        };
        self.left = finite(self.left);
        self.top = finite(self.top);
        if !self.rotation.is_finite() {
            self.rotation = 0.0;
        }
        self.width = self.width.filter(|w| w.is_finite() && *w >= 0.0);
        self.height = self.height.filter(|h| h.is_finite() && *h >= 0.0);
    }
}

/// A single positioned text or image layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub(crate) id: ElementId,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    /// Text string, or an image data URL.
    pub content: String,
    #[serde(default)]
    pub geometry: Geometry,
    #[serde(default)]
    pub style: VisualStyle,
    /// Absolute pixel center cached at the last commit; the position used for
    /// alignment comparisons.
    #[serde(default = "default_initial_center")]
    pub initial_center: Point,
    /// Layout size reported by the presentation layer.
    #[serde(skip)]
    measured_size: Option<Size>,
}

fn default_initial_center() -> Point {
    DEFAULT_INITIAL_CENTER
}

impl Element {
    /// Create a new element centered in the container.
    pub fn new(kind: ElementKind, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            content: content.into(),
            geometry: Geometry::default(),
            style: VisualStyle::default(),
            initial_center: DEFAULT_INITIAL_CENTER,
            measured_size: None,
        }
    }

    /// Create a text element with the default text size.
    pub fn text(content: impl Into<String>) -> Self {
        let mut element = Self::new(ElementKind::Text, content);
        element.style.font_size = DEFAULT_TEXT_FONT_SIZE;
        element
    }

    /// Create an image element from an encoded payload.
    pub fn image(payload: &ImagePayload) -> Self {
        let mut element = Self::new(ElementKind::Image, payload.to_data_url());
        element.geometry.width = Some(DEFAULT_IMAGE_WIDTH);
        element
    }

    /// Reconstruct an element with a specific ID (for storage recovery).
    pub(crate) fn reconstruct(
        id: ElementId,
        kind: ElementKind,
        content: String,
        geometry: Geometry,
        style: VisualStyle,
        initial_center: Point,
    ) -> Self {
        Self {
            id,
            kind,
            content,
            geometry,
            style,
            initial_center,
            measured_size: None,
        }
    }

    /// Get the unique identifier.
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn with_style(mut self, style: VisualStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.geometry.width = Some(width);
        self.geometry.height = Some(height);
        self
    }

    pub fn with_center(mut self, center: Point) -> Self {
        self.geometry.set_center(center);
        self.initial_center = center;
        self
    }

    pub fn is_text(&self) -> bool {
        self.kind == ElementKind::Text
    }

    pub fn is_image(&self) -> bool {
        self.kind == ElementKind::Image
    }

    /// Decode the image payload of an image element.
    pub fn image_payload(&self) -> Option<Result<ImagePayload, PayloadError>> {
        self.is_image()
            .then(|| ImagePayload::from_data_url(&self.content))
    }

    /// Record the size the presentation layer laid this element out at.
    pub fn set_measured_size(&mut self, size: Size) {
        self.measured_size = Some(size);
    }

    /// Forget the measured size (call when content or font changes).
    pub fn invalidate_measurement(&mut self) {
        self.measured_size = None;
    }

    pub fn measured_size(&self) -> Option<Size> {
        self.measured_size
    }

    /// Size of the element's box: explicit dimensions first, then the
    /// measured layout, then an estimate from the content.
    pub fn box_size(&self) -> Size {
        let estimate = self.estimated_size();
        let width = self
            .geometry
            .width
            .or(self.measured_size.map(|s| s.width))
            .unwrap_or(estimate.width);
        let height = self
            .geometry
            .height
            .or(self.measured_size.map(|s| s.height))
            .unwrap_or(estimate.height);
        Size::new(width, height)
    }

    /// Approximate size used before the presentation layer has measured the element.
    fn estimated_size(&self) -> Size {
        match self.kind {
            ElementKind::Text => {
                let font_size = self.style.font_size;
                let line_count = self.content.lines().count().max(1);
                let longest = self
                    .content
                    .lines()
                    .map(|line| line.chars().count())
                    .max()
                    .unwrap_or(0);
                Size::new(
                    longest as f64 * font_size * 0.6 + self.style.padding.horizontal(),
                    line_count as f64 * font_size * 1.2 + self.style.padding.vertical(),
                )
            }
            ElementKind::Image => {
                let width = self.geometry.width.unwrap_or(DEFAULT_IMAGE_WIDTH);
                Size::new(width, self.geometry.height.unwrap_or(width))
            }
        }
    }

    /// Live center in container pixels.
    pub fn center_in(&self, container: Size) -> Point {
        self.geometry.center_in(container)
    }

    /// Live bounding box in container pixels (rotation ignored).
    pub fn bounds_in(&self, container: Size) -> Rect {
        Rect::from_center_size(self.center_in(container), self.box_size())
    }

    /// Bounding box around the cached center, used for alignment.
    pub fn alignment_bounds(&self) -> Rect {
        Rect::from_center_size(self.initial_center, self.box_size())
    }

    /// Check if a container point hits this element.
    pub fn hit_test(&self, point: Point, container: Size) -> bool {
        self.bounds_in(container).contains(point)
    }

    /// Move the element's center by a pixel offset.
    pub fn translate(&mut self, delta: Vec2, container: Size) {
        let center = self.center_in(container);
        self.geometry.set_center(center + delta);
    }

    /// Recompute the cached center from the live geometry (rounded to whole pixels).
    pub fn refresh_initial_center(&mut self, container: Size) {
        let center = self.center_in(container);
        self.initial_center = Point::new(center.x.round(), center.y.round());
    }
}
