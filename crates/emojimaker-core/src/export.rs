//! Export configuration, preview and artifact production.
//!
//! Rasterization belongs to the presentation layer behind [`RenderSurface`];
//! this module owns the settings, the debounced preview descriptor and the
//! scene handed to the surface with interaction affordances stripped.

use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Instant, SystemTime, UNIX_EPOCH};
#[cfg(target_arch = "wasm32")]
use web_time::{Instant, SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use kurbo::Size;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::canvas::Canvas;
use crate::element::{Element, ElementId, ImageFormat, SerializableColor};
use crate::snap::Guideline;

/// Delay between the last settings change and the preview refresh.
pub const PREVIEW_DEBOUNCE: Duration = Duration::from_millis(300);

/// Bounding box the preview thumbnail is fitted into.
pub const THUMBNAIL_SIZE: u32 = 40;

/// Export errors.
#[derive(Debug, Error, PartialEq)]
pub enum ExportError {
    #[error("Render error: {0}")]
    Render(String),
    #[error("Encode error: {0}")]
    Encode(String),
    #[error("Nothing to export")]
    EmptyCanvas,
}

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Output resolution multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExportScale {
    #[serde(rename = "0.5")]
    Half,
    #[serde(rename = "1")]
    One,
    #[serde(rename = "1.5")]
    OneAndHalf,
    #[default]
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "8")]
    Eight,
}

impl ExportScale {
    pub fn factor(&self) -> f64 {
        match self {
            ExportScale::Half => 0.5,
            ExportScale::One => 1.0,
            ExportScale::OneAndHalf => 1.5,
            ExportScale::Two => 2.0,
            ExportScale::Three => 3.0,
            ExportScale::Four => 4.0,
            ExportScale::Six => 6.0,
            ExportScale::Eight => 8.0,
        }
    }

    pub fn all() -> &'static [ExportScale] {
        &[
            ExportScale::Half,
            ExportScale::One,
            ExportScale::OneAndHalf,
            ExportScale::Two,
            ExportScale::Three,
            ExportScale::Four,
            ExportScale::Six,
            ExportScale::Eight,
        ]
    }

    /// Look up a supported multiplier.
    pub fn from_factor(factor: f64) -> Option<Self> {
        Self::all().iter().copied().find(|s| s.factor() == factor)
    }
}

/// Background mode of the exported image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    #[default]
    Transparent,
    Color,
}

/// Export configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportSettings {
    pub format: ImageFormat,
    pub background: Background,
    /// Fill used when `background` is `Color`; remembered while transparent.
    pub background_color: SerializableColor,
    pub scale: ExportScale,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: ImageFormat::Png,
            background: Background::Transparent,
            background_color: SerializableColor::white(),
            scale: ExportScale::default(),
        }
    }
}

impl ExportSettings {
    /// Fill color to rasterize with, `None` for a transparent background.
    pub fn fill(&self) -> Option<SerializableColor> {
        match self.background {
            Background::Transparent => None,
            Background::Color => Some(self.background_color),
        }
    }

    /// Merge a partial update.
    pub fn apply(&mut self, update: ExportSettingsUpdate) {
        if let Some(format) = update.format {
            self.format = format;
        }
        if let Some(background) = update.background {
            self.background = background;
        }
        if let Some(color) = update.background_color {
            self.background_color = color;
        }
        if let Some(scale) = update.scale {
            self.scale = scale;
        }
    }
}

/// Partial export settings change.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExportSettingsUpdate {
    pub format: Option<ImageFormat>,
    pub background: Option<Background>,
    pub background_color: Option<SerializableColor>,
    pub scale: Option<ExportScale>,
}

/// Serializable view of the canvas handed to a render surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneView {
    /// Visible elements in z-order with their committed geometry and style.
    pub elements: Vec<Element>,
    pub container: Size,
    #[serde(skip)]
    pub selected: Option<ElementId>,
    #[serde(skip)]
    pub guidelines: Vec<Guideline>,
    /// Outline every element, not only the selected one.
    #[serde(skip)]
    pub show_other_boundaries: bool,
}

impl SceneView {
    /// Capture the canvas as currently displayed.
    pub fn capture(canvas: &Canvas, guidelines: &[Guideline], show_other_boundaries: bool) -> Self {
        Self {
            elements: canvas.visible_elements().cloned().collect(),
            container: canvas.container,
            selected: canvas.selected(),
            guidelines: guidelines.to_vec(),
            show_other_boundaries,
        }
    }

    /// Copy without selection outline, boundaries or guideline overlays.
    pub fn without_affordances(&self) -> Self {
        Self {
            elements: self.elements.clone(),
            container: self.container,
            selected: None,
            guidelines: Vec::new(),
            show_other_boundaries: false,
        }
    }

    pub fn has_affordances(&self) -> bool {
        self.selected.is_some() || !self.guidelines.is_empty() || self.show_other_boundaries
    }
}

/// Parameters for one rasterization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterRequest {
    pub format: ImageFormat,
    pub scale: f64,
    pub background: Option<SerializableColor>,
}

/// An encoded raster image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    /// Image bytes encoded in the requested format.
    pub encoded: Vec<u8>,
}

/// Rasterizes a scene. Implemented by the presentation layer.
pub trait RenderSurface {
    fn rasterize(&mut self, scene: &SceneView, request: &RasterRequest) -> ExportResult<RasterImage>;
}

/// Preview thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub data_url: String,
}

/// Preview descriptor shown in the export dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewInfo {
    /// Human-readable byte size ("512 B", "1.5 KB", "2.0 MB").
    pub size: String,
    /// Pixel dimensions ("800 × 800px").
    pub dimensions: String,
    pub thumbnail: Thumbnail,
}

/// Format a byte count the way the export dialog displays it.
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * 1024;
    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

pub fn format_dimensions(width: u32, height: u32) -> String {
    format!("{} × {}px", width, height)
}

/// Ratio that fits `width`×`height` inside the thumbnail box.
pub fn thumbnail_ratio(width: u32, height: u32) -> f64 {
    if width == 0 || height == 0 {
        return 0.0;
    }
    let size = THUMBNAIL_SIZE as f64;
    (size / width as f64).min(size / height as f64)
}

/// Final exported file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// `emoji-{unix_millis}.{ext}`
    pub file_name: String,
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

/// Trailing-edge debounce for preview refreshes.
#[derive(Debug, Clone)]
pub struct PreviewScheduler {
    delay: Duration,
    pending_since: Option<Instant>,
}

impl Default for PreviewScheduler {
    fn default() -> Self {
        Self::new(PREVIEW_DEBOUNCE)
    }
}

impl PreviewScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending_since: None,
        }
    }

    /// Request a refresh, restarting the delay.
    pub fn schedule(&mut self, now: Instant) {
        self.pending_since = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending_since = None;
    }

    /// Returns true once the delay has elapsed since the last request,
    /// clearing the request.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending_since {
            Some(since) if now.saturating_duration_since(since) >= self.delay => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }
}

/// Export dialog state: settings, preview and final export.
#[derive(Debug, Clone, Default)]
pub struct ExportPipeline {
    settings: ExportSettings,
    preview: Option<PreviewInfo>,
    scheduler: PreviewScheduler,
    dialog_visible: bool,
}

impl ExportPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// The last successfully computed preview.
    pub fn preview(&self) -> Option<&PreviewInfo> {
        self.preview.as_ref()
    }

    pub fn is_dialog_visible(&self) -> bool {
        self.dialog_visible
    }

    /// Open the dialog and request a preview.
    pub fn show_dialog(&mut self, now: Instant) {
        self.dialog_visible = true;
        self.scheduler.schedule(now);
    }

    pub fn hide_dialog(&mut self) {
        self.dialog_visible = false;
        self.scheduler.cancel();
    }

    /// Merge a partial settings change and schedule a preview refresh.
    pub fn update_settings(&mut self, update: ExportSettingsUpdate, now: Instant) {
        self.settings.apply(update);
        self.scheduler.schedule(now);
    }

    pub fn is_preview_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Recompute the preview if the debounce delay has elapsed.
    /// Returns true if a new preview was stored.
    pub fn poll_preview(&mut self, now: Instant, surface: &mut dyn RenderSurface, scene: &SceneView) -> bool {
        if !self.scheduler.poll(now) {
            return false;
        }
        self.calculate_preview(surface, scene)
    }

    /// Rasterize at the configured settings and store the preview descriptor.
    ///
    /// On failure the error is logged and the previous preview is kept.
    pub fn calculate_preview(&mut self, surface: &mut dyn RenderSurface, scene: &SceneView) -> bool {
        match self.render_preview(surface, scene) {
            Ok(preview) => {
                self.preview = Some(preview);
                true
            }
            Err(e) => {
                log::error!("Preview calculation failed: {}", e);
                false
            }
        }
    }

    fn request(&self) -> RasterRequest {
        RasterRequest {
            format: self.settings.format,
            scale: self.settings.scale.factor(),
            background: self.settings.fill(),
        }
    }

    fn render_preview(&self, surface: &mut dyn RenderSurface, scene: &SceneView) -> ExportResult<PreviewInfo> {
        let scene = scene.without_affordances();
        let request = self.request();
        let image = surface.rasterize(&scene, &request)?;
        if image.width == 0 || image.height == 0 {
            return Err(ExportError::EmptyCanvas);
        }

        let thumb_request = RasterRequest {
            format: ImageFormat::Png,
            scale: request.scale * thumbnail_ratio(image.width, image.height),
            background: request.background,
        };
        let thumb = surface.rasterize(&scene, &thumb_request)?;

        Ok(PreviewInfo {
            size: format_size(image.encoded.len()),
            dimensions: format_dimensions(image.width, image.height),
            thumbnail: Thumbnail {
                width: thumb.width,
                height: thumb.height,
                data_url: format!(
                    "data:{};base64,{}",
                    ImageFormat::Png.mime_type(),
                    STANDARD.encode(&thumb.encoded)
                ),
            },
        })
    }

    /// Produce the final artifact, closing the dialog on success.
    pub fn export(&mut self, surface: &mut dyn RenderSurface, scene: &SceneView) -> ExportResult<ExportArtifact> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        self.export_at(surface, scene, millis)
    }

    /// Like [`export`](Self::export) with an explicit timestamp for the file name.
    pub fn export_at(
        &mut self,
        surface: &mut dyn RenderSurface,
        scene: &SceneView,
        unix_millis: u128,
    ) -> ExportResult<ExportArtifact> {
        let request = self.request();
        let image = match surface.rasterize(&scene.without_affordances(), &request) {
            Ok(image) if image.width == 0 || image.height == 0 => Err(ExportError::EmptyCanvas),
            other => other,
        }
        .inspect_err(|e| log::error!("Export failed: {}", e))?;

        let format = self.settings.format;
        let artifact = ExportArtifact {
            file_name: format!("emoji-{}.{}", unix_millis, format.extension()),
            mime: format.mime_type(),
            width: image.width,
            height: image.height,
            bytes: image.encoded,
        };
        log::info!(
            "Exported {} ({}x{}, {})",
            artifact.file_name,
            artifact.width,
            artifact.height,
            format_size(artifact.bytes.len())
        );
        self.hide_dialog();
        Ok(artifact)
    }
}
