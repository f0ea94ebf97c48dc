/// Shared data structures for the application state
///
/// These types flow between the session, the request dispatcher and the
/// UI layer. Images are passed around by value as base64 payloads; generated
/// outputs are data URLs so they can be shown and re-used as inputs.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{imageops::FilterType, ImageFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, StudioError};

/// Uploads larger than this on their long edge are downsized before sending
const MAX_UPLOAD_EDGE: u32 = 2048;

/// A generated image, encoded as a `data:` URL
pub type ImageUrl = String;

/// An input image: base64 payload plus its MIME type
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceImage {
    pub base64: String,
    pub mime_type: String,
}

impl SourceImage {
    pub fn new(base64: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            base64: base64.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Encode raw file bytes, downsizing oversized images
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let format = image::guess_format(bytes)?;
        let img = image::load_from_memory_with_format(bytes, format)?;

        if img.width().max(img.height()) > MAX_UPLOAD_EDGE {
            let resized = img.resize(MAX_UPLOAD_EDGE, MAX_UPLOAD_EDGE, FilterType::Lanczos3);
            let mut out = Cursor::new(Vec::new());
            resized.write_to(&mut out, ImageFormat::Png)?;
            tracing::debug!(
                "downsized upload from {}x{} to {}x{}",
                img.width(),
                img.height(),
                resized.width(),
                resized.height()
            );
            return Ok(Self::new(BASE64.encode(out.into_inner()), "image/png"));
        }

        Ok(Self::new(BASE64.encode(bytes), format.to_mime_type()))
    }

    /// Read an image file from disk
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Convert to a `data:` URL for display and storage
    pub fn to_data_url(&self) -> ImageUrl {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }

    /// Parse a `data:<mime>;base64,<payload>` URL
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| StudioError::ImageData("not a data URL".into()))?;
        let (mime_type, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| StudioError::ImageData("data URL is not base64 encoded".into()))?;
        if mime_type.is_empty() || payload.is_empty() {
            return Err(StudioError::ImageData("data URL is empty".into()));
        }
        Ok(Self::new(payload, mime_type))
    }

    /// Decode the payload back to raw bytes
    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.base64.as_bytes())
            .map_err(|e| StudioError::ImageData(e.to_string()))
    }
}

/// Top-level workflow ("tab"). Exactly one is active at a time.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    #[default]
    Create,
    CameraAngle,
    Edit,
    PlanTo3d,
    CanvaMix,
    PromptGen,
    Video,
    Utilities,
}

impl Mode {
    pub const ALL: [Mode; 8] = [
        Mode::Create,
        Mode::CameraAngle,
        Mode::Edit,
        Mode::PlanTo3d,
        Mode::CanvaMix,
        Mode::PromptGen,
        Mode::Video,
        Mode::Utilities,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::CameraAngle => "Camera Angle",
            Self::Edit => "Edit",
            Self::PlanTo3d => "Plan to 3D",
            Self::CanvaMix => "Canva Mix",
            Self::PromptGen => "Prompt",
            Self::Video => "Video",
            Self::Utilities => "Utilities",
        }
    }

    /// Stable key used by the history catalog
    pub fn key(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::CameraAngle => "cameraAngle",
            Self::Edit => "edit",
            Self::PlanTo3d => "planTo3d",
            Self::CanvaMix => "canvaMix",
            Self::PromptGen => "promptGen",
            Self::Video => "video",
            Self::Utilities => "utilities",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Output aspect ratio. `Auto` lets the mode pick its fallback.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:3")]
    Landscape,
    #[serde(rename = "3:4")]
    Portrait,
    #[serde(rename = "16:9")]
    Wide,
    #[serde(rename = "9:16")]
    Tall,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 6] = [
        AspectRatio::Auto,
        AspectRatio::Square,
        AspectRatio::Landscape,
        AspectRatio::Portrait,
        AspectRatio::Wide,
        AspectRatio::Tall,
    ];

    /// Fixed ratio used when a mode does not let the user choose
    pub const FALLBACK: AspectRatio = AspectRatio::Landscape;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Square => "1:1",
            Self::Landscape => "4:3",
            Self::Portrait => "3:4",
            Self::Wide => "16:9",
            Self::Tall => "9:16",
        }
    }

    /// Replace `Auto` with the given fallback
    pub fn resolve(self, fallback: AspectRatio) -> AspectRatio {
        match self {
            Self::Auto => fallback,
            other => other,
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == s.trim())
            .ok_or_else(|| format!("unknown aspect ratio '{s}'"))
    }
}

/// Plan-to-3D sub-mode
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanMode {
    #[default]
    Render,
    Colorize,
}

/// Strength of the upscale utility
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UpscaleLevel {
    Subtle,
    #[default]
    Balanced,
    Creative,
}

impl UpscaleLevel {
    pub const ALL: [UpscaleLevel; 3] = [Self::Subtle, Self::Balanced, Self::Creative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subtle => "subtle",
            Self::Balanced => "balanced",
            Self::Creative => "creative",
        }
    }
}

impl fmt::Display for UpscaleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpscaleLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s.trim())
            .ok_or_else(|| format!("unknown upscale level '{s}'"))
    }
}

/// Results shown in the main gallery
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outputs {
    pub images: Vec<ImageUrl>,
    pub video_url: Option<String>,
    /// Candidate prompts from the prompt mode, one text block
    pub prompts: Option<String>,
    pub selected: Option<ImageUrl>,
}

impl Outputs {
    /// Replace the images and select the first one
    pub fn show_images(&mut self, images: Vec<ImageUrl>) {
        self.selected = images.first().cloned();
        self.images = images;
    }

    /// Show a single image (e.g. a fresh upload) as the only output
    pub fn show_single(&mut self, image: ImageUrl) {
        self.show_images(vec![image]);
    }

    pub fn clear_images(&mut self) {
        self.images.clear();
        self.selected = None;
    }

    pub fn select(&mut self, image: ImageUrl) {
        if self.images.contains(&image) {
            self.selected = Some(image);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 120, 40, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_data_url_round_trip() {
        let image = SourceImage::new("aGVsbG8=", "image/jpeg");
        let url = image.to_data_url();
        assert_eq!(url, "data:image/jpeg;base64,aGVsbG8=");
        assert_eq!(SourceImage::from_data_url(&url).unwrap(), image);
        assert_eq!(image.decode().unwrap(), b"hello");
    }

    #[test]
    fn test_rejects_non_data_url() {
        assert!(SourceImage::from_data_url("https://example.com/a.png").is_err());
        assert!(SourceImage::from_data_url("data:image/png,abc").is_err());
    }

    #[test]
    fn test_from_bytes_detects_png() {
        let image = SourceImage::from_bytes(&png_bytes(8, 4)).unwrap();
        assert_eq!(image.mime_type, "image/png");
    }

    #[test]
    fn test_from_bytes_downsizes_large_uploads() {
        let image = SourceImage::from_bytes(&png_bytes(MAX_UPLOAD_EDGE * 2, 16)).unwrap();
        let decoded = image::load_from_memory(&image.decode().unwrap()).unwrap();
        assert_eq!(decoded.width(), MAX_UPLOAD_EDGE);
    }

    #[test]
    fn test_aspect_ratio_resolution() {
        assert_eq!(AspectRatio::Auto.resolve(AspectRatio::FALLBACK), AspectRatio::Landscape);
        assert_eq!(AspectRatio::Wide.resolve(AspectRatio::FALLBACK), AspectRatio::Wide);
        assert_eq!("9:16".parse::<AspectRatio>().unwrap(), AspectRatio::Tall);
        assert_eq!(
            serde_json::to_string(&AspectRatio::Wide).unwrap(),
            "\"16:9\""
        );
    }

    #[test]
    fn test_outputs_select_first() {
        let mut outputs = Outputs::default();
        outputs.show_images(vec!["a".into(), "b".into()]);
        assert_eq!(outputs.selected.as_deref(), Some("a"));
        outputs.select("b".into());
        assert_eq!(outputs.selected.as_deref(), Some("b"));
        outputs.select("zzz".into());
        assert_eq!(outputs.selected.as_deref(), Some("b"));
    }
}
