/// Generation service seam
///
/// The studio never synthesises anything itself. Every image, video and
/// text result comes from a remote model service behind this trait. The
/// payload structs below are the contract; `http` ships one binding.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ServiceError;
use crate::locale::Locale;
use crate::state::canva::Placement;
use crate::state::data::{AspectRatio, ImageUrl, SourceImage, UpscaleLevel};

pub mod http;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    pub image: Option<SourceImage>,
    pub prompt: String,
    pub count: u8,
    pub reference: Option<SourceImage>,
    pub aspect_ratio: AspectRatio,
    pub locale: Locale,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    pub image: SourceImage,
    pub mask: SourceImage,
    pub prompt: String,
    pub count: u8,
    pub reference: Option<SourceImage>,
    pub locale: Locale,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    pub image_a: SourceImage,
    pub image_b: SourceImage,
    pub prompt: String,
    pub count: u8,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoRequest {
    pub image: SourceImage,
    pub prompt: String,
    pub model: String,
}

/// Image analysis that answers with text
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub image: SourceImage,
    pub locale: Locale,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FurnitureRequest {
    pub background: SourceImage,
    pub placements: Vec<Placement>,
    pub count: u8,
    pub locale: Locale,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MoodboardRequest {
    pub image: SourceImage,
    pub prompt: String,
    pub reference: Option<SourceImage>,
    pub count: u8,
    pub locale: Locale,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LightingRequest {
    pub image: SourceImage,
    pub prompt: String,
    pub count: u8,
    pub locale: Locale,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtendViewRequest {
    pub image: SourceImage,
    pub aspect_ratio: AspectRatio,
    pub count: u8,
    pub locale: Locale,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpscaleRequest {
    pub image: SourceImage,
    pub level: UpscaleLevel,
    pub locale: Locale,
}

/// An image plus a short user brief, answered with a written prompt
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BriefRequest {
    pub image: SourceImage,
    pub brief: String,
    pub locale: Locale,
}

/// Remote model operations used by the studio.
///
/// Every call may fail with a human readable `ServiceError`. Returning zero
/// images is allowed here; callers treat it as a failed generation.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate_images(&self, request: &ImageRequest) -> Result<Vec<ImageUrl>, ServiceError>;

    async fn edit_image(&self, request: &EditRequest) -> Result<Vec<ImageUrl>, ServiceError>;

    async fn merge_images(&self, request: &MergeRequest) -> Result<Vec<ImageUrl>, ServiceError>;

    /// Returns the URL of the finished clip. `progress` receives status
    /// lines while the clip renders.
    async fn generate_video(
        &self,
        request: &VideoRequest,
        progress: &(dyn for<'s> Fn(&'s str) + Send + Sync),
    ) -> Result<String, ServiceError>;

    async fn generate_prompt_from_image(&self, request: &AnalysisRequest) -> Result<String, ServiceError>;

    async fn generate_prompt_from_plan(&self, request: &AnalysisRequest) -> Result<String, ServiceError>;

    async fn generate_architectural_prompts(&self, request: &AnalysisRequest) -> Result<String, ServiceError>;

    async fn place_and_render_furniture(
        &self,
        request: &FurnitureRequest,
    ) -> Result<Vec<ImageUrl>, ServiceError>;

    async fn generate_moodboard(&self, request: &MoodboardRequest) -> Result<Vec<ImageUrl>, ServiceError>;

    async fn apply_lighting(&self, request: &LightingRequest) -> Result<Vec<ImageUrl>, ServiceError>;

    async fn extend_view(&self, request: &ExtendViewRequest) -> Result<Vec<ImageUrl>, ServiceError>;

    async fn upscale_image(&self, request: &UpscaleRequest) -> Result<Vec<ImageUrl>, ServiceError>;

    async fn generate_style_change_prompt(&self, request: &BriefRequest) -> Result<String, ServiceError>;

    async fn generate_video_script_prompt(&self, request: &BriefRequest) -> Result<String, ServiceError>;
}
