/// Error types shared across the studio
///
/// Three families of failure exist for a generation action:
/// - precondition failures, raised before any request is issued
/// - service failures, raised by the remote model binding
/// - empty results, a "successful" call that produced nothing
///
/// None of them are fatal to the session; the user can retry right away.

use thiserror::Error;

/// A required input for the current action is missing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a prompt.")]
    EnterPrompt,
    #[error("Please upload a source image first.")]
    UploadSource,
    #[error("Please draw a mask over the area you want to edit.")]
    DrawMask,
    #[error("Please upload both images to merge.")]
    UploadBothImages,
    #[error("Please upload a background image.")]
    UploadBackground,
    #[error("Please add at least one decor object to the canvas.")]
    UploadDecor,
    #[error("Please choose a utility to run.")]
    UseUtility,
    #[error("Please upload an image and describe the moodboard.")]
    Moodboard,
    #[error("Please upload an image and pick at least one lighting preset.")]
    Lighting,
    #[error("Please upload an image and describe the video you want.")]
    VideoPrompt,
    #[error("Please upload an image and describe the new style.")]
    StylePromptGen,
    #[error("Please generate a style prompt first.")]
    StyleChange,
    #[error("Please upload an image to upscale.")]
    Upscale,
    #[error("There is no analysed image to generate from.")]
    NoSourceForPrompt,
    #[error("Please select an image first.")]
    NoSelection,
    #[error("Start the tour by uploading an image.")]
    TourNotStarted,
}

/// Failure reported by the generation service binding
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("service responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("could not read service response: {0}")]
    Decode(String),
    #[error("{0}")]
    Failed(String),
}

/// Top-level error for studio actions
#[derive(Debug, Error)]
pub enum StudioError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("A generation is already running. Please wait for it to finish.")]
    Busy,
    #[error("Generation failed: {0}")]
    Service(#[from] ServiceError),
    #[error("Generation failed: the service returned no results.")]
    EmptyResult,
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid image data: {0}")]
    ImageData(String),
    #[error("History storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StudioError>;
