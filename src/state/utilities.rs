/// Utility tools shown under the utilities mode
///
/// Each utility owns its own source image, parameters and results, so
/// switching between them (or away from the utilities mode) never mixes
/// their inputs with the shared session fields.

use super::data::{AspectRatio, ImageUrl, SourceImage, UpscaleLevel};
use super::history::{HistoryItem, UtilityRecord};
use super::session::{DEFAULT_IMAGE_COUNT, MAX_IMAGE_COUNT};
use super::tour::VirtualTour;

pub const INTERIOR_LIGHTING_PRESETS: &[&str] = &[
    "soft morning light through sheer curtains",
    "warm evening ambience with pendant lamps",
    "cool overcast daylight",
    "dramatic spotlights on feature walls",
    "cosy candlelight",
];

pub const EXTERIOR_LIGHTING_PRESETS: &[&str] = &[
    "golden hour sunset",
    "blue hour with facade lights on",
    "bright midday sun with crisp shadows",
    "moody overcast sky after rain",
    "night scene with landscape uplighting",
];

/// Which utility panel is open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utility {
    Moodboard,
    Lighting,
    VirtualTour,
    VideoPrompt,
    ExtendView,
    ChangeStyle,
    Upscale,
}

impl Utility {
    pub const ALL: [Utility; 7] = [
        Self::Moodboard,
        Self::Lighting,
        Self::VirtualTour,
        Self::VideoPrompt,
        Self::ExtendView,
        Self::ChangeStyle,
        Self::Upscale,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Moodboard => "Moodboard",
            Self::Lighting => "Lighting",
            Self::VirtualTour => "Virtual Tour",
            Self::VideoPrompt => "Video Prompt",
            Self::ExtendView => "Extend View",
            Self::ChangeStyle => "Change Style",
            Self::Upscale => "Upscale",
        }
    }
}

impl std::fmt::Display for Utility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// Results of one utility with its own selection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Gallery {
    pub images: Vec<ImageUrl>,
    pub selected: Option<ImageUrl>,
}

impl Gallery {
    pub fn show(&mut self, images: Vec<ImageUrl>) {
        self.selected = images.first().cloned();
        self.images = images;
    }

    pub fn select(&mut self, image: ImageUrl) {
        if self.images.contains(&image) {
            self.selected = Some(image);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoodboardState {
    pub source: Option<SourceImage>,
    pub reference: Option<SourceImage>,
    pub prompt: String,
    pub image_count: u8,
    pub gallery: Gallery,
}

impl Default for MoodboardState {
    fn default() -> Self {
        Self {
            source: None,
            reference: None,
            prompt: String::new(),
            image_count: DEFAULT_IMAGE_COUNT,
            gallery: Gallery::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightingState {
    pub source: Option<SourceImage>,
    pub interior: String,
    pub exterior: String,
    pub image_count: u8,
    pub gallery: Gallery,
}

impl Default for LightingState {
    fn default() -> Self {
        Self {
            source: None,
            interior: String::new(),
            exterior: String::new(),
            image_count: DEFAULT_IMAGE_COUNT,
            gallery: Gallery::default(),
        }
    }
}

impl LightingState {
    /// Interior and exterior presets joined into one instruction
    pub fn combined_prompt(&self) -> String {
        [self.interior.as_str(), self.exterior.as_str()]
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoPromptState {
    pub source: Option<SourceImage>,
    pub user_prompt: String,
    pub generated: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtendViewState {
    pub source: Option<SourceImage>,
    pub aspect_ratio: AspectRatio,
    pub image_count: u8,
    pub gallery: Gallery,
}

impl Default for ExtendViewState {
    fn default() -> Self {
        Self {
            source: None,
            aspect_ratio: AspectRatio::Wide,
            image_count: DEFAULT_IMAGE_COUNT,
            gallery: Gallery::default(),
        }
    }
}

impl ExtendViewState {
    /// `Auto` makes no sense for outpainting
    pub fn set_aspect_ratio(&mut self, ratio: AspectRatio) {
        if ratio != AspectRatio::Auto {
            self.aspect_ratio = ratio;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeStyleState {
    pub source: Option<SourceImage>,
    pub user_prompt: String,
    pub generated_prompt: Option<String>,
    pub image_count: u8,
    pub gallery: Gallery,
}

impl Default for ChangeStyleState {
    fn default() -> Self {
        Self {
            source: None,
            user_prompt: String::new(),
            generated_prompt: None,
            image_count: DEFAULT_IMAGE_COUNT,
            gallery: Gallery::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpscaleState {
    pub source: Option<SourceImage>,
    pub level: UpscaleLevel,
    pub gallery: Gallery,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Utilities {
    pub active: Option<Utility>,
    pub moodboard: MoodboardState,
    pub lighting: LightingState,
    pub video_prompt: VideoPromptState,
    pub extend_view: ExtendViewState,
    pub change_style: ChangeStyleState,
    pub upscale: UpscaleState,
    pub tour: VirtualTour,
}

impl Utilities {
    /// Reset every tool block back to its defaults
    pub fn reset_blocks(&mut self) {
        self.moodboard = MoodboardState::default();
        self.lighting = LightingState::default();
        self.video_prompt = VideoPromptState::default();
        self.extend_view = ExtendViewState::default();
        self.change_style = ChangeStyleState::default();
        self.upscale = UpscaleState::default();
    }

    /// Result gallery of an image-producing utility
    pub fn gallery_mut(&mut self, utility: Utility) -> Option<&mut Gallery> {
        match utility {
            Utility::Moodboard => Some(&mut self.moodboard.gallery),
            Utility::Lighting => Some(&mut self.lighting.gallery),
            Utility::ExtendView => Some(&mut self.extend_view.gallery),
            Utility::ChangeStyle => Some(&mut self.change_style.gallery),
            Utility::Upscale => Some(&mut self.upscale.gallery),
            Utility::VirtualTour | Utility::VideoPrompt => None,
        }
    }

    /// Copy a history item into the block its record points at.
    /// No other block is touched.
    pub fn restore(&mut self, record: &UtilityRecord, item: &HistoryItem) {
        let source = item.source.clone();
        match record {
            UtilityRecord::Moodboard => {
                self.active = Some(Utility::Moodboard);
                self.moodboard.source = source;
                self.moodboard.reference = item.reference.clone();
                self.moodboard.prompt = item.prompt.clone();
                self.moodboard.image_count = item.image_count.clamp(1, MAX_IMAGE_COUNT);
                self.moodboard.gallery.show(item.generated_images.clone());
            }
            UtilityRecord::Lighting { .. } => {
                self.active = Some(Utility::Lighting);
                self.lighting.source = source;
                self.lighting.image_count = item.image_count.clamp(1, MAX_IMAGE_COUNT);
                self.lighting.gallery.show(item.generated_images.clone());
            }
            UtilityRecord::VideoScript { request } => {
                self.active = Some(Utility::VideoPrompt);
                self.video_prompt.source = source;
                self.video_prompt.user_prompt = request.clone();
                self.video_prompt.generated = item.generated_prompts.clone();
            }
            UtilityRecord::ExtendView { aspect_ratio } => {
                self.active = Some(Utility::ExtendView);
                self.extend_view.source = source;
                self.extend_view.set_aspect_ratio(*aspect_ratio);
                self.extend_view.image_count = item.image_count.clamp(1, MAX_IMAGE_COUNT);
                self.extend_view.gallery.show(item.generated_images.clone());
            }
            UtilityRecord::ChangeStyle { prompt } => {
                self.active = Some(Utility::ChangeStyle);
                self.change_style.source = source;
                self.change_style.generated_prompt = Some(prompt.clone());
                self.change_style.user_prompt.clear();
                self.change_style.image_count = item.image_count.clamp(1, MAX_IMAGE_COUNT);
                self.change_style.gallery.show(item.generated_images.clone());
            }
            UtilityRecord::Upscale { level } => {
                self.active = Some(Utility::Upscale);
                self.upscale.source = source;
                self.upscale.level = *level;
                self.upscale.gallery.show(item.generated_images.clone());
            }
        }
    }
}
