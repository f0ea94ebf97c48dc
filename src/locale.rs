/// Localised texts used by the session logic
///
/// Only the strings that flow into state (default prompts, history labels,
/// placeholder text) live here. The locale code itself is forwarded to the
/// generation service so it can answer in the user's language.

use serde::{Deserialize, Serialize};

/// Supported interface languages
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Vi,
}

/// Keys of the text table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    PromptInitial,
    DefaultNegativePrompt,
    PromptPlanTo3d,
    PromptCloseUp,
    PromptCanvaMix,
    PromptArchitecturalGenerated,
    Generating,
    LoadingStart,
    LoadingAnalyzePrompts,
    LoadingTourFrame,
    GeneratingMoodboard,
    GeneratingLighting,
    GeneratingVideoPrompt,
    GeneratingExtendedView,
    GeneratingStylePrompt,
    GeneratingStyledImages,
    GeneratingUpscale,
}

impl Locale {
    /// Language code sent to the service
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Vi => "vi",
        }
    }

    /// Parse a language code, e.g. from the environment
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en-gb" => Some(Self::En),
            "vi" | "vi-vn" => Some(Self::Vi),
            _ => None,
        }
    }

    /// Look up a text in this locale
    pub fn text(&self, key: Text) -> &'static str {
        match self {
            Self::En => english(key),
            Self::Vi => vietnamese(key),
        }
    }
}

fn english(key: Text) -> &'static str {
    match key {
        Text::PromptInitial => "A modern two-storey villa with large glass windows, surrounded by a tropical garden, photorealistic, golden hour lighting",
        Text::DefaultNegativePrompt => "blurry, low quality, distorted, watermark, text, people",
        Text::PromptPlanTo3d => "Modern minimalist interior, warm wood and white tones, natural daylight",
        Text::PromptCloseUp => "Close-up photos of the selected area",
        Text::PromptCanvaMix => "Canva Mix: place decor into the scene",
        Text::PromptArchitecturalGenerated => "Architectural prompts generated from image",
        Text::Generating => "Generating...",
        Text::LoadingStart => "Preparing your request...",
        Text::LoadingAnalyzePrompts => "Analysing the image for prompts...",
        Text::LoadingTourFrame => "Generating the next frame...",
        Text::GeneratingMoodboard => "Creating moodboard...",
        Text::GeneratingLighting => "Applying lighting...",
        Text::GeneratingVideoPrompt => "Writing the video script prompt...",
        Text::GeneratingExtendedView => "Extending the view...",
        Text::GeneratingStylePrompt => "Writing the style prompt...",
        Text::GeneratingStyledImages => "Rendering the new style...",
        Text::GeneratingUpscale => "Upscaling...",
    }
}

fn vietnamese(key: Text) -> &'static str {
    match key {
        Text::PromptInitial => "Một biệt thự hiện đại hai tầng với cửa kính lớn, bao quanh bởi khu vườn nhiệt đới, ảnh chân thực, ánh sáng hoàng hôn",
        Text::DefaultNegativePrompt => "mờ, chất lượng thấp, méo mó, hình mờ, chữ, người",
        Text::PromptPlanTo3d => "Nội thất hiện đại tối giản, tông gỗ ấm và trắng, ánh sáng tự nhiên",
        Text::PromptCloseUp => "Ảnh cận cảnh khu vực đã chọn",
        Text::PromptCanvaMix => "Canva Mix: đặt đồ trang trí vào không gian",
        Text::PromptArchitecturalGenerated => "Các câu lệnh kiến trúc được tạo từ ảnh",
        Text::Generating => "Đang tạo...",
        Text::LoadingStart => "Đang chuẩn bị yêu cầu...",
        Text::LoadingAnalyzePrompts => "Đang phân tích ảnh để tạo câu lệnh...",
        Text::LoadingTourFrame => "Đang tạo khung hình tiếp theo...",
        Text::GeneratingMoodboard => "Đang tạo moodboard...",
        Text::GeneratingLighting => "Đang áp dụng ánh sáng...",
        Text::GeneratingVideoPrompt => "Đang viết kịch bản video...",
        Text::GeneratingExtendedView => "Đang mở rộng khung cảnh...",
        Text::GeneratingStylePrompt => "Đang viết câu lệnh phong cách...",
        Text::GeneratingStyledImages => "Đang render phong cách mới...",
        Text::GeneratingUpscale => "Đang nâng cấp độ phân giải...",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(Locale::from_code("VI"), Some(Locale::Vi));
        assert_eq!(Locale::from_code(" en-us "), Some(Locale::En));
        assert_eq!(Locale::from_code("fr"), None);
    }

    #[test]
    fn test_every_key_has_text() {
        for locale in [Locale::En, Locale::Vi] {
            assert!(!locale.text(Text::PromptInitial).is_empty());
            assert!(!locale.text(Text::PromptPlanTo3d).is_empty());
        }
    }
}
