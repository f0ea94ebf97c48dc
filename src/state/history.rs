/// Session history
///
/// Every completed generation is recorded as an immutable `HistoryItem`.
/// Restoring an item copies its fields back into the session; the stored
/// item itself is never handed out mutably.
///
/// Utility results carry an explicit tagged `UtilityRecord`. The display
/// prompt still starts with a human readable prefix ("Upscale: balanced"),
/// and items stored without a record are classified from that prefix.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::data::{AspectRatio, ImageUrl, Mode, SourceImage, UpscaleLevel};

/// Default number of items kept for the session
pub const DEFAULT_HISTORY_LIMIT: usize = 30;

const LIGHTING_PREFIX: &str = "Lighting: ";
const VIDEO_SCRIPT_PREFIX: &str = "Video Script Request: ";
const EXTEND_VIEW_PREFIX: &str = "Extend View to ";
const CHANGE_STYLE_PREFIX: &str = "Change Style: ";
const UPSCALE_PREFIX: &str = "Upscale: ";

/// Which utility produced a history item, with its parameters
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", content = "payload", rename_all = "camelCase")]
pub enum UtilityRecord {
    Moodboard,
    Lighting { prompt: String },
    VideoScript { request: String },
    ExtendView { aspect_ratio: AspectRatio },
    ChangeStyle { prompt: String },
    Upscale { level: UpscaleLevel },
}

impl UtilityRecord {
    /// Prompt shown in the history panel for this record.
    /// Moodboards show the user's own prompt.
    pub fn display_prompt(&self, user_prompt: &str) -> String {
        match self {
            Self::Moodboard => user_prompt.to_string(),
            Self::Lighting { prompt } => format!("{LIGHTING_PREFIX}{prompt}"),
            Self::VideoScript { request } => format!("{VIDEO_SCRIPT_PREFIX}{request}"),
            Self::ExtendView { aspect_ratio } => format!("{EXTEND_VIEW_PREFIX}{aspect_ratio}"),
            Self::ChangeStyle { prompt } => format!("{CHANGE_STYLE_PREFIX}{prompt}"),
            Self::Upscale { level } => format!("{UPSCALE_PREFIX}{level}"),
        }
    }

    /// Classify an untagged utility item from its display prompt
    pub fn from_prompt(prompt: &str) -> Self {
        if let Some(rest) = prompt.strip_prefix(LIGHTING_PREFIX) {
            Self::Lighting { prompt: rest.to_string() }
        } else if let Some(rest) = prompt.strip_prefix(VIDEO_SCRIPT_PREFIX) {
            Self::VideoScript { request: rest.to_string() }
        } else if let Some(rest) = prompt.strip_prefix(EXTEND_VIEW_PREFIX) {
            Self::ExtendView {
                aspect_ratio: rest.parse().unwrap_or(AspectRatio::Wide),
            }
        } else if let Some(rest) = prompt.strip_prefix(CHANGE_STYLE_PREFIX) {
            Self::ChangeStyle { prompt: rest.to_string() }
        } else if let Some(rest) = prompt.strip_prefix(UPSCALE_PREFIX) {
            Self::Upscale {
                level: rest.parse().unwrap_or_default(),
            }
        } else {
            Self::Moodboard
        }
    }
}

/// Snapshot of one completed generation
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub mode: Mode,
    #[serde(default)]
    pub source: Option<SourceImage>,
    #[serde(default)]
    pub second_source: Option<SourceImage>,
    #[serde(default)]
    pub reference: Option<SourceImage>,
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: String,
    pub image_count: u8,
    #[serde(default)]
    pub generated_images: Vec<ImageUrl>,
    #[serde(default)]
    pub generated_prompts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utility: Option<UtilityRecord>,
}

impl HistoryItem {
    pub fn new(mode: Mode, prompt: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            mode,
            source: None,
            second_source: None,
            reference: None,
            prompt: prompt.into(),
            negative_prompt: String::new(),
            image_count: 0,
            generated_images: Vec::new(),
            generated_prompts: None,
            video_model: None,
            video_url: None,
            utility: None,
        }
    }

    /// Build a utilities item whose prompt is derived from the record
    pub fn for_utility(record: UtilityRecord, user_prompt: &str) -> Self {
        let mut item = Self::new(Mode::Utilities, record.display_prompt(user_prompt));
        item.utility = Some(record);
        item
    }

    pub fn with_source(mut self, source: Option<SourceImage>) -> Self {
        self.source = source;
        self
    }

    pub fn with_second_source(mut self, second: Option<SourceImage>) -> Self {
        self.second_source = second;
        self
    }

    pub fn with_reference(mut self, reference: Option<SourceImage>) -> Self {
        self.reference = reference;
        self
    }

    pub fn with_negative_prompt(mut self, negative: impl Into<String>) -> Self {
        self.negative_prompt = negative.into();
        self
    }

    pub fn with_images(mut self, image_count: u8, images: Vec<ImageUrl>) -> Self {
        self.image_count = image_count;
        self.generated_images = images;
        self
    }

    pub fn with_prompts(mut self, prompts: String) -> Self {
        self.generated_prompts = Some(prompts);
        self
    }

    pub fn with_video(mut self, model: impl Into<String>, url: impl Into<String>) -> Self {
        self.video_model = Some(model.into());
        self.video_url = Some(url.into());
        self
    }

    /// The utility this item belongs to, if it is a utilities item
    pub fn utility_record(&self) -> Option<UtilityRecord> {
        if self.mode != Mode::Utilities {
            return None;
        }
        Some(
            self.utility
                .clone()
                .unwrap_or_else(|| UtilityRecord::from_prompt(&self.prompt)),
        )
    }

    /// First output, used as the thumbnail
    pub fn thumbnail(&self) -> Option<&ImageUrl> {
        self.generated_images.first()
    }
}

/// Bounded, append-only log of the session's history items
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryLog {
    items: Vec<HistoryItem>,
    limit: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryLog {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            items: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Append an item, dropping the oldest ones beyond the limit
    pub fn push(&mut self, item: HistoryItem) {
        self.items.push(item);
        if self.items.len() > self.limit {
            let overflow = self.items.len() - self.limit;
            self.items.drain(0..overflow);
        }
    }

    /// Replace the log with items loaded from storage (oldest first)
    pub fn load(&mut self, items: Vec<HistoryItem>) {
        self.items.clear();
        for item in items {
            self.push(item);
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items oldest first
    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    /// Items newest first, as shown in the history panel
    pub fn newest_first(&self) -> impl Iterator<Item = &HistoryItem> {
        self.items.iter().rev()
    }

    pub fn last(&self) -> Option<&HistoryItem> {
        self.items.last()
    }

    pub fn get(&self, id: Uuid) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_inference() {
        assert_eq!(
            UtilityRecord::from_prompt("Upscale: balanced"),
            UtilityRecord::Upscale { level: UpscaleLevel::Balanced }
        );
        assert_eq!(
            UtilityRecord::from_prompt("Extend View to 9:16"),
            UtilityRecord::ExtendView { aspect_ratio: AspectRatio::Tall }
        );
        assert_eq!(
            UtilityRecord::from_prompt("Video Script Request: slow drone orbit"),
            UtilityRecord::VideoScript { request: "slow drone orbit".into() }
        );
        assert_eq!(
            UtilityRecord::from_prompt("japandi living room"),
            UtilityRecord::Moodboard
        );
    }

    #[test]
    fn test_tagged_record_wins_over_prefix() {
        // A moodboard whose user prompt happens to look like a reserved prefix
        let item = HistoryItem::for_utility(UtilityRecord::Moodboard, "Upscale: creative");
        assert_eq!(item.prompt, "Upscale: creative");
        assert_eq!(item.utility_record(), Some(UtilityRecord::Moodboard));

        let mut legacy = item.clone();
        legacy.utility = None;
        assert_eq!(
            legacy.utility_record(),
            Some(UtilityRecord::Upscale { level: UpscaleLevel::Creative })
        );
    }

    #[test]
    fn test_record_serialization_is_tagged() {
        let record = UtilityRecord::Upscale { level: UpscaleLevel::Subtle };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "upscale");
        assert_eq!(json["payload"]["level"], "subtle");

        let item = HistoryItem::for_utility(record.clone(), "");
        let restored: HistoryItem =
            serde_json::from_str(&serde_json::to_string(&item).unwrap()).unwrap();
        assert_eq!(restored, item);
    }

    #[test]
    fn test_non_utility_items_have_no_record() {
        let item = HistoryItem::new(Mode::Create, "Lighting: not a utility");
        assert_eq!(item.utility_record(), None);
    }

    #[test]
    fn test_log_is_bounded() {
        let mut log = HistoryLog::with_limit(3);
        for i in 0..5 {
            log.push(HistoryItem::new(Mode::Create, format!("p{i}")));
        }
        assert_eq!(log.len(), 3);
        let prompts: Vec<_> = log.newest_first().map(|i| i.prompt.as_str()).collect();
        assert_eq!(prompts, ["p4", "p3", "p2"]);
    }
}
