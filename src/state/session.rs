/// Session state
///
/// `Session` is the single owner of everything the user is working on:
/// the active mode, the shared inputs, per-mode sub-state, the displayed
/// outputs and the history log. The UI reads it and calls the reducer
/// methods below; generation flows live in `crate::dispatch::flow`.

use crate::dispatch::slot::TaskSlot;
use crate::dispatch::{PendingJob, Target};
use crate::error::{Result, ValidationError};
use crate::locale::{Locale, Text};

use super::canva::CanvaBoard;
use super::data::{AspectRatio, ImageUrl, Mode, Outputs, PlanMode, SourceImage};
use super::edit::{BrushStroke, EditState};
use super::history::{HistoryItem, HistoryLog};
use super::markup;
use super::transitions::{self, PromptDefaults, SourceSwap};
use super::utilities::Utilities;

pub const DEFAULT_IMAGE_COUNT: u8 = 2;
pub const MAX_IMAGE_COUNT: u8 = 4;
pub const DEFAULT_VIDEO_MODEL: &str = "veo-2.0-generate-001";

#[derive(Debug)]
pub struct Session {
    locale: Locale,
    mode: Mode,

    pub source: Option<SourceImage>,
    pub reference: Option<SourceImage>,
    pub prompt: String,
    pub negative_prompt: String,
    pub image_count: u8,
    pub aspect_ratio: AspectRatio,
    pub plan_mode: PlanMode,
    pub video_model: String,
    /// Area selection overlay in the camera angle mode
    pub selecting_area: bool,

    pub edit: EditState,
    pub canva: CanvaBoard,
    pub utilities: Utilities,

    pub outputs: Outputs,
    pub last_used_prompt: String,

    /// Image analysed by the prompt mode, kept apart from `source`
    prompt_source: Option<SourceImage>,
    /// Shared source put aside while the prompt mode is active
    shared_source: Option<SourceImage>,
    /// Set by a restore so the following switch keeps the restored prompts
    suppress_defaults: bool,

    history: HistoryLog,
    pub(crate) slot: TaskSlot<Target>,
    pub(crate) suggestion: TaskSlot<()>,
}

impl Session {
    pub fn new(locale: Locale) -> Self {
        let (prompt, negative_prompt) = PromptDefaults::Create.texts(locale);
        Self {
            locale,
            mode: Mode::Create,
            source: None,
            reference: None,
            prompt,
            negative_prompt,
            image_count: DEFAULT_IMAGE_COUNT,
            aspect_ratio: AspectRatio::Auto,
            plan_mode: PlanMode::Render,
            video_model: DEFAULT_VIDEO_MODEL.to_string(),
            selecting_area: false,
            edit: EditState::default(),
            canva: CanvaBoard::default(),
            utilities: Utilities::default(),
            outputs: Outputs::default(),
            last_used_prompt: String::new(),
            prompt_source: None,
            shared_source: None,
            suppress_defaults: false,
            history: HistoryLog::default(),
            slot: TaskSlot::default(),
            suggestion: TaskSlot::default(),
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history = HistoryLog::with_limit(limit);
        self
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn prompt_source(&self) -> &Option<SourceImage> {
        &self.prompt_source
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// The prompt mode analyses whatever is the source when it generates
    pub(crate) fn remember_analysed_source(&mut self) {
        self.prompt_source = self.source.clone();
    }

    pub(crate) fn push_history(&mut self, item: HistoryItem) {
        self.history.push(item);
    }

    /// Replace the log with items loaded from the catalog
    pub fn load_history(&mut self, items: Vec<HistoryItem>) {
        self.history.load(items);
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn is_loading(&self) -> bool {
        self.slot.is_busy()
    }

    pub fn loading_message(&self) -> Option<&str> {
        self.slot.message()
    }

    /// Clamp to the range the service accepts
    pub fn set_image_count(&mut self, count: u8) {
        self.image_count = count.clamp(1, MAX_IMAGE_COUNT);
    }

    /// The mask editor is shown over the source
    pub fn is_editing_mask(&self) -> bool {
        self.mode == Mode::Edit && self.edit.is_editing_mask(self.source.is_some())
    }

    /// Add a brush stroke at the current brush size and repaint the mask.
    /// An uploaded or lasso mask is replaced by the painted one.
    pub fn paint_mask_stroke(&mut self, points: Vec<(f32, f32)>) -> Result<()> {
        let Some(source) = &self.source else {
            return Err(ValidationError::UploadSource.into());
        };
        if points.is_empty() {
            return Ok(());
        }
        let mut strokes = self.edit.strokes.clone();
        strokes.push(BrushStroke {
            points,
            size: self.edit.brush_size,
        });
        let mask = markup::stroke_mask(source, &strokes)?;
        self.edit.mask = Some(mask);
        self.edit.strokes = strokes;
        Ok(())
    }

    /// Turn a closed lasso outline into the mask
    pub fn apply_lasso(&mut self, outline: &[(f32, f32)]) -> Result<()> {
        let Some(source) = &self.source else {
            return Err(ValidationError::UploadSource.into());
        };
        let mask = markup::polygon_mask(source, outline)?;
        self.edit.set_mask(Some(mask));
        Ok(())
    }

    /// Switch the active mode.
    ///
    /// Transient flags are always reset. When the mode actually changes the
    /// source is swapped per `transitions::plan`, the mode's prompt defaults
    /// are applied unless a restore just asked to keep its prompts, and any
    /// running job is marked stale.
    pub fn set_mode(&mut self, to: Mode) {
        let from = self.mode;
        let patch = transitions::plan(from, to);

        self.selecting_area = false;
        self.edit.reset_tools();

        match patch.source {
            SourceSwap::Keep => {}
            SourceSwap::StashShared => {
                self.shared_source = self.source.take();
                self.source = self.prompt_source.clone();
            }
            SourceSwap::RestoreShared => self.source = self.shared_source.take(),
            SourceSwap::Clear => self.source = None,
        }

        if from != to {
            tracing::debug!("mode {from} -> {to}");
            self.mode = to;
            self.slot.mark_stale();
            self.suggestion.mark_stale();
        }

        if let Some(defaults) = patch.defaults {
            if self.suppress_defaults {
                tracing::debug!("keeping restored prompts for {to}");
            } else {
                self.apply_defaults(defaults);
            }
        }
        self.suppress_defaults = false;
    }

    fn apply_defaults(&mut self, defaults: PromptDefaults) {
        let (prompt, negative) = defaults.texts(self.locale);
        self.prompt = prompt;
        self.negative_prompt = negative;
        if defaults == PromptDefaults::PlanTo3d {
            self.plan_mode = PlanMode::Render;
        }
    }

    /// Set or clear the source image of the active mode.
    ///
    /// Returns the plan prompt suggestion job when the upload lands in the
    /// plan render mode; the caller runs it and hands the result to
    /// `complete_plan_suggestion`.
    pub fn upload_source_image(&mut self, image: Option<SourceImage>) -> Option<PendingJob> {
        let Some(image) = image else {
            if self.mode != Mode::CanvaMix {
                self.source = None;
            }
            return None;
        };

        self.slot.mark_stale();
        self.edit.clear_inputs();
        self.selecting_area = false;
        self.outputs.video_url = None;

        match self.mode {
            Mode::CanvaMix => {
                self.canva.clear();
                self.outputs.clear_images();
            }
            Mode::PromptGen => {
                self.prompt_source = Some(image.clone());
                self.outputs.prompts = None;
            }
            _ => self.outputs.show_single(image.to_data_url()),
        }
        self.source = Some(image.clone());

        if self.mode == Mode::PlanTo3d && self.plan_mode == PlanMode::Render {
            self.prompt = self.locale.text(Text::Generating).to_string();
            return Some(self.begin_plan_suggestion(image));
        }
        None
    }

    /// Copy a history item back into the session
    pub fn restore_history(&mut self, item: &HistoryItem) {
        tracing::info!("↩️  Restoring {} item {}", item.mode, item.id);
        self.suppress_defaults = true;
        self.set_mode(item.mode);
        self.slot.mark_stale();

        self.source = item.source.clone();
        self.edit.second_image = item.second_source.clone();
        self.edit.clear_mask();
        if item.mode == Mode::Edit {
            self.edit.reference = item.reference.clone();
            self.reference = None;
        } else {
            self.edit.reference = None;
            self.reference = item.reference.clone();
        }

        self.prompt = item.prompt.clone();
        self.last_used_prompt = item.prompt.clone();
        self.negative_prompt = item.negative_prompt.clone();
        if item.image_count > 0 {
            self.set_image_count(item.image_count);
        }
        if let Some(model) = &item.video_model {
            self.video_model = model.clone();
        }

        self.outputs.show_images(item.generated_images.clone());
        self.outputs.video_url = item.video_url.clone();

        match item.utility_record() {
            Some(record) => self.utilities.restore(&record, item),
            None => self.utilities.reset_blocks(),
        }

        if item.mode == Mode::PromptGen {
            self.outputs.prompts = item.generated_prompts.clone();
            self.prompt_source = item.source.clone();
        } else {
            self.outputs.prompts = None;
            self.prompt_source = None;
        }
    }

    fn selected_output(&self) -> Result<(ImageUrl, SourceImage)> {
        let url = self
            .outputs
            .selected
            .clone()
            .ok_or(ValidationError::NoSelection)?;
        let image = SourceImage::from_data_url(&url)?;
        Ok((url, image))
    }

    /// Use the selected output as the new source of the current mode
    pub fn set_as_source_image(&mut self) -> Result<()> {
        let (url, image) = self.selected_output()?;
        self.slot.mark_stale();

        self.source = Some(image);
        self.outputs.show_single(url);
        self.outputs.video_url = None;
        self.outputs.prompts = None;
        self.reference = None;
        self.edit.clear_inputs();
        self.selecting_area = false;

        let (prompt, _) = PromptDefaults::for_mode(self.mode).texts(self.locale);
        self.prompt = prompt;
        self.negative_prompt.clear();
        Ok(())
    }

    /// Open the selected output in the edit mode
    pub fn start_editing(&mut self) -> Result<()> {
        let (url, image) = self.selected_output()?;
        self.set_mode(Mode::Edit);

        self.source = Some(image);
        self.outputs.show_single(url);
        self.outputs.video_url = None;
        self.outputs.prompts = None;
        self.reference = None;
        self.edit.clear_inputs();
        self.prompt.clear();
        self.negative_prompt.clear();
        Ok(())
    }

    /// Start a virtual tour from an upload, or reset it with `None`
    pub fn start_tour(&mut self, image: Option<SourceImage>) {
        self.slot.mark_stale();
        self.utilities.tour.start(image.as_ref());
    }

    /// Add a decor object to the canva board and select it
    pub fn add_canva_object(&mut self, image: SourceImage) -> usize {
        self.canva.add_object(image)
    }

    /// Remove the selected decor object together with its transform
    pub fn delete_selected_object(&mut self) -> bool {
        self.canva.delete_selected()
    }

    pub(crate) fn apply_plan_suggestion(&mut self, suggestion: Option<String>) {
        self.prompt = match suggestion {
            Some(text) => text,
            None => self.locale.text(Text::PromptPlanTo3d).to_string(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::UpscaleLevel;
    use crate::state::history::UtilityRecord;
    use crate::state::utilities::{MoodboardState, Utility};

    fn image(tag: &str) -> SourceImage {
        SourceImage::new(tag, "image/png")
    }

    fn photo(width: u32, height: u32) -> SourceImage {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([120, 110, 100, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        SourceImage::from_bytes(&out.into_inner()).unwrap()
    }

    fn mask_pixels(mask: &SourceImage) -> image::GrayImage {
        image::load_from_memory(&mask.decode().unwrap()).unwrap().to_luma8()
    }

    #[test]
    fn test_brush_strokes_accumulate_into_mask() {
        let mut session = Session::new(Locale::En);
        session.set_mode(Mode::Edit);
        assert!(session.paint_mask_stroke(vec![(50.0, 50.0)]).is_err());

        session.upload_source_image(Some(photo(100, 100)));
        assert!(session.is_editing_mask());
        session.edit.set_brush_size(8);
        session.paint_mask_stroke(vec![(10.0, 10.0), (30.0, 10.0)]).unwrap();
        session.edit.set_brush_size(4);
        session.paint_mask_stroke(vec![(80.0, 80.0)]).unwrap();

        assert_eq!(session.edit.strokes.len(), 2);
        assert_eq!(session.edit.strokes[0].size, 8);
        let mask = mask_pixels(session.edit.mask.as_ref().unwrap());
        assert_eq!(mask.get_pixel(20, 10).0, [255]);
        assert_eq!(mask.get_pixel(80, 80).0, [255]);
        assert_eq!(mask.get_pixel(50, 50).0, [0]);
    }

    #[test]
    fn test_lasso_replaces_painted_mask() {
        let mut session = Session::new(Locale::En);
        session.set_mode(Mode::Edit);
        session.upload_source_image(Some(photo(60, 60)));
        session.paint_mask_stroke(vec![(90.0, 90.0)]).unwrap();

        session.apply_lasso(&[(0.0, 0.0), (50.0, 0.0), (50.0, 50.0), (0.0, 50.0)]).unwrap();

        assert!(session.edit.strokes.is_empty());
        let mask = mask_pixels(session.edit.mask.as_ref().unwrap());
        assert_eq!(mask.get_pixel(10, 10).0, [255]);
        assert_eq!(mask.get_pixel(54, 54).0, [0]);
    }

    #[test]
    fn test_initial_defaults() {
        let session = Session::new(Locale::En);
        assert_eq!(session.mode(), Mode::Create);
        assert_eq!(session.prompt, Locale::En.text(Text::PromptInitial));
        assert_eq!(session.negative_prompt, Locale::En.text(Text::DefaultNegativePrompt));
        assert_eq!(session.image_count, DEFAULT_IMAGE_COUNT);
        assert!(!session.is_loading());
    }

    #[test]
    fn test_switch_applies_defaults() {
        let mut session = Session::new(Locale::En);
        session.prompt = "my own words".into();
        session.plan_mode = PlanMode::Colorize;

        session.set_mode(Mode::PlanTo3d);
        assert_eq!(session.prompt, Locale::En.text(Text::PromptPlanTo3d));
        assert!(session.negative_prompt.is_empty());
        assert_eq!(session.plan_mode, PlanMode::Render);

        session.set_mode(Mode::Edit);
        assert!(session.prompt.is_empty());
    }

    #[test]
    fn test_same_mode_only_resets_flags() {
        let mut session = Session::new(Locale::En);
        session.prompt = "keep me".into();
        session.selecting_area = true;
        session.set_mode(Mode::Create);
        assert_eq!(session.prompt, "keep me");
        assert!(!session.selecting_area);
    }

    #[test]
    fn test_restore_suppresses_defaults_once() {
        let mut session = Session::new(Locale::En);
        let item = HistoryItem::new(Mode::Edit, "replace the sofa").with_images(2, vec!["x".into()]);

        session.restore_history(&item);
        assert_eq!(session.mode(), Mode::Edit);
        assert_eq!(session.prompt, "replace the sofa");

        session.set_mode(Mode::Create);
        assert_eq!(session.prompt, Locale::En.text(Text::PromptInitial));
        session.set_mode(Mode::Edit);
        assert!(session.prompt.is_empty());
    }

    #[test]
    fn test_restore_into_same_mode_consumes_flag() {
        let mut session = Session::new(Locale::En);
        session.restore_history(&HistoryItem::new(Mode::Create, "modern villa"));
        assert_eq!(session.prompt, "modern villa");

        session.set_mode(Mode::Video);
        assert!(session.prompt.is_empty());
    }

    #[test]
    fn test_prompt_mode_keeps_its_own_source() {
        let mut session = Session::new(Locale::En);
        session.upload_source_image(Some(image("shared")));

        session.set_mode(Mode::PromptGen);
        assert_eq!(session.source, None);
        session.upload_source_image(Some(image("analysed")));
        assert_eq!(session.prompt_source(), &Some(image("analysed")));

        session.set_mode(Mode::Edit);
        assert_eq!(session.source, Some(image("shared")));

        session.set_mode(Mode::PromptGen);
        assert_eq!(session.source, Some(image("analysed")));

        session.set_mode(Mode::Utilities);
        assert_eq!(session.source, None);
    }

    #[test]
    fn test_upload_side_effects() {
        let mut session = Session::new(Locale::En);
        session.set_mode(Mode::Edit);
        session.edit.mask = Some(image("mask"));
        session.edit.second_image = Some(image("second"));
        session.outputs.video_url = Some("clip.mp4".into());

        assert!(session.upload_source_image(Some(image("room"))).is_none());
        assert_eq!(session.edit.mask, None);
        assert_eq!(session.edit.second_image, None);
        assert_eq!(session.outputs.video_url, None);
        assert_eq!(session.outputs.images, vec![image("room").to_data_url()]);

        session.upload_source_image(None);
        assert_eq!(session.source, None);
    }

    #[test]
    fn test_canva_upload_resets_board() {
        let mut session = Session::new(Locale::En);
        session.set_mode(Mode::CanvaMix);
        session.upload_source_image(Some(image("bg")));
        session.add_canva_object(image("lamp"));
        session.outputs.show_images(vec!["old".into()]);

        session.upload_source_image(Some(image("bg2")));
        assert!(session.canva.is_empty());
        assert!(session.outputs.images.is_empty());

        session.upload_source_image(None);
        assert_eq!(session.source, Some(image("bg2")));
    }

    #[test]
    fn test_plan_upload_starts_suggestion() {
        let mut session = Session::new(Locale::En);
        session.set_mode(Mode::PlanTo3d);
        let job = session.upload_source_image(Some(image("plan")));
        assert!(job.is_some());
        assert_eq!(session.prompt, Locale::En.text(Text::Generating));

        session.plan_mode = PlanMode::Colorize;
        assert!(session.upload_source_image(Some(image("plan2"))).is_none());
    }

    #[test]
    fn test_restore_upscale_touches_only_its_block() {
        let mut session = Session::new(Locale::En);
        session.utilities.moodboard.prompt = "scandi".into();
        let moodboard = session.utilities.moodboard.clone();

        let mut item = HistoryItem::new(Mode::Utilities, "Upscale: balanced")
            .with_source(Some(image("house")))
            .with_images(1, vec!["data:image/png;base64,up".into()]);
        item.utility = None;

        session.restore_history(&item);

        assert_eq!(session.utilities.active, Some(Utility::Upscale));
        assert_eq!(session.utilities.upscale.level, UpscaleLevel::Balanced);
        assert_eq!(
            session.utilities.upscale.gallery.images,
            vec!["data:image/png;base64,up".to_string()]
        );
        assert_eq!(session.utilities.upscale.source, Some(image("house")));
        assert_eq!(session.utilities.moodboard, moodboard);
    }

    #[test]
    fn test_restore_non_utility_resets_blocks() {
        let mut session = Session::new(Locale::En);
        session.utilities.moodboard.prompt = "scandi".into();
        session.restore_history(&HistoryItem::new(Mode::Create, "villa"));
        assert_eq!(session.utilities.moodboard, MoodboardState::default());
    }

    #[test]
    fn test_restore_prompt_mode_item() {
        let mut session = Session::new(Locale::En);
        let item = HistoryItem::new(Mode::PromptGen, "Architectural prompts generated from image")
            .with_source(Some(image("analysed")))
            .with_prompts("1. loft".into());

        session.restore_history(&item);
        assert_eq!(session.outputs.prompts.as_deref(), Some("1. loft"));
        assert_eq!(session.prompt_source(), &Some(image("analysed")));

        let tagged = HistoryItem::for_utility(UtilityRecord::Moodboard, "japandi");
        session.restore_history(&tagged);
        assert_eq!(session.outputs.prompts, None);
        assert_eq!(session.utilities.moodboard.prompt, "japandi");
    }

    #[test]
    fn test_restoring_other_mode_forgets_analysed_image() {
        let mut session = Session::new(Locale::En);
        session.set_mode(Mode::PromptGen);
        session.upload_source_image(Some(image("analysed")));

        session.restore_history(&HistoryItem::new(Mode::Create, "villa"));
        assert_eq!(session.prompt_source(), &None);

        session.set_mode(Mode::PromptGen);
        assert_eq!(session.source, None);
    }

    #[test]
    fn test_set_as_source_and_start_editing() {
        let mut session = Session::new(Locale::En);
        assert!(session.set_as_source_image().is_err());

        let url = image("render").to_data_url();
        session.outputs.show_images(vec![url.clone(), "data:image/png;base64,other".into()]);
        session.reference = Some(image("ref"));
        session.outputs.video_url = Some("clip".into());

        session.set_as_source_image().unwrap();
        assert_eq!(session.source, Some(image("render")));
        assert_eq!(session.outputs.images, vec![url.clone()]);
        assert_eq!(session.reference, None);
        assert_eq!(session.outputs.video_url, None);
        assert_eq!(session.prompt, Locale::En.text(Text::PromptInitial));
        assert!(session.negative_prompt.is_empty());

        session.start_editing().unwrap();
        assert_eq!(session.mode(), Mode::Edit);
        assert_eq!(session.source, Some(image("render")));
        assert!(session.prompt.is_empty());
        assert_eq!(session.edit.mask, None);
    }

    #[test]
    fn test_image_count_is_clamped() {
        let mut session = Session::new(Locale::En);
        session.set_image_count(0);
        assert_eq!(session.image_count, 1);
        session.set_image_count(9);
        assert_eq!(session.image_count, MAX_IMAGE_COUNT);
    }
}
