/// Request construction
///
/// Turns the session's current inputs into exactly one service request plus
/// the place its output goes. Validation happens here, before anything is
/// sent; the checks run in a fixed order so the user always sees the first
/// missing input.

use crate::error::{Result, ValidationError};
use crate::locale::Text;
use crate::service::{
    AnalysisRequest, BriefRequest, EditRequest, ExtendViewRequest, FurnitureRequest, ImageRequest,
    LightingRequest, MergeRequest, MoodboardRequest, UpscaleRequest, VideoRequest,
};
use crate::state::data::{AspectRatio, Mode, PlanMode, SourceImage};
use crate::state::edit::EditInputs;
use crate::state::history::{HistoryItem, UtilityRecord};
use crate::state::session::Session;
use crate::state::utilities::Utility;

use super::prompts;

/// Something the user asked the studio to generate
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationAction {
    /// The generate button of the active mode
    Main,
    /// Close-ups of the area marked on this image (camera angle mode)
    AreaCloseUp(SourceImage),
    /// Render one of the prompts suggested in the prompt mode
    FromPrompt(String),
    /// Describe the source image into the prompt field
    DescribeSource,
    Moodboard,
    Lighting,
    VideoScript,
    ExtendView,
    /// Write the style-change prompt (text only)
    StylePrompt,
    /// Render images from the written style-change prompt
    StyleImages,
    Upscale,
    /// Walk the virtual tour one step in the described direction
    TourNavigate(String),
}

/// One call to the generation service
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationRequest {
    Images(ImageRequest),
    Edit(EditRequest),
    Merge(MergeRequest),
    Video(VideoRequest),
    PromptFromImage(AnalysisRequest),
    PromptFromPlan(AnalysisRequest),
    ArchitecturalPrompts(AnalysisRequest),
    Furniture(FurnitureRequest),
    Moodboard(MoodboardRequest),
    Lighting(LightingRequest),
    ExtendView(ExtendViewRequest),
    Upscale(UpscaleRequest),
    StyleChangePrompt(BriefRequest),
    VideoScriptPrompt(BriefRequest),
}

impl GenerationRequest {
    /// Operation name, also the HTTP path segment
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Images(_) => "images",
            Self::Edit(_) => "edit",
            Self::Merge(_) => "merge",
            Self::Video(_) => "video",
            Self::PromptFromImage(_) => "prompt-from-image",
            Self::PromptFromPlan(_) => "prompt-from-plan",
            Self::ArchitecturalPrompts(_) => "architectural-prompts",
            Self::Furniture(_) => "furniture",
            Self::Moodboard(_) => "moodboard",
            Self::Lighting(_) => "lighting",
            Self::ExtendView(_) => "extend-view",
            Self::Upscale(_) => "upscale",
            Self::StyleChangePrompt(_) => "style-change-prompt",
            Self::VideoScriptPrompt(_) => "video-script-prompt",
        }
    }
}

/// Where a finished job's output is written.
/// History items are drafted up front and completed with the output.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Target {
    Gallery { history: HistoryItem },
    Video { history: HistoryItem, model: String },
    PromptList { history: HistoryItem },
    PromptField,
    UtilityGallery { utility: Utility, history: HistoryItem },
    VideoScript { history: HistoryItem },
    StylePrompt,
    TourFrame,
}

#[derive(Debug)]
pub(crate) struct Plan {
    pub request: GenerationRequest,
    pub target: Target,
    pub message: Text,
}

fn require(image: &Option<SourceImage>, missing: ValidationError) -> std::result::Result<SourceImage, ValidationError> {
    image.clone().ok_or(missing)
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Validate the session for `action` and build its request
pub(crate) fn build(session: &Session, action: &GenerationAction) -> Result<Plan> {
    let locale = session.locale();
    let count = session.image_count;

    let plan = match action {
        GenerationAction::Main => build_main(session)?,

        GenerationAction::AreaCloseUp(marked) => {
            let source = require(&session.source, ValidationError::UploadSource)?;
            let history_prompt = locale.text(Text::PromptCloseUp);
            Plan {
                request: GenerationRequest::Images(ImageRequest {
                    image: Some(marked.clone()),
                    prompt: prompts::close_up(count),
                    count,
                    reference: None,
                    aspect_ratio: AspectRatio::FALLBACK,
                    locale,
                    negative_prompt: None,
                }),
                target: Target::Gallery {
                    history: HistoryItem::new(session.mode(), history_prompt)
                        .with_source(Some(source))
                        .with_images(count, Vec::new()),
                },
                message: Text::LoadingStart,
            }
        }

        GenerationAction::FromPrompt(selected) => {
            let source = require(session.prompt_source(), ValidationError::NoSourceForPrompt)?;
            let prompt = non_empty(selected).ok_or(ValidationError::EnterPrompt)?;
            Plan {
                request: GenerationRequest::Images(ImageRequest {
                    image: Some(source.clone()),
                    prompt: prompt.clone(),
                    count,
                    reference: None,
                    aspect_ratio: AspectRatio::FALLBACK,
                    locale,
                    negative_prompt: None,
                }),
                target: Target::Gallery {
                    history: HistoryItem::new(Mode::Create, prompt)
                        .with_source(Some(source))
                        .with_images(count, Vec::new()),
                },
                message: Text::LoadingStart,
            }
        }

        GenerationAction::DescribeSource => {
            let image = require(&session.source, ValidationError::UploadSource)?;
            Plan {
                request: GenerationRequest::PromptFromImage(AnalysisRequest { image, locale }),
                target: Target::PromptField,
                message: Text::Generating,
            }
        }

        GenerationAction::Moodboard => {
            let block = &session.utilities.moodboard;
            let image = require(&block.source, ValidationError::Moodboard)?;
            let prompt = non_empty(&block.prompt).ok_or(ValidationError::Moodboard)?;
            Plan {
                request: GenerationRequest::Moodboard(MoodboardRequest {
                    image: image.clone(),
                    prompt: prompt.clone(),
                    reference: block.reference.clone(),
                    count: block.image_count,
                    locale,
                }),
                target: Target::UtilityGallery {
                    utility: Utility::Moodboard,
                    history: HistoryItem::for_utility(UtilityRecord::Moodboard, &prompt)
                        .with_source(Some(image))
                        .with_reference(block.reference.clone())
                        .with_images(block.image_count, Vec::new()),
                },
                message: Text::GeneratingMoodboard,
            }
        }

        GenerationAction::Lighting => {
            let block = &session.utilities.lighting;
            let image = require(&block.source, ValidationError::Lighting)?;
            let prompt = non_empty(&block.combined_prompt()).ok_or(ValidationError::Lighting)?;
            Plan {
                request: GenerationRequest::Lighting(LightingRequest {
                    image: image.clone(),
                    prompt: prompt.clone(),
                    count: block.image_count,
                    locale,
                }),
                target: Target::UtilityGallery {
                    utility: Utility::Lighting,
                    history: HistoryItem::for_utility(UtilityRecord::Lighting { prompt }, "")
                        .with_source(Some(image))
                        .with_images(block.image_count, Vec::new()),
                },
                message: Text::GeneratingLighting,
            }
        }

        GenerationAction::VideoScript => {
            let block = &session.utilities.video_prompt;
            let image = require(&block.source, ValidationError::VideoPrompt)?;
            let brief = non_empty(&block.user_prompt).ok_or(ValidationError::VideoPrompt)?;
            Plan {
                request: GenerationRequest::VideoScriptPrompt(BriefRequest {
                    image: image.clone(),
                    brief: brief.clone(),
                    locale,
                }),
                target: Target::VideoScript {
                    history: HistoryItem::for_utility(UtilityRecord::VideoScript { request: brief }, "")
                        .with_source(Some(image)),
                },
                message: Text::GeneratingVideoPrompt,
            }
        }

        GenerationAction::ExtendView => {
            let block = &session.utilities.extend_view;
            let image = require(&block.source, ValidationError::UploadSource)?;
            let aspect_ratio = block.aspect_ratio.resolve(AspectRatio::Wide);
            Plan {
                request: GenerationRequest::ExtendView(ExtendViewRequest {
                    image: image.clone(),
                    aspect_ratio,
                    count: block.image_count,
                    locale,
                }),
                target: Target::UtilityGallery {
                    utility: Utility::ExtendView,
                    history: HistoryItem::for_utility(UtilityRecord::ExtendView { aspect_ratio }, "")
                        .with_source(Some(image))
                        .with_images(block.image_count, Vec::new()),
                },
                message: Text::GeneratingExtendedView,
            }
        }

        GenerationAction::StylePrompt => {
            let block = &session.utilities.change_style;
            let image = require(&block.source, ValidationError::StylePromptGen)?;
            let brief = non_empty(&block.user_prompt).ok_or(ValidationError::StylePromptGen)?;
            Plan {
                request: GenerationRequest::StyleChangePrompt(BriefRequest { image, brief, locale }),
                target: Target::StylePrompt,
                message: Text::GeneratingStylePrompt,
            }
        }

        GenerationAction::StyleImages => {
            let block = &session.utilities.change_style;
            let image = require(&block.source, ValidationError::StyleChange)?;
            let prompt = block
                .generated_prompt
                .as_deref()
                .and_then(non_empty)
                .ok_or(ValidationError::StyleChange)?;
            Plan {
                request: GenerationRequest::Images(ImageRequest {
                    image: Some(image.clone()),
                    prompt: prompt.clone(),
                    count: block.image_count,
                    reference: None,
                    aspect_ratio: AspectRatio::FALLBACK,
                    locale,
                    negative_prompt: None,
                }),
                target: Target::UtilityGallery {
                    utility: Utility::ChangeStyle,
                    history: HistoryItem::for_utility(UtilityRecord::ChangeStyle { prompt }, "")
                        .with_source(Some(image))
                        .with_images(block.image_count, Vec::new()),
                },
                message: Text::GeneratingStyledImages,
            }
        }

        GenerationAction::Upscale => {
            let block = &session.utilities.upscale;
            let image = require(&block.source, ValidationError::Upscale)?;
            Plan {
                request: GenerationRequest::Upscale(UpscaleRequest {
                    image: image.clone(),
                    level: block.level,
                    locale,
                }),
                target: Target::UtilityGallery {
                    utility: Utility::Upscale,
                    history: HistoryItem::for_utility(UtilityRecord::Upscale { level: block.level }, "")
                        .with_source(Some(image))
                        .with_images(1, Vec::new()),
                },
                message: Text::GeneratingUpscale,
            }
        }

        GenerationAction::TourNavigate(direction) => {
            let image = session.utilities.tour.current_image()?;
            let prompt = non_empty(direction).ok_or(ValidationError::EnterPrompt)?;
            Plan {
                request: GenerationRequest::Images(ImageRequest {
                    image: Some(image),
                    prompt,
                    count: 1,
                    reference: None,
                    aspect_ratio: AspectRatio::FALLBACK,
                    locale,
                    negative_prompt: None,
                }),
                target: Target::TourFrame,
                message: Text::LoadingTourFrame,
            }
        }
    };
    Ok(plan)
}

fn build_main(session: &Session) -> std::result::Result<Plan, ValidationError> {
    let mode = session.mode();
    let locale = session.locale();
    let count = session.image_count;
    let prompt = session.prompt.trim().to_string();

    if mode == Mode::Utilities {
        return Err(ValidationError::UseUtility);
    }
    if mode == Mode::CanvaMix && session.source.is_none() {
        return Err(ValidationError::UploadBackground);
    }
    if mode == Mode::Create && prompt.is_empty() {
        return Err(ValidationError::EnterPrompt);
    }
    if session.source.is_none() && !matches!(mode, Mode::Create | Mode::PromptGen) {
        return Err(ValidationError::UploadSource);
    }
    let edit_inputs = match mode {
        Mode::Edit => Some(session.edit.required_inputs()?),
        _ => None,
    };
    if mode == Mode::CanvaMix && session.canva.is_empty() {
        return Err(ValidationError::UploadDecor);
    }
    if mode == Mode::CameraAngle && prompt.is_empty() {
        return Err(ValidationError::EnterPrompt);
    }

    let source = session.source.clone();
    let gallery = |history: HistoryItem| Target::Gallery {
        history: history.with_images(count, Vec::new()),
    };

    let plan = match mode {
        Mode::Create => {
            let negative = non_empty(&session.negative_prompt);
            Plan {
                request: GenerationRequest::Images(ImageRequest {
                    image: source.clone(),
                    prompt: prompt.clone(),
                    count,
                    reference: session.reference.clone(),
                    aspect_ratio: session.aspect_ratio.resolve(AspectRatio::FALLBACK),
                    locale,
                    negative_prompt: negative.clone(),
                }),
                target: gallery(
                    HistoryItem::new(mode, prompt)
                        .with_source(source)
                        .with_reference(session.reference.clone())
                        .with_negative_prompt(negative.unwrap_or_default()),
                ),
                message: Text::LoadingStart,
            }
        }
        Mode::CameraAngle => Plan {
            request: GenerationRequest::Images(ImageRequest {
                image: source.clone(),
                prompt: prompts::camera_angle(&prompt),
                count,
                reference: None,
                aspect_ratio: AspectRatio::FALLBACK,
                locale,
                negative_prompt: None,
            }),
            target: gallery(HistoryItem::new(mode, prompt).with_source(source)),
            message: Text::LoadingStart,
        },
        Mode::PlanTo3d => {
            let reference = match session.plan_mode {
                PlanMode::Render => session.reference.clone(),
                PlanMode::Colorize => None,
            };
            Plan {
                request: GenerationRequest::Images(ImageRequest {
                    image: source.clone(),
                    prompt: prompts::plan(session.plan_mode, &prompt),
                    count,
                    reference: reference.clone(),
                    aspect_ratio: AspectRatio::FALLBACK,
                    locale,
                    negative_prompt: None,
                }),
                target: gallery(
                    HistoryItem::new(mode, prompt)
                        .with_source(source)
                        .with_reference(reference),
                ),
                message: Text::LoadingStart,
            }
        }
        Mode::Edit => {
            let image = require(&source, ValidationError::UploadSource)?;
            match edit_inputs {
                Some(EditInputs::Inpaint { mask, reference }) => Plan {
                    request: GenerationRequest::Edit(EditRequest {
                        image: image.clone(),
                        mask,
                        prompt: prompt.clone(),
                        count,
                        reference: reference.clone(),
                        locale,
                    }),
                    target: gallery(
                        HistoryItem::new(mode, prompt)
                            .with_source(Some(image))
                            .with_reference(reference),
                    ),
                    message: Text::LoadingStart,
                },
                Some(EditInputs::Merge { second_image }) => Plan {
                    request: GenerationRequest::Merge(MergeRequest {
                        image_a: image.clone(),
                        image_b: second_image.clone(),
                        prompt: prompt.clone(),
                        count,
                    }),
                    target: gallery(
                        HistoryItem::new(mode, prompt)
                            .with_source(Some(image))
                            .with_second_source(Some(second_image)),
                    ),
                    message: Text::LoadingStart,
                },
                None => return Err(ValidationError::DrawMask),
            }
        }
        Mode::Video => {
            let image = require(&source, ValidationError::UploadSource)?;
            Plan {
                request: GenerationRequest::Video(VideoRequest {
                    image: image.clone(),
                    prompt: prompt.clone(),
                    model: session.video_model.clone(),
                }),
                target: Target::Video {
                    history: HistoryItem::new(mode, prompt).with_source(Some(image)),
                    model: session.video_model.clone(),
                },
                message: Text::LoadingStart,
            }
        }
        Mode::CanvaMix => {
            let background = require(&source, ValidationError::UploadBackground)?;
            Plan {
                request: GenerationRequest::Furniture(FurnitureRequest {
                    background: background.clone(),
                    placements: session.canva.placements(),
                    count,
                    locale,
                }),
                target: gallery(
                    HistoryItem::new(mode, locale.text(Text::PromptCanvaMix)).with_source(Some(background)),
                ),
                message: Text::LoadingStart,
            }
        }
        Mode::PromptGen => {
            let image = require(&source, ValidationError::UploadSource)?;
            Plan {
                request: GenerationRequest::ArchitecturalPrompts(AnalysisRequest {
                    image: image.clone(),
                    locale,
                }),
                target: Target::PromptList {
                    history: HistoryItem::new(mode, locale.text(Text::PromptArchitecturalGenerated))
                        .with_source(Some(image)),
                },
                message: Text::LoadingAnalyzePrompts,
            }
        }
        Mode::Utilities => return Err(ValidationError::UseUtility),
    };
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StudioError;
    use crate::locale::Locale;
    use crate::state::edit::EditSubMode;

    fn image(tag: &str) -> SourceImage {
        SourceImage::new(tag, "image/png")
    }

    fn validation(session: &Session, action: GenerationAction) -> ValidationError {
        match build(session, &action) {
            Err(StudioError::Validation(err)) => err,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_order() {
        let mut session = Session::new(Locale::En);
        session.set_mode(Mode::CanvaMix);
        assert_eq!(validation(&session, GenerationAction::Main), ValidationError::UploadBackground);

        session.upload_source_image(Some(image("bg")));
        assert_eq!(validation(&session, GenerationAction::Main), ValidationError::UploadDecor);

        session.set_mode(Mode::Create);
        session.prompt.clear();
        assert_eq!(validation(&session, GenerationAction::Main), ValidationError::EnterPrompt);

        session.set_mode(Mode::Video);
        session.upload_source_image(None);
        assert_eq!(validation(&session, GenerationAction::Main), ValidationError::UploadSource);

        session.set_mode(Mode::Utilities);
        assert_eq!(validation(&session, GenerationAction::Main), ValidationError::UseUtility);
    }

    #[test]
    fn test_edit_needs_mask_or_second_image() {
        let mut session = Session::new(Locale::En);
        session.set_mode(Mode::Edit);
        session.upload_source_image(Some(image("room")));
        assert_eq!(validation(&session, GenerationAction::Main), ValidationError::DrawMask);

        session.edit.sub_mode = EditSubMode::MergeObject;
        assert_eq!(validation(&session, GenerationAction::Main), ValidationError::UploadBothImages);

        session.edit.second_image = Some(image("chair"));
        let plan = build(&session, &GenerationAction::Main).unwrap();
        assert_eq!(plan.request.operation(), "merge");
    }

    #[test]
    fn test_camera_angle_wraps_prompt() {
        let mut session = Session::new(Locale::En);
        session.set_mode(Mode::CameraAngle);
        session.upload_source_image(Some(image("house")));
        assert_eq!(validation(&session, GenerationAction::Main), ValidationError::EnterPrompt);

        session.prompt = "bird's eye view".into();
        let plan = build(&session, &GenerationAction::Main).unwrap();
        match plan.request {
            GenerationRequest::Images(request) => {
                assert!(request.prompt.contains("\"bird's eye view\""));
                assert_eq!(request.aspect_ratio, AspectRatio::Landscape);
                assert_eq!(request.reference, None);
            }
            other => panic!("unexpected request {other:?}"),
        }
        match plan.target {
            Target::Gallery { history } => assert_eq!(history.prompt, "bird's eye view"),
            other => panic!("unexpected target {other:?}"),
        }
    }

    #[test]
    fn test_create_resolves_auto_ratio_and_negative() {
        let mut session = Session::new(Locale::En);
        session.prompt = "modern villa".into();
        session.negative_prompt = "  ".into();
        let plan = build(&session, &GenerationAction::Main).unwrap();
        match plan.request {
            GenerationRequest::Images(request) => {
                assert_eq!(request.aspect_ratio, AspectRatio::FALLBACK);
                assert_eq!(request.negative_prompt, None);
                assert_eq!(request.image, None);
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn test_colorize_drops_reference() {
        let mut session = Session::new(Locale::En);
        session.set_mode(Mode::PlanTo3d);
        session.source = Some(image("plan"));
        session.reference = Some(image("style"));
        session.plan_mode = PlanMode::Colorize;
        let plan = build(&session, &GenerationAction::Main).unwrap();
        match plan.request {
            GenerationRequest::Images(request) => assert_eq!(request.reference, None),
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn test_utility_preconditions() {
        let mut session = Session::new(Locale::En);
        session.set_mode(Mode::Utilities);
        assert_eq!(validation(&session, GenerationAction::Moodboard), ValidationError::Moodboard);
        assert_eq!(validation(&session, GenerationAction::Lighting), ValidationError::Lighting);
        assert_eq!(validation(&session, GenerationAction::VideoScript), ValidationError::VideoPrompt);
        assert_eq!(validation(&session, GenerationAction::StylePrompt), ValidationError::StylePromptGen);
        assert_eq!(validation(&session, GenerationAction::StyleImages), ValidationError::StyleChange);
        assert_eq!(validation(&session, GenerationAction::Upscale), ValidationError::Upscale);
        assert_eq!(
            validation(&session, GenerationAction::TourNavigate("turn left".into())),
            ValidationError::TourNotStarted
        );

        session.utilities.lighting.source = Some(image("facade"));
        session.utilities.lighting.exterior = "blue hour with facade lights on".into();
        let plan = build(&session, &GenerationAction::Lighting).unwrap();
        match plan.target {
            Target::UtilityGallery { history, .. } => {
                assert_eq!(history.prompt, "Lighting: blue hour with facade lights on")
            }
            other => panic!("unexpected target {other:?}"),
        }
    }

    #[test]
    fn test_from_prompt_needs_analysed_image() {
        let session = Session::new(Locale::En);
        assert_eq!(
            validation(&session, GenerationAction::FromPrompt("a brick loft".into())),
            ValidationError::NoSourceForPrompt
        );
    }
}
