/// Generation flow: prepare, execute, complete
///
/// A job is split in three so the UI can run the service call as a
/// background task while the session stays on the UI thread:
///
/// 1. `Session::prepare` validates, claims the task slot and builds the request
/// 2. `execute` sends it to a `GenerationService`
/// 3. `Session::complete` releases the slot and writes the output
///
/// `Session::run` chains the three for callers that can hold the session
/// across the await.

use crate::error::{Result, ServiceError, StudioError};
use crate::locale::Text;
use crate::service::{AnalysisRequest, GenerationService};
use crate::state::data::{ImageUrl, Mode, SourceImage};
use crate::state::history::HistoryItem;
use crate::state::session::Session;

use super::request::{self, GenerationAction, GenerationRequest, Target};
use super::slot::{Finished, Ticket};

/// What a service call produced
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceOutput {
    Images(Vec<ImageUrl>),
    Video(String),
    Text(String),
}

impl ServiceOutput {
    fn kind(&self) -> &'static str {
        match self {
            Self::Images(_) => "images",
            Self::Video(_) => "video",
            Self::Text(_) => "text",
        }
    }

    fn mismatch(&self, expected: &str) -> StudioError {
        ServiceError::Decode(format!("expected {expected} output, got {}", self.kind())).into()
    }

    fn into_images(self) -> Result<Vec<ImageUrl>> {
        match self {
            Self::Images(images) if images.is_empty() => Err(StudioError::EmptyResult),
            Self::Images(images) => Ok(images),
            other => Err(other.mismatch("images")),
        }
    }

    fn into_text(self) -> Result<String> {
        match self {
            Self::Text(text) if text.trim().is_empty() => Err(StudioError::EmptyResult),
            Self::Text(text) => Ok(text.trim().to_string()),
            other => Err(other.mismatch("text")),
        }
    }

    fn into_video(self) -> Result<String> {
        match self {
            Self::Video(url) if url.is_empty() => Err(StudioError::EmptyResult),
            Self::Video(url) => Ok(url),
            other => Err(other.mismatch("video")),
        }
    }
}

/// A claimed job waiting for its service call
#[derive(Debug, Clone, PartialEq)]
pub struct PendingJob {
    pub ticket: Ticket,
    pub request: GenerationRequest,
    pub message: String,
}

/// Send one request to the service, logging progress lines
#[cfg(test)]
pub async fn execute(
    service: &dyn GenerationService,
    request: &GenerationRequest,
) -> std::result::Result<ServiceOutput, ServiceError> {
    let progress = |status: &str| tracing::info!("🎬 {status}");
    execute_with_progress(service, request, &progress).await
}

/// Send one request to the service.
/// `progress` receives status lines from long running operations.
pub async fn execute_with_progress(
    service: &dyn GenerationService,
    request: &GenerationRequest,
    progress: &(dyn for<'s> Fn(&'s str) + Send + Sync),
) -> std::result::Result<ServiceOutput, ServiceError> {
    tracing::info!("🚀 Calling {}", request.operation());

    let output = match request {
        GenerationRequest::Images(r) => ServiceOutput::Images(service.generate_images(r).await?),
        GenerationRequest::Edit(r) => ServiceOutput::Images(service.edit_image(r).await?),
        GenerationRequest::Merge(r) => ServiceOutput::Images(service.merge_images(r).await?),
        GenerationRequest::Video(r) => ServiceOutput::Video(service.generate_video(r, progress).await?),
        GenerationRequest::PromptFromImage(r) => {
            ServiceOutput::Text(service.generate_prompt_from_image(r).await?)
        }
        GenerationRequest::PromptFromPlan(r) => {
            ServiceOutput::Text(service.generate_prompt_from_plan(r).await?)
        }
        GenerationRequest::ArchitecturalPrompts(r) => {
            ServiceOutput::Text(service.generate_architectural_prompts(r).await?)
        }
        GenerationRequest::Furniture(r) => {
            ServiceOutput::Images(service.place_and_render_furniture(r).await?)
        }
        GenerationRequest::Moodboard(r) => ServiceOutput::Images(service.generate_moodboard(r).await?),
        GenerationRequest::Lighting(r) => ServiceOutput::Images(service.apply_lighting(r).await?),
        GenerationRequest::ExtendView(r) => ServiceOutput::Images(service.extend_view(r).await?),
        GenerationRequest::Upscale(r) => ServiceOutput::Images(service.upscale_image(r).await?),
        GenerationRequest::StyleChangePrompt(r) => {
            ServiceOutput::Text(service.generate_style_change_prompt(r).await?)
        }
        GenerationRequest::VideoScriptPrompt(r) => {
            ServiceOutput::Text(service.generate_video_script_prompt(r).await?)
        }
    };
    Ok(output)
}

fn with_generated(history: HistoryItem, images: Vec<ImageUrl>) -> HistoryItem {
    let count = history.image_count;
    history.with_images(count, images)
}

impl Session {
    /// Validate `action`, claim the task slot and build its request.
    ///
    /// Nothing is sent and no state changes when validation fails.
    pub fn prepare(&mut self, action: GenerationAction) -> Result<PendingJob> {
        let plan = request::build(self, &action)?;
        if self.slot.is_busy() {
            return Err(StudioError::Busy);
        }

        match &action {
            GenerationAction::Main => {
                self.selecting_area = false;
                self.last_used_prompt = self.prompt.clone();
                if self.mode() == Mode::PromptGen {
                    self.remember_analysed_source();
                }
            }
            GenerationAction::AreaCloseUp(_) => {
                self.selecting_area = false;
                self.last_used_prompt = self.locale().text(Text::PromptCloseUp).to_string();
            }
            GenerationAction::FromPrompt(selected) => self.switch_to_prompt(selected),
            _ => {}
        }

        let message = self.locale().text(plan.message).to_string();
        let ticket = self.slot.begin(plan.target, message.clone())?;
        tracing::debug!("{} claimed {ticket:?}", plan.request.operation());
        Ok(PendingJob {
            ticket,
            request: plan.request,
            message,
        })
    }

    /// Render a suggested prompt in the create mode from the analysed image
    fn switch_to_prompt(&mut self, selected: &str) {
        let analysed = self.prompt_source().clone();
        self.set_mode(Mode::Create);
        self.source = analysed;
        self.prompt = selected.trim().to_string();
        self.last_used_prompt = self.prompt.clone();
        self.negative_prompt.clear();
        self.reference = None;
    }

    /// Update the loading text of the running job
    pub fn report_progress(&mut self, ticket: Ticket, status: &str) {
        tracing::debug!("{ticket:?}: {status}");
        self.slot.set_message(ticket, status);
    }

    /// Release the slot for `ticket` and write its output.
    ///
    /// The loading state is cleared on every path. On failure the current
    /// outputs are left as they were. A stale job still records its history
    /// item but does not replace what the user is now looking at.
    /// Returns the recorded history item, if any.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: std::result::Result<ServiceOutput, ServiceError>,
    ) -> Result<Option<HistoryItem>> {
        let Some(Finished { target, stale }) = self.slot.finish(ticket) else {
            tracing::warn!("⚠️  Ignoring completion for unknown job {ticket:?}");
            return Ok(None);
        };

        let output = result.map_err(|err| {
            tracing::error!("❌ Generation failed: {err}");
            StudioError::from(err)
        })?;
        if stale {
            tracing::info!("job {ticket:?} finished after the view changed, keeping current outputs");
        }

        let recorded = match target {
            Target::Gallery { history } => {
                let images = output.into_images()?;
                if !stale {
                    self.outputs.show_images(images.clone());
                }
                Some(with_generated(history, images))
            }
            Target::Video { history, model } => {
                let url = output.into_video()?;
                if !stale {
                    self.outputs.video_url = Some(url.clone());
                }
                Some(history.with_video(model, url))
            }
            Target::PromptList { history } => {
                let text = output.into_text()?;
                if !stale {
                    self.outputs.prompts = Some(text.clone());
                }
                Some(history.with_prompts(text))
            }
            Target::PromptField => {
                let text = output.into_text()?;
                if !stale {
                    self.prompt = text;
                }
                None
            }
            Target::UtilityGallery { utility, history } => {
                let images = output.into_images()?;
                if !stale {
                    if let Some(gallery) = self.utilities.gallery_mut(utility) {
                        gallery.show(images.clone());
                    }
                }
                Some(with_generated(history, images))
            }
            Target::VideoScript { history } => {
                let text = output.into_text()?;
                if !stale {
                    self.utilities.video_prompt.generated = Some(text.clone());
                }
                Some(history.with_prompts(text))
            }
            Target::StylePrompt => {
                let text = output.into_text()?;
                if !stale {
                    self.utilities.change_style.generated_prompt = Some(text);
                }
                None
            }
            Target::TourFrame => {
                let frame = output
                    .into_images()?
                    .into_iter()
                    .next()
                    .ok_or(StudioError::EmptyResult)?;
                if !stale {
                    self.utilities.tour.push_frame(frame);
                }
                None
            }
        };

        if let Some(item) = &recorded {
            tracing::info!("✅ {} finished with {} outputs", item.mode, item.generated_images.len());
            self.push_history(item.clone());
        }
        Ok(recorded)
    }

    /// Prepare, execute and complete one action
    #[cfg(test)]
    pub async fn run(
        &mut self,
        service: &dyn GenerationService,
        action: GenerationAction,
    ) -> Result<Option<HistoryItem>> {
        let job = self.prepare(action)?;
        let result = execute(service, &job.request).await;
        self.complete(job.ticket, result)
    }

    /// The generate button of the active mode
    #[cfg(test)]
    pub async fn generate(&mut self, service: &dyn GenerationService) -> Result<Option<HistoryItem>> {
        self.run(service, GenerationAction::Main).await
    }

    pub(crate) fn begin_plan_suggestion(&mut self, image: SourceImage) -> PendingJob {
        let message = self.locale().text(Text::Generating).to_string();
        let ticket = self.suggestion.replace((), message.clone());
        PendingJob {
            ticket,
            request: GenerationRequest::PromptFromPlan(AnalysisRequest {
                image,
                locale: self.locale(),
            }),
            message,
        }
    }

    /// Fill the plan prompt from a finished suggestion job.
    ///
    /// On failure the default plan prompt is put back and the error is
    /// returned for display. Superseded or stale suggestions are dropped.
    pub fn complete_plan_suggestion(
        &mut self,
        ticket: Ticket,
        result: std::result::Result<ServiceOutput, ServiceError>,
    ) -> Result<()> {
        let Some(finished) = self.suggestion.finish(ticket) else {
            return Ok(());
        };
        if finished.stale {
            tracing::debug!("dropping plan prompt suggestion {ticket:?}");
            return Ok(());
        }

        match result.map_err(StudioError::from).and_then(ServiceOutput::into_text) {
            Ok(text) => {
                self.apply_plan_suggestion(Some(text));
                Ok(())
            }
            Err(err) => {
                tracing::warn!("⚠️  Plan prompt suggestion failed: {err}");
                self.apply_plan_suggestion(None);
                Err(err)
            }
        }
    }

    /// Settle a suggestion that cannot run because no service is configured
    pub fn abandon_plan_suggestion(&mut self, ticket: Ticket) -> Result<()> {
        let offline = ServiceError::Failed("no generation service is configured".into());
        self.complete_plan_suggestion(ticket, Err(offline))
    }
}
