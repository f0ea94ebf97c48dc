use iced::futures::SinkExt;
use iced::widget::{column, container, row, text, Space};
use iced::{Alignment, Element, Length, Task, Theme};
use rfd::FileDialog;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

mod config;
mod dispatch;
mod error;
mod locale;
mod service;
mod state;
mod ui;

use config::AppConfig;
use dispatch::{GenerationAction, PendingJob, ServiceOutput, Ticket};
use error::{ServiceError, StudioError};
use service::http::HttpGenerationService;
use service::GenerationService;
use state::data::{AspectRatio, ImageUrl, Mode, PlanMode, SourceImage, UpscaleLevel};
use state::edit::{EditSubMode, EditTool};
use state::history::HistoryItem;
use state::library::Library;
use state::markup::{self, Region};
use state::session::{Session, MAX_IMAGE_COUNT};
use state::utilities::Utility;
use ui::canvas::CanvaMessage;
use ui::thumbnail::ImageCache;
use ui::views;

/// Where a picked image file goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
    Source,
    Reference,
    EditMask,
    EditSecond,
    EditReference,
    CanvaObject,
    MoodboardSource,
    MoodboardReference,
    LightingSource,
    VideoPromptSource,
    ExtendViewSource,
    ChangeStyleSource,
    UpscaleSource,
    TourStart,
}

impl UploadTarget {
    fn dialog_title(&self) -> &'static str {
        match self {
            Self::Source => "Select Source Image",
            Self::Reference | Self::EditReference => "Select Style Reference",
            Self::EditMask => "Select Mask (white = repaint)",
            Self::EditSecond => "Select Second Image",
            Self::CanvaObject => "Select Decor Object",
            Self::MoodboardReference => "Select Inspiration Image",
            Self::TourStart => "Select Starting View",
            _ => "Select Image",
        }
    }
}

/// Main application state
struct Studio {
    session: Session,
    /// `None` when the service URL in the config is unusable
    service: Option<Arc<dyn GenerationService>>,
    /// The history catalog; the studio still runs without one
    library: Option<Library>,
    images: ImageCache,
    alert: Option<String>,
    tour_direction: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    ModeSelected(Mode),
    PromptChanged(String),
    NegativePromptChanged(String),
    ImageCountChanged(u8),
    AspectRatioSelected(AspectRatio),
    PlanModeSelected(PlanMode),
    VideoModelChanged(String),
    EditSubModeSelected(EditSubMode),
    EditToolSelected(EditTool),
    BrushSizeChanged(u32),
    /// Stroke points in percent of the source size
    BrushStroke(Vec<(f32, f32)>),
    /// Lasso outline in percent of the source size
    LassoClosed(Vec<(f32, f32)>),
    ClearMask,

    PickImage(UploadTarget),
    ImagePicked(UploadTarget, Result<SourceImage, String>),
    ClearImage(UploadTarget),

    Generate(GenerationAction),
    JobProgress(Ticket, String),
    JobFinished(Ticket, Result<ServiceOutput, String>),
    SuggestionFinished(Ticket, Result<ServiceOutput, String>),

    OutputSelected(ImageUrl),
    SetAsSource,
    StartEditing,
    HistorySelected(Uuid),
    ClearHistory,

    UtilitySelected(Option<Utility>),
    UtilityImageSelected(Utility, ImageUrl),
    MoodboardPromptChanged(String),
    MoodboardCountChanged(u8),
    LightingInteriorSelected(String),
    LightingExteriorSelected(String),
    LightingCountChanged(u8),
    VideoBriefChanged(String),
    ExtendRatioSelected(AspectRatio),
    ExtendCountChanged(u8),
    StyleBriefChanged(String),
    StylePromptEdited(String),
    StyleCountChanged(u8),
    UpscaleLevelSelected(UpscaleLevel),

    TourDirectionChanged(String),
    TourUndo,
    TourRedo,
    TourFrameSelected(usize),

    Canva(CanvaMessage),
    ToggleAreaSelection,
    AreaSelected(Region),
    DismissAlert,
}

impl Studio {
    fn new() -> (Self, Task<Message>) {
        let mut alerts = Vec::new();

        let config = AppConfig::load().unwrap_or_else(|err| {
            tracing::error!("❌ {err}");
            alerts.push(format!("Using default settings: {err}"));
            AppConfig::default()
        });

        let service: Option<Arc<dyn GenerationService>> = match HttpGenerationService::new(
            config.service_url(),
            config.api_key().map(str::to_string),
            config.request_timeout(),
        ) {
            Ok(service) => {
                tracing::info!("🔌 Generation service at {}", service.base_url());
                Some(Arc::new(service))
            }
            Err(err) => {
                tracing::error!("❌ {err}");
                alerts.push(err.to_string());
                None
            }
        };

        let mut session = Session::new(config.locale()).with_history_limit(config.history_limit());
        session.set_image_count(config.default_image_count());
        session.video_model = config.video_model().to_string();

        let library = match Library::new() {
            Ok(library) => {
                tracing::info!("📚 History catalog at {}", library.path().display());
                match library.load_recent(config.history_limit()) {
                    Ok(items) => session.load_history(items),
                    Err(err) => tracing::warn!("⚠️  Could not load history: {err}"),
                }
                Some(library)
            }
            Err(err) => {
                tracing::warn!("⚠️  History will not be saved: {err}");
                None
            }
        };

        tracing::info!(
            "🏛️  ArchViz Studio initialized with {} history items",
            session.history().len()
        );

        let mut studio = Studio {
            session,
            service,
            library,
            images: ImageCache::default(),
            alert: (!alerts.is_empty()).then(|| alerts.join("\n")),
            tour_direction: String::new(),
        };
        studio.sync_images();
        (studio, Task::none())
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        // Drag and typing messages never change which images are on screen
        let keeps_images = matches!(
            message,
            Message::Canva(CanvaMessage::Move { .. } | CanvaMessage::Scale(_))
                | Message::JobProgress(..)
                | Message::PromptChanged(_)
                | Message::NegativePromptChanged(_)
                | Message::TourDirectionChanged(_)
                | Message::BrushSizeChanged(_)
        );

        let task = self.handle(message);
        if !keeps_images {
            self.sync_images();
        }
        task
    }

    fn handle(&mut self, message: Message) -> Task<Message> {
        let session = &mut self.session;
        match message {
            Message::ModeSelected(mode) => session.set_mode(mode),
            Message::PromptChanged(prompt) => session.prompt = prompt,
            Message::NegativePromptChanged(prompt) => session.negative_prompt = prompt,
            Message::ImageCountChanged(count) => session.set_image_count(count),
            Message::AspectRatioSelected(ratio) => session.aspect_ratio = ratio,
            Message::PlanModeSelected(mode) => session.plan_mode = mode,
            Message::VideoModelChanged(model) => session.video_model = model,
            Message::EditSubModeSelected(sub_mode) => session.edit.sub_mode = sub_mode,
            Message::EditToolSelected(tool) => session.edit.tool = tool,
            Message::BrushSizeChanged(size) => session.edit.set_brush_size(size),
            Message::BrushStroke(points) => {
                if let Err(err) = session.paint_mask_stroke(points) {
                    self.show_error(err);
                }
            }
            Message::LassoClosed(outline) => {
                if let Err(err) = session.apply_lasso(&outline) {
                    self.show_error(err);
                }
            }
            Message::ClearMask => session.edit.clear_mask(),

            Message::PickImage(target) => {
                let file = FileDialog::new()
                    .set_title(target.dialog_title())
                    .add_filter("Images", &["png", "jpg", "jpeg", "webp"])
                    .pick_file();

                if let Some(path) = file {
                    return Task::perform(load_image(path), move |result| {
                        Message::ImagePicked(target, result)
                    });
                }
            }
            Message::ImagePicked(target, Ok(image)) => return self.apply_upload(target, Some(image)),
            Message::ImagePicked(_, Err(err)) => {
                tracing::error!("❌ {err}");
                self.alert = Some(err);
            }
            Message::ClearImage(target) => return self.apply_upload(target, None),

            Message::Generate(action) => return self.start(action),
            Message::JobProgress(ticket, status) => session.report_progress(ticket, &status),
            Message::JobFinished(ticket, result) => {
                match session.complete(ticket, result.map_err(ServiceError::Failed)) {
                    Ok(Some(item)) => self.persist(&item),
                    Ok(None) => {}
                    Err(err) => self.show_error(err),
                }
            }
            Message::SuggestionFinished(ticket, result) => {
                if let Err(err) = session.complete_plan_suggestion(ticket, result.map_err(ServiceError::Failed)) {
                    self.show_error(err);
                }
            }

            Message::OutputSelected(url) => session.outputs.select(url),
            Message::SetAsSource => {
                if let Err(err) = session.set_as_source_image() {
                    self.show_error(err);
                }
            }
            Message::StartEditing => {
                if let Err(err) = session.start_editing() {
                    self.show_error(err);
                }
            }
            Message::HistorySelected(id) => {
                if let Some(item) = session.history().get(id).cloned() {
                    session.restore_history(&item);
                }
            }
            Message::ClearHistory => {
                session.clear_history();
                if let Some(library) = &self.library {
                    if let Err(err) = library.clear() {
                        tracing::warn!("⚠️  Could not clear history catalog: {err}");
                    }
                }
            }

            Message::UtilitySelected(utility) => session.utilities.active = utility,
            Message::UtilityImageSelected(utility, url) => {
                if let Some(gallery) = session.utilities.gallery_mut(utility) {
                    gallery.select(url);
                }
            }
            Message::MoodboardPromptChanged(prompt) => session.utilities.moodboard.prompt = prompt,
            Message::MoodboardCountChanged(count) => {
                session.utilities.moodboard.image_count = count.clamp(1, MAX_IMAGE_COUNT)
            }
            Message::LightingInteriorSelected(preset) => session.utilities.lighting.interior = preset,
            Message::LightingExteriorSelected(preset) => session.utilities.lighting.exterior = preset,
            Message::LightingCountChanged(count) => {
                session.utilities.lighting.image_count = count.clamp(1, MAX_IMAGE_COUNT)
            }
            Message::VideoBriefChanged(brief) => session.utilities.video_prompt.user_prompt = brief,
            Message::ExtendRatioSelected(ratio) => session.utilities.extend_view.set_aspect_ratio(ratio),
            Message::ExtendCountChanged(count) => {
                session.utilities.extend_view.image_count = count.clamp(1, MAX_IMAGE_COUNT)
            }
            Message::StyleBriefChanged(brief) => session.utilities.change_style.user_prompt = brief,
            Message::StylePromptEdited(prompt) => {
                session.utilities.change_style.generated_prompt = Some(prompt)
            }
            Message::StyleCountChanged(count) => {
                session.utilities.change_style.image_count = count.clamp(1, MAX_IMAGE_COUNT)
            }
            Message::UpscaleLevelSelected(level) => session.utilities.upscale.level = level,

            Message::TourDirectionChanged(direction) => self.tour_direction = direction,
            Message::TourUndo => session.utilities.tour.undo(),
            Message::TourRedo => session.utilities.tour.redo(),
            Message::TourFrameSelected(index) => session.utilities.tour.select(index),

            Message::Canva(edit) => match edit {
                CanvaMessage::Select(index) => session.canva.select(index),
                CanvaMessage::Move { dx, dy } => session.canva.move_selected(dx, dy),
                CanvaMessage::Scale(factor) => session.canva.scale_selected(factor),
                CanvaMessage::Rotate(degrees) => session.canva.rotate_selected(degrees),
                CanvaMessage::DeleteSelected => {
                    session.delete_selected_object();
                }
                CanvaMessage::SetLocked(locked) => session.canva.set_locked(locked),
            },
            Message::ToggleAreaSelection => session.selecting_area = !session.selecting_area,
            Message::AreaSelected(region) => return self.apply_region(region),
            Message::DismissAlert => self.alert = None,
        }

        Task::none()
    }

    /// Claim the task slot and run the service call in the background
    fn start(&mut self, action: GenerationAction) -> Task<Message> {
        let Some(service) = self.service.clone() else {
            self.alert = Some("No generation service is configured".into());
            return Task::none();
        };
        match self.session.prepare(action) {
            Ok(job) => {
                self.alert = None;
                spawn(service, job, Message::JobFinished)
            }
            Err(err) => {
                self.show_error(err);
                Task::none()
            }
        }
    }

    fn apply_upload(&mut self, target: UploadTarget, image: Option<SourceImage>) -> Task<Message> {
        let session = &mut self.session;
        let utilities = &mut session.utilities;
        match target {
            UploadTarget::Source => {
                if let Some(job) = session.upload_source_image(image) {
                    return match self.service.clone() {
                        Some(service) => spawn(service, job, Message::SuggestionFinished),
                        None => {
                            if let Err(err) = session.abandon_plan_suggestion(job.ticket) {
                                self.show_error(err);
                            }
                            Task::none()
                        }
                    };
                }
            }
            UploadTarget::Reference => session.reference = image,
            UploadTarget::EditMask => session.edit.set_mask(image),
            UploadTarget::EditSecond => session.edit.second_image = image,
            UploadTarget::EditReference => session.edit.reference = image,
            UploadTarget::CanvaObject => {
                if let Some(image) = image {
                    session.add_canva_object(image);
                }
            }
            UploadTarget::MoodboardSource => utilities.moodboard.source = image,
            UploadTarget::MoodboardReference => utilities.moodboard.reference = image,
            UploadTarget::LightingSource => utilities.lighting.source = image,
            UploadTarget::VideoPromptSource => utilities.video_prompt.source = image,
            UploadTarget::ExtendViewSource => utilities.extend_view.source = image,
            UploadTarget::ChangeStyleSource => utilities.change_style.source = image,
            UploadTarget::UpscaleSource => utilities.upscale.source = image,
            UploadTarget::TourStart => session.start_tour(image),
        }
        Task::none()
    }

    /// A rectangle drawn over the source marks the close-up area
    fn apply_region(&mut self, region: Region) -> Task<Message> {
        let Some(source) = self.session.source.clone() else {
            return Task::none();
        };

        if self.session.mode() == Mode::CameraAngle && self.session.selecting_area {
            match markup::mark_area(&source, region) {
                Ok(marked) => return self.start(GenerationAction::AreaCloseUp(marked)),
                Err(err) => self.show_error(err),
            }
        }
        Task::none()
    }

    fn show_error(&mut self, err: StudioError) {
        if matches!(err, StudioError::Busy) {
            tracing::debug!("ignoring request while a job is running");
            return;
        }
        self.alert = Some(err.to_string());
    }

    /// Save a finished job to the catalog, keeping it as short as the log
    fn persist(&self, item: &HistoryItem) {
        let Some(library) = &self.library else {
            return;
        };
        let keep = self.session.history().limit();
        if let Err(err) = library.append(item).and_then(|_| library.prune(keep)) {
            tracing::warn!("⚠️  Could not save history item {}: {err}", item.id);
        }
    }

    fn sync_images(&mut self) {
        let session = &self.session;
        let u = &session.utilities;

        let inputs = [
            session.source.as_ref(),
            session.reference.as_ref(),
            session.edit.mask.as_ref(),
            session.edit.second_image.as_ref(),
            session.edit.reference.as_ref(),
            u.moodboard.source.as_ref(),
            u.moodboard.reference.as_ref(),
            u.lighting.source.as_ref(),
            u.video_prompt.source.as_ref(),
            u.extend_view.source.as_ref(),
            u.change_style.source.as_ref(),
            u.upscale.source.as_ref(),
        ];
        let mut urls: Vec<String> = inputs
            .into_iter()
            .flatten()
            .chain(session.canva.objects())
            .map(SourceImage::to_data_url)
            .collect();

        urls.extend(session.outputs.images.iter().cloned());
        for gallery in [
            &u.moodboard.gallery,
            &u.lighting.gallery,
            &u.extend_view.gallery,
            &u.change_style.gallery,
            &u.upscale.gallery,
        ] {
            urls.extend(gallery.images.iter().cloned());
        }
        urls.extend(u.tour.frames().iter().cloned());
        urls.extend(session.history().items().iter().filter_map(|item| item.thumbnail().cloned()));

        self.images.sync(urls);
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let header = row![
            text("ArchViz Studio").size(28),
            Space::with_width(Length::Fill),
            text(format!("{} items in history", self.session.history().len())).size(14),
        ]
        .align_y(Alignment::Center);

        let mut content = column![header, views::mode_bar(&self.session)]
            .spacing(12)
            .padding(16);

        if let Some(alert) = &self.alert {
            content = content.push(views::alert_banner(alert));
        }

        content = content.push(
            row![
                views::controls(&self.session, &self.images),
                views::workspace(&self.session, &self.images, &self.tour_direction),
                views::history_panel(&self.session, &self.images),
            ]
            .spacing(12)
            .height(Length::Fill),
        );

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Log to stderr, `RUST_LOG` picks the level
fn setup_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "archviz_studio=info,wgpu=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).compact())
        .try_init();
}

fn main() -> iced::Result {
    setup_tracing();

    iced::application("ArchViz Studio", Studio::update, Studio::view)
        .theme(Studio::theme)
        .centered()
        .run_with(Studio::new)
}

/// Read and encode an image file off the UI thread
async fn load_image(path: PathBuf) -> Result<SourceImage, String> {
    tracing::debug!("loading {}", path.display());
    SourceImage::from_path(&path).map_err(|err| format!("Could not open {}: {err}", path.display()))
}

/// Run `job` on the service, streaming progress lines back as messages.
/// The last message is `done` with the result.
fn spawn(
    service: Arc<dyn GenerationService>,
    job: PendingJob,
    done: fn(Ticket, Result<ServiceOutput, String>) -> Message,
) -> Task<Message> {
    let PendingJob {
        ticket,
        request,
        message,
    } = job;
    tracing::info!("⏳ {message}");

    Task::run(
        iced::stream::channel(16, move |mut output| async move {
            let updates = Mutex::new(output.clone());
            let progress = move |status: &str| {
                if let Ok(mut updates) = updates.lock() {
                    let _ = updates.try_send(Message::JobProgress(ticket, status.to_string()));
                }
            };

            let result = dispatch::execute_with_progress(service.as_ref(), &request, &progress)
                .await
                .map_err(|err| err.to_string());
            let _ = output.send(done(ticket, result)).await;
        }),
        std::convert::identity,
    )
}
