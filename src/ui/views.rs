/// Widget trees for the studio window
///
/// Every function here is a pure view over the session; state changes go
/// back through `Message`.

use iced::widget::{
    button, canvas::Canvas, column, container, pick_list, row, scrollable, slider, stack, text,
    text_input, Column, Image, Space,
};
use iced::{Alignment, ContentFit, Element, Length};
use iced_aw::Wrap;

use crate::dispatch::GenerationAction;
use crate::state::data::{AspectRatio, ImageUrl, Mode, PlanMode, SourceImage, UpscaleLevel};
use crate::state::edit::{EditSubMode, EditTool, MAX_BRUSH_SIZE, MIN_BRUSH_SIZE};
use crate::state::session::{Session, MAX_IMAGE_COUNT};
use crate::state::utilities::{
    Gallery, Utility, EXTERIOR_LIGHTING_PRESETS, INTERIOR_LIGHTING_PRESETS,
};
use crate::{Message, UploadTarget};

use super::canvas::{AreaSelector, BrushPainter, CanvaMessage, CanvaPlacement, LassoSelector};
use super::thumbnail::ImageCache;

const THUMB: f32 = 96.0;
const PREVIEW_WIDTH: f32 = 640.0;

fn picture<'a>(images: &ImageCache, url: &str, width: f32) -> Element<'a, Message> {
    match images.get(url) {
        Some(handle) => Image::new(handle.clone()).width(Length::Fixed(width)).into(),
        None => container(text("(no preview)").size(12))
            .width(Length::Fixed(width))
            .into(),
    }
}

/// Display size of `url` scaled to `width`, keeping its aspect ratio
fn fitted(images: &ImageCache, url: &str, width: f32) -> (f32, f32) {
    match images.size(url) {
        Some((w, h)) if w > 0 => (width, width * h as f32 / w as f32),
        _ => (width, width * 0.75),
    }
}

fn tab<'a>(label: &'a str, active: bool, message: Message) -> Element<'a, Message> {
    let style = if active { button::primary } else { button::secondary };
    button(text(label).size(14))
        .style(style)
        .padding([6, 12])
        .on_press(message)
        .into()
}

fn count_slider<'a>(label: &'a str, value: u8, on_change: fn(u8) -> Message) -> Element<'a, Message> {
    row![
        text(format!("{label}: {value}")).size(14),
        slider(1..=MAX_IMAGE_COUNT, value, on_change).width(Length::Fixed(160.0)),
    ]
    .spacing(10)
    .align_y(Alignment::Center)
    .into()
}

/// Upload box: thumbnail, a pick button and a clear button
fn upload_slot<'a>(
    images: &ImageCache,
    label: &'a str,
    image: Option<&SourceImage>,
    target: UploadTarget,
) -> Element<'a, Message> {
    let preview: Element<'a, Message> = match image {
        Some(image) => picture(images, &image.to_data_url(), THUMB),
        None => container(text("empty").size(12))
            .width(Length::Fixed(THUMB))
            .into(),
    };
    let clear = button(text("Clear").size(12)).style(button::secondary);
    column![
        text(label).size(14),
        preview,
        row![
            button(text("Choose…").size(12)).on_press(Message::PickImage(target)),
            if image.is_some() {
                clear.on_press(Message::ClearImage(target))
            } else {
                clear
            },
        ]
        .spacing(6),
    ]
    .spacing(6)
    .into()
}

fn generate_button<'a>(label: &'a str, session: &Session, action: GenerationAction) -> Element<'a, Message> {
    let generate = button(text(label).size(16)).padding([8, 20]);
    if session.is_loading() {
        generate.into()
    } else {
        generate.on_press(Message::Generate(action)).into()
    }
}

/// Thumbnail grid; `on_select` fires with the clicked URL
fn gallery_grid<'a>(
    images: &ImageCache,
    urls: &[ImageUrl],
    selected: Option<&ImageUrl>,
    on_select: impl Fn(ImageUrl) -> Message,
) -> Element<'a, Message> {
    let tiles: Vec<Element<'a, Message>> = urls
        .iter()
        .map(|url| {
            let style = if selected == Some(url) { button::primary } else { button::text };
            button(picture(images, url, THUMB * 1.5))
                .style(style)
                .padding(3)
                .on_press(on_select(url.clone()))
                .into()
        })
        .collect();
    Wrap::with_elements(tiles).spacing(8.0).line_spacing(8.0).into()
}

pub fn mode_bar(session: &Session) -> Element<'_, Message> {
    let tabs: Vec<Element<'_, Message>> = Mode::ALL
        .iter()
        .map(|mode| tab(mode.label(), session.mode() == *mode, Message::ModeSelected(*mode)))
        .collect();
    Wrap::with_elements(tabs).spacing(6.0).line_spacing(6.0).into()
}

pub fn alert_banner(alert: &str) -> Element<'_, Message> {
    container(
        row![
            text(alert).size(14).width(Length::Fill),
            button(text("Dismiss").size(12))
                .style(button::secondary)
                .on_press(Message::DismissAlert),
        ]
        .spacing(10)
        .align_y(Alignment::Center),
    )
    .padding(10)
    .style(container::rounded_box)
    .width(Length::Fill)
    .into()
}

fn prompt_fields(session: &Session) -> Element<'_, Message> {
    column![
        text("Prompt").size(14),
        text_input("Describe the design…", &session.prompt)
            .on_input(Message::PromptChanged)
            .padding(8),
        text("Negative prompt").size(14),
        text_input("What to avoid…", &session.negative_prompt)
            .on_input(Message::NegativePromptChanged)
            .padding(8),
    ]
    .spacing(6)
    .into()
}

fn aspect_picker(session: &Session) -> Element<'_, Message> {
    row![
        text("Aspect ratio").size(14),
        pick_list(
            AspectRatio::ALL,
            Some(session.aspect_ratio),
            Message::AspectRatioSelected
        ),
    ]
    .spacing(10)
    .align_y(Alignment::Center)
    .into()
}

/// Left-hand panel with the inputs of the active mode
pub fn controls<'a>(session: &'a Session, images: &ImageCache) -> Element<'a, Message> {
    let source = session.source.as_ref();
    let count = count_slider("Images", session.image_count, Message::ImageCountChanged);

    let body: Column<'a, Message> = match session.mode() {
        Mode::Create => column![
            row![
                upload_slot(images, "Source (optional)", source, UploadTarget::Source),
                upload_slot(images, "Style reference", session.reference.as_ref(), UploadTarget::Reference),
            ]
            .spacing(12),
            prompt_fields(session),
            aspect_picker(session),
            count,
            row![
                generate_button("Generate", session, GenerationAction::Main),
                generate_button("Describe source", session, GenerationAction::DescribeSource),
            ]
            .spacing(8),
        ],
        Mode::CameraAngle => column![
            upload_slot(images, "Source", source, UploadTarget::Source),
            text_input("Camera angle, e.g. bird's eye view", &session.prompt)
                .on_input(Message::PromptChanged)
                .padding(8),
            count,
            row![
                generate_button("Generate", session, GenerationAction::Main),
                tab(
                    "Select close-up area",
                    session.selecting_area,
                    Message::ToggleAreaSelection
                ),
            ]
            .spacing(8),
        ],
        Mode::Edit => edit_controls(session, images, count),
        Mode::PlanTo3d => column![
            upload_slot(images, "Floor plan", source, UploadTarget::Source),
            row![
                tab("Render", session.plan_mode == PlanMode::Render, Message::PlanModeSelected(PlanMode::Render)),
                tab("Colorize", session.plan_mode == PlanMode::Colorize, Message::PlanModeSelected(PlanMode::Colorize)),
            ]
            .spacing(6),
            prompt_fields(session),
            aspect_picker(session),
            count,
            generate_button("Generate", session, GenerationAction::Main),
        ],
        Mode::CanvaMix => canva_controls(session, images, count),
        Mode::PromptGen => column![
            upload_slot(images, "Image to analyse", source, UploadTarget::Source),
            generate_button("Suggest prompts", session, GenerationAction::Main),
        ],
        Mode::Video => column![
            upload_slot(images, "Start frame (optional)", source, UploadTarget::Source),
            prompt_fields(session),
            row![
                text("Model").size(14),
                text_input("Video model", &session.video_model)
                    .on_input(Message::VideoModelChanged)
                    .padding(6),
            ]
            .spacing(10)
            .align_y(Alignment::Center),
            generate_button("Generate video", session, GenerationAction::Main),
        ],
        Mode::Utilities => utility_picker(session),
    };

    scrollable(body.spacing(14).padding(12).width(Length::Fixed(360.0))).into()
}

fn edit_controls<'a>(session: &'a Session, images: &ImageCache, count: Element<'a, Message>) -> Column<'a, Message> {
    let edit = &session.edit;
    let mut col = column![
        upload_slot(images, "Image to edit", session.source.as_ref(), UploadTarget::Source),
        pick_list(EditSubMode::ALL, Some(edit.sub_mode), Message::EditSubModeSelected),
    ]
    .spacing(12);

    col = if edit.sub_mode.needs_mask() {
        let mut tools = row![
            tab("Brush", edit.tool == EditTool::Brush, Message::EditToolSelected(EditTool::Brush)),
            tab("Lasso", edit.tool == EditTool::Lasso, Message::EditToolSelected(EditTool::Lasso)),
        ]
        .spacing(6)
        .align_y(Alignment::Center);
        if edit.tool == EditTool::Brush {
            tools = tools.push(text(format!("Size: {}px", edit.brush_size)).size(14)).push(
                slider(MIN_BRUSH_SIZE..=MAX_BRUSH_SIZE, edit.brush_size, Message::BrushSizeChanged)
                    .width(Length::Fixed(140.0)),
            );
        }
        let mut clear = button(text("Clear mask").size(12)).style(button::secondary);
        if edit.mask.is_some() {
            clear = clear.on_press(Message::ClearMask);
        }

        col.push(tools.push(clear))
        .push(row![
            upload_slot(images, "Mask", edit.mask.as_ref(), UploadTarget::EditMask),
            upload_slot(images, "Reference (optional)", edit.reference.as_ref(), UploadTarget::EditReference),
        ]
        .spacing(12))
    } else {
        col.push(upload_slot(images, "Second image", edit.second_image.as_ref(), UploadTarget::EditSecond))
    };

    col.push(prompt_fields(session))
        .push(count)
        .push(generate_button("Apply edit", session, GenerationAction::Main))
}

fn canva_controls<'a>(session: &'a Session, images: &ImageCache, count: Element<'a, Message>) -> Column<'a, Message> {
    let board = &session.canva;
    let decor: Vec<Element<'a, Message>> = board
        .objects()
        .iter()
        .enumerate()
        .map(|(index, object)| {
            let style = if board.selected() == Some(index) { button::primary } else { button::text };
            button(column![text(format!("#{}", index + 1)).size(12), picture(images, &object.to_data_url(), THUMB * 0.7)])
                .style(style)
                .on_press(Message::Canva(CanvaMessage::Select(Some(index))))
                .into()
        })
        .collect();

    let has_selection = board.selected().is_some();
    let action = |label: &'a str, message: CanvaMessage| {
        let b = button(text(label).size(12)).style(button::secondary);
        if has_selection { b.on_press(Message::Canva(message)) } else { b }
    };

    column![
        upload_slot(images, "Background", session.source.as_ref(), UploadTarget::Source),
        row![
            text("Decor").size(14),
            button(text("Add…").size(12)).on_press(Message::PickImage(UploadTarget::CanvaObject)),
        ]
        .spacing(10)
        .align_y(Alignment::Center),
        Wrap::with_elements(decor).spacing(6.0).line_spacing(6.0),
        row![
            action("Rotate -15°", CanvaMessage::Rotate(-15.0)),
            action("Rotate +15°", CanvaMessage::Rotate(15.0)),
            action("Smaller", CanvaMessage::Scale(0.9)),
            action("Larger", CanvaMessage::Scale(1.1)),
        ]
        .spacing(4),
        row![
            action("Delete", CanvaMessage::DeleteSelected),
            tab(
                if board.is_locked() { "Unlock" } else { "Lock" },
                board.is_locked(),
                Message::Canva(CanvaMessage::SetLocked(!board.is_locked()))
            ),
        ]
        .spacing(4),
        prompt_fields(session),
        count,
        generate_button("Render", session, GenerationAction::Main),
    ]
    .spacing(12)
}

fn utility_picker(session: &Session) -> Column<'_, Message> {
    let active = session.utilities.active;
    Utility::ALL
        .iter()
        .fold(column![text("Utilities").size(18)].spacing(6), |col, utility| {
            col.push(tab(
                utility.title(),
                active == Some(*utility),
                Message::UtilitySelected(Some(*utility)),
            ))
        })
}

/// Centre panel: the image being worked on and the results
pub fn workspace<'a>(session: &'a Session, images: &ImageCache, tour_direction: &'a str) -> Element<'a, Message> {
    if session.mode() == Mode::Utilities {
        return utility_workspace(session, images, tour_direction);
    }

    let mut col = column![].spacing(14).padding(12);

    if let Some(status) = session.loading_message() {
        col = col.push(text(format!("⏳ {status}")).size(16));
    }

    if let Some(stage) = stage(session, images) {
        col = col.push(stage);
    }

    let outputs = &session.outputs;
    if !outputs.images.is_empty() {
        col = col.push(text("Results").size(18)).push(gallery_grid(
            images,
            &outputs.images,
            outputs.selected.as_ref(),
            Message::OutputSelected,
        ));
        if let Some(selected) = &outputs.selected {
            col = col.push(picture(images, selected, PREVIEW_WIDTH)).push(
                row![
                    button(text("Use as source").size(14)).on_press(Message::SetAsSource),
                    button(text("Edit this image").size(14)).on_press(Message::StartEditing),
                ]
                .spacing(8),
            );
        }
    }

    if let Some(prompts) = &outputs.prompts {
        col = col.push(prompt_list(session, prompts));
    }

    if let Some(url) = &outputs.video_url {
        col = col.push(
            column![
                text("Video ready").size(18),
                text_input("", url).padding(6),
            ]
            .spacing(6),
        );
    }

    scrollable(col.width(Length::Fill)).into()
}

/// Interactive overlays drawn on top of the source image
fn stage<'a>(session: &'a Session, images: &ImageCache) -> Option<Element<'a, Message>> {
    let source = session.source.as_ref()?.to_data_url();
    let (width, height) = fitted(images, &source, PREVIEW_WIDTH);
    let background = images.get(&source).map(|handle| {
        Image::new(handle.clone())
            .content_fit(ContentFit::Fill)
            .width(Length::Fixed(width))
            .height(Length::Fixed(height))
    })?;

    let overlay: Element<'a, Message> = if session.mode() == Mode::CanvaMix {
        Canvas::new(CanvaPlacement { board: &session.canva })
            .width(Length::Fixed(width))
            .height(Length::Fixed(height))
            .into()
    } else if session.selecting_area {
        Canvas::new(AreaSelector)
            .width(Length::Fixed(width))
            .height(Length::Fixed(height))
            .into()
    } else if session.is_editing_mask() && session.edit.tool == EditTool::Lasso {
        Canvas::new(LassoSelector)
            .width(Length::Fixed(width))
            .height(Length::Fixed(height))
            .into()
    } else if session.is_editing_mask() {
        let scale = match images.size(&source) {
            Some((w, _)) if w > 0 => width / w as f32,
            _ => 1.0,
        };
        let painter = BrushPainter {
            strokes: &session.edit.strokes,
            brush_size: session.edit.brush_size,
            scale,
        };
        Canvas::new(painter)
            .width(Length::Fixed(width))
            .height(Length::Fixed(height))
            .into()
    } else {
        return None;
    };

    let hint = if session.mode() == Mode::CanvaMix {
        "Drag to move the selected decor, scroll to resize"
    } else if session.selecting_area {
        "Drag a rectangle around the area to close up on"
    } else if session.edit.tool == EditTool::Lasso {
        "Draw around the region to repaint"
    } else {
        "Paint over the region to repaint"
    };

    Some(column![text(hint).size(13), stack![background, overlay]].spacing(6).into())
}

/// Suggested prompts, one per line, each renderable in the create mode
fn prompt_list<'a>(session: &Session, prompts: &'a str) -> Element<'a, Message> {
    let loading = session.is_loading();
    prompts
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .fold(column![text("Suggested prompts").size(18)].spacing(8), |col, line| {
            let mut render = button(text("Render").size(12));
            if !loading {
                render = render.on_press(Message::Generate(GenerationAction::FromPrompt(line.to_string())));
            }
            col.push(
                row![text(line).size(14).width(Length::Fill), render]
                    .spacing(10)
                    .align_y(Alignment::Center),
            )
        })
        .into()
}

fn utility_gallery<'a>(images: &ImageCache, utility: Utility, gallery: &Gallery) -> Element<'a, Message> {
    let mut col = column![].spacing(10);
    if !gallery.images.is_empty() {
        col = col.push(gallery_grid(images, &gallery.images, gallery.selected.as_ref(), move |url| {
            Message::UtilityImageSelected(utility, url)
        }));
    }
    if let Some(selected) = &gallery.selected {
        col = col.push(picture(images, selected, PREVIEW_WIDTH));
    }
    col.into()
}

fn utility_workspace<'a>(session: &'a Session, images: &ImageCache, tour_direction: &'a str) -> Element<'a, Message> {
    let u = &session.utilities;
    let mut col = column![].spacing(14).padding(12);

    if let Some(status) = session.loading_message() {
        col = col.push(text(format!("⏳ {status}")).size(16));
    }

    let Some(utility) = u.active else {
        return col
            .push(text("Pick a utility on the left").size(16))
            .width(Length::Fill)
            .into();
    };
    col = col.push(text(utility.title()).size(22));

    let panel: Element<'a, Message> = match utility {
        Utility::Moodboard => column![
            row![
                upload_slot(images, "Space", u.moodboard.source.as_ref(), UploadTarget::MoodboardSource),
                upload_slot(images, "Inspiration", u.moodboard.reference.as_ref(), UploadTarget::MoodboardReference),
            ]
            .spacing(12),
            text_input("Mood, materials, palette…", &u.moodboard.prompt)
                .on_input(Message::MoodboardPromptChanged)
                .padding(8),
            count_slider("Images", u.moodboard.image_count, Message::MoodboardCountChanged),
            generate_button("Create moodboard", session, GenerationAction::Moodboard),
            utility_gallery(images, utility, &u.moodboard.gallery),
        ]
        .spacing(12)
        .into(),
        Utility::Lighting => column![
            upload_slot(images, "Scene", u.lighting.source.as_ref(), UploadTarget::LightingSource),
            row![
                text("Interior").size(14),
                pick_list(
                    INTERIOR_LIGHTING_PRESETS,
                    INTERIOR_LIGHTING_PRESETS.iter().copied().find(|p| *p == u.lighting.interior),
                    |preset: &str| Message::LightingInteriorSelected(preset.to_string())
                ),
            ]
            .spacing(10)
            .align_y(Alignment::Center),
            row![
                text("Exterior").size(14),
                pick_list(
                    EXTERIOR_LIGHTING_PRESETS,
                    EXTERIOR_LIGHTING_PRESETS.iter().copied().find(|p| *p == u.lighting.exterior),
                    |preset: &str| Message::LightingExteriorSelected(preset.to_string())
                ),
            ]
            .spacing(10)
            .align_y(Alignment::Center),
            count_slider("Images", u.lighting.image_count, Message::LightingCountChanged),
            generate_button("Relight", session, GenerationAction::Lighting),
            utility_gallery(images, utility, &u.lighting.gallery),
        ]
        .spacing(12)
        .into(),
        Utility::VirtualTour => tour_panel(session, images, tour_direction),
        Utility::VideoPrompt => {
            let mut panel = column![
                upload_slot(images, "Scene", u.video_prompt.source.as_ref(), UploadTarget::VideoPromptSource),
                text_input("What should the camera do?", &u.video_prompt.user_prompt)
                    .on_input(Message::VideoBriefChanged)
                    .padding(8),
                generate_button("Write video script", session, GenerationAction::VideoScript),
            ]
            .spacing(12);
            if let Some(script) = &u.video_prompt.generated {
                panel = panel.push(text(script.as_str()).size(14));
            }
            panel.into()
        }
        Utility::ExtendView => column![
            upload_slot(images, "View", u.extend_view.source.as_ref(), UploadTarget::ExtendViewSource),
            row![
                text("Target ratio").size(14),
                pick_list(
                    &AspectRatio::ALL[1..],
                    Some(u.extend_view.aspect_ratio),
                    Message::ExtendRatioSelected
                ),
            ]
            .spacing(10)
            .align_y(Alignment::Center),
            count_slider("Images", u.extend_view.image_count, Message::ExtendCountChanged),
            generate_button("Extend", session, GenerationAction::ExtendView),
            utility_gallery(images, utility, &u.extend_view.gallery),
        ]
        .spacing(12)
        .into(),
        Utility::ChangeStyle => {
            let style = &u.change_style;
            let mut panel = column![
                upload_slot(images, "Design", style.source.as_ref(), UploadTarget::ChangeStyleSource),
                text_input("Target style, e.g. japandi", &style.user_prompt)
                    .on_input(Message::StyleBriefChanged)
                    .padding(8),
                generate_button("Write style prompt", session, GenerationAction::StylePrompt),
            ]
            .spacing(12);
            if let Some(prompt) = &style.generated_prompt {
                panel = panel
                    .push(
                        text_input("", prompt)
                            .on_input(Message::StylePromptEdited)
                            .padding(8),
                    )
                    .push(count_slider("Images", style.image_count, Message::StyleCountChanged))
                    .push(generate_button("Render style", session, GenerationAction::StyleImages));
            }
            panel.push(utility_gallery(images, utility, &style.gallery)).into()
        }
        Utility::Upscale => column![
            upload_slot(images, "Image", u.upscale.source.as_ref(), UploadTarget::UpscaleSource),
            row![
                text("Level").size(14),
                pick_list(UpscaleLevel::ALL, Some(u.upscale.level), Message::UpscaleLevelSelected),
            ]
            .spacing(10)
            .align_y(Alignment::Center),
            generate_button("Upscale", session, GenerationAction::Upscale),
            utility_gallery(images, utility, &u.upscale.gallery),
        ]
        .spacing(12)
        .into(),
    };

    scrollable(col.push(panel).width(Length::Fill)).into()
}

fn tour_panel<'a>(session: &'a Session, images: &ImageCache, direction: &'a str) -> Element<'a, Message> {
    let tour = &session.utilities.tour;
    let loading = session.is_loading();

    let start = row![
        button(text("Start from image…").size(14)).on_press(Message::PickImage(UploadTarget::TourStart)),
        button(text("Reset").size(14))
            .style(button::secondary)
            .on_press(Message::ClearImage(UploadTarget::TourStart)),
    ]
    .spacing(8);

    let Some(current) = tour.current() else {
        return column![start, text("Upload a view to begin walking through it").size(14)]
            .spacing(12)
            .into();
    };

    let step = |label: &'a str, towards: &str| {
        let b = button(text(label).size(14));
        if loading || towards.trim().is_empty() {
            b
        } else {
            b.on_press(Message::Generate(GenerationAction::TourNavigate(towards.to_string())))
        }
    };
    let undo = button(text("Undo").size(14)).style(button::secondary);
    let redo = button(text("Redo").size(14)).style(button::secondary);

    let frames: Vec<Element<'a, Message>> = tour
        .frames()
        .iter()
        .enumerate()
        .map(|(index, frame)| {
            let style = if tour.index() == Some(index) { button::primary } else { button::text };
            button(picture(images, frame, THUMB))
                .style(style)
                .padding(2)
                .on_press(Message::TourFrameSelected(index))
                .into()
        })
        .collect();

    column![
        start,
        picture(images, current, PREVIEW_WIDTH),
        row![
            step("⟲ Turn left", "turn left"),
            step("Move forward", "move forward"),
            step("Turn right ⟳", "turn right"),
            step("Look up", "look up"),
            step("Look down", "look down"),
        ]
        .spacing(6),
        row![
            text_input("Or describe a move…", direction)
                .on_input(Message::TourDirectionChanged)
                .padding(6),
            step("Go", direction),
        ]
        .spacing(6),
        row![
            if tour.can_undo() { undo.on_press(Message::TourUndo) } else { undo },
            if tour.can_redo() { redo.on_press(Message::TourRedo) } else { redo },
        ]
        .spacing(6),
        Wrap::with_elements(frames).spacing(6.0).line_spacing(6.0),
    ]
    .spacing(12)
    .into()
}

/// Right-hand panel: newest history items first
pub fn history_panel<'a>(session: &'a Session, images: &ImageCache) -> Element<'a, Message> {
    let header = row![
        text("History").size(18).width(Length::Fill),
        button(text("Clear").size(12))
            .style(button::secondary)
            .on_press(Message::ClearHistory),
    ]
    .align_y(Alignment::Center);

    let items = session
        .history()
        .newest_first()
        .fold(column![].spacing(8), |col, item| {
            let thumb: Element<'a, Message> = match item.thumbnail() {
                Some(url) => picture(images, url, THUMB * 0.6),
                None => Space::with_width(Length::Fixed(THUMB * 0.6)).into(),
            };
            let summary = column![
                text(item.mode.label()).size(12),
                text(item.prompt.chars().take(60).collect::<String>()).size(12),
                text(item.created_at.format("%H:%M").to_string()).size(10),
            ]
            .spacing(2);
            col.push(
                button(row![thumb, summary].spacing(8))
                    .style(button::text)
                    .width(Length::Fill)
                    .on_press(Message::HistorySelected(item.id)),
            )
        });

    column![header, scrollable(items)]
        .spacing(10)
        .padding(12)
        .width(Length::Fixed(260.0))
        .into()
}
