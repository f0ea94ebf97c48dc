use cgmath::{Basis2, Deg, Rotation, Rotation2, Vector2};
use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, LineCap, LineJoin, Path, Program, Stroke};
use iced::{Color, Pixels, Point, Rectangle, Renderer, Size, Theme};

use crate::state::canva::CanvaBoard;
use crate::state::edit::BrushStroke;
use crate::state::markup::Region;
use crate::Message;

const MARKER: Color = Color::from_rgb(1.0, 0.55, 0.0);

/// Pointer travel in widget pixels before another trace point is kept
const TRACE_SPACING: f32 = 3.0;

/// Edits on the canva board coming from the placement canvas and its buttons
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvaMessage {
    Select(Option<usize>),
    /// Offset in percent of the canvas size
    Move { dx: f32, dy: f32 },
    Scale(f32),
    Rotate(f32),
    DeleteSelected,
    SetLocked(bool),
}

/// State for drag interactions
#[derive(Debug, Clone, Default)]
pub struct DragState {
    pub is_dragging: bool,
    pub last_position: Option<Point>,
}

/// Interactive overlay for placing decor on the background.
/// Drag moves the selected object, the wheel scales it.
pub struct CanvaPlacement<'a> {
    pub board: &'a CanvaBoard,
}

fn wheel_factor(delta: mouse::ScrollDelta) -> f32 {
    let steps = match delta {
        mouse::ScrollDelta::Lines { y, .. } => y * 0.1,
        mouse::ScrollDelta::Pixels { y, .. } => y * 0.01,
    };
    (1.0 + steps).max(0.1)
}

impl Program<Message> for CanvaPlacement<'_> {
    type State = DragState;

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(pos) = cursor.position_in(bounds) {
                    let hit = self.board.hit_test(pos.x, pos.y, bounds.width, bounds.height);
                    state.is_dragging = hit.is_some() && !self.board.is_locked();
                    state.last_position = Some(pos);
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::Canva(CanvaMessage::Select(hit))),
                    );
                }
            }

            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if state.is_dragging {
                    state.is_dragging = false;
                    state.last_position = None;
                    return (canvas::event::Status::Captured, None);
                }
            }

            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) if state.is_dragging => {
                if let (Some(current), Some(last)) = (cursor.position_in(bounds), state.last_position) {
                    state.last_position = Some(current);
                    let dx = (current.x - last.x) / bounds.width * 100.0;
                    let dy = (current.y - last.y) / bounds.height * 100.0;
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::Canva(CanvaMessage::Move { dx, dy })),
                    );
                }
            }

            canvas::Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                if cursor.is_over(bounds) && self.board.selected().is_some() {
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::Canva(CanvaMessage::Scale(wheel_factor(delta)))),
                    );
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        for (index, t) in self.board.transforms().iter().enumerate() {
            let centre = Vector2::new(t.x / 100.0 * bounds.width, t.y / 100.0 * bounds.height);
            let half = t.scale / 100.0 * bounds.width / 2.0;
            let rotation: Basis2<f32> = Rotation2::from_angle(Deg(t.rotation));
            let corners = [(-half, -half), (half, -half), (half, half), (-half, half)]
                .map(|(x, y)| centre + rotation.rotate_vector(Vector2::new(x, y)))
                .map(|v| Point::new(v.x, v.y));

            let outline = Path::new(|builder| {
                builder.move_to(corners[0]);
                for corner in &corners[1..] {
                    builder.line_to(*corner);
                }
                builder.close();
            });

            let selected = self.board.selected() == Some(index);
            let color = if selected { MARKER } else { Color::WHITE };
            frame.fill(&outline, Color { a: 0.15, ..color });
            frame.stroke(
                &outline,
                Stroke::default()
                    .with_color(color)
                    .with_width(if selected { 3.0 } else { 1.5 }),
            );
            frame.fill_text(canvas::Text {
                content: (index + 1).to_string(),
                position: Point::new(centre.x, centre.y),
                color,
                size: Pixels(16.0),
                ..canvas::Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}

/// Drag state of the area selector
#[derive(Debug, Clone, Default)]
pub struct AreaDrag {
    start: Option<Point>,
    current: Option<Point>,
}

/// Rubber-band rectangle drawn over an image.
/// Emits the region in percent of the widget size on release.
pub struct AreaSelector;

fn percent(point: Point, bounds: Rectangle) -> (f32, f32) {
    (point.x / bounds.width * 100.0, point.y / bounds.height * 100.0)
}

impl Program<Message> for AreaSelector {
    type State = AreaDrag;

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(pos) = cursor.position_in(bounds) {
                    state.start = Some(pos);
                    state.current = Some(pos);
                    return (canvas::event::Status::Captured, None);
                }
            }
            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) if state.start.is_some() => {
                if let Some(pos) = cursor.position_in(bounds) {
                    state.current = Some(pos);
                    return (canvas::event::Status::Captured, None);
                }
            }
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if let (Some(start), Some(end)) = (state.start.take(), state.current.take()) {
                    let region = Region::from_corners(percent(start, bounds), percent(end, bounds));
                    let message = region.is_meaningful().then_some(Message::AreaSelected(region));
                    return (canvas::event::Status::Captured, message);
                }
            }
            _ => {}
        }
        (canvas::event::Status::Ignored, None)
    }

    fn draw(
        &self,
        state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        if let (Some(start), Some(end)) = (state.start, state.current) {
            let top_left = Point::new(start.x.min(end.x), start.y.min(end.y));
            let size = Size::new((start.x - end.x).abs(), (start.y - end.y).abs());
            frame.stroke(
                &Path::rectangle(top_left, size),
                Stroke::default().with_color(MARKER).with_width(3.0),
            );
        }
        vec![frame.into_geometry()]
    }
}

/// Pointer path collected while the left button is held
#[derive(Debug, Clone, Default)]
pub struct Trace {
    points: Vec<Point>,
    drawing: bool,
}

impl Trace {
    fn begin(&mut self, at: Point) {
        self.points.clear();
        self.points.push(at);
        self.drawing = true;
    }

    fn extend(&mut self, to: Point) {
        let far_enough = self
            .points
            .last()
            .map_or(true, |last| last.distance(to) >= TRACE_SPACING);
        if far_enough {
            self.points.push(to);
        }
    }

    /// Stop drawing and hand back the path in percent of `bounds`
    fn finish(&mut self, bounds: Rectangle) -> Vec<(f32, f32)> {
        self.drawing = false;
        std::mem::take(&mut self.points)
            .into_iter()
            .map(|point| percent(point, bounds))
            .collect()
    }

    fn update(
        &mut self,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> Option<(canvas::event::Status, Option<Vec<(f32, f32)>>)> {
        match event {
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                let pos = cursor.position_in(bounds)?;
                self.begin(pos);
                Some((canvas::event::Status::Captured, None))
            }
            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) if self.drawing => {
                let pos = cursor.position_in(bounds)?;
                self.extend(pos);
                Some((canvas::event::Status::Captured, None))
            }
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) if self.drawing => {
                Some((canvas::event::Status::Captured, Some(self.finish(bounds))))
            }
            _ => None,
        }
    }
}

fn polyline(points: impl IntoIterator<Item = Point>, closed: bool) -> Path {
    Path::new(|builder| {
        let mut points = points.into_iter();
        if let Some(first) = points.next() {
            builder.move_to(first);
            for point in points {
                builder.line_to(point);
            }
            if closed {
                builder.close();
            }
        }
    })
}

/// Free-hand lasso over the source.
/// Emits the closed outline in percent of the widget size on release.
pub struct LassoSelector;

impl Program<Message> for LassoSelector {
    type State = Trace;

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match state.update(event, bounds, cursor) {
            Some((status, Some(outline))) => {
                let message = (outline.len() >= 3).then_some(Message::LassoClosed(outline));
                (status, message)
            }
            Some((status, None)) => (status, None),
            None => (canvas::event::Status::Ignored, None),
        }
    }

    fn draw(
        &self,
        state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        if state.points.len() >= 2 {
            let outline = polyline(state.points.iter().copied(), true);
            frame.fill(&outline, Color { a: 0.2, ..MARKER });
            frame.stroke(&outline, Stroke::default().with_color(MARKER).with_width(2.0));
        }
        vec![frame.into_geometry()]
    }
}

/// Brush painting over the source.
/// Shows the strokes already in the mask and emits each new stroke on release.
pub struct BrushPainter<'a> {
    pub strokes: &'a [BrushStroke],
    pub brush_size: u32,
    /// Widget pixels per source pixel
    pub scale: f32,
}

impl BrushPainter<'_> {
    fn paint(&self, frame: &mut canvas::Frame, points: &[Point], size: u32) {
        let width = (size as f32 * self.scale).max(1.0);
        let color = Color { a: 0.5, ..MARKER };
        match points {
            [] => {}
            [dot] => frame.fill(&Path::circle(*dot, width / 2.0), color),
            _ => frame.stroke(
                &polyline(points.iter().copied(), false),
                Stroke::default()
                    .with_color(color)
                    .with_width(width)
                    .with_line_cap(LineCap::Round)
                    .with_line_join(LineJoin::Round),
            ),
        }
    }
}

impl Program<Message> for BrushPainter<'_> {
    type State = Trace;

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match state.update(event, bounds, cursor) {
            Some((status, Some(points))) => {
                let message = (!points.is_empty()).then_some(Message::BrushStroke(points));
                (status, message)
            }
            Some((status, None)) => (status, None),
            None => (canvas::event::Status::Ignored, None),
        }
    }

    fn draw(
        &self,
        state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        for stroke in self.strokes {
            let points: Vec<Point> = stroke
                .points
                .iter()
                .map(|(x, y)| Point::new(x / 100.0 * bounds.width, y / 100.0 * bounds.height))
                .collect();
            self.paint(&mut frame, &points, stroke.size);
        }
        self.paint(&mut frame, &state.points, self.brush_size);
        vec![frame.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        if cursor.is_over(bounds) {
            mouse::Interaction::Crosshair
        } else {
            mouse::Interaction::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wheel_factor_never_collapses() {
        assert!((wheel_factor(mouse::ScrollDelta::Lines { x: 0.0, y: 1.0 }) - 1.1).abs() < 1e-6);
        assert!((wheel_factor(mouse::ScrollDelta::Pixels { x: 0.0, y: -50.0 }) - 0.5).abs() < 1e-6);
        assert_eq!(wheel_factor(mouse::ScrollDelta::Lines { x: 0.0, y: -20.0 }), 0.1);
    }

    #[test]
    fn test_percent_of_bounds() {
        let bounds = Rectangle::new(Point::new(10.0, 10.0), Size::new(200.0, 100.0));
        assert_eq!(percent(Point::new(50.0, 25.0), bounds), (25.0, 25.0));
    }

    fn bounds() -> Rectangle {
        Rectangle::new(Point::ORIGIN, Size::new(200.0, 100.0))
    }

    fn press() -> canvas::Event {
        canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left))
    }

    fn release() -> canvas::Event {
        canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left))
    }

    fn move_to(state: &mut Trace, program: &impl Program<Message, State = Trace>, x: f32, y: f32) -> Option<Message> {
        let position = Point::new(x, y);
        let event = canvas::Event::Mouse(mouse::Event::CursorMoved { position });
        program.update(state, event, bounds(), Cursor::Available(position)).1
    }

    #[test]
    fn test_trace_skips_jitter() {
        let mut trace = Trace::default();
        trace.begin(Point::new(10.0, 10.0));
        trace.extend(Point::new(11.0, 10.0));
        trace.extend(Point::new(20.0, 10.0));
        assert_eq!(trace.finish(bounds()), vec![(5.0, 10.0), (10.0, 10.0)]);
        assert!(!trace.drawing);
    }

    #[test]
    fn test_lasso_emits_closed_outline() {
        let mut state = Trace::default();
        let start = Cursor::Available(Point::new(20.0, 20.0));
        LassoSelector.update(&mut state, press(), bounds(), start);
        assert!(move_to(&mut state, &LassoSelector, 100.0, 20.0).is_none());
        assert!(move_to(&mut state, &LassoSelector, 100.0, 80.0).is_none());

        let (status, message) = LassoSelector.update(&mut state, release(), bounds(), start);

        assert_eq!(status, canvas::event::Status::Captured);
        match message {
            Some(Message::LassoClosed(outline)) => {
                assert_eq!(outline, vec![(10.0, 20.0), (50.0, 20.0), (50.0, 80.0)]);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_lasso_ignores_a_click() {
        let mut state = Trace::default();
        let at = Cursor::Available(Point::new(20.0, 20.0));
        LassoSelector.update(&mut state, press(), bounds(), at);
        let (_, message) = LassoSelector.update(&mut state, release(), bounds(), at);
        assert!(message.is_none());
    }

    #[test]
    fn test_brush_click_paints_a_dot() {
        let painter = BrushPainter { strokes: &[], brush_size: 20, scale: 1.0 };
        let mut state = Trace::default();
        let at = Cursor::Available(Point::new(50.0, 50.0));
        painter.update(&mut state, press(), bounds(), at);
        let (_, message) = painter.update(&mut state, release(), bounds(), at);

        assert!(matches!(message, Some(Message::BrushStroke(points)) if points == vec![(25.0, 50.0)]));
    }

    #[test]
    fn test_release_outside_a_drag_is_ignored() {
        let painter = BrushPainter { strokes: &[], brush_size: 20, scale: 1.0 };
        let mut state = Trace::default();
        let at = Cursor::Available(Point::new(50.0, 50.0));
        let (status, message) = painter.update(&mut state, release(), bounds(), at);
        assert_eq!(status, canvas::event::Status::Ignored);
        assert!(message.is_none());
    }
}
