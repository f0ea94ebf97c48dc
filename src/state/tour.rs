/// Virtual tour: a linear, undoable sequence of generated frames
///
/// Navigating from a frame that is not the last one discards the frames
/// after it before appending the new frame, like a text editor's undo stack.

use super::data::{ImageUrl, SourceImage};
use crate::error::{Result, ValidationError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VirtualTour {
    frames: Vec<ImageUrl>,
    index: Option<usize>,
}

impl VirtualTour {
    /// Start a new tour from an uploaded image, or reset with `None`
    pub fn start(&mut self, image: Option<&SourceImage>) {
        match image {
            Some(image) => {
                self.frames = vec![image.to_data_url()];
                self.index = Some(0);
            }
            None => {
                self.frames.clear();
                self.index = None;
            }
        }
    }

    pub fn frames(&self) -> &[ImageUrl] {
        &self.frames
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn current(&self) -> Option<&ImageUrl> {
        self.index.and_then(|i| self.frames.get(i))
    }

    /// The frame the next navigation step starts from
    pub fn current_image(&self) -> Result<SourceImage> {
        let frame = self.current().ok_or(ValidationError::TourNotStarted)?;
        SourceImage::from_data_url(frame)
    }

    /// Drop frames after the current one and append `frame`
    pub fn push_frame(&mut self, frame: ImageUrl) {
        let keep = self.index.map_or(0, |i| i + 1);
        self.frames.truncate(keep);
        self.frames.push(frame);
        self.index = Some(self.frames.len() - 1);
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.index, Some(i) if i > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.index, Some(i) if i + 1 < self.frames.len())
    }

    pub fn undo(&mut self) {
        if let Some(i) = self.index.filter(|_| self.can_undo()) {
            self.index = Some(i - 1);
        }
    }

    pub fn redo(&mut self) {
        if let Some(i) = self.index.filter(|_| self.can_redo()) {
            self.index = Some(i + 1);
        }
    }

    /// Jump to a frame from the filmstrip
    pub fn select(&mut self, index: usize) {
        if index < self.frames.len() {
            self.index = Some(index);
        }
    }
}
