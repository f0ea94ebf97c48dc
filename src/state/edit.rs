/// Edit-mode sub-state
///
/// The edit mode is a small state machine driven by `EditSubMode`:
/// inpainting needs a drawn mask, the merge variants need a second image.
/// Switching sub-mode keeps both inputs; it only changes which one is
/// required when generating.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::data::SourceImage;
use crate::error::ValidationError;

/// Brush diameter in source image pixels
pub const DEFAULT_BRUSH_SIZE: u32 = 20;
pub const MIN_BRUSH_SIZE: u32 = 2;
pub const MAX_BRUSH_SIZE: u32 = 200;

/// Which edit operation runs on generate
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum EditSubMode {
    /// Repaint the masked region of the source
    #[default]
    Inpaint,
    /// Insert an object from the second image into the source
    MergeObject,
    /// Restyle the source after the second image
    MergeStyle,
}

impl EditSubMode {
    pub const ALL: [EditSubMode; 3] = [Self::Inpaint, Self::MergeObject, Self::MergeStyle];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Inpaint => "Inpaint",
            Self::MergeObject => "Merge object",
            Self::MergeStyle => "Merge style",
        }
    }

    pub fn needs_mask(&self) -> bool {
        matches!(self, Self::Inpaint)
    }
}

impl fmt::Display for EditSubMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Mask drawing tool
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EditTool {
    #[default]
    Brush,
    Lasso,
}

/// One painted brush stroke
///
/// Points are in percent of the source size, `size` is the brush
/// diameter in source pixels at the time the stroke was painted.
#[derive(Debug, Clone, PartialEq)]
pub struct BrushStroke {
    pub points: Vec<(f32, f32)>,
    pub size: u32,
}

/// Everything the edit mode owns besides the shared source image
#[derive(Debug, Clone, PartialEq)]
pub struct EditState {
    pub sub_mode: EditSubMode,
    pub tool: EditTool,
    pub brush_size: u32,
    /// Strokes the current mask was painted from
    pub strokes: Vec<BrushStroke>,
    /// Drawn or uploaded mask, white where the image should change
    pub mask: Option<SourceImage>,
    /// Second image for the merge variants
    pub second_image: Option<SourceImage>,
    /// Optional style reference for inpainting
    pub reference: Option<SourceImage>,
}

impl Default for EditState {
    fn default() -> Self {
        Self {
            sub_mode: EditSubMode::default(),
            tool: EditTool::default(),
            brush_size: DEFAULT_BRUSH_SIZE,
            strokes: Vec::new(),
            mask: None,
            second_image: None,
            reference: None,
        }
    }
}

/// The inputs an edit request will use
#[derive(Debug, Clone, PartialEq)]
pub enum EditInputs {
    Inpaint {
        mask: SourceImage,
        reference: Option<SourceImage>,
    },
    Merge {
        second_image: SourceImage,
    },
}

impl EditState {
    /// Reset the tool selection, keeping inputs
    pub fn reset_tools(&mut self) {
        self.tool = EditTool::Brush;
        self.sub_mode = EditSubMode::Inpaint;
    }

    pub fn set_brush_size(&mut self, size: u32) {
        self.brush_size = size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE);
    }

    /// Replace the mask with one that was not painted, e.g. an upload or a lasso
    pub fn set_mask(&mut self, mask: Option<SourceImage>) {
        self.mask = mask;
        self.strokes.clear();
    }

    pub fn clear_mask(&mut self) {
        self.set_mask(None);
    }

    /// Drop every input that depends on the current source image
    pub fn clear_inputs(&mut self) {
        self.clear_mask();
        self.second_image = None;
        self.reference = None;
    }

    /// The mask editor is live while inpainting with a source to draw on
    pub fn is_editing_mask(&self, has_source: bool) -> bool {
        has_source && self.sub_mode.needs_mask()
    }

    /// Pick the inputs required by the current sub-mode
    pub fn required_inputs(&self) -> Result<EditInputs, ValidationError> {
        if self.sub_mode.needs_mask() {
            let mask = self.mask.clone().ok_or(ValidationError::DrawMask)?;
            Ok(EditInputs::Inpaint {
                mask,
                reference: self.reference.clone(),
            })
        } else {
            let second_image = self
                .second_image
                .clone()
                .ok_or(ValidationError::UploadBothImages)?;
            Ok(EditInputs::Merge { second_image })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(tag: &str) -> SourceImage {
        SourceImage::new(tag, "image/png")
    }

    #[test]
    fn test_inpaint_requires_mask() {
        let mut state = EditState::default();
        state.second_image = Some(image("second"));
        assert_eq!(state.required_inputs(), Err(ValidationError::DrawMask));

        state.mask = Some(image("mask"));
        assert!(matches!(
            state.required_inputs(),
            Ok(EditInputs::Inpaint { .. })
        ));
    }

    #[test]
    fn test_switching_sub_mode_keeps_inputs() {
        let mut state = EditState::default();
        state.mask = Some(image("mask"));
        state.sub_mode = EditSubMode::MergeStyle;

        assert_eq!(state.required_inputs(), Err(ValidationError::UploadBothImages));
        assert!(state.mask.is_some());

        state.second_image = Some(image("second"));
        assert_eq!(
            state.required_inputs(),
            Ok(EditInputs::Merge {
                second_image: image("second")
            })
        );
    }

    #[test]
    fn test_mask_editor_only_while_inpainting() {
        let mut state = EditState::default();
        assert!(state.is_editing_mask(true));
        assert!(!state.is_editing_mask(false));

        state.tool = EditTool::Lasso;
        assert!(state.is_editing_mask(true));

        state.sub_mode = EditSubMode::MergeStyle;
        assert!(!state.is_editing_mask(true));
    }

    #[test]
    fn test_brush_size_is_clamped() {
        let mut state = EditState::default();
        assert_eq!(state.brush_size, DEFAULT_BRUSH_SIZE);
        state.set_brush_size(0);
        assert_eq!(state.brush_size, MIN_BRUSH_SIZE);
        state.set_brush_size(5000);
        assert_eq!(state.brush_size, MAX_BRUSH_SIZE);
    }

    #[test]
    fn test_replacing_mask_forgets_strokes() {
        let mut state = EditState::default();
        state.strokes.push(BrushStroke { points: vec![(10.0, 10.0)], size: 20 });
        state.mask = Some(image("painted"));

        state.set_mask(Some(image("uploaded")));
        assert!(state.strokes.is_empty());
        assert_eq!(state.mask, Some(image("uploaded")));

        state.clear_mask();
        assert_eq!(state.mask, None);
    }

    #[test]
    fn test_reset_tools_keeps_inputs() {
        let mut state = EditState {
            tool: EditTool::Lasso,
            sub_mode: EditSubMode::MergeObject,
            mask: Some(image("mask")),
            ..EditState::default()
        };

        state.reset_tools();

        assert_eq!(state.tool, EditTool::Brush);
        assert_eq!(state.sub_mode, EditSubMode::Inpaint);
        assert!(state.mask.is_some());
    }
}
