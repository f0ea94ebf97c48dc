/// Instruction templates wrapped around the user's prompt
///
/// The service receives these instead of the raw prompt for the modes that
/// need framing. History items always keep the user's own text.

use crate::state::data::PlanMode;

/// Re-render the source building from a described viewpoint
pub fn camera_angle(angle: &str) -> String {
    format!(
        "Render the building shown in the provided image from a new camera angle. \
         Requested angle: \"{angle}\". The result must be a realistic architectural photograph."
    )
}

/// Close-ups of the region marked with an orange rectangle
pub fn close_up(count: u8) -> String {
    format!(
        "The provided image has an orange rectangle drawn on it that marks a region of interest. \
         The rectangle must not appear in any output. Working as an architectural photographer, \
         produce {count} distinct close-up photographs of the marked region, each taken from a \
         different camera angle (straight on, low angle, 45 degrees, or a detail of one feature). \
         Keep the original style, lighting and materials and leave the photographs free of annotations."
    )
}

/// Turn a 2D floor plan into an interior render or a coloured plan
pub fn plan(mode: PlanMode, prompt: &str) -> String {
    match mode {
        PlanMode::Render => format!(
            "You convert 2D floor plans into photorealistic 3D interior renders. \
             Read the layout, room sizes, furniture, windows and doors from the plan. \
             Style, mood and materials follow this request: \"{prompt}\". \
             If a second image is given it is a style reference: borrow its palette, \
             textures and lighting but never its layout. \
             Pick an engaging eye-level viewpoint and deliver one high quality render."
        ),
        PlanMode::Colorize => format!(
            "Colour the provided black and white 2D floor plan. \
             Palette and style follow this request: \"{prompt}\". \
             Use clear professional conventions, with distinct colours for walls, furniture, \
             windows, doors and room types. Keep the layout unchanged and add no 3D effects."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_embed_user_text() {
        assert!(camera_angle("low angle from the street").contains("\"low angle from the street\""));
        assert!(close_up(3).contains("produce 3 distinct"));
        assert!(plan(PlanMode::Render, "japandi").contains("\"japandi\""));
        assert!(plan(PlanMode::Colorize, "pastel").contains("no 3D effects"));
    }
}
