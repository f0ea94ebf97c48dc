/// Mode switch side effects, keyed on `(from, to)`
///
/// `plan` is a pure lookup: it says what a switch does to the shared source
/// image and which prompt defaults apply. `Session::set_mode` executes it.

use super::data::Mode;
use crate::locale::{Locale, Text};

/// What happens to the shared source image on a switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSwap {
    Keep,
    /// Entering the prompt mode: stash the shared source, load the prompt one
    StashShared,
    /// Leaving the prompt mode: put the stashed shared source back
    RestoreShared,
    /// Utilities manage their own images
    Clear,
}

/// Prompt, negative prompt and plan sub-mode a mode starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptDefaults {
    /// Localised initial prompt plus the default negative prompt
    Create,
    /// Localised plan prompt, empty negative, render sub-mode
    PlanTo3d,
    /// Both fields empty
    Empty,
}

impl PromptDefaults {
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Create => Self::Create,
            Mode::PlanTo3d => Self::PlanTo3d,
            Mode::CameraAngle
            | Mode::Edit
            | Mode::CanvaMix
            | Mode::PromptGen
            | Mode::Video
            | Mode::Utilities => Self::Empty,
        }
    }

    /// `(prompt, negative_prompt)` in the given locale
    pub fn texts(&self, locale: Locale) -> (String, String) {
        match self {
            Self::Create => (
                locale.text(Text::PromptInitial).to_string(),
                locale.text(Text::DefaultNegativePrompt).to_string(),
            ),
            Self::PlanTo3d => (locale.text(Text::PromptPlanTo3d).to_string(), String::new()),
            Self::Empty => (String::new(), String::new()),
        }
    }
}

/// The full effect of one mode switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModePatch {
    pub source: SourceSwap,
    /// `None` when the mode does not change
    pub defaults: Option<PromptDefaults>,
}

/// Look up the patch for switching from `from` to `to`.
/// Transient UI flags are reset on every switch regardless of the patch.
pub fn plan(from: Mode, to: Mode) -> ModePatch {
    let source = match (from, to) {
        (a, b) if a == b => SourceSwap::Keep,
        (_, Mode::PromptGen) => SourceSwap::StashShared,
        (_, Mode::Utilities) => SourceSwap::Clear,
        (Mode::PromptGen, _) => SourceSwap::RestoreShared,
        _ => SourceSwap::Keep,
    };
    let defaults = (from != to).then(|| PromptDefaults::for_mode(to));
    ModePatch { source, defaults }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mode_isolation() {
        assert_eq!(plan(Mode::Create, Mode::PromptGen).source, SourceSwap::StashShared);
        assert_eq!(plan(Mode::PromptGen, Mode::Edit).source, SourceSwap::RestoreShared);
        assert_eq!(plan(Mode::PromptGen, Mode::Utilities).source, SourceSwap::Clear);
        assert_eq!(plan(Mode::Edit, Mode::Video).source, SourceSwap::Keep);
    }

    #[test]
    fn test_same_mode_has_no_defaults() {
        for mode in Mode::ALL {
            let patch = plan(mode, mode);
            assert_eq!(patch.source, SourceSwap::Keep);
            assert_eq!(patch.defaults, None);
        }
    }

    #[test]
    fn test_defaults_per_mode() {
        assert_eq!(
            plan(Mode::Edit, Mode::Create).defaults,
            Some(PromptDefaults::Create)
        );
        assert_eq!(
            plan(Mode::Create, Mode::PlanTo3d).defaults,
            Some(PromptDefaults::PlanTo3d)
        );
        let (prompt, negative) = PromptDefaults::PlanTo3d.texts(Locale::En);
        assert!(!prompt.is_empty());
        assert!(negative.is_empty());
        assert_eq!(
            PromptDefaults::Empty.texts(Locale::Vi),
            (String::new(), String::new())
        );
    }
}
