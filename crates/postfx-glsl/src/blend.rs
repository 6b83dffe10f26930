//! Blend-function vocabulary
//!
//! Every effect declares how its output is combined with the colors already
//! in the frame. Each non-skip function maps to a canonical GLSL snippet that
//! defines a function literally named `blend`; before the snippet lands in
//! the merged shader it is renamed to `blend<TOKEN>` (e.g. `blendNORMAL`) so
//! distinct blend functions coexist in one program.
//!
//! Snippets are stored as external .frag files and included at compile time,
//! one file per function.

use std::sync::OnceLock;

use regex::Regex;

/// Whole-word occurrences of the generic `blend` symbol inside a snippet.
fn blend_symbol_regex() -> &'static Regex {
    static BLEND_REGEX: OnceLock<Regex> = OnceLock::new();
    BLEND_REGEX.get_or_init(|| Regex::new(r"\bblend\b").expect("Invalid blend regex"))
}

mod snippets {
    pub const ADD: &str = include_str!("shaders/blend/add.frag");
    pub const ALPHA: &str = include_str!("shaders/blend/alpha.frag");
    pub const AVERAGE: &str = include_str!("shaders/blend/average.frag");
    pub const COLOR_BURN: &str = include_str!("shaders/blend/color-burn.frag");
    pub const COLOR_DODGE: &str = include_str!("shaders/blend/color-dodge.frag");
    pub const DARKEN: &str = include_str!("shaders/blend/darken.frag");
    pub const DIFFERENCE: &str = include_str!("shaders/blend/difference.frag");
    pub const EXCLUSION: &str = include_str!("shaders/blend/exclusion.frag");
    pub const LIGHTEN: &str = include_str!("shaders/blend/lighten.frag");
    pub const MULTIPLY: &str = include_str!("shaders/blend/multiply.frag");
    pub const DIVIDE: &str = include_str!("shaders/blend/divide.frag");
    pub const NEGATION: &str = include_str!("shaders/blend/negation.frag");
    pub const NORMAL: &str = include_str!("shaders/blend/normal.frag");
    pub const OVERLAY: &str = include_str!("shaders/blend/overlay.frag");
    pub const REFLECT: &str = include_str!("shaders/blend/reflect.frag");
    pub const SCREEN: &str = include_str!("shaders/blend/screen.frag");
    pub const SOFT_LIGHT: &str = include_str!("shaders/blend/soft-light.frag");
    pub const SUBTRACT: &str = include_str!("shaders/blend/subtract.frag");
}

/// A color-combination formula applied between an effect's output and the
/// colors already in the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlendFunction {
    /// Excludes the effect from the merged shader entirely.
    Skip,
    Add,
    Alpha,
    Average,
    ColorBurn,
    ColorDodge,
    Darken,
    Difference,
    Exclusion,
    Lighten,
    Multiply,
    Divide,
    Negation,
    Normal,
    Overlay,
    Reflect,
    Screen,
    SoftLight,
    Subtract,
}

impl BlendFunction {
    /// The token used to derive the renamed function (`blend<TOKEN>`).
    pub fn token(self) -> &'static str {
        match self {
            BlendFunction::Skip => "SKIP",
            BlendFunction::Add => "ADD",
            BlendFunction::Alpha => "ALPHA",
            BlendFunction::Average => "AVERAGE",
            BlendFunction::ColorBurn => "COLOR_BURN",
            BlendFunction::ColorDodge => "COLOR_DODGE",
            BlendFunction::Darken => "DARKEN",
            BlendFunction::Difference => "DIFFERENCE",
            BlendFunction::Exclusion => "EXCLUSION",
            BlendFunction::Lighten => "LIGHTEN",
            BlendFunction::Multiply => "MULTIPLY",
            BlendFunction::Divide => "DIVIDE",
            BlendFunction::Negation => "NEGATION",
            BlendFunction::Normal => "NORMAL",
            BlendFunction::Overlay => "OVERLAY",
            BlendFunction::Reflect => "REFLECT",
            BlendFunction::Screen => "SCREEN",
            BlendFunction::SoftLight => "SOFT_LIGHT",
            BlendFunction::Subtract => "SUBTRACT",
        }
    }

    /// The name of the renamed blend function as it appears in the merged
    /// shader, e.g. `blendNORMAL`.
    pub fn shader_function_name(self) -> String {
        format!("blend{}", self.token())
    }

    /// The canonical GLSL snippet for this function, or `None` for [`Skip`].
    ///
    /// [`Skip`]: BlendFunction::Skip
    pub fn shader_code(self) -> Option<&'static str> {
        match self {
            BlendFunction::Skip => None,
            BlendFunction::Add => Some(snippets::ADD),
            BlendFunction::Alpha => Some(snippets::ALPHA),
            BlendFunction::Average => Some(snippets::AVERAGE),
            BlendFunction::ColorBurn => Some(snippets::COLOR_BURN),
            BlendFunction::ColorDodge => Some(snippets::COLOR_DODGE),
            BlendFunction::Darken => Some(snippets::DARKEN),
            BlendFunction::Difference => Some(snippets::DIFFERENCE),
            BlendFunction::Exclusion => Some(snippets::EXCLUSION),
            BlendFunction::Lighten => Some(snippets::LIGHTEN),
            BlendFunction::Multiply => Some(snippets::MULTIPLY),
            BlendFunction::Divide => Some(snippets::DIVIDE),
            BlendFunction::Negation => Some(snippets::NEGATION),
            BlendFunction::Normal => Some(snippets::NORMAL),
            BlendFunction::Overlay => Some(snippets::OVERLAY),
            BlendFunction::Reflect => Some(snippets::REFLECT),
            BlendFunction::Screen => Some(snippets::SCREEN),
            BlendFunction::SoftLight => Some(snippets::SOFT_LIGHT),
            BlendFunction::Subtract => Some(snippets::SUBTRACT),
        }
    }

    /// The snippet with its generic `blend` symbol renamed to
    /// `blend<TOKEN>`, ready to splice into a merged shader.
    pub fn renamed_shader_code(self) -> Option<String> {
        self.shader_code().map(|code| {
            blend_symbol_regex()
                .replace_all(code, self.shader_function_name())
                .into_owned()
        })
    }
}
