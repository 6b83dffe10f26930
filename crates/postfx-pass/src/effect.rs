//! Effect capability interface
//!
//! An effect is a named unit of visual behavior: a fragment shader following
//! the `mainImage`/`mainUv` conventions, an optional vertex shader with
//! `mainSupport`, its uniforms, macro definitions, required extensions, and a
//! blend mode. The composition pass reads these through the trait below and
//! drives the lifecycle methods; all lifecycle methods default to no-ops.
//!
//! Uniform and define keys are fixed after construction. The merged shader's
//! uniform layout is frozen at compile time; only values may change without a
//! `recompile()`.

use std::collections::BTreeSet;

use postfx_glsl::BlendFunction;

use crate::renderer::{DepthPacking, Renderer, TextureHandle};
use crate::uniform::{DefineMap, Uniform, UniformMap};

bitflags::bitflags! {
    /// Per-effect flags controlling merge ordering and resource needs.
    ///
    /// Effects are integrated in descending attribute order, so convolution
    /// effects come first and depth-reading effects before plain ones.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct EffectAttributes: u32 {
        /// The effect reads scene depth.
        const DEPTH = 1;
        /// The effect performs convolution; at most one per pass, and
        /// incompatible with UV-transforming effects.
        const CONVOLUTION = 2;
    }
}

/// A required WebGL shader extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Extension {
    Derivatives,
    FragDepth,
    DrawBuffers,
    ShaderTextureLod,
}

impl Extension {
    /// The identifier the external renderer enables.
    pub fn identifier(self) -> &'static str {
        match self {
            Extension::Derivatives => "OES_standard_derivatives",
            Extension::FragDepth => "EXT_frag_depth",
            Extension::DrawBuffers => "WEBGL_draw_buffers",
            Extension::ShaderTextureLod => "EXT_shader_texture_lod",
        }
    }
}

/// Set of required extensions, merged across effects at composition time.
pub type ExtensionSet = BTreeSet<Extension>;

/// How an effect's output is combined with the frame.
///
/// `opacity` is a shared uniform holder; its value may be changed at runtime
/// without recompilation. Changing the `function` requires `recompile()`.
#[derive(Debug, Clone)]
pub struct BlendMode {
    function: BlendFunction,
    opacity: Uniform,
}

impl BlendMode {
    pub fn new(function: BlendFunction) -> Self {
        Self::with_opacity(function, 1.0)
    }

    pub fn with_opacity(function: BlendFunction, opacity: f32) -> Self {
        Self {
            function,
            opacity: Uniform::float(opacity),
        }
    }

    pub fn function(&self) -> BlendFunction {
        self.function
    }

    /// The shared opacity holder.
    pub fn opacity(&self) -> &Uniform {
        &self.opacity
    }

    pub fn set_opacity(&self, opacity: f32) {
        self.opacity.set_float(opacity);
    }
}

impl Default for BlendMode {
    fn default() -> Self {
        Self::new(BlendFunction::Normal)
    }
}

/// A named unit of visual behavior merged into the composition pass.
///
/// Data accessors describe the effect; lifecycle methods are driven by the
/// owning pass. Identity fields (`name`, `fragment_shader`) are never mutated
/// by the pass.
pub trait Effect {
    /// Unique name, used in diagnostics only.
    fn name(&self) -> &str;

    /// Ordering/resource flags.
    fn attributes(&self) -> EffectAttributes {
        EffectAttributes::empty()
    }

    /// Fragment shader source. Must define `mainImage` and/or `mainUv`.
    fn fragment_shader(&self) -> &str;

    /// Optional vertex shader source; may define `mainSupport`.
    fn vertex_shader(&self) -> Option<&str> {
        None
    }

    /// Uniforms, keyed by their bare (unprefixed) names.
    fn uniforms(&self) -> &UniformMap;

    /// Macro definitions, keyed by their bare names.
    fn defines(&self) -> &DefineMap;

    /// Required shader extensions.
    fn extensions(&self) -> &ExtensionSet;

    /// How this effect's output blends into the frame.
    fn blend_mode(&self) -> &BlendMode;

    /// Advance per-frame state. Runs every frame, even for effects excluded
    /// from the compiled shader.
    fn update(&mut self, _renderer: &mut dyn Renderer, _delta_seconds: f32) {}

    /// React to a resolution change.
    fn set_size(&mut self, _width: u32, _height: u32) {}

    /// One-time setup with the renderer.
    fn initialize(&mut self, _renderer: &mut dyn Renderer, _alpha: bool) {}

    /// Receive the pass's depth texture.
    fn set_depth_texture(&mut self, _texture: TextureHandle, _packing: DepthPacking) {}

    /// Release owned resources. Explicit; the pass never scans for
    /// disposable members.
    fn dispose(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_ordering() {
        // CONVOLUTION outranks DEPTH outranks NONE when sorted descending.
        let convolution = EffectAttributes::CONVOLUTION;
        let depth = EffectAttributes::DEPTH;
        let none = EffectAttributes::empty();

        assert!(convolution.bits() > depth.bits());
        assert!(depth.bits() > none.bits());
    }

    #[test]
    fn test_blend_mode_opacity_is_shared() {
        let blend_mode = BlendMode::new(BlendFunction::Multiply);
        let opacity = blend_mode.opacity().clone();

        blend_mode.set_opacity(0.25);
        assert_eq!(opacity.as_float(), 0.25);
    }

    #[test]
    fn test_extension_identifiers() {
        assert_eq!(
            Extension::Derivatives.identifier(),
            "OES_standard_derivatives"
        );
        assert_eq!(Extension::FragDepth.identifier(), "EXT_frag_depth");
    }
}
