//! Effect composition pass
//!
//! The pass owns an ordered set of effects and compiles them into a single
//! merged program: effects are sorted by attributes, integrated one by one,
//! and the resulting shader-part buffers are substituted into the outer
//! templates. Rebuilding the program (`recompile`) is expensive and only
//! warranted when an effect's attributes, blend function, or extension set
//! changes; uniform values flow through without it.

use thiserror::Error;

use crate::effect::{Effect, EffectAttributes, ExtensionSet};
use crate::integration::{BuildContext, integrate};
use crate::material::{EffectMaterial, FRAGMENT_TEMPLATE, VERTEX_TEMPLATE};
use crate::parts::Section;
use crate::renderer::{DepthPacking, FrameBuffer, Renderer, RendererError, TextureHandle};
use postfx_glsl::BlendFunction;

/// Fatal build-time failure. Configuration problems in individual effects
/// never surface here; they exclude the effect and are logged instead.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("failed to compile merged material: {0}")]
    Compilation(#[from] RendererError),
}

/// Compiles an ordered set of effects into one full-screen program and
/// drives their per-frame lifecycle.
pub struct EffectPass {
    effects: Vec<Box<dyn Effect>>,
    material: Option<EffectMaterial>,
    attributes: EffectAttributes,
    skip_rendering: bool,
    needs_swap: bool,
    needs_depth_texture: bool,
    uniform_count: usize,
    varying_count: usize,
}

impl EffectPass {
    /// Create a pass over the given effects. No shader text is produced
    /// until [`initialize`](Self::initialize) or
    /// [`create_material`](Self::create_material) runs.
    pub fn new(effects: Vec<Box<dyn Effect>>) -> Self {
        Self {
            effects,
            material: None,
            attributes: EffectAttributes::empty(),
            skip_rendering: false,
            needs_swap: true,
            needs_depth_texture: false,
            uniform_count: 0,
            varying_count: 0,
        }
    }

    /// Whether the composer must swap front/back buffers after this pass.
    pub fn needs_swap(&self) -> bool {
        self.needs_swap
    }

    /// Whether a depth texture must be allocated and supplied via
    /// [`set_depth_texture`](Self::set_depth_texture).
    pub fn needs_depth_texture(&self) -> bool {
        self.needs_depth_texture
    }

    /// Whether drawing is a no-op (no effect survived integration).
    pub fn skip_rendering(&self) -> bool {
        self.skip_rendering
    }

    /// Attributes accumulated over all integrated effects.
    pub fn attributes(&self) -> EffectAttributes {
        self.attributes
    }

    /// The currently compiled material, if any.
    pub fn material(&self) -> Option<&EffectMaterial> {
        self.material.as_ref()
    }

    /// Number of uniforms in the merged program.
    pub fn uniform_count(&self) -> usize {
        self.uniform_count
    }

    /// Number of varyings in the merged program.
    pub fn varying_count(&self) -> usize {
        self.varying_count
    }

    /// One-time setup: forwards to every effect, then builds the initial
    /// program.
    pub fn initialize(
        &mut self,
        renderer: &mut dyn Renderer,
        alpha: bool,
    ) -> Result<(), ComposeError> {
        for effect in &mut self.effects {
            effect.initialize(renderer, alpha);
        }
        self.create_material(renderer)
    }

    /// Build the merged program from the current effect configuration.
    ///
    /// On compilation failure the previous material is retained.
    pub fn create_material(&mut self, renderer: &mut dyn Renderer) -> Result<(), ComposeError> {
        // Higher-valued attributes first; ties keep registration order.
        self.effects
            .sort_by(|a, b| b.attributes().bits().cmp(&a.attributes().bits()));

        let mut ctx = BuildContext::new();
        let mut extensions = ExtensionSet::new();
        let mut transformed_uv = false;
        let mut read_depth = false;
        let mut varying_count = 0;
        let mut integrated = 0;

        for effect in &self.effects {
            if effect.blend_mode().function() == BlendFunction::Skip {
                // Never integrated, but keeps receiving update() calls.
                continue;
            }

            if effect.attributes().contains(EffectAttributes::CONVOLUTION)
                && ctx.attributes.contains(EffectAttributes::CONVOLUTION)
            {
                log::error!(
                    "Could not merge effect '{}': only one convolution effect is supported per pass",
                    effect.name()
                );
                continue;
            }

            let prefix = format!("e{integrated}");
            match integrate(&prefix, effect.as_ref(), &mut ctx) {
                Ok(result) => {
                    integrated += 1;
                    ctx.attributes |= effect.attributes();
                    extensions.extend(effect.extensions().iter().copied());
                    varying_count += result.varyings.len();
                    transformed_uv |= result.transformed_uv;
                    read_depth |= result.read_depth;
                }
                Err(error) => {
                    log::error!("Could not merge effect '{}': {error}", effect.name());
                }
            }
        }

        // Blend functions used by any integrated effect, each emitted once.
        let blend_functions: Vec<BlendFunction> = ctx.blend_registry.functions().collect();
        for function in blend_functions {
            if let Some(code) = function.renamed_shader_code() {
                ctx.shader_parts
                    .prepend(Section::FragmentHead, &format!("{code}\n"));
            }
        }

        if read_depth {
            ctx.shader_parts
                .prepend(Section::FragmentMainImage, "float depth = readDepth(UV);\n\n\t");
        }

        // The UV macro decides whether coordinate transforms chain: with any
        // mainUv present, all calls go through the shared transformedUv.
        if transformed_uv {
            ctx.shader_parts
                .prepend(Section::FragmentMainUv, "vec2 transformedUv = vUv;\n");
            ctx.defines.insert("UV", "transformedUv");
        } else {
            ctx.defines.insert("UV", "vUv");
        }

        let fragment_source = ctx.shader_parts.substitute(FRAGMENT_TEMPLATE);
        let vertex_source = ctx.shader_parts.substitute(VERTEX_TEMPLATE);

        let mut material = EffectMaterial::new(
            fragment_source,
            vertex_source,
            ctx.uniforms,
            ctx.defines,
            extensions,
        );

        self.uniform_count = material.uniforms().len();
        self.varying_count = varying_count;
        if self.uniform_count > renderer.max_fragment_uniforms() as usize {
            log::warn!(
                "The merged program uses {} uniforms; the platform supports {}",
                self.uniform_count,
                renderer.max_fragment_uniforms()
            );
        }
        if self.varying_count > renderer.max_varyings() as usize {
            log::warn!(
                "The merged program uses {} varyings; the platform supports {}",
                self.varying_count,
                renderer.max_varyings()
            );
        }

        let program = renderer.compile(&material)?;
        material.set_program(program);

        if let Some(mut previous) = self.material.take() {
            if let Some(old_program) = previous.take_program() {
                renderer.delete_program(old_program);
            }
            previous.dispose();
        }

        self.attributes = ctx.attributes;
        self.needs_depth_texture = read_depth;
        self.skip_rendering = integrated == 0;
        self.needs_swap = integrated > 0;
        self.material = Some(material);

        Ok(())
    }

    /// Rebuild the program after an effect's attributes, blend function, or
    /// extension set changed. Resolution and depth binding carry over.
    pub fn recompile(&mut self, renderer: &mut dyn Renderer) -> Result<(), ComposeError> {
        let previous_state = self
            .material
            .as_ref()
            .map(|m| (m.resolution(), m.depth_texture(), m.depth_packing()));

        self.create_material(renderer)?;

        if let (Some((resolution, depth_texture, depth_packing)), Some(material)) =
            (previous_state, self.material.as_mut())
        {
            if resolution != (0, 0) {
                material.set_size(resolution.0, resolution.1);
            }
            if let Some(texture) = depth_texture {
                material.set_depth_texture(texture, depth_packing);
            }
        }

        Ok(())
    }

    /// Per-frame entry point: updates every owned effect, then draws the
    /// merged program. Drawing is skipped when no effect was integrated;
    /// updates are not.
    pub fn render(
        &mut self,
        renderer: &mut dyn Renderer,
        input: Option<FrameBuffer>,
        output: Option<FrameBuffer>,
        delta_seconds: f32,
    ) {
        for effect in &mut self.effects {
            effect.update(renderer, delta_seconds);
        }

        if self.skip_rendering {
            return;
        }

        if let Some(material) = self.material.as_mut() {
            material.advance_time(delta_seconds);
            if let Some(program) = material.program() {
                renderer.draw(program, input, output);
            }
        }
    }

    /// Forward a resolution change to the material and every effect.
    pub fn set_size(&mut self, width: u32, height: u32) {
        if let Some(material) = self.material.as_mut() {
            material.set_size(width, height);
        }
        for effect in &mut self.effects {
            effect.set_size(width, height);
        }
    }

    /// Supply the depth texture requested via
    /// [`needs_depth_texture`](Self::needs_depth_texture).
    pub fn set_depth_texture(&mut self, texture: TextureHandle, packing: DepthPacking) {
        if let Some(material) = self.material.as_mut() {
            material.set_depth_texture(texture, packing);
        }
        for effect in &mut self.effects {
            effect.set_depth_texture(texture, packing);
        }
    }

    /// Tear down the program and every owned effect.
    pub fn dispose(&mut self, renderer: &mut dyn Renderer) {
        if let Some(mut material) = self.material.take() {
            if let Some(program) = material.take_program() {
                renderer.delete_program(program);
            }
            material.dispose();
        }
        for effect in &mut self.effects {
            effect.dispose();
        }
    }
}
