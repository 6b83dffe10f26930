//! Merged effect material
//!
//! The material is the "compiled program" descriptor the composition pass
//! produces: final fragment/vertex source text, the merged uniform table,
//! macro definitions, and required extensions. The external renderer turns
//! it into an actual GPU program; this type only owns the text and state.
//!
//! The outer templates live in external files and are included at compile
//! time; the pass substitutes the five shader-part buffers into them.

use crate::effect::ExtensionSet;
use crate::renderer::{DepthPacking, ProgramId, TextureHandle};
use crate::uniform::{DefineMap, Uniform, UniformMap, UniformValue};

/// Fragment template with `FRAGMENT_HEAD`, `FRAGMENT_MAIN_UV` and
/// `FRAGMENT_MAIN_IMAGE` placeholders.
pub const FRAGMENT_TEMPLATE: &str = include_str!("shaders/effect.frag");

/// Vertex template with `VERTEX_HEAD` and `VERTEX_MAIN_SUPPORT` placeholders.
pub const VERTEX_TEMPLATE: &str = include_str!("shaders/effect.vert");

/// The merged shader program descriptor.
#[derive(Debug)]
pub struct EffectMaterial {
    fragment_source: String,
    vertex_source: String,
    uniforms: UniformMap,
    defines: DefineMap,
    extensions: ExtensionSet,
    resolution: (u32, u32),
    depth_texture: Option<TextureHandle>,
    depth_packing: DepthPacking,
    program: Option<ProgramId>,
}

impl EffectMaterial {
    /// Build a material from finalized shader text and merged maps.
    ///
    /// The standard uniforms (`inputBuffer`, `depthBuffer`, `resolution`,
    /// `texelSize`, `cameraNear`, `cameraFar`, `aspect`, `time`) are added
    /// ahead of the per-effect entries.
    pub fn new(
        fragment_source: String,
        vertex_source: String,
        merged_uniforms: UniformMap,
        mut defines: DefineMap,
        extensions: ExtensionSet,
    ) -> Self {
        let mut uniforms = UniformMap::new();
        uniforms.insert("inputBuffer", Uniform::texture(None));
        uniforms.insert("depthBuffer", Uniform::texture(None));
        uniforms.insert("resolution", Uniform::vec2(0.0, 0.0));
        uniforms.insert("texelSize", Uniform::vec2(0.0, 0.0));
        uniforms.insert("cameraNear", Uniform::float(0.3));
        uniforms.insert("cameraFar", Uniform::float(1000.0));
        uniforms.insert("aspect", Uniform::float(1.0));
        uniforms.insert("time", Uniform::float(0.0));
        for (name, uniform) in merged_uniforms.iter() {
            uniforms.insert(name, uniform.clone());
        }

        let depth_packing = DepthPacking::default();
        defines.insert("DEPTH_PACKING", depth_packing.glsl_value().to_string());

        Self {
            fragment_source,
            vertex_source,
            uniforms,
            defines,
            extensions,
            resolution: (0, 0),
            depth_texture: None,
            depth_packing,
            program: None,
        }
    }

    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }

    pub fn vertex_source(&self) -> &str {
        &self.vertex_source
    }

    pub fn uniforms(&self) -> &UniformMap {
        &self.uniforms
    }

    /// Macro definitions, including the `UV` binding and `DEPTH_PACKING`.
    /// The renderer prepends these as `#define` lines when compiling.
    pub fn defines(&self) -> &DefineMap {
        &self.defines
    }

    pub fn extensions(&self) -> &ExtensionSet {
        &self.extensions
    }

    /// The compiled program handle, once the renderer has compiled this
    /// material.
    pub fn program(&self) -> Option<ProgramId> {
        self.program
    }

    pub(crate) fn set_program(&mut self, program: ProgramId) {
        self.program = Some(program);
    }

    pub(crate) fn take_program(&mut self) -> Option<ProgramId> {
        self.program.take()
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    /// Update the resolution-dependent uniforms. Cheap; no recompilation.
    pub fn set_size(&mut self, width: u32, height: u32) {
        let width = width.max(1);
        let height = height.max(1);
        self.resolution = (width, height);

        if let Some(resolution) = self.uniforms.get("resolution") {
            resolution.set(UniformValue::Vec2([
                width as f32,
                height as f32,
            ]));
        }
        if let Some(texel_size) = self.uniforms.get("texelSize") {
            texel_size.set(UniformValue::Vec2([
                1.0 / width as f32,
                1.0 / height as f32,
            ]));
        }
        if let Some(aspect) = self.uniforms.get("aspect") {
            aspect.set_float(width as f32 / height as f32);
        }
    }

    pub fn depth_texture(&self) -> Option<TextureHandle> {
        self.depth_texture
    }

    pub fn depth_packing(&self) -> DepthPacking {
        self.depth_packing
    }

    /// Bind the depth texture and its packing mode.
    ///
    /// Changing the packing rewrites the `DEPTH_PACKING` macro, which only
    /// takes effect at the next recompilation.
    pub fn set_depth_texture(&mut self, texture: TextureHandle, packing: DepthPacking) {
        self.depth_texture = Some(texture);
        self.depth_packing = packing;

        if let Some(depth_buffer) = self.uniforms.get("depthBuffer") {
            depth_buffer.set(UniformValue::Texture(Some(texture)));
        }
        self.defines
            .insert("DEPTH_PACKING", packing.glsl_value().to_string());
    }

    /// Advance the shared time uniform.
    pub fn advance_time(&mut self, delta_seconds: f32) {
        if let Some(time) = self.uniforms.get("time") {
            time.set_float(time.as_float() + delta_seconds);
        }
    }

    /// Drop the program handle; the pass hands it back to the renderer.
    pub fn dispose(&mut self) {
        self.program = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_material() -> EffectMaterial {
        EffectMaterial::new(
            String::new(),
            String::new(),
            UniformMap::new(),
            DefineMap::new(),
            ExtensionSet::new(),
        )
    }

    #[test]
    fn test_standard_uniforms_present() {
        let material = empty_material();
        for name in [
            "inputBuffer",
            "depthBuffer",
            "resolution",
            "texelSize",
            "cameraNear",
            "cameraFar",
            "aspect",
            "time",
        ] {
            assert!(material.uniforms().contains(name), "missing {name}");
        }
    }

    #[test]
    fn test_set_size_updates_uniforms() {
        let mut material = empty_material();
        material.set_size(1920, 1080);

        assert_eq!(material.resolution(), (1920, 1080));
        let aspect = material.uniforms().get("aspect").expect("aspect");
        assert!((aspect.as_float() - 1920.0 / 1080.0).abs() < 1e-6);
    }

    #[test]
    fn test_depth_packing_define() {
        let mut material = empty_material();
        assert_eq!(material.defines().get("DEPTH_PACKING"), Some("3200"));

        material.set_depth_texture(TextureHandle(7), DepthPacking::Rgba);
        assert_eq!(material.defines().get("DEPTH_PACKING"), Some("3201"));
        assert_eq!(material.depth_texture(), Some(TextureHandle(7)));
    }

    #[test]
    fn test_templates_have_placeholders() {
        assert!(FRAGMENT_TEMPLATE.contains("FRAGMENT_HEAD"));
        assert!(FRAGMENT_TEMPLATE.contains("FRAGMENT_MAIN_UV"));
        assert!(FRAGMENT_TEMPLATE.contains("FRAGMENT_MAIN_IMAGE"));
        assert!(VERTEX_TEMPLATE.contains("VERTEX_HEAD"));
        assert!(VERTEX_TEMPLATE.contains("VERTEX_MAIN_SUPPORT"));
    }
}
