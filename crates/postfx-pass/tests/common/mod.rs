//! Common test utilities
//!
//! Provides a configurable effect for exercising the composition pass
//! without writing a full effect implementation per test.

use std::sync::{Arc, Mutex};

use postfx_pass::{
    BlendFunction, BlendMode, DefineMap, Effect, EffectAttributes, ExtensionSet, Renderer,
    Uniform, UniformMap,
};

/// A minimal mainImage shader that touches nothing special.
pub const PASSTHROUGH_FRAGMENT: &str = "
void mainImage(const in vec4 inputColor, const in vec2 uv, out vec4 outputColor) {

	outputColor = inputColor;

}
";

/// A mainImage shader that reads the merged-scope depth value.
pub const DEPTH_FRAGMENT: &str = "
void mainImage(const in vec4 inputColor, const in vec2 uv, out vec4 outputColor) {

	outputColor = vec4(vec3(depth), inputColor.a);

}
";

/// A mainUv shader that shifts coordinates.
pub const UV_FRAGMENT: &str = "
void mainUv(inout vec2 uv) {

	uv.x += 0.1;

}
";

/// Configurable effect whose update calls are counted.
pub struct TestEffect {
    name: String,
    attributes: EffectAttributes,
    fragment_shader: String,
    vertex_shader: Option<String>,
    uniforms: UniformMap,
    defines: DefineMap,
    extensions: ExtensionSet,
    blend_mode: BlendMode,
    update_count: Arc<Mutex<u32>>,
}

impl TestEffect {
    pub fn new(name: &str, fragment_shader: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: EffectAttributes::empty(),
            fragment_shader: fragment_shader.to_string(),
            vertex_shader: None,
            uniforms: UniformMap::new(),
            defines: DefineMap::new(),
            extensions: ExtensionSet::new(),
            blend_mode: BlendMode::new(BlendFunction::Normal),
            update_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_attributes(mut self, attributes: EffectAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_blend_function(mut self, function: BlendFunction) -> Self {
        self.blend_mode = BlendMode::new(function);
        self
    }

    pub fn with_uniform(mut self, name: &str, uniform: Uniform) -> Self {
        self.uniforms.insert(name, uniform);
        self
    }

    pub fn with_vertex_shader(mut self, source: &str) -> Self {
        self.vertex_shader = Some(source.to_string());
        self
    }

    pub fn with_extension(mut self, extension: postfx_pass::Extension) -> Self {
        self.extensions.insert(extension);
        self
    }

    /// Shared counter of update() invocations, usable after the effect has
    /// been boxed into a pass.
    pub fn update_counter(&self) -> Arc<Mutex<u32>> {
        Arc::clone(&self.update_count)
    }
}

impl Effect for TestEffect {
    fn name(&self) -> &str {
        &self.name
    }

    fn attributes(&self) -> EffectAttributes {
        self.attributes
    }

    fn fragment_shader(&self) -> &str {
        &self.fragment_shader
    }

    fn vertex_shader(&self) -> Option<&str> {
        self.vertex_shader.as_deref()
    }

    fn uniforms(&self) -> &UniformMap {
        &self.uniforms
    }

    fn defines(&self) -> &DefineMap {
        &self.defines
    }

    fn extensions(&self) -> &ExtensionSet {
        &self.extensions
    }

    fn blend_mode(&self) -> &BlendMode {
        &self.blend_mode
    }

    fn update(&mut self, _renderer: &mut dyn Renderer, _delta_seconds: f32) {
        *self.update_count.lock().unwrap() += 1;
    }
}

/// Count non-overlapping occurrences of a needle in shader text.
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}
