//! Per-effect integration
//!
//! Integration takes one effect and splices its contributions into the
//! shared shader sections: validate the shader conventions, rename every
//! effect-local symbol under the effect's ordinal prefix, copy uniforms and
//! defines into the merged maps, and emit the entry-point and blend calls.
//!
//! Entry points are detected by plain substring search (`mainImage`,
//! `mainUv`, `mainSupport`), never by parsing. Validation failures exclude
//! the effect from the compiled shader; they are not fatal to the pass.

use std::collections::BTreeMap;

use postfx_glsl::{BlendFunction, capitalize, find_function_names, find_varying_names,
    prefix_substrings};
use thiserror::Error;

use crate::effect::{BlendMode, Effect, EffectAttributes};
use crate::parts::{Section, ShaderParts};
use crate::uniform::{DefineMap, UniformMap};

/// Why an effect was excluded from the merged shader.
#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("effect '{0}' has no fragment shader")]
    MissingFragmentShader(String),

    #[error("effect '{0}' defines neither mainImage nor mainUv")]
    MissingEntryPoint(String),

    #[error("effect '{0}' transforms UVs, which is incompatible with convolution effects")]
    UvTransformWithConvolution(String),
}

/// First-seen blend modes, keyed by blend function.
///
/// Two effects sharing a blend function reuse one emitted `blend<TOKEN>`
/// snippet; each keeps its own opacity uniform.
#[derive(Debug, Default)]
pub struct BlendRegistry {
    entries: BTreeMap<BlendFunction, BlendMode>,
}

impl BlendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a blend mode; the first one seen per function wins.
    pub fn register(&mut self, blend_mode: &BlendMode) {
        self.entries
            .entry(blend_mode.function())
            .or_insert_with(|| blend_mode.clone());
    }

    /// Distinct blend functions recorded so far.
    pub fn functions(&self) -> impl Iterator<Item = BlendFunction> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build-time state threaded through the integration of every effect.
///
/// Owned by one `create_material()` call and discarded once the final shader
/// text is produced.
#[derive(Debug, Default)]
pub struct BuildContext {
    pub shader_parts: ShaderParts,
    pub blend_registry: BlendRegistry,
    pub uniforms: UniformMap,
    pub defines: DefineMap,
    /// Attributes accumulated over previously accepted effects.
    pub attributes: EffectAttributes,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// What one accepted effect contributed.
#[derive(Debug, Default)]
pub struct Integration {
    /// Varying names declared by the effect's vertex shader.
    pub varyings: Vec<String>,
    /// The effect transforms UV coordinates via `mainUv`.
    pub transformed_uv: bool,
    /// The effect reads the `depth` value in `mainImage`.
    pub read_depth: bool,
}

/// Validate one effect and splice its contributions into the build context.
///
/// `prefix` is the ordinal token (`e0`, `e1`, ...) assigned by registration
/// order among accepted effects. The caller accumulates attributes and
/// registers extensions only when this returns `Ok`.
pub fn integrate(
    prefix: &str,
    effect: &dyn Effect,
    ctx: &mut BuildContext,
) -> Result<Integration, IntegrationError> {
    let fragment_shader = effect.fragment_shader();
    if fragment_shader.is_empty() {
        return Err(IntegrationError::MissingFragmentShader(
            effect.name().to_string(),
        ));
    }

    let defines_main_uv = fragment_shader.contains("mainUv");
    let defines_main_image = fragment_shader.contains("mainImage");
    let cumulative = ctx.attributes | effect.attributes();

    if defines_main_uv && cumulative.contains(EffectAttributes::CONVOLUTION) {
        return Err(IntegrationError::UvTransformWithConvolution(
            effect.name().to_string(),
        ));
    }
    if !defines_main_image && !defines_main_uv {
        return Err(IntegrationError::MissingEntryPoint(
            effect.name().to_string(),
        ));
    }

    // Depth is gated on the cumulative DEPTH attribute and a textual `depth`
    // reference; the free variable is never part of the rename set.
    let read_depth = cumulative.contains(EffectAttributes::DEPTH)
        && defines_main_image
        && fragment_shader.contains("depth");

    let mut fragment_shader = fragment_shader.to_string();
    let mut vertex_shader = effect.vertex_shader().map(str::to_string);
    let defines_main_support = vertex_shader
        .as_deref()
        .is_some_and(|source| source.contains("mainSupport"));

    // Collect the effect-local symbols to rename, in discovery order:
    // varyings, function names, uniform keys, define keys.
    let mut varyings = Vec::new();
    let mut names: Vec<String> = Vec::new();

    if defines_main_support {
        if let Some(source) = vertex_shader.as_deref() {
            varyings = find_varying_names(source);
            names.extend(varyings.iter().cloned());
        }
    }
    names.extend(find_function_names(&fragment_shader));
    if let Some(source) = vertex_shader.as_deref() {
        names.extend(find_function_names(source));
    }
    names.extend(effect.uniforms().keys().map(str::to_string));
    names.extend(effect.defines().keys().map(str::to_string));
    names.dedup();

    // The effect's own maps are cloned, never mutated; renaming happens on
    // the working copies.
    let mut defines = effect.defines().clone();

    {
        let mut targets: Vec<&mut String> = defines.values_mut().collect();
        targets.push(&mut fragment_shader);
        if let Some(source) = vertex_shader.as_mut() {
            targets.push(source);
        }
        prefix_substrings(prefix, names.iter().map(String::as_str), targets);
    }

    for (key, uniform) in effect.uniforms().iter() {
        ctx.uniforms
            .insert(prefixed(prefix, key), uniform.clone());
    }
    for (key, value) in defines.iter() {
        ctx.defines.insert(prefixed(prefix, key), value);
    }

    if defines_main_uv {
        ctx.shader_parts
            .append(Section::FragmentMainUv, &format!("\t{prefix}MainUv(UV);\n"));
    }

    if defines_main_support {
        ctx.shader_parts.append(
            Section::VertexMainSupport,
            &format!("\t{prefix}MainSupport();\n"),
        );
    }

    if defines_main_image {
        let depth_argument = if read_depth { "depth, " } else { "" };
        ctx.shader_parts.append(
            Section::FragmentMainImage,
            &format!("\t{prefix}MainImage(color0, UV, {depth_argument}color1);\n"),
        );

        // Blend the result back into color0 under this effect's own opacity.
        let blend_mode = effect.blend_mode();
        let opacity_name = format!("{prefix}BlendOpacity");
        ctx.shader_parts.append(
            Section::FragmentMainImage,
            &format!(
                "\tcolor0 = {}(color0, color1, {opacity_name});\n\n",
                blend_mode.function().shader_function_name()
            ),
        );
        ctx.shader_parts.append(
            Section::FragmentHead,
            &format!("uniform float {opacity_name};\n\n"),
        );
        ctx.uniforms
            .insert(opacity_name, blend_mode.opacity().clone());
        ctx.blend_registry.register(blend_mode);
    }

    ctx.shader_parts
        .append(Section::FragmentHead, &format!("{fragment_shader}\n"));
    if let Some(source) = vertex_shader {
        ctx.shader_parts
            .append(Section::VertexHead, &format!("{source}\n"));
    }

    Ok(Integration {
        varyings,
        transformed_uv: defines_main_uv,
        read_depth,
    })
}

fn prefixed(prefix: &str, name: &str) -> String {
    format!("{prefix}{}", capitalize(name))
}

#[cfg(test)]
mod tests {
    use postfx_glsl::BlendFunction;

    use super::*;
    use crate::effect::ExtensionSet;
    use crate::uniform::Uniform;

    struct TestEffect {
        name: String,
        attributes: EffectAttributes,
        fragment_shader: String,
        vertex_shader: Option<String>,
        uniforms: UniformMap,
        defines: DefineMap,
        extensions: ExtensionSet,
        blend_mode: BlendMode,
    }

    impl TestEffect {
        fn new(fragment_shader: &str) -> Self {
            Self {
                name: "test".to_string(),
                attributes: EffectAttributes::empty(),
                fragment_shader: fragment_shader.to_string(),
                vertex_shader: None,
                uniforms: UniformMap::new(),
                defines: DefineMap::new(),
                extensions: ExtensionSet::new(),
                blend_mode: BlendMode::new(BlendFunction::Normal),
            }
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
    }

    const MAIN_IMAGE: &str = "
void mainImage(const in vec4 inputColor, const in vec2 uv, out vec4 outputColor) {

	outputColor = inputColor;

}
";

    #[test]
    fn test_missing_fragment_shader() {
        let effect = TestEffect::new("");
        let mut ctx = BuildContext::new();

        let result = integrate("e0", &effect, &mut ctx);
        assert!(matches!(
            result,
            Err(IntegrationError::MissingFragmentShader(_))
        ));
    }

    #[test]
    fn test_missing_entry_point() {
        let effect = TestEffect::new("float nothing() { return 0.0; }");
        let mut ctx = BuildContext::new();

        let result = integrate("e0", &effect, &mut ctx);
        assert!(matches!(result, Err(IntegrationError::MissingEntryPoint(_))));
    }

    #[test]
    fn test_uv_transform_with_convolution_rejected() {
        let mut effect = TestEffect::new("void mainUv(inout vec2 uv) { uv.x += 0.1; }");
        effect.attributes = EffectAttributes::CONVOLUTION;
        let mut ctx = BuildContext::new();

        let result = integrate("e0", &effect, &mut ctx);
        assert!(matches!(
            result,
            Err(IntegrationError::UvTransformWithConvolution(_))
        ));
    }

    #[test]
    fn test_uv_transform_after_convolution_rejected() {
        let effect = TestEffect::new("void mainUv(inout vec2 uv) { uv.x += 0.1; }");
        let mut ctx = BuildContext::new();
        ctx.attributes = EffectAttributes::CONVOLUTION;

        let result = integrate("e0", &effect, &mut ctx);
        assert!(matches!(
            result,
            Err(IntegrationError::UvTransformWithConvolution(_))
        ));
    }

    #[test]
    fn test_uniform_keys_are_prefixed() {
        let mut effect = TestEffect::new(
            "
uniform float amplitude;

void mainImage(const in vec4 inputColor, const in vec2 uv, out vec4 outputColor) {

	outputColor = inputColor * amplitude + foo.amplitude;

}
",
        );
        effect.uniforms.insert("amplitude", Uniform::float(1.0));
        let mut ctx = BuildContext::new();

        integrate("e2", &effect, &mut ctx).expect("integration");

        assert!(ctx.uniforms.contains("e2Amplitude"));
        let head = ctx.shader_parts.get(Section::FragmentHead);
        assert!(head.contains("uniform float e2Amplitude;"));
        assert!(head.contains("inputColor * e2Amplitude"));
        // Member access stays untouched.
        assert!(head.contains("foo.amplitude"));
    }

    #[test]
    fn test_main_image_call_and_blend_emitted() {
        let effect = TestEffect::new(MAIN_IMAGE);
        let mut ctx = BuildContext::new();

        integrate("e0", &effect, &mut ctx).expect("integration");

        let main_image = ctx.shader_parts.get(Section::FragmentMainImage);
        assert!(main_image.contains("e0MainImage(color0, UV, color1);"));
        assert!(main_image.contains("color0 = blendNORMAL(color0, color1, e0BlendOpacity);"));
        assert!(ctx.uniforms.contains("e0BlendOpacity"));
        assert_eq!(ctx.blend_registry.len(), 1);
    }

    #[test]
    fn test_depth_argument_requires_attribute_and_token() {
        let fragment = "
void mainImage(const in vec4 inputColor, const in vec2 uv, out vec4 outputColor) {

	outputColor = vec4(vec3(depth), inputColor.a);

}
";
        // Token present but DEPTH attribute absent: no depth argument.
        let effect = TestEffect::new(fragment);
        let mut ctx = BuildContext::new();
        let result = integrate("e0", &effect, &mut ctx).expect("integration");
        assert!(!result.read_depth);

        // Attribute and token present: depth argument emitted.
        let mut effect = TestEffect::new(fragment);
        effect.attributes = EffectAttributes::DEPTH;
        let mut ctx = BuildContext::new();
        let result = integrate("e0", &effect, &mut ctx).expect("integration");
        assert!(result.read_depth);
        assert!(
            ctx.shader_parts
                .get(Section::FragmentMainImage)
                .contains("e0MainImage(color0, UV, depth, color1);")
        );
    }

    #[test]
    fn test_main_support_and_varyings() {
        let mut effect = TestEffect::new(
            "
varying vec2 vOffset;

void mainImage(const in vec4 inputColor, const in vec2 uv, out vec4 outputColor) {

	outputColor = inputColor + vec4(vOffset, 0.0, 0.0);

}
",
        );
        effect.vertex_shader = Some(
            "
varying vec2 vOffset;

void mainSupport() {

	vOffset = position.xy * 0.01;

}
"
            .to_string(),
        );
        let mut ctx = BuildContext::new();

        let result = integrate("e1", &effect, &mut ctx).expect("integration");

        assert_eq!(result.varyings, vec!["vOffset"]);
        assert!(
            ctx.shader_parts
                .get(Section::VertexMainSupport)
                .contains("e1MainSupport();")
        );
        assert!(
            ctx.shader_parts
                .get(Section::VertexHead)
                .contains("varying vec2 e1VOffset;")
        );
        // The fragment-side declaration is renamed consistently.
        assert!(
            ctx.shader_parts
                .get(Section::FragmentHead)
                .contains("varying vec2 e1VOffset;")
        );
    }

    #[test]
    fn test_define_values_renamed_and_keys_prefixed() {
        let mut effect = TestEffect::new(
            "
uniform float strength;

void mainImage(const in vec4 inputColor, const in vec2 uv, out vec4 outputColor) {

	outputColor = inputColor * STRENGTH_SQUARED;

}
",
        );
        effect.uniforms.insert("strength", Uniform::float(2.0));
        effect
            .defines
            .insert("STRENGTH_SQUARED", "(strength * strength)");
        let mut ctx = BuildContext::new();

        integrate("e0", &effect, &mut ctx).expect("integration");

        assert_eq!(
            ctx.defines.get("e0STRENGTH_SQUARED"),
            Some("(e0Strength * e0Strength)")
        );
    }

    #[test]
    fn test_shared_blend_function_registered_once() {
        let first = TestEffect::new(MAIN_IMAGE);
        let second = TestEffect::new(MAIN_IMAGE);
        let mut ctx = BuildContext::new();

        integrate("e0", &first, &mut ctx).expect("integration");
        integrate("e1", &second, &mut ctx).expect("integration");

        assert_eq!(ctx.blend_registry.len(), 1);
        // Each effect still has its own opacity uniform.
        assert!(ctx.uniforms.contains("e0BlendOpacity"));
        assert!(ctx.uniforms.contains("e1BlendOpacity"));
    }
}
