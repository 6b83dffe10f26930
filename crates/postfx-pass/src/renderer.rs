//! Renderer trait abstractions
//!
//! The composition engine never talks to a GPU directly. It produces shader
//! text and a uniform layout, and hands them to a `Renderer` implementation
//! for compilation and drawing. This seam keeps the engine testable without
//! a GPU context; see [`MockRenderer`](crate::mock::MockRenderer).

use thiserror::Error;

use crate::material::EffectMaterial;

/// Opaque handle to a texture owned by the external renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Opaque handle to a framebuffer owned by the external renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameBuffer(pub u32);

/// Opaque handle to a compiled shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// How depth values are encoded in the depth texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthPacking {
    /// Plain depth in the red channel.
    #[default]
    Basic,
    /// Depth packed across all four RGBA channels.
    Rgba,
}

impl DepthPacking {
    /// The value bound to the `DEPTH_PACKING` macro in the merged shader.
    pub fn glsl_value(self) -> u32 {
        match self {
            DepthPacking::Basic => 3200,
            DepthPacking::Rgba => 3201,
        }
    }
}

/// Shader compilation failure reported by the external renderer.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("shader compilation failed: {0}")]
    Compilation(String),

    #[error("renderer context lost")]
    ContextLost,
}

/// GPU binding used by the composition pass.
///
/// Implementations compile merged materials into programs, draw full-screen
/// passes with them, and report the platform's shader resource limits.
pub trait Renderer {
    /// Compile a merged material into a program.
    fn compile(&mut self, material: &EffectMaterial) -> Result<ProgramId, RendererError>;

    /// Delete a previously compiled program.
    fn delete_program(&mut self, program: ProgramId);

    /// Draw one full-screen pass with the given program.
    fn draw(
        &mut self,
        program: ProgramId,
        input: Option<FrameBuffer>,
        output: Option<FrameBuffer>,
    );

    /// Maximum number of fragment shader uniforms the platform supports.
    fn max_fragment_uniforms(&self) -> u32;

    /// Maximum number of varyings the platform supports.
    fn max_varyings(&self) -> u32;
}
