//! Mock renderer for testing
//!
//! Records every compile/draw call so tests can assert on the composition
//! pass's behavior without a GPU context.

use crate::material::EffectMaterial;
use crate::renderer::{FrameBuffer, ProgramId, Renderer, RendererError};

/// Record of a renderer call for test inspection.
#[derive(Debug, Clone)]
pub enum RendererCall {
    /// A material was compiled; the fragment source is kept for inspection.
    Compile {
        program: ProgramId,
        fragment_source: String,
        vertex_source: String,
    },
    /// A program was deleted.
    Delete(ProgramId),
    /// A full-screen pass was drawn.
    Draw {
        program: ProgramId,
        input: Option<FrameBuffer>,
        output: Option<FrameBuffer>,
    },
}

/// A renderer that records all calls instead of touching a GPU.
#[derive(Debug)]
pub struct MockRenderer {
    /// All renderer calls made so far.
    pub calls: Vec<RendererCall>,
    /// Reported fragment uniform limit.
    pub max_fragment_uniforms: u32,
    /// Reported varying limit.
    pub max_varyings: u32,
    /// When set, the next compile call fails with this message.
    pub fail_next_compile: Option<String>,
    next_program: u32,
}

impl Default for MockRenderer {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            max_fragment_uniforms: 64,
            max_varyings: 8,
            fail_next_compile: None,
            next_program: 1,
        }
    }
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of draw calls recorded so far.
    pub fn draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, RendererCall::Draw { .. }))
            .count()
    }

    /// The fragment source of the most recent compile call.
    pub fn last_fragment_source(&self) -> Option<&str> {
        self.calls.iter().rev().find_map(|call| match call {
            RendererCall::Compile { fragment_source, .. } => Some(fragment_source.as_str()),
            _ => None,
        })
    }

    /// The vertex source of the most recent compile call.
    pub fn last_vertex_source(&self) -> Option<&str> {
        self.calls.iter().rev().find_map(|call| match call {
            RendererCall::Compile { vertex_source, .. } => Some(vertex_source.as_str()),
            _ => None,
        })
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl Renderer for MockRenderer {
    fn compile(&mut self, material: &EffectMaterial) -> Result<ProgramId, RendererError> {
        if let Some(message) = self.fail_next_compile.take() {
            return Err(RendererError::Compilation(message));
        }

        let program = ProgramId(self.next_program);
        self.next_program += 1;

        self.calls.push(RendererCall::Compile {
            program,
            fragment_source: material.fragment_source().to_string(),
            vertex_source: material.vertex_source().to_string(),
        });

        Ok(program)
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.calls.push(RendererCall::Delete(program));
    }

    fn draw(
        &mut self,
        program: ProgramId,
        input: Option<FrameBuffer>,
        output: Option<FrameBuffer>,
    ) {
        self.calls.push(RendererCall::Draw {
            program,
            input,
            output,
        });
    }

    fn max_fragment_uniforms(&self) -> u32 {
        self.max_fragment_uniforms
    }

    fn max_varyings(&self) -> u32 {
        self.max_varyings
    }
}
