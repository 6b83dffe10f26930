//! Effect composition pass
//!
//! This crate merges many independently-authored shader effects into a
//! single full-screen program:
//! - Effect capability interface and attribute flags
//! - Per-effect integration (validation, symbol renaming, call emission)
//! - The composition pass with its render/update/recompile lifecycle
//! - The merged material handed to the external renderer
//!
//! The GPU binding itself is an external collaborator behind the
//! [`Renderer`] trait; [`mock::MockRenderer`] records calls for tests.

pub mod effect;
pub mod integration;
pub mod material;
pub mod mock;
pub mod parts;
pub mod pass;
pub mod renderer;
pub mod uniform;

pub use effect::{BlendMode, Effect, EffectAttributes, Extension, ExtensionSet};
pub use integration::{BlendRegistry, BuildContext, Integration, IntegrationError, integrate};
pub use material::EffectMaterial;
pub use pass::{ComposeError, EffectPass};
pub use renderer::{
    DepthPacking, FrameBuffer, ProgramId, Renderer, RendererError, TextureHandle,
};
pub use uniform::{DefineMap, Uniform, UniformMap, UniformValue};

pub use postfx_glsl::BlendFunction;
