//! Uniform value holders and ordered key maps
//!
//! Uniform values are shared between an effect and the compiled material so
//! that runtime mutation (animation timers, opacity tweaks) reaches the GPU
//! without recompilation. The key set of a map is fixed once the material is
//! compiled; only values change afterwards.

use std::sync::{Arc, Mutex};

use crate::renderer::TextureHandle;

/// A uniform value as understood by the external renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Texture(Option<TextureHandle>),
}

/// A shared, mutable uniform value holder.
///
/// Cloning a `Uniform` clones the handle, not the value: the effect and the
/// merged uniform table observe the same storage.
#[derive(Debug, Clone)]
pub struct Uniform {
    value: Arc<Mutex<UniformValue>>,
}

impl Uniform {
    pub fn new(value: UniformValue) -> Self {
        Self {
            value: Arc::new(Mutex::new(value)),
        }
    }

    pub fn float(value: f32) -> Self {
        Self::new(UniformValue::Float(value))
    }

    pub fn vec2(x: f32, y: f32) -> Self {
        Self::new(UniformValue::Vec2([x, y]))
    }

    pub fn texture(handle: Option<TextureHandle>) -> Self {
        Self::new(UniformValue::Texture(handle))
    }

    pub fn get(&self) -> UniformValue {
        *self.value.lock().unwrap()
    }

    pub fn set(&self, value: UniformValue) {
        *self.value.lock().unwrap() = value;
    }

    /// Convenience accessor for float uniforms; returns 0.0 for other kinds.
    pub fn as_float(&self) -> f32 {
        match self.get() {
            UniformValue::Float(f) => f,
            _ => 0.0,
        }
    }

    pub fn set_float(&self, value: f32) {
        self.set(UniformValue::Float(value));
    }
}

/// An insertion-ordered map of uniform names to value holders.
///
/// Order is irrelevant to composition semantics but preserved so diagnostics
/// list uniforms the way they were declared.
#[derive(Debug, Clone, Default)]
pub struct UniformMap {
    entries: Vec<(String, Uniform)>,
}

impl UniformMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, uniform: Uniform) {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => *existing = uniform,
            None => self.entries.push((name, uniform)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Uniform> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, u)| u)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Uniform)> {
        self.entries.iter().map(|(k, u)| (k.as_str(), u))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An insertion-ordered map of macro names to replacement text.
#[derive(Debug, Clone, Default)]
pub struct DefineMap {
    entries: Vec<(String, String)>,
}

impl DefineMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(k, _)| k != name);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Mutable access to every value, for symbol renaming.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut String> {
        self.entries.iter_mut().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
