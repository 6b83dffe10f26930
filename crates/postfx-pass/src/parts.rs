//! Shader part buffers
//!
//! The merged program is assembled from five named text buffers, one per
//! template placeholder. Buffers are only appended (or, for the handful of
//! finalization steps, prepended) during integration and read exactly once
//! at template substitution.

/// A named slot in the fragment/vertex outer templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    FragmentHead,
    FragmentMainUv,
    FragmentMainImage,
    VertexHead,
    VertexMainSupport,
}

impl Section {
    /// The placeholder token this section replaces in the outer templates.
    pub fn placeholder(self) -> &'static str {
        match self {
            Section::FragmentHead => "FRAGMENT_HEAD",
            Section::FragmentMainUv => "FRAGMENT_MAIN_UV",
            Section::FragmentMainImage => "FRAGMENT_MAIN_IMAGE",
            Section::VertexHead => "VERTEX_HEAD",
            Section::VertexMainSupport => "VERTEX_MAIN_SUPPORT",
        }
    }
}

/// The five build-time text buffers, discarded after the final shader text is
/// produced.
#[derive(Debug, Default)]
pub struct ShaderParts {
    fragment_head: String,
    fragment_main_uv: String,
    fragment_main_image: String,
    vertex_head: String,
    vertex_main_support: String,
}

impl ShaderParts {
    pub fn new() -> Self {
        Self::default()
    }

    fn buffer_mut(&mut self, section: Section) -> &mut String {
        match section {
            Section::FragmentHead => &mut self.fragment_head,
            Section::FragmentMainUv => &mut self.fragment_main_uv,
            Section::FragmentMainImage => &mut self.fragment_main_image,
            Section::VertexHead => &mut self.vertex_head,
            Section::VertexMainSupport => &mut self.vertex_main_support,
        }
    }

    pub fn append(&mut self, section: Section, text: &str) {
        self.buffer_mut(section).push_str(text);
    }

    pub fn prepend(&mut self, section: Section, text: &str) {
        self.buffer_mut(section).insert_str(0, text);
    }

    pub fn get(&self, section: Section) -> &str {
        match section {
            Section::FragmentHead => &self.fragment_head,
            Section::FragmentMainUv => &self.fragment_main_uv,
            Section::FragmentMainImage => &self.fragment_main_image,
            Section::VertexHead => &self.vertex_head,
            Section::VertexMainSupport => &self.vertex_main_support,
        }
    }

    /// Substitute the trimmed buffers into a template at their placeholders.
    pub fn substitute(&self, template: &str) -> String {
        let mut source = template.to_string();
        for section in [
            Section::FragmentHead,
            Section::FragmentMainUv,
            Section::FragmentMainImage,
            Section::VertexHead,
            Section::VertexMainSupport,
        ] {
            source = source.replace(section.placeholder(), self.get(section).trim());
        }
        source
    }
}
