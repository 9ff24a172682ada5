//! Named renderer installation.

use crate::config::RenderJsonConfig;
use crate::descriptor::TypeDescriptor;
use crate::error::{RenderError, Result};
use crate::renderer::{JsonRenderer, RenderContext};
use crate::value::Value;
use armature_core::HttpResponse;
use indexmap::IndexMap;
use indexmap::map::Entry;
use tracing::debug;

/// Renderers owned by a host application, keyed by method name.
///
/// Installing under a name that is already taken is a no-op: the first
/// renderer stays in place.
#[derive(Debug, Clone, Default)]
pub struct RendererRegistry {
    renderers: IndexMap<String, JsonRenderer>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a renderer for `config` under `config.name`.
    ///
    /// Returns `false` if the name was already taken.
    pub fn install(&mut self, config: RenderJsonConfig) -> bool {
        self.install_renderer(JsonRenderer::new(config))
    }

    pub fn install_renderer(&mut self, renderer: JsonRenderer) -> bool {
        match self.renderers.entry(renderer.name().to_string()) {
            Entry::Occupied(existing) => {
                debug!(name = %existing.key(), "renderer already installed; keeping the existing one");
                false
            }
            Entry::Vacant(slot) => {
                debug!(name = %slot.key(), "installed renderer");
                slot.insert(renderer);
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&JsonRenderer> {
        self.renderers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.renderers.contains_key(name)
    }

    /// Installed names in installation order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.renderers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }

    /// Render through the renderer installed under `name`
    pub fn render(
        &self,
        name: &str,
        ctx: &RenderContext<'_>,
        value: &Value,
        descriptor: &TypeDescriptor,
        status: u16,
    ) -> Result<HttpResponse> {
        self.get(name)
            .ok_or_else(|| RenderError::UnknownRenderer(name.to_string()))?
            .render(ctx, value, descriptor, status)
    }
}
