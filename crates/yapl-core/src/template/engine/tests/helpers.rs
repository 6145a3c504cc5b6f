//! Shared test helpers for template engine tests

use serde_json::Value;

use crate::config::RendererOptions;
use crate::loader::MemoryTemplates;
use crate::template::engine::Renderer;
use crate::value::Vars;

/// Turn a `json!` object into a variable context
pub(super) fn to_vars(value: Value) -> Vars {
    value.as_object().cloned().unwrap_or_default()
}

/// Renderer over in-memory templates with default options
pub(super) fn memory(templates: &[(&str, &str)]) -> Renderer {
    memory_with_options(RendererOptions::default(), templates)
}

/// Renderer over in-memory templates
pub(super) fn memory_with_options(options: RendererOptions, templates: &[(&str, &str)]) -> Renderer {
    let store = templates
        .iter()
        .fold(MemoryTemplates::new(), |store, (id, content)| {
            store.with_template(id, *content)
        });
    Renderer::new(options)
        .with_resolver(store.clone())
        .with_loader(store)
}

/// Render a self-contained template with default options
pub(super) async fn render(template: &str, vars: &Vars) -> String {
    Renderer::default()
        .render_string(template, vars, None)
        .await
        .unwrap()
        .content
}
