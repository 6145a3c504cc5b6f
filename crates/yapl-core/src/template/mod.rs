//! Template module - text template engine with inheritance
//!
//! Templates are plain text with three tag forms. Everything outside tags is
//! copied through unchanged, and tags the engine does not recognize stay in
//! the output verbatim.
//!
//! ## Syntax
//!
//! - Placeholders: `{{ user.name }}`, `{{ title | default("Untitled") }}`
//! - Conditionals: `{% if a and b is not empty %}` ... `{% elseif c %}` ... `{% else %}` ... `{% endif %}`
//! - Loops: `{% for item in items %}` ... `{% endfor %}`
//! - Comments: `{# removed from output #}`
//! - Composition: `{% include "partial" with { key: "v" } %}`,
//!   `{% extends "layout" %}`, `{% mixin "a", "b" %}`,
//!   `{% block name %}` ... `{% endblock %}`, `{{ super() }}`
//! - Whitespace control: `{%-`, `-%}` (and the same for `{{ }}` / `{# #}`)
//!
//! ## Failure model
//!
//! Unknown or malformed syntax never fails a render: it is left as text.
//! Only missing collaborators, failed resolution or loading, a non-array loop
//! source and exceeding the depth limit are errors.

pub mod engine;
pub mod expr;
pub mod whitespace;

pub use engine::{Rendered, Renderer};
