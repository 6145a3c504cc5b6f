//! Helper functions for template rendering

use serde_json::Value;

use super::tokenize::{tokenize, Token, TokenKind};
use super::TemplateContext;
use crate::path::get_path;
use crate::value::{to_text, Vars};

/// Rebuild `text` with some tokens replaced
///
/// `replace` returns `None` to keep a token verbatim.
pub(crate) fn rewrite_tokens<F>(text: &str, tokens: &[Token], mut replace: F) -> String
where
    F: FnMut(&Token) -> Option<String>,
{
    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;

    for token in tokens {
        if let Some(replacement) = replace(token) {
            output.push_str(&text[cursor..token.start]);
            output.push_str(&replacement);
            cursor = token.end();
        }
    }

    output.push_str(&text[cursor..]);
    output
}

/// Remove every token matching `predicate`
pub(crate) fn strip_tokens(text: &str, predicate: impl Fn(&TokenKind) -> bool) -> String {
    let tokens = tokenize(text);
    rewrite_tokens(text, &tokens, |token| {
        predicate(&token.kind).then(String::new)
    })
}

/// Replace every `{{ super() }}` marker with `replacement`
pub(crate) fn replace_super(text: &str, replacement: &str) -> String {
    let tokens = tokenize(text);
    rewrite_tokens(text, &tokens, |token| {
        matches!(token.kind, TokenKind::Super).then(|| replacement.to_string())
    })
}

/// Substitute `{{ path }}` placeholders
///
/// A null or absent value falls back to the declared default, or to empty
/// text.
pub(crate) fn interpolate(text: &str, vars: &Vars) -> String {
    let tokens = tokenize(text);
    rewrite_tokens(text, &tokens, |token| match &token.kind {
        TokenKind::Placeholder { path, default } => Some(match get_path(vars, path).as_deref() {
            None | Some(Value::Null) => default.clone().unwrap_or_default(),
            Some(value) => to_text(value),
        }),
        _ => None,
    })
}

/// Create a loop context with a variable binding
pub(crate) fn create_loop_context(
    context: &TemplateContext,
    var_name: &str,
    item: Value,
) -> TemplateContext {
    let mut vars = context.vars.clone();
    vars.insert(var_name.to_string(), item);
    TemplateContext {
        vars,
        dir: context.dir.clone(),
        depth: context.depth + 1,
    }
}

/// Create an include context: `with` bindings shadow the surrounding ones
pub(crate) fn create_include_context(
    context: &TemplateContext,
    locals: Vars,
    dir: String,
) -> TemplateContext {
    let mut vars = context.vars.clone();
    vars.extend(locals);
    TemplateContext {
        vars,
        dir,
        depth: context.depth + 1,
    }
}
