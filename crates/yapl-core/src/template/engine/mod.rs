//! Template engine implementation
//!
//! Every template text goes through the same pipeline in [`Renderer::expand`]:
//!
//! 1. depth check against `max_depth`
//! 2. whitespace control and comment removal
//! 3. `extends` (top-level templates only) hands over to inheritance
//! 4. `extends` / `mixin` tags are dropped
//! 5. includes, standalone blocks, conditionals, loops
//! 6. leftover `super()` markers are dropped, placeholders substituted
//!
//! Nested bodies are expanded recursively one level deeper. Directives inside
//! a loop body are left for the per-iteration expansion so they see the loop
//! variable.

mod blocks;
mod helpers;
mod inherit;
mod tokenize;

use futures_util::future::{BoxFuture, FutureExt};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::config::RendererOptions;
use crate::error::{Result, TemplateError};
use crate::loader::{FsLoader, FsResolver, Loader, Resolver};
use crate::path::{dirname, ensure_extension, parse_with_object};
use crate::template::expr::{evaluate_condition, evaluate_iterable};
use crate::template::whitespace::{apply_global_whitespace, apply_tag_trimming, dedent};
use crate::value::Vars;

use blocks::{
    block_spans, find_block_end, loop_regions, match_conditional, outside_regions, Pair,
};
use helpers::{create_include_context, create_loop_context, interpolate, strip_tokens};
use inherit::{merge_with_super, Block, BlockTable};
use tokenize::{tokenize, Token, TokenKind};

/// How a text is being expanded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// A whole template: `extends` is honored
    Template,
    /// A block, branch or loop body: `extends` is ignored
    Fragment,
}

/// Per-expansion state: bindings, directory for relative references, depth
#[derive(Debug, Clone)]
pub(crate) struct TemplateContext {
    pub(crate) vars: Vars,
    pub(crate) dir: String,
    pub(crate) depth: usize,
}

impl TemplateContext {
    /// Create a top-level context (depth 0)
    pub(crate) fn new(vars: Vars, dir: impl Into<String>) -> Self {
        Self {
            vars,
            dir: dir.into(),
            depth: 0,
        }
    }

    /// Same bindings and directory, one level deeper
    fn nested(&self) -> Self {
        self.nested_in(&self.dir)
    }

    /// Same bindings, one level deeper, relative to `dir`
    fn nested_in(&self, dir: &str) -> Self {
        Self {
            vars: self.vars.clone(),
            dir: dir.to_string(),
            depth: self.depth + 1,
        }
    }
}

/// Output of a render call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Rendered text
    pub content: String,
    /// Identifiers of every template file consumed (sorted, distinct)
    pub used_files: Vec<String>,
}

/// Template renderer
///
/// Holds configuration and the optional resolver/loader collaborators.
/// Render calls share nothing mutable, so one renderer can serve concurrent
/// calls.
///
/// ```rust
/// use serde_json::json;
/// use yapl_core::{Renderer, RendererOptions};
///
/// # tokio_test_block(async {
/// let renderer = Renderer::new(RendererOptions::default());
/// let vars = json!({"name": "World"});
/// let rendered = renderer
///     .render_string("Hello, {{ name }}!", vars.as_object().unwrap(), None)
///     .await
///     .unwrap();
/// assert_eq!(rendered.content, "Hello, World!");
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct Renderer {
    options: RendererOptions,
    resolver: Option<Arc<dyn Resolver>>,
    loader: Option<Arc<dyn Loader>>,
    base_dir: String,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("options", &self.options)
            .field("has_resolver", &self.resolver.is_some())
            .field("has_loader", &self.loader.is_some())
            .field("base_dir", &self.base_dir)
            .finish()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RendererOptions::default())
    }
}

impl Renderer {
    /// Create a renderer without collaborators (in-memory templates only)
    pub fn new(options: RendererOptions) -> Self {
        Self {
            options,
            resolver: None,
            loader: None,
            base_dir: String::new(),
        }
    }

    /// Create a renderer reading templates below `base_dir`
    ///
    /// References may not escape `base_dir`, and loaded files are cached.
    pub fn filesystem(base_dir: impl AsRef<Path>, options: RendererOptions) -> Self {
        let resolver = FsResolver::new(base_dir);
        let base_dir = resolver.base_dir().to_string_lossy().into_owned();
        Self::new(options)
            .with_resolver(resolver)
            .with_loader(FsLoader::new())
            .with_base_dir(base_dir)
    }

    pub fn with_resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn with_loader(mut self, loader: impl Loader + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Directory used when a render call names none
    pub fn with_base_dir(mut self, base_dir: impl Into<String>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn options(&self) -> &RendererOptions {
        &self.options
    }

    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    /// Render an in-memory template
    ///
    /// Relative references resolve from `current_dir`, or from the base
    /// directory when `None`. No collaborator is needed unless the template
    /// includes, extends or mixes in other files.
    pub async fn render_string(
        &self,
        template: &str,
        vars: &Vars,
        current_dir: Option<&str>,
    ) -> Result<Rendered> {
        let context = TemplateContext::new(vars.clone(), current_dir.unwrap_or(&self.base_dir));
        let mut used = BTreeSet::new();
        let content = self
            .expand(template, &context, Mode::Template, &mut used)
            .await?;
        Ok(Rendered {
            content,
            used_files: used.into_iter().collect(),
        })
    }

    /// Resolve, load and render a template file
    ///
    /// The file itself is listed in `used_files`, and its directory is the
    /// starting point for relative references.
    pub async fn render_file(&self, reference: &str, vars: &Vars) -> Result<Rendered> {
        let identifier = self.resolve(reference, &self.base_dir)?;
        let source = self.load(&identifier).await?;

        let context = TemplateContext::new(vars.clone(), dirname(&identifier));
        let mut used = BTreeSet::new();
        used.insert(identifier.clone());
        let content = self
            .expand(&source, &context, Mode::Template, &mut used)
            .await?;
        Ok(Rendered {
            content,
            used_files: used.into_iter().collect(),
        })
    }

    /// Expand one template text
    fn expand<'a>(
        &'a self,
        source: &'a str,
        context: &'a TemplateContext,
        mode: Mode,
        used: &'a mut BTreeSet<String>,
    ) -> BoxFuture<'a, Result<String>> {
        async move {
            self.check_depth(context.depth)?;
            trace!(depth = context.depth, dir = %context.dir, "expanding template");

            let text = self.preprocess(source);

            if mode == Mode::Template {
                if let Some(parent) = find_extends(&text) {
                    return self.expand_inheritance(&text, &parent, context, used).await;
                }
            }

            let text = strip_tokens(&text, |kind| {
                matches!(kind, TokenKind::Extends { .. } | TokenKind::Mixin { .. })
            });
            let text = self.expand_includes(&text, context, used).await?;
            let text = self.expand_blocks(&text, context, used).await?;
            let text = self.expand_conditionals(&text, context, used).await?;
            let text = self.expand_loops(&text, context, used).await?;
            let text = strip_tokens(&text, |kind| matches!(kind, TokenKind::Super));

            Ok(interpolate(&text, &context.vars))
        }
        .boxed()
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.options.max_depth {
            return Err(TemplateError::DepthExceeded {
                depth,
                max_depth: self.options.max_depth,
            });
        }
        Ok(())
    }

    /// Whitespace control, then comment removal
    fn preprocess(&self, source: &str) -> String {
        let text = apply_tag_trimming(source);
        let text = apply_global_whitespace(&text, self.options.whitespace);
        strip_tokens(&text, |kind| matches!(kind, TokenKind::Comment))
    }

    /// Body of a block, branch or loop, dedented when enabled
    fn body(&self, raw: &str) -> String {
        if self.options.whitespace.dedent_blocks {
            dedent(raw)
        } else {
            raw.to_string()
        }
    }

    async fn expand_includes(
        &self,
        text: &str,
        context: &TemplateContext,
        used: &mut BTreeSet<String>,
    ) -> Result<String> {
        let tokens = visible_tokens(text);
        let mut output = String::with_capacity(text.len());
        let mut cursor = 0;

        for token in &tokens {
            let TokenKind::Include { reference, with } = &token.kind else {
                continue;
            };
            output.push_str(&text[cursor..token.start]);

            let identifier = self.resolve(reference, &context.dir)?;
            let source = self.load(&identifier).await?;
            used.insert(identifier.clone());

            let locals = with
                .as_deref()
                .map(|literal| parse_with_object(literal, &context.vars))
                .unwrap_or_default();
            let child = create_include_context(context, locals, dirname(&identifier).to_string());
            let rendered = self.expand(&source, &child, Mode::Template, used).await?;
            output.push_str(&rendered);
            cursor = token.end();
        }

        output.push_str(&text[cursor..]);
        Ok(output)
    }

    async fn expand_blocks(
        &self,
        text: &str,
        context: &TemplateContext,
        used: &mut BTreeSet<String>,
    ) -> Result<String> {
        let tokens = visible_tokens(text);
        let mut output = String::with_capacity(text.len());
        let mut cursor = 0;

        for span in block_spans(&tokens) {
            output.push_str(&text[cursor..span.span.start]);
            let body = self.body(&text[span.body]);
            let rendered = self
                .expand(&body, &context.nested(), Mode::Fragment, used)
                .await?;
            output.push_str(&rendered);
            cursor = span.span.end;
        }

        output.push_str(&text[cursor..]);
        Ok(output)
    }

    async fn expand_conditionals(
        &self,
        text: &str,
        context: &TemplateContext,
        used: &mut BTreeSet<String>,
    ) -> Result<String> {
        let tokens = visible_tokens(text);
        let mut output = String::with_capacity(text.len());
        let mut cursor = 0;
        let mut idx = 0;

        while idx < tokens.len() {
            if !matches!(tokens[idx].kind, TokenKind::If { .. }) {
                idx += 1;
                continue;
            }
            let Some(conditional) = match_conditional(&tokens, idx) else {
                trace!(line = tokens[idx].line, "if without endif left as text");
                idx += 1;
                continue;
            };

            output.push_str(&text[cursor..tokens[idx].start]);
            let selected = conditional.clauses.iter().find(|clause| {
                clause
                    .condition
                    .as_deref()
                    .map_or(true, |condition| evaluate_condition(condition, &context.vars))
            });
            if let Some(clause) = selected {
                let body = self.body(&text[clause.body.clone()]);
                let rendered = self
                    .expand(&body, &context.nested(), Mode::Fragment, used)
                    .await?;
                output.push_str(&rendered);
            }

            cursor = tokens[conditional.end].end();
            idx = conditional.end + 1;
        }

        output.push_str(&text[cursor..]);
        Ok(output)
    }

    async fn expand_loops(
        &self,
        text: &str,
        context: &TemplateContext,
        used: &mut BTreeSet<String>,
    ) -> Result<String> {
        let tokens = tokenize(text);
        let mut output = String::with_capacity(text.len());
        let mut cursor = 0;
        let mut idx = 0;

        while idx < tokens.len() {
            let TokenKind::For { var, source } = &tokens[idx].kind else {
                idx += 1;
                continue;
            };
            let Some(end) = find_block_end(&tokens, idx, Pair::Loop) else {
                trace!(line = tokens[idx].line, "for without endfor left as text");
                idx += 1;
                continue;
            };

            output.push_str(&text[cursor..tokens[idx].start]);
            let items = evaluate_iterable(source, &context.vars)?;
            let body = self.body(&text[tokens[idx].end()..tokens[end].start]);
            for item in items {
                let child = create_loop_context(context, var, item);
                let rendered = self.expand(&body, &child, Mode::Fragment, used).await?;
                output.push_str(&rendered);
            }

            cursor = tokens[end].end();
            idx = end + 1;
        }

        output.push_str(&text[cursor..]);
        Ok(output)
    }

    /// Resolve an `extends` chain and render the root skeleton
    ///
    /// At each level the blocks collected so far are merged over the level's
    /// mixins and then over its parent's blocks. When the parent extends
    /// again, the merged table becomes that parent's own blocks.
    async fn expand_inheritance(
        &self,
        child_source: &str,
        parent_reference: &str,
        context: &TemplateContext,
        used: &mut BTreeSet<String>,
    ) -> Result<String> {
        let dedent_bodies = self.options.whitespace.dedent_blocks;
        let mut child_source = child_source.to_string();
        let mut child_dir = context.dir.clone();
        let mut blocks = BlockTable::extract(&child_source, &child_dir, dedent_bodies);
        let mut parent_reference = parent_reference.to_string();
        let mut depth = context.depth + 1;

        loop {
            self.check_depth(depth)?;

            let parent_id = self.resolve(&parent_reference, &child_dir)?;
            let parent_source = self.load(&parent_id).await?;
            used.insert(parent_id.clone());

            let parent_dir = dirname(&parent_id).to_string();
            let parent_source = self.preprocess(&parent_source);
            let parent_blocks = BlockTable::extract(&parent_source, &parent_dir, dedent_bodies);
            let mixin_blocks = self
                .collect_mixin_blocks(&child_source, &child_dir, used)
                .await?;

            debug!(
                parent = %parent_id,
                parent_blocks = parent_blocks.len(),
                mixin_blocks = mixin_blocks.len(),
                child_blocks = blocks.len(),
                "resolving template inheritance"
            );
            let merged = merge_with_super(&blocks, &merge_with_super(&mixin_blocks, &parent_blocks));

            match find_extends(&parent_source) {
                Some(grandparent) => {
                    child_source = parent_source;
                    child_dir = parent_dir;
                    blocks = merged;
                    parent_reference = grandparent;
                    depth += 1;
                }
                None => {
                    let skeleton = TemplateContext {
                        vars: context.vars.clone(),
                        dir: parent_dir,
                        depth,
                    };
                    return self
                        .splice_blocks(&parent_source, &parent_blocks, &merged, &skeleton, used)
                        .await;
                }
            }
        }
    }

    /// Blocks of every `mixin` directive, later mixins winning
    async fn collect_mixin_blocks(
        &self,
        source: &str,
        dir: &str,
        used: &mut BTreeSet<String>,
    ) -> Result<BlockTable> {
        let mut collected = BlockTable::new();

        for token in tokenize(source) {
            let TokenKind::Mixin { references } = token.kind else {
                continue;
            };
            for reference in references {
                let identifier = self.resolve(&reference, dir)?;
                let mixin_source = self.load(&identifier).await?;
                used.insert(identifier.clone());

                let mixin_source = self.preprocess(&mixin_source);
                collected.extend(BlockTable::extract(
                    &mixin_source,
                    dirname(&identifier),
                    self.options.whitespace.dedent_blocks,
                ));
            }
        }

        Ok(collected)
    }

    /// Render the root skeleton with the final block table
    ///
    /// Blocks the skeleton declares are replaced in place. Table entries it
    /// never declares, at any nesting level, are rendered and appended, each
    /// on its own line.
    async fn splice_blocks(
        &self,
        skeleton: &str,
        skeleton_blocks: &BlockTable,
        table: &BlockTable,
        context: &TemplateContext,
        used: &mut BTreeSet<String>,
    ) -> Result<String> {
        let mut declared = BTreeSet::new();
        let filled = self
            .fill_blocks(skeleton, table, context, &mut declared, used)
            .await?;
        let mut content = self
            .expand(&filled, context, Mode::Fragment, used)
            .await?;

        let mut additions = Vec::new();
        for (name, block) in table.iter() {
            if skeleton_blocks.contains(name) || declared.contains(name) {
                continue;
            }
            declared.insert(name.to_string());
            additions.push(self.render_block(block, table, context, &mut declared, used).await?);
        }
        if !additions.is_empty() {
            content.push('\n');
            content.push_str(&additions.join("\n"));
        }

        Ok(content)
    }

    /// Replace every top-level block of `text` with its rendered table entry
    ///
    /// Blocks missing from the table render their own body. Text outside
    /// blocks is left for the caller to expand.
    fn fill_blocks<'a>(
        &'a self,
        text: &'a str,
        table: &'a BlockTable,
        context: &'a TemplateContext,
        declared: &'a mut BTreeSet<String>,
        used: &'a mut BTreeSet<String>,
    ) -> BoxFuture<'a, Result<String>> {
        async move {
            self.check_depth(context.depth)?;
            let tokens = tokenize(text);
            let mut output = String::with_capacity(text.len());
            let mut cursor = 0;

            for span in block_spans(&tokens) {
                output.push_str(&text[cursor..span.span.start]);
                declared.insert(span.name.clone());

                let own;
                let block = match table.get(&span.name) {
                    Some(block) => block,
                    None => {
                        own = Block {
                            body: self.body(&text[span.body.clone()]),
                            dir: context.dir.clone(),
                        };
                        &own
                    }
                };
                let rendered = self
                    .render_block(block, table, context, declared, used)
                    .await?;
                output.push_str(&rendered);
                cursor = span.span.end;
            }

            output.push_str(&text[cursor..]);
            Ok(output)
        }
        .boxed()
    }

    /// Render one block body from its declaring directory
    async fn render_block(
        &self,
        block: &Block,
        table: &BlockTable,
        context: &TemplateContext,
        declared: &mut BTreeSet<String>,
        used: &mut BTreeSet<String>,
    ) -> Result<String> {
        let block_context = context.nested_in(&block.dir);
        let filled = self
            .fill_blocks(&block.body, table, &block_context, declared, used)
            .await?;
        self.expand(&filled, &block_context, Mode::Fragment, used)
            .await
    }

    fn resolve(&self, reference: &str, from_dir: &str) -> Result<String> {
        let resolver = self.resolver.as_ref().ok_or(TemplateError::NoResolver)?;
        let reference = ensure_extension(reference, &self.options.extension);
        let identifier = resolver.resolve(&reference, from_dir)?;
        debug!(
            reference = %reference,
            from_dir = %from_dir,
            identifier = %identifier,
            "resolved template reference"
        );
        Ok(identifier)
    }

    async fn load(&self, identifier: &str) -> Result<String> {
        let loader = self.loader.as_ref().ok_or(TemplateError::NoLoader)?;
        debug!(identifier = %identifier, "loading template");
        loader.load(identifier).await
    }
}

/// Tokens outside top-level loop bodies
fn visible_tokens(text: &str) -> Vec<Token> {
    let tokens = tokenize(text);
    let regions = loop_regions(&tokens);
    outside_regions(tokens, &regions)
}

/// Reference of the first `extends` directive
fn find_extends(text: &str) -> Option<String> {
    tokenize(text).into_iter().find_map(|token| match token.kind {
        TokenKind::Extends { reference } => Some(reference),
        _ => None,
    })
}

#[cfg(test)]
mod tests;
