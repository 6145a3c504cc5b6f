//! Template resolution and loading
//!
//! The engine never touches storage itself. A [`Resolver`] turns a reference
//! written in a directive into an identifier, and a [`Loader`] fetches the
//! text behind an identifier. This module ships a filesystem pair and an
//! in-memory pair.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Result, TemplateError};
use crate::path::{has_absolute_or_rooted_component, normalize_lexically};

/// Maps a directive reference to an identifier
///
/// `reference` is already extension-normalized. `from_dir` is the directory
/// of the referencing template ("" at the top level). Must be deterministic.
pub trait Resolver: Send + Sync {
    fn resolve(&self, reference: &str, from_dir: &str) -> Result<String>;
}

/// Fetches template text by identifier
///
/// Missing content is an error, never empty text.
#[async_trait::async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, identifier: &str) -> Result<String>;
}

/// Lexical path resolver rooted at a base directory
#[derive(Debug, Clone)]
pub struct FsResolver {
    base_dir: PathBuf,
    strict: bool,
}

impl FsResolver {
    /// Create a strict resolver
    ///
    /// A relative `base_dir` is anchored at the current working directory.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        let base_dir = base_dir.as_ref();
        let anchored = if has_absolute_or_rooted_component(base_dir) {
            base_dir.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(base_dir))
                .unwrap_or_else(|_| base_dir.to_path_buf())
        };
        Self {
            base_dir: normalize_lexically(&anchored),
            strict: true,
        }
    }

    /// Allow (`false`) or reject (`true`) identifiers outside the base directory
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl Resolver for FsResolver {
    fn resolve(&self, reference: &str, from_dir: &str) -> Result<String> {
        let requested = Path::new(reference);
        let joined = if has_absolute_or_rooted_component(requested) {
            requested.to_path_buf()
        } else if from_dir.is_empty() {
            self.base_dir.join(requested)
        } else {
            self.base_dir.join(from_dir).join(requested)
        };
        let resolved = normalize_lexically(&joined);

        if self.strict && !resolved.starts_with(&self.base_dir) {
            return Err(TemplateError::PathEscape {
                reference: reference.to_string(),
                base_dir: self.base_dir.clone(),
            });
        }

        resolved
            .to_str()
            .map(str::to_string)
            .ok_or_else(|| TemplateError::ResolveFailed {
                reference: reference.to_string(),
                from_dir: from_dir.to_string(),
                reason: "path is not valid UTF-8".to_string(),
            })
    }
}

/// UTF-8 file loader with an optional content cache
#[derive(Debug, Default)]
pub struct FsLoader {
    cache: Option<RwLock<HashMap<String, Arc<str>>>>,
}

impl FsLoader {
    /// Create a caching loader
    pub fn new() -> Self {
        Self {
            cache: Some(RwLock::new(HashMap::new())),
        }
    }

    /// Create a loader that reads the file on every call
    pub fn uncached() -> Self {
        Self { cache: None }
    }

    async fn read(identifier: &str) -> Result<String> {
        tokio::fs::read_to_string(identifier)
            .await
            .map_err(|e| TemplateError::LoadFailed {
                identifier: identifier.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait::async_trait]
impl Loader for FsLoader {
    async fn load(&self, identifier: &str) -> Result<String> {
        let Some(cache) = &self.cache else {
            return Self::read(identifier).await;
        };

        if let Some(content) = cache.read().await.get(identifier) {
            debug!(identifier = %identifier, "template cache hit");
            return Ok(content.to_string());
        }

        debug!(identifier = %identifier, "template cache miss");
        let content = Self::read(identifier).await?;
        cache
            .write()
            .await
            .insert(identifier.to_string(), Arc::from(content.as_str()));
        Ok(content)
    }
}

/// In-memory templates acting as both resolver and loader
///
/// Identifiers are `/`-separated paths. References join onto the referencing
/// directory, and `.` / `..` segments are collapsed.
///
/// ```rust
/// use yapl_core::MemoryTemplates;
///
/// let templates = MemoryTemplates::new()
///     .with_template("layouts/base.yapl", "<{% block body %}{% endblock %}>")
///     .with_template("page.yapl", "{% extends \"layouts/base\" %}");
/// assert_eq!(templates.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplates {
    templates: Arc<HashMap<String, String>>,
}

impl MemoryTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a template under a normalized identifier
    pub fn with_template(mut self, identifier: &str, content: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.templates).insert(normalize_segments(identifier), content.into());
        self
    }

    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.templates.get(identifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Resolver for MemoryTemplates {
    fn resolve(&self, reference: &str, from_dir: &str) -> Result<String> {
        if reference.starts_with('/') || from_dir.is_empty() {
            return Ok(normalize_segments(reference));
        }
        Ok(normalize_segments(&format!("{}/{}", from_dir, reference)))
    }
}

#[async_trait::async_trait]
impl Loader for MemoryTemplates {
    async fn load(&self, identifier: &str) -> Result<String> {
        self.get(identifier)
            .map(str::to_string)
            .ok_or_else(|| TemplateError::LoadFailed {
                identifier: identifier.to_string(),
                reason: "no such template".to_string(),
            })
    }
}

/// Collapse `.`, `..` and empty segments, keeping a leading `/`
fn normalize_segments(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    let joined = segments.join("/");
    if path.starts_with('/') {
        format!("/{}", joined)
    } else {
        joined
    }
}
