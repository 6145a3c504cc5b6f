use serde::{Deserialize, Serialize};

use super::consts::{DEFAULT_EXTENSION, DEFAULT_MAX_DEPTH};
use crate::error::{Result, TemplateError};

/// yapl.toml schema - renderer behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RendererOptions {
    /// Recursion ceiling for nested expansion
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Extension appended to bare template references ("" disables)
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default)]
    pub whitespace: WhitespaceOptions,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            extension: DEFAULT_EXTENSION.to_string(),
            whitespace: WhitespaceOptions::default(),
        }
    }
}

/// Global whitespace toggles. Tag-adjacent trim markers are always honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitespaceOptions {
    /// Drop the line break after a control tag
    #[serde(default = "default_true")]
    pub trim_blocks: bool,
    /// Strip indentation before a control tag at line start
    #[serde(default = "default_true")]
    pub lstrip_blocks: bool,
    /// Dedent block, branch, and loop bodies
    #[serde(default = "default_true")]
    pub dedent_blocks: bool,
}

impl Default for WhitespaceOptions {
    fn default() -> Self {
        Self {
            trim_blocks: true,
            lstrip_blocks: true,
            dedent_blocks: true,
        }
    }
}

impl WhitespaceOptions {
    /// All global transforms disabled
    pub fn disabled() -> Self {
        Self {
            trim_blocks: false,
            lstrip_blocks: false,
            dedent_blocks: false,
        }
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

fn default_true() -> bool {
    true
}

impl RendererOptions {
    /// Parse options from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read yapl.toml
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TemplateError::ConfigInvalid(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_whitespace(mut self, whitespace: WhitespaceOptions) -> Self {
        self.whitespace = whitespace;
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}
