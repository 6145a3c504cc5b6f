use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    // Recursion errors
    #[error(
        "DEPTH_EXCEEDED: max template depth exceeded (depth {depth} > {max_depth}, possible recursion)"
    )]
    DepthExceeded { depth: usize, max_depth: usize },

    // Resolution / load errors
    #[error("RESOLVE_FAILED: cannot resolve '{reference}' from '{from_dir}': {reason}")]
    ResolveFailed {
        reference: String,
        from_dir: String,
        reason: String,
    },

    #[error("PATH_ESCAPE: path '{reference}' escapes base directory '{}'", base_dir.display())]
    PathEscape { reference: String, base_dir: PathBuf },

    #[error("LOAD_FAILED: failed to load '{identifier}': {reason}")]
    LoadFailed { identifier: String, reason: String },

    #[error("NO_RESOLVER: no resolver configured, file-based directives are not available")]
    NoResolver,

    #[error("NO_LOADER: no loader configured, file-based directives are not available")]
    NoLoader,

    // Evaluation errors
    #[error("TYPE_MISMATCH: for loop iterable '{expression}' must be an array, got: {found}")]
    TypeMismatch { expression: String, found: String },

    // Config errors
    #[error("CONFIG_INVALID: {0}")]
    ConfigInvalid(String),
}

impl TemplateError {
    /// Stable machine-readable code (the message prefix)
    pub fn code(&self) -> &'static str {
        match self {
            TemplateError::DepthExceeded { .. } => "DEPTH_EXCEEDED",
            TemplateError::ResolveFailed { .. } => "RESOLVE_FAILED",
            TemplateError::PathEscape { .. } => "PATH_ESCAPE",
            TemplateError::LoadFailed { .. } => "LOAD_FAILED",
            TemplateError::NoResolver => "NO_RESOLVER",
            TemplateError::NoLoader => "NO_LOADER",
            TemplateError::TypeMismatch { .. } => "TYPE_MISMATCH",
            TemplateError::ConfigInvalid(_) => "CONFIG_INVALID",
        }
    }
}

impl From<toml::de::Error> for TemplateError {
    fn from(err: toml::de::Error) -> Self {
        TemplateError::ConfigInvalid(format!("TOML error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, TemplateError>;
