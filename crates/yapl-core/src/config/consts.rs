//! Engine-wide defaults

/// Default recursion ceiling for nested expansion
pub const DEFAULT_MAX_DEPTH: usize = 20;

/// Extension appended to template references that lack it
pub const DEFAULT_EXTENSION: &str = ".yapl";

/// Conventional name of the renderer configuration file
pub const CONFIG_FILE_NAME: &str = "yapl.toml";
