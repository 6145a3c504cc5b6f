//! Test utilities for yapl
//!
//! This crate provides shared testing utilities used across the yapl workspace.

use std::path::Path;
use tempfile::TempDir;

/// Creates a temporary directory within `.tmp/` at the project root
///
/// This keeps test files in a single gitignored location that is easy to
/// clean up manually if needed.
///
/// # Panics
///
/// Panics if the current directory cannot be determined or the directory
/// cannot be created.
///
/// # Examples
///
/// ```rust
/// use yapl_testkit::temp_dir_in_workspace;
///
/// let temp = temp_dir_in_workspace();
/// let file_path = temp.path().join("test.txt");
/// std::fs::write(&file_path, "test data").unwrap();
/// // Cleanup happens automatically when temp is dropped
/// ```
pub fn temp_dir_in_workspace() -> TempDir {
    try_temp_dir_in_workspace().expect("Failed to create temporary directory in .tmp/")
}

/// Alternative with Result for non-test code
pub fn try_temp_dir_in_workspace() -> std::io::Result<TempDir> {
    let workspace_root = std::env::current_dir()?;
    let tmp_base = workspace_root.join(".tmp");
    std::fs::create_dir_all(&tmp_base)?;
    TempDir::new_in(&tmp_base)
}

/// Temporary on-disk template directory
///
/// Files are written as they are added; the directory is removed on drop.
///
/// ```rust
/// use yapl_testkit::TemplateTree;
///
/// let tree = TemplateTree::new()
///     .with_file("layouts/base.yapl", "<{% block body %}{% endblock %}>")
///     .with_file("page.yapl", "{% extends \"layouts/base\" %}");
/// assert!(tree.path().join("layouts/base.yapl").exists());
/// ```
pub struct TemplateTree {
    dir: TempDir,
}

impl TemplateTree {
    /// Create an empty tree under `.tmp/`
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created.
    pub fn new() -> Self {
        Self {
            dir: temp_dir_in_workspace(),
        }
    }

    /// Write `content` to `relative`, creating parent directories
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn with_file(self, relative: &str, content: &str) -> Self {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create template directory");
        }
        std::fs::write(&path, content).expect("Failed to write template file");
        self
    }

    /// Root directory of the tree
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Default for TemplateTree {
    fn default() -> Self {
        Self::new()
    }
}
