//! CLI command implementations

pub mod check;
pub mod render;

use anyhow::{Context, Result};

/// Runtime for the async renderer
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")
}
