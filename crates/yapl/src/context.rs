//! Render setup shared by every command

use crate::cli::RenderArgs;
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use yapl_core::config::consts::CONFIG_FILE_NAME;
use yapl_core::{FsLoader, FsResolver, Renderer, RendererOptions, Vars};

/// Renderer, variables and base directory for one invocation
pub struct RenderContext {
    pub renderer: Renderer,
    pub vars: Vars,
    pub base_dir: PathBuf,
}

impl RenderContext {
    pub fn from_args(args: &RenderArgs) -> Result<Self> {
        let base_dir = match &args.base_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("Failed to get current directory")?,
        };
        if !base_dir.is_dir() {
            bail!("Base directory not found: {}", base_dir.display());
        }

        let options = load_options(args.config.as_deref(), &base_dir)?;
        let vars = match &args.vars {
            Some(path) => load_vars(path)?,
            None => Vars::new(),
        };

        let resolver = FsResolver::new(&base_dir).with_strict(!args.no_strict);
        let base = resolver.base_dir().to_string_lossy().into_owned();
        let renderer = Renderer::new(options)
            .with_resolver(resolver)
            .with_loader(FsLoader::new())
            .with_base_dir(base.clone());

        Ok(Self {
            renderer,
            vars,
            base_dir: PathBuf::from(base),
        })
    }

    /// Path relative to the base directory where possible
    pub fn display_path(&self, identifier: &str) -> String {
        Path::new(identifier)
            .strip_prefix(&self.base_dir)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| identifier.to_string())
    }
}

/// Explicit config file, else `yapl.toml` in the base directory, else defaults
fn load_options(config: Option<&Path>, base_dir: &Path) -> Result<RendererOptions> {
    if let Some(path) = config {
        return RendererOptions::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }

    let conventional = base_dir.join(CONFIG_FILE_NAME);
    if conventional.is_file() {
        tracing::debug!(path = %conventional.display(), "using config file");
        return RendererOptions::from_file(&conventional)
            .with_context(|| format!("Failed to load config {}", conventional.display()));
    }

    Ok(RendererOptions::default())
}

/// Read a JSON or TOML variables file whose top level is a table
fn load_vars(path: &Path) -> Result<Vars> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read vars file {}", path.display()))?;

    let value = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str::<serde_json::Value>(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?,
        Some("toml") => {
            let table: toml::Table = toml::from_str(&content)
                .with_context(|| format!("Invalid TOML in {}", path.display()))?;
            serde_json::to_value(table)
                .with_context(|| format!("Cannot convert {}", path.display()))?
        }
        _ => bail!(
            "Unsupported vars file {} (expected .json or .toml)",
            path.display()
        ),
    };

    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => bail!("Vars file {} must contain a table at the top level", path.display()),
    }
}
