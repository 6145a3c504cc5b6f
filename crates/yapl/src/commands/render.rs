//! Render command

use crate::cli::RenderArgs;
use crate::context::RenderContext;
use anyhow::Result;
use colored::Colorize;
use std::io::Write;

pub fn run(template: &str, args: &RenderArgs, used_files: bool) -> Result<()> {
    let ctx = RenderContext::from_args(args)?;
    tracing::debug!(template, base_dir = %ctx.base_dir.display(), "rendering");

    let rt = super::runtime()?;
    let rendered = rt.block_on(ctx.renderer.render_file(template, &ctx.vars))?;

    // Output is written exactly as rendered, without a trailing newline
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.content.as_bytes())?;
    stdout.flush()?;

    if used_files {
        eprintln!("{}", "Used files:".bold());
        for file in &rendered.used_files {
            eprintln!("  {}", ctx.display_path(file));
        }
    }

    Ok(())
}
