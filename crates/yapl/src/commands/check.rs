//! Check command - render templates and report failures

use crate::cli::RenderArgs;
use crate::context::RenderContext;
use anyhow::{Result, bail};
use colored::Colorize;

pub fn run(templates: &[String], args: &RenderArgs) -> Result<()> {
    let ctx = RenderContext::from_args(args)?;
    let rt = super::runtime()?;

    let mut failed = 0;
    for template in templates {
        match rt.block_on(ctx.renderer.render_file(template, &ctx.vars)) {
            Ok(rendered) => {
                println!(
                    "{} {} ({} file(s))",
                    "✓".green().bold(),
                    template,
                    rendered.used_files.len()
                );
            }
            Err(e) => {
                failed += 1;
                println!("{} {}: {}", "✗".red().bold(), template, e);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} template(s) failed", failed, templates.len());
    }
    Ok(())
}
