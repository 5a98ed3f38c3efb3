//! root command - Print the repository root containing a path

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::Context;

/// Print the metadata directory of the repository containing `path`.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `path` - Any path inside the repository; defaults to the working directory
pub fn root(ctx: &Context, path: Option<&Path>) -> Result<()> {
    let start = match path {
        Some(p) => ctx.resolve(p),
        None => ctx.cwd.clone(),
    };

    let root = ctx
        .registry
        .root_path(&start)
        .with_context(|| format!("No repository found at '{}'", start.display()))?;

    println!("{}", root.display());
    Ok(())
}
