//! watch command - Reprint status whenever the metadata directory changes

use std::time::Duration;

use anyhow::{bail, Context as _, Result};

use super::acquire;
use super::status::report;
use crate::cli::Context;
use crate::ui::output;

/// Print the status, then again after every invalidation.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `count` - Stop after this many reports; runs until interrupted if `None`
/// * `interval_ms` - How often to check the cache
pub fn watch(ctx: &Context, count: Option<usize>, interval_ms: u64) -> Result<()> {
    if !ctx.registry.is_watching() {
        bail!("Watching is disabled in the configuration ([watch] enabled = false)");
    }

    let repo = acquire(ctx, &ctx.cwd)?;
    let interval = Duration::from_millis(interval_ms.max(1));
    output::print(
        format!("watching {}", repo.metadata_path().display()),
        ctx.verbosity,
    );

    let mut reports = 0;
    loop {
        let status = repo.status().context("Failed to compute status")?;
        report(ctx, &repo, &status, false)?;
        reports += 1;
        if count.is_some_and(|n| reports >= n) {
            return Ok(());
        }

        while repo.is_status_cached() {
            std::thread::sleep(interval);
        }
        output::print("---", ctx.verbosity);
    }
}
