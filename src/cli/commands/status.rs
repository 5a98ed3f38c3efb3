//! status command - List added and modified paths of the work tree

use anyhow::{Context as _, Result};

use super::acquire;
use crate::cli::Context;
use crate::repo::{SharedRepository, Status};
use crate::ui::output::{self, format_list, format_path};

/// Show the work-tree status of the repository containing the working
/// directory.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `json` - Print JSON instead of text
pub fn status(ctx: &Context, json: bool) -> Result<()> {
    let repo = acquire(ctx, &ctx.cwd)?;
    let status = repo.status().context("Failed to compute status")?;
    report(ctx, &repo, &status, json)
}

/// Print one status report. Shared with the watch command.
pub(super) fn report(
    ctx: &Context,
    repo: &SharedRepository,
    status: &Status,
    json: bool,
) -> Result<()> {
    if json {
        let strings = |set: &std::collections::BTreeSet<std::path::PathBuf>| -> Vec<String> {
            set.iter().map(|p| p.display().to_string()).collect()
        };
        let value = serde_json::json!({
            "work_path": repo.work_path().display().to_string(),
            "added": strings(&status.added),
            "modified": strings(&status.modified),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if status.is_empty() {
        output::print("nothing changed", ctx.verbosity);
        return Ok(());
    }

    let work = repo.work_path();
    let added: Vec<String> = status.added.iter().map(|p| format_path(p, work)).collect();
    let modified: Vec<String> = status
        .modified
        .iter()
        .map(|p| format_path(p, work))
        .collect();

    if !added.is_empty() {
        println!("{}", format_list(&added, "A "));
    }
    if !modified.is_empty() {
        println!("{}", format_list(&modified, "M "));
    }
    Ok(())
}
