//! lines and hunk commands - Compare a file's current content against HEAD

use std::io::Write as _;
use std::path::Path;

use anyhow::{Context as _, Result};

use super::{acquire, work_relative};
use crate::cli::Context;
use crate::ui::output::{self, format_lines};

/// Show changed line ranges of `file`.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `file` - File whose on-disk content is compared against `HEAD`
/// * `json` - Print JSON (0-based half-open ranges) instead of text
pub fn lines(ctx: &Context, file: &Path, json: bool) -> Result<()> {
    let file = ctx.resolve(file);
    let repo = acquire(ctx, &file)?;
    let relative = work_relative(&repo, &file)?;

    let buffer =
        std::fs::read(&file).with_context(|| format!("Failed to read '{}'", file.display()))?;
    let snapshot = repo
        .diff(&relative)
        .with_context(|| format!("Failed to read '{}' at HEAD", relative.display()))?;
    let lines = snapshot.lines(&buffer).context("Failed to diff")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
    } else if lines.is_empty() {
        output::print("no changes", ctx.verbosity);
    } else {
        println!("{}", format_lines(&lines));
    }
    Ok(())
}

/// Print the hunk of `file` touching `line`.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `file` - File whose on-disk content is compared against `HEAD`
/// * `line` - 1-based line number in the current content
pub fn hunk(ctx: &Context, file: &Path, line: u64) -> Result<()> {
    let file = ctx.resolve(file);
    let repo = acquire(ctx, &file)?;
    let relative = work_relative(&repo, &file)?;

    let buffer =
        std::fs::read(&file).with_context(|| format!("Failed to read '{}'", file.display()))?;
    let snapshot = repo
        .diff(&relative)
        .with_context(|| format!("Failed to read '{}' at HEAD", relative.display()))?;

    let index = usize::try_from(line.saturating_sub(1)).context("Line number too large")?;
    let line_count = count_lines(&buffer);
    if index >= line_count {
        output::warn(
            format!(
                "line {} is past the end of '{}' ({} lines)",
                line,
                relative.display(),
                line_count
            ),
            ctx.verbosity,
        );
        return Ok(());
    }

    let text = snapshot.hunk_bytes(&buffer, index).context("Failed to diff")?;
    if text.is_empty() {
        output::print(format!("line {} is unchanged", line), ctx.verbosity);
    } else {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&text)?;
        stdout.flush()?;
    }
    Ok(())
}

/// Number of lines in `buffer`, counting a final line without a newline.
fn count_lines(buffer: &[u8]) -> usize {
    let newlines = buffer.iter().filter(|&&b| b == b'\n').count();
    match buffer.last() {
        Some(b'\n') | None => newlines,
        Some(_) => newlines + 1,
    }
}
