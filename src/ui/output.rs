//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag.
//! Commands with `--json` print machine-readable JSON instead. Debug
//! detail goes through the log subscriber, not through these functions.

use std::fmt::Display;
use std::path::Path;

use crate::repo::Lines;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
}

impl Verbosity {
    /// Create verbosity from the quiet flag.
    pub fn from_flags(quiet: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Format a path relative to `base` when it lies inside it.
pub fn format_path(path: &Path, base: &Path) -> String {
    match path.strip_prefix(base) {
        Ok(relative) if !relative.as_os_str().is_empty() => relative.display().to_string(),
        _ => path.display().to_string(),
    }
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format changed line ranges with 1-based inclusive line numbers.
///
/// One line per range, in position order within each kind.
pub fn format_lines(lines: &Lines) -> String {
    let span = |(start, end): (usize, usize)| {
        if end <= start + 1 {
            format!("{}", start + 1)
        } else {
            format!("{}-{}", start + 1, end)
        }
    };

    let mut out = Vec::new();
    out.extend(lines.added.iter().map(|&r| format!("added    {}", span(r))));
    out.extend(lines.modified.iter().map(|&r| format!("modified {}", span(r))));
    out.extend(lines.removed.iter().map(|&p| format!("removed  {}", p + 1)));
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_from_quiet_flag() {
        assert_eq!(Verbosity::from_flags(true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false), Verbosity::Normal);
    }

    #[test]
    fn path_inside_base_is_relative() {
        assert_eq!(
            format_path(Path::new("/w/src/lib.rs"), Path::new("/w")),
            "src/lib.rs"
        );
        assert_eq!(format_path(Path::new("/w"), Path::new("/w")), "/w");
        assert_eq!(format_path(Path::new("/x/y"), Path::new("/w")), "/x/y");
    }

    #[test]
    fn list_prefixes_each_item() {
        assert_eq!(format_list(&["a", "b"], "M "), "M a\nM b");
    }

    #[test]
    fn lines_are_one_based() {
        let lines = Lines {
            added: vec![(2, 3), (5, 8)],
            removed: vec![0],
            modified: vec![(9, 10)],
        };
        assert_eq!(
            format_lines(&lines),
            "added    3\nadded    6-8\nmodified 10\nremoved  1"
        );
    }
}
