//! Terminal output.
//!
//! All operator-facing output goes through [`OutputFormatter`]: colored status
//! lines, the walk spinner, and the end-of-run report. Errors go to stderr,
//! everything else to stdout.

use crate::file_category::Category;
use crate::report::{DiagnosticKind, Summary};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct OutputFormatter;

impl OutputFormatter {
    /// `✓ message` in green.
    ///
    /// ```no_run
    /// use dirsort::output::OutputFormatter;
    /// OutputFormatter::success("Files are sorted.");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green().bold(), message);
    }

    /// `✗ message` in red, on stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message.red());
    }

    pub fn warning(message: &str) {
        println!("{} {}", "!".yellow().bold(), message.yellow());
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(title: &str) {
        println!("\n{}", title.bold().underline());
    }

    pub fn dry_run_notice(message: &str) {
        println!("{} {}", "[dry run]".yellow().bold(), message);
    }

    /// Creates a spinner that shows the entry currently being visited.
    ///
    /// Drawn on stderr, and only when stderr is a terminal.
    pub fn create_spinner() -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {elapsed} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    }

    /// Prints one row per category directory with its file count, then the total.
    pub fn summary_table(category_counts: &[(&str, usize)], total_files: usize) {
        Self::header("Sorted");

        let name_width = category_counts
            .iter()
            .map(|(dir, _)| dir.len() + 1)
            .chain(std::iter::once("total".len()))
            .max()
            .unwrap_or_default();
        let count_width = total_files.to_string().len();

        for (dir, count) in category_counts {
            println!(
                "  {:<name_width$}  {:>count_width$}",
                format!("{}/", dir),
                count.to_string().green()
            );
        }
        println!(
            "  {:<name_width$}  {:>count_width$} {}",
            "total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files, "file", "files")
        );
    }

    /// Prints the end-of-run report: files per category, the category and
    /// extension sets, what was unpacked or removed, and every diagnostic.
    pub fn run_report(summary: &Summary) {
        for category in Category::ALL {
            let names = summary.files_in(category);
            Self::header(&format!("{} ({})", category.description(), names.len()));
            if names.is_empty() {
                Self::plain("  -");
            }
            for name in names {
                Self::plain(&format!("  {}", name));
            }
        }

        let known: Vec<&str> = summary.known_categories.iter().map(|c| c.label()).collect();
        let unknown: Vec<&str> = summary
            .unknown_extensions
            .iter()
            .map(String::as_str)
            .collect();
        Self::header("Known categories");
        Self::plain(&format!("  {}", join_or_dash(&known)));
        Self::header("Unknown extensions");
        Self::plain(&format!("  {}", join_or_dash(&unknown)));

        if !summary.extracted_archives.is_empty() {
            Self::header("Unpacked archives");
            for extraction in &summary.extracted_archives {
                Self::plain(&format!(
                    "  {} → {} ({} entries)",
                    extraction.archive.display(),
                    extraction.folder.display(),
                    extraction.entries
                ));
            }
        }

        if !summary.removed_reserved_dirs.is_empty() {
            Self::header("Removed directories named like categories");
            for dir in &summary.removed_reserved_dirs {
                Self::plain(&format!("  {}", dir.display()));
            }
        }

        if !summary.diagnostics.is_empty() {
            Self::header("Problems");
            for diagnostic in &summary.diagnostics {
                match diagnostic.kind {
                    DiagnosticKind::ArchiveIntegrity => Self::warning(&diagnostic.message),
                    DiagnosticKind::Io => Self::error(&diagnostic.message),
                }
            }
        }

        Self::summary_table(&summary.category_counts(), summary.total_files());

        if summary.pruned_dirs > 0 {
            Self::info(&format!(
                "Removed {} empty {}",
                summary.pruned_dirs,
                plural(summary.pruned_dirs, "directory", "directories")
            ));
        }
    }
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}

fn join_or_dash(items: &[&str]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}
