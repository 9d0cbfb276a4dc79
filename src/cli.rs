//! Command-line interface module for dirsort.
//!
//! This module handles:
//! - Argument parsing
//! - Merging configuration with command-line overrides
//! - Running the sort and printing its report

use crate::archive::InvalidArchivePolicy;
use crate::config::SortConfig;
use crate::output::OutputFormatter;
use crate::report::Summary;
use crate::walker::{CancelFlag, ReservedDirPolicy, SortOptions, Sorter};
use clap::Parser;
use std::path::PathBuf;

/// Sort a folder into images/, video/, documents/, audio/, archives/ and others/.
///
/// File names are transliterated and made filesystem-safe, zip archives are
/// unpacked, nested folders are flattened and left-over empty folders removed.
#[derive(Debug, Clone, Parser)]
#[command(name = "dirsort", version, about)]
pub struct Cli {
    /// Folder to sort
    pub source: PathBuf,

    /// Show what would happen without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Leave subfolders named like a category directory untouched instead of deleting them.
    /// Files of a category whose top-level folder is kept this way stay unsorted
    #[arg(long)]
    pub keep_reserved: bool,

    /// Delete files with an archive extension that are not valid zip archives
    #[arg(long)]
    pub purge_invalid_archives: bool,

    /// Do not remove directories left empty after sorting
    #[arg(long)]
    pub no_prune: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Print every move and extraction
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Combines configuration file policies with command-line overrides.
    pub fn sort_options(&self, config: &SortConfig) -> SortOptions {
        SortOptions {
            reserved_dirs: if self.keep_reserved {
                ReservedDirPolicy::Skip
            } else {
                config.policy.reserved_dirs
            },
            invalid_archives: if self.purge_invalid_archives {
                InvalidArchivePolicy::Delete
            } else {
                config.policy.invalid_archives
            },
            prune_empty_dirs: config.policy.prune_empty_dirs && !self.no_prune,
            dry_run: self.dry_run,
            verbose: self.verbose && !self.json,
            quiet: self.json,
        }
    }
}

/// Runs a sort as described by the command line.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use dirsort::cli::{Cli, run_cli};
/// use dirsort::walker::new_cancel_flag;
///
/// let cli = Cli::parse_from(["dirsort", "/path/to/folder", "--dry-run"]);
/// match run_cli(&cli, new_cancel_flag()) {
///     Ok(summary) => println!("{} files", summary.total_files()),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(cli: &Cli, cancel: CancelFlag) -> Result<Summary, String> {
    let config = SortConfig::load(cli.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let mapper = config
        .file_mapper()
        .map_err(|e| format!("Error in configuration: {}", e))?;
    let filters = config
        .compile_filters()
        .map_err(|e| format!("Error compiling filters: {}", e))?;
    let options = cli.sort_options(&config);

    if !cli.json {
        if cli.dry_run {
            OutputFormatter::dry_run_notice(&format!(
                "Analyzing contents of: {}",
                cli.source.display()
            ));
        } else {
            OutputFormatter::info(&format!("Sorting contents of: {}", cli.source.display()));
        }
    }

    let mut sorter = Sorter::new(&cli.source, &mapper, &filters, options).with_cancel_flag(cancel);
    if !cli.json {
        sorter = sorter.with_progress(OutputFormatter::create_spinner());
    }
    let summary = sorter.run().map_err(|e| e.to_string())?;

    if cli.json {
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| format!("Could not serialize report: {}", e))?;
        println!("{}", json);
        return Ok(summary);
    }

    OutputFormatter::run_report(&summary);

    if summary.cancelled {
        OutputFormatter::warning("Interrupted: some entries were not visited.");
    }
    if summary.dry_run {
        OutputFormatter::dry_run_notice("Nothing was changed.");
        OutputFormatter::plain(&format!(
            "Run 'dirsort {}' (without --dry-run) to sort it.",
            cli.source.display()
        ));
    } else if summary.has_errors() {
        OutputFormatter::warning("Some files could not be sorted. Please review the problems above.");
    } else {
        OutputFormatter::success("Files are sorted.");
    }

    Ok(summary)
}
