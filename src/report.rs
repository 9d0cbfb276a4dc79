//! Run report.
//!
//! A [`RunReport`] is threaded through the walk and collects what happened to
//! every visited file. [`RunReport::finalize`] turns it into a [`Summary`] that
//! is printed (or serialized) once at the end of the run.

use crate::file_category::Category;
use crate::file_organizer::{OrganizeError, Relocation};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// The kind of problem a diagnostic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A file with an archive extension is not a valid zip.
    ArchiveIntegrity,
    /// A filesystem operation failed.
    Io,
}

/// A per-entry problem that did not stop the run.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub path: PathBuf,
    pub message: String,
}

impl From<&OrganizeError> for Diagnostic {
    fn from(error: &OrganizeError) -> Self {
        let kind = match error {
            OrganizeError::ArchiveIntegrity { .. } => DiagnosticKind::ArchiveIntegrity,
            _ => DiagnosticKind::Io,
        };
        Self {
            kind,
            path: error.path().to_path_buf(),
            message: error.to_string(),
        }
    }
}

/// An archive that was unpacked.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub archive: PathBuf,
    pub folder: PathBuf,
    pub entries: usize,
}

/// Accumulates the outcome of a run.
#[derive(Debug, Default)]
pub struct RunReport {
    files: BTreeMap<Category, Vec<String>>,
    known_categories: BTreeSet<Category>,
    unknown_extensions: BTreeSet<String>,
    relocations: Vec<Relocation>,
    extractions: Vec<Extraction>,
    removed_reserved_dirs: Vec<PathBuf>,
    diagnostics: Vec<Diagnostic>,
    pruned_dirs: usize,
    cancelled: bool,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a file with `original_name` was sorted into `category`.
    ///
    /// Files in [`Category::Other`] also record their extension as unknown.
    pub fn record(&mut self, category: Category, original_name: &str) {
        self.files
            .entry(category)
            .or_default()
            .push(original_name.to_string());

        if category == Category::Other {
            let ext = crate::file_category::extension_of(original_name);
            if !ext.is_empty() {
                self.unknown_extensions.insert(ext);
            }
        } else {
            self.known_categories.insert(category);
        }
    }

    pub fn record_relocation(&mut self, relocation: Relocation) {
        self.relocations.push(relocation);
    }

    pub fn record_extraction(&mut self, extraction: Extraction) {
        self.extractions.push(extraction);
    }

    pub fn record_removed_reserved_dir(&mut self, path: PathBuf) {
        self.removed_reserved_dirs.push(path);
    }

    pub fn diagnose(&mut self, error: &OrganizeError) {
        self.diagnostics.push(Diagnostic::from(error));
    }

    pub fn add_pruned(&mut self, count: usize) {
        self.pruned_dirs += count;
    }

    pub fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    /// Consumes the report and produces the final summary.
    pub fn finalize(self, dry_run: bool) -> Summary {
        Summary {
            dry_run,
            cancelled: self.cancelled,
            files: self.files,
            known_categories: self.known_categories,
            unknown_extensions: self.unknown_extensions,
            relocations: self.relocations,
            extracted_archives: self.extractions,
            removed_reserved_dirs: self.removed_reserved_dirs,
            pruned_dirs: self.pruned_dirs,
            diagnostics: self.diagnostics,
        }
    }
}

/// Final, read-only outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub dry_run: bool,
    pub cancelled: bool,
    /// Original file names per category, in processing order.
    pub files: BTreeMap<Category, Vec<String>>,
    /// Categories other than `other` that received at least one file.
    pub known_categories: BTreeSet<Category>,
    /// Lowercase extensions of files that fell into `other`.
    pub unknown_extensions: BTreeSet<String>,
    pub relocations: Vec<Relocation>,
    pub extracted_archives: Vec<Extraction>,
    pub removed_reserved_dirs: Vec<PathBuf>,
    pub pruned_dirs: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl Summary {
    /// Original names sorted into `category`.
    pub fn files_in(&self, category: Category) -> &[String] {
        self.files.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_files(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    /// File counts by category directory name, in report order, skipping empty categories.
    pub fn category_counts(&self) -> Vec<(&'static str, usize)> {
        self.files
            .iter()
            .filter(|(_, names)| !names.is_empty())
            .map(|(category, names)| (category.dir_name(), names.len()))
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}
