//! Recursive directory sorting.
//!
//! [`plan_entry`] decides, without touching the disk, what should happen to a
//! single directory entry. [`Sorter`] walks the tree depth-first and carries out
//! those decisions, collecting everything into a [`RunReport`].
//!
//! Category directories are created directly under the root. Each directory's
//! listing is read completely before anything in it is changed, and
//! reserved-named subdirectories are handled before any other entry, so the
//! walk never observes directories it created itself.

use crate::archive::{self, ArchiveOutcome, InvalidArchivePolicy, InvalidDisposition};
use crate::config::CompiledFilters;
use crate::file_category::{Category, FileMapper, is_reserved_dir_name};
use crate::file_organizer::{FileOrganizer, OrganizeError, OrganizeResult, Relocation};
use crate::normalize::normalize;
use crate::output::OutputFormatter;
use crate::prune::prune_empty_dirs;
use crate::report::{Extraction, RunReport, Summary};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag that asks a running walk to stop before its next entry.
pub type CancelFlag = Arc<AtomicBool>;

/// Creates a cancel flag that is not yet set.
pub fn new_cancel_flag() -> CancelFlag {
    Arc::new(AtomicBool::new(false))
}

/// What to do with a subdirectory named like a category directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservedDirPolicy {
    /// Delete the directory and everything in it.
    #[default]
    Delete,
    /// Leave it untouched and do not descend into it.
    Skip,
}

/// Knobs for a single run.
#[derive(Debug, Clone)]
pub struct SortOptions {
    pub reserved_dirs: ReservedDirPolicy,
    pub invalid_archives: InvalidArchivePolicy,
    pub prune_empty_dirs: bool,
    /// Decide and report, but change nothing on disk.
    pub dry_run: bool,
    /// Print every move and extraction as it happens.
    pub verbose: bool,
    /// Print nothing while walking.
    pub quiet: bool,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            reserved_dirs: ReservedDirPolicy::default(),
            invalid_archives: InvalidArchivePolicy::default(),
            prune_empty_dirs: true,
            dry_run: false,
            verbose: false,
            quiet: false,
        }
    }
}

/// The type of a directory entry, without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Symlinks, sockets, devices and anything else.
    Other,
}

impl From<fs::FileType> for EntryKind {
    fn from(file_type: fs::FileType) -> Self {
        if file_type.is_file() {
            EntryKind::File
        } else if file_type.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::Other
        }
    }
}

/// What should happen to one directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Move the file into its category directory under the normalized name.
    Relocate {
        category: Category,
        normalized: String,
    },
    /// Treat the file as an archive job.
    Extract { normalized: String },
    /// Sort the subdirectory's contents.
    Descend,
    /// A subdirectory named like a category directory.
    Reserved,
    /// Leave the entry alone.
    Skip,
}

/// Decides what to do with an entry called `name`.
///
/// The reserved-name check comes first, so a directory named like a category
/// is never descended into.
///
/// # Examples
///
/// ```
/// use dirsort::file_category::{Category, FileMapper};
/// use dirsort::walker::{Action, EntryKind, plan_entry};
///
/// let mapper = FileMapper::default();
/// assert_eq!(plan_entry("documents", EntryKind::Dir, &mapper), Action::Reserved);
/// assert_eq!(plan_entry("inbox", EntryKind::Dir, &mapper), Action::Descend);
/// assert_eq!(
///     plan_entry("Фото.JPG", EntryKind::File, &mapper),
///     Action::Relocate { category: Category::Image, normalized: "Foto.JPG".to_string() }
/// );
/// ```
pub fn plan_entry(name: &str, kind: EntryKind, mapper: &FileMapper) -> Action {
    if kind == EntryKind::Dir && is_reserved_dir_name(name) {
        return Action::Reserved;
    }

    match kind {
        EntryKind::Dir => Action::Descend,
        EntryKind::Other => Action::Skip,
        EntryKind::File => {
            let normalized = normalize(name);
            match mapper.classify_name(name) {
                Category::Archive => Action::Extract { normalized },
                category => Action::Relocate {
                    category,
                    normalized,
                },
            }
        }
    }
}

struct Entry {
    file_name: OsString,
    name: String,
    path: PathBuf,
    kind: EntryKind,
}

impl Entry {
    fn is_reserved_dir(&self) -> bool {
        self.kind == EntryKind::Dir && is_reserved_dir_name(&self.name)
    }
}

/// Reads a whole directory listing, reserved directories first, then by name.
///
/// Entries that cannot be read are left out and reported.
fn read_entries(dir: &Path, report: &mut RunReport) -> OrganizeResult<Vec<Entry>> {
    let listing = fs::read_dir(dir).map_err(|e| OrganizeError::ReadDirFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let results = listing.map(|entry| {
        entry.map(|entry| {
            let kind = entry
                .file_type()
                .map(EntryKind::from)
                .unwrap_or(EntryKind::Other);
            let file_name = entry.file_name();
            Entry {
                name: file_name.to_string_lossy().into_owned(),
                file_name,
                path: entry.path(),
                kind,
            }
        })
    });
    Ok(order_entries(dir, results, report))
}

fn order_entries(
    dir: &Path,
    results: impl IntoIterator<Item = io::Result<Entry>>,
    report: &mut RunReport,
) -> Vec<Entry> {
    let mut entries = Vec::new();
    for result in results {
        match result {
            Ok(entry) => entries.push(entry),
            Err(e) => report.diagnose(&OrganizeError::ReadDirFailed {
                path: dir.to_path_buf(),
                source: e,
            }),
        }
    }

    entries.sort_by(|a, b| {
        b.is_reserved_dir()
            .cmp(&a.is_reserved_dir())
            .then_with(|| a.file_name.cmp(&b.file_name))
    });
    entries
}

/// Sorts one directory tree.
///
/// # Examples
///
/// ```no_run
/// use dirsort::config::CompiledFilters;
/// use dirsort::file_category::FileMapper;
/// use dirsort::walker::{SortOptions, Sorter};
/// use std::path::Path;
///
/// let mapper = FileMapper::default();
/// let filters = CompiledFilters::default();
/// let summary = Sorter::new(Path::new("/home/me/Downloads"), &mapper, &filters, SortOptions::default())
///     .run()
///     .expect("root is readable");
/// println!("{} files sorted", summary.total_files());
/// ```
pub struct Sorter<'a> {
    root: PathBuf,
    mapper: &'a FileMapper,
    filters: &'a CompiledFilters,
    options: SortOptions,
    cancel: CancelFlag,
    progress: ProgressBar,
    /// Destinations handed out during a dry run.
    planned: HashSet<PathBuf>,
    /// Reserved directories a dry run would have deleted.
    doomed: Vec<PathBuf>,
}

impl<'a> Sorter<'a> {
    pub fn new(
        root: &Path,
        mapper: &'a FileMapper,
        filters: &'a CompiledFilters,
        options: SortOptions,
    ) -> Self {
        Self {
            root: root.to_path_buf(),
            mapper,
            filters,
            options,
            cancel: new_cancel_flag(),
            progress: ProgressBar::hidden(),
            planned: HashSet::new(),
            doomed: Vec::new(),
        }
    }

    /// Uses `cancel` to stop the walk early.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Ticks `progress` once per visited entry.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Sorts the tree, then prunes empty directories.
    ///
    /// # Errors
    ///
    /// Fails only if the root is not a readable directory. Problems with
    /// individual entries end up in [`Summary::diagnostics`].
    pub fn run(mut self) -> OrganizeResult<Summary> {
        let root = self.root.clone();
        let metadata = fs::metadata(&root).map_err(|e| OrganizeError::InvalidBasePath {
            path: root.clone(),
            source: e,
        })?;
        if !metadata.is_dir() {
            return Err(OrganizeError::InvalidBasePath {
                path: root,
                source: io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
            });
        }

        let mut report = RunReport::new();
        self.visit(&root, &mut report)?;

        if !self.options.dry_run && self.options.prune_empty_dirs {
            report.add_pruned(prune_empty_dirs(&root));
        }

        self.progress.finish_and_clear();
        Ok(report.finalize(self.options.dry_run))
    }

    fn visit(&mut self, dir: &Path, report: &mut RunReport) -> OrganizeResult<()> {
        for entry in read_entries(dir, report)? {
            if self.cancel.load(Ordering::SeqCst) {
                report.mark_cancelled();
                return Ok(());
            }
            self.progress.set_message(entry.name.clone());
            self.progress.tick();

            let mut action = plan_entry(&entry.name, entry.kind, self.mapper);
            if matches!(action, Action::Relocate { .. } | Action::Extract { .. })
                && !self.is_included(&entry.path)
            {
                action = Action::Skip;
            }

            self.execute(&entry, action, report);
        }
        Ok(())
    }

    fn is_included(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        self.filters.should_include(relative)
    }

    fn execute(&mut self, entry: &Entry, action: Action, report: &mut RunReport) {
        match action {
            Action::Relocate {
                category,
                normalized,
            } => {
                report.record(category, &entry.name);
                self.relocate(&entry.path, category, &normalized, report);
            }
            Action::Extract { normalized } => {
                report.record(Category::Archive, &entry.name);
                self.extract(&entry.path, &normalized, report);
            }
            Action::Descend => {
                if let Err(e) = self.visit(&entry.path, report) {
                    self.fail(report, &e);
                }
            }
            Action::Reserved => self.handle_reserved(&entry.path, report),
            Action::Skip => {}
        }
    }

    fn relocate(
        &mut self,
        path: &Path,
        category: Category,
        normalized: &str,
        report: &mut RunReport,
    ) {
        if self.options.dry_run {
            if let Err(e) = self.check_category_dir(category) {
                self.fail(report, &e);
                return;
            }
            let category_dir = FileOrganizer::category_path(&self.root, category);
            let to = self.plan_destination(&category_dir, normalized);
            self.say(|| {
                OutputFormatter::dry_run_notice(&format!(
                    "{} → {}",
                    path.display(),
                    to.display()
                ))
            });
            report.record_relocation(Relocation {
                from: path.to_path_buf(),
                to,
                category,
            });
            return;
        }

        match FileOrganizer::relocate(&self.root, path, category, normalized) {
            Ok(relocation) => {
                if self.options.verbose {
                    self.say(|| {
                        OutputFormatter::success(&format!(
                            "{} → {}",
                            relocation.from.display(),
                            relocation.to.display()
                        ))
                    });
                }
                report.record_relocation(relocation);
            }
            Err(e) => self.fail(report, &e),
        }
    }

    fn extract(&mut self, path: &Path, normalized: &str, report: &mut RunReport) {
        if self.options.dry_run {
            self.plan_extraction(path, normalized, report);
            return;
        }

        match archive::extract_archive(&self.root, path, normalized, self.options.invalid_archives)
        {
            Ok(ArchiveOutcome::Extracted {
                archive,
                folder,
                entries,
            }) => {
                if self.options.verbose {
                    self.say(|| {
                        OutputFormatter::success(&format!(
                            "{} unpacked into {} ({} entries)",
                            archive.display(),
                            folder.display(),
                            entries
                        ))
                    });
                }
                report.record_extraction(Extraction {
                    archive,
                    folder,
                    entries,
                });
            }
            Ok(ArchiveOutcome::Invalid { error, disposition }) => {
                report.diagnose(&error);
                self.say(|| OutputFormatter::warning(&error.to_string()));
                match disposition {
                    Ok(InvalidDisposition::Kept(relocation)) => report.record_relocation(relocation),
                    Ok(InvalidDisposition::Deleted) => {}
                    Err(e) => self.fail(report, &e),
                }
            }
            Err(e) => self.fail(report, &e),
        }
    }

    fn plan_extraction(&mut self, path: &Path, normalized: &str, report: &mut RunReport) {
        let archives_dir = FileOrganizer::category_path(&self.root, Category::Archive);
        match archive::probe(path) {
            Ok(entries) => {
                if let Err(e) = self.check_category_dir(Category::Archive) {
                    self.fail(report, &e);
                    return;
                }
                let folder = self.plan_destination(&archives_dir, archive::folder_name(normalized));
                self.say(|| {
                    OutputFormatter::dry_run_notice(&format!(
                        "{} would be unpacked into {}",
                        path.display(),
                        folder.display()
                    ))
                });
                report.record_extraction(Extraction {
                    archive: path.to_path_buf(),
                    folder,
                    entries,
                });
            }
            Err(error) => {
                report.diagnose(&error);
                self.say(|| OutputFormatter::warning(&error.to_string()));
                if self.options.invalid_archives == InvalidArchivePolicy::Keep {
                    if let Err(e) = self.check_category_dir(Category::Archive) {
                        self.fail(report, &e);
                        return;
                    }
                    let to = self.plan_destination(&archives_dir, normalized);
                    report.record_relocation(Relocation {
                        from: path.to_path_buf(),
                        to,
                        category: Category::Archive,
                    });
                }
            }
        }
    }

    fn handle_reserved(&mut self, path: &Path, report: &mut RunReport) {
        if FileOrganizer::is_sorter_output(path) {
            return;
        }

        match self.options.reserved_dirs {
            ReservedDirPolicy::Skip => {
                if self.options.verbose {
                    self.say(|| {
                        OutputFormatter::info(&format!(
                            "Leaving {} alone: it is named like a category directory",
                            path.display()
                        ))
                    });
                }
            }
            ReservedDirPolicy::Delete if self.options.dry_run => {
                self.say(|| {
                    OutputFormatter::dry_run_notice(&format!(
                        "{} would be removed: it is named like a category directory",
                        path.display()
                    ))
                });
                self.doomed.push(path.to_path_buf());
                report.record_removed_reserved_dir(path.to_path_buf());
            }
            ReservedDirPolicy::Delete => match FileOrganizer::remove_tree(path) {
                Ok(()) => {
                    self.say(|| {
                        OutputFormatter::warning(&format!(
                            "Removed {}: it is named like a category directory",
                            path.display()
                        ))
                    });
                    report.record_removed_reserved_dir(path.to_path_buf());
                }
                Err(e) => self.fail(report, &e),
            },
        }
    }

    /// Dry-run counterpart of [`FileOrganizer::ensure_category_dir`]: fails for an
    /// existing category directory without the output marker that is not about
    /// to be deleted.
    fn check_category_dir(&self, category: Category) -> OrganizeResult<()> {
        let path = FileOrganizer::category_path(&self.root, category);
        if path.is_dir() && !FileOrganizer::is_sorter_output(&path) && !self.doomed.contains(&path)
        {
            return Err(OrganizeError::NotSorterOutput { path });
        }
        Ok(())
    }

    /// Picks a free destination, counting destinations already planned in this run.
    ///
    /// Paths inside reserved directories that would have been deleted count as free.
    fn plan_destination(&mut self, dir: &Path, name: &str) -> PathBuf {
        let planned = &self.planned;
        let doomed = &self.doomed;
        let destination = FileOrganizer::unique_destination(dir, name, |p| {
            planned.contains(p)
                || (!doomed.iter().any(|d| p.starts_with(d)) && p.symlink_metadata().is_ok())
        });
        self.planned.insert(destination.clone());
        destination
    }

    fn fail(&self, report: &mut RunReport, error: &OrganizeError) {
        report.diagnose(error);
        self.say(|| OutputFormatter::error(&error.to_string()));
    }

    /// Prints through `print` unless quiet, keeping the spinner intact.
    fn say(&self, print: impl FnOnce()) {
        if !self.options.quiet {
            self.progress.suspend(print);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_organizer::OUTPUT_MARKER;
    use crate::report::DiagnosticKind;
    use std::io::Write;
    use tempfile::TempDir;

    fn quiet() -> SortOptions {
        SortOptions {
            quiet: true,
            ..SortOptions::default()
        }
    }

    fn sort(root: &Path, options: SortOptions) -> Summary {
        let mapper = FileMapper::default();
        let filters = CompiledFilters::default();
        Sorter::new(root, &mapper, &filters, options)
            .run()
            .expect("Sorting failed")
    }

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent");
        }
        fs::write(path, content).expect("Failed to write file");
    }

    fn write_zip(path: &Path, name: &str, content: &str) {
        let file = fs::File::create(path).expect("Failed to create zip");
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file(name, zip::write::SimpleFileOptions::default())
            .expect("Failed to start entry");
        zip.write_all(content.as_bytes()).expect("Failed to write entry");
        zip.finish().expect("Failed to finish zip");
    }

    #[test]
    fn test_plan_entry_reserved_check_precedes_descend() {
        let mapper = FileMapper::default();
        for category in Category::ALL {
            assert_eq!(
                plan_entry(category.dir_name(), EntryKind::Dir, &mapper),
                Action::Reserved
            );
        }
        assert_eq!(plan_entry("image", EntryKind::Dir, &mapper), Action::Descend);
    }

    #[test]
    fn test_plan_entry_file_named_like_category_is_sorted() {
        let mapper = FileMapper::default();
        assert_eq!(
            plan_entry("documents", EntryKind::File, &mapper),
            Action::Relocate {
                category: Category::Other,
                normalized: "documents".to_string()
            }
        );
    }

    #[test]
    fn test_plan_entry_archives_and_specials() {
        let mapper = FileMapper::default();
        assert_eq!(
            plan_entry("Архів.ZIP", EntryKind::File, &mapper),
            Action::Extract {
                normalized: "Arhiv.ZIP".to_string()
            }
        );
        assert_eq!(plan_entry("link.txt", EntryKind::Other, &mapper), Action::Skip);
    }

    #[test]
    fn test_sorts_nested_tree_into_root_categories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write(&root.join("photo.JPG"), "img");
        write(&root.join("inbox").join("deep").join("Пісня.mp3"), "mp3");
        write(&root.join("inbox").join("notes.txt"), "txt");

        let summary = sort(root, quiet());

        assert!(root.join("images").join("photo.JPG").is_file());
        assert!(root.join("audio").join("Pisnja.mp3").is_file());
        assert!(root.join("documents").join("notes.txt").is_file());
        assert!(!root.join("inbox").exists(), "emptied tree should be pruned");
        assert_eq!(summary.total_files(), 3);
        assert_eq!(summary.files_in(Category::Audio), ["Пісня.mp3"]);
        assert_eq!(summary.pruned_dirs, 2);
        assert!(summary.diagnostics.is_empty());
    }

    #[test]
    fn test_reserved_dir_is_deleted_before_files_are_moved() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write(&root.join("a.txt"), "mine");
        write(&root.join("documents").join("unrelated.bin"), "theirs");

        let summary = sort(root, quiet());

        assert!(root.join("documents").join("a.txt").is_file());
        assert!(!root.join("documents").join("unrelated.bin").exists());
        assert_eq!(summary.removed_reserved_dirs, vec![root.join("documents")]);
    }

    #[test]
    fn test_reserved_dir_skip_policy_keeps_contents() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write(&root.join("sub").join("video").join("clip.mp4"), "mp4");

        let summary = sort(
            root,
            SortOptions {
                reserved_dirs: ReservedDirPolicy::Skip,
                ..quiet()
            },
        );

        assert!(root.join("sub").join("video").join("clip.mp4").is_file());
        assert!(summary.removed_reserved_dirs.is_empty());
        assert_eq!(summary.total_files(), 0);
    }

    #[test]
    fn test_second_run_adopts_previous_output() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write(&root.join("first.pdf"), "1");
        sort(root, quiet());
        assert!(root.join("documents").join(OUTPUT_MARKER).is_file());

        write(&root.join("second.pdf"), "2");
        let summary = sort(root, quiet());

        assert!(root.join("documents").join("first.pdf").is_file());
        assert!(root.join("documents").join("second.pdf").is_file());
        assert!(summary.removed_reserved_dirs.is_empty());
        assert_eq!(summary.files_in(Category::Document), ["second.pdf"]);
    }

    #[test]
    fn test_collisions_get_numeric_suffix() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write(&root.join("a").join("report.pdf"), "a");
        write(&root.join("b").join("report.pdf"), "b");

        let summary = sort(root, quiet());

        let documents = root.join("documents");
        assert_eq!(fs::read_to_string(documents.join("report.pdf")).expect("read"), "a");
        assert_eq!(fs::read_to_string(documents.join("report_1.pdf")).expect("read"), "b");
        assert_eq!(summary.relocations.len(), 2);
    }

    #[test]
    fn test_zip_is_extracted_and_invalid_archive_reported() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write_zip(&root.join("bundle.zip"), "inside.txt", "hello");
        write(&root.join("data.tar"), "not a zip");

        let summary = sort(root, quiet());

        assert!(root.join("archives").join("bundle").join("inside.txt").is_file());
        assert!(!root.join("bundle.zip").exists());
        assert!(!root.join("data.tar").exists());
        assert!(!root.join("archives").join("data").exists());
        assert_eq!(summary.extracted_archives.len(), 1);
        assert_eq!(summary.diagnostics.len(), 1);
        assert_eq!(summary.diagnostics[0].kind, DiagnosticKind::ArchiveIntegrity);
        assert!(summary.diagnostics[0].message.contains("data.tar"));
        assert_eq!(
            summary.files_in(Category::Archive),
            ["bundle.zip", "data.tar"]
        );
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write(&root.join("x").join("song.ogg"), "ogg");
        write(&root.join("y").join("song.ogg"), "ogg");
        write(&root.join("z").join("others").join("keep.me"), "keep");

        let summary = sort(
            root,
            SortOptions {
                dry_run: true,
                ..quiet()
            },
        );

        assert!(summary.dry_run);
        assert!(root.join("x").join("song.ogg").is_file());
        assert!(root.join("z").join("others").join("keep.me").is_file());
        assert!(!root.join("audio").exists());
        let destinations: Vec<_> = summary.relocations.iter().map(|r| r.to.clone()).collect();
        assert_eq!(
            destinations,
            vec![
                root.join("audio").join("song.ogg"),
                root.join("audio").join("song_1.ogg")
            ]
        );
        assert_eq!(summary.removed_reserved_dirs.len(), 1);
    }

    #[test]
    fn test_dry_run_ignores_contents_of_doomed_reserved_dir() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write(&root.join("documents").join("notes.txt"), "old");
        write(&root.join("inbox").join("notes.txt"), "new");

        let summary = sort(
            root,
            SortOptions {
                dry_run: true,
                ..quiet()
            },
        );

        assert_eq!(
            summary.relocations[0].to,
            root.join("documents").join("notes.txt")
        );
    }

    #[test]
    fn test_skip_policy_leaves_user_category_dir_alone() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write(&root.join("documents").join("mine.bin"), "mine");
        write(&root.join("a.txt"), "a");
        let skip = SortOptions {
            reserved_dirs: ReservedDirPolicy::Skip,
            ..quiet()
        };

        let planned = sort(
            root,
            SortOptions {
                dry_run: true,
                ..skip.clone()
            },
        );
        let summary = sort(root, skip);

        for summary in [&planned, &summary] {
            assert!(summary.relocations.is_empty());
            assert_eq!(summary.diagnostics.len(), 1);
            assert_eq!(summary.diagnostics[0].kind, DiagnosticKind::Io);
            assert_eq!(summary.diagnostics[0].path, root.join("documents"));
        }
        let mut names: Vec<_> = fs::read_dir(root.join("documents"))
            .expect("read documents")
            .map(|e| e.expect("entry").file_name())
            .collect();
        names.sort();
        assert_eq!(names, vec![OsString::from("mine.bin")]);
        assert!(root.join("a.txt").is_file());
    }

    #[test]
    fn test_name_that_normalizes_to_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write(&root.join("Ь"), "soft sign");

        let planned = sort(
            root,
            SortOptions {
                dry_run: true,
                ..quiet()
            },
        );
        let summary = sort(root, quiet());

        let expected = root.join("others").join("_");
        assert_eq!(planned.relocations[0].to, expected);
        assert_eq!(summary.relocations[0].to, expected);
        assert!(expected.is_file());
    }

    #[test]
    fn test_failed_extraction_leaves_archive_and_walk_continues() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("root");
        write(&root.join("a.txt"), "a");
        let archive_path = root.join("evil.zip");
        let file = fs::File::create(&archive_path).expect("Failed to create zip");
        let mut zip = zip::ZipWriter::new(file);
        for (name, content) in [("ok.txt", "fine"), ("../../../escaped.txt", "out")] {
            zip.start_file(name, zip::write::SimpleFileOptions::default())
                .expect("Failed to start entry");
            zip.write_all(content.as_bytes()).expect("Failed to write entry");
        }
        zip.finish().expect("Failed to finish zip");

        let summary = sort(&root, quiet());

        assert_eq!(summary.diagnostics.len(), 1);
        assert_eq!(summary.diagnostics[0].kind, DiagnosticKind::Io);
        assert_eq!(summary.diagnostics[0].path, archive_path);
        assert!(archive_path.is_file());
        assert!(!temp_dir.path().join("escaped.txt").exists());
        assert!(!root.join("escaped.txt").exists());
        assert!(root.join("documents").join("a.txt").is_file());
        assert!(summary.extracted_archives.is_empty());
    }

    #[test]
    fn test_invalid_archive_reported_even_when_it_cannot_be_moved() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write(&root.join("archives").join("old.bin"), "user data");
        write(&root.join("data.tar"), "not a zip");

        let summary = sort(
            root,
            SortOptions {
                reserved_dirs: ReservedDirPolicy::Skip,
                ..quiet()
            },
        );

        let kinds: Vec<_> = summary.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DiagnosticKind::ArchiveIntegrity, DiagnosticKind::Io]);
        assert!(root.join("data.tar").is_file());
    }

    #[test]
    fn test_unreadable_entry_does_not_drop_its_siblings() {
        let dir = Path::new("/data");
        let entry = |name: &str, kind| {
            Ok(Entry {
                file_name: OsString::from(name),
                name: name.to_string(),
                path: dir.join(name),
                kind,
            })
        };
        let results = vec![
            entry("b.txt", EntryKind::File),
            Err(io::Error::other("stale handle")),
            entry("images", EntryKind::Dir),
            entry("a.txt", EntryKind::File),
        ];

        let mut report = RunReport::new();
        let entries = order_entries(dir, results, &mut report);

        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["images", "a.txt", "b.txt"]);
        let summary = report.finalize(false);
        assert_eq!(summary.diagnostics.len(), 1);
        assert_eq!(summary.diagnostics[0].kind, DiagnosticKind::Io);
        assert_eq!(summary.diagnostics[0].path, dir);
    }

    #[test]
    fn test_cancelled_run_stops_early() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write(&root.join("a.txt"), "a");

        let mapper = FileMapper::default();
        let filters = CompiledFilters::default();
        let cancel = new_cancel_flag();
        cancel.store(true, Ordering::SeqCst);
        let summary = Sorter::new(root, &mapper, &filters, quiet())
            .with_cancel_flag(cancel)
            .run()
            .expect("Sorting failed");

        assert!(summary.cancelled);
        assert!(root.join("a.txt").is_file());
        assert_eq!(summary.total_files(), 0);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mapper = FileMapper::default();
        let filters = CompiledFilters::default();
        let result = Sorter::new(&temp_dir.path().join("nope"), &mapper, &filters, quiet()).run();
        assert!(matches!(result, Err(OrganizeError::InvalidBasePath { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_not_followed() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        write(&root.join("real").join("keep.txt"), "x");
        std::os::unix::fs::symlink(root, root.join("real").join("loop"))
            .expect("Failed to create symlink");

        let summary = sort(root, quiet());

        assert_eq!(summary.total_files(), 1);
        assert!(root.join("documents").join("keep.txt").is_file());
        assert!(
            root.join("real")
                .join("loop")
                .symlink_metadata()
                .is_ok()
        );
    }
}
