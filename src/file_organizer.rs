/// Moving files into category directories.
///
/// Category directories live directly under the run root. Each one the sorter
/// creates carries an empty [`OUTPUT_MARKER`] file so later runs can tell prior
/// output apart from a user folder that merely shares the name.
use crate::file_category::Category;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Name of the marker file placed in every category directory the sorter creates.
pub const OUTPUT_MARKER: &str = ".dirsort";

/// A single file moved into a category directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relocation {
    /// Where the file was before the move.
    pub from: PathBuf,
    /// Where the file is now.
    pub to: PathBuf,
    /// The category it was sorted into.
    pub category: Category,
}

/// Errors that can occur while sorting a tree.
#[derive(Debug)]
pub enum OrganizeError {
    /// Failed to create a category or extraction directory.
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// Failed to move a file to its category directory.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: io::Error,
    },
    /// Failed to remove a file or directory tree.
    RemoveFailed { path: PathBuf, source: io::Error },
    /// Failed to list a directory.
    ReadDirFailed { path: PathBuf, source: io::Error },
    /// A category directory exists but was not created by the sorter.
    NotSorterOutput { path: PathBuf },
    /// The root directory path is invalid or doesn't exist.
    InvalidBasePath { path: PathBuf, source: io::Error },
    /// A file with an archive extension is not a readable zip archive.
    ArchiveIntegrity {
        path: PathBuf,
        reason: String,
        detected_mime: Option<String>,
    },
    /// A valid zip archive could not be fully extracted.
    ExtractionFailed {
        path: PathBuf,
        destination: PathBuf,
        source: zip::result::ZipError,
    },
}

impl OrganizeError {
    /// The path the error is about.
    pub fn path(&self) -> &Path {
        match self {
            Self::DirectoryCreationFailed { path, .. }
            | Self::RemoveFailed { path, .. }
            | Self::ReadDirFailed { path, .. }
            | Self::NotSorterOutput { path }
            | Self::InvalidBasePath { path, .. }
            | Self::ArchiveIntegrity { path, .. }
            | Self::ExtractionFailed { path, .. } => path,
            Self::FileMoveFailure { source, .. } => source,
        }
    }
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectoryCreationFailed { path, source } => {
                write!(f, "cannot create {}: {}", path.display(), source)
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => write!(
                f,
                "cannot move {} → {}: {}",
                source.display(),
                destination.display(),
                source_error
            ),
            Self::RemoveFailed { path, source } => {
                write!(f, "cannot remove {}: {}", path.display(), source)
            }
            Self::ReadDirFailed { path, source } => {
                write!(f, "cannot list {}: {}", path.display(), source)
            }
            Self::NotSorterOutput { path } => write!(
                f,
                "{} already exists and was not made by dirsort; leaving its files unsorted",
                path.display()
            ),
            Self::InvalidBasePath { path, source } => {
                write!(f, "{} is not a folder that can be sorted: {}", path.display(), source)
            }
            Self::ArchiveIntegrity {
                path,
                reason,
                detected_mime,
            } => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_else(|| path.as_os_str().to_string_lossy());
                write!(f, "{} is not a zip archive ({})", name, reason)?;
                match detected_mime {
                    Some(mime) => write!(f, "; content looks like {}", mime),
                    None => Ok(()),
                }
            }
            Self::ExtractionFailed {
                path,
                destination,
                source,
            } => write!(
                f,
                "unpacking {} into {} failed: {}",
                path.display(),
                destination.display(),
                source
            ),
        }
    }
}

impl std::error::Error for OrganizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DirectoryCreationFailed { source, .. }
            | Self::RemoveFailed { source, .. }
            | Self::ReadDirFailed { source, .. }
            | Self::InvalidBasePath { source, .. } => Some(source),
            Self::FileMoveFailure { source_error, .. } => Some(source_error),
            Self::ExtractionFailed { source, .. } => Some(source),
            Self::ArchiveIntegrity { .. } | Self::NotSorterOutput { .. } => None,
        }
    }
}

pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Creates category directories and moves files into them.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Returns the directory a category is sorted into under `root`.
    pub fn category_path(root: &Path, category: Category) -> PathBuf {
        root.join(category.dir_name())
    }

    /// Returns true if `dir` was created by a previous run of the sorter.
    pub fn is_sorter_output(dir: &Path) -> bool {
        dir.join(OUTPUT_MARKER).is_file()
    }

    /// Ensures the category directory exists under `root` and carries the output marker.
    ///
    /// A directory created here, or by an earlier run, is reused. An existing
    /// directory without the marker belongs to the user and is never adopted:
    /// that is [`OrganizeError::NotSorterOutput`].
    pub fn ensure_category_dir(root: &Path, category: Category) -> OrganizeResult<PathBuf> {
        let category_path = Self::category_path(root, category);
        let creation_failed = |e: io::Error| OrganizeError::DirectoryCreationFailed {
            path: category_path.clone(),
            source: e,
        };

        match fs::create_dir(&category_path) {
            Ok(()) => {
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(category_path.join(OUTPUT_MARKER))
                    .map_err(creation_failed)?;
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                if !category_path.is_dir() {
                    return Err(creation_failed(e));
                }
                if !Self::is_sorter_output(&category_path) {
                    return Err(OrganizeError::NotSorterOutput {
                        path: category_path.clone(),
                    });
                }
            }
            Err(e) => return Err(creation_failed(e)),
        }

        Ok(category_path)
    }

    /// Returns the first destination in `dir` for `name` that `is_taken` rejects.
    ///
    /// `report.pdf` becomes `report_1.pdf`, `report_2.pdf`, ... and
    /// `backup.tar.gz` becomes `backup_1.tar.gz`. The suffix goes before the
    /// first dot, since the extension chain is kept whole.
    pub fn unique_destination(
        dir: &Path,
        name: &str,
        is_taken: impl Fn(&Path) -> bool,
    ) -> PathBuf {
        let candidate = dir.join(name);
        if !is_taken(&candidate) {
            return candidate;
        }

        let (stem, rest) = match name.split_once('.') {
            Some((stem, ext)) => (stem, format!(".{}", ext)),
            None => (name, String::new()),
        };

        let mut counter: u32 = 1;
        loop {
            let candidate = dir.join(format!("{}_{}{}", stem, counter, rest));
            if !is_taken(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Moves a file into its category directory under `root`, renamed to `normalized_name`.
    ///
    /// The category directory is created if missing. If the destination name is
    /// already occupied, a numeric suffix is added (see [`Self::unique_destination`]).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsort::file_category::Category;
    /// use dirsort::file_organizer::FileOrganizer;
    /// use std::path::Path;
    ///
    /// let moved = FileOrganizer::relocate(
    ///     Path::new("/path/to/root"),
    ///     Path::new("/path/to/root/inbox/Фото.png"),
    ///     Category::Image,
    ///     "Foto.png",
    /// );
    ///
    /// match moved {
    ///     Ok(r) => println!("Moved to {}", r.to.display()),
    ///     Err(e) => eprintln!("Sorting failed: {}", e),
    /// }
    /// ```
    pub fn relocate(
        root: &Path,
        file_path: &Path,
        category: Category,
        normalized_name: &str,
    ) -> OrganizeResult<Relocation> {
        let category_path = Self::ensure_category_dir(root, category)?;
        let destination = Self::unique_destination(&category_path, normalized_name, |p| {
            p.symlink_metadata().is_ok()
        });

        move_file(file_path, &destination).map_err(|e| OrganizeError::FileMoveFailure {
            source: file_path.to_path_buf(),
            destination: destination.clone(),
            source_error: e,
        })?;

        Ok(Relocation {
            from: file_path.to_path_buf(),
            to: destination,
            category,
        })
    }

    /// Deletes a file.
    pub fn remove_file(path: &Path) -> OrganizeResult<()> {
        fs::remove_file(path).map_err(|e| OrganizeError::RemoveFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Deletes a directory and everything below it.
    pub fn remove_tree(path: &Path) -> OrganizeResult<()> {
        fs::remove_dir_all(path).map_err(|e| OrganizeError::RemoveFailed {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Renames `from` to `to`, falling back to copy and delete across filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
        Err(e) => Err(e),
    }
}
