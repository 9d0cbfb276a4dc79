//! Zip archive extraction.
//!
//! Files sorted into the archive category are unpacked into
//! `archives/<name without last extension>/` and the original is removed.
//! Only zip containers are unpacked; a `.gz` or `.tar` that is really a zip
//! works, anything else is reported as an integrity problem and handled
//! according to [`InvalidArchivePolicy`].

use crate::file_category::Category;
use crate::file_organizer::{FileOrganizer, OrganizeError, OrganizeResult, Relocation};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// What to do with a file that has an archive extension but is not a valid zip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidArchivePolicy {
    /// Move the file into `archives/` without extracting it.
    #[default]
    Keep,
    /// Delete the file.
    Delete,
}

/// What became of an invalid archive.
#[derive(Debug)]
pub enum InvalidDisposition {
    /// The file was moved into the archive category directory as-is.
    Kept(Relocation),
    /// The file was deleted.
    Deleted,
}

/// Result of handling one archive-category file.
#[derive(Debug)]
pub enum ArchiveOutcome {
    /// The archive was unpacked and the original removed.
    Extracted {
        archive: PathBuf,
        folder: PathBuf,
        entries: usize,
    },
    /// The file failed the zip check. `disposition` is the result of moving
    /// or deleting it, which can fail on its own.
    Invalid {
        error: OrganizeError,
        disposition: OrganizeResult<InvalidDisposition>,
    },
}

/// Returns the extraction folder name for a normalized archive name.
///
/// The last extension segment is dropped: `bundle.zip` → `bundle`,
/// `backup.tar.gz` → `backup.tar`.
pub fn folder_name(normalized_name: &str) -> &str {
    match normalized_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => normalized_name,
    }
}

/// Opens `path` as a zip archive, reporting why it is not one.
fn open_zip(path: &Path) -> OrganizeResult<ZipArchive<File>> {
    let integrity = |reason: String| OrganizeError::ArchiveIntegrity {
        path: path.to_path_buf(),
        reason,
        detected_mime: infer::get_from_path(path)
            .ok()
            .flatten()
            .map(|kind| kind.mime_type().to_string()),
    };

    let file = File::open(path).map_err(|e| integrity(e.to_string()))?;
    ZipArchive::new(file).map_err(|e| integrity(e.to_string()))
}

/// Checks that `path` is a readable zip archive and returns its entry count.
///
/// Reads the file only, used for dry runs.
pub fn probe(path: &Path) -> OrganizeResult<usize> {
    open_zip(path).map(|archive| archive.len())
}

/// Handles a file from the archive category.
///
/// A valid zip is unpacked under `archives/` in a folder named after the archive
/// (with a numeric suffix if that folder already exists), then deleted. If
/// unpacking fails partway the archive stays where it was and an
/// [`OrganizeError::ExtractionFailed`] is returned.
pub fn extract_archive(
    root: &Path,
    archive_path: &Path,
    normalized_name: &str,
    policy: InvalidArchivePolicy,
) -> OrganizeResult<ArchiveOutcome> {
    let mut archive = match open_zip(archive_path) {
        Ok(archive) => archive,
        Err(error) => {
            let disposition = match policy {
                InvalidArchivePolicy::Keep => {
                    FileOrganizer::relocate(root, archive_path, Category::Archive, normalized_name)
                        .map(InvalidDisposition::Kept)
                }
                InvalidArchivePolicy::Delete => {
                    FileOrganizer::remove_file(archive_path).map(|()| InvalidDisposition::Deleted)
                }
            };
            return Ok(ArchiveOutcome::Invalid { error, disposition });
        }
    };

    let archives_dir = FileOrganizer::ensure_category_dir(root, Category::Archive)?;
    let folder = FileOrganizer::unique_destination(
        &archives_dir,
        folder_name(normalized_name),
        |p| p.symlink_metadata().is_ok(),
    );

    fs::create_dir_all(&folder).map_err(|e| OrganizeError::DirectoryCreationFailed {
        path: folder.clone(),
        source: e,
    })?;

    let entries = archive.len();
    archive
        .extract(&folder)
        .map_err(|e| OrganizeError::ExtractionFailed {
            path: archive_path.to_path_buf(),
            destination: folder.clone(),
            source: e,
        })?;
    drop(archive);

    FileOrganizer::remove_file(archive_path)?;

    Ok(ArchiveOutcome::Extracted {
        archive: archive_path.to_path_buf(),
        folder,
        entries,
    })
}
