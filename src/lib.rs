//! dirsort - recursive folder sorting
//!
//! Walks a folder, normalizes every file name (transliterating Cyrillic to
//! Latin), moves files into category directories at the top of the folder,
//! unpacks zip archives, and removes directories left empty afterwards.

pub mod archive;
pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod normalize;
pub mod output;
pub mod prune;
pub mod report;
pub mod walker;

pub use config::{CompiledFilters, ConfigError, SortConfig};
pub use file_category::{Category, FileMapper};
pub use file_organizer::{FileOrganizer, OrganizeError, OrganizeResult, Relocation};
pub use normalize::normalize;
pub use report::{RunReport, Summary};
pub use walker::{CancelFlag, SortOptions, Sorter};

pub use cli::{Cli, run_cli};
