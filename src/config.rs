//! Optional TOML configuration.
//!
//! A typical `.dirsortrc.toml` for a downloads folder:
//!
//! ```toml
//! [filters.exclude]
//! filenames = ["desktop.ini"]
//! extensions = ["part", "crdownload"]
//! patterns = ["torrents/**"]
//!
//! [extensions]
//! image = ["webp", "heic"]
//! audio = ["flac"]
//!
//! [policy]
//! reserved_dirs = "skip"       # default "delete"
//! invalid_archives = "keep"    # or "delete"
//! prune_empty_dirs = true
//! ```
//!
//! Globs are matched against the path below the folder being sorted.

use crate::archive::InvalidArchivePolicy;
use crate::file_category::{Category, FileMapper};
use crate::walker::ReservedDirPolicy;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the current directory.
pub const LOCAL_CONFIG_NAME: &str = ".dirsortrc.toml";

/// Why a configuration could not be used.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    NotFound(PathBuf),
    /// The file could not be read.
    Read { path: PathBuf, reason: String },
    /// The text is not TOML, or does not fit the schema.
    Parse(String),
    /// A glob in `[filters]` does not compile.
    BadGlob(String),
    /// A regex in `[filters.exclude]` does not compile.
    BadRegex { pattern: String, reason: String },
    /// An `[extensions]` key that is not a category label.
    UnknownCategory(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(path) => write!(f, "no config file at {}", path.display()),
            ConfigError::Read { path, reason } => {
                write!(f, "cannot read {}: {}", path.display(), reason)
            }
            ConfigError::Parse(msg) => write!(f, "malformed config: {}", msg),
            ConfigError::BadGlob(pattern) => write!(f, "bad glob '{}'", pattern),
            ConfigError::BadRegex { pattern, reason } => {
                write!(f, "bad regex '{}': {}", pattern, reason)
            }
            ConfigError::UnknownCategory(label) => write!(
                f,
                "'{}' in [extensions] is not a category (use image, video, document, audio, archive or other)",
                label
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Everything a config file can set. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SortConfig {
    #[serde(default)]
    pub filters: FilterRules,

    /// Category label to extra extensions, merged over the built-in table.
    #[serde(default)]
    pub extensions: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub policy: PolicyConfig,
}

/// Which files take part in the sort. Filtered files stay where they are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Sort dot-files too.
    #[serde(default = "enabled")]
    pub include_hidden: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Matches here win over `exclude`.
    #[serde(default)]
    pub include: IncludeRules,
}

fn enabled() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            include_hidden: enabled(),
            exclude: Default::default(),
            include: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact file names, such as `Thumbs.db`.
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Globs over the path below the sorted folder.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions without the dot, compared case-insensitively.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regexes over the bare file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// Destructive behavior switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub reserved_dirs: ReservedDirPolicy,

    #[serde(default)]
    pub invalid_archives: InvalidArchivePolicy,

    #[serde(default = "enabled")]
    pub prune_empty_dirs: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            reserved_dirs: Default::default(),
            invalid_archives: Default::default(),
            prune_empty_dirs: enabled(),
        }
    }
}

impl SortConfig {
    /// Finds and reads the configuration for a run.
    ///
    /// An explicit `config_path` must exist. Otherwise `./.dirsortrc.toml` and
    /// then `$HOME/.config/dirsort/config.toml` are tried, and if neither is
    /// present the defaults apply.
    ///
    /// # Errors
    ///
    /// Fails when the explicit file is missing, or when the chosen file cannot
    /// be read or parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let candidates = match config_path {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                vec![path.to_path_buf()]
            }
            None => {
                let mut found = vec![PathBuf::from(LOCAL_CONFIG_NAME)];
                if let Some(home) = std::env::var_os("HOME") {
                    found.push(
                        PathBuf::from(home)
                            .join(".config")
                            .join("dirsort")
                            .join("config.toml"),
                    );
                }
                found
            }
        };

        match candidates.into_iter().find(|path| path.is_file()) {
            Some(path) => Self::read(&path),
            None => Ok(Self::default()),
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Builds the extension table: the built-in mapping plus configured additions.
    ///
    /// # Errors
    ///
    /// Returns an error if an `[extensions]` key is not a category label.
    pub fn file_mapper(&self) -> Result<FileMapper, ConfigError> {
        let mut mapper = FileMapper::default();
        for (label, extensions) in &self.extensions {
            let category = Category::from_label(label)
                .ok_or_else(|| ConfigError::UnknownCategory(label.clone()))?;
            for ext in extensions {
                mapper.add_extension_mapping(ext, category);
            }
        }
        Ok(mapper)
    }

    /// Compile the filter rules into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Pre-compiled filter rules.
#[derive(Debug)]
pub struct CompiledFilters {
    include_hidden: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl Default for CompiledFilters {
    /// Filters that let every file through.
    fn default() -> Self {
        Self {
            include_hidden: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::BadGlob(pattern.clone()))
        })
        .collect()
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::BadRegex {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            include_hidden: rules.include_hidden,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns: compile_globs(&rules.exclude.patterns)?,
            exclude_regexes,
            include_patterns: compile_globs(&rules.include.patterns)?,
        })
    }

    /// Check if a file should be sorted.
    ///
    /// `relative_path` is the file's path below the folder being sorted.
    /// Include patterns win over every exclude rule.
    pub fn should_include(&self, relative_path: &Path) -> bool {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self
            .include_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return true;
        }

        if !self.include_hidden && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        let ext = crate::file_category::extension_of(&file_name);
        if !ext.is_empty() && self.exclude_extensions.contains(&ext) {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}
