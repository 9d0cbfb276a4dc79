/// File categorization by extension.
///
/// Every file lands in exactly one of six fixed categories. The extension table
/// starts from a built-in set and can be extended at runtime, but unmapped
/// extensions always fall into [`Category::Other`].
///
/// # Examples
///
/// ```
/// use dirsort::file_category::{Category, FileMapper};
///
/// let mapper = FileMapper::default();
/// assert_eq!(mapper.classify("PNG"), Category::Image);
/// assert_eq!(mapper.classify("tar"), Category::Archive);
/// assert_eq!(mapper.classify("xyz"), Category::Other);
/// ```
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Represents a broad file category.
///
/// The declaration order is the order categories are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Image files (JPEG, PNG, SVG)
    Image,
    /// Video files (AVI, MP4, MOV, MKV)
    Video,
    /// Document files (DOC, PDF, TXT, XLSX, PPTX)
    Document,
    /// Audio files (MP3, OGG, WAV, AMR)
    Audio,
    /// Archive files (ZIP, GZ, TAR)
    Archive,
    /// Anything with an unmapped extension
    Other,
}

impl Category {
    /// All categories, in report order.
    pub const ALL: [Category; 6] = [
        Category::Image,
        Category::Video,
        Category::Document,
        Category::Audio,
        Category::Archive,
        Category::Other,
    ];

    /// Returns the directory name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsort::file_category::Category;
    ///
    /// assert_eq!(Category::Image.dir_name(), "images");
    /// assert_eq!(Category::Video.dir_name(), "video");
    /// assert_eq!(Category::Other.dir_name(), "others");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Image => "images",
            Category::Video => "video",
            Category::Document => "documents",
            Category::Audio => "audio",
            Category::Archive => "archives",
            Category::Other => "others",
        }
    }

    /// Returns the short label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Image => "image",
            Category::Video => "video",
            Category::Document => "document",
            Category::Audio => "audio",
            Category::Archive => "archive",
            Category::Other => "other",
        }
    }

    /// Returns a human-readable heading for this category.
    pub fn description(&self) -> &'static str {
        match self {
            Category::Image => "Images",
            Category::Video => "Video",
            Category::Document => "Documents",
            Category::Audio => "Audio",
            Category::Archive => "Archives",
            Category::Other => "Others",
        }
    }

    /// Parses a report label (`"image"`, `"other"`, ...), case-insensitively.
    pub fn from_label(label: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(label))
    }

    /// Returns the category whose directory is called `name`, if any.
    pub fn from_dir_name(name: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.dir_name() == name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returns true if `name` is one of the six category directory names.
pub fn is_reserved_dir_name(name: &str) -> bool {
    Category::from_dir_name(name).is_some()
}

/// Returns the lowercase text after the last `.` of a file name.
///
/// A name without a dot has no extension and yields an empty string.
pub fn extension_of(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

/// Maps file extensions to categories.
#[derive(Debug, Clone)]
pub struct FileMapper {
    extension_map: HashMap<String, Category>,
}

impl FileMapper {
    /// Creates a new `FileMapper` with the standard mappings.
    pub fn new() -> Self {
        let mut mapper = Self {
            extension_map: HashMap::new(),
        };
        mapper.populate_standard_mappings();
        mapper
    }

    fn populate_standard_mappings(&mut self) {
        for ext in ["jpeg", "png", "jpg", "svg"] {
            self.add_extension_mapping(ext, Category::Image);
        }
        for ext in ["avi", "mp4", "mov", "mkv"] {
            self.add_extension_mapping(ext, Category::Video);
        }
        for ext in ["doc", "docx", "txt", "pdf", "xlsx", "pptx"] {
            self.add_extension_mapping(ext, Category::Document);
        }
        for ext in ["mp3", "ogg", "wav", "amr"] {
            self.add_extension_mapping(ext, Category::Audio);
        }
        for ext in ["zip", "gz", "tar"] {
            self.add_extension_mapping(ext, Category::Archive);
        }
    }

    /// Adds (or replaces) a file extension to category mapping.
    ///
    /// A leading dot is ignored, so `".webp"` and `"webp"` are the same key.
    pub fn add_extension_mapping(&mut self, ext: &str, category: Category) {
        let key = ext.trim_start_matches('.').to_lowercase();
        if !key.is_empty() {
            self.extension_map.insert(key, category);
        }
    }

    /// Maps a file extension to a category, if the extension is known.
    pub fn extension_to_category(&self, ext: &str) -> Option<Category> {
        self.extension_map.get(&ext.to_lowercase()).copied()
    }

    /// Classifies an extension, falling back to [`Category::Other`].
    pub fn classify(&self, ext: &str) -> Category {
        self.extension_to_category(ext).unwrap_or(Category::Other)
    }

    /// Classifies a file by the extension of its (original) name.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsort::file_category::{Category, FileMapper};
    ///
    /// let mapper = FileMapper::default();
    /// assert_eq!(mapper.classify_name("Holiday.Photo.JPG"), Category::Image);
    /// assert_eq!(mapper.classify_name("backup.tar.gz"), Category::Archive);
    /// assert_eq!(mapper.classify_name("zip"), Category::Other);
    /// ```
    pub fn classify_name(&self, file_name: &str) -> Category {
        self.classify(&extension_of(file_name))
    }
}

impl Default for FileMapper {
    fn default() -> Self {
        Self::new()
    }
}
