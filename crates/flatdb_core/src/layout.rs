//! Mapping from record ids to files.
//!
//! ```text
//! <root>/
//! ├─ alice.json             # committed record
//! ├─ bob.json               # empty: reserved by an uncommitted create
//! └─ .3f2a...-carol.json    # staging file of transaction 3f2a...
//! ```

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use flatdb_storage::is_staging_name;
use std::fs;
use std::path::{Path, PathBuf};

/// Maps record ids to file paths.
///
/// Implementations must be pure: the same id always maps to the same path,
/// and distinct ids map to distinct paths.
pub trait RecordLayout {
    /// Returns the directory holding the records.
    fn root(&self) -> &Path;

    /// Returns the file storing the record with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKey`] if `id` cannot be stored.
    fn path_for(&self, id: &str) -> CoreResult<PathBuf>;

    /// Returns the id of the record stored at `path`, or `None` if `path`
    /// is not a record file of this layout.
    fn id_for(&self, path: &Path) -> Option<String>;
}

/// One file per record, `<root>/<id>.<extension>`.
#[derive(Debug, Clone)]
pub struct DirectoryLayout {
    root: PathBuf,
    extension: String,
}

impl DirectoryLayout {
    /// Opens a layout rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `create_if_missing` is false
    /// - The path exists but is not a directory
    /// - I/O errors occur
    pub fn open(root: impl Into<PathBuf>, config: &Config) -> CoreResult<Self> {
        let root = root.into();

        if !root.exists() {
            if config.create_if_missing {
                fs::create_dir_all(&root)?;
            } else {
                return Err(CoreError::invalid_directory(format!(
                    "data directory does not exist: {}",
                    root.display()
                )));
            }
        }

        if !root.is_dir() {
            return Err(CoreError::invalid_directory(format!(
                "path is not a directory: {}",
                root.display()
            )));
        }

        Ok(Self {
            root,
            extension: config.file_extension.clone(),
        })
    }

    /// Returns the record file extension.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    fn file_name(&self, id: &str) -> String {
        if self.extension.is_empty() {
            id.to_string()
        } else {
            format!("{id}.{}", self.extension)
        }
    }
}

impl RecordLayout for DirectoryLayout {
    fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> CoreResult<PathBuf> {
        validate_id(id)?;
        Ok(self.root.join(self.file_name(id)))
    }

    fn id_for(&self, path: &Path) -> Option<String> {
        if path.parent() != Some(self.root.as_path()) {
            return None;
        }
        let name = path.file_name()?;
        if is_staging_name(name) {
            return None;
        }
        let name = name.to_str()?;
        let id = if self.extension.is_empty() {
            name
        } else {
            name.strip_suffix(&format!(".{}", self.extension))?
        };
        validate_id(id).ok()?;
        Some(id.to_string())
    }
}

/// Checks that `id` can be used as a file name.
///
/// Ids starting with `.` would collide with staging files, and ids with
/// separators would escape the data directory.
pub fn validate_id(id: &str) -> CoreResult<()> {
    if id.is_empty() {
        return Err(CoreError::invalid_key(id, "id is empty"));
    }
    if id.starts_with('.') {
        return Err(CoreError::invalid_key(id, "id must not start with '.'"));
    }
    if id.contains(['/', '\\', '\0']) {
        return Err(CoreError::invalid_key(
            id,
            "id must not contain path separators",
        ));
    }
    Ok(())
}
