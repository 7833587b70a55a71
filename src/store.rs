//! Local template store
//!
//! ```text
//! store/
//!   templates/   JSON or YAML templates, one per file
//!   temp/        scratch copies of fetched and merged documents
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when reading or writing the store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("template not found: {name}")]
    TemplateNotFound { name: String },

    #[error("error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML template {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("error serializing {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Extensions recognised as templates, in lookup order
pub const TEMPLATE_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// Lines `init` makes sure are ignored by git
const GITIGNORE_ENTRIES: &[&str] = &[".env", "store/temp/"];

/// A template file found in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateEntry {
    /// File stem, used to refer to the template
    pub name: String,
    pub path: PathBuf,
}

/// Template store rooted at a directory
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join("templates")
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.root.join("temp")
    }

    /// Create the store directories; returns the paths that did not exist yet
    pub fn init(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut created = Vec::new();
        for dir in [self.root.clone(), self.templates_dir(), self.temp_dir()] {
            if !dir.exists() {
                fs::create_dir_all(&dir).map_err(|source| io_error(&dir, source))?;
                created.push(dir);
            }
        }
        Ok(created)
    }

    /// List templates, sorted by name
    pub fn list_templates(&self) -> Result<Vec<TemplateEntry>, StoreError> {
        let dir = self.templates_dir();
        let entries = fs::read_dir(&dir).map_err(|source| io_error(&dir, source))?;

        let mut templates = Vec::new();
        for entry in entries {
            let path = entry.map_err(|source| io_error(&dir, source))?.path();
            let is_template = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| TEMPLATE_EXTENSIONS.contains(&e));
            if !is_template || !path.is_file() {
                continue;
            }
            if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
                templates.push(TemplateEntry {
                    name: name.to_string(),
                    path: path.clone(),
                });
            }
        }

        templates.sort_by(|a, b| a.name.cmp(&b.name).then(a.path.cmp(&b.path)));
        Ok(templates)
    }

    /// Locate a template by name, trying each known extension in turn
    pub fn template_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        let dir = self.templates_dir();
        TEMPLATE_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{name}.{ext}")))
            .find(|p| p.is_file())
            .ok_or_else(|| StoreError::TemplateNotFound {
                name: name.to_string(),
            })
    }

    /// Read a template as JSON text
    ///
    /// JSON files are returned verbatim so substitution sees the author's
    /// formatting. YAML files are converted to JSON text first; placeholders
    /// must be quoted YAML strings to survive the conversion.
    pub fn load_template(&self, name: &str) -> Result<String, StoreError> {
        let path = self.template_path(name)?;
        let content = fs::read_to_string(&path).map_err(|source| io_error(&path, source))?;

        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
        if is_json {
            return Ok(content);
        }

        let value: Value = serde_yaml::from_str(&content).map_err(|source| StoreError::Yaml {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "converted YAML template to JSON");
        serde_json::to_string_pretty(&value).map_err(|source| StoreError::Json { path, source })
    }

    /// Write a pretty-printed scratch copy of a document into `temp/`
    pub fn write_scratch(&self, name: &str, document: &Value) -> Result<PathBuf, StoreError> {
        let dir = self.temp_dir();
        fs::create_dir_all(&dir).map_err(|source| io_error(&dir, source))?;

        let path = dir.join(format!("{name}.json"));
        let text = serde_json::to_string_pretty(document).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, text).map_err(|source| io_error(&path, source))?;
        debug!(path = %path.display(), "wrote scratch copy");
        Ok(path)
    }
}

/// Write a file only if it does not exist yet; returns whether it was written
pub fn write_if_missing(path: &Path, contents: &str) -> Result<bool, StoreError> {
    if path.exists() {
        return Ok(false);
    }
    fs::write(path, contents).map_err(|source| io_error(path, source))?;
    Ok(true)
}

/// Make sure `.gitignore` in `dir` lists the secrets and scratch files
///
/// Existing entries are kept; missing ones are appended. Returns whether the
/// file changed.
pub fn ensure_gitignore(dir: &Path) -> Result<bool, StoreError> {
    let path = dir.join(".gitignore");
    let existing = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(source) => return Err(io_error(&path, source)),
    };

    let missing: Vec<&str> = GITIGNORE_ENTRIES
        .iter()
        .copied()
        .filter(|entry| !existing.lines().any(|line| line.trim() == *entry))
        .collect();
    if missing.is_empty() {
        return Ok(false);
    }

    let mut updated = existing;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    for entry in missing {
        updated.push_str(entry);
        updated.push('\n');
    }
    fs::write(&path, updated).map_err(|source| io_error(&path, source))?;
    Ok(true)
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}
