use crate::error::AppError;
use crate::rules::{self, DEFAULT_RULES_FILE, IgnoreRules};
use log;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Result of reading one file during collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Contents(Vec<u8>),
    /// The file could not be read; it is framed with empty content.
    Unreadable,
}

impl ReadOutcome {
    pub fn bytes(&self) -> &[u8] {
        match self {
            ReadOutcome::Contents(bytes) => bytes,
            ReadOutcome::Unreadable => &[],
        }
    }

    pub fn is_unreadable(&self) -> bool {
        matches!(self, ReadOutcome::Unreadable)
    }
}

/// Which path goes into the `FileName:` header of each record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathStyle {
    #[default]
    Relative,
    Absolute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    pub relative_path: String,
    pub outcome: ReadOutcome,
}

impl FileRecord {
    fn header_path(&self, style: PathStyle) -> String {
        match style {
            PathStyle::Relative => self.relative_path.clone(),
            PathStyle::Absolute => self.path.display().to_string(),
        }
    }
}

/// Ordered list of framed file records, rendered into one text blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateDocument {
    records: Vec<FileRecord>,
    path_style: PathStyle,
}

impl AggregateDocument {
    pub fn new(path_style: PathStyle) -> Self {
        Self {
            records: Vec::new(),
            path_style,
        }
    }

    pub fn push(&mut self, record: FileRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Renders every record as
    /// `FileName: <path>\nData:\n<content>\n\n`, in collection order.
    pub fn render(&self) -> String {
        let headers: Vec<String> = self
            .records
            .iter()
            .map(|r| r.header_path(self.path_style))
            .collect();
        let capacity = self
            .records
            .iter()
            .zip(&headers)
            .map(|(r, h)| h.len() + r.outcome.bytes().len() + "FileName: \nData:\n\n\n".len())
            .sum();

        let mut out = String::with_capacity(capacity);
        for (record, header) in self.records.iter().zip(headers) {
            out.push_str("FileName: ");
            out.push_str(&header);
            out.push_str("\nData:\n");
            out.push_str(&String::from_utf8_lossy(record.outcome.bytes()));
            out.push_str("\n\n");
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Rules file name, looked up directly under the root.
    pub rules_file: String,
    pub path_style: PathStyle,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            rules_file: DEFAULT_RULES_FILE.to_string(),
            path_style: PathStyle::default(),
        }
    }
}

#[derive(Debug)]
pub struct CollectOutcome {
    pub document: AggregateDocument,
    /// Set when the walk stopped early; `document` holds what was gathered before.
    pub walk_error: Option<AppError>,
}

/// Loads the rules file under `root` and collects the tree.
pub fn collect(root: &Path, options: &CollectOptions) -> CollectOutcome {
    let rules_path = root.join(&options.rules_file);
    let (rules, rules_err) = rules::load_rules(&rules_path);
    if let Some(e) = rules_err {
        log::warn!("{} (continuing with built-in rule only)", e);
    }
    collect_with_rules(root, &rules, options.path_style)
}

/// Depth-first, pre-order walk of `root`, siblings in file-name order.
///
/// Ignored directories are pruned as a whole; ignored files are skipped.
/// Every other non-directory entry is read and appended to the document.
pub fn collect_with_rules(root: &Path, rules: &IgnoreRules, path_style: PathStyle) -> CollectOutcome {
    log::info!("Walking project directory: {}", root.display());
    let mut document = AggregateDocument::new(path_style);
    let mut walk_error = None;

    let mut walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry_result) = walker.next() {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) => {
                log::error!("Error walking directory, stopping: {}", e);
                walk_error = Some(AppError::from(e));
                break;
            }
        };

        let path = entry.path();
        let is_dir = entry.file_type().is_dir();
        let relative_path = relative_to(root, path);

        if entry.depth() > 0 && rules.is_ignored(&relative_path) {
            if is_dir {
                log::trace!("Pruning ignored directory: {}", relative_path);
                walker.skip_current_dir();
            } else {
                log::trace!("Skipping ignored file: {}", relative_path);
            }
            continue;
        }

        if is_dir {
            continue;
        }

        log::info!("Reading: {}", relative_path);
        let outcome = match fs::read(path) {
            Ok(bytes) => ReadOutcome::Contents(bytes),
            Err(e) => {
                log::debug!("Could not read {}: {}", path.display(), e);
                ReadOutcome::Unreadable
            }
        };
        document.push(FileRecord {
            path: path.to_path_buf(),
            relative_path,
            outcome,
        });
    }

    log::info!(
        "Directory walk complete. Collected {} files.",
        document.len()
    );
    CollectOutcome {
        document,
        walk_error,
    }
}

fn relative_to(root: &Path, path: &Path) -> String {
    match pathdiff::diff_paths(path, root) {
        Some(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Some(rel) => rel.to_string_lossy().into_owned(),
        None => {
            log::warn!("Could not get relative path for: {}", path.display());
            path.to_string_lossy().into_owned()
        }
    }
}
