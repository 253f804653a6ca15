use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use thiserror::Error;
use walkdir::WalkDir;

pub mod docx;
pub mod markdown;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("pdf extraction failed: {0}")]
    Pdf(String),
    #[error("docx extraction failed: {0}")]
    Docx(String),
}

/// Extension match is exact: `Notes.TXT` is not a `.txt` file.
fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

/// Plain text from one file, dispatched by extension.
/// `Ok(None)` means the extension is not supported and the file is skipped.
fn extract_file(path: &Path) -> Result<Option<String>, ExtractError> {
    match extension_of(path) {
        Some("txt") => Ok(Some(std::fs::read_to_string(path)?)),
        Some("md") => Ok(Some(markdown::extract_text(&std::fs::read_to_string(
            path,
        )?))),
        Some("pdf") => pdf_extract::extract_text(path)
            .map(Some)
            .map_err(|err| ExtractError::Pdf(err.to_string())),
        Some("docx") => docx::extract_text(path).map(Some),
        _ => Ok(None),
    }
}

fn folder_files(dir: &Path) -> impl Iterator<Item = walkdir::DirEntry> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
}

/// Concatenate the extracted text of every supported file in `dir`, top
/// level only. A file that fails to extract contributes a marker line
/// naming it; the cause goes to the log. Returns `None` when the folder is
/// missing or nothing usable was extracted.
pub fn aggregate_folder(dir: &Path) -> Option<String> {
    if !dir.is_dir() {
        return None;
    }

    let mut combined = String::new();
    for entry in folder_files(dir) {
        let name = entry.file_name().to_string_lossy().into_owned();
        match extract_file(entry.path()) {
            Ok(Some(text)) => {
                combined.push_str(&text);
                combined.push_str("\n\n");
            }
            Ok(None) => {}
            Err(err) => {
                log::warn!("could not extract {}: {err}", entry.path().display());
                combined.push_str(&format!("[error] failed to read {name}\n"));
            }
        }
    }

    if combined.trim().is_empty() {
        None
    } else {
        Some(combined)
    }
}

/// Hash of the folder listing: file names, sizes, modification times.
/// A missing or empty folder hashes to a stable value.
pub fn folder_fingerprint(dir: &Path) -> String {
    let mut hasher = Sha256::new();
    if dir.is_dir() {
        for entry in folder_files(dir) {
            hasher.update(entry.file_name().to_string_lossy().as_bytes());
            if let Ok(meta) = entry.metadata() {
                hasher.update(meta.len().to_le_bytes());
                if let Ok(modified) = meta.modified() {
                    if let Ok(since_epoch) = modified.duration_since(UNIX_EPOCH) {
                        hasher.update(since_epoch.as_nanos().to_le_bytes());
                    }
                }
            }
        }
    }
    hex::encode(hasher.finalize())
}

struct CachedAggregate {
    fingerprint: String,
    text: Option<String>,
}

/// Aggregated document text behind a listing fingerprint: the folder is
/// rescanned only when the listing changes or after `invalidate`.
pub struct DocumentStore {
    dir: PathBuf,
    cached: Option<CachedAggregate>,
}

impl DocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cached: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load(&mut self) -> Option<&str> {
        let fingerprint = folder_fingerprint(&self.dir);
        let stale = self
            .cached
            .as_ref()
            .map(|cached| cached.fingerprint != fingerprint)
            .unwrap_or(true);

        if stale {
            log::debug!("rescanning document folder {}", self.dir.display());
            let text = aggregate_folder(&self.dir);
            self.cached = Some(CachedAggregate { fingerprint, text });
        }

        self.cached.as_ref().and_then(|cached| cached.text.as_deref())
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}
