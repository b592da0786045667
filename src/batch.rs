//! Batch extraction - PNG files in, pretty-printed JSON files out.
//!
//! Each file is handled on its own: a bad or payload-free image is reported
//! and the rest of the batch carries on.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::CodecError;
use crate::extract;
use crate::png::PngImage;

pub const DEFAULT_OUTPUT_DIR: &str = "png2json-output";

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("No soul core data found")]
    NoPayload,

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Invalid payload JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// A PNG file or a directory of them.
    pub input: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Reject images whose chunk CRCs do not match.
    #[serde(default)]
    pub verify_crc: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

impl BatchConfig {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: default_output_dir(),
            verify_crc: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Extracted { target: PathBuf },
    /// The image carries no recognized payload.
    Skipped,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn extracted(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Extracted { .. }))
    }

    pub fn warnings(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Skipped))
    }

    pub fn failures(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&FileStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Every `.png` (any case) in a directory, sorted, or the file itself.
pub fn list_png_files(input: &Path) -> io::Result<Vec<PathBuf>> {
    if !fs::metadata(input)?.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(input)? {
        let path = entry?.path();
        let is_png = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("png"));
        if is_png && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read one image and return its payload as JSON.
pub fn extract_file(path: &Path, verify_crc: bool) -> Result<Value, BatchError> {
    let bytes = fs::read(path)?;
    let image = if verify_crc {
        PngImage::parse_verified(&bytes)?
    } else {
        PngImage::parse(&bytes)?
    };
    let text = extract::extract_from(&image)?.ok_or(BatchError::NoPayload)?;
    let json = extract::resolve_payload(&text)?;
    Ok(serde_json::from_str(&json)?)
}

fn output_path(output_dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "payload".to_string());
    output_dir.join(format!("{}.json", stem))
}

fn process_file(path: &Path, config: &BatchConfig) -> FileStatus {
    let written = extract_file(path, config.verify_crc).and_then(|json| {
        let target = output_path(&config.output_dir, path);
        fs::write(&target, serde_json::to_string_pretty(&json)?)?;
        Ok(target)
    });

    match written {
        Ok(target) => {
            tracing::info!("Extracted {}", target.display());
            FileStatus::Extracted { target }
        }
        Err(BatchError::NoPayload) => {
            tracing::warn!("No soul core data found in {}", path.display());
            FileStatus::Skipped
        }
        Err(e) => {
            tracing::error!("Failed to process {}: {}", path.display(), e);
            FileStatus::Failed { reason: e.to_string() }
        }
    }
}

/// Extract every input file into `config.output_dir`.
///
/// Only listing the input or creating the output directory can fail the
/// whole batch; per-file problems land in the report.
pub fn run_batch(config: &BatchConfig) -> io::Result<BatchReport> {
    fs::create_dir_all(&config.output_dir)?;
    let files = list_png_files(&config.input)?;
    tracing::debug!(files = files.len(), input = %config.input.display(), "starting batch");

    let workers = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, files.len().max(1));
    let per_worker = files.len().div_ceil(workers).max(1);

    let mut statuses: Vec<Option<FileStatus>> = vec![None; files.len()];
    thread::scope(|scope| {
        for (paths, slots) in files.chunks(per_worker).zip(statuses.chunks_mut(per_worker)) {
            scope.spawn(move || {
                for (path, slot) in paths.iter().zip(slots.iter_mut()) {
                    *slot = Some(process_file(path, config));
                }
            });
        }
    });

    let outcomes = files
        .into_iter()
        .zip(statuses)
        .map(|(path, status)| FileOutcome {
            path,
            status: status.unwrap_or(FileStatus::Failed {
                reason: "worker did not report".to_string(),
            }),
        })
        .collect();

    Ok(BatchReport { outcomes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_replaces_extension() {
        let target = output_path(Path::new("out"), Path::new("cards/Rin.PNG"));
        assert_eq!(target, Path::new("out").join("Rin.json"));
    }

    #[test]
    fn test_report_counts() {
        let report = BatchReport {
            outcomes: vec![
                FileOutcome { path: "a.png".into(), status: FileStatus::Extracted { target: "a.json".into() } },
                FileOutcome { path: "b.png".into(), status: FileStatus::Skipped },
                FileOutcome { path: "c.png".into(), status: FileStatus::Failed { reason: "x".into() } },
            ],
        };
        assert_eq!((report.extracted(), report.warnings(), report.failures()), (1, 1, 1));
    }

    #[test]
    fn test_default_config() {
        let config = BatchConfig::new("cards");
        assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert!(!config.verify_crc);
    }
}
