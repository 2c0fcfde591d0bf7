//! User inputs: the text-line file and the target images.
//!
//! ## Text file
//!
//! One overlay text per line. `\n` and `\r\n` line endings are both accepted,
//! and lines that are blank after trimming are dropped. Surviving lines keep
//! their inner and edge whitespace; line `i` pairs with image `i`.
//!
//! ## Target images
//!
//! Images are given as files or directories. A directory contributes its
//! direct children with a decodable extension, ordered by numeric filename
//! prefix first and name second:
//!
//! ```text
//! photos/
//! ├── 2.jpg          ← 1st
//! ├── 10-beach.jpg   ← 2nd
//! ├── 10-dune.png    ← 3rd
//! ├── cover.jpg      ← 4th (no number: after all numbered files)
//! └── notes.txt      ← skipped
//! ```
//!
//! Files given explicitly keep the order they were given in. Anything that is
//! not a supported image is rejected up front, before any rendering starts.

use crate::imaging::supported_input_extensions;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to list {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("text file {0} is not valid UTF-8")]
    NotUtf8(PathBuf),
    #[error("text file {0} has no non-blank lines")]
    NoTextLines(PathBuf),
    #[error("unsupported image type: {0} (expected one of: {exts})", exts = supported_input_extensions().join(", "))]
    UnsupportedImage(PathBuf),
    #[error("no supported images found in {0}")]
    NoImages(PathBuf),
    #[error("no target images given")]
    NothingSelected,
}

// ============================================================================
// Text lines
// ============================================================================

/// Split text into overlay lines: `\n` separated, trailing `\r` removed,
/// blank lines dropped.
pub fn parse_text_lines(content: &str) -> Vec<String> {
    content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Read and parse a text file. An empty result is an error.
pub fn read_text_lines(path: &Path) -> Result<Vec<String>, InputError> {
    let bytes = std::fs::read(path)?;
    let content = String::from_utf8(bytes).map_err(|_| InputError::NotUtf8(path.into()))?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    let lines = parse_text_lines(content);
    if lines.is_empty() {
        return Err(InputError::NoTextLines(path.into()));
    }
    Ok(lines)
}

// ============================================================================
// Images
// ============================================================================

pub fn is_supported_image(path: &Path) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    supported_input_extensions().contains(&ext.as_str())
}

/// Parse just the number prefix from a file name.
fn parse_number_prefix(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take_while(|c| c.is_ascii_digit()).collect();
    prefix.parse().ok()
}

/// Numbered files first (by number), then everything else; name breaks ties.
fn image_sort_key(path: &Path) -> (u32, String) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    (parse_number_prefix(&name).unwrap_or(u32::MAX), name)
}

/// Supported images directly inside `dir`, in display order. Hidden files
/// are skipped.
pub fn discover_images(dir: &Path) -> Result<Vec<PathBuf>, InputError> {
    let mut images = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| InputError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if entry.file_type().is_file() && !hidden && is_supported_image(entry.path()) {
            images.push(entry.into_path());
        }
    }
    if images.is_empty() {
        return Err(InputError::NoImages(dir.to_path_buf()));
    }
    images.sort_by_cached_key(|p| image_sort_key(p));
    Ok(images)
}

/// Expand user-given paths into the ordered list of target images.
pub fn collect_images(paths: &[PathBuf]) -> Result<Vec<PathBuf>, InputError> {
    if paths.is_empty() {
        return Err(InputError::NothingSelected);
    }
    let mut images = Vec::new();
    for path in paths {
        if path.is_dir() {
            images.extend(discover_images(path)?);
        } else if !path.exists() {
            return Err(InputError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        } else if is_supported_image(path) {
            images.push(path.clone());
        } else {
            return Err(InputError::UnsupportedImage(path.clone()));
        }
    }
    Ok(images)
}
