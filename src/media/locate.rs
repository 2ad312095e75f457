//! Resolve the single target video file for a request.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::ScreenshotError;

const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "ts", "avi", "wmv", "mov", "flv", "m2ts"];

/// Episode markers like `S01E02`, `Season 1` or a bare `E03`, delimited by
/// the usual release-name separators.
static SERIES_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[\._\s-](S\d{1,2}E\d{1,3}|Season[\._\s-]?\d{1,2}|E\d{1,3})[\._\s-]").unwrap()
});

fn has_video_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_series_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| SERIES_PATTERN.is_match(name))
        .unwrap_or(false)
}

/// Resolve the video file to screenshot under `path`.
///
/// A direct file path is used as-is. For directories, series-named content
/// picks the lexicographically first episode; everything else is treated as
/// a movie and the largest file wins, so samples and extras lose.
pub fn find_target_video(path: &Path) -> Result<PathBuf, ScreenshotError> {
    if !path.exists() {
        return Err(ScreenshotError::PathNotFound(path.to_path_buf()));
    }
    if path.is_file() {
        if has_video_extension(path) {
            return Ok(path.to_path_buf());
        }
        return Err(ScreenshotError::NotAVideo(path.to_path_buf()));
    }

    let mut videos: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && has_video_extension(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    if videos.is_empty() {
        return Err(ScreenshotError::NoVideoFound(path.to_path_buf()));
    }

    if videos.iter().any(|file| is_series_name(file)) {
        videos.sort();
        let first = videos.swap_remove(0);
        tracing::info!(file = %first.display(), "series naming detected, using first episode");
        return Ok(first);
    }

    let mut largest: Option<(u64, PathBuf)> = None;
    for file in videos {
        let size = match file.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "could not stat file, skipping");
                continue;
            }
        };
        if largest.as_ref().map_or(true, |(max, _)| size > *max) {
            largest = Some((size, file));
        }
    }
    match largest {
        Some((size, file)) => {
            tracing::info!(file = %file.display(), size, "selected largest file as main feature");
            Ok(file)
        }
        None => Err(ScreenshotError::NoVideoFound(path.to_path_buf())),
    }
}
