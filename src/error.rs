//! Error taxonomy for the screenshot pipeline.
//!
//! `ScreenshotError` is fatal to a request and maps onto an HTTP status;
//! `ExtractError` covers subtitle probing/extraction failures that only
//! degrade the request to the percentage-based fallback plan.

use axum::http::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScreenshotError {
    #[error("remote_path must not be empty")]
    EmptyPath,
    #[error("path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),
    #[error("path is a file, but not a supported video format: {}", .0.display())]
    NotAVideo(PathBuf),
    #[error("no video files found under {}", .0.display())]
    NoVideoFound(PathBuf),
    #[error("failed to read video duration: {0}")]
    Duration(String),
    #[error("screenshot {index}/{total}: frame capture failed: {reason}")]
    Capture {
        index: usize,
        total: usize,
        reason: String,
    },
    #[error("screenshot {index}/{total}: jpeg conversion failed: {reason}")]
    Convert {
        index: usize,
        total: usize,
        reason: String,
    },
    #[error("screenshot {index}/{total}: upload failed: {reason}")]
    Upload {
        index: usize,
        total: usize,
        reason: String,
    },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScreenshotError {
    /// Input-class errors are the caller's fault, everything else is ours.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::EmptyPath
            | Self::PathNotFound(_)
            | Self::NotAVideo(_)
            | Self::NoVideoFound(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Non-fatal subtitle extraction failures. The planner falls back to fixed
/// percentage-of-duration timestamps when one of these occurs.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("subtitle packet probe failed: {0}")]
    Probe(String),
    #[error("no JSON object found in probe output")]
    MalformedOutput,
    #[error("subtitle codec '{0}' is not supported for event sampling")]
    UnsupportedCodec(String),
    #[error("fewer than two bitmap subtitle packets, cannot pair show/hide")]
    TooFewPackets,
    #[error("no display events above the minimum duration")]
    NoEvents,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn input_errors_map_to_bad_request() {
        assert_eq!(ScreenshotError::EmptyPath.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ScreenshotError::PathNotFound(PathBuf::from("/nope")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ScreenshotError::NotAVideo(PathBuf::from("/a.txt")).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn processing_errors_map_to_internal_server_error() {
        assert_eq!(
            ScreenshotError::Duration("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ScreenshotError::Capture {
                index: 2,
                total: 5,
                reason: "mpv died".into()
            }
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn capture_error_names_the_failing_index() {
        let err = ScreenshotError::Capture {
            index: 2,
            total: 5,
            reason: "exit code 1".into(),
        };
        assert_eq!(
            err.to_string(),
            "screenshot 2/5: frame capture failed: exit code 1"
        );
    }
}
