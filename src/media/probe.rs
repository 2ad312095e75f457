//! Video duration and subtitle track selection via ffprobe.

use serde::Deserialize;
use std::path::Path;

use crate::error::ScreenshotError;
use crate::media::cmd::MediaProber;

/// Which event-extraction strategy a subtitle codec needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleKind {
    /// Packets carry their own display duration (ass, subrip).
    Text,
    /// Show/hide encoded as paired packets with no duration (PGS).
    Bitmap,
}

#[derive(Debug, Clone)]
pub struct SubtitleTrack {
    pub index: i64,
    pub codec: String,
}

impl SubtitleTrack {
    pub fn kind(&self) -> Option<SubtitleKind> {
        match self.codec.as_str() {
            "ass" | "subrip" => Some(SubtitleKind::Text),
            "hdmv_pgs_subtitle" => Some(SubtitleKind::Bitmap),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StreamList {
    #[serde(default)]
    streams: Vec<SubtitleStream>,
}

#[derive(Debug, Deserialize)]
struct SubtitleStream {
    index: i64,
    #[serde(default)]
    codec_name: String,
    #[serde(default)]
    disposition: Disposition,
}

#[derive(Debug, Default, Deserialize)]
struct Disposition {
    #[serde(default)]
    comment: i64,
    #[serde(default)]
    hearing_impaired: i64,
    #[serde(default)]
    visual_impaired: i64,
}

impl SubtitleStream {
    /// Not a commentary or accessibility track.
    fn is_normal(&self) -> bool {
        self.disposition.comment == 0
            && self.disposition.hearing_impaired == 0
            && self.disposition.visual_impaired == 0
    }
}

pub async fn video_duration(
    prober: &impl MediaProber,
    video: &Path,
) -> Result<f64, ScreenshotError> {
    let output = prober
        .probe_duration(video)
        .await
        .map_err(|e| ScreenshotError::Duration(e.to_string()))?;
    if !output.status.success() {
        return Err(ScreenshotError::Duration(format!(
            "ffprobe exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout.trim().parse::<f64>().map_err(|e| {
        ScreenshotError::Duration(format!("unparsable duration '{}': {}", stdout.trim(), e))
    })
}

/// Pick the subtitle track to sample, or `None` when the video has no usable
/// one. Normal tracks win, ranked ass > subrip > pgs; failing that, the first
/// probed stream is a last resort. Probe or parse failures are degradation,
/// not request failures.
pub async fn select_subtitle_track(
    prober: &impl MediaProber,
    video: &Path,
) -> Option<SubtitleTrack> {
    let output = match prober.probe_subtitle_streams(video).await {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            tracing::warn!(status = %output.status, "subtitle stream probe failed, screenshotting without subtitles");
            return None;
        }
        Err(e) => {
            tracing::warn!(error = %e, "subtitle stream probe failed, screenshotting without subtitles");
            return None;
        }
    };

    let parsed: StreamList = match serde_json::from_slice(&output.stdout) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "unparsable subtitle probe JSON, screenshotting without subtitles");
            return None;
        }
    };
    if parsed.streams.is_empty() {
        tracing::info!("no embedded subtitle streams found");
        return None;
    }

    for codec in ["ass", "subrip", "hdmv_pgs_subtitle"] {
        if let Some(stream) = parsed
            .streams
            .iter()
            .find(|s| s.is_normal() && s.codec_name == codec)
        {
            tracing::info!(index = stream.index, codec, "selected subtitle stream");
            return Some(SubtitleTrack {
                index: stream.index,
                codec: stream.codec_name.clone(),
            });
        }
    }

    // Last resort: commentary/accessibility beats nothing at all.
    let first = &parsed.streams[0];
    tracing::warn!(
        index = first.index,
        codec = %first.codec_name,
        "no normal subtitle stream, falling back to first probed stream"
    );
    Some(SubtitleTrack {
        index: first.index,
        codec: first.codec_name.clone(),
    })
}
