//! The screenshot pipeline: locate -> probe -> plan -> capture/convert/upload.
//!
//! Screenshots are processed strictly in plan order; the first failing stage
//! aborts the whole request and no partial URL set is ever returned. The
//! per-request temp directory is dropped (and removed) on every exit path.

pub mod convert;
pub mod upload;

use std::path::Path;

use crate::error::ScreenshotError;
use crate::media::cmd::{mpv_args, FrameCapturer, MediaProber};
use crate::media::events::extract_display_events;
use crate::media::locate::find_target_video;
use crate::media::plan::{plan_screenshots, PlanSource, ScreenshotPlan, SCREENSHOT_COUNT};
use crate::media::probe::{select_subtitle_track, video_duration};
use self::upload::{direct_image_url, upload_with_retry, ImageHost, UPLOAD_ATTEMPTS, UPLOAD_BACKOFF};

pub struct ScreenshotPipeline<P, C, H> {
    prober: P,
    capturer: C,
    host: H,
    upload_backoff: std::time::Duration,
}

impl<P: MediaProber, C: FrameCapturer, H: ImageHost> ScreenshotPipeline<P, C, H> {
    pub fn new(prober: P, capturer: C, host: H) -> Self {
        Self {
            prober,
            capturer,
            host,
            upload_backoff: UPLOAD_BACKOFF,
        }
    }

    #[cfg(test)]
    fn without_backoff(mut self) -> Self {
        self.upload_backoff = std::time::Duration::ZERO;
        self
    }

    /// Run one request end to end and return the assembled BBCode block.
    pub async fn run(&self, remote_path: &str) -> Result<String, ScreenshotError> {
        if remote_path.is_empty() {
            return Err(ScreenshotError::EmptyPath);
        }

        let video = find_target_video(Path::new(remote_path))?;
        let duration = video_duration(&self.prober, &video).await?;
        tracing::info!(video = %video.display(), duration, "resolved screenshot target");

        let plan = self.plan(&video, duration).await;

        let temp_dir = tempfile::Builder::new()
            .prefix("screenshots-")
            .tempdir()?;

        let total = plan.timestamps.len();
        let mut urls = Vec::with_capacity(total);
        for (i, &at) in plan.timestamps.iter().enumerate() {
            let index = i + 1;
            tracing::info!(index, total, at, "processing screenshot");

            let raw = temp_dir.path().join(format!("ss_{index}_temp.png"));
            let jpeg = temp_dir.path().join(format!("ss_{index}.jpg"));

            self.capture(&video, at, &raw, index, total).await?;

            let (src, dst) = (raw.clone(), jpeg.clone());
            tokio::task::spawn_blocking(move || convert::convert_to_jpeg(&src, &dst))
                .await
                .map_err(|e| ScreenshotError::Convert {
                    index,
                    total,
                    reason: e.to_string(),
                })?
                .map_err(|e| ScreenshotError::Convert {
                    index,
                    total,
                    reason: e.to_string(),
                })?;

            let show_url =
                upload_with_retry(&self.host, &jpeg, UPLOAD_ATTEMPTS, self.upload_backoff)
                    .await
                .map_err(|e| ScreenshotError::Upload {
                    index,
                    total,
                    reason: e.to_string(),
                })?;
            urls.push(direct_image_url(&show_url));
        }

        urls.sort();
        Ok(urls
            .iter()
            .map(|url| format!("[img]{url}[/img]"))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Decide the capture plan. Subtitle absence or extraction failure only
    /// degrades to the percentage fallback, it never fails the request.
    async fn plan(&self, video: &Path, duration: f64) -> ScreenshotPlan {
        let events = match select_subtitle_track(&self.prober, video).await {
            Some(track) => {
                match extract_display_events(&self.prober, video, &track, duration).await {
                    Ok(events) => events,
                    Err(e) => {
                        tracing::warn!(error = %e, "subtitle sampling unavailable, using percentage fallback");
                        Vec::new()
                    }
                }
            }
            None => Vec::new(),
        };

        let plan = plan_screenshots(duration, &events, SCREENSHOT_COUNT, &mut rand::thread_rng());
        match plan.source {
            PlanSource::Subtitles => {
                tracing::info!(events = events.len(), "using subtitle-derived screenshot plan")
            }
            PlanSource::Fallback => tracing::info!("using percentage-based screenshot plan"),
        }
        plan
    }

    async fn capture(
        &self,
        video: &Path,
        at: f64,
        output: &Path,
        index: usize,
        total: usize,
    ) -> Result<(), ScreenshotError> {
        match self.capturer.capture_frame(video, at, output).await {
            Ok(result) if result.status.success() => Ok(()),
            Ok(result) => Err(ScreenshotError::Capture {
                index,
                total,
                reason: format!(
                    "mpv exited with {}: {} (command: mpv {})",
                    result.status,
                    String::from_utf8_lossy(&result.stderr).trim(),
                    mpv_args(video, at, output).join(" "),
                ),
            }),
            Err(e) => Err(ScreenshotError::Capture {
                index,
                total,
                reason: e.to_string(),
            }),
        }
    }
}
