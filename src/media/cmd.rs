//! External tool invocations behind mockable trait seams.
//!
//! Probing and capture intentionally run without a timeout; the upload
//! client is the only external call with one.

use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::process::Output;
use tokio::process::Command;

/// ffprobe invocations used by the screenshot pipeline.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait MediaProber: Send + Sync {
    async fn probe_duration(&self, video: &Path) -> io::Result<Output>;
    async fn probe_subtitle_streams(&self, video: &Path) -> io::Result<Output>;
    async fn probe_subtitle_packets(
        &self,
        video: &Path,
        stream_index: i64,
        read_intervals: &str,
    ) -> io::Result<Output>;
}

pub struct RealMediaProber;

#[async_trait]
impl MediaProber for RealMediaProber {
    async fn probe_duration(&self, video: &Path) -> io::Result<Output> {
        Command::new("ffprobe")
            .arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("default=noprint_wrappers=1:nokey=1")
            .arg(video)
            .output()
            .await
    }

    async fn probe_subtitle_streams(&self, video: &Path) -> io::Result<Output> {
        Command::new("ffprobe")
            .arg("-v")
            .arg("quiet")
            .arg("-print_format")
            .arg("json")
            .arg("-show_entries")
            .arg("stream=index,codec_name,codec_type,disposition")
            .arg("-select_streams")
            .arg("s")
            .arg(video)
            .output()
            .await
    }

    async fn probe_subtitle_packets(
        &self,
        video: &Path,
        stream_index: i64,
        read_intervals: &str,
    ) -> io::Result<Output> {
        Command::new("ffprobe")
            .arg("-v")
            .arg("quiet")
            .arg("-read_intervals")
            .arg(read_intervals)
            .arg("-print_format")
            .arg("json")
            .arg("-show_packets")
            .arg("-select_streams")
            .arg(stream_index.to_string())
            .arg(video)
            .output()
            .await
    }
}

/// Extracts one still frame at a timestamp.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait FrameCapturer: Send + Sync {
    async fn capture_frame(&self, video: &Path, at_seconds: f64, output: &Path)
        -> io::Result<Output>;
}

/// Arguments for one mpv capture. `--target-trc`/`--tone-mapping` map HDR
/// sources down to sRGB so all screenshots look consistent.
pub fn mpv_args(video: &Path, at_seconds: f64, output: &Path) -> Vec<String> {
    vec![
        String::from("--no-audio"),
        format!("--start={:.2}", at_seconds),
        String::from("--frames=1"),
        String::from("--target-trc=srgb"),
        String::from("--tone-mapping=hable"),
        format!("--o={}", output.display()),
        video.display().to_string(),
    ]
}

pub struct MpvFrameCapturer;

#[async_trait]
impl FrameCapturer for MpvFrameCapturer {
    async fn capture_frame(
        &self,
        video: &Path,
        at_seconds: f64,
        output: &Path,
    ) -> io::Result<Output> {
        Command::new("mpv")
            .args(mpv_args(video, at_seconds, output))
            .output()
            .await
    }
}

/// Runs the standalone `mediainfo` tool for the /mediainfo endpoint.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait MediaInfoRunner: Send + Sync {
    async fn media_info(&self, video: &Path) -> io::Result<Output>;
}

pub struct RealMediaInfoRunner;

#[async_trait]
impl MediaInfoRunner for RealMediaInfoRunner {
    async fn media_info(&self, video: &Path) -> io::Result<Output> {
        Command::new("mediainfo")
            .arg("--Output=text")
            .arg(video)
            .output()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn mpv_args_include_tone_mapping_and_timestamp() {
        let args = mpv_args(Path::new("/media/movie.mkv"), 123.456, Path::new("/tmp/out.png"));
        assert!(args.contains(&String::from("--start=123.46")));
        assert!(args.contains(&String::from("--frames=1")));
        assert!(args.contains(&String::from("--target-trc=srgb")));
        assert!(args.contains(&String::from("--tone-mapping=hable")));
        assert!(args.contains(&String::from("--o=/tmp/out.png")));
        assert_eq!(args.last().unwrap(), "/media/movie.mkv");
    }
}
