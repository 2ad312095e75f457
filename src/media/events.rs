//! Subtitle display-event extraction.
//!
//! Packets are probed only inside a few short windows spread across the
//! video, which bounds ffprobe cost on long files. Text subtitles carry a
//! duration per packet; bitmap (PGS) subtitles encode show/hide as pairs of
//! consecutive packets.

use serde::Deserialize;
use std::path::Path;

use crate::error::ExtractError;
use crate::media::cmd::MediaProber;
use crate::media::probe::{SubtitleKind, SubtitleTrack};

/// Shortest display interval worth sampling, in seconds.
pub const MIN_EVENT_SECONDS: f64 = 0.1;

const PROBE_POINTS: &[f64] = &[0.2, 0.4, 0.6, 0.8];
const PROBE_WINDOW_SECONDS: f64 = 60.0;

/// One interval during which a subtitle is shown. `end > start` always holds
/// for extracted events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayEvent {
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Deserialize)]
struct PacketList {
    #[serde(default)]
    packets: Vec<SubtitlePacket>,
}

#[derive(Debug, Deserialize)]
struct SubtitlePacket {
    pts_time: Option<String>,
    duration_time: Option<String>,
}

/// ffprobe `-read_intervals` argument: windows starting at fixed fractions
/// of the duration, each `START%END` and comma-joined.
pub fn read_intervals(duration: f64) -> String {
    PROBE_POINTS
        .iter()
        .map(|point| {
            let start = duration * point;
            let end = (start + PROBE_WINDOW_SECONDS).min(duration);
            format!("{:.2}%{:.2}", start, end)
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// ffprobe sometimes writes warning text before the JSON body; parse from
/// the first brace onward.
fn json_body(raw: &str) -> Result<&str, ExtractError> {
    raw.find('{')
        .map(|start| &raw[start..])
        .ok_or(ExtractError::MalformedOutput)
}

pub async fn extract_display_events(
    prober: &impl MediaProber,
    video: &Path,
    track: &SubtitleTrack,
    duration: f64,
) -> Result<Vec<DisplayEvent>, ExtractError> {
    let kind = track
        .kind()
        .ok_or_else(|| ExtractError::UnsupportedCodec(track.codec.clone()))?;

    let intervals = read_intervals(duration);
    tracing::debug!(stream = track.index, %intervals, "scanning subtitle packets in bounded windows");
    let output = prober
        .probe_subtitle_packets(video, track.index, &intervals)
        .await
        .map_err(|e| ExtractError::Probe(e.to_string()))?;
    if !output.status.success() {
        return Err(ExtractError::Probe(format!(
            "ffprobe exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    let parsed: PacketList =
        serde_json::from_str(json_body(&raw)?).map_err(|_| ExtractError::MalformedOutput)?;

    let events = match kind {
        SubtitleKind::Text => text_events(&parsed.packets),
        SubtitleKind::Bitmap => bitmap_events(&parsed.packets)?,
    };
    if events.is_empty() {
        return Err(ExtractError::NoEvents);
    }
    tracing::info!(count = events.len(), "extracted subtitle display events");
    Ok(events)
}

/// Text subtitle packets carry their own display duration.
fn text_events(packets: &[SubtitlePacket]) -> Vec<DisplayEvent> {
    packets
        .iter()
        .filter_map(|packet| {
            let start: f64 = packet.pts_time.as_deref()?.parse().ok()?;
            let length: f64 = packet.duration_time.as_deref()?.parse().ok()?;
            (length > MIN_EVENT_SECONDS).then_some(DisplayEvent {
                start,
                end: start + length,
            })
        })
        .collect()
}

/// Bitmap packets alternate show/hide in stream order; consecutive packets
/// are paired and an odd trailing packet is dropped.
fn bitmap_events(packets: &[SubtitlePacket]) -> Result<Vec<DisplayEvent>, ExtractError> {
    if packets.len() < 2 {
        return Err(ExtractError::TooFewPackets);
    }
    Ok(packets
        .chunks_exact(2)
        .filter_map(|pair| {
            let start: f64 = pair[0].pts_time.as_deref()?.parse().ok()?;
            let end: f64 = pair[1].pts_time.as_deref()?.parse().ok()?;
            (end > start && end - start > MIN_EVENT_SECONDS)
                .then_some(DisplayEvent { start, end })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::cmd::MockMediaProber;
    use std::os::unix::process::ExitStatusExt;
    use std::path::PathBuf;
    use std::process::{ExitStatus, Output};

    fn mock_output(stdout: &str, stderr: &str, success: bool) -> std::io::Result<Output> {
        Ok(Output {
            status: if success {
                ExitStatus::from_raw(0)
            } else {
                ExitStatus::from_raw(1)
            },
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        })
    }

    fn video() -> PathBuf {
        PathBuf::from("dummy.mkv")
    }

    fn text_track() -> SubtitleTrack {
        SubtitleTrack {
            index: 2,
            codec: String::from("subrip"),
        }
    }

    fn pgs_track() -> SubtitleTrack {
        SubtitleTrack {
            index: 3,
            codec: String::from("hdmv_pgs_subtitle"),
        }
    }

    fn packet_probe(json: &'static str) -> MockMediaProber {
        let mut prober = MockMediaProber::new();
        prober
            .expect_probe_subtitle_packets()
            .times(1)
            .returning(move |_, _, _| Box::pin(async move { mock_output(json, "", true) }));
        prober
    }

    #[test]
    fn read_intervals_covers_four_windows() {
        assert_eq!(
            read_intervals(1000.0),
            "200.00%260.00,400.00%460.00,600.00%660.00,800.00%860.00"
        );
    }

    #[test]
    fn read_intervals_clamps_to_duration() {
        // 80% of 120s is 96s; the window would run past the end.
        assert_eq!(
            read_intervals(120.0),
            "24.00%84.00,48.00%108.00,72.00%120.00,96.00%120.00"
        );
    }

    #[tokio::test]
    async fn text_packets_become_events_with_their_duration() {
        let prober = packet_probe(
            r#"{"packets":[
                {"pts_time":"310.5","duration_time":"2.5"},
                {"pts_time":"420.0","duration_time":"1.0"}
            ]}"#,
        );
        let events = extract_display_events(&prober, &video(), &text_track(), 1000.0)
            .await
            .unwrap();
        assert_eq!(
            events,
            vec![
                DisplayEvent { start: 310.5, end: 313.0 },
                DisplayEvent { start: 420.0, end: 421.0 },
            ]
        );
    }

    #[tokio::test]
    async fn blink_length_text_packets_are_discarded() {
        let prober = packet_probe(
            r#"{"packets":[
                {"pts_time":"310.5","duration_time":"0.05"},
                {"pts_time":"311.0","duration_time":"0.1"},
                {"pts_time":"312.0","duration_time":"3.0"}
            ]}"#,
        );
        let events = extract_display_events(&prober, &video(), &text_track(), 1000.0)
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].end - events[0].start > MIN_EVENT_SECONDS);
    }

    #[tokio::test]
    async fn leading_warning_text_before_json_is_tolerated() {
        let prober = packet_probe(
            "[matroska @ 0x5555] Element at 0x42 ending beyond containing master\n{\"packets\":[{\"pts_time\":\"10.0\",\"duration_time\":\"2.0\"}]}",
        );
        let events = extract_display_events(&prober, &video(), &text_track(), 1000.0)
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn output_without_json_is_malformed() {
        let prober = packet_probe("no braces here");
        let err = extract_display_events(&prober, &video(), &text_track(), 1000.0)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::MalformedOutput));
    }

    #[tokio::test]
    async fn zero_valid_events_is_an_extraction_error() {
        let prober = packet_probe(r#"{"packets":[]}"#);
        let err = extract_display_events(&prober, &video(), &text_track(), 1000.0)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::NoEvents));
    }

    #[tokio::test]
    async fn bitmap_packets_are_paired_in_stream_order() {
        let prober = packet_probe(
            r#"{"packets":[
                {"pts_time":"300.0"},
                {"pts_time":"302.5"},
                {"pts_time":"400.0"},
                {"pts_time":"401.0"}
            ]}"#,
        );
        let events = extract_display_events(&prober, &video(), &pgs_track(), 1000.0)
            .await
            .unwrap();
        assert_eq!(
            events,
            vec![
                DisplayEvent { start: 300.0, end: 302.5 },
                DisplayEvent { start: 400.0, end: 401.0 },
            ]
        );
    }

    #[tokio::test]
    async fn odd_leftover_bitmap_packet_never_becomes_an_event() {
        let prober = packet_probe(
            r#"{"packets":[
                {"pts_time":"300.0"},
                {"pts_time":"302.5"},
                {"pts_time":"400.0"}
            ]}"#,
        );
        let events = extract_display_events(&prober, &video(), &pgs_track(), 1000.0)
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn single_bitmap_packet_cannot_be_paired() {
        let prober = packet_probe(r#"{"packets":[{"pts_time":"300.0"}]}"#);
        let err = extract_display_events(&prober, &video(), &pgs_track(), 1000.0)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::TooFewPackets));
    }

    #[tokio::test]
    async fn inverted_or_tiny_bitmap_pairs_are_discarded() {
        let prober = packet_probe(
            r#"{"packets":[
                {"pts_time":"302.5"},
                {"pts_time":"300.0"},
                {"pts_time":"400.0"},
                {"pts_time":"400.05"}
            ]}"#,
        );
        let err = extract_display_events(&prober, &video(), &pgs_track(), 1000.0)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::NoEvents));
    }

    #[tokio::test]
    async fn unsupported_codec_is_reported_before_probing() {
        let prober = MockMediaProber::new();
        let track = SubtitleTrack {
            index: 5,
            codec: String::from("dvd_subtitle"),
        };
        let err = extract_display_events(&prober, &video(), &track, 1000.0)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedCodec(_)));
    }

    #[tokio::test]
    async fn failed_packet_probe_is_an_extraction_error() {
        let mut prober = MockMediaProber::new();
        prober
            .expect_probe_subtitle_packets()
            .times(1)
            .returning(|_, _, _| Box::pin(async { mock_output("", "io error", false) }));
        let err = extract_display_events(&prober, &video(), &text_track(), 1000.0)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Probe(_)));
    }
}
