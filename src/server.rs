//! Axum router and request handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::media::cmd::{
    MediaInfoRunner, MpvFrameCapturer, RealMediaInfoRunner, RealMediaProber,
};
use crate::media::locate::find_target_video;
use crate::screenshot::upload::PixhostClient;
use crate::screenshot::ScreenshotPipeline;

pub struct AppState {
    pub pipeline: ScreenshotPipeline<RealMediaProber, MpvFrameCapturer, PixhostClient>,
    pub media_info: RealMediaInfoRunner,
}

#[derive(Debug, Deserialize)]
pub struct ScreenshotRequest {
    /// Missing and empty are treated alike: both get the 400 response.
    #[serde(default)]
    pub remote_path: String,
}

#[derive(Debug, Serialize)]
pub struct ScreenshotResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbcode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MediaInfoRequest {
    #[serde(default)]
    pub remote_path: String,
}

#[derive(Debug, Serialize)]
pub struct MediaInfoResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mediainfo_text: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/screenshot", post(take_screenshots))
        .route("/mediainfo", post(media_info))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn take_screenshots(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScreenshotRequest>,
) -> (StatusCode, Json<ScreenshotResponse>) {
    match state.pipeline.run(&request.remote_path).await {
        Ok(bbcode) => (
            StatusCode::OK,
            Json(ScreenshotResponse {
                success: true,
                message: String::from("all screenshots uploaded"),
                bbcode: Some(bbcode),
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "screenshot request failed");
            (
                e.status(),
                Json(ScreenshotResponse {
                    success: false,
                    message: e.to_string(),
                    bbcode: None,
                }),
            )
        }
    }
}

async fn media_info(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MediaInfoRequest>,
) -> (StatusCode, Json<MediaInfoResponse>) {
    if request.remote_path.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            MediaInfoResponse::failure(String::from("remote_path must not be empty")),
        );
    }
    let video = match find_target_video(Path::new(&request.remote_path)) {
        Ok(video) => video,
        Err(e) => return (e.status(), MediaInfoResponse::failure(e.to_string())),
    };

    match state.media_info.media_info(&video).await {
        Ok(output) if output.status.success() => (
            StatusCode::OK,
            Json(MediaInfoResponse {
                success: true,
                message: String::from("mediainfo generated"),
                mediainfo_text: Some(
                    String::from_utf8_lossy(&output.stdout).trim().to_string(),
                ),
            }),
        ),
        Ok(output) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            MediaInfoResponse::failure(format!(
                "mediainfo exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            MediaInfoResponse::failure(format!("failed to run mediainfo: {e}")),
        ),
    }
}

impl MediaInfoResponse {
    fn failure(message: String) -> Json<Self> {
        Json(Self {
            success: false,
            message,
            mediainfo_text: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screenshot_request_tolerates_missing_field() {
        let request: ScreenshotRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.remote_path, "");
    }

    #[test]
    fn success_response_serializes_with_bbcode() {
        let response = ScreenshotResponse {
            success: true,
            message: String::from("all screenshots uploaded"),
            bbcode: Some(String::from("[img]https://img1.pixhost.to/images/1/a.jpg[/img]")),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert!(json["bbcode"].as_str().unwrap().starts_with("[img]"));
    }

    #[test]
    fn failure_response_omits_bbcode_entirely() {
        let response = ScreenshotResponse {
            success: false,
            message: String::from("boom"),
            bbcode: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("bbcode").is_none());
    }
}
