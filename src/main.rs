use paparazzo::config::Config;
use paparazzo::media::cmd::{MpvFrameCapturer, RealMediaInfoRunner, RealMediaProber};
use paparazzo::screenshot::upload::PixhostClient;
use paparazzo::screenshot::ScreenshotPipeline;
use paparazzo::server::{router, AppState};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::fmt::init();

    let host =
        PixhostClient::new(config.image_host_url.clone()).expect("Failed to build upload client");
    let state = Arc::new(AppState {
        pipeline: ScreenshotPipeline::new(RealMediaProber, MpvFrameCapturer, host),
        media_info: RealMediaInfoRunner,
    });

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.addr, config.port))
        .await
        .expect("Failed to bind TCP listener");
    tracing::info!("Listening at {}:{}", config.addr, config.port);
    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
