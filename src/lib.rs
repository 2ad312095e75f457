//! Paparazzo - Remote Screenshot Service
//!
//! Given a path to downloaded episode/movie content, the service locates the
//! target video file, picks screenshot timestamps (preferring moments when a
//! subtitle is on screen), captures frames with mpv, compresses them to JPEG,
//! uploads them to an image host and returns a BBCode block of image links.
//!
//! Layout:
//! - media/: video location, ffprobe probing, subtitle event extraction,
//!   timestamp planning
//! - screenshot/: the capture -> convert -> upload pipeline
//! - server: axum router and handlers
//! - config: environment configuration

pub mod config;
pub mod error;
pub mod media;
pub mod screenshot;
pub mod server;
