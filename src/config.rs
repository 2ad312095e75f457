//! Environment configuration.

use std::env;

use crate::screenshot::upload::PIXHOST_API;

#[derive(Clone, Debug)]
pub struct Config {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Image host upload endpoint
    pub image_host_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            addr: env::var("ADDR").unwrap_or_else(|_| String::from("127.0.0.1")),
            port: env::var("PORT").unwrap_or_else(|_| String::from("9090")),
            image_host_url: env::var("IMAGE_HOST_URL")
                .unwrap_or_else(|_| String::from(PIXHOST_API)),
        }
    }
}
