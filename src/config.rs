//! Configuration loading from `.env` files.

use std::{env, path::PathBuf};

/// Runtime settings derived from environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the hosted gateway, e.g. `https://xyz.example.co`.
    pub gateway_url: String,
    /// Anonymous API key for the gateway.
    pub gateway_key: String,
    /// Path of the JSON file holding the persisted session tokens.
    pub session_file: PathBuf,
}

impl Settings {
    /// Load settings from the specified `.env` file.
    ///
    /// Missing gateway credentials are not fatal: the app degrades to a
    /// state where every remote call fails at the transport layer, with a
    /// single warning printed here.
    pub fn from_env(path: &str) -> Self {
        let _ = dotenvy::from_filename(path);
        let gateway_url = env::var("GATEWAY_URL").unwrap_or_default();
        let gateway_key = env::var("GATEWAY_KEY").unwrap_or_default();
        if gateway_url.is_empty() || gateway_key.is_empty() {
            eprintln!(
                "warning: GATEWAY_URL or GATEWAY_KEY is not set; check your env file ({path})"
            );
        }
        let session_file = env::var("SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".inkpost-session.json"));
        Settings {
            gateway_url,
            gateway_key,
            session_file,
        }
    }

    /// True when both gateway values are present.
    pub fn configured(&self) -> bool {
        !self.gateway_url.is_empty() && !self.gateway_key.is_empty()
    }
}
