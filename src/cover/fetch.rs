use std::io::{self, Read};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use crate::config::CoverSettings;

/// What a successful cover probe learned about the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverMeta {
    pub content_type: Option<String>,
    pub bytes: u64,
}

/// Something that can fetch a cover. Runs on the worker thread.
pub trait CoverFetcher: Send + 'static {
    fn fetch(&self, url: &str) -> Result<CoverMeta, String>;
}

/// Fetches covers over HTTP with a request timeout and a body size cap.
pub struct HttpFetcher {
    client: Client,
    max_bytes: u64,
}

impl HttpFetcher {
    pub fn new(settings: &CoverSettings) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .user_agent(concat!("jukebox/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            max_bytes: settings.max_bytes,
        })
    }
}

impl CoverFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<CoverMeta, String> {
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.to_string())?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Read one byte past the cap so an oversized body is detectable.
        let mut body = response.take(self.max_bytes.saturating_add(1));
        let bytes = io::copy(&mut body, &mut io::sink()).map_err(|e| e.to_string())?;
        if bytes > self.max_bytes {
            return Err(format!("cover is larger than {} bytes", self.max_bytes));
        }

        Ok(CoverMeta {
            content_type,
            bytes,
        })
    }
}
