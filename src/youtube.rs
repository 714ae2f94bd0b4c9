use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use crate::error::{QvError, Result};
use crate::tools::{self, StdoutMode};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Finds where a video's subtitle track lives, and its title
#[async_trait]
pub trait SubtitleLocator: Send + Sync {
    /// Direct URL of the subtitle track; empty when the video publishes none.
    async fn subtitle_url(&self, url: &str) -> Result<String>;

    async fn title(&self, url: &str) -> Result<String>;
}

/// Downloads a raw subtitle body
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<String>;
}

/// yt-dlp as the subtitle locator
#[derive(Debug, Clone)]
pub struct YtDlp {
    lang: String,
    timeout: Duration,
}

impl YtDlp {
    pub fn new(lang: impl Into<String>, timeout: Duration) -> Self {
        Self {
            lang: lang.into(),
            timeout,
        }
    }

    fn subtitle_args<'a>(&'a self, print: &'a str, url: &'a str) -> Vec<&'a str> {
        vec![
            "-q",
            "--skip-download",
            "--convert-subs",
            "srt",
            "--write-sub",
            "--sub-langs",
            self.lang.as_str(),
            "--write-auto-sub",
            "--print",
            print,
            url,
        ]
    }
}

#[async_trait]
impl SubtitleLocator for YtDlp {
    async fn subtitle_url(&self, url: &str) -> Result<String> {
        let print = format!("requested_subtitles.{}.url", self.lang);
        let out = tools::run_tool(
            tools::YT_DLP,
            &self.subtitle_args(&print, url),
            None,
            StdoutMode::Capture,
            self.timeout,
        )
        .await?;
        let sub_url = first_line(&out);
        // yt-dlp prints "NA" for a missing field
        if sub_url == "NA" {
            return Ok(String::new());
        }
        debug!("Subtitle track URL: {sub_url}");
        Ok(sub_url)
    }

    async fn title(&self, url: &str) -> Result<String> {
        let out = tools::run_tool(
            tools::YT_DLP,
            &["-q", "--skip-download", "--get-title", url],
            None,
            StdoutMode::Capture,
            self.timeout,
        )
        .await?;
        Ok(first_line(&out))
    }
}

fn first_line(out: &str) -> String {
    out.trim().lines().next().unwrap_or("").trim().to_string()
}

/// curl as the transport
#[derive(Debug, Clone)]
pub struct CurlTransport {
    timeout: Duration,
}

impl CurlTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Transport for CurlTransport {
    async fn get(&self, url: &str) -> Result<String> {
        tools::run_tool(tools::CURL, &["-sSL", "--fail", url], None, StdoutMode::Capture, self.timeout).await
    }
}

/// In-process HTTP transport, for machines without curl
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| QvError::tool("http", e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String> {
        debug!("Fetching subtitles over HTTP: {url}");
        let http_err = |e: reqwest::Error| QvError::tool("http", e.to_string());
        self.client
            .get(url)
            .send()
            .await
            .map_err(http_err)?
            .error_for_status()
            .map_err(http_err)?
            .text()
            .await
            .map_err(http_err)
    }
}
