//! Resource fetching abstraction
//!
//! The loader and data layer are agnostic about where fragments and
//! fixtures come from. [`HttpFetcher`] serves the browser-like case
//! (relative paths against a base origin); [`FsFetcher`] reads the same
//! relative paths from a site directory, which is what `agora render`
//! and the tests use.

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::PathBuf;
use thiserror::Error;

/// Why a resource could not be fetched
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for '{path}' failed with status {status}")]
    Status { path: String, status: u16 },
    #[error("request for '{path}' failed: {reason}")]
    Transport { path: String, reason: String },
}

/// Fetches text resources by site-relative path
pub trait ResourceFetcher: Send + Sync {
    fn fetch_text<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<String, FetchError>>;
}

/// HTTP-backed fetcher resolving paths against a base URL
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        // Build the HTTP client with a conservative timeout; fragment and
        // fixture files are small, anything slower is a dead server
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()
            .context("Failed to create HTTP client")?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { client, base_url })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl ResourceFetcher for HttpFetcher {
    fn fetch_text<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<String, FetchError>> {
        async move {
            let url = self.url_for(path);
            let response =
                self.client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| FetchError::Transport {
                        path: path.to_string(),
                        reason: e.to_string(),
                    })?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    path: path.to_string(),
                    status: status.as_u16(),
                });
            }

            response.text().await.map_err(|e| FetchError::Transport {
                path: path.to_string(),
                reason: e.to_string(),
            })
        }
        .boxed()
    }
}

/// Filesystem-backed fetcher rooted at a site directory
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceFetcher for FsFetcher {
    fn fetch_text<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<String, FetchError>> {
        async move {
            let full = self.root.join(path.trim_start_matches('/'));
            tokio::fs::read_to_string(&full)
                .await
                .map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => FetchError::Status {
                        path: path.to_string(),
                        status: 404,
                    },
                    _ => FetchError::Transport {
                        path: path.to_string(),
                        reason: e.to_string(),
                    },
                })
        }
        .boxed()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fs_fetcher_reads_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("components/navbar")).unwrap();
        std::fs::write(
            dir.path().join("components/navbar/navbar.html"),
            "<nav></nav>",
        )
        .unwrap();

        let fetcher = FsFetcher::new(dir.path());
        let body = fetcher
            .fetch_text("components/navbar/navbar.html")
            .await
            .unwrap();
        assert_eq!(body, "<nav></nav>");

        // Leading slash is tolerated, matching URL-style paths
        let body = fetcher
            .fetch_text("/components/navbar/navbar.html")
            .await
            .unwrap();
        assert_eq!(body, "<nav></nav>");
    }

    #[tokio::test]
    async fn test_fs_fetcher_missing_file_maps_to_404() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FsFetcher::new(dir.path());
        match fetcher.fetch_text("missing.html").await {
            Err(FetchError::Status { status, .. }) => assert_eq!(status, 404),
            other => panic!("Expected 404 status error, got {:?}", other),
        }
    }

    #[test]
    fn test_http_fetcher_joins_urls() {
        let fetcher = HttpFetcher::new("http://localhost:3000/").unwrap();
        assert_eq!(
            fetcher.url_for("/assets/data/comments.json"),
            "http://localhost:3000/assets/data/comments.json"
        );
        assert_eq!(
            fetcher.url_for("index.html"),
            "http://localhost:3000/index.html"
        );
    }
}
