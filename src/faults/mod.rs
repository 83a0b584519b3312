// Fault handling - error counting, user feedback capping, bounded retry
//
// Every failure in the engine funnels through this service: it counts
// occurrences per (component, message) pair, logs through tracing, and
// surfaces a capped number of user-visible messages so a flapping
// component cannot flood the page. The retry helper re-invokes failed
// operations with a delay that grows linearly with the attempt number.

use crate::page::{FeedbackKind, Page};
use anyhow::{Error, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Occurrences of one (component, message) pair surfaced to the user
/// before further feedback is suppressed
const MAX_VISIBLE_OCCURRENCES: u32 = 3;

/// Upper bound on tracked (component, message) pairs. Component names
/// are a small static set today, but the map must not grow without
/// bound if they ever become dynamic. Pairs past the cap are logged but
/// treated as already suppressed.
const MAX_TRACKED_ERRORS: usize = 256;

/// Outcome of routing an error through the handler
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub component: String,
    pub message: String,
    pub count: u32,
    pub can_retry: bool,
}

struct FaultsInner {
    page: Page,
    counts: Mutex<HashMap<(String, String), u32>>,
    fallback_styles_installed: Mutex<bool>,
    max_retries: u32,
    base_delay: Duration,
}

/// Shared fault-handling service
#[derive(Clone)]
pub struct ErrorHandler {
    inner: Arc<FaultsInner>,
}

impl ErrorHandler {
    pub fn new(page: Page, max_retries: u32, base_delay: Duration) -> Self {
        Self {
            inner: Arc::new(FaultsInner {
                page,
                counts: Mutex::new(HashMap::new()),
                fallback_styles_installed: Mutex::new(false),
                max_retries,
                base_delay,
            }),
        }
    }

    /// Route an error through counting, logging and capped user feedback
    pub fn handle(&self, component: &str, error: &Error, context: Option<&str>) -> ErrorReport {
        let message = error.to_string();
        let key = (component.to_string(), message.clone());

        let count = {
            let mut counts = self.inner.counts.lock().unwrap();
            if let Some(existing) = counts.get_mut(&key) {
                *existing += 1;
                *existing
            } else if counts.len() < MAX_TRACKED_ERRORS {
                counts.insert(key, 1);
                1
            } else {
                // Past the cap: do not admit new keys, treat as suppressed
                u32::MAX
            }
        };

        tracing::error!(
            component = component,
            context = context.unwrap_or(""),
            occurrence = count,
            "Error occurred: {message}"
        );

        if count <= MAX_VISIBLE_OCCURRENCES {
            self.inner.page.push_feedback(
                &format!("{component}: {}", user_friendly_message(&message)),
                FeedbackKind::Error,
            );
        }

        ErrorReport {
            component: component.to_string(),
            message,
            count,
            can_retry: count < self.inner.max_retries,
        }
    }

    /// Re-invoke `op` up to `max_retries` times, sleeping
    /// `base_delay × attempt` between attempts, rethrowing the last
    /// failure when every attempt is exhausted
    pub async fn retry<T, F, Fut>(&self, component: &str, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.retry_with(component, op, self.inner.max_retries).await
    }

    pub async fn retry_with<T, F, Fut>(&self, component: &str, op: F, max_retries: u32) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 1..=max_retries.max(1) {
            tracing::debug!(component = component, "Attempt {attempt}/{max_retries}");
            match op().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    tracing::warn!(component = component, "Attempt {attempt} failed: {error}");
                    last_error = Some(error);

                    if attempt < max_retries {
                        tokio::time::sleep(self.inner.base_delay * attempt).await;
                    }
                }
            }
        }

        Err(last_error.expect("retry ran at least one attempt"))
    }

    /// Run `op`; on failure, retry while the error's occurrence count is
    /// below the retry ceiling; when that fails too, return `fallback`.
    /// Callers never observe an Err from this wrapper.
    pub async fn safe_async<T, F, Fut>(&self, component: &str, op: F, fallback: T) -> T
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match op().await {
            Ok(value) => value,
            Err(error) => {
                let report = self.handle(component, &error, None);
                if report.can_retry {
                    match self.retry(component, &op).await {
                        Ok(value) => return value,
                        Err(retry_error) => {
                            self.handle(component, &retry_error, Some("retry_failed"));
                        }
                    }
                }
                fallback
            }
        }
    }

    // ── Resource fallbacks ───────────────────────────────────────────

    /// Replace a failed image slot with a placeholder block carrying
    /// the alt text
    pub fn handle_image_error(&self, element_id: &str, alt: &str) {
        tracing::error!(
            component = "ResourceLoader",
            "Failed to load img: {element_id}"
        );
        let alt = if alt.is_empty() { "No description" } else { alt };
        self.inner.page.add_class(element_id, "resource-error");
        self.inner.page.set_html(
            element_id,
            &format!(
                "<div class=\"image-placeholder\"><span>Image not available</span><small>{alt}</small></div>"
            ),
        );
    }

    /// Log a failed stylesheet and install the one-time fallback style
    /// hook so the page keeps a usable baseline
    pub fn handle_style_error(&self, href: &str) {
        tracing::warn!(component = "StyleLoader", "Stylesheet failed to load: {href}");

        let mut installed = self.inner.fallback_styles_installed.lock().unwrap();
        if !*installed {
            self.inner.page.register("fallback-styles");
            self.inner.page.set_html(
                "fallback-styles",
                ".resource-error { border: 2px dashed #ccc; background: #f5f5f5; }",
            );
            *installed = true;
        }
    }

    // ── Introspection ────────────────────────────────────────────────

    /// Occurrence count for one (component, message) pair
    pub fn occurrences(&self, component: &str, message: &str) -> u32 {
        self.inner
            .counts
            .lock()
            .unwrap()
            .get(&(component.to_string(), message.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Total error counts aggregated per component
    pub fn error_stats(&self) -> HashMap<String, u32> {
        let counts = self.inner.counts.lock().unwrap();
        let mut stats: HashMap<String, u32> = HashMap::new();
        for ((component, _), count) in counts.iter() {
            *stats.entry(component.clone()).or_insert(0) += count;
        }
        stats
    }

    pub fn clear_counts(&self) {
        self.inner.counts.lock().unwrap().clear();
    }
}

/// Convert technical errors into user-friendly messages
fn user_friendly_message(message: &str) -> &'static str {
    let lowered = message.to_lowercase();

    if lowered.contains("network") || lowered.contains("fetch") || lowered.contains("transport") {
        return "Network connection issue. Please check your internet connection.";
    }
    if lowered.contains("not found") || lowered.contains("404") {
        return "Content not found. It may have been moved or deleted.";
    }
    if lowered.contains("permission") || lowered.contains("unauthorized") {
        return "Access denied. You may not have permission to view this content.";
    }
    if lowered.contains("timeout") {
        return "Request timed out. Please try again.";
    }

    "Something went wrong. Please try refreshing the page."
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn handler() -> (ErrorHandler, Page) {
        let page = Page::new();
        let handler = ErrorHandler::new(page.clone(), 3, Duration::from_millis(1));
        (handler, page)
    }

    #[test]
    fn test_occurrences_are_counted_per_pair() {
        let (handler, _page) = handler();

        handler.handle("loader", &anyhow!("fetch failed"), None);
        handler.handle("loader", &anyhow!("fetch failed"), None);
        handler.handle("loader", &anyhow!("parse failed"), None);
        handler.handle("data", &anyhow!("fetch failed"), None);

        assert_eq!(handler.occurrences("loader", "fetch failed"), 2);
        assert_eq!(handler.occurrences("loader", "parse failed"), 1);
        assert_eq!(handler.occurrences("data", "fetch failed"), 1);

        let stats = handler.error_stats();
        assert_eq!(stats["loader"], 3);
        assert_eq!(stats["data"], 1);
    }

    #[test]
    fn test_feedback_is_capped_per_pair() {
        let (handler, page) = handler();

        for _ in 0..5 {
            handler.handle("loader", &anyhow!("fetch failed"), None);
        }
        // Only the first three occurrences surface to the user
        assert_eq!(page.feedback().len(), 3);

        // A different message gets its own cap
        handler.handle("loader", &anyhow!("parse failed"), None);
        assert_eq!(page.feedback().len(), 4);
    }

    #[tokio::test]
    async fn test_retry_returns_first_success() {
        let (handler, _page) = handler();
        let attempts = AtomicU32::new(0);

        let result = handler
            .retry("loader", || {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(anyhow!("transient"))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_rethrows_last_error() {
        let (handler, _page) = handler();
        let attempts = AtomicU32::new(0);

        let result: Result<()> = handler
            .retry("loader", || {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Err(anyhow!("failure {n}")) }
            })
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(result.unwrap_err().to_string(), "failure 3");
    }

    #[tokio::test]
    async fn test_safe_async_returns_fallback_after_retries() {
        let (handler, _page) = handler();
        let attempts = AtomicU32::new(0);

        let value = handler
            .safe_async(
                "loader",
                || {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    async { Err(anyhow!("always broken")) }
                },
                42,
            )
            .await;

        assert_eq!(value, 42);
        // Initial attempt plus the retry sequence
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_safe_async_passes_through_success() {
        let (handler, page) = handler();
        let value = handler
            .safe_async("loader", || async { Ok(7) }, 0)
            .await;
        assert_eq!(value, 7);
        assert!(page.feedback().is_empty());
    }

    #[test]
    fn test_image_fallback_carries_alt_text() {
        let (handler, page) = handler();
        page.register("comment-1-avatar");

        handler.handle_image_error("comment-1-avatar", "avatar of Alice");

        let html = page.html("comment-1-avatar").unwrap();
        assert!(html.contains("Image not available"));
        assert!(html.contains("avatar of Alice"));
        assert!(page.has_class("comment-1-avatar", "resource-error"));
    }

    #[test]
    fn test_style_fallback_installs_once() {
        let (handler, page) = handler();
        handler.handle_style_error("components/navbar/navbar.css");
        handler.handle_style_error("components/discussion/discussion.css");
        assert!(page.contains("fallback-styles"));
    }
}
