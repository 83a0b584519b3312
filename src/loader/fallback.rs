//! Static fallback fragments for required components
//!
//! When a required component fails to load, its container receives one
//! of these hard-coded fragments so required UI regions are never
//! blank. The discussion fallback keeps the `comments-list` slot so
//! data rendering still has a target in degraded mode.

/// Fallback HTML for a component, by name
pub fn fallback_fragment(name: &str) -> String {
    match name {
        "navbar" => r#"<div class="navbar fallback-navbar">
  <div class="navbar-back" id="navbar-back"></div>
  <div class="navbar-title">Topic discussion</div>
  <div class="navbar-actions">
    <button id="navbar-close" title="Close"></button>
  </div>
</div>"#
            .to_string(),

        "discussion" => r#"<div class="discussion-section fallback-discussion">
  <div class="discussion-header">
    <h3>Discussion</h3>
    <p class="fallback-note">Component failed to load, functionality is limited</p>
  </div>
  <div id="comments-list">
    <div class="loading-placeholder">
      <p>Loading comments...</p>
    </div>
  </div>
</div>"#
            .to_string(),

        "comments" => r#"<div class="comments-container fallback-comments">
  <div id="comments-list">
    <div class="error-placeholder">
      <p>Comments failed to load</p>
      <button id="comments-reload">Reload</button>
    </div>
  </div>
</div>"#
            .to_string(),

        "aiAssistant" => r#"<div class="ai-assistant-fallback">
  <p class="fallback-note">AI assistant is currently unavailable</p>
</div>"#
            .to_string(),

        other => format!(
            r#"<div class="component-fallback">
  <p class="fallback-note">Component "{other}" failed to load</p>
</div>"#
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discussion_fallback_keeps_comment_target() {
        assert!(fallback_fragment("discussion").contains(r#"id="comments-list""#));
    }

    #[test]
    fn test_unknown_component_gets_generic_fallback() {
        let html = fallback_fragment("sidebar");
        assert!(html.contains("component-fallback"));
        assert!(html.contains("sidebar"));
    }
}
