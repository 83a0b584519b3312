// Data module - fixture loading, caching, and page rendering
//
// Three JSON fixtures stand in for backend API responses: topic info,
// comments, and attachments. Each is fetched at most once per cache
// lifetime; failures are logged and degrade to safe empty defaults so
// callers never handle an Err from the public load functions. The
// render functions are pure page writers: absent targets make them
// no-ops so partial pages degrade gracefully.

pub mod models;

use crate::faults::ErrorHandler;
use crate::fetch::ResourceFetcher;
use crate::page::Page;
use anyhow::{Context, Result};
use models::{Attachment, AttachmentsFixture, Comment, CommentKind, CommentsFixture, Topic};
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex};

const TOPIC_INFO_PATH: &str = "assets/data/topic-info.json";
const COMMENTS_PATH: &str = "assets/data/comments.json";
const ATTACHMENTS_PATH: &str = "assets/data/attachments.json";

/// Lazily populated fixture cache. Entries are either fully absent
/// (never fetched) or fully populated, never partial.
#[derive(Default)]
struct DataCache {
    topic: Option<Topic>,
    comments: Option<Vec<Comment>>,
    attachments: Option<Vec<Attachment>>,
}

/// A mutation applied to a cached comment (no backing store; changes
/// live for the page session only)
#[derive(Debug, Clone)]
pub enum Interaction {
    Like(u32),
    Dislike(u32),
    Reply(Comment),
}

struct DataInner {
    fetcher: Arc<dyn ResourceFetcher>,
    page: Page,
    faults: ErrorHandler,
    cache: Mutex<DataCache>,
}

/// Fetch-and-cache layer over the three JSON fixtures
#[derive(Clone)]
pub struct DataManager {
    inner: Arc<DataInner>,
}

impl DataManager {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>, page: Page, faults: ErrorHandler) -> Self {
        Self {
            inner: Arc::new(DataInner {
                fetcher,
                page,
                faults,
                cache: Mutex::new(DataCache::default()),
            }),
        }
    }

    async fn fetch_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.inner.fetcher.fetch_text(path).await?;
        serde_json::from_str(&body).with_context(|| format!("Failed to parse {path}"))
    }

    // ── Loads (cache-first, error-swallowing) ────────────────────────

    async fn try_load_topic_info(&self) -> Result<Topic> {
        if let Some(topic) = self.inner.cache.lock().unwrap().topic.clone() {
            return Ok(topic);
        }
        let topic: Topic = self.fetch_json(TOPIC_INFO_PATH).await?;
        self.inner.cache.lock().unwrap().topic = Some(topic.clone());
        Ok(topic)
    }

    async fn try_load_comments(&self) -> Result<Vec<Comment>> {
        if let Some(comments) = self.inner.cache.lock().unwrap().comments.clone() {
            return Ok(comments);
        }
        let fixture: CommentsFixture = self.fetch_json(COMMENTS_PATH).await?;
        self.inner.cache.lock().unwrap().comments = Some(fixture.comments.clone());
        Ok(fixture.comments)
    }

    async fn try_load_attachments(&self) -> Result<Vec<Attachment>> {
        if let Some(attachments) = self.inner.cache.lock().unwrap().attachments.clone() {
            return Ok(attachments);
        }
        let fixture: AttachmentsFixture = self.fetch_json(ATTACHMENTS_PATH).await?;
        self.inner.cache.lock().unwrap().attachments = Some(fixture.attachments.clone());
        Ok(fixture.attachments)
    }

    /// Load topic info, degrading to an empty topic on failure
    pub async fn load_topic_info(&self) -> Topic {
        match self.try_load_topic_info().await {
            Ok(topic) => topic,
            Err(error) => {
                tracing::error!(component = "DataManager", "Error loading data: {error}");
                Topic::default()
            }
        }
    }

    /// Load comments, degrading to an empty list on failure
    pub async fn load_comments_data(&self) -> Vec<Comment> {
        match self.try_load_comments().await {
            Ok(comments) => comments,
            Err(error) => {
                tracing::error!(component = "DataManager", "Error loading data: {error}");
                Vec::new()
            }
        }
    }

    /// Load attachments, degrading to an empty list on failure
    pub async fn load_attachments_data(&self) -> Vec<Attachment> {
        match self.try_load_attachments().await {
            Ok(attachments) => attachments,
            Err(error) => {
                tracing::error!(component = "DataManager", "Error loading data: {error}");
                Vec::new()
            }
        }
    }

    /// Drop every cache entry; the next load fetches fresh
    pub fn clear_cache(&self) {
        let mut cache = self.inner.cache.lock().unwrap();
        cache.topic = None;
        cache.comments = None;
        cache.attachments = None;
    }

    // ── Cache access & mutation ──────────────────────────────────────

    pub fn cached_comments(&self) -> Vec<Comment> {
        self.inner
            .cache
            .lock()
            .unwrap()
            .comments
            .clone()
            .unwrap_or_default()
    }

    pub fn cached_topic(&self) -> Option<Topic> {
        self.inner.cache.lock().unwrap().topic.clone()
    }

    /// Mutate a cached comment in place. Returns false when the comment
    /// is not in the cache.
    pub fn update_comment_interaction(&self, comment_id: &str, interaction: Interaction) -> bool {
        let mut cache = self.inner.cache.lock().unwrap();
        let Some(comments) = cache.comments.as_mut() else {
            return false;
        };
        let Some(comment) = comments.iter_mut().find(|c| c.id == comment_id) else {
            return false;
        };

        match interaction {
            Interaction::Like(value) => comment.likes = value,
            Interaction::Dislike(value) => comment.dislikes = value,
            Interaction::Reply(reply) => comment.replies.push(reply),
        }
        true
    }

    /// Append a new top-level comment to the cache (future-backend stub)
    pub fn save_comment(&self, comment: Comment) -> bool {
        let mut cache = self.inner.cache.lock().unwrap();
        match cache.comments.as_mut() {
            Some(comments) => {
                comments.push(comment);
                true
            }
            None => false,
        }
    }

    // ── Rendering ────────────────────────────────────────────────────

    /// Write topic fields into their fixed slots; absent slots are
    /// skipped so a partial page degrades instead of failing
    pub fn render_topic_info(&self, topic: &Topic) {
        let page = &self.inner.page;

        page.set_text("topic-title-text", &topic.title);
        if page.contains("topic-status") {
            let (label, state_class) = if topic.is_active() {
                ("In progress", "status-active")
            } else {
                ("Closed", "status-closed")
            };
            page.set_text("topic-status", label);
            page.set_class(
                "topic-status",
                &format!("topic-status topic-status-badge {state_class}"),
            );
        }

        if let Some(author) = &topic.author {
            page.set_src("topic-author-avatar", &author.avatar);
            page.set_text("topic-author-name", &author.name);
        }
        page.set_text("topic-timestamp", &topic.timestamp);

        let description = &topic.description;
        page.set_text("topic-background", &description.background);
        page.set_text("topic-core-issue", &description.core_issue);
        page.set_text("topic-controversy", &description.controversy);
        page.set_text("topic-key-question", &description.key_question);
        page.set_text("topic-expected-result", &description.expected_result);

        if let Some(polish) = topic.ai_polish.as_ref().filter(|p| p.enabled) {
            page.set_visible("ai-polish-card", true);
            page.set_text("ai-polish-message", &polish.message);
        } else {
            page.set_visible("ai-polish-card", false);
        }

        // Assistant fragment slots; all of these are absent when the
        // optional component did not mount
        if let Some(analysis) = &topic.ai_analysis {
            page.set_text("participant-count", &analysis.stats.participants.to_string());
            page.set_text("comment-count", &analysis.stats.comments.to_string());
            page.set_text("quality-score", &analysis.stats.quality_score.to_string());
            page.set_text("ai-core-tags", &analysis.tags.join(" "));
            page.set_text("ai-summary-text", &analysis.summary);
        }

        tracing::debug!(component = "DataManager", "Topic info rendered");
    }

    /// Rebuild the attachment list
    pub fn render_attachments(&self, attachments: &[Attachment]) {
        let page = &self.inner.page;
        if !page.contains("figma-attachment-list") {
            return;
        }

        page.clear_children("figma-attachment-list");
        if attachments.is_empty() {
            page.set_html(
                "figma-attachment-list",
                r#"<p class="attachment-empty">No attachments</p>"#,
            );
            return;
        }
        page.set_html("figma-attachment-list", "");

        for (index, attachment) in attachments.iter().enumerate() {
            let item_id = format!("attachment-{index}");
            page.append_child("figma-attachment-list", &item_id);
            page.set_class(&item_id, "attachment-item");
            page.set_html(
                &item_id,
                &format!(
                    "<img src='{icon}' alt='icon' class='attachment-icon'>\
                     <div class='attachment-info'>\
                     <div class='attachment-name' title='{name}'>{name}</div>\
                     <div class='attachment-size'>{size}</div>\
                     </div>",
                    icon = attachment.icon_path(),
                    name = attachment.name,
                    size = attachment.display_size(),
                ),
            );
        }

        tracing::debug!(component = "DataManager", "Attachments rendered");
    }

    /// Rebuild the comment list, materializing the per-comment slots
    /// the interaction controllers address
    pub fn render_comments(&self, comments: &[Comment]) {
        let page = &self.inner.page;
        if !page.contains("comments-list") {
            return;
        }

        page.clear_children("comments-list");
        if comments.is_empty() {
            page.set_html(
                "comments-list",
                r#"<div class="loading-placeholder"><p>No comments yet</p></div>"#,
            );
            return;
        }
        page.set_html("comments-list", "");

        for comment in comments {
            self.render_comment_item("comments-list", comment, true);
        }

        tracing::debug!(component = "DataManager", "Comments rendered");
    }

    fn render_comment_item(&self, list_id: &str, comment: &Comment, top_level: bool) {
        let page = &self.inner.page;
        let base = format!("comment-{}", comment.id);

        page.append_child(list_id, &base);
        let mut class = "comment-item".to_string();
        if let Some(kind) = comment.kind {
            let kind_class = match kind {
                CommentKind::Hot => "comment-hot",
                CommentKind::Quality => "comment-quality",
                CommentKind::Controversial => "comment-controversial",
            };
            class.push(' ');
            class.push_str(kind_class);
        }
        page.set_class(&base, &class);

        page.register(&format!("{base}-author"));
        page.set_text(&format!("{base}-author"), &comment.author.name);
        page.register(&format!("{base}-time"));
        page.set_text(&format!("{base}-time"), &comment.timestamp);

        // Avatar: a missing source is routed through the resource
        // fallback policy instead of leaving a broken image
        let avatar_id = format!("{base}-avatar");
        page.register(&avatar_id);
        if comment.author.avatar.is_empty() {
            self.inner
                .faults
                .handle_image_error(&avatar_id, &comment.author.name);
        } else {
            page.set_src(&avatar_id, &comment.author.avatar);
        }

        let content = match &comment.mentioned_user {
            Some(user) => format!("Reply @{user} {}", comment.content),
            None => comment.content.clone(),
        };
        page.register(&format!("{base}-content"));
        page.set_text(&format!("{base}-content"), &content);

        for action in ["like", "dislike"] {
            let button_id = format!("{base}-{action}");
            page.register(&button_id);
            page.set_class(&button_id, "comment-action");
            page.register(&format!("{button_id}-count"));
        }
        page.set_text(&format!("{base}-like-count"), &comment.likes.to_string());
        page.set_text(
            &format!("{base}-dislike-count"),
            &comment.dislikes.to_string(),
        );

        // Replies: first reply visible, the rest collapsed behind an
        // expand control
        if top_level && !comment.replies.is_empty() {
            let replies_id = format!("{base}-replies");
            page.register(&replies_id);
            for (index, reply) in comment.replies.iter().enumerate() {
                self.render_comment_item(&replies_id, reply, false);
                let reply_base = format!("comment-{}", reply.id);
                if index > 0 {
                    page.add_class(&reply_base, "hidden-reply");
                    page.set_visible(&reply_base, false);
                }
            }
            if comment.replies.len() > 1 {
                let expand_id = format!("{base}-expand");
                page.register(&expand_id);
                page.set_class(&expand_id, "expand-replies-btn");
                page.set_text(
                    &expand_id,
                    &format!("Expand {} replies", comment.replies.len() - 1),
                );
            }
        }
    }

    /// Fetch all three fixtures concurrently and render whatever came
    /// back; only a total failure replaces the comment list with a
    /// retry prompt
    pub async fn load_and_render_all(&self) {
        tracing::info!(component = "DataManager", "Loading all content");

        let (topic, comments, attachments) = tokio::join!(
            self.try_load_topic_info(),
            self.try_load_comments(),
            self.try_load_attachments()
        );

        let all_failed = topic.is_err() && comments.is_err() && attachments.is_err();
        for error in [
            topic.as_ref().err(),
            comments.as_ref().err(),
            attachments.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        {
            tracing::error!(component = "DataManager", "Error loading content: {error}");
        }

        self.render_topic_info(&topic.unwrap_or_default());
        self.render_attachments(&attachments.unwrap_or_default());
        self.render_comments(&comments.unwrap_or_default());

        if all_failed {
            self.inner.page.set_html(
                "comments-list",
                r#"<div class="loading-placeholder"><p>Failed to load content, please refresh and try again</p></div>"#,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::MapFetcher;
    use std::time::Duration;

    const TOPIC_JSON: &str = r#"{
        "title": "Test Topic",
        "status": "active",
        "author": {"name": "Alice", "avatar": "assets/avatars/alice.png"},
        "timestamp": "2024-01-15 09:00",
        "description": {"background": "Context", "coreIssue": "The issue"}
    }"#;

    const COMMENTS_JSON: &str = r#"{
        "comments": [
            {
                "id": "c1",
                "author": {"name": "Bob", "avatar": "assets/avatars/bob.png"},
                "timestamp": "2024-01-15 14:30",
                "content": "Looks good",
                "likes": 3,
                "dislikes": 1
            }
        ]
    }"#;

    fn manager_with(fetcher: MapFetcher) -> (DataManager, Arc<MapFetcher>, Page) {
        let fetcher = Arc::new(fetcher);
        let page = Page::new();
        let faults = ErrorHandler::new(page.clone(), 2, Duration::from_millis(1));
        let manager = DataManager::new(fetcher.clone(), page.clone(), faults);
        (manager, fetcher, page)
    }

    fn mount_targets(page: &Page) {
        page.register("topic-info-container");
        page.set_html(
            "topic-info-container",
            r#"<h1 id="topic-title-text"></h1><span id="topic-status"></span>
               <img id="topic-author-avatar"><span id="topic-author-name"></span>
               <div id="figma-attachment-list"></div>"#,
        );
        page.register("comments-list");
    }

    #[tokio::test]
    async fn test_load_is_cached_until_cleared() {
        let fetcher = MapFetcher::new();
        fetcher.insert(COMMENTS_PATH, COMMENTS_JSON);
        let (manager, fetcher, _page) = manager_with(fetcher);

        let first = manager.load_comments_data().await;
        let second = manager.load_comments_data().await;
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(fetcher.fetch_count(COMMENTS_PATH), 1);

        manager.clear_cache();
        manager.load_comments_data().await;
        assert_eq!(fetcher.fetch_count(COMMENTS_PATH), 2);
    }

    #[tokio::test]
    async fn test_failed_load_returns_empty_default() {
        let (manager, _fetcher, _page) = manager_with(MapFetcher::new());
        let comments = manager.load_comments_data().await;
        assert!(comments.is_empty());
        let topic = manager.load_topic_info().await;
        assert_eq!(topic.title, "");
    }

    #[tokio::test]
    async fn test_render_topic_info_end_to_end() {
        let fetcher = MapFetcher::new();
        fetcher.insert(TOPIC_INFO_PATH, TOPIC_JSON);
        let (manager, _fetcher, page) = manager_with(fetcher);
        mount_targets(&page);

        let topic = manager.load_topic_info().await;
        manager.render_topic_info(&topic);

        assert_eq!(page.text("topic-title-text").unwrap(), "Test Topic");
        assert!(page.has_class("topic-status", "status-active"));
        assert_eq!(page.text("topic-author-name").unwrap(), "Alice");
    }

    #[tokio::test]
    async fn test_render_without_targets_is_noop() {
        let fetcher = MapFetcher::new();
        fetcher.insert(TOPIC_INFO_PATH, TOPIC_JSON);
        let (manager, _fetcher, _page) = manager_with(fetcher);

        // No targets mounted: must not panic or create slots
        let topic = manager.load_topic_info().await;
        manager.render_topic_info(&topic);
        manager.render_comments(&[]);
        manager.render_attachments(&[]);
    }

    #[tokio::test]
    async fn test_render_comments_materializes_interaction_slots() {
        let fetcher = MapFetcher::new();
        fetcher.insert(COMMENTS_PATH, COMMENTS_JSON);
        let (manager, _fetcher, page) = manager_with(fetcher);
        mount_targets(&page);

        let comments = manager.load_comments_data().await;
        manager.render_comments(&comments);

        assert_eq!(page.children("comments-list"), vec!["comment-c1"]);
        assert_eq!(page.text("comment-c1-like-count").unwrap(), "3");
        assert_eq!(page.text("comment-c1-dislike-count").unwrap(), "1");
        assert_eq!(page.text("comment-c1-author").unwrap(), "Bob");
    }

    #[tokio::test]
    async fn test_total_failure_shows_retry_prompt() {
        let (manager, _fetcher, page) = manager_with(MapFetcher::new());
        mount_targets(&page);

        manager.load_and_render_all().await;

        let html = page.html("comments-list").unwrap();
        assert!(html.contains("please refresh"));
    }

    #[tokio::test]
    async fn test_partial_failure_still_renders_rest() {
        let fetcher = MapFetcher::new();
        fetcher.insert(TOPIC_INFO_PATH, TOPIC_JSON);
        let (manager, _fetcher, page) = manager_with(fetcher);
        mount_targets(&page);

        manager.load_and_render_all().await;

        assert_eq!(page.text("topic-title-text").unwrap(), "Test Topic");
        // Comments failed individually: empty placeholder, not the
        // total-failure retry prompt
        let html = page.html("comments-list").unwrap();
        assert!(html.contains("No comments yet"));
    }

    #[test]
    fn test_update_comment_interaction() {
        let (manager, _fetcher, _page) = manager_with(MapFetcher::new());
        assert!(!manager.update_comment_interaction("c1", Interaction::Like(5)));

        // Seed the cache directly through save path
        let fixture: CommentsFixture = serde_json::from_str(COMMENTS_JSON).unwrap();
        manager.inner.cache.lock().unwrap().comments = Some(fixture.comments);

        assert!(manager.update_comment_interaction("c1", Interaction::Like(5)));
        assert_eq!(manager.cached_comments()[0].likes, 5);

        let reply = Comment {
            id: "c1-r1".into(),
            author: models::Author {
                name: "Carol".into(),
                avatar: String::new(),
            },
            timestamp: "2024-01-15 16:00".into(),
            content: "reply".into(),
            kind: None,
            mentioned_user: Some("Bob".into()),
            likes: 0,
            dislikes: 0,
            replies: Vec::new(),
        };
        assert!(manager.update_comment_interaction("c1", Interaction::Reply(reply)));
        assert_eq!(manager.cached_comments()[0].replies.len(), 1);
    }

    #[tokio::test]
    async fn test_save_comment_appends_to_cache() {
        let fetcher = MapFetcher::new();
        fetcher.insert(COMMENTS_PATH, COMMENTS_JSON);
        let (manager, _fetcher, _page) = manager_with(fetcher);

        let comment = Comment {
            id: "c2".into(),
            author: models::Author {
                name: "Dana".into(),
                avatar: String::new(),
            },
            timestamp: "2024-01-15 17:00".into(),
            content: "new comment".into(),
            kind: None,
            mentioned_user: None,
            likes: 0,
            dislikes: 0,
            replies: Vec::new(),
        };

        // Cache not populated yet: nothing to append onto
        assert!(!manager.save_comment(comment.clone()));

        manager.load_comments_data().await;
        assert!(manager.save_comment(comment));
        assert_eq!(manager.cached_comments().len(), 2);
    }
}
