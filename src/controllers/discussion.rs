// Discussion controller - sorting, filtering and counting of the
// mounted comment list
//
// Sorting works over the comment list's document order: scores come
// from the cached fixture data, ties keep their current position
// (stable sort), and the result is written back as the container's
// child ordering.

use super::parse_display_time;
use crate::data::models::{Comment, CommentKind};
use crate::data::DataManager;
use crate::loader::ComponentInit;
use crate::page::{FeedbackKind, Page};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Mutex;

const COMMENTS_LIST: &str = "comments-list";

/// Available sort orders for the comment list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKind {
    Hot,
    TimeDesc,
    TimeAsc,
}

impl SortKind {
    fn feedback(&self) -> &'static str {
        match self {
            SortKind::Hot => "Sorted by popularity",
            SortKind::TimeDesc => "Sorted by time (newest first)",
            SortKind::TimeAsc => "Sorted by time (oldest first)",
        }
    }
}

/// Hot score: net votes plus a recency bonus capped at 2 points that
/// decays linearly to 0 over 24 hours
pub fn hot_score(comment: &Comment, now: DateTime<Utc>) -> f64 {
    let net = comment.likes as f64 - comment.dislikes as f64;
    net + time_factor(&comment.timestamp, now)
}

fn time_factor(timestamp: &str, now: DateTime<Utc>) -> f64 {
    let Some(posted) = parse_display_time(timestamp) else {
        return 0.0;
    };
    let hours = now.signed_duration_since(posted).num_minutes() as f64 / 60.0;
    (2.0 - hours / 12.0).clamp(0.0, 2.0)
}

pub struct DiscussionController {
    page: Page,
    data: DataManager,
    current_sort: Mutex<SortKind>,
}

impl DiscussionController {
    pub fn new(page: Page, data: DataManager) -> Self {
        Self {
            page,
            data,
            current_sort: Mutex::new(SortKind::Hot),
        }
    }

    pub fn current_sort(&self) -> SortKind {
        *self.current_sort.lock().unwrap()
    }

    /// Re-order the comment list; ties preserve document order
    pub fn sort_comments(&self, kind: SortKind) {
        tracing::debug!(component = "Discussion", "Sorting comments: {kind:?}");
        self.update_tab_states(kind);

        let children = self.page.children(COMMENTS_LIST);
        if children.is_empty() {
            return;
        }

        let by_id: HashMap<String, Comment> = self
            .data
            .cached_comments()
            .into_iter()
            .map(|c| (format!("comment-{}", c.id), c))
            .collect();
        let now = Utc::now();

        let mut order = children;
        match kind {
            SortKind::Hot => {
                order.sort_by(|a, b| {
                    let score_a = by_id.get(a).map(|c| hot_score(c, now)).unwrap_or(0.0);
                    let score_b = by_id.get(b).map(|c| hot_score(c, now)).unwrap_or(0.0);
                    score_b
                        .partial_cmp(&score_a)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            }
            SortKind::TimeDesc => {
                order.sort_by_key(|id| Reverse(posted_millis(&by_id, id)));
            }
            SortKind::TimeAsc => {
                order.sort_by_key(|id| posted_millis(&by_id, id));
            }
        }

        self.page.reorder_children(COMMENTS_LIST, &order);
        *self.current_sort.lock().unwrap() = kind;
        self.page.push_feedback(kind.feedback(), FeedbackKind::Info);
    }

    fn update_tab_states(&self, active: SortKind) {
        for tab in ["sort-hot-tab", "sort-time-tab", "sort-time-desc", "sort-time-asc"] {
            self.page.remove_class(tab, "active");
        }
        match active {
            SortKind::Hot => {
                self.page.add_class("sort-hot-tab", "active");
            }
            SortKind::TimeDesc => {
                self.page.add_class("sort-time-tab", "active");
                self.page.add_class("sort-time-desc", "active");
            }
            SortKind::TimeAsc => {
                self.page.add_class("sort-time-tab", "active");
                self.page.add_class("sort-time-asc", "active");
            }
        }
    }

    /// Show only comments of the given kind; None shows everything
    pub fn filter_comments(&self, filter: Option<CommentKind>) {
        let by_id: HashMap<String, Comment> = self
            .data
            .cached_comments()
            .into_iter()
            .map(|c| (format!("comment-{}", c.id), c))
            .collect();

        for child in self.page.children(COMMENTS_LIST) {
            let visible = match filter {
                None => true,
                Some(kind) => by_id.get(&child).map(|c| c.kind == Some(kind)).unwrap_or(false),
            };
            self.page.set_visible(&child, visible);
        }

        tracing::debug!(component = "Discussion", "Comments filtered: {filter:?}");
    }

    /// Refresh the visible comment counter
    pub fn update_comment_count(&self) {
        let count = self.page.children(COMMENTS_LIST).len();
        self.page.set_text("comments-count", &count.to_string());
    }

    /// Toggle the detailed comments section
    pub fn toggle_detailed_comments(&self) {
        let visible = self.page.is_visible("detailed-comments-section");
        self.page.set_visible("detailed-comments-section", !visible);
    }
}

fn posted_millis(by_id: &HashMap<String, Comment>, child: &str) -> i64 {
    by_id
        .get(child)
        .and_then(|c| parse_display_time(&c.timestamp))
        .map(|t| t.timestamp_millis())
        .unwrap_or(0)
}

impl ComponentInit for DiscussionController {
    fn name(&self) -> &'static str {
        "discussion"
    }

    fn init(&self, _container_id: &str) -> Result<()> {
        self.update_tab_states(self.current_sort());
        tracing::info!(component = "Discussion", "Discussion controller initialized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::{Author, CommentsFixture};
    use crate::faults::ErrorHandler;
    use crate::fetch::testing::MapFetcher;
    use chrono::Duration;
    use std::sync::Arc;
    use std::time::Duration as StdDuration;

    fn comment(id: &str, likes: u32, dislikes: u32, timestamp: String) -> Comment {
        Comment {
            id: id.to_string(),
            author: Author {
                name: "Tester".into(),
                avatar: "assets/avatars/t.png".into(),
            },
            timestamp,
            content: "text".into(),
            kind: None,
            mentioned_user: None,
            likes,
            dislikes,
            replies: Vec::new(),
        }
    }

    fn display(time: DateTime<Utc>) -> String {
        time.format("%Y-%m-%d %H:%M").to_string()
    }

    async fn controller_with(comments: Vec<Comment>) -> (DiscussionController, Page) {
        let fetcher = MapFetcher::new();
        let fixture = CommentsFixture { comments };
        fetcher.insert(
            "assets/data/comments.json",
            &serde_json::to_string(&fixture).unwrap(),
        );

        let fetcher = Arc::new(fetcher);
        let page = Page::new();
        page.register(COMMENTS_LIST);
        let faults = ErrorHandler::new(page.clone(), 2, StdDuration::from_millis(1));
        let data = DataManager::new(fetcher, page.clone(), faults);

        let loaded = data.load_comments_data().await;
        data.render_comments(&loaded);

        (DiscussionController::new(page.clone(), data), page)
    }

    #[test]
    fn test_hot_score_recency_bonus() {
        let now = Utc::now();
        let fresh = comment("a", 10, 2, display(now));
        let stale = comment("b", 10, 2, display(now - Duration::hours(25)));

        // Same net votes: the fresh comment wins on the recency bonus,
        // which has fully decayed for the 25h-old one
        assert!(hot_score(&fresh, now) > hot_score(&stale, now));
        assert_eq!(hot_score(&stale, now), 8.0);

        // Unparseable timestamps contribute no bonus
        let undated = comment("c", 10, 2, "yesterday-ish".into());
        assert_eq!(hot_score(&undated, now), 8.0);
    }

    #[tokio::test]
    async fn test_hot_sort_puts_recent_first() {
        let now = Utc::now();
        let (controller, page) = controller_with(vec![
            comment("old", 10, 2, display(now - Duration::hours(25))),
            comment("new", 10, 2, display(now)),
        ])
        .await;

        controller.sort_comments(SortKind::Hot);
        assert_eq!(
            page.children(COMMENTS_LIST),
            vec!["comment-new", "comment-old"]
        );
    }

    #[tokio::test]
    async fn test_hot_sort_is_stable_on_ties() {
        let now = Utc::now();
        let ts = display(now - Duration::hours(30));
        let (controller, page) = controller_with(vec![
            comment("first", 5, 1, ts.clone()),
            comment("second", 5, 1, ts.clone()),
            comment("third", 5, 1, ts),
        ])
        .await;

        controller.sort_comments(SortKind::Hot);
        assert_eq!(
            page.children(COMMENTS_LIST),
            vec!["comment-first", "comment-second", "comment-third"]
        );
    }

    #[tokio::test]
    async fn test_time_sorts() {
        let now = Utc::now();
        let (controller, page) = controller_with(vec![
            comment("mid", 0, 0, display(now - Duration::hours(2))),
            comment("newest", 0, 0, display(now)),
            comment("oldest", 0, 0, display(now - Duration::hours(5))),
        ])
        .await;

        controller.sort_comments(SortKind::TimeDesc);
        assert_eq!(
            page.children(COMMENTS_LIST),
            vec!["comment-newest", "comment-mid", "comment-oldest"]
        );

        controller.sort_comments(SortKind::TimeAsc);
        assert_eq!(
            page.children(COMMENTS_LIST),
            vec!["comment-oldest", "comment-mid", "comment-newest"]
        );
        assert_eq!(controller.current_sort(), SortKind::TimeAsc);
    }

    #[tokio::test]
    async fn test_filter_by_kind() {
        let now = Utc::now();
        let mut hot = comment("hot", 5, 0, display(now));
        hot.kind = Some(CommentKind::Hot);
        let plain = comment("plain", 1, 0, display(now));
        let (controller, page) = controller_with(vec![hot, plain]).await;

        controller.filter_comments(Some(CommentKind::Hot));
        assert!(page.is_visible("comment-hot"));
        assert!(!page.is_visible("comment-plain"));

        controller.filter_comments(None);
        assert!(page.is_visible("comment-plain"));
    }

    #[tokio::test]
    async fn test_tab_states_follow_sort() {
        let now = Utc::now();
        let (controller, page) = controller_with(vec![comment("a", 1, 0, display(now))]).await;
        for tab in ["sort-hot-tab", "sort-time-tab", "sort-time-desc", "sort-time-asc"] {
            page.register(tab);
        }

        controller.sort_comments(SortKind::TimeDesc);
        assert!(page.has_class("sort-time-desc", "active"));
        assert!(page.has_class("sort-time-tab", "active"));
        assert!(!page.has_class("sort-hot-tab", "active"));

        controller.sort_comments(SortKind::Hot);
        assert!(page.has_class("sort-hot-tab", "active"));
        assert!(!page.has_class("sort-time-desc", "active"));
    }
}
