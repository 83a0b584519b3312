// Comments controller - voting, replies, and reply expansion
//
// Voting is single-choice per comment per session: picking the other
// button first clears the previous vote's count and active state, so a
// like→dislike switch is a net swap, never a double count. Vote state
// lives in memory only; the cached fixture counts are mutated in place
// and not persisted anywhere.

use super::format_relative;
use crate::data::models::{Author, Comment};
use crate::data::{DataManager, Interaction};
use crate::page::{FeedbackKind, Page};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

/// The one vote a user can hold on a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Like,
    Dislike,
}

pub struct CommentsController {
    page: Page,
    data: DataManager,
    votes: Mutex<HashMap<String, Vote>>,
}

impl CommentsController {
    pub fn new(page: Page, data: DataManager) -> Self {
        Self {
            page,
            data,
            votes: Mutex::new(HashMap::new()),
        }
    }

    pub fn user_vote(&self, comment_id: &str) -> Option<Vote> {
        self.votes.lock().unwrap().get(comment_id).copied()
    }

    /// Toggle a like; an active dislike is cleared first
    pub fn toggle_like(&self, comment_id: &str) {
        let base = format!("comment-{comment_id}");
        let current = self.user_vote(comment_id);

        match current {
            Some(Vote::Like) => {
                self.votes.lock().unwrap().remove(comment_id);
                self.page.remove_class(&format!("{base}-like"), "active");
                let count = self.bump_count(&format!("{base}-like-count"), -1);
                self.data
                    .update_comment_interaction(comment_id, Interaction::Like(count));
                self.page.push_feedback("Like removed", FeedbackKind::Info);
            }
            _ => {
                if current == Some(Vote::Dislike) {
                    self.page.remove_class(&format!("{base}-dislike"), "active");
                    let count = self.bump_count(&format!("{base}-dislike-count"), -1);
                    self.data
                        .update_comment_interaction(comment_id, Interaction::Dislike(count));
                }

                self.votes
                    .lock()
                    .unwrap()
                    .insert(comment_id.to_string(), Vote::Like);
                self.page.add_class(&format!("{base}-like"), "active");
                let count = self.bump_count(&format!("{base}-like-count"), 1);
                self.data
                    .update_comment_interaction(comment_id, Interaction::Like(count));
                self.page.push_feedback("Liked", FeedbackKind::Success);
            }
        }
    }

    /// Toggle a dislike; an active like is cleared first
    pub fn toggle_dislike(&self, comment_id: &str) {
        let base = format!("comment-{comment_id}");
        let current = self.user_vote(comment_id);

        match current {
            Some(Vote::Dislike) => {
                self.votes.lock().unwrap().remove(comment_id);
                self.page.remove_class(&format!("{base}-dislike"), "active");
                let count = self.bump_count(&format!("{base}-dislike-count"), -1);
                self.data
                    .update_comment_interaction(comment_id, Interaction::Dislike(count));
                self.page
                    .push_feedback("Dislike removed", FeedbackKind::Info);
            }
            _ => {
                if current == Some(Vote::Like) {
                    self.page.remove_class(&format!("{base}-like"), "active");
                    let count = self.bump_count(&format!("{base}-like-count"), -1);
                    self.data
                        .update_comment_interaction(comment_id, Interaction::Like(count));
                }

                self.votes
                    .lock()
                    .unwrap()
                    .insert(comment_id.to_string(), Vote::Dislike);
                self.page.add_class(&format!("{base}-dislike"), "active");
                let count = self.bump_count(&format!("{base}-dislike-count"), 1);
                self.data
                    .update_comment_interaction(comment_id, Interaction::Dislike(count));
                self.page.push_feedback("Disliked", FeedbackKind::Info);
            }
        }
    }

    /// Apply a delta to a displayed count, clamping at zero
    fn bump_count(&self, count_id: &str, delta: i64) -> u32 {
        let current: i64 = self
            .page
            .text(count_id)
            .and_then(|t| t.trim().parse().ok())
            .unwrap_or(0);
        let updated = (current + delta).max(0) as u32;
        self.page.set_text(count_id, &updated.to_string());
        updated
    }

    /// Open a reply draft under a comment. Returns false when a draft
    /// is already open (the original refocuses it instead).
    pub fn reply_comment(&self, comment_id: &str) -> bool {
        let draft_id = format!("comment-{comment_id}-reply-input");
        if self.page.contains(&draft_id) {
            return false;
        }

        let author = self
            .page
            .text(&format!("comment-{comment_id}-author"))
            .unwrap_or_default();
        self.page.register(&draft_id);
        self.page.set_class(&draft_id, "reply-input-container");
        self.page.set_text(&draft_id, &format!("Reply @{author}..."));
        true
    }

    /// Submit a reply draft: non-empty text is appended to the cached
    /// comment and the list is re-rendered
    pub fn submit_reply(&self, comment_id: &str, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            self.page
                .push_feedback("Reply cannot be empty", FeedbackKind::Error);
            return false;
        }

        let target_author = self
            .page
            .text(&format!("comment-{comment_id}-author"))
            .unwrap_or_default();
        let reply_index = self
            .data
            .cached_comments()
            .iter()
            .find(|c| c.id == comment_id)
            .map(|c| c.replies.len() + 1)
            .unwrap_or(1);

        let now = Utc::now();
        let reply = Comment {
            id: format!("{comment_id}-r{reply_index}"),
            author: Author {
                name: "Guest".to_string(),
                avatar: String::new(),
            },
            timestamp: format_relative(now, now),
            content: text.to_string(),
            kind: None,
            mentioned_user: Some(target_author),
            likes: 0,
            dislikes: 0,
            replies: Vec::new(),
        };

        if !self
            .data
            .update_comment_interaction(comment_id, Interaction::Reply(reply))
        {
            self.page
                .push_feedback("Comment is no longer available", FeedbackKind::Error);
            return false;
        }

        self.page
            .remove(&format!("comment-{comment_id}-reply-input"));
        let comments = self.data.cached_comments();
        self.data.render_comments(&comments);
        self.page.push_feedback("Reply posted", FeedbackKind::Success);
        true
    }

    /// Expand or collapse the replies hidden behind the first one
    pub fn toggle_replies(&self, comment_id: &str) {
        let replies_id = format!("comment-{comment_id}-replies");
        let children = self.page.children(&replies_id);
        if children.len() < 2 {
            return;
        }

        let expanded = self.page.is_visible(&children[1]);
        for child in children.iter().skip(1) {
            self.page.set_visible(child, !expanded);
            if expanded {
                self.page.add_class(child, "hidden-reply");
            } else {
                self.page.remove_class(child, "hidden-reply");
            }
        }

        let expand_id = format!("comment-{comment_id}-expand");
        let label = if expanded {
            format!("Expand {} replies", children.len() - 1)
        } else {
            "Collapse replies".to_string()
        };
        self.page.set_text(&expand_id, &label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::CommentsFixture;
    use crate::faults::ErrorHandler;
    use crate::fetch::testing::MapFetcher;
    use std::sync::Arc;
    use std::time::Duration;

    fn seed(id: &str, likes: u32, dislikes: u32, replies: Vec<Comment>) -> Comment {
        Comment {
            id: id.to_string(),
            author: Author {
                name: "Bob".into(),
                avatar: "assets/avatars/bob.png".into(),
            },
            timestamp: "2024-01-15 14:30".into(),
            content: "text".into(),
            kind: None,
            mentioned_user: None,
            likes,
            dislikes,
            replies,
        }
    }

    async fn controller_with(comments: Vec<Comment>) -> (CommentsController, Page, DataManager) {
        let fetcher = MapFetcher::new();
        let fixture = CommentsFixture { comments };
        fetcher.insert(
            "assets/data/comments.json",
            &serde_json::to_string(&fixture).unwrap(),
        );

        let fetcher = Arc::new(fetcher);
        let page = Page::new();
        page.register("comments-list");
        let faults = ErrorHandler::new(page.clone(), 2, Duration::from_millis(1));
        let data = DataManager::new(fetcher, page.clone(), faults);

        let loaded = data.load_comments_data().await;
        data.render_comments(&loaded);

        (
            CommentsController::new(page.clone(), data.clone()),
            page,
            data,
        )
    }

    #[tokio::test]
    async fn test_like_then_dislike_is_a_net_swap() {
        let (controller, page, data) = controller_with(vec![seed("c1", 10, 3, vec![])]).await;

        controller.toggle_like("c1");
        assert!(page.has_class("comment-c1-like", "active"));
        assert_eq!(page.text("comment-c1-like-count").unwrap(), "11");

        controller.toggle_dislike("c1");

        // Exactly one button active, counts swapped by exactly one each
        assert!(!page.has_class("comment-c1-like", "active"));
        assert!(page.has_class("comment-c1-dislike", "active"));
        assert_eq!(page.text("comment-c1-like-count").unwrap(), "10");
        assert_eq!(page.text("comment-c1-dislike-count").unwrap(), "4");
        assert_eq!(controller.user_vote("c1"), Some(Vote::Dislike));

        // The cache mirrors the displayed counts
        let cached = &data.cached_comments()[0];
        assert_eq!(cached.likes, 10);
        assert_eq!(cached.dislikes, 4);
    }

    #[tokio::test]
    async fn test_toggling_same_vote_removes_it() {
        let (controller, page, _data) = controller_with(vec![seed("c1", 5, 0, vec![])]).await;

        controller.toggle_like("c1");
        controller.toggle_like("c1");

        assert!(!page.has_class("comment-c1-like", "active"));
        assert_eq!(page.text("comment-c1-like-count").unwrap(), "5");
        assert_eq!(controller.user_vote("c1"), None);
    }

    #[tokio::test]
    async fn test_votes_are_tracked_per_comment() {
        let (controller, page, _data) =
            controller_with(vec![seed("c1", 1, 0, vec![]), seed("c2", 2, 0, vec![])]).await;

        controller.toggle_like("c1");
        controller.toggle_dislike("c2");

        assert_eq!(controller.user_vote("c1"), Some(Vote::Like));
        assert_eq!(controller.user_vote("c2"), Some(Vote::Dislike));
        assert_eq!(page.text("comment-c2-like-count").unwrap(), "2");
    }

    #[tokio::test]
    async fn test_reply_flow() {
        let (controller, page, data) = controller_with(vec![seed("c1", 0, 0, vec![])]).await;

        assert!(controller.reply_comment("c1"));
        // Second open refocuses instead of duplicating
        assert!(!controller.reply_comment("c1"));
        assert!(page.contains("comment-c1-reply-input"));

        assert!(!controller.submit_reply("c1", "   "));
        assert!(controller.submit_reply("c1", "I agree"));

        let cached = &data.cached_comments()[0];
        assert_eq!(cached.replies.len(), 1);
        assert_eq!(cached.replies[0].content, "I agree");
        assert_eq!(cached.replies[0].mentioned_user.as_deref(), Some("Bob"));

        // Draft is gone and the re-render materialized the reply slot
        assert!(!page.contains("comment-c1-reply-input"));
        assert!(page.contains("comment-c1-r1"));
    }

    #[tokio::test]
    async fn test_toggle_replies_expands_hidden_ones() {
        let replies = vec![
            seed("c1-r1", 0, 0, vec![]),
            seed("c1-r2", 0, 0, vec![]),
            seed("c1-r3", 0, 0, vec![]),
        ];
        let (controller, page, _data) = controller_with(vec![seed("c1", 0, 0, replies)]).await;

        // Collapsed by default: only the first reply is visible
        assert!(page.is_visible("comment-c1-r1"));
        assert!(!page.is_visible("comment-c1-r2"));
        assert_eq!(
            page.text("comment-c1-expand").unwrap(),
            "Expand 2 replies"
        );

        controller.toggle_replies("c1");
        assert!(page.is_visible("comment-c1-r2"));
        assert!(page.is_visible("comment-c1-r3"));
        assert_eq!(page.text("comment-c1-expand").unwrap(), "Collapse replies");

        controller.toggle_replies("c1");
        assert!(!page.is_visible("comment-c1-r2"));
    }
}
