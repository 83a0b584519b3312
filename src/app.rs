// Application root - owns every service and wires them together
//
// All engine services are constructed here and handed their
// dependencies explicitly. The placeholder containers the index page
// declares are registered up front; everything else appears as
// fragments mount.

use crate::config::Config;
use crate::controllers::{
    AiAssistantController, CommentsController, DiscussionController, NavbarController,
    TopicInfoController,
};
use crate::data::DataManager;
use crate::faults::ErrorHandler;
use crate::favorites::FavoritesStore;
use crate::fetch::ResourceFetcher;
use crate::loader::{default_components, ComponentLoader, InitRegistry};
use crate::page::Page;
use std::sync::Arc;
use std::time::Duration;

pub struct App {
    pub page: Page,
    pub faults: ErrorHandler,
    pub data: DataManager,
    pub loader: ComponentLoader,
    pub navbar: Arc<NavbarController>,
    pub discussion: Arc<DiscussionController>,
    pub comments: Arc<CommentsController>,
    pub assistant: Arc<AiAssistantController>,
}

impl App {
    pub fn new(config: &Config, fetcher: Arc<dyn ResourceFetcher>) -> Self {
        let page = Page::new();
        let specs = default_components();

        // The index page's placeholder containers
        for spec in &specs {
            page.register(spec.container_id);
        }

        let faults = ErrorHandler::new(
            page.clone(),
            config.max_retries,
            Duration::from_millis(config.retry_base_delay_ms),
        );
        let data = DataManager::new(fetcher.clone(), page.clone(), faults.clone());

        let favorites = FavoritesStore::new(config.favorites_path.clone());
        let navbar = Arc::new(NavbarController::new(
            page.clone(),
            favorites,
            config.page_url.clone(),
        ));
        let topic_info = Arc::new(TopicInfoController::new(page.clone()));
        let discussion = Arc::new(DiscussionController::new(page.clone(), data.clone()));
        let comments = Arc::new(CommentsController::new(page.clone(), data.clone()));
        let assistant = Arc::new(AiAssistantController::new(page.clone()));

        let mut registry = InitRegistry::new();
        registry.register(navbar.clone());
        registry.register(topic_info);
        registry.register(discussion.clone());
        registry.register(assistant.clone());

        let loader = ComponentLoader::new(
            page.clone(),
            fetcher,
            faults.clone(),
            data.clone(),
            registry,
            specs,
        );

        Self {
            page,
            faults,
            data,
            loader,
            navbar,
            discussion,
            comments,
            assistant,
        }
    }

    /// Load every component and render the fixture data
    pub async fn init(&self) {
        self.loader.init().await;
    }

    /// Full reset and reload of components and data
    pub async fn reload_all(&self) {
        self.loader.reload_all().await;
    }

    /// Tear the engine down (tests, page transitions)
    pub fn destroy(&self) {
        self.loader.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::MapFetcher;

    fn seeded_fetcher() -> MapFetcher {
        let fetcher = MapFetcher::new();
        fetcher.insert(
            "components/navbar/navbar.html",
            r#"<nav id="navbar-back"></nav>"#,
        );
        fetcher.insert(
            "components/topic-info/topic-info.html",
            r#"<h1 id="topic-title-text"></h1><span id="topic-status"></span>
               <div id="figma-attachment-list"></div>"#,
        );
        fetcher.insert(
            "components/ai-assistant/ai-assistant.html",
            r#"<div id="ai-summary-text"></div>"#,
        );
        fetcher.insert(
            "components/discussion/discussion.html",
            r#"<div id="comments-list"></div><span id="comments-count"></span>"#,
        );
        fetcher.insert(
            "assets/data/topic-info.json",
            r#"{"title": "Test Topic", "status": "active", "author": {"name": "Alice"}}"#,
        );
        fetcher.insert(
            "assets/data/comments.json",
            r#"{"comments": [{"id": "c1", "author": {"name": "Bob", "avatar": "a.png"},
                "timestamp": "2024-01-15 14:30", "content": "hi", "likes": 1, "dislikes": 0}]}"#,
        );
        fetcher.insert("assets/data/attachments.json", r#"{"attachments": []}"#);
        fetcher
    }

    fn test_config(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.retry_base_delay_ms = 1;
        config.favorites_path = dir.join("favorites.json");
        config
    }

    #[tokio::test]
    async fn test_full_pipeline_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(&test_config(dir.path()), Arc::new(seeded_fetcher()));

        app.init().await;

        // Components mounted, data rendered into their slots
        let stats = app.loader.loading_stats();
        assert_eq!(stats.loaded, 4);
        assert_eq!(stats.failed, 0);
        assert_eq!(app.page.text("topic-title-text").unwrap(), "Test Topic");
        assert!(app.page.has_class("topic-status", "status-active"));
        assert_eq!(app.page.children("comments-list").len(), 1);

        // Interactions work against the rendered page
        app.comments.toggle_like("c1");
        assert_eq!(app.page.text("comment-c1-like-count").unwrap(), "2");
        assert_eq!(app.data.cached_topic().unwrap().title, "Test Topic");

        app.destroy();
        assert_eq!(app.loader.loading_stats().loaded, 0);
    }
}
