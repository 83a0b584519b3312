// Navbar controller - navigation actions, the more-options menu, and
// favorites

use crate::favorites::{AddOutcome, FavoritesStore};
use crate::loader::ComponentInit;
use crate::page::{FeedbackKind, Page};
use anyhow::Result;
use std::sync::Mutex;

const MENU_ID: &str = "more-options-menu";

pub struct NavbarController {
    page: Page,
    favorites: FavoritesStore,
    /// Current page URL plus the visited trail behind it
    history: Mutex<Vec<String>>,
}

impl NavbarController {
    pub fn new(page: Page, favorites: FavoritesStore, page_url: impl Into<String>) -> Self {
        Self {
            page,
            favorites,
            history: Mutex::new(vec![page_url.into()]),
        }
    }

    fn current_url(&self) -> String {
        self.history
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_else(|| "/".to_string())
    }

    /// Navigate back; with no history left, fall back to the root
    pub fn go_back(&self) -> String {
        let mut history = self.history.lock().unwrap();
        if history.len() > 1 {
            history.pop();
            history.last().cloned().unwrap_or_else(|| "/".to_string())
        } else {
            "/".to_string()
        }
    }

    pub fn navigate_to(&self, url: impl Into<String>) {
        self.history.lock().unwrap().push(url.into());
    }

    /// Toggle the more-options menu; opening builds it, a second call
    /// tears it down
    pub fn show_more_options(&self) -> bool {
        if self.page.contains(MENU_ID) {
            self.page.remove(MENU_ID);
            return false;
        }

        self.page.register(MENU_ID);
        self.page.set_html(
            MENU_ID,
            r#"<div id="menu-share">Share with friends</div>
<div id="menu-favorite">Add to favorites</div>
<div id="menu-report">Report content</div>
<div id="menu-settings">Settings</div>"#,
        );
        true
    }

    /// Persist the current page into the favorites list
    pub fn add_to_favorites(&self) {
        let title = self
            .page
            .text("topic-title-text")
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Topic discussion".to_string());

        match self.favorites.add(&title, &self.current_url()) {
            Ok(AddOutcome::Added) => {
                self.page
                    .push_feedback("Added to favorites", FeedbackKind::Success);
            }
            Ok(AddOutcome::Duplicate) => {
                self.page
                    .push_feedback("Already in favorites", FeedbackKind::Info);
            }
            Err(error) => {
                tracing::error!(component = "Navbar", "Failed to save favorite: {error}");
                self.page
                    .push_feedback("Could not save favorite", FeedbackKind::Error);
            }
        }
    }

    /// Share the current page; headless, this surfaces the copied link
    pub fn share(&self) {
        let url = self.current_url();
        tracing::info!(component = "Navbar", "Sharing {url}");
        self.page
            .push_feedback("Link copied to clipboard", FeedbackKind::Success);
    }

    pub fn report_content(&self) {
        self.page
            .push_feedback("Report submitted, thank you", FeedbackKind::Info);
    }

    /// Close the page; the caller supplies the user's confirmation (the
    /// original gates this behind a confirm dialog)
    pub fn close_app(&self, confirmed: bool) -> bool {
        if !confirmed {
            return false;
        }
        tracing::info!(component = "Navbar", "Closing page");
        true
    }
}

impl ComponentInit for NavbarController {
    fn name(&self) -> &'static str {
        "navbar"
    }

    fn init(&self, _container_id: &str) -> Result<()> {
        tracing::info!(component = "Navbar", "Navbar controller initialized");
        Ok(())
    }
}
