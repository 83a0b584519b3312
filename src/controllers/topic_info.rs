// Topic info controller
//
// The fragment is pure presentation; data lands in its slots through
// DataManager after all components settle. Init only verifies the
// fragment mounted the slots rendering will need.

use crate::loader::ComponentInit;
use crate::page::Page;
use anyhow::Result;

pub struct TopicInfoController {
    page: Page,
}

impl TopicInfoController {
    pub fn new(page: Page) -> Self {
        Self { page }
    }
}

impl ComponentInit for TopicInfoController {
    fn name(&self) -> &'static str {
        "topicInfo"
    }

    fn init(&self, container_id: &str) -> Result<()> {
        if !self.page.contains("topic-title-text") {
            tracing::warn!(
                component = "TopicInfo",
                "Fragment in '{container_id}' is missing the title slot"
            );
        }
        tracing::info!(component = "TopicInfo", "Topic info controller initialized");
        Ok(())
    }
}
