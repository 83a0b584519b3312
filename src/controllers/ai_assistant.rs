// AI assistant controller (optional component)

use crate::loader::ComponentInit;
use crate::page::{FeedbackKind, Page};
use anyhow::Result;

pub struct AiAssistantController {
    page: Page,
}

impl AiAssistantController {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// The detailed-analysis action is a stub in the source material
    pub fn run_detailed_analysis(&self) {
        self.page.push_feedback(
            "Detailed comment analysis is under development",
            FeedbackKind::Info,
        );
    }
}

impl ComponentInit for AiAssistantController {
    fn name(&self) -> &'static str {
        "aiAssistant"
    }

    fn init(&self, _container_id: &str) -> Result<()> {
        tracing::info!(component = "AiAssistant", "AI assistant controller initialized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_stub_surfaces_feedback() {
        let page = Page::new();
        let controller = AiAssistantController::new(page.clone());
        controller.run_detailed_analysis();
        assert_eq!(page.feedback().len(), 1);
    }
}
