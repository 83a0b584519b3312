//! Fixture models
//!
//! These mirror the three JSON fixtures standing in for backend API
//! responses. Unknown fields are tolerated; optional blocks default so
//! a trimmed fixture still deserializes.

use serde::{Deserialize, Serialize};

/// A discussion comment, possibly with nested replies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: Author,
    /// Display timestamp, e.g. "2024-01-15 14:30"
    pub timestamp: String,
    pub content: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<CommentKind>,
    #[serde(
        rename = "mentionedUser",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mentioned_user: Option<String>,
    pub likes: u32,
    pub dislikes: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub avatar: String,
}

/// Editorial classification of a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentKind {
    Hot,
    Quality,
    Controversial,
}

/// Wrapper shape of `comments.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentsFixture {
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// The topic under discussion (`topic-info.json`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Topic {
    #[serde(default)]
    pub title: String,
    /// "active" or "closed"
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub description: TopicDescription,
    #[serde(rename = "aiPolish", default)]
    pub ai_polish: Option<AiPolish>,
    #[serde(rename = "aiAnalysis", default)]
    pub ai_analysis: Option<AiAnalysis>,
}

impl Topic {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicDescription {
    #[serde(default)]
    pub background: String,
    #[serde(rename = "coreIssue", default)]
    pub core_issue: String,
    #[serde(default)]
    pub controversy: String,
    #[serde(rename = "keyQuestion", default)]
    pub key_question: String,
    #[serde(rename = "expectedResult", default)]
    pub expected_result: String,
}

/// AI-polish notice attached to the topic body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiPolish {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub message: String,
}

/// AI analysis block rendered by the assistant component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiAnalysis {
    #[serde(default)]
    pub stats: AnalysisStats,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisStats {
    #[serde(default)]
    pub participants: u32,
    #[serde(default)]
    pub comments: u32,
    #[serde(rename = "qualityScore", default)]
    pub quality_score: f64,
}

/// An uploaded attachment (`attachments.json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub url: String,
}

/// Wrapper shape of `attachments.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttachmentsFixture {
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Attachment {
    /// Icon asset for the attachment's file extension
    pub fn icon_path(&self) -> &'static str {
        let ext = self
            .name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => "assets/lficon/pdf-24.svg",
            "doc" => "assets/lficon/doc-24.svg",
            "docx" => "assets/lficon/docx-24.svg",
            "xls" => "assets/lficon/xls-24.svg",
            "xlsx" => "assets/lficon/xlsx-24.svg",
            "ppt" => "assets/lficon/ppt-24.svg",
            "pptx" => "assets/lficon/pptx-24.svg",
            _ => "assets/lficon/file-24-outline.svg",
        }
    }

    /// Human-readable size, in whole kilobytes
    pub fn display_size(&self) -> String {
        match self.size {
            Some(bytes) => format!("{}KB", bytes / 1024),
            None => "unknown size".to_string(),
        }
    }
}
