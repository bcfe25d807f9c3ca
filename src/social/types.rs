//! Comment records and the social collaborator traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An immutable comment as supplied by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    author: String,
    text: String,
    /// `None` when the platform sent no usable timestamp.
    created: Option<DateTime<Utc>>,
    comment_id: String,
}

impl Comment {
    pub fn new(
        author: impl Into<String>,
        text: impl Into<String>,
        created: impl Into<Option<DateTime<Utc>>>,
        comment_id: impl Into<String>,
    ) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
            created: created.into(),
            comment_id: comment_id.into(),
        }
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    pub fn comment_id(&self) -> &str {
        &self.comment_id
    }
}

/// Errors from the social platform.
#[derive(Debug, Error)]
pub enum SocialError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be understood.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

pub type SocialResult<T> = Result<T, SocialError>;

/// Source of comments for a video.
#[async_trait]
pub trait CommentSource: Send + Sync {
    /// Fetch every comment currently attached to `video_id`.
    async fn fetch_comments(&self, video_id: &str) -> SocialResult<Vec<Comment>>;
}

/// Posts a reply under a comment.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, comment_id: &str, message: &str) -> SocialResult<()>;
}
