//! Ayrshare comments API client.
//!
//! # Endpoints
//! - `GET  {base}/comments/{video_id}?platform=tiktok&searchPlatformId=true`
//! - `POST {base}/comments/reply/{comment_id}`
//!
//! Comments come back under a key named after the platform. A response
//! without that key means the video has no comments yet.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::SocialConfig;
use crate::social::types::{Comment, CommentSource, Notifier, SocialError, SocialResult};

/// HTTP client for the comment source and the reply notifier.
#[derive(Clone)]
pub struct AyrshareClient {
    client: Client,
    base_url: String,
    api_key: String,
    platform: String,
    video_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireComment {
    comment: Option<String>,
    username: Option<String>,
    created: Option<String>,
    comment_id: Option<String>,
}

impl WireComment {
    fn into_comment(self) -> Option<Comment> {
        let created = self
            .created
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|t| t.with_timezone(&Utc));
        if created.is_none() {
            tracing::debug!(comment_id = ?self.comment_id, "Comment without a usable timestamp");
        }
        Some(Comment::new(
            self.username?,
            self.comment.unwrap_or_default(),
            created,
            self.comment_id?,
        ))
    }
}

impl AyrshareClient {
    /// Build a client for one video.
    pub fn new(config: &SocialConfig, video_id: impl Into<String>) -> SocialResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.expose().to_string(),
            platform: config.platform.clone(),
            video_id: video_id.into(),
        })
    }

    async fn check(response: Response) -> SocialResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SocialError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// Extract comment records for `platform` from a comments response body.
///
/// Records missing an author or id are dropped. A missing or unparseable
/// timestamp leaves the comment undated; it still takes part in the draw.
pub fn parse_comments(body: &Value, platform: &str) -> SocialResult<Vec<Comment>> {
    let Some(records) = body.get(platform) else {
        return Ok(Vec::new());
    };

    let wire: Vec<WireComment> = serde_json::from_value(records.clone())
        .map_err(|e| SocialError::Malformed(format!("{} comments: {}", platform, e)))?;

    let total = wire.len();
    let comments: Vec<Comment> = wire.into_iter().filter_map(WireComment::into_comment).collect();
    if comments.len() < total {
        tracing::warn!(
            dropped = total - comments.len(),
            "Dropped comments without author or id"
        );
    }
    Ok(comments)
}

#[async_trait]
impl CommentSource for AyrshareClient {
    async fn fetch_comments(&self, video_id: &str) -> SocialResult<Vec<Comment>> {
        let url = format!("{}/comments/{}", self.base_url, video_id);
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .query(&[("platform", self.platform.as_str()), ("searchPlatformId", "true")])
            .send()
            .await?;

        let body: Value = Self::check(response).await?.json().await?;
        let comments = parse_comments(&body, &self.platform)?;
        tracing::debug!(video_id, count = comments.len(), "Comments fetched");
        Ok(comments)
    }
}

#[async_trait]
impl Notifier for AyrshareClient {
    async fn notify(&self, comment_id: &str, message: &str) -> SocialResult<()> {
        let url = format!("{}/comments/reply/{}", self.base_url, comment_id);
        let body = json!({
            "platforms": [self.platform],
            "comment": message,
            "searchPlatformId": true,
            "videoId": self.video_id,
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

impl std::fmt::Debug for AyrshareClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AyrshareClient")
            .field("base_url", &self.base_url)
            .field("platform", &self.platform)
            .field("video_id", &self.video_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_comments() {
        let body = json!({
            "status": "success",
            "tiktok": [
                {
                    "comment": "pencil 7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU",
                    "username": "alice",
                    "created": "2024-11-02T10:15:00Z",
                    "commentId": "c-1"
                },
                {
                    "comment": "no timestamp here",
                    "username": "bob",
                    "commentId": "c-2"
                }
            ]
        });

        let comments = parse_comments(&body, "tiktok").unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].author(), "alice");
        assert_eq!(comments[0].comment_id(), "c-1");
        assert_eq!(
            comments[0].created().map(|t| t.to_rfc3339()).as_deref(),
            Some("2024-11-02T10:15:00+00:00")
        );
        assert_eq!(comments[1].author(), "bob");
        assert!(comments[1].created().is_none());
    }

    #[test]
    fn test_bad_timestamp_kept_missing_author_dropped() {
        let body = json!({
            "tiktok": [
                { "comment": "hi", "username": "carol", "created": "yesterday", "commentId": "c-3" },
                { "comment": "hi", "created": "2024-11-02T10:15:00Z", "commentId": "c-4" },
                { "comment": "hi", "username": "dave", "created": "2024-11-02T10:15:00Z" }
            ]
        });

        let comments = parse_comments(&body, "tiktok").unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].author(), "carol");
        assert!(comments[0].created().is_none());
    }

    #[test]
    fn test_missing_platform_means_no_comments() {
        let body = json!({ "status": "success" });
        assert!(parse_comments(&body, "tiktok").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_records() {
        let body = json!({ "tiktok": "not a list" });
        let err = parse_comments(&body, "tiktok").unwrap_err();
        assert!(matches!(err, SocialError::Malformed(_)));
    }

    #[test]
    fn test_client_debug_hides_key() {
        let mut config = SocialConfig::default();
        config.api_key = crate::config::Secret::new("top-secret");
        let client = AyrshareClient::new(&config, "7301").unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("top-secret"));
        assert!(debug.contains("7301"));
    }
}
