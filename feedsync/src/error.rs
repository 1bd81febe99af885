use serde::Deserialize;
use thiserror::Error;

use crate::models::PostId;

/// Failures surfaced by the community service and the optimistic flows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("session is not authorized")]
    Unauthorized,

    #[error("forbidden: {}", .message.as_deref().unwrap_or("no details"))]
    Forbidden { message: Option<String> },

    #[error("not found: {}", .message.as_deref().unwrap_or("no details"))]
    NotFound { message: Option<String> },

    #[error("post {0} is not confirmed by the server yet")]
    Pending(PostId),

    #[error("request failed: {detail}")]
    NetworkOrServer {
        status: Option<u16>,
        message: Option<String>,
        detail: String,
    },
}

/// The user action a failure belongs to, used to pick the message shown for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Refresh,
    Create,
    Like,
    Delete,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}

pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

impl FeedError {
    pub fn not_found() -> Self {
        FeedError::NotFound { message: None }
    }

    /// Map a non-success HTTP status and the optional `{message}` body to the taxonomy.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        match status {
            400 | 422 => FeedError::ValidationFailed(
                message.unwrap_or_else(|| "request was rejected".to_string()),
            ),
            401 => FeedError::Unauthorized,
            403 => FeedError::Forbidden { message },
            404 => FeedError::NotFound { message },
            _ => FeedError::NetworkOrServer {
                status: Some(status),
                detail: format!(
                    "server responded with status {}: {}",
                    status,
                    message.as_deref().unwrap_or("no details")
                ),
                message,
            },
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, FeedError::Unauthorized)
    }

    fn server_message(&self) -> Option<&str> {
        match self {
            FeedError::ValidationFailed(message) => Some(message),
            FeedError::Forbidden { message }
            | FeedError::NotFound { message }
            | FeedError::NetworkOrServer { message, .. } => message.as_deref(),
            FeedError::Unauthorized | FeedError::Pending(_) => None,
        }
    }

    /// Text shown to the user once the rollback for `operation` has completed.
    pub fn user_message(&self, operation: Operation) -> String {
        match (self, operation) {
            (FeedError::Unauthorized, _) => SESSION_EXPIRED_MESSAGE.to_string(),
            (FeedError::Pending(_), _) => "This post is still being published.".to_string(),
            (FeedError::NotFound { .. }, Operation::Delete) => {
                "Post not found. It may have been deleted already or never existed.".to_string()
            }
            (FeedError::Forbidden { .. }, Operation::Delete) => {
                "You are not authorized to delete this post.".to_string()
            }
            _ => self
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| fallback_message(operation).to_string()),
        }
    }
}

fn fallback_message(operation: Operation) -> &'static str {
    match operation {
        Operation::Refresh => "Failed to fetch community data. Please try again later.",
        Operation::Create => "Failed to create post. Please try again.",
        Operation::Like => "Failed to like post. Please try again.",
        Operation::Delete => "Failed to delete post. Please try again.",
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        FeedError::NetworkOrServer {
            status: e.status().map(|s| s.as_u16()),
            message: None,
            detail: e.to_string(),
        }
    }
}
