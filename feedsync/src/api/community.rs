use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use reqwest::{Client, RequestBuilder, header};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::{ErrorBody, FeedError};
use crate::models::{Author, CommunityStats, LikeState, Post, PostId, RawLikeResponse, RawMe, RawPost};

/// Remote side of the community feed. Implementations return normalized posts.
#[async_trait]
pub trait CommunityApi: Send + Sync {
    async fn current_user(&self) -> Result<Author, FeedError>;
    async fn list_posts(&self) -> Result<Vec<Post>, FeedError>;
    async fn create_post(&self, content: &str) -> Result<Post, FeedError>;
    async fn toggle_like(&self, post_id: &PostId) -> Result<LikeState, FeedError>;
    async fn delete_post(&self, post_id: &PostId) -> Result<(), FeedError>;
    async fn stats(&self) -> Result<CommunityStats, FeedError>;
}

pub struct CommunityClient {
    client: Client,
    base_url: String,
    viewer_id: Option<String>,
}

impl CommunityClient {
    pub fn new(api_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", token))
                .context("API token contains characters not allowed in a header")?,
        );

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: Self::api_base(api_url),
            viewer_id: None,
        })
    }

    /// Posts are normalized from this viewer's perspective (`viewerHasLiked`).
    pub fn with_viewer(mut self, viewer_id: impl Into<String>) -> Self {
        self.viewer_id = Some(viewer_id.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `http://host:5000` and `http://host:5000/api/` both become `http://host:5000/api`.
    pub fn api_base(api_url: &str) -> String {
        let trimmed = api_url.trim().trim_end_matches('/');
        if trimmed.ends_with("/api") {
            trimmed.to_string()
        } else {
            format!("{}/api", trimmed)
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, FeedError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&error_text)
                .ok()
                .and_then(|body| body.message);
            debug!("request failed with status {}: {}", status, error_text);
            return Err(FeedError::from_status(status.as_u16(), message));
        }

        Ok(response.json().await?)
    }

    fn normalize(&self, raw: RawPost) -> Post {
        raw.normalize(self.viewer_id.as_deref(), Utc::now())
    }
}

#[async_trait]
impl CommunityApi for CommunityClient {
    async fn current_user(&self) -> Result<Author, FeedError> {
        let url = format!("{}/auth/me", self.base_url);
        let me: RawMe = self.send(self.client.get(&url)).await?;
        Ok(me.into())
    }

    async fn list_posts(&self) -> Result<Vec<Post>, FeedError> {
        let url = format!("{}/community/posts", self.base_url);
        let raw: Vec<RawPost> = self.send(self.client.get(&url)).await?;
        debug!("fetched {} posts", raw.len());
        Ok(raw.into_iter().map(|post| self.normalize(post)).collect())
    }

    async fn create_post(&self, content: &str) -> Result<Post, FeedError> {
        let url = format!("{}/community/posts", self.base_url);
        let body = serde_json::json!({ "content": content });
        let raw: RawPost = self.send(self.client.post(&url).json(&body)).await?;
        Ok(self.normalize(raw))
    }

    async fn toggle_like(&self, post_id: &PostId) -> Result<LikeState, FeedError> {
        let url = format!("{}/community/posts/{}/like", self.base_url, post_id);
        let raw: RawLikeResponse = self.send(self.client.post(&url)).await?;
        Ok(raw.into())
    }

    async fn delete_post(&self, post_id: &PostId) -> Result<(), FeedError> {
        let url = format!("{}/community/posts/{}", self.base_url, post_id);
        let _: serde_json::Value = self.send(self.client.delete(&url)).await?;
        Ok(())
    }

    async fn stats(&self) -> Result<CommunityStats, FeedError> {
        let url = format!("{}/community/stats", self.base_url);
        self.send(self.client.get(&url)).await
    }
}
