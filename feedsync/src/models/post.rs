use std::fmt;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

pub const ANONYMOUS: &str = "Anonymous";

/// Longest draft accepted before anything is sent.
pub const MAX_DRAFT_CHARS: usize = 2000;

/// Longest content the community service stores; longer posts are rejected remotely.
pub const MAX_REMOTE_CONTENT_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PostId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PostId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: String,
    pub display_name: String,
}

impl Author {
    /// Blank or missing names fall back to [`ANONYMOUS`].
    pub fn new(id: impl Into<String>, display_name: Option<&str>) -> Self {
        let display_name = display_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(ANONYMOUS)
            .to_string();

        Self {
            id: id.into(),
            display_name,
        }
    }

    pub fn anonymous() -> Self {
        Self::new(String::new(), None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub like_count: u64,
    pub viewer_has_liked: bool,
}

/// A feed entry, either confirmed by the server or still tentative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub content: String,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    pub like_count: u64,
    pub viewer_has_liked: bool,
    pub is_tentative: bool,
}

impl Post {
    pub fn tentative(id: PostId, content: String, author: Author, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            content,
            author,
            created_at,
            like_count: 0,
            viewer_has_liked: false,
            is_tentative: true,
        }
    }

    pub fn set_like_state(&mut self, state: LikeState) {
        self.like_count = state.like_count;
        self.viewer_has_liked = state.viewer_has_liked;
    }
}

/// Author as sent by the server: populated document or a bare object id.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawAuthor {
    Id(String),
    Populated {
        #[serde(rename = "_id", default)]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
}

impl RawAuthor {
    fn id(&self) -> Option<&str> {
        match self {
            RawAuthor::Id(id) => Some(id),
            RawAuthor::Populated { id, .. } => id.as_deref(),
        }
    }

    fn into_author(self) -> Author {
        match self {
            RawAuthor::Id(id) => Author::new(id, None),
            RawAuthor::Populated { id, name } => Author::new(id.unwrap_or_default(), name.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPost {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Option<RawAuthor>,
    #[serde(default)]
    pub likes: Option<i64>,
    #[serde(default)]
    pub liked_by: Option<Vec<RawAuthor>>,
    #[serde(default)]
    pub has_liked: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl RawPost {
    /// Produce a fully populated confirmed [`Post`] as seen by `viewer_id`.
    pub fn normalize(self, viewer_id: Option<&str>, received_at: DateTime<Utc>) -> Post {
        let viewer_has_liked = match (self.has_liked, viewer_id) {
            (Some(has_liked), _) => has_liked,
            (None, Some(viewer_id)) => self
                .liked_by
                .iter()
                .flatten()
                .any(|liker| liker.id() == Some(viewer_id)),
            (None, None) => false,
        };

        let created_at = self
            .created_at
            .as_deref()
            .and_then(|raw| match DateTime::parse_from_rfc3339(raw) {
                Ok(parsed) => Some(parsed.with_timezone(&Utc)),
                Err(e) => {
                    debug!("post {} has unparsable createdAt {raw:?}: {e}", self.id);
                    None
                }
            })
            .unwrap_or(received_at);

        Post {
            id: PostId(self.id),
            content: self.content,
            author: self
                .author
                .map(RawAuthor::into_author)
                .unwrap_or_else(Author::anonymous),
            created_at,
            like_count: self.likes.unwrap_or(0).max(0) as u64,
            viewer_has_liked,
            is_tentative: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLikeResponse {
    #[serde(default)]
    pub likes: Option<i64>,
    #[serde(default)]
    pub has_liked: Option<bool>,
}

impl From<RawLikeResponse> for LikeState {
    fn from(raw: RawLikeResponse) -> Self {
        Self {
            like_count: raw.likes.unwrap_or(0).max(0) as u64,
            viewer_has_liked: raw.has_liked.unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMe {
    pub user: RawUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<RawMe> for Author {
    fn from(me: RawMe) -> Self {
        Author::new(me.user.id, me.user.name.as_deref())
    }
}
