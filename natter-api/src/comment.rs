use uuid::Uuid;

use crate::{Author, AuthorId, RawAuthor, Time};

/// Prefix reserved for client-assigned ids, never produced by the server
pub const TEMP_ID_PREFIX: &str = "temp_";

#[derive(
    Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct CommentId(pub String);

impl CommentId {
    /// Generates a fresh client-side id in the temporary namespace
    pub fn temporary() -> CommentId {
        CommentId(format!("{TEMP_ID_PREFIX}{}", Uuid::new_v4().simple()))
    }

    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CommentId {
    fn from(s: &str) -> CommentId {
        CommentId(s.to_string())
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct PostId(pub String);

impl From<&str> for PostId {
    fn from(s: &str) -> PostId {
        PostId(s.to_string())
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical comment, as held by the client and written to the persisted snapshot
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,

    /// None for top-level comments
    pub parent_id: Option<CommentId>,

    pub text: String,
    pub upvote_count: u32,
    pub created_at: Time,
    pub author_id: AuthorId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
}

impl Comment {
    /// Whether this comment was inserted locally and is still waiting for the server
    pub fn is_provisional(&self) -> bool {
        self.id.is_temporary()
    }
}

/// Comment as sent by the server. Field names vary between server versions, hence
/// the aliases; use `natter_client::normalize` to turn it into a `Comment`.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawComment {
    pub id: String,

    #[serde(default, alias = "parent_id")]
    pub parent_id: Option<String>,

    pub text: String,

    #[serde(default, alias = "upvotes")]
    pub upvote_count: Option<i64>,

    #[serde(alias = "created_at")]
    pub created_at: Time,

    #[serde(default, alias = "userId", alias = "user_id")]
    pub author_id: Option<String>,

    #[serde(default, alias = "user")]
    pub author: Option<RawAuthor>,

    #[serde(default)]
    pub has_upvoted: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub post_id: PostId,
    pub parent_id: Option<CommentId>,
    pub text: String,
}

/// Authoritative upvote state returned by the server after a toggle
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpvoteToggle {
    #[serde(alias = "upvotes")]
    pub upvote_count: i64,

    // Older servers only send the count
    #[serde(default)]
    pub has_upvoted: Option<bool>,
}
