pub mod auth;
pub mod client;
pub mod error;
pub mod types;

use async_trait::async_trait;

use crate::domain::{CommentPage, VideoPage};

pub use auth::{AuthProvider, CachedTokenAuth, ClientSecrets, InteractiveAuth, TokenStore};
pub use client::YoutubeClient;
pub use error::{ApiError, AuthError};

/// Page size for `commentThreads.list`.
pub const MAX_COMMENT_RESULTS: u32 = 100;
/// Page size for `playlistItems.list`.
pub const MAX_PLAYLIST_RESULTS: u32 = 50;
/// Most ids `comments.setModerationStatus` accepts in one call.
pub const MAX_MODERATION_BATCH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationStatus {
    Rejected,
    HeldForReview,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Rejected => "rejected",
            ModerationStatus::HeldForReview => "heldForReview",
        }
    }
}

/// Read side of the platform: channel uploads and comment threads.
#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn uploads_playlist(&self, channel_id: &str) -> Result<String, ApiError>;

    async fn playlist_videos(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<VideoPage, ApiError>;

    /// One page of top-level threads, at most [`MAX_COMMENT_RESULTS`] long.
    async fn comment_threads(
        &self,
        video_id: &str,
        page_token: Option<&str>,
    ) -> Result<CommentPage, ApiError>;
}

/// Write side of the platform: hiding or deleting comments.
#[async_trait]
pub trait ModerationSink: Send + Sync {
    async fn set_moderation_status(
        &self,
        ids: &[String],
        status: ModerationStatus,
    ) -> Result<(), ApiError>;

    async fn delete_comment(&self, id: &str) -> Result<(), ApiError>;
}
