//! Wire types for the subset of the YouTube Data API v3 the sweeper calls.

use serde::Deserialize;

use crate::domain::{Comment, Video};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResource {
    pub content_details: Option<ChannelContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelContentDetails {
    pub related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
pub struct RelatedPlaylists {
    pub uploads: Option<String>,
}

impl ChannelResource {
    pub fn uploads_playlist(self) -> Option<String> {
        self.content_details
            .and_then(|details| details.related_playlists.uploads)
    }
}

#[derive(Debug, Deserialize)]
pub struct PlaylistItem {
    pub snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemSnippet {
    #[serde(default)]
    pub title: String,
    pub resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    pub video_id: Option<String>,
}

impl PlaylistItem {
    pub fn into_video(self) -> Option<Video> {
        let PlaylistItemSnippet { title, resource_id } = self.snippet;
        resource_id.video_id.map(|id| Video { id, title })
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentThread {
    pub id: String,
    pub snippet: CommentThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadSnippet {
    pub video_id: Option<String>,
    pub top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
pub struct TopLevelComment {
    pub snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSnippet {
    #[serde(default)]
    pub text_display: String,
    pub author_display_name: Option<String>,
}

impl CommentThread {
    /// The thread id doubles as the top-level comment id for moderation calls.
    pub fn into_comment(self, video_id: &str) -> Comment {
        let CommentThreadSnippet {
            video_id: thread_video,
            top_level_comment,
        } = self.snippet;
        Comment {
            id: self.id,
            text: top_level_comment.snippet.text_display,
            video_id: thread_video.unwrap_or_else(|| video_id.to_string()),
            author: top_level_comment.snippet.author_display_name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub reason: Option<String>,
}
