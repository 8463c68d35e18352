use serde::{Deserialize, Serialize};

/// A top-level comment as fetched for one scan pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    /// Raw `textDisplay`, which may still contain HTML markup.
    pub text: String,
    pub video_id: String,
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Default)]
pub struct VideoPage {
    pub videos: Vec<Video>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CommentPage {
    pub comments: Vec<Comment>,
    pub next_page_token: Option<String>,
}
