use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to read OAuth client credentials {path}: {source}")]
    CredentialsRead {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("OAuth client credentials {path} are invalid: {reason}")]
    CredentialsInvalid { path: String, reason: String },
    #[error("no stored token at {path}; run interactively once to authorize")]
    MissingToken { path: String },
    #[error("stored token at {path} expired and has no refresh token")]
    NotRefreshable { path: String },
    #[error("token file {path} could not be used: {reason}")]
    TokenStore { path: String, reason: String },
    #[error("token endpoint rejected the request ({status}): {body}")]
    Exchange { status: u16, body: String },
    #[error("token request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("failed to read authorization code: {0}")]
    Prompt(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("youtube request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("youtube api returned {status}: {message}")]
    Status {
        status: u16,
        reason: Option<String>,
        message: String,
    },
    #[error("comments are disabled for video {video_id}")]
    CommentsDisabled { video_id: String },
    #[error("channel {0} not found or has no uploads playlist")]
    ChannelNotFound(String),
    #[error("invalid api url: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    pub fn reason(&self) -> Option<&str> {
        match self {
            ApiError::Status { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }
}
