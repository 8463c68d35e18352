use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub target: ScanTarget,
    pub youtube: YoutubeConfig,
    pub scan: ScanConfig,
    pub classifier: ClassifierConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
    pub timezone: String,
    pub scheduler: SchedulerConfig,
}

/// What a scan pass walks over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTarget {
    Channel(String),
    Video(String),
}

#[derive(Debug, Clone)]
pub struct YoutubeConfig {
    pub api_base: String,
    pub credentials_path: String,
    pub token_path: String,
    pub interactive_auth: bool,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub removal: RemovalMode,
    pub dry_run: bool,
    pub comment_pages_per_video: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalMode {
    /// `comments.setModerationStatus` with `rejected`.
    Reject,
    /// `comments.setModerationStatus` with `heldForReview`.
    Hold,
    /// `comments.delete`, one request per comment.
    Delete,
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub blocked_words_path: String,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub data_dir: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub retention_days: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Daemon,
    Once,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub mode: RunMode,
    pub interval: Duration,
    pub cron_specs: Vec<String>,
    pub run_on_startup: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("YOUTUBE_CHANNEL_ID and YOUTUBE_VIDEO_ID are mutually exclusive")]
    ConflictingTarget,
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}
