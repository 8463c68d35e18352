pub mod comment;
pub mod types;

pub use comment::{Comment, CommentPage, Video, VideoPage};
pub use types::{ClassificationResult, ScanFailure, ScanReport, Verdict};
