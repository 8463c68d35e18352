use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::Result;
use chrono_tz::Tz;

use crate::{
    classifier::{classify_page, SpamClassifier, WordListLoader},
    config::{RemovalMode, ScanConfig, ScanTarget},
    domain::{ScanFailure, ScanReport, Video},
    youtube::{
        ApiError, CommentSource, ModerationSink, ModerationStatus, MAX_MODERATION_BATCH,
    },
};

/// Drives one scan pass: list videos, classify their comments, remove spam.
pub struct ScanOrchestrator {
    source: Arc<dyn CommentSource>,
    sink: Arc<dyn ModerationSink>,
    words: Arc<WordListLoader>,
    target: ScanTarget,
    settings: ScanConfig,
    timezone: Tz,
    running: AtomicBool,
}

/// Held for the duration of a run; clears the in-progress flag on drop.
pub struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl ScanOrchestrator {
    pub fn new(
        source: Arc<dyn CommentSource>,
        sink: Arc<dyn ModerationSink>,
        words: Arc<WordListLoader>,
        target: ScanTarget,
        settings: ScanConfig,
        timezone: Tz,
    ) -> Self {
        Self {
            source,
            sink,
            words,
            target,
            settings,
            timezone,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn try_begin(&self) -> Option<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard {
                flag: &self.running,
            })
    }

    /// Runs a pass unless one is already in progress, in which case the
    /// trigger is skipped and `None` is returned.
    pub async fn run_guarded(&self) -> Option<ScanReport> {
        let Some(_guard) = self.try_begin() else {
            tracing::warn!(target: "scan", "previous scan still running; skipping trigger");
            return None;
        };
        Some(self.run().await)
    }

    async fn run(&self) -> ScanReport {
        let mut report = ScanReport::start();
        tracing::info!(
            target: "scan",
            target_kind = ?self.target,
            dry_run = self.settings.dry_run,
            started = %report.started_at.with_timezone(&self.timezone).format("%Y-%m-%d %H:%M:%S %Z"),
            "scan started"
        );

        if let Err(err) = self.scan(&mut report).await {
            tracing::error!(target: "scan", error = %err, "scan run aborted");
        }

        report.finish();
        tracing::info!(
            target: "scan",
            videos = report.videos_checked,
            comments = report.comments_checked,
            spam_found = report.spam_found,
            spam_removed = report.spam_removed,
            failed_removals = report.failed_removals(),
            failures = report.failures.len(),
            "scan finished"
        );
        report
    }

    async fn scan(&self, report: &mut ScanReport) -> Result<()> {
        let words = self.words.current()?;
        let classifier = SpamClassifier::new(words);

        let videos = self.list_videos(report).await?;
        tracing::info!(target: "scan", total = videos.len(), "videos to check");

        for video in videos {
            tracing::info!(
                target: "scan",
                video_id = %video.id,
                title = %video.title,
                "checking video"
            );
            report.videos_checked += 1;

            let spam_ids = self.collect_spam(&classifier, &video, report).await?;
            if spam_ids.is_empty() {
                tracing::info!(target: "scan", video_id = %video.id, "no spam comments found");
                continue;
            }

            report.spam_found += spam_ids.len();
            if self.settings.dry_run {
                tracing::info!(
                    target: "scan",
                    video_id = %video.id,
                    ids = ?spam_ids,
                    "dry run; leaving spam comments in place"
                );
                continue;
            }

            tracing::info!(
                target: "scan",
                video_id = %video.id,
                total = spam_ids.len(),
                "removing spam comments"
            );
            self.remove(&spam_ids, report).await?;
        }
        Ok(())
    }

    async fn list_videos(&self, report: &mut ScanReport) -> Result<Vec<Video>, ApiError> {
        let channel_id = match &self.target {
            ScanTarget::Video(id) => {
                return Ok(vec![Video {
                    id: id.clone(),
                    title: id.clone(),
                }])
            }
            ScanTarget::Channel(id) => id,
        };

        let playlist = match self.source.uploads_playlist(channel_id).await {
            Ok(playlist) => playlist,
            Err(err) => {
                record_fetch_error(report, err, |message| ScanFailure::ListVideos { message })?;
                return Ok(Vec::new());
            }
        };

        let mut videos = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = match self
                .source
                .playlist_videos(&playlist, page_token.as_deref())
                .await
            {
                Ok(page) => page,
                Err(err) => {
                    record_fetch_error(report, err, |message| ScanFailure::ListVideos {
                        message,
                    })?;
                    break;
                }
            };
            videos.extend(page.videos);
            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(videos)
    }

    /// Spam ids for one video, de-duplicated, in fetch order.
    async fn collect_spam(
        &self,
        classifier: &SpamClassifier,
        video: &Video,
        report: &mut ScanReport,
    ) -> Result<Vec<String>, ApiError> {
        let mut spam_ids = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut page_token: Option<String> = None;

        for _ in 0..self.settings.comment_pages_per_video {
            let page = match self
                .source
                .comment_threads(&video.id, page_token.as_deref())
                .await
            {
                Ok(page) => page,
                Err(ApiError::CommentsDisabled { .. }) => {
                    tracing::info!(
                        target: "scan",
                        video_id = %video.id,
                        "comments are disabled for this video"
                    );
                    break;
                }
                Err(err) => {
                    let video_id = video.id.clone();
                    record_fetch_error(report, err, |message| ScanFailure::FetchComments {
                        video_id,
                        message,
                    })?;
                    break;
                }
            };

            report.comments_checked += page.comments.len();
            let results = classify_page(classifier, &page.comments);
            for (comment, result) in page.comments.iter().zip(results) {
                tracing::debug!(target: "scan", comment_id = %comment.id, text = %comment.text, "checking comment");
                if !result.is_spam() {
                    continue;
                }
                tracing::info!(
                    target: "scan",
                    comment_id = %comment.id,
                    author = comment.author.as_deref().unwrap_or("-"),
                    reason = %result.verdict,
                    text = %comment.text,
                    "spam detected"
                );
                if seen_ids.insert(result.comment_id.clone()) {
                    spam_ids.push(result.comment_id);
                }
            }

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(spam_ids)
    }

    async fn remove(&self, ids: &[String], report: &mut ScanReport) -> Result<(), ApiError> {
        let status = match self.settings.removal {
            RemovalMode::Reject => ModerationStatus::Rejected,
            RemovalMode::Hold => ModerationStatus::HeldForReview,
            RemovalMode::Delete => return self.delete_each(ids, report).await,
        };

        let total = ids.len();
        let mut removed = 0;
        let mut attempted = 0;
        for chunk in ids.chunks(MAX_MODERATION_BATCH) {
            attempted += chunk.len();
            match self.sink.set_moderation_status(chunk, status).await {
                Ok(()) => {
                    removed += chunk.len();
                    report.spam_removed += chunk.len();
                    tracing::info!(
                        target: "scan",
                        status = status.as_str(),
                        ids = ?chunk,
                        "progress: {removed}/{total} ({} remaining)",
                        total - attempted
                    );
                }
                Err(err) => record_removal_error(report, chunk, err)?,
            }
        }
        Ok(())
    }

    async fn delete_each(&self, ids: &[String], report: &mut ScanReport) -> Result<(), ApiError> {
        let total = ids.len();
        let mut removed = 0;
        for (index, id) in ids.iter().enumerate() {
            match self.sink.delete_comment(id).await {
                Ok(()) => {
                    removed += 1;
                    report.spam_removed += 1;
                    tracing::info!(
                        target: "scan",
                        comment_id = %id,
                        "progress: {removed}/{total} ({} remaining)",
                        total - index - 1
                    );
                }
                Err(err) => record_removal_error(report, std::slice::from_ref(id), err)?,
            }
        }
        Ok(())
    }
}

/// Records a recoverable fetch error. Auth failures are returned so they end
/// the run instead.
fn record_fetch_error<F>(report: &mut ScanReport, err: ApiError, failure: F) -> Result<(), ApiError>
where
    F: FnOnce(String) -> ScanFailure,
{
    if matches!(err, ApiError::Auth(_)) {
        return Err(err);
    }
    tracing::error!(target: "scan", error = %err, "fetch failed; treating as empty");
    report.failures.push(failure(err.to_string()));
    Ok(())
}

fn record_removal_error(
    report: &mut ScanReport,
    ids: &[String],
    err: ApiError,
) -> Result<(), ApiError> {
    tracing::error!(
        target: "scan",
        ids = ?ids,
        error = %err,
        "failed to remove comments"
    );
    report.failures.push(ScanFailure::RemoveBatch {
        ids: ids.to_vec(),
        message: err.to_string(),
    });
    if matches!(err, ApiError::Auth(_)) {
        return Err(err);
    }
    Ok(())
}
