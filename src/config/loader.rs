use std::{env, time::Duration};

use super::env::{
    AppConfig, ClassifierConfig, ConfigError, DirectoryConfig, LoggingConfig, RemovalMode,
    RunMode, ScanConfig, ScanTarget, SchedulerConfig, YoutubeConfig,
};

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_lookup(|key| env::var(key).ok())
}

impl AppConfig {
    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let target = match (var("YOUTUBE_CHANNEL_ID"), var("YOUTUBE_VIDEO_ID")) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingTarget),
            (Some(channel), None) => ScanTarget::Channel(channel),
            (None, Some(video)) => ScanTarget::Video(video),
            (None, None) => return Err(ConfigError::Missing("YOUTUBE_CHANNEL_ID")),
        };

        let youtube = YoutubeConfig {
            api_base: var("YOUTUBE_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            credentials_path: var("GOOGLE_CREDENTIALS_PATH")
                .unwrap_or_else(|| "credentials.json".to_string()),
            token_path: var("TOKEN_PATH").unwrap_or_else(|| "token.json".to_string()),
            interactive_auth: parse_bool(&var, "AUTH_INTERACTIVE", true)?,
            request_timeout: Duration::from_millis(parse_num(&var, "API_TIMEOUT_MS", 30_000)?),
        };

        let removal = match var("REMOVAL_MODE").as_deref() {
            None | Some("reject") | Some("rejected") => RemovalMode::Reject,
            Some("hold") | Some("heldForReview") => RemovalMode::Hold,
            Some("delete") => RemovalMode::Delete,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "REMOVAL_MODE",
                    value: other.to_string(),
                })
            }
        };

        let scan = ScanConfig {
            removal,
            dry_run: parse_bool(&var, "DRY_RUN", false)?,
            comment_pages_per_video: parse_num(&var, "COMMENT_PAGES_PER_VIDEO", 1u32)?.max(1),
        };

        let classifier = ClassifierConfig {
            blocked_words_path: var("BLOCKED_WORDS_PATH")
                .unwrap_or_else(|| "blockedword.json".to_string()),
        };

        let directories = DirectoryConfig {
            logs_dir: var("LOGS_DIR").unwrap_or_else(|| "logs".to_string()),
            data_dir: var("DATA_DIR").unwrap_or_else(|| "data".to_string()),
        };

        let logging = LoggingConfig {
            level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            retention_days: parse_num(&var, "LOG_RETENTION_DAYS", 7usize)?,
        };

        let timezone = var("SWEEPER_TIMEZONE").unwrap_or_else(|| "Asia/Jakarta".to_string());

        let mode = match var("RUN_MODE").as_deref() {
            None | Some("daemon") => RunMode::Daemon,
            Some("once") => RunMode::Once,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "RUN_MODE",
                    value: other.to_string(),
                })
            }
        };

        let scheduler = SchedulerConfig {
            mode,
            interval: Duration::from_secs(parse_num(&var, "SCAN_INTERVAL_SECS", 86_400u64)?.max(1)),
            cron_specs: var("SCAN_CRONS")
                .map(|value| {
                    value
                        .split(';')
                        .map(|part| part.trim().to_string())
                        .filter(|part| !part.is_empty())
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default(),
            run_on_startup: parse_bool(&var, "RUN_ON_STARTUP", true)?,
        };

        Ok(Self {
            target,
            youtube,
            scan,
            classifier,
            directories,
            logging,
            timezone,
            scheduler,
        })
    }
}

fn parse_bool<F>(var: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(default),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value }),
        },
    }
}

fn parse_num<F, T>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match var(key) {
        None => Ok(default),
        Some(value) => value
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn channel_mode_uses_defaults() {
        let config = config_from(&[("YOUTUBE_CHANNEL_ID", "UC123")]).unwrap();
        assert_eq!(config.target, ScanTarget::Channel("UC123".into()));
        assert_eq!(config.scan.removal, RemovalMode::Reject);
        assert_eq!(config.scan.comment_pages_per_video, 1);
        assert_eq!(config.scheduler.interval, Duration::from_secs(86_400));
        assert_eq!(config.scheduler.mode, RunMode::Daemon);
        assert_eq!(config.logging.retention_days, 7);
        assert_eq!(config.classifier.blocked_words_path, "blockedword.json");
        assert!(config.youtube.interactive_auth);
    }

    #[test]
    fn channel_and_video_are_exclusive() {
        let err = config_from(&[("YOUTUBE_CHANNEL_ID", "UC1"), ("YOUTUBE_VIDEO_ID", "abc")])
            .unwrap_err();
        assert_eq!(err, ConfigError::ConflictingTarget);
        assert_eq!(
            config_from(&[]).unwrap_err(),
            ConfigError::Missing("YOUTUBE_CHANNEL_ID")
        );
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config_from(&[
            ("YOUTUBE_VIDEO_ID", "dQw4w9WgXcQ"),
            ("YOUTUBE_CHANNEL_ID", "  "),
            ("LOG_LEVEL", ""),
        ])
        .unwrap();
        assert_eq!(config.target, ScanTarget::Video("dQw4w9WgXcQ".into()));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parses_scan_and_scheduler_overrides() {
        let config = config_from(&[
            ("YOUTUBE_CHANNEL_ID", "UC1"),
            ("REMOVAL_MODE", "delete"),
            ("DRY_RUN", "yes"),
            ("RUN_MODE", "once"),
            ("SCAN_CRONS", "0 0 3 * * *; 0 0 15 * * *"),
            ("COMMENT_PAGES_PER_VIDEO", "0"),
        ])
        .unwrap();
        assert_eq!(config.scan.removal, RemovalMode::Delete);
        assert!(config.scan.dry_run);
        assert_eq!(config.scan.comment_pages_per_video, 1);
        assert_eq!(config.scheduler.mode, RunMode::Once);
        assert_eq!(
            config.scheduler.cron_specs,
            vec!["0 0 3 * * *".to_string(), "0 0 15 * * *".to_string()]
        );
    }

    #[test]
    fn rejects_invalid_values() {
        let err = config_from(&[("YOUTUBE_CHANNEL_ID", "UC1"), ("DRY_RUN", "maybe")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "DRY_RUN",
                value: "maybe".into()
            }
        );
        assert!(config_from(&[("YOUTUBE_CHANNEL_ID", "UC1"), ("REMOVAL_MODE", "nuke")]).is_err());
    }
}
