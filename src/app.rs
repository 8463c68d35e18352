use std::{path::Path, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chrono_tz::Tz;
use futures::FutureExt;
use reqwest::Client;
use tokio::time::timeout;
use tokio_cron_scheduler::JobScheduler;

use crate::{
    classifier::WordListLoader,
    config::{AppConfig, RunMode},
    infrastructure::{directories::ResolvedPaths, shutdown::Shutdown},
    tasks::{configure_scan_jobs, ScanCallback, ScanOrchestrator},
    youtube::{
        AuthProvider, CachedTokenAuth, ClientSecrets, InteractiveAuth, TokenStore, YoutubeClient,
    },
};

pub struct SweeperApp {
    orchestrator: Arc<ScanOrchestrator>,
    shutdown: Shutdown,
    config: Arc<AppConfig>,
}

impl SweeperApp {
    pub async fn initialize(
        config: AppConfig,
        paths: ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let config = Arc::new(config);

        let http_client = Client::builder()
            .user_agent(format!("judol-sweeper/{}", env!("CARGO_PKG_VERSION")))
            .timeout(config.youtube.request_timeout)
            .build()?;

        let auth = build_auth(http_client.clone(), &config, &paths)?;
        auth.obtain_token()
            .await
            .context("unable to authorize against the YouTube API")?;
        tracing::info!(target: "auth", "YouTube authorization ready");

        let youtube = Arc::new(YoutubeClient::new(
            http_client,
            &config.youtube.api_base,
            auth,
        )?);

        let words = Arc::new(WordListLoader::new(&config.classifier.blocked_words_path));
        words
            .current()
            .with_context(|| format!("unable to load {}", words.path().display()))?;

        let timezone: Tz = config.timezone.parse().unwrap_or(chrono_tz::Asia::Jakarta);
        let orchestrator = Arc::new(ScanOrchestrator::new(
            youtube.clone(),
            youtube,
            words,
            config.target.clone(),
            config.scan.clone(),
            timezone,
        ));

        Ok(Self {
            orchestrator,
            shutdown,
            config,
        })
    }

    pub async fn run(self) -> Result<()> {
        match self.config.scheduler.mode {
            RunMode::Once => {
                tracing::info!(target: "lifecycle", "judol sweeper running a single pass");
                self.orchestrator.run_guarded().await;
                Ok(())
            }
            RunMode::Daemon => self.run_daemon().await,
        }
    }

    async fn run_daemon(self) -> Result<()> {
        let SweeperApp {
            orchestrator,
            shutdown,
            config,
        } = self;

        tracing::info!(target: "lifecycle", "judol sweeper started");

        let callback = build_scan_callback(orchestrator.clone());
        let mut scheduler = configure_scan_jobs(&config.scheduler, callback.clone()).await?;

        let mut startup_scan = config
            .scheduler
            .run_on_startup
            .then(|| tokio::spawn(callback()));

        let mut shutdown_listener = shutdown.subscribe();
        shutdown_listener.notified().await;
        tracing::info!(target: "lifecycle", "shutdown signal received (CTRL+C / SIGTERM)");

        let shutdown_timeout = Duration::from_secs(5);
        stop_scheduler(&mut scheduler, shutdown_timeout).await;

        if let Some(handle) = startup_scan.as_mut() {
            if timeout(shutdown_timeout, &mut *handle).await.is_err() {
                tracing::warn!(
                    target: "scan",
                    "startup scan did not finish within {:?}; aborting",
                    shutdown_timeout
                );
                handle.abort();
            }
        }

        if orchestrator.is_running() {
            tracing::warn!(target: "scan", "exiting while a scheduled scan is still in progress");
        }

        tracing::info!(target: "lifecycle", "judol sweeper stopped");
        Ok(())
    }
}

fn build_auth(
    http: Client,
    config: &AppConfig,
    paths: &ResolvedPaths,
) -> Result<Arc<dyn AuthProvider>> {
    let secrets = ClientSecrets::load(Path::new(&config.youtube.credentials_path))?;
    let cached = CachedTokenAuth::new(http, secrets, TokenStore::new(&paths.token_file));
    if config.youtube.interactive_auth {
        Ok(Arc::new(InteractiveAuth::new(cached)))
    } else {
        Ok(Arc::new(cached))
    }
}

fn build_scan_callback(orchestrator: Arc<ScanOrchestrator>) -> ScanCallback {
    Arc::new(move || {
        let orchestrator = orchestrator.clone();
        async move {
            orchestrator.run_guarded().await;
        }
        .boxed()
    })
}

async fn stop_scheduler(scheduler: &mut JobScheduler, wait: Duration) {
    match timeout(wait, scheduler.shutdown()).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            tracing::error!(target: "scheduler", ?err, "scheduler shutdown failed");
        }
        Err(_) => {
            tracing::warn!(
                target: "scheduler",
                "scheduler did not stop within {:?}",
                wait
            );
        }
    }
}
