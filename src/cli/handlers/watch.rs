//! Watch command handler
//!
//! Follows a user's unread notifications from a running server through
//! [`AdaptiveSync`], printing new notifications and scheduler state changes.
//! Lines on stdin drive the scheduler.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use crate::api::dto::NotificationListResponse;
use crate::config::Settings;
use crate::error::{AppError, AppResult};
use crate::logger::LogLevelHandle;
use crate::models::Notification;
use crate::sync::{AdaptiveSync, SyncError, SyncSource, SyncStatus};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const PAGE_SIZE: u32 = 100;

/// First page of a user's unread notifications, fetched over HTTP
pub struct NotificationFeed {
    client: reqwest::Client,
    url: String,
    service_token: String,
}

impl NotificationFeed {
    pub fn new(base_url: &str, user_id: Uuid, service_token: &str) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .gzip(true)
            .user_agent(format!("crewmatch-watch/{}", crate::pkg_version()))
            .build()
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;

        let url = format!(
            "{}/api/users/{}/notifications?unread_only=true&page=1&page_size={}",
            base_url.trim_end_matches('/'),
            user_id,
            PAGE_SIZE
        );

        Ok(Self {
            client,
            url,
            service_token: service_token.to_string(),
        })
    }
}

#[async_trait]
impl SyncSource for NotificationFeed {
    type Output = NotificationListResponse;

    async fn fetch(&self) -> anyhow::Result<NotificationListResponse> {
        let page = self
            .client
            .get(&self.url)
            .bearer_auth(&self.service_token)
            .send()
            .await?
            .error_for_status()?
            .json::<NotificationListResponse>()
            .await?;
        Ok(page)
    }
}

/// What a line typed on stdin asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    RefetchNow,
    Pause,
    Resume,
    ToggleDebug,
    MarkActive,
}

impl Control {
    fn parse(line: &str) -> Self {
        match line.trim() {
            "" => Control::RefetchNow,
            "p" => Control::Pause,
            "r" => Control::Resume,
            "v" => Control::ToggleDebug,
            _ => Control::MarkActive,
        }
    }
}

/// Handler for the watch command
pub struct WatchCommandHandler {
    config: Settings,
    log_handle: Option<LogLevelHandle>,
}

impl WatchCommandHandler {
    pub fn new(config: Settings, log_handle: Option<LogLevelHandle>) -> Self {
        Self { config, log_handle }
    }

    /// Poll until Ctrl+C.
    pub async fn execute(&self, user_id: Uuid) -> AppResult<()> {
        let feed = NotificationFeed::new(
            &self.config.sync.base_url,
            user_id,
            &self.config.api.service_token,
        )?;
        let sync = AdaptiveSync::spawn(feed, self.config.sync.to_sync_config(), None)
            .map_err(sync_error)?;

        println!(
            "Watching unread notifications of {user_id} on {}",
            self.config.sync.base_url
        );
        println!("<enter> refetch, p pause, r resume, v toggle debug logging, anything else: I'm here");

        let mut status_rx = sync.subscribe();
        let mut data_rx = sync.subscribe_data();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;
        let mut seen = HashSet::new();
        let mut last_summary = String::new();
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => break,

                line = lines.next_line(), if stdin_open => match line {
                    Ok(Some(line)) => self.apply_control(&sync, Control::parse(&line), &mut seen).await,
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        tracing::warn!(error = %e, "Stopped reading stdin");
                        stdin_open = false;
                    }
                },

                changed = status_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let summary = summarize(&status_rx.borrow_and_update());
                    if summary != last_summary {
                        println!("[sync] {summary}");
                        last_summary = summary;
                    }
                },

                changed = data_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let page = data_rx.borrow_and_update().clone();
                    if let Some(page) = page {
                        print_fresh(&page, &mut seen);
                    }
                },
            }
        }

        sync.shutdown().await;
        Ok(())
    }

    async fn apply_control(
        &self,
        sync: &AdaptiveSync<NotificationFeed>,
        control: Control,
        seen: &mut HashSet<Uuid>,
    ) {
        match control {
            Control::RefetchNow => match sync.refetch_now().await {
                Ok(page) => {
                    print_fresh(&page, seen);
                    println!("{} unread", page.unread_count);
                }
                Err(e) => println!("Refetch failed: {e}"),
            },
            Control::Pause => sync.pause(),
            Control::Resume => sync.resume(),
            Control::MarkActive => sync.mark_active(),
            Control::ToggleDebug => self.toggle_debug(),
        }
    }

    fn toggle_debug(&self) {
        let Some(handle) = &self.log_handle else {
            return;
        };

        let next = match handle.current() {
            Some(current) if current.contains("debug") => "info",
            _ => "debug",
        };
        match handle.set_level(next) {
            Ok(()) => println!("Log level: {next}"),
            Err(e) => println!("Could not change log level: {e}"),
        }
    }
}

fn sync_error(error: SyncError) -> AppError {
    AppError::Validation {
        field: "sync".to_string(),
        reason: error.to_string(),
    }
}

/// Notifications in `page` not printed before, recording them as seen.
///
/// `seen` only keeps ids still on the current page.
fn fresh<'a>(page: &'a NotificationListResponse, seen: &mut HashSet<Uuid>) -> Vec<&'a Notification> {
    let on_page: HashSet<Uuid> = page.items.iter().map(|notification| notification.id).collect();
    seen.retain(|id| on_page.contains(id));

    page.items
        .iter()
        .filter(|notification| seen.insert(notification.id))
        .collect()
}

fn print_fresh(page: &NotificationListResponse, seen: &mut HashSet<Uuid>) {
    for notification in fresh(page, seen) {
        println!(
            "[{}] {}: {}",
            notification.created_at, notification.title, notification.message
        );
    }
}

/// Human-readable scheduler state, ignoring fetch progress and timestamps
fn summarize(status: &SyncStatus) -> String {
    let mode = if status.is_paused {
        "paused"
    } else if status.is_idle {
        "idle"
    } else {
        "active"
    };

    let mut summary = match status.current_interval {
        Some(interval) => format!("{mode}, polling every {}", format_interval(interval)),
        None => format!("{mode}, not polling"),
    };
    if status.error_count > 0 {
        summary.push_str(&format!(", {} consecutive failure(s)", status.error_count));
    }
    summary
}

fn format_interval(interval: Duration) -> String {
    if interval.subsec_millis() == 0 {
        format!("{}s", interval.as_secs())
    } else {
        format!("{}ms", interval.as_millis())
    }
}
