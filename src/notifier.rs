use async_trait::async_trait;
use chrono::{DateTime, Local};
use log::{error, info};
use reqwest::Client;
use serde::Serialize;
use std::{num::NonZeroU32, time::Duration};

use crate::error::Error;
use crate::registry::{SiteEntry, describe};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Delivers monitoring messages. Delivery failures are logged, never returned.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn alert_down(&self, url: &str, annotation: &str);

    async fn send_daily_report(&self, entries: &[SiteEntry]);
}

#[derive(Serialize)]
struct SlackMessage<'a> {
    text: &'a str,
}

/// Posts `{"text": ...}` payloads to a Slack-compatible incoming webhook.
pub struct SlackNotifier {
    client: Client,
    webhook_url: String,
    alert_threshold: NonZeroU32,
}

impl SlackNotifier {
    /// Each delivery attempt is abandoned after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(
        webhook_url: impl Into<String>,
        alert_threshold: NonZeroU32,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
            alert_threshold,
        })
    }

    async fn post(&self, text: &str) -> Result<(), Error> {
        self.client
            .post(&self.webhook_url)
            .json(&SlackMessage { text })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn alert_down(&self, url: &str, annotation: &str) {
        let message = down_alert_message(url, annotation, self.alert_threshold.get(), Local::now());

        match self.post(&message).await {
            Ok(()) => info!("Sent down alert for {url}"),
            Err(e) => error!("Failed to send Slack alert for {url}: {e}"),
        }
    }

    async fn send_daily_report(&self, entries: &[SiteEntry]) {
        let message = daily_report_message(entries);

        match self.post(&message).await {
            Ok(()) => info!("Sent daily report covering {} sites", entries.len()),
            Err(e) => error!("Failed to send daily report: {e}"),
        }
    }
}

/// Text of the alert sent when a site reaches a multiple of the threshold.
#[must_use]
pub fn down_alert_message(
    url: &str,
    annotation: &str,
    threshold: u32,
    at: DateTime<Local>,
) -> String {
    format!(
        "🚨 Alert: {} has been down for {threshold} consecutive checks!\nTime: {}",
        describe(url, annotation),
        at.format(TIMESTAMP_FORMAT)
    )
}

/// Text of the aggregate report, one line per site in registry order.
#[must_use]
pub fn daily_report_message(entries: &[SiteEntry]) -> String {
    let mut lines = vec!["📊 Daily Status Report:".to_string()];

    lines.extend(entries.iter().map(|entry| {
        let status = if entry.is_up() { "✅ Up" } else { "❌ Down" };
        format!("{status}: {}", entry.describe())
    }));

    lines.join("\n")
}
