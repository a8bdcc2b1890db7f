pub mod clock;
pub mod config;
pub mod error;
pub mod notifier;
pub mod registry;
pub mod transport;
pub mod worker;

#[cfg(test)]
mod test_util;

use log::{info, warn};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::clock::SystemClock;
use crate::config::Config;
use crate::error::Error;
use crate::notifier::SlackNotifier;
use crate::registry::Registry;
use crate::transport::{Route, Transport};
use crate::worker::{Monitor, Schedule};

/// Builds the monitor from `config` and runs it until `token` is cancelled.
///
/// # Errors
///
/// Returns an error if the HTTP transports cannot be constructed.
pub async fn monitor_sites(config: Config, token: CancellationToken) -> Result<(), Error> {
    let settings = &config.settings;

    // Initial configuration logging
    info!("Starting site monitoring...");
    if let Some(host) = Url::parse(&config.slack_webhook_url)?.host_str() {
        info!("Notifications will be posted to {host}");
    }
    info!("Check interval: {} seconds", settings.check_interval_secs);
    info!("Timeout: {} seconds", settings.timeout_secs);
    info!(
        "Alerting every {} consecutive failures, reporting every {} seconds",
        settings.alert_threshold, settings.report_interval_secs
    );
    match (
        settings.accept_invalid_certs.direct,
        settings.accept_invalid_certs.proxied,
    ) {
        (true, true) => warn!("Certificate validation is disabled for all sites"),
        (true, false) => warn!("Certificate validation is disabled for direct sites"),
        (false, true) => warn!("Certificate validation is disabled for onion sites"),
        (false, false) => {}
    }

    let mut registry = Registry::new();
    info!("Starting monitoring for the following sites:");
    for site in &config.sites {
        match Route::for_url(&site.url) {
            Route::Direct => info!("- {} ({})", site.url, site.annotation()),
            Route::Proxied => info!(
                "- {} ({}) via {}",
                site.url,
                site.annotation(),
                settings.socks_proxy
            ),
        }
        registry.register(site.url.as_str(), site.annotation());
    }

    let transport = Transport::new(settings)?;
    let notifier = SlackNotifier::new(
        config.slack_webhook_url.as_str(),
        settings.alert_threshold,
        settings.timeout(),
    )?;

    let mut monitor = Monitor::new(
        registry,
        transport,
        notifier,
        SystemClock,
        Schedule::from(settings),
    );
    monitor.run(token).await;

    Ok(())
}
