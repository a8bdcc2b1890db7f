use chrono::{DateTime, Local};
use log::{debug, info, warn};
use std::{num::NonZeroU32, time::Duration};
use tokio::{select, time::sleep};
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::config::Settings;
use crate::notifier::{Notifier, TIMESTAMP_FORMAT};
use crate::registry::{Registry, Transition};
use crate::transport::Probe;

/// Cadence and alerting policy of the monitor loop.
#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    pub check_interval: Duration,
    pub report_interval: Duration,
    /// An alert fires on every multiple of this many consecutive failures.
    pub alert_threshold: NonZeroU32,
}

impl From<&Settings> for Schedule {
    fn from(settings: &Settings) -> Self {
        Self {
            check_interval: settings.check_interval(),
            report_interval: settings.report_interval(),
            alert_threshold: settings.alert_threshold,
        }
    }
}

/// Probes every registered site each cycle, alerting on repeated failures and
/// sending a periodic aggregate report.
pub struct Monitor<P, N, C> {
    registry: Registry,
    probe: P,
    notifier: N,
    clock: C,
    schedule: Schedule,
    last_report_sent_at: DateTime<Local>,
}

impl<P: Probe, N: Notifier, C: Clock> Monitor<P, N, C> {
    /// The first report goes out one `report_interval` after construction.
    pub fn new(registry: Registry, probe: P, notifier: N, clock: C, schedule: Schedule) -> Self {
        let last_report_sent_at = clock.now();
        Self {
            registry,
            probe,
            notifier,
            clock,
            schedule,
            last_report_sent_at,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Runs cycles until `token` is cancelled, sleeping `check_interval`
    /// between the end of one cycle and the start of the next.
    pub async fn run(&mut self, token: CancellationToken) {
        loop {
            // Check if we should shutdown before starting new cycle
            if token.is_cancelled() {
                info!("Shutdown requested, stopping monitor");
                break;
            }

            self.run_cycle().await;

            // Interruptible sleep
            select! {
                () = sleep(self.schedule.check_interval) => {},
                () = token.cancelled() => {
                    info!("Shutdown requested during sleep");
                    break;
                }
            }
        }

        info!("Site monitoring stopped gracefully");
    }

    /// Runs one check cycle: the report if due, then a probe of every site.
    pub async fn run_cycle(&mut self) {
        let now = self.clock.now();
        info!("Checking sites at {}", now.format(TIMESTAMP_FORMAT));

        if self.report_due(now) {
            self.notifier.send_daily_report(self.registry.entries()).await;
            self.last_report_sent_at = now;
        }

        let urls: Vec<String> = self.registry.iter().map(|e| e.url.clone()).collect();
        for url in &urls {
            let success = self.probe.probe(url).await;
            let Some(transition) = self.registry.record_result(url, success, now) else {
                continue;
            };

            match transition {
                Transition::Failed { failures } => {
                    warn!("❌ {url} is down (Failure #{failures})");

                    if failures % self.schedule.alert_threshold.get() == 0 {
                        let annotation = self
                            .registry
                            .get(url)
                            .map(|entry| entry.annotation.clone())
                            .unwrap_or_default();
                        self.notifier.alert_down(url, &annotation).await;
                    }
                }
                Transition::Recovered { .. } => info!("✅ {url} is back up! ({transition})"),
                Transition::StillUp => debug!("{url}: UP"),
            }
        }

        let down = self.registry.iter().filter(|e| !e.is_up()).count();
        info!(
            "Cycle complete: {} up, {down} down",
            self.registry.len() - down
        );
    }

    // A clock that moved backwards never makes a report due
    fn report_due(&self, now: DateTime<Local>) -> bool {
        (now - self.last_report_sent_at)
            .to_std()
            .is_ok_and(|elapsed| elapsed >= self.schedule.report_interval)
    }
}
