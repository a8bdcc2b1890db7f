use chrono::{DateTime, Local};
use std::fmt;

/// Monitoring state for one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteEntry {
    pub url: String,
    /// Free-text label shown in alerts and reports, empty when unset.
    pub annotation: String,
    pub consecutive_failures: u32,
    pub last_checked_at: Option<DateTime<Local>>,
}

impl SiteEntry {
    fn new(url: String, annotation: String) -> Self {
        Self {
            url,
            annotation,
            consecutive_failures: 0,
            last_checked_at: None,
        }
    }

    #[must_use]
    pub fn is_up(&self) -> bool {
        self.consecutive_failures == 0
    }

    /// `url (annotation)`, or just the url when there is no annotation.
    #[must_use]
    pub fn describe(&self) -> String {
        describe(&self.url, &self.annotation)
    }
}

pub(crate) fn describe(url: &str, annotation: &str) -> String {
    if annotation.is_empty() {
        url.to_string()
    } else {
        format!("{url} ({annotation})")
    }
}

/// State change produced by recording a probe result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Success with no prior failures.
    StillUp,
    /// Success after `after` consecutive failures.
    Recovered { after: u32 },
    /// Failure; `failures` is the new consecutive count.
    Failed { failures: u32 },
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::StillUp => write!(f, "up"),
            Transition::Recovered { after } => write!(f, "recovered after {after} failures"),
            Transition::Failed { failures } => write!(f, "down ({failures} consecutive)"),
        }
    }
}

/// Insertion-ordered set of monitored sites, keyed by URL.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<SiteEntry>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a site. Registering a known URL resets its state in place.
    pub fn register(&mut self, url: impl Into<String>, annotation: impl Into<String>) {
        let entry = SiteEntry::new(url.into(), annotation.into());
        match self.position(&entry.url) {
            Some(idx) => self.entries[idx] = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SiteEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn entries(&self) -> &[SiteEntry] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, url: &str) -> Option<&SiteEntry> {
        self.entries.iter().find(|entry| entry.url == url)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records a probe outcome for `url`, stamping `checked_at`.
    ///
    /// Returns `None` if the URL was never registered.
    pub fn record_result(
        &mut self,
        url: &str,
        success: bool,
        checked_at: DateTime<Local>,
    ) -> Option<Transition> {
        let idx = self.position(url)?;
        let entry = &mut self.entries[idx];
        let previous = entry.consecutive_failures;

        entry.last_checked_at = Some(checked_at);

        let transition = if success {
            entry.consecutive_failures = 0;
            if previous > 0 {
                Transition::Recovered { after: previous }
            } else {
                Transition::StillUp
            }
        } else {
            entry.consecutive_failures = previous.saturating_add(1);
            Transition::Failed {
                failures: entry.consecutive_failures,
            }
        };

        Some(transition)
    }

    fn position(&self, url: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.url == url)
    }
}
