/// Snapshot record written to chrome.storage.local and read by the popup/dashboard
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::focus::FocusState;
use crate::hostname::Hostname;
use crate::ledger::LedgerState;
use crate::tab_data::Timestamp;

/// Accumulated time for one host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub time: u64,
    pub name: String,
}

/// Focused time for one host; `startTime` is present only while its timer runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusRecord {
    pub time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Timestamp>,
}

/// Root storage structure: the four top-level keys of the persisted snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub site_data: BTreeMap<String, SiteRecord>,
    #[serde(default)]
    pub closed_tabs: BTreeMap<String, SiteRecord>,
    #[serde(default)]
    pub visit_count: BTreeMap<String, u64>,
    #[serde(default)]
    pub focused_tab_data: BTreeMap<String, FocusRecord>,
}

/// Storage keys the snapshot is spread over
pub const SNAPSHOT_KEYS: [&str; 4] = ["siteData", "closedTabs", "visitCount", "focusedTabData"];

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the ledger and focus timers as readers will see them
    pub fn capture(ledger: &LedgerState, focus: &FocusState) -> Self {
        let site_data = ledger
            .site_data()
            .values()
            .map(|e| record(&e.hostname, e.accumulated_ms))
            .collect();
        let closed_tabs = ledger
            .closed_tabs()
            .values()
            .map(|e| record(&e.hostname, e.accumulated_ms))
            .collect();
        let visit_count = ledger
            .visit_count()
            .iter()
            .map(|(hostname, count)| (hostname.to_string(), *count))
            .collect();
        let focused_tab_data = focus
            .timers()
            .iter()
            .map(|(hostname, timer)| {
                (
                    hostname.to_string(),
                    FocusRecord {
                        time: timer.accumulated_ms,
                        start_time: timer.running_since,
                    },
                )
            })
            .collect();

        Snapshot {
            site_data,
            closed_tabs,
            visit_count,
            focused_tab_data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.site_data.is_empty()
            && self.closed_tabs.is_empty()
            && self.visit_count.is_empty()
            && self.focused_tab_data.is_empty()
    }

    /// Hosts whose focus timer is running; never more than one for a captured snapshot
    pub fn running_focus(&self) -> Vec<&str> {
        self.focused_tab_data
            .iter()
            .filter(|(_, r)| r.start_time.is_some())
            .map(|(hostname, _)| hostname.as_str())
            .collect()
    }

    pub fn site_time(&self, hostname: &str) -> u64 {
        self.site_data.get(hostname).map_or(0, |r| r.time)
    }
}

fn record(hostname: &Hostname, time: u64) -> (String, SiteRecord) {
    (
        hostname.to_string(),
        SiteRecord {
            time,
            name: hostname.to_string(),
        },
    )
}
