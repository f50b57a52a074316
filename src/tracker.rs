/// The activity ledger's single owner: dispatches resolved browser events and ticks
use std::collections::BTreeMap;

use log::{debug, trace};

use crate::config::Config;
use crate::focus::FocusState;
use crate::hostname::Hostname;
use crate::ledger::{LedgerState, Transition};
use crate::snapshot::Snapshot;
use crate::tab_data::{BrowserEvent, TabId, TabStatus, Timestamp, WindowFocus};

/// How long a removed tab id is remembered. A stale event trails its tab's
/// removal by one browser query, far less than this.
const REMOVED_TAB_RETENTION_MS: u64 = 10_000;

#[derive(Debug, Clone, Default)]
pub struct Tracker {
    ledger: LedgerState,
    focus: FocusState,
    config: Config,
    // Browser tab ids are never reused, so a removed id marks any later event for it as stale
    removed_tabs: BTreeMap<TabId, Timestamp>,
}

impl Tracker {
    pub fn new(config: Config) -> Self {
        Tracker {
            ledger: LedgerState::new(),
            focus: FocusState::new(),
            config,
            removed_tabs: BTreeMap::new(),
        }
    }

    pub fn ledger(&self) -> &LedgerState {
        &self.ledger
    }

    pub fn focus(&self) -> &FocusState {
        &self.focus
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    /// Apply one browser event at `now`
    pub fn handle(&mut self, event: BrowserEvent, now: Timestamp) {
        trace!("event {:?} at {}", event, now);
        if let Some(tab_id) = self.stale_tab(&event) {
            debug!("event for removed tab {} dropped", tab_id);
            return;
        }
        match event {
            BrowserEvent::TabActivated { tab_id, url } => self.tab_activated(tab_id, url, now),
            BrowserEvent::TabUpdated { tab_id, status, url } => {
                if status != TabStatus::Complete {
                    return;
                }
                match url {
                    Some(url) => self.tab_navigated(tab_id, &url, now),
                    None => debug!("completed update for tab {} without url ignored", tab_id),
                }
            }
            BrowserEvent::TabRemoved { tab_id } => {
                self.removed_tabs.insert(tab_id, now);
                self.ledger.on_tab_closed(tab_id, now);
                self.focus.tab_removed(tab_id, now);
            }
            BrowserEvent::WindowFocusChanged(WindowFocus::Lost) => {
                self.ledger.flush(now);
                self.focus.blur(now);
            }
            BrowserEvent::WindowFocusChanged(WindowFocus::Gained { active_tab }) => {
                self.ledger.flush(now);
                match active_tab {
                    Some(tab) => {
                        let hostname = self.ledger.on_tab_becomes_active_or_navigated(
                            tab.id,
                            tab.url.as_deref(),
                            Transition::Refocused,
                            now,
                        );
                        self.focus.focus_tab(tab.id, hostname, now);
                    }
                    None => debug!("focused window has no active tab"),
                }
            }
        }
    }

    /// Periodic flush: fold open time, advance the focus timer, emit the snapshot
    pub fn tick(&mut self, now: Timestamp) -> Snapshot {
        self.removed_tabs
            .retain(|_, removed_at| now.saturating_sub(*removed_at) < REMOVED_TAB_RETENTION_MS);
        self.ledger.flush(now);
        self.focus.advance(now);
        self.snapshot()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.ledger, &self.focus)
    }

    /// Seed totals from a snapshot persisted by an earlier run of the background page
    pub fn restore(&mut self, snapshot: &Snapshot) {
        let open: Vec<(Hostname, u64)> = records(&snapshot.site_data, |r| r.time);
        let closed: Vec<(Hostname, u64)> = records(&snapshot.closed_tabs, |r| r.time);
        let visits: Vec<(Hostname, u64)> = records(&snapshot.visit_count, |c| *c);

        self.ledger.restore(
            open.iter().map(|(h, t)| (h, *t)),
            closed.iter().map(|(h, t)| (h, *t)),
            visits.iter().map(|(h, c)| (h, *c)),
        );
        for (hostname, record) in &snapshot.focused_tab_data {
            if let Some(hostname) = Hostname::from_stored(hostname) {
                self.focus.restore(hostname, record.time);
            }
        }
        debug!(
            "restored {} closed site(s), {} focus timer(s)",
            self.ledger.closed_tabs().len(),
            self.focus.timers().len()
        );
    }

    /// An event resolved by an async query can arrive after the tab's removal
    fn stale_tab(&self, event: &BrowserEvent) -> Option<TabId> {
        let tab_id = match event {
            BrowserEvent::TabActivated { tab_id, .. } | BrowserEvent::TabUpdated { tab_id, .. } => *tab_id,
            BrowserEvent::WindowFocusChanged(WindowFocus::Gained { active_tab: Some(tab) }) => tab.id,
            _ => return None,
        };
        self.removed_tabs.contains_key(&tab_id).then_some(tab_id)
    }

    fn tab_activated(&mut self, tab_id: TabId, url: Option<String>, now: Timestamp) {
        self.ledger.flush(now);
        let hostname =
            self.ledger
                .on_tab_becomes_active_or_navigated(tab_id, url.as_deref(), Transition::Activated, now);
        self.focus.focus_tab(tab_id, hostname, now);
    }

    fn tab_navigated(&mut self, tab_id: TabId, url: &str, now: Timestamp) {
        self.ledger.flush(now);
        let hostname =
            self.ledger
                .on_tab_becomes_active_or_navigated(tab_id, Some(url), Transition::Navigated, now);
        self.focus.navigate(tab_id, hostname, now);
    }
}

fn records<T>(
    map: &BTreeMap<String, T>,
    value: impl Fn(&T) -> u64,
) -> Vec<(Hostname, u64)> {
    map.iter()
        .filter_map(|(key, v)| Hostname::from_stored(key).map(|h| (h, value(v))))
        .collect()
}
