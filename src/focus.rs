/// Focused-time bookkeeping: one pausable timer per host, at most one running
use std::collections::BTreeMap;

use log::{debug, trace};

use crate::hostname::Hostname;
use crate::tab_data::{TabId, Timestamp};

/// Pausable stopwatch for the time a host spent in the focused tab
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusTimer {
    pub accumulated_ms: u64,
    pub running_since: Option<Timestamp>,
}

impl FocusTimer {
    pub fn start_fresh(now: Timestamp) -> Self {
        FocusTimer {
            accumulated_ms: 0,
            running_since: Some(now),
        }
    }

    /// Paused timer carrying time from an earlier session
    pub fn paused(accumulated_ms: u64) -> Self {
        FocusTimer {
            accumulated_ms,
            running_since: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    pub fn pause(&mut self, now: Timestamp) {
        if let Some(since) = self.running_since.take() {
            self.accumulated_ms += now.saturating_sub(since);
        }
    }

    /// No-op when already running
    pub fn resume(&mut self, now: Timestamp) {
        if self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    /// Fold the running interval into the total without stopping
    pub fn advance(&mut self, now: Timestamp) {
        if let Some(since) = self.running_since {
            self.accumulated_ms += now.saturating_sub(since);
            self.running_since = Some(now.max(since));
        }
    }
}

/// Which tab holds focus and the per-host timers
///
/// `focused_tab` is the active tab of the focused window even when its page is
/// untrackable; `current` is the host whose timer runs, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FocusState {
    focused_tab: Option<TabId>,
    current: Option<Hostname>,
    timers: BTreeMap<Hostname, FocusTimer>,
}

impl FocusState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused_tab(&self) -> Option<TabId> {
        self.focused_tab
    }

    pub fn current(&self) -> Option<&Hostname> {
        self.current.as_ref()
    }

    pub fn timers(&self) -> &BTreeMap<Hostname, FocusTimer> {
        &self.timers
    }

    /// Host whose timer is running
    pub fn running(&self) -> Option<&Hostname> {
        self.timers
            .iter()
            .find(|(_, timer)| timer.is_running())
            .map(|(hostname, _)| hostname)
    }

    /// A tab became the focused one (tab activation, or its window regained focus)
    pub fn focus_tab(&mut self, tab_id: TabId, hostname: Option<Hostname>, now: Timestamp) {
        self.pause_current(now);
        self.focused_tab = Some(tab_id);
        match hostname {
            Some(hostname) => self.start_or_resume(hostname, now),
            None => trace!("focused tab {} has no trackable host", tab_id),
        }
    }

    /// A navigation completed. Only the focused tab moves the timers.
    pub fn navigate(&mut self, tab_id: TabId, hostname: Option<Hostname>, now: Timestamp) {
        if self.focused_tab != Some(tab_id) || self.current == hostname {
            return;
        }
        self.pause_current(now);
        if let Some(hostname) = hostname {
            self.start_or_resume(hostname, now);
        }
    }

    /// No browser window has OS focus
    pub fn blur(&mut self, now: Timestamp) {
        self.pause_current(now);
        self.focused_tab = None;
    }

    /// The focused tab went away; no timer runs until the next focus event
    pub fn tab_removed(&mut self, tab_id: TabId, now: Timestamp) {
        if self.focused_tab == Some(tab_id) {
            debug!("focused tab {} closed", tab_id);
            self.blur(now);
        }
    }

    /// Periodic tick: fold the running interval of the current host
    pub fn advance(&mut self, now: Timestamp) {
        if self.focused_tab.is_none() {
            return;
        }
        if let Some(timer) = self.current.as_ref().and_then(|h| self.timers.get_mut(h)) {
            timer.advance(now);
        }
    }

    /// Seed a paused timer from persisted totals
    pub fn restore(&mut self, hostname: Hostname, accumulated_ms: u64) {
        if hostname.is_trackable() {
            self.timers.insert(hostname, FocusTimer::paused(accumulated_ms));
        }
    }

    fn pause_current(&mut self, now: Timestamp) {
        if let Some(hostname) = self.current.take() {
            if let Some(timer) = self.timers.get_mut(&hostname) {
                timer.pause(now);
                trace!("paused {} at {} ms", hostname, timer.accumulated_ms);
            }
        }
    }

    fn start_or_resume(&mut self, hostname: Hostname, now: Timestamp) {
        self.timers
            .entry(hostname.clone())
            .and_modify(|timer| timer.resume(now))
            .or_insert_with(|| FocusTimer::start_fresh(now));
        trace!("focus timer running for {}", hostname);
        self.current = Some(hostname);
    }
}
