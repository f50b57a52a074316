/// Open/closed time ledger: folds tab lifecycle transitions into per-host totals
use std::collections::BTreeMap;

use log::{debug, trace};

use crate::hostname::{Hostname, normalize};
use crate::tab_data::{TabId, Timestamp};

/// Aggregate open time for a host that at least one open tab is showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteEntry {
    pub hostname: Hostname,
    pub accumulated_ms: u64,
}

/// Time carried over after the last tab for a host closed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedEntry {
    pub hostname: Hostname,
    pub accumulated_ms: u64,
}

/// A tab that is currently showing a trackable host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTab {
    pub tab_id: TabId,
    pub hostname: Hostname,
    pub last_tick_start: Timestamp,
}

impl ActiveTab {
    /// Time not yet folded into the host's SiteEntry, resetting the tick start
    fn take_elapsed(&mut self, now: Timestamp) -> u64 {
        let elapsed = now.saturating_sub(self.last_tick_start);
        self.last_tick_start = now;
        elapsed
    }
}

/// What caused a tab to (re)start showing a host; decides whether it counts as a visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The tab became the active tab of its window. Always a visit.
    Activated,
    /// A navigation completed. A visit only when the tab's host changed.
    Navigated,
    /// The tab's window regained focus. Never a visit.
    Refocused,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerState {
    site_data: BTreeMap<Hostname, SiteEntry>,
    closed_tabs: BTreeMap<Hostname, ClosedEntry>,
    active_tabs: BTreeMap<TabId, ActiveTab>,
    visit_count: BTreeMap<Hostname, u64>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn site_data(&self) -> &BTreeMap<Hostname, SiteEntry> {
        &self.site_data
    }

    pub fn closed_tabs(&self) -> &BTreeMap<Hostname, ClosedEntry> {
        &self.closed_tabs
    }

    pub fn active_tabs(&self) -> &BTreeMap<TabId, ActiveTab> {
        &self.active_tabs
    }

    pub fn visit_count(&self) -> &BTreeMap<Hostname, u64> {
        &self.visit_count
    }

    /// A tab became active or finished navigating to `url`.
    ///
    /// Returns the tab's normalized hostname, `None` when the URL is untrackable.
    pub fn on_tab_becomes_active_or_navigated(
        &mut self,
        tab_id: TabId,
        url: Option<&str>,
        transition: Transition,
        now: Timestamp,
    ) -> Option<Hostname> {
        let hostname = url.and_then(normalize);
        let previous = self.active_tabs.get(&tab_id).map(|t| t.hostname.clone());

        // The tab left its old host: close it out before tracking anything new
        if let Some(old) = &previous {
            if hostname.as_ref() != Some(old) {
                debug!("tab {} left {} for {:?}", tab_id, old, hostname);
                self.release_tab(tab_id, now);
            }
        }

        let Some(hostname) = hostname else {
            trace!("tab {} shows an untrackable url", tab_id);
            return None;
        };

        let host_changed = previous.as_ref() != Some(&hostname);
        let counts_as_visit = match transition {
            Transition::Activated => true,
            Transition::Navigated => host_changed,
            Transition::Refocused => false,
        };
        if counts_as_visit {
            *self.visit_count.entry(hostname.clone()).or_insert(0) += 1;
        }

        if let Some(tab) = self.active_tabs.get_mut(&tab_id) {
            // Same host as before: keep the time already elapsed
            let elapsed = tab.take_elapsed(now);
            site_entry(&mut self.site_data, &hostname).accumulated_ms += elapsed;
        } else {
            self.active_tabs.insert(
                tab_id,
                ActiveTab {
                    tab_id,
                    hostname: hostname.clone(),
                    last_tick_start: now,
                },
            );
        }

        self.reopen(&hostname);
        Some(hostname)
    }

    /// A tab was removed. Unknown or already closed tabs are ignored.
    ///
    /// Returns the hostname the tab was showing.
    pub fn on_tab_closed(&mut self, tab_id: TabId, now: Timestamp) -> Option<Hostname> {
        let hostname = self.release_tab(tab_id, now);
        if hostname.is_none() {
            debug!("close for untracked tab {} ignored", tab_id);
        }
        hostname
    }

    /// Fold elapsed time of every tracked tab into its SiteEntry, then reconcile
    /// ClosedEntries whose host is open again.
    pub fn flush(&mut self, now: Timestamp) {
        let before = self.active_tabs.len();
        self.active_tabs.retain(|_, tab| tab.hostname.is_trackable());
        if self.active_tabs.len() != before {
            debug!("dropped {} untrackable tab(s)", before - self.active_tabs.len());
        }

        for tab in self.active_tabs.values_mut() {
            let elapsed = tab.take_elapsed(now);
            site_entry(&mut self.site_data, &tab.hostname).accumulated_ms += elapsed;
        }

        let reopened: Vec<Hostname> = self
            .closed_tabs
            .keys()
            .filter(|host| self.site_data.contains_key(*host))
            .cloned()
            .collect();
        for hostname in reopened {
            self.reopen(&hostname);
        }
    }

    /// Seed the ledger from previously persisted totals.
    ///
    /// No tab is tracked yet at that point, so open-site totals are carried as closed
    /// time and merge back in as soon as a tab shows the host again.
    pub fn restore<'a>(
        &mut self,
        open: impl IntoIterator<Item = (&'a Hostname, u64)>,
        closed: impl IntoIterator<Item = (&'a Hostname, u64)>,
        visits: impl IntoIterator<Item = (&'a Hostname, u64)>,
    ) {
        for (hostname, ms) in open.into_iter().chain(closed) {
            if hostname.is_trackable() {
                closed_entry(&mut self.closed_tabs, hostname).accumulated_ms += ms;
            }
        }
        for (hostname, count) in visits {
            if hostname.is_trackable() {
                let entry = self.visit_count.entry(hostname.clone()).or_insert(0);
                *entry = (*entry).max(count);
            }
        }
    }

    /// Stop tracking a tab: fold its elapsed time and, if no other tab still shows
    /// its host, move the host's total to the closed ledger.
    fn release_tab(&mut self, tab_id: TabId, now: Timestamp) -> Option<Hostname> {
        let mut tab = self.active_tabs.remove(&tab_id)?;
        let elapsed = tab.take_elapsed(now);
        site_entry(&mut self.site_data, &tab.hostname).accumulated_ms += elapsed;

        let still_open = self.active_tabs.values().any(|t| t.hostname == tab.hostname);
        if !still_open {
            if let Some(site) = self.site_data.remove(&tab.hostname) {
                // Additive: a ClosedEntry left by an earlier close keeps its time
                closed_entry(&mut self.closed_tabs, &tab.hostname).accumulated_ms +=
                    site.accumulated_ms;
                debug!("{} closed with {} ms", tab.hostname, site.accumulated_ms);
            }
        }

        Some(tab.hostname)
    }

    /// Merge a host's ClosedEntry back into its SiteEntry
    fn reopen(&mut self, hostname: &Hostname) {
        if let Some(closed) = self.closed_tabs.remove(hostname) {
            trace!("{} reopened with {} ms carried over", hostname, closed.accumulated_ms);
            site_entry(&mut self.site_data, hostname).accumulated_ms += closed.accumulated_ms;
        }
    }
}

fn site_entry<'a>(
    site_data: &'a mut BTreeMap<Hostname, SiteEntry>,
    hostname: &Hostname,
) -> &'a mut SiteEntry {
    site_data.entry(hostname.clone()).or_insert_with(|| SiteEntry {
        hostname: hostname.clone(),
        accumulated_ms: 0,
    })
}

fn closed_entry<'a>(
    closed_tabs: &'a mut BTreeMap<Hostname, ClosedEntry>,
    hostname: &Hostname,
) -> &'a mut ClosedEntry {
    closed_tabs.entry(hostname.clone()).or_insert_with(|| ClosedEntry {
        hostname: hostname.clone(),
        accumulated_ms: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = "https://example.com/page";
    const RUST: &str = "https://www.rust-lang.org/learn";

    fn host(url: &str) -> Hostname {
        normalize(url).unwrap()
    }

    fn site_ms(ledger: &LedgerState, url: &str) -> Option<u64> {
        ledger.site_data().get(&host(url)).map(|e| e.accumulated_ms)
    }

    fn closed_ms(ledger: &LedgerState, url: &str) -> Option<u64> {
        ledger.closed_tabs().get(&host(url)).map(|e| e.accumulated_ms)
    }

    #[test]
    fn test_activation_tracks_tab_and_counts_visit() {
        let mut ledger = LedgerState::new();

        let h = ledger.on_tab_becomes_active_or_navigated(1, Some(EXAMPLE), Transition::Activated, 0);

        assert_eq!(h, Some(host(EXAMPLE)));
        assert_eq!(ledger.active_tabs().len(), 1);
        assert_eq!(ledger.visit_count().get(&host(EXAMPLE)), Some(&1));
    }

    #[test]
    fn test_untrackable_url_is_ignored() {
        let mut ledger = LedgerState::new();

        let h = ledger.on_tab_becomes_active_or_navigated(1, Some("chrome://newtab/"), Transition::Activated, 0);

        assert_eq!(h, None);
        assert!(ledger.active_tabs().is_empty());
        assert!(ledger.visit_count().is_empty());
    }

    #[test]
    fn test_flush_accumulates_regardless_of_tick_count() {
        let mut coarse = LedgerState::new();
        let mut fine = LedgerState::new();
        coarse.on_tab_becomes_active_or_navigated(1, Some(EXAMPLE), Transition::Activated, 0);
        fine.on_tab_becomes_active_or_navigated(1, Some(EXAMPLE), Transition::Activated, 0);

        coarse.flush(3000);
        for now in (500..=3000).step_by(500) {
            fine.flush(now);
        }

        assert_eq!(site_ms(&coarse, EXAMPLE), Some(3000));
        assert_eq!(site_ms(&fine, EXAMPLE), Some(3000));
    }

    #[test]
    fn test_close_moves_time_to_closed() {
        let mut ledger = LedgerState::new();
        ledger.on_tab_becomes_active_or_navigated(1, Some(EXAMPLE), Transition::Activated, 0);
        ledger.flush(1500);

        let closed = ledger.on_tab_closed(1, 2000);

        assert_eq!(closed, Some(host(EXAMPLE)));
        assert!(ledger.active_tabs().is_empty());
        assert_eq!(site_ms(&ledger, EXAMPLE), None);
        assert_eq!(closed_ms(&ledger, EXAMPLE), Some(2000));
    }

    #[test]
    fn test_close_unknown_tab_is_noop() {
        let mut ledger = LedgerState::new();
        ledger.on_tab_becomes_active_or_navigated(1, Some(EXAMPLE), Transition::Activated, 0);
        let before = ledger.clone();

        assert_eq!(ledger.on_tab_closed(42, 100), None);
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_close_twice_is_noop() {
        let mut ledger = LedgerState::new();
        ledger.on_tab_becomes_active_or_navigated(1, Some(EXAMPLE), Transition::Activated, 0);
        ledger.on_tab_closed(1, 1000);
        ledger.on_tab_closed(1, 5000);

        assert_eq!(closed_ms(&ledger, EXAMPLE), Some(1000));
    }

    #[test]
    fn test_reopen_merges_closed_time() {
        let mut ledger = LedgerState::new();
        ledger.on_tab_becomes_active_or_navigated(1, Some(EXAMPLE), Transition::Activated, 0);
        ledger.on_tab_closed(1, 1000);

        ledger.on_tab_becomes_active_or_navigated(2, Some(EXAMPLE), Transition::Activated, 5000);
        assert_eq!(closed_ms(&ledger, EXAMPLE), None);

        ledger.flush(7000);
        assert_eq!(site_ms(&ledger, EXAMPLE), Some(1000 + 2000));
    }

    #[test]
    fn test_navigation_away_closes_old_host() {
        let mut ledger = LedgerState::new();
        ledger.on_tab_becomes_active_or_navigated(1, Some(EXAMPLE), Transition::Activated, 0);

        ledger.on_tab_becomes_active_or_navigated(1, Some(RUST), Transition::Navigated, 1200);

        assert_eq!(site_ms(&ledger, EXAMPLE), None);
        assert_eq!(closed_ms(&ledger, EXAMPLE), Some(1200));
        assert_eq!(ledger.active_tabs()[&1].hostname, host(RUST));
    }

    #[test]
    fn test_navigation_to_untrackable_releases_tab() {
        let mut ledger = LedgerState::new();
        ledger.on_tab_becomes_active_or_navigated(1, Some(EXAMPLE), Transition::Activated, 0);

        ledger.on_tab_becomes_active_or_navigated(1, Some("about:blank"), Transition::Navigated, 800);

        assert!(ledger.active_tabs().is_empty());
        assert_eq!(closed_ms(&ledger, EXAMPLE), Some(800));
    }

    #[test]
    fn test_navigation_within_host_keeps_elapsed_time() {
        let mut ledger = LedgerState::new();
        ledger.on_tab_becomes_active_or_navigated(1, Some(EXAMPLE), Transition::Activated, 0);

        ledger.on_tab_becomes_active_or_navigated(1, Some("https://example.com/other"), Transition::Navigated, 700);
        ledger.flush(1000);

        assert_eq!(site_ms(&ledger, EXAMPLE), Some(1000));
        assert_eq!(ledger.visit_count()[&host(EXAMPLE)], 1);
    }

    #[test]
    fn test_visit_count_with_intervening_navigation() {
        let mut ledger = LedgerState::new();
        let mut now = 0;
        for _ in 0..3 {
            ledger.on_tab_becomes_active_or_navigated(1, Some(EXAMPLE), Transition::Navigated, now);
            now += 100;
            ledger.on_tab_becomes_active_or_navigated(1, Some(RUST), Transition::Navigated, now);
            now += 100;
        }

        assert_eq!(ledger.visit_count()[&host(EXAMPLE)], 3);
        assert_eq!(ledger.visit_count()[&host(RUST)], 3);
    }

    #[test]
    fn test_refocus_does_not_count_visit() {
        let mut ledger = LedgerState::new();
        ledger.on_tab_becomes_active_or_navigated(1, Some(EXAMPLE), Transition::Activated, 0);
        ledger.on_tab_becomes_active_or_navigated(1, Some(EXAMPLE), Transition::Refocused, 100);

        assert_eq!(ledger.visit_count()[&host(EXAMPLE)], 1);
    }

    #[test]
    fn test_closing_one_of_two_tabs_keeps_site_open() {
        let mut ledger = LedgerState::new();
        ledger.on_tab_becomes_active_or_navigated(1, Some(EXAMPLE), Transition::Activated, 0);
        ledger.on_tab_becomes_active_or_navigated(2, Some(EXAMPLE), Transition::Activated, 0);

        ledger.on_tab_closed(1, 1000);

        assert_eq!(closed_ms(&ledger, EXAMPLE), None);
        assert_eq!(site_ms(&ledger, EXAMPLE), Some(1000));

        ledger.on_tab_closed(2, 1000);
        assert_eq!(site_ms(&ledger, EXAMPLE), None);
        assert_eq!(closed_ms(&ledger, EXAMPLE), Some(2000));
    }

    #[test]
    fn test_close_merges_into_existing_closed_entry() {
        let mut ledger = LedgerState::new();
        let h = host(EXAMPLE);
        ledger.restore([], [(&h, 400)], []);
        // a tab that was tracked before the closed entry showed up must not lose its time
        ledger.active_tabs.insert(1, ActiveTab { tab_id: 1, hostname: h.clone(), last_tick_start: 0 });

        ledger.on_tab_closed(1, 600);

        assert_eq!(closed_ms(&ledger, EXAMPLE), Some(1000));
    }

    #[test]
    fn test_flush_reconciles_closed_with_open_site() {
        let mut ledger = LedgerState::new();
        let h = host(EXAMPLE);
        ledger.on_tab_becomes_active_or_navigated(1, Some(EXAMPLE), Transition::Activated, 0);
        ledger.closed_tabs.insert(h.clone(), ClosedEntry { hostname: h.clone(), accumulated_ms: 250 });

        ledger.flush(500);

        assert_eq!(closed_ms(&ledger, EXAMPLE), None);
        assert_eq!(site_ms(&ledger, EXAMPLE), Some(750));
    }

    #[test]
    fn test_flush_drops_untrackable_tabs() {
        let mut ledger = LedgerState::new();
        let bogus: Hostname = serde_json::from_str("\"newtab\"").unwrap();
        ledger.active_tabs.insert(9, ActiveTab { tab_id: 9, hostname: bogus.clone(), last_tick_start: 0 });

        ledger.flush(500);

        assert!(ledger.active_tabs().is_empty());
        assert!(!ledger.site_data().contains_key(&bogus));
    }

    #[test]
    fn test_clock_going_backwards_never_subtracts() {
        let mut ledger = LedgerState::new();
        ledger.on_tab_becomes_active_or_navigated(1, Some(EXAMPLE), Transition::Activated, 1000);

        ledger.flush(400);
        ledger.flush(900);

        assert_eq!(site_ms(&ledger, EXAMPLE), Some(500));
    }

    #[test]
    fn test_restore_carries_totals_as_closed() {
        let mut ledger = LedgerState::new();
        let h = host(EXAMPLE);
        let r = host(RUST);

        ledger.restore([(&h, 300)], [(&r, 50), (&h, 200)], [(&h, 4)]);

        assert!(ledger.site_data().is_empty());
        assert_eq!(closed_ms(&ledger, EXAMPLE), Some(500));
        assert_eq!(closed_ms(&ledger, RUST), Some(50));
        assert_eq!(ledger.visit_count()[&h], 4);
    }
}
