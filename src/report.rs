/// Read-model for the popup and dashboard: ranking, formatting and category totals
use std::collections::BTreeMap;

use crate::config::Category;
use crate::snapshot::{SiteRecord, Snapshot};

/// Category for hosts matching no configured category
pub const OTHER_CATEGORY: &str = "Other";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteTime {
    pub hostname: String,
    pub time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: u64,
    pub sites: Vec<SiteTime>,
}

/// One slice of the popup's time breakdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Share {
    pub hostname: String,
    pub percent: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub websites_visited: usize,
    pub active_websites: usize,
}

/// Sort records by time descending, then by hostname ascending
pub fn rank_by_time(records: &BTreeMap<String, SiteRecord>) -> Vec<SiteTime> {
    let mut ranked: Vec<SiteTime> = records
        .values()
        .map(|r| SiteTime {
            hostname: r.name.clone(),
            time: r.time,
        })
        .collect();

    ranked.sort_by(|a, b| b.time.cmp(&a.time).then_with(|| a.hostname.cmp(&b.hostname)));
    ranked
}

/// Sort visit counts descending, then by hostname ascending
pub fn rank_visits(visit_count: &BTreeMap<String, u64>) -> Vec<(String, u64)> {
    let mut ranked: Vec<(String, u64)> = visit_count
        .iter()
        .map(|(hostname, count)| (hostname.clone(), *count))
        .collect();

    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Top N hosts by focused time
pub fn top_focused(snapshot: &Snapshot, n: usize) -> Vec<SiteTime> {
    let mut ranked: Vec<SiteTime> = snapshot
        .focused_tab_data
        .iter()
        .map(|(hostname, r)| SiteTime {
            hostname: hostname.clone(),
            time: r.time,
        })
        .collect();

    ranked.sort_by(|a, b| b.time.cmp(&a.time).then_with(|| a.hostname.cmp(&b.hostname)));
    ranked.into_iter().take(n).collect()
}

pub fn stats(snapshot: &Snapshot) -> Stats {
    Stats {
        websites_visited: snapshot.site_data.len() + snapshot.closed_tabs.len(),
        active_websites: snapshot.site_data.len(),
    }
}

/// "1 hr 2 min 3 sec", hours omitted when zero
pub fn format_duration(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds / 60) % 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{} hr {} min {} sec", hours, minutes, seconds)
    } else {
        format!("{} min {} sec", minutes, seconds)
    }
}

pub fn format_minutes(ms: u64) -> String {
    format!("{} min", ms / 60_000)
}

pub fn visit_label(count: u64) -> String {
    if count == 1 {
        "1 time".to_string()
    } else {
        format!("{} times", count)
    }
}

/// Percentage share of each host in the total, rounded down
pub fn breakdown(ranked: &[SiteTime]) -> Vec<Share> {
    let total: u64 = ranked.iter().map(|s| s.time).sum();
    if total == 0 {
        return Vec::new();
    }

    ranked
        .iter()
        .map(|s| Share {
            hostname: s.hostname.clone(),
            percent: (s.time * 100 / total) as u8,
        })
        .collect()
}

/// Bucket open-site time by category
///
/// A host belongs to the first category with a site that is a substring of it
/// (so "m.youtube.com" counts as "youtube.com"). Categories appear in table order
/// with "Other" last; empty categories are left out.
pub fn categorize(site_data: &BTreeMap<String, SiteRecord>, categories: &[Category]) -> Vec<CategoryTotal> {
    let mut buckets: Vec<CategoryTotal> = categories
        .iter()
        .map(|c| c.name.as_str())
        .chain(std::iter::once(OTHER_CATEGORY))
        .map(|name| CategoryTotal {
            category: name.to_string(),
            total: 0,
            sites: Vec::new(),
        })
        .collect();

    for site in rank_by_time(site_data) {
        let index = categories
            .iter()
            .position(|c| c.sites.iter().any(|known| site.hostname.contains(known.as_str())))
            .unwrap_or(categories.len());

        let bucket = &mut buckets[index];
        bucket.total += site.time;
        bucket.sites.push(site);
    }

    buckets.retain(|b| !b.sites.is_empty());
    buckets
}
