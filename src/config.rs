/// Tracker configuration, optionally overridden from chrome.storage.local
use serde::{Deserialize, Serialize};

/// Storage key holding user overrides
pub const CONFIG_KEY: &str = "trackerConfig";

const MIN_INTERVAL_MS: u32 = 100;

/// A named bucket of hostnames on the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub sites: Vec<String>,
}

impl Category {
    fn new(name: &str, sites: &[&str]) -> Self {
        Category {
            name: name.to_string(),
            sites: sites.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Result of a storage read that asked for [`CONFIG_KEY`]
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoredConfig {
    pub tracker_config: Option<Config>,
}

impl StoredConfig {
    pub fn into_config(self) -> Config {
        self.tracker_config.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Period of the flush/snapshot tick in the background page
    pub tick_interval_ms: u32,
    /// How often the popup and dashboard re-read the snapshot
    pub poll_interval_ms: u32,
    /// Number of focused hosts the popup lists
    pub popup_top_focused: usize,
    /// Category table, checked in order; unmatched hosts land in "Other"
    pub categories: Vec<Category>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tick_interval_ms: 500,
            poll_interval_ms: 1000,
            popup_top_focused: 3,
            categories: vec![
                Category::new("Social Media", &["facebook.com", "twitter.com", "instagram.com"]),
                Category::new("Shopping", &["amazon.com", "ebay.com", "etsy.com"]),
                Category::new("News", &["bbc.com", "cnn.com", "nytimes.com"]),
                Category::new("Productivity", &["notion.so", "trello.com", "slack.com"]),
                Category::new("Entertainment", &["youtube.com", "netflix.com", "spotify.com"]),
            ],
        }
    }
}

impl Config {
    /// Tick period with a floor so a bad override can't spin the background page
    pub fn tick_interval(&self) -> u32 {
        self.tick_interval_ms.max(MIN_INTERVAL_MS)
    }

    /// Poll period of the popup and dashboard, floored like the tick
    pub fn poll_interval(&self) -> u32 {
        self.poll_interval_ms.max(MIN_INTERVAL_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.tick_interval_ms, 500);
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.popup_top_focused, 3);
        assert_eq!(config.categories.len(), 5);
        assert_eq!(config.categories[0].name, "Social Media");
    }

    #[test]
    fn test_partial_override() {
        let config: Config = serde_json::from_str(r#"{"tickIntervalMs": 1000}"#).unwrap();

        assert_eq!(config.tick_interval_ms, 1000);
        assert_eq!(config.poll_interval_ms, 1000);
        assert_eq!(config.categories, Config::default().categories);
    }

    #[test]
    fn test_custom_categories() {
        let json = r#"{"categories": [{"name": "Code", "sites": ["github.com"]}]}"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.categories, vec![Category::new("Code", &["github.com"])]);
    }

    #[test]
    fn test_interval_floors() {
        let config = Config { tick_interval_ms: 5, poll_interval_ms: 0, ..Config::default() };
        assert_eq!(config.tick_interval(), 100);
        assert_eq!(config.poll_interval(), 100);

        let config = Config { poll_interval_ms: u32::MAX, ..Config::default() };
        assert_eq!(config.poll_interval(), u32::MAX);
    }

    #[test]
    fn test_stored_config() {
        let stored: StoredConfig =
            serde_json::from_str(r#"{"trackerConfig": {"popupTopFocused": 5}, "siteData": {}}"#).unwrap();
        assert_eq!(stored.into_config().popup_top_focused, 5);

        let missing: StoredConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.into_config(), Config::default());
    }

    #[test]
    fn test_invalid_stored_config() {
        assert!(serde_json::from_str::<StoredConfig>(r#"{"trackerConfig": {"tickIntervalMs": "fast"}}"#).is_err());
    }
}
