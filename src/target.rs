//! Delivery targets.
//!
//! A [`Target`] is a named push-key + server-URL pair. The `selected` flag is
//! only used by callers to build the fan-out set; the dispatcher sends to
//! whatever slice it is given.

use serde::{Deserialize, Serialize};

use crate::constants::MASKED_KEY_PREFIX;

/// A named push delivery destination.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Display name, recorded in history.
    pub name: String,
    /// Device push key. Credential material: never logged in full.
    pub push_key: String,
    /// Base URL of the push server, e.g. `https://api.day.app`.
    pub server_url: String,
    /// Whether the target belongs to the default fan-out set.
    #[serde(default)]
    pub selected: bool,
}

impl Target {
    /// Creates an unselected target.
    pub fn new(
        name: impl Into<String>,
        push_key: impl Into<String>,
        server_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            push_key: push_key.into(),
            server_url: server_url.into(),
            selected: false,
        }
    }

    /// Returns the same target with the selected flag set.
    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    /// A target can only be dispatched to when both key and URL are present.
    pub fn is_dispatchable(&self) -> bool {
        !self.push_key.trim().is_empty() && !self.server_url.trim().is_empty()
    }

    /// Push key with everything past a short prefix hidden.
    pub fn masked_key(&self) -> String {
        mask_key(&self.push_key)
    }
}

// Keeps push keys out of `{:?}` output.
impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Target")
            .field("name", &self.name)
            .field("push_key", &self.masked_key())
            .field("server_url", &self.server_url)
            .field("selected", &self.selected)
            .finish()
    }
}

/// Masks a push key for display.
pub fn mask_key(key: &str) -> String {
    let prefix: String = key.chars().take(MASKED_KEY_PREFIX).collect();
    if key.chars().count() <= MASKED_KEY_PREFIX {
        "*".repeat(key.chars().count())
    } else {
        format!("{prefix}****")
    }
}

/// Names of the given targets, in order.
pub fn target_names(targets: &[Target]) -> Vec<String> {
    targets.iter().map(|t| t.name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatchable_requires_key_and_url() {
        assert!(Target::new("phone", "abc", "https://api.day.app").is_dispatchable());
        assert!(!Target::new("phone", "", "https://api.day.app").is_dispatchable());
        assert!(!Target::new("phone", "abc", "").is_dispatchable());
        assert!(!Target::new("phone", "  ", "https://api.day.app").is_dispatchable());
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("abcdefgh"), "abcd****");
        assert_eq!(mask_key("abc"), "***");
        assert_eq!(mask_key(""), "");
    }

    #[test]
    fn test_debug_hides_push_key() {
        let target = Target::new("phone", "supersecretkey", "https://api.day.app");
        let debug = format!("{target:?}");
        assert!(!debug.contains("supersecretkey"));
        assert!(debug.contains("supe****"));
    }

    #[test]
    fn test_selected_defaults_to_false_when_missing() {
        let target: Target = serde_json::from_str(
            r#"{"name":"phone","push_key":"abc","server_url":"https://api.day.app"}"#,
        )
        .unwrap();
        assert!(!target.selected);
    }

    #[test]
    fn test_target_names_preserve_order() {
        let targets = vec![
            Target::new("b", "k1", "https://x"),
            Target::new("a", "k2", "https://x"),
        ];
        assert_eq!(target_names(&targets), vec!["b", "a"]);
    }
}
