//! Push message data model.
//!
//! A [`Message`] is an immutable value built once per logical send and
//! borrowed by the dispatcher for every target. Only `title` and `content`
//! are required; every other field is independently optional and is left off
//! the wire entirely when absent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Interruption level requested for the notification on the receiving device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationLevel {
    /// Default behaviour: lights the screen and plays the sound.
    #[serde(rename = "active")]
    Active,
    /// Breaks through focus modes.
    #[serde(rename = "timeSensitive")]
    TimeSensitive,
    /// Added to the notification list silently.
    #[serde(rename = "passive")]
    Passive,
}

impl NotificationLevel {
    /// Raw value sent on the wire as the `level` parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::TimeSensitive => "timeSensitive",
            Self::Passive => "passive",
        }
    }
}

impl std::fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "timeSensitive" | "time-sensitive" => Ok(Self::TimeSensitive),
            "passive" => Ok(Self::Passive),
            other => Err(format!(
                "unknown notification level '{other}' (expected active, timeSensitive or passive)"
            )),
        }
    }
}

/// A composed push notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Identity of the logical send; reused as the history record id.
    pub id: Uuid,
    /// Notification title.
    pub title: String,
    /// Notification body, sent as `body` on the wire.
    pub content: String,
    /// Sound name played on delivery.
    pub sound: Option<String>,
    /// Icon URL. Kept in history; not part of the wire payload.
    pub icon: Option<String>,
    /// URL opened when the notification is tapped.
    pub url: Option<String>,
    /// Group the notification is filed under on the receiver.
    pub group: Option<String>,
    /// App badge number.
    pub badge: Option<i64>,
    /// Text placed on the clipboard when copying.
    pub copy: Option<String>,
    /// Interruption level.
    pub level: Option<NotificationLevel>,
    /// Copy `copy` (or the body) automatically on delivery.
    pub auto_copy: bool,
    /// Repeat the sound until the notification is handled.
    pub loop_sound: bool,
    /// Ask the receiver to archive the notification.
    pub archive: bool,
    /// When the message was composed.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Creates a message with only the required fields set.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            sound: None,
            icon: None,
            url: None,
            group: None,
            badge: None,
            copy: None,
            level: None,
            auto_copy: false,
            loop_sound: false,
            archive: false,
            created_at: Utc::now(),
        }
    }

    /// Sets the sound name; an empty string clears it.
    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = non_empty(sound.into());
        self
    }

    /// Sets the icon URL; an empty string clears it.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = non_empty(icon.into());
        self
    }

    /// Sets the tap-through URL; an empty string clears it.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = non_empty(url.into());
        self
    }

    /// Sets the notification group; an empty string clears it.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = non_empty(group.into());
        self
    }

    /// Sets the badge number.
    pub fn with_badge(mut self, badge: i64) -> Self {
        self.badge = Some(badge);
        self
    }

    /// Sets the clipboard text; an empty string clears it.
    pub fn with_copy(mut self, copy: impl Into<String>) -> Self {
        self.copy = non_empty(copy.into());
        self
    }

    /// Sets the interruption level.
    pub fn with_level(mut self, level: NotificationLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Sets the auto-copy flag.
    pub fn with_auto_copy(mut self, auto_copy: bool) -> Self {
        self.auto_copy = auto_copy;
        self
    }

    /// Sets the loop-sound flag.
    pub fn with_loop_sound(mut self, loop_sound: bool) -> Self {
        self.loop_sound = loop_sound;
        self
    }

    /// Sets the archive-on-receiver flag.
    pub fn with_archive(mut self, archive: bool) -> Self {
        self.archive = archive;
        self
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
