//! Wire parameters for a push request.
//!
//! Turns a [`Message`] into the ordered list of query parameters sent to the
//! server. With encryption on, `title` and `body` are replaced by a single
//! `data` envelope plus `encrypt=1`; every other field still travels in the
//! clear alongside it. Only the title and body are protected.

use crate::crypto;
use crate::error::DispatchError;
use crate::message::Message;

/// Ordered `(name, value)` query parameters.
pub type QueryParams = Vec<(&'static str, String)>;

/// Whether (and with which shared secret) title and body are encrypted.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Encryption<'a> {
    /// Title and body are sent in the clear.
    Disabled,
    /// Title and body are sealed into `data` with this secret.
    Enabled {
        /// Shared secret the key is derived from.
        secret: &'a str,
    },
}

impl std::fmt::Debug for Encryption<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "Disabled"),
            Self::Enabled { .. } => write!(f, "Enabled {{ secret: <redacted> }}"),
        }
    }
}

/// Builds the query parameters for one target.
///
/// Order is fixed: the content parameters (`title`, `body`, or `encrypt`,
/// `data`), then `sound`, `url`, `group`, `badge`, `copy`, `level`,
/// `autoCopy`, `isLoopSound`, and finally `isArchive`, which is always
/// present. Absent optional fields are left out rather than sent empty.
pub fn build_params(
    message: &Message,
    encryption: Encryption<'_>,
) -> Result<QueryParams, DispatchError> {
    let mut params: QueryParams = Vec::with_capacity(12);

    match encryption {
        Encryption::Enabled { secret } => {
            let envelope = crypto::encrypt(&message.title, &message.content, secret)?;
            params.push(("encrypt", "1".to_string()));
            params.push(("data", envelope.to_param()));
        }
        Encryption::Disabled => {
            params.push(("title", message.title.clone()));
            params.push(("body", message.content.clone()));
        }
    }

    push_opt(&mut params, "sound", message.sound.as_deref());
    push_opt(&mut params, "url", message.url.as_deref());
    push_opt(&mut params, "group", message.group.as_deref());
    if let Some(badge) = message.badge {
        params.push(("badge", badge.to_string()));
    }
    push_opt(&mut params, "copy", message.copy.as_deref());
    if let Some(level) = message.level {
        params.push(("level", level.as_str().to_string()));
    }
    if message.auto_copy {
        params.push(("autoCopy", "1".to_string()));
    }
    if message.loop_sound {
        params.push(("isLoopSound", "1".to_string()));
    }
    params.push((
        "isArchive",
        if message.archive { "1" } else { "0" }.to_string(),
    ));

    Ok(params)
}

fn push_opt(params: &mut QueryParams, name: &'static str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        params.push((name, value.to_string()));
    }
}
