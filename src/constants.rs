//! Application-wide constants for barkcast.
//!
//! Centralizes wire-format names and defaults so the payload encoder, the
//! encryption unit and the configuration layer agree on them.
//!
//! # Categories
//!
//! - **Server**: default endpoint and HTTP status semantics
//! - **Encryption**: envelope layout
//! - **Storage**: file names inside the config directory

// ============================================================================
// Server
// ============================================================================

/// Server used for targets added without an explicit URL.
pub const DEFAULT_SERVER_URL: &str = "https://api.day.app";

/// The only status the push server uses to accept a notification.
pub const HTTP_STATUS_ACCEPTED: u16 = 200;

// ============================================================================
// Encryption
// ============================================================================

/// AES-GCM nonce length in bytes.
pub const NONCE_SIZE: usize = 12;

/// AES-GCM authentication tag length in bytes.
pub const TAG_SIZE: usize = 16;

/// Separator between the nonce, tag and ciphertext segments of an envelope.
pub const ENVELOPE_SEPARATOR: char = ':';

// ============================================================================
// Storage
// ============================================================================

/// Configuration file name (targets and settings).
pub const CONFIG_FILE: &str = "config.json";

/// Delivery history file name.
pub const HISTORY_FILE: &str = "history.json";

/// Number of leading push-key characters shown in logs and listings.
pub const MASKED_KEY_PREFIX: usize = 4;
