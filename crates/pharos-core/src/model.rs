//! Data models carried by events.
//!
//! These mirror the objects delivered by the platform inside the `d` field of
//! a webhook envelope. Every field the platform may omit is either an
//! `Option` or has a serde default, so partially populated payloads still
//! deserialize.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// Application id used by the platform's avatar CDN.
const AVATAR_APP_ID: u64 = 102130931;

// ============================================================================
// Author
// ============================================================================

/// The sender of a message.
///
/// Group, C2C and guild messages populate different subsets of these fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Shared by regular chats and guilds.
    pub id: Option<String>,
    pub union_openid: Option<String>,

    /// Guild-only.
    pub username: Option<String>,
    pub avatar: Option<String>,
    pub bot: Option<bool>,

    /// Group-only.
    pub member_openid: Option<String>,

    /// C2C-only.
    pub user_openid: Option<String>,
}

impl Author {
    /// Returns the author's avatar link.
    ///
    /// Falls back to the CDN link derived from the member or user openid when
    /// the platform did not send one.
    pub fn avatar_url(&self) -> Option<String> {
        if let Some(avatar) = self.avatar.as_deref().filter(|a| !a.is_empty()) {
            return Some(avatar.to_string());
        }
        self.member_openid
            .as_deref()
            .or(self.user_openid.as_deref())
            .map(|openid| format!("https://q.qlogo.cn/qqapp/{AVATAR_APP_ID}/{openid}/640"))
    }

    /// Fills in [`avatar`](Self::avatar) from [`avatar_url`](Self::avatar_url)
    /// if it is missing.
    pub fn ensure_avatar(&mut self) {
        if self.avatar.as_deref().is_none_or(str::is_empty) {
            self.avatar = self.avatar_url();
        }
    }

    /// A display name for logs: the username, then the id, then `"?"`.
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("?")
    }
}

// ============================================================================
// Group / C2C elements
// ============================================================================

/// Group information attached to group messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub group_id: String,
    #[serde(default)]
    pub group_openid: String,
}

/// Group member information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub member_openid: String,
}

/// Where a message was sent from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageScene {
    pub source: Option<String>,
}

// ============================================================================
// Guild elements
// ============================================================================

/// A user mentioned in a guild message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub id: String,
    pub username: String,
    pub avatar: String,
    pub bot: bool,
}

/// Guild member information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildMember {
    pub nick: Option<String>,
    pub roles: Option<Vec<String>>,
    pub joined_at: Option<String>,
}

// ============================================================================
// Attachments
// ============================================================================

fn default_attachment_id() -> Option<String> {
    Some("C2CNOID".to_string())
}

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// C2C attachments carry no id; they get the `"C2CNOID"` placeholder.
    #[serde(default = "default_attachment_id")]
    pub id: Option<String>,
    pub url: String,
    pub filename: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub size: u64,
    pub content_type: String,
}

impl Attachment {
    /// Returns the download URL, adding an `http://` scheme when the
    /// platform sent a bare host path.
    pub fn download_url(&self) -> String {
        if self.url.starts_with("http") {
            self.url.clone()
        } else {
            format!("http://{}", self.url)
        }
    }
}

/// The attachment list of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attachments(pub Vec<Attachment>);

impl Attachments {
    pub fn attachments(&self) -> &[Attachment] {
        &self.0
    }
}

impl Deref for Attachments {
    type Target = [Attachment];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// ============================================================================
// Content
// ============================================================================

/// The textual content of a message, as seen by the matching pipeline.
///
/// Never absent: a message without content carries an empty `Content`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Content(String);

impl Content {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Deref for Content {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

// ============================================================================
// Target
// ============================================================================

/// Routing address used when replying to an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// The exact openid: the group openid for group messages, the user
    /// openid for C2C messages, the channel or guild id for guild messages.
    pub target_unit: String,
    /// Message id required for passive replies.
    pub target_id: String,
    /// Event id required when replying to events not triggered by a user
    /// message.
    pub event_id: String,
}

impl Target {
    /// A passive-reply target for a message.
    pub fn reply(unit: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            target_unit: unit.into(),
            target_id: message_id.into(),
            event_id: String::new(),
        }
    }

    /// A target for a non-message event.
    pub fn event(unit: impl Into<String>, event_id: impl Into<String>) -> Self {
        Self {
            target_unit: unit.into(),
            target_id: String::new(),
            event_id: event_id.into(),
        }
    }
}
