//! The webhook envelope and its `d` field.
//!
//! Every field is optional on the wire. Accessors apply the platform's
//! defaulting rules so the event builders in [`mapping`](crate::mapping)
//! stay declarative.

use pharos_core::{Attachments, Author, GuildMember, Mention, MessageScene};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{WebhookError, WebhookResult};

/// Dispatch: `t` names the event, `d` carries its data.
pub const OP_DISPATCH: i64 = 0;
/// Callback address validation.
pub const OP_VALIDATION: i64 = 13;

/// A webhook envelope: `{op, id, t, d, s}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Payload {
    pub op: i64,
    pub id: String,
    pub t: String,
    pub d: EventData,
    pub s: Option<i64>,
}

impl Payload {
    pub fn from_value(value: Value) -> WebhookResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// The union of every field an event's `d` object may carry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventData {
    pub id: Option<String>,
    pub content: Option<String>,
    /// A string for messages, a number for notices.
    pub timestamp: Option<Value>,
    pub author: Option<Author>,
    pub attachments: Option<Attachments>,
    pub message_scene: Option<MessageScene>,

    pub group_id: Option<String>,
    pub group_openid: Option<String>,
    pub openid: Option<String>,
    pub op_member_openid: Option<String>,

    /// A group `Member` or a `GuildMember`, depending on the event.
    pub member: Option<Value>,

    pub channel_id: Option<String>,
    pub guild_id: Option<String>,
    pub mentions: Option<Vec<Mention>>,
    pub seq: Option<i64>,
    pub seq_in_channel: Option<i64>,
    pub direct_message: Option<bool>,
    pub src_guild_id: Option<String>,
}

/// `Some` for present, non-empty strings.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl EventData {
    /// The data id, or `fallback` (the envelope id) when absent or empty.
    pub fn id_or(&self, fallback: &str) -> String {
        non_empty(&self.id).unwrap_or(fallback).to_string()
    }

    pub fn content_or_empty(&self) -> String {
        self.content.clone().unwrap_or_default()
    }

    /// The timestamp as text; missing, empty and zero values become `""`.
    pub fn message_timestamp(&self) -> String {
        match &self.timestamp {
            None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => String::new(),
            Some(other) => other.to_string(),
        }
    }

    /// The timestamp as an integer; missing, empty and zero values become `0`.
    pub fn notice_timestamp(&self) -> WebhookResult<i64> {
        let invalid = |v: &Value| WebhookError::Timestamp(v.to_string());
        match &self.timestamp {
            None | Some(Value::Null) => Ok(0),
            Some(Value::String(s)) if s.is_empty() => Ok(0),
            Some(v @ Value::String(s)) => s.trim().parse().map_err(|_| invalid(v)),
            Some(v @ Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                .ok_or_else(|| invalid(v)),
            Some(v) => Err(invalid(v)),
        }
    }

    pub fn author_or_default(&self) -> Author {
        self.author.clone().unwrap_or_default()
    }

    /// The member as a guild member, or an empty one when the payload
    /// carried a group member or nothing.
    pub fn guild_member(&self) -> GuildMember {
        const GUILD_KEYS: [&str; 3] = ["nick", "roles", "joined_at"];
        match &self.member {
            Some(member @ Value::Object(map))
                if GUILD_KEYS.iter().any(|k| map.contains_key(*k)) =>
            {
                serde_json::from_value(member.clone()).unwrap_or_default()
            }
            _ => GuildMember::default(),
        }
    }
}

/// The fields of an `op = 13` validation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Challenge {
    pub plain_token: String,
    pub event_ts: String,
}

impl Challenge {
    /// Reads `d.plain_token` and `d.event_ts` from a raw envelope.
    ///
    /// Missing fields become `""`; numbers are rendered in decimal.
    pub fn from_envelope(envelope: &Value) -> Self {
        let field = |key: &str| match envelope.get("d").and_then(|d| d.get(key)) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        Self {
            plain_token: field("plain_token"),
            event_ts: field("event_ts"),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn data(value: Value) -> EventData {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_envelope_defaults() {
        let payload = Payload::from_value(json!({"op": 0})).unwrap();
        assert_eq!(payload.op, OP_DISPATCH);
        assert_eq!(payload.id, "");
        assert_eq!(payload.t, "");
        assert!(payload.d.content.is_none());
        assert_eq!(payload.s, None);
    }

    #[test]
    fn test_id_falls_back_to_envelope() {
        assert_eq!(data(json!({})).id_or("env"), "env");
        assert_eq!(data(json!({"id": ""})).id_or("env"), "env");
        assert_eq!(data(json!({"id": "m1"})).id_or("env"), "m1");
    }

    #[test]
    fn test_timestamps() {
        assert_eq!(data(json!({})).message_timestamp(), "");
        assert_eq!(data(json!({"timestamp": 0})).message_timestamp(), "");
        assert_eq!(
            data(json!({"timestamp": "2024-01-01T00:00:00+08:00"})).message_timestamp(),
            "2024-01-01T00:00:00+08:00"
        );
        assert_eq!(data(json!({"timestamp": 1700000000})).message_timestamp(), "1700000000");

        assert_eq!(data(json!({})).notice_timestamp().unwrap(), 0);
        assert_eq!(data(json!({"timestamp": ""})).notice_timestamp().unwrap(), 0);
        assert_eq!(data(json!({"timestamp": 1700000000})).notice_timestamp().unwrap(), 1700000000);
        assert_eq!(
            data(json!({"timestamp": "1700000000"})).notice_timestamp().unwrap(),
            1700000000
        );
        assert!(matches!(
            data(json!({"timestamp": "yesterday"})).notice_timestamp(),
            Err(WebhookError::Timestamp(_))
        ));
    }

    #[test]
    fn test_guild_member_detection() {
        let guild = data(json!({"member": {"nick": "n", "roles": ["1"]}}));
        assert_eq!(guild.guild_member().nick.as_deref(), Some("n"));

        let group = data(json!({"member": {"member_openid": "m"}}));
        assert_eq!(group.guild_member(), GuildMember::default());
        assert_eq!(data(json!({})).guild_member(), GuildMember::default());
    }

    #[test]
    fn test_challenge_fields() {
        let challenge = Challenge::from_envelope(&json!({
            "op": 13,
            "d": {"plain_token": "tok", "event_ts": 1725442341}
        }));
        assert_eq!(challenge.plain_token, "tok");
        assert_eq!(challenge.event_ts, "1725442341");

        assert_eq!(Challenge::from_envelope(&json!({"op": 13})), Challenge::default());
    }
}
