//! Event type table: from the envelope's `t` to a typed [`Event`].

use pharos_core::{
    C2CAllowBotProactiveMessage, C2CMessage, C2CRejectBotProactiveMessage, ChannelMessage,
    Content, DirectMessage, Event, EventKind, FriendAdd, FriendDel, Group, GroupAddRobot,
    GroupAllowBotProactiveMessage, GroupDelRobot, GroupMessage, GroupRejectBotProactiveMessage,
    Member,
};

use crate::error::WebhookResult;
use crate::payload::EventData;

/// Notices keep the envelope id and take an integer timestamp.
macro_rules! group_notice {
    ($name:ident) => {{
        fn build(d: &EventData, payload_id: &str) -> WebhookResult<Event> {
            Ok($name {
                id: payload_id.to_string(),
                timestamp: d.notice_timestamp()?,
                group_openid: d.group_openid.clone().unwrap_or_default(),
                op_member_openid: d.op_member_openid.clone().unwrap_or_default(),
            }
            .into())
        }
        build
    }};
}

macro_rules! user_notice {
    ($name:ident) => {{
        fn build(d: &EventData, payload_id: &str) -> WebhookResult<Event> {
            Ok($name {
                id: payload_id.to_string(),
                timestamp: d.notice_timestamp()?,
                user_openid: d.openid.clone().unwrap_or_default(),
            }
            .into())
        }
        build
    }};
}

/// Builds an event from `d` and the envelope id.
pub type BuildFn = fn(&EventData, &str) -> WebhookResult<Event>;

/// One row of [`EVENT_TABLE`].
#[derive(Debug, Clone, Copy)]
pub struct EventRoute {
    /// The platform's event type, e.g. `GROUP_AT_MESSAGE_CREATE`.
    pub event_type: &'static str,
    /// Human readable name used in the event-flow log.
    pub label: &'static str,
    pub kind: EventKind,
    pub build: BuildFn,
}

/// Every event type the webhook understands.
pub static EVENT_TABLE: [EventRoute; 12] = [
    // Messages
    EventRoute {
        event_type: "GROUP_AT_MESSAGE_CREATE",
        label: "group message",
        kind: EventKind::GroupMessage,
        build: group_message,
    },
    EventRoute {
        event_type: "C2C_MESSAGE_CREATE",
        label: "c2c message",
        kind: EventKind::C2CMessage,
        build: c2c_message,
    },
    EventRoute {
        event_type: "AT_MESSAGE_CREATE",
        label: "channel message",
        kind: EventKind::ChannelMessage,
        build: channel_message,
    },
    EventRoute {
        event_type: "DIRECT_MESSAGE_CREATE",
        label: "direct message",
        kind: EventKind::DirectMessage,
        build: direct_message,
    },
    // Proactive message toggles
    EventRoute {
        event_type: "GROUP_MSG_RECEIVE",
        label: "group proactive on",
        kind: EventKind::GroupAllowBotProactiveMessage,
        build: group_notice!(GroupAllowBotProactiveMessage),
    },
    EventRoute {
        event_type: "GROUP_MSG_REJECT",
        label: "group proactive off",
        kind: EventKind::GroupRejectBotProactiveMessage,
        build: group_notice!(GroupRejectBotProactiveMessage),
    },
    EventRoute {
        event_type: "C2C_MSG_RECEIVE",
        label: "c2c proactive on",
        kind: EventKind::C2CAllowBotProactiveMessage,
        build: user_notice!(C2CAllowBotProactiveMessage),
    },
    EventRoute {
        event_type: "C2C_MSG_REJECT",
        label: "c2c proactive off",
        kind: EventKind::C2CRejectBotProactiveMessage,
        build: user_notice!(C2CRejectBotProactiveMessage),
    },
    // Relationships
    EventRoute {
        event_type: "FRIEND_ADD",
        label: "friend added",
        kind: EventKind::FriendAdd,
        build: user_notice!(FriendAdd),
    },
    EventRoute {
        event_type: "FRIEND_DEL",
        label: "friend removed",
        kind: EventKind::FriendDel,
        build: user_notice!(FriendDel),
    },
    EventRoute {
        event_type: "GROUP_ADD_ROBOT",
        label: "bot added to group",
        kind: EventKind::GroupAddRobot,
        build: group_notice!(GroupAddRobot),
    },
    EventRoute {
        event_type: "GROUP_DEL_ROBOT",
        label: "bot removed from group",
        kind: EventKind::GroupDelRobot,
        build: group_notice!(GroupDelRobot),
    },
];

/// Looks up the route for an event type.
pub fn route(event_type: &str) -> Option<&'static EventRoute> {
    EVENT_TABLE.iter().find(|route| route.event_type == event_type)
}

// ============================================================================
// Builders
// ============================================================================

fn group_message(d: &EventData, payload_id: &str) -> WebhookResult<Event> {
    let author = d.author_or_default();
    Ok(GroupMessage {
        id: d.id_or(payload_id),
        content: Content::new(d.content_or_empty()),
        timestamp: d.message_timestamp(),
        member: Member {
            member_openid: author.member_openid.clone().unwrap_or_default(),
        },
        author,
        group: Group {
            group_id: d.group_id.clone().unwrap_or_default(),
            group_openid: d.group_openid.clone().unwrap_or_default(),
        },
        message_scene: d.message_scene.clone(),
        attachments: d.attachments.clone(),
    }
    .into())
}

fn c2c_message(d: &EventData, payload_id: &str) -> WebhookResult<Event> {
    let mut author = d.author_or_default();
    if let Some(openid) = d.openid.as_deref().filter(|o| !o.is_empty()) {
        author.user_openid = Some(openid.to_string());
    }
    Ok(C2CMessage {
        id: d.id_or(payload_id),
        content: Content::new(d.content_or_empty()),
        timestamp: d.message_timestamp(),
        author,
        message_scene: d.message_scene.clone(),
        attachments: d.attachments.clone(),
    }
    .into())
}

fn channel_message(d: &EventData, payload_id: &str) -> WebhookResult<Event> {
    Ok(ChannelMessage {
        id: d.id_or(payload_id),
        content: Content::new(d.content_or_empty()),
        timestamp: d.message_timestamp(),
        author: d.author_or_default(),
        channel_id: d.channel_id.clone().unwrap_or_default(),
        guild_id: d.guild_id.clone().unwrap_or_default(),
        mentions: d.mentions.clone().unwrap_or_default(),
        member: d.guild_member(),
        attachments: d.attachments.clone(),
        seq: d.seq.unwrap_or_default(),
        seq_in_channel: d.seq_in_channel.unwrap_or_default(),
    }
    .into())
}

fn direct_message(d: &EventData, payload_id: &str) -> WebhookResult<Event> {
    Ok(DirectMessage {
        id: d.id_or(payload_id),
        content: Content::new(d.content_or_empty()),
        timestamp: d.message_timestamp(),
        author: d.author_or_default(),
        channel_id: d.channel_id.clone().unwrap_or_default(),
        guild_id: d.guild_id.clone().unwrap_or_default(),
        member: d.guild_member(),
        attachments: d.attachments.clone(),
        seq: d.seq.unwrap_or_default(),
        seq_in_channel: d.seq_in_channel.unwrap_or_default(),
        direct_message: d.direct_message.unwrap_or_default(),
        src_guild_id: d.src_guild_id.clone().unwrap_or_default(),
    }
    .into())
}

// ============================================================================
// Event flow
// ============================================================================

/// Where an event came from and what happened, for the event-flow log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFlow {
    pub source: String,
    pub detail: String,
}

impl EventFlow {
    pub fn describe(event: &Event) -> Self {
        Self {
            source: flow_source(event),
            detail: flow_detail(event),
        }
    }
}

fn flow_source(event: &Event) -> String {
    let user = |id: Option<&str>| format!("user:{}", id.unwrap_or("?"));
    match event {
        Event::GroupMessage(m) => format!("group:{}", m.group.group_openid),
        Event::ChannelMessage(ChannelMessage { guild_id, author, .. })
        | Event::DirectMessage(DirectMessage { guild_id, author, .. }) => {
            if guild_id.is_empty() {
                user(author.id.as_deref())
            } else {
                format!("guild:{guild_id}")
            }
        }
        Event::C2CMessage(m) => user(m.author.id.as_deref()),
        Event::GroupAllowBotProactiveMessage(GroupAllowBotProactiveMessage {
            group_openid, ..
        })
        | Event::GroupRejectBotProactiveMessage(GroupRejectBotProactiveMessage {
            group_openid,
            ..
        })
        | Event::GroupAddRobot(GroupAddRobot { group_openid, .. })
        | Event::GroupDelRobot(GroupDelRobot { group_openid, .. })
            if !group_openid.is_empty() =>
        {
            format!("group:{group_openid}")
        }
        Event::C2CAllowBotProactiveMessage(C2CAllowBotProactiveMessage {
            user_openid, ..
        })
        | Event::C2CRejectBotProactiveMessage(C2CRejectBotProactiveMessage {
            user_openid,
            ..
        })
        | Event::FriendAdd(FriendAdd { user_openid, .. })
        | Event::FriendDel(FriendDel { user_openid, .. })
            if !user_openid.is_empty() =>
        {
            format!("user:{user_openid}")
        }
        _ => "unknown".to_string(),
    }
}

fn flow_detail(event: &Event) -> String {
    if let (Some(content), Some(author)) = (event.content(), event.author())
        && !content.is_empty()
    {
        return format!("{} said: {}", author.display_name(), content.as_str());
    }
    match event {
        Event::GroupAddRobot(n) => format!("operator:{} joined", n.op_member_openid),
        Event::GroupDelRobot(n) => format!("operator:{} left", n.op_member_openid),
        Event::FriendAdd(_) => "became friends".to_string(),
        Event::FriendDel(_) => "removed friend".to_string(),
        Event::GroupAllowBotProactiveMessage(_) | Event::C2CAllowBotProactiveMessage(_) => {
            "proactive messages on".to_string()
        }
        Event::GroupRejectBotProactiveMessage(_) | Event::C2CRejectBotProactiveMessage(_) => {
            "proactive messages off".to_string()
        }
        Event::DirectMessage(_) => "direct message received".to_string(),
        _ => "dispatching".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use pharos_core::GuildMember;
    use serde_json::{Value, json};

    use super::*;

    fn build(event_type: &str, d: Value, payload_id: &str) -> Event {
        let data: EventData = serde_json::from_value(d).unwrap();
        (route(event_type).unwrap().build)(&data, payload_id).unwrap()
    }

    #[test]
    fn test_table_is_complete_and_unique() {
        let types: HashSet<_> = EVENT_TABLE.iter().map(|r| r.event_type).collect();
        let kinds: HashSet<_> = EVENT_TABLE.iter().map(|r| r.kind).collect();
        assert_eq!(types.len(), 12);
        assert_eq!(kinds.len(), 12);
        assert!(!kinds.contains(&EventKind::ApplicationReady));
        assert!(route("READY").is_none());
    }

    #[test]
    fn test_every_route_builds_its_kind() {
        for route in &EVENT_TABLE {
            let event = (route.build)(&EventData::default(), "env").unwrap();
            assert_eq!(event.kind(), route.kind, "{}", route.event_type);
            assert_eq!(event.id(), Some("env"));
        }
    }

    #[test]
    fn test_group_message_member_from_author() {
        let event = build(
            "GROUP_AT_MESSAGE_CREATE",
            json!({
                "id": "m1",
                "content": " hi",
                "timestamp": "2024-01-01T00:00:00+08:00",
                "author": {"member_openid": "mem"},
                "group_openid": "g1"
            }),
            "env",
        );
        let Event::GroupMessage(message) = event else {
            panic!("expected a group message");
        };
        assert_eq!(message.id, "m1");
        assert_eq!(message.content.as_str(), " hi");
        assert_eq!(message.member.member_openid, "mem");
        assert_eq!(message.group.group_openid, "g1");
        assert_eq!(message.group.group_id, "");
        assert_eq!(message.target().target_unit, "g1");
    }

    #[test]
    fn test_c2c_author_takes_openid() {
        let event = build(
            "C2C_MESSAGE_CREATE",
            json!({"author": {"user_openid": "old"}, "openid": "new"}),
            "env",
        );
        let Event::C2CMessage(message) = event else {
            panic!("expected a c2c message");
        };
        assert_eq!(message.author.user_openid.as_deref(), Some("new"));
        assert_eq!(message.content.as_str(), "");
        assert_eq!(message.timestamp, "");
    }

    #[test]
    fn test_channel_member_defaults() {
        let event = build(
            "AT_MESSAGE_CREATE",
            json!({"member": {"member_openid": "x"}, "guild_id": "g", "seq": 7}),
            "env",
        );
        let Event::ChannelMessage(message) = event else {
            panic!("expected a channel message");
        };
        assert_eq!(message.member, GuildMember::default());
        assert_eq!(message.seq, 7);
        assert_eq!(message.seq_in_channel, 0);
        assert!(message.mentions.is_empty());
    }

    #[test]
    fn test_notice_uses_envelope_id() {
        let event = build(
            "GROUP_ADD_ROBOT",
            json!({"id": "ignored", "timestamp": 1700000000, "group_openid": "g", "op_member_openid": "op"}),
            "env",
        );
        let Event::GroupAddRobot(notice) = event else {
            panic!("expected a group add notice");
        };
        assert_eq!(notice.id, "env");
        assert_eq!(notice.timestamp, 1700000000);
        assert_eq!(notice.op_member_openid, "op");
    }

    #[test]
    fn test_notice_rejects_bad_timestamp() {
        let data: EventData = serde_json::from_value(json!({"timestamp": "soon"})).unwrap();
        assert!((route("FRIEND_ADD").unwrap().build)(&data, "env").is_err());
    }

    #[test]
    fn test_event_flow() {
        let flow = EventFlow::describe(&build(
            "GROUP_AT_MESSAGE_CREATE",
            json!({"content": "ping", "author": {"id": "u1"}, "group_openid": "g1"}),
            "env",
        ));
        assert_eq!(flow.source, "group:g1");
        assert_eq!(flow.detail, "u1 said: ping");

        let flow = EventFlow::describe(&build(
            "GROUP_DEL_ROBOT",
            json!({"group_openid": "g2", "op_member_openid": "op"}),
            "env",
        ));
        assert_eq!(flow.source, "group:g2");
        assert_eq!(flow.detail, "operator:op left");

        let flow = EventFlow::describe(&build("FRIEND_ADD", json!({"openid": "u2"}), "env"));
        assert_eq!(flow.source, "user:u2");
        assert_eq!(flow.detail, "became friends");

        let flow = EventFlow::describe(&build("C2C_MSG_REJECT", json!({}), "env"));
        assert_eq!(flow.source, "unknown");
        assert_eq!(flow.detail, "proactive messages off");
    }
}
