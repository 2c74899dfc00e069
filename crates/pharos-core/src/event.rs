//! Event system for the Pharos framework.
//!
//! This module provides the core event infrastructure:
//!
//! - [`Event`] - Closed set of every event the platform can deliver
//! - [`EventKind`] - Field-less discriminant used for subscriptions
//! - [`FromEvent`] - Trait for extracting a typed event from an [`Event`]
//! - [`EventContext<T>`] - Wrapper handed to listeners asking for a typed event
//!
//! # Typed Extraction
//!
//! ```rust,ignore
//! use pharos_core::{EventContext, GroupMessage};
//!
//! async fn on_group(event: EventContext<GroupMessage>) {
//!     println!("{} said {}", event.member.member_openid, event.content);
//! }
//! ```

use std::fmt;
use std::ops::Deref;

use crate::message::{C2CMessage, ChannelMessage, DirectMessage, GroupMessage};
use crate::model::{Attachments, Author, Content, Target};
use crate::notice::{
    ApplicationReady, C2CAllowBotProactiveMessage, C2CRejectBotProactiveMessage, FriendAdd,
    FriendDel, GroupAddRobot, GroupAllowBotProactiveMessage, GroupDelRobot,
    GroupRejectBotProactiveMessage,
};

// ============================================================================
// Event
// ============================================================================

/// Every event the framework can dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    GroupMessage(GroupMessage),
    C2CMessage(C2CMessage),
    ChannelMessage(ChannelMessage),
    DirectMessage(DirectMessage),
    ApplicationReady(ApplicationReady),
    GroupAllowBotProactiveMessage(GroupAllowBotProactiveMessage),
    GroupRejectBotProactiveMessage(GroupRejectBotProactiveMessage),
    C2CAllowBotProactiveMessage(C2CAllowBotProactiveMessage),
    C2CRejectBotProactiveMessage(C2CRejectBotProactiveMessage),
    GroupAddRobot(GroupAddRobot),
    GroupDelRobot(GroupDelRobot),
    FriendAdd(FriendAdd),
    FriendDel(FriendDel),
}

impl Event {
    /// Returns the discriminant of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::GroupMessage(_) => EventKind::GroupMessage,
            Self::C2CMessage(_) => EventKind::C2CMessage,
            Self::ChannelMessage(_) => EventKind::ChannelMessage,
            Self::DirectMessage(_) => EventKind::DirectMessage,
            Self::ApplicationReady(_) => EventKind::ApplicationReady,
            Self::GroupAllowBotProactiveMessage(_) => EventKind::GroupAllowBotProactiveMessage,
            Self::GroupRejectBotProactiveMessage(_) => EventKind::GroupRejectBotProactiveMessage,
            Self::C2CAllowBotProactiveMessage(_) => EventKind::C2CAllowBotProactiveMessage,
            Self::C2CRejectBotProactiveMessage(_) => EventKind::C2CRejectBotProactiveMessage,
            Self::GroupAddRobot(_) => EventKind::GroupAddRobot,
            Self::GroupDelRobot(_) => EventKind::GroupDelRobot,
            Self::FriendAdd(_) => EventKind::FriendAdd,
            Self::FriendDel(_) => EventKind::FriendDel,
        }
    }

    /// Returns the human-readable name of this event type.
    pub fn event_name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Returns the event's own id, if it has one.
    pub fn id(&self) -> Option<&str> {
        Some(match self {
            Self::GroupMessage(e) => e.id.as_str(),
            Self::C2CMessage(e) => e.id.as_str(),
            Self::ChannelMessage(e) => e.id.as_str(),
            Self::DirectMessage(e) => e.id.as_str(),
            Self::ApplicationReady(_) => return None,
            Self::GroupAllowBotProactiveMessage(e) => e.id.as_str(),
            Self::GroupRejectBotProactiveMessage(e) => e.id.as_str(),
            Self::C2CAllowBotProactiveMessage(e) => e.id.as_str(),
            Self::C2CRejectBotProactiveMessage(e) => e.id.as_str(),
            Self::GroupAddRobot(e) => e.id.as_str(),
            Self::GroupDelRobot(e) => e.id.as_str(),
            Self::FriendAdd(e) => e.id.as_str(),
            Self::FriendDel(e) => e.id.as_str(),
        })
    }

    /// Returns the message content for message events.
    pub fn content(&self) -> Option<&Content> {
        match self {
            Self::GroupMessage(e) => Some(&e.content),
            Self::C2CMessage(e) => Some(&e.content),
            Self::ChannelMessage(e) => Some(&e.content),
            Self::DirectMessage(e) => Some(&e.content),
            _ => None,
        }
    }

    /// Returns the message author for message events.
    pub fn author(&self) -> Option<&Author> {
        match self {
            Self::GroupMessage(e) => Some(&e.author),
            Self::C2CMessage(e) => Some(&e.author),
            Self::ChannelMessage(e) => Some(&e.author),
            Self::DirectMessage(e) => Some(&e.author),
            _ => None,
        }
    }

    /// Returns the attachments of a message event.
    ///
    /// `None` for non-message events; message events without attachments
    /// yield an empty list.
    pub fn attachments(&self) -> Option<Attachments> {
        let attachments = match self {
            Self::GroupMessage(e) => &e.attachments,
            Self::C2CMessage(e) => &e.attachments,
            Self::ChannelMessage(e) => &e.attachments,
            Self::DirectMessage(e) => &e.attachments,
            _ => return None,
        };
        Some(attachments.clone().unwrap_or_default())
    }

    /// Computes the reply target of this event.
    ///
    /// `None` only for [`ApplicationReady`], which has nothing to reply to.
    pub fn target(&self) -> Option<Target> {
        Some(match self {
            Self::GroupMessage(e) => e.target(),
            Self::C2CMessage(e) => e.target(),
            Self::ChannelMessage(e) => e.target(),
            Self::DirectMessage(e) => e.target(),
            Self::ApplicationReady(_) => return None,
            Self::GroupAllowBotProactiveMessage(e) => e.target(),
            Self::GroupRejectBotProactiveMessage(e) => e.target(),
            Self::C2CAllowBotProactiveMessage(e) => e.target(),
            Self::C2CRejectBotProactiveMessage(e) => e.target(),
            Self::GroupAddRobot(e) => e.target(),
            Self::GroupDelRobot(e) => e.target(),
            Self::FriendAdd(e) => e.target(),
            Self::FriendDel(e) => e.target(),
        })
    }

    /// Attempts to extract a typed event.
    pub fn extract<T: FromEvent>(&self) -> Option<EventContext<T>> {
        T::from_event(self).map(EventContext::new)
    }
}

// ============================================================================
// EventKind
// ============================================================================

/// The type of an [`Event`], without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    GroupMessage,
    C2CMessage,
    ChannelMessage,
    DirectMessage,
    ApplicationReady,
    GroupAllowBotProactiveMessage,
    GroupRejectBotProactiveMessage,
    C2CAllowBotProactiveMessage,
    C2CRejectBotProactiveMessage,
    GroupAddRobot,
    GroupDelRobot,
    FriendAdd,
    FriendDel,
}

impl EventKind {
    /// All event kinds.
    pub const ALL: [EventKind; 13] = [
        Self::GroupMessage,
        Self::C2CMessage,
        Self::ChannelMessage,
        Self::DirectMessage,
        Self::ApplicationReady,
        Self::GroupAllowBotProactiveMessage,
        Self::GroupRejectBotProactiveMessage,
        Self::C2CAllowBotProactiveMessage,
        Self::C2CRejectBotProactiveMessage,
        Self::GroupAddRobot,
        Self::GroupDelRobot,
        Self::FriendAdd,
        Self::FriendDel,
    ];

    /// The four message kinds.
    pub const MESSAGES: [EventKind; 4] = [
        Self::GroupMessage,
        Self::C2CMessage,
        Self::ChannelMessage,
        Self::DirectMessage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GroupMessage => "GroupMessage",
            Self::C2CMessage => "C2CMessage",
            Self::ChannelMessage => "ChannelMessage",
            Self::DirectMessage => "DirectMessage",
            Self::ApplicationReady => "ApplicationReady",
            Self::GroupAllowBotProactiveMessage => "GroupAllowBotProactiveMessage",
            Self::GroupRejectBotProactiveMessage => "GroupRejectBotProactiveMessage",
            Self::C2CAllowBotProactiveMessage => "C2CAllowBotProactiveMessage",
            Self::C2CRejectBotProactiveMessage => "C2CRejectBotProactiveMessage",
            Self::GroupAddRobot => "GroupAddRobot",
            Self::GroupDelRobot => "GroupDelRobot",
            Self::FriendAdd => "FriendAdd",
            Self::FriendDel => "FriendDel",
        }
    }

    /// Returns `true` for the kinds that carry message content.
    pub fn is_message(self) -> bool {
        Self::MESSAGES.contains(&self)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Event Extraction
// ============================================================================

/// Trait for extracting a typed event from an [`Event`].
pub trait FromEvent: Sized + Clone + Send + Sync + 'static {
    /// The kind this type is extracted from.
    const KIND: EventKind;

    /// Returns `Some(Self)` if `event` is of this type.
    fn from_event(event: &Event) -> Option<Self>;
}

macro_rules! impl_event_variant {
    ($($variant:ident),* $(,)?) => {
        $(
            impl FromEvent for $variant {
                const KIND: EventKind = EventKind::$variant;

                fn from_event(event: &Event) -> Option<Self> {
                    match event {
                        Event::$variant(inner) => Some(inner.clone()),
                        _ => None,
                    }
                }
            }

            impl From<$variant> for Event {
                fn from(inner: $variant) -> Self {
                    Event::$variant(inner)
                }
            }
        )*
    };
}

impl_event_variant!(
    GroupMessage,
    C2CMessage,
    ChannelMessage,
    DirectMessage,
    ApplicationReady,
    GroupAllowBotProactiveMessage,
    GroupRejectBotProactiveMessage,
    C2CAllowBotProactiveMessage,
    C2CRejectBotProactiveMessage,
    GroupAddRobot,
    GroupDelRobot,
    FriendAdd,
    FriendDel,
);

// ============================================================================
// Event Context
// ============================================================================

/// Context wrapper that provides access to extracted event data.
///
/// Use `Deref` to access fields directly on the wrapped type.
#[derive(Debug, Clone)]
pub struct EventContext<T: FromEvent> {
    data: T,
}

impl<T: FromEvent> EventContext<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }

    pub fn into_inner(self) -> T {
        self.data
    }
}

impl<T: FromEvent> Deref for EventContext<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attachment, Group};

    fn group_message() -> GroupMessage {
        GroupMessage {
            id: "MSG1".into(),
            content: Content::from(" hi"),
            group: Group {
                group_id: "G".into(),
                group_openid: "GOPEN".into(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_message_targets() {
        let group = Event::from(group_message());
        assert_eq!(group.target(), Some(Target::reply("GOPEN", "MSG1")));

        let c2c = Event::from(C2CMessage {
            id: "MSG2".into(),
            author: Author {
                user_openid: Some("UOPEN".into()),
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(c2c.target(), Some(Target::reply("UOPEN", "MSG2")));

        let channel = Event::from(ChannelMessage {
            id: "MSG3".into(),
            channel_id: "CH".into(),
            guild_id: "GU".into(),
            ..Default::default()
        });
        assert_eq!(channel.target(), Some(Target::reply("CH", "MSG3")));

        let direct = Event::from(DirectMessage {
            id: "MSG4".into(),
            channel_id: "CH".into(),
            guild_id: "GU".into(),
            ..Default::default()
        });
        assert_eq!(direct.target(), Some(Target::reply("GU", "MSG4")));
    }

    #[test]
    fn test_notice_targets_use_event_id() {
        let added = Event::from(GroupAddRobot {
            id: "EV1".into(),
            timestamp: 1,
            group_openid: "GOPEN".into(),
            op_member_openid: "OP".into(),
        });
        assert_eq!(added.target(), Some(Target::event("GOPEN", "EV1")));

        let friend = Event::from(FriendDel {
            id: "EV2".into(),
            timestamp: 1,
            user_openid: "UOPEN".into(),
        });
        assert_eq!(friend.target(), Some(Target::event("UOPEN", "EV2")));

        assert_eq!(Event::from(ApplicationReady).target(), None);
    }

    #[test]
    fn test_extract_typed_event() {
        let event = Event::from(group_message());
        let typed = event.extract::<GroupMessage>().unwrap();
        assert_eq!(typed.group.group_openid, "GOPEN");
        assert!(event.extract::<C2CMessage>().is_none());
    }

    #[test]
    fn test_attachments_default_to_empty_for_messages() {
        let mut message = group_message();
        assert_eq!(Event::from(message.clone()).attachments().unwrap().len(), 0);

        message.attachments = Some(Attachments(vec![Attachment {
            id: None,
            url: "https://x".into(),
            filename: "f".into(),
            width: None,
            height: None,
            size: 1,
            content_type: "image/png".into(),
        }]));
        assert_eq!(Event::from(message).attachments().unwrap().len(), 1);
        assert!(Event::from(ApplicationReady).attachments().is_none());
    }

    #[test]
    fn test_event_kind_names_are_distinct() {
        let names: std::collections::HashSet<_> =
            EventKind::ALL.iter().map(|kind| kind.as_str()).collect();
        assert_eq!(names.len(), EventKind::ALL.len());
        assert_eq!(EventKind::GroupMessage.to_string(), "GroupMessage");
        assert!(EventKind::DirectMessage.is_message());
        assert!(!EventKind::FriendAdd.is_message());
    }
}
