//! # Pharos Core
//!
//! Domain types shared by every layer of the Pharos bot framework:
//!
//! - [`Event`] and [`EventKind`], the closed set of platform events
//! - Typed event structs for messages, proactive-message toggles and
//!   relationship changes
//! - Data models carried inside events ([`Author`], [`Group`], [`Attachment`], ...)
//! - [`Content`] and [`Target`], the views used by matching and replying
//!
//! This crate has no runtime behaviour. Parsing wire payloads lives in
//! `pharos-webhook`, dispatch lives in `pharos-framework`.

pub mod event;
pub mod message;
pub mod model;
pub mod notice;

pub use event::{Event, EventContext, EventKind, FromEvent};
pub use message::{C2CMessage, ChannelMessage, DirectMessage, GroupMessage};
pub use model::{
    Attachment, Attachments, Author, Content, Group, GuildMember, Member, Mention, MessageScene,
    Target,
};
pub use notice::{
    ApplicationReady, C2CAllowBotProactiveMessage, C2CRejectBotProactiveMessage, FriendAdd,
    FriendDel, GroupAddRobot, GroupAllowBotProactiveMessage, GroupDelRobot,
    GroupRejectBotProactiveMessage,
};
