//! Message events.

use serde::{Deserialize, Serialize};

use crate::model::{
    Attachments, Author, Content, Group, GuildMember, Member, Mention, MessageScene, Target,
};

/// A message that @-mentions the bot in a group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupMessage {
    pub id: String,
    pub content: Content,
    pub timestamp: String,
    pub author: Author,
    pub group: Group,
    pub member: Member,
    pub message_scene: Option<MessageScene>,
    pub attachments: Option<Attachments>,
}

impl GroupMessage {
    pub fn target(&self) -> Target {
        Target::reply(&self.group.group_openid, &self.id)
    }
}

/// A private (peer-to-peer) message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct C2CMessage {
    pub id: String,
    pub content: Content,
    pub timestamp: String,
    pub author: Author,
    pub message_scene: Option<MessageScene>,
    pub attachments: Option<Attachments>,
}

impl C2CMessage {
    pub fn target(&self) -> Target {
        Target::reply(
            self.author.user_openid.as_deref().unwrap_or_default(),
            &self.id,
        )
    }
}

/// A message that @-mentions the bot in a guild channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub id: String,
    pub content: Content,
    pub timestamp: String,
    pub author: Author,
    pub channel_id: String,
    pub guild_id: String,
    pub mentions: Vec<Mention>,
    pub member: GuildMember,
    pub attachments: Option<Attachments>,
    pub seq: i64,
    pub seq_in_channel: i64,
}

impl ChannelMessage {
    pub fn target(&self) -> Target {
        Target::reply(&self.channel_id, &self.id)
    }
}

/// A guild direct message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectMessage {
    pub id: String,
    pub content: Content,
    pub timestamp: String,
    pub author: Author,
    pub channel_id: String,
    pub guild_id: String,
    pub member: GuildMember,
    pub attachments: Option<Attachments>,
    pub seq: i64,
    pub seq_in_channel: i64,
    pub direct_message: bool,
    pub src_guild_id: String,
}

impl DirectMessage {
    pub fn target(&self) -> Target {
        Target::reply(&self.guild_id, &self.id)
    }
}
