//! Lifecycle, proactive-message and relationship events.
//!
//! None of these carry message content. Their [`Target`] addresses the
//! group or user and carries the event id instead of a message id.

use serde::{Deserialize, Serialize};

use crate::model::Target;

/// Published once by the runtime after the webhook server is listening.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationReady;

macro_rules! group_notice {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            pub id: String,
            pub timestamp: i64,
            pub group_openid: String,
            pub op_member_openid: String,
        }

        impl $name {
            pub fn target(&self) -> Target {
                Target::event(&self.group_openid, &self.id)
            }
        }
    };
}

macro_rules! user_notice {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            pub id: String,
            pub timestamp: i64,
            pub user_openid: String,
        }

        impl $name {
            pub fn target(&self) -> Target {
                Target::event(&self.user_openid, &self.id)
            }
        }
    };
}

group_notice!(
    /// A group enabled proactive messages from the bot.
    GroupAllowBotProactiveMessage
);
group_notice!(
    /// A group disabled proactive messages from the bot.
    GroupRejectBotProactiveMessage
);
group_notice!(
    /// The bot was added to a group.
    GroupAddRobot
);
group_notice!(
    /// The bot was removed from a group.
    GroupDelRobot
);

user_notice!(
    /// A user enabled proactive messages from the bot.
    C2CAllowBotProactiveMessage
);
user_notice!(
    /// A user disabled proactive messages from the bot.
    C2CRejectBotProactiveMessage
);
user_notice!(
    /// A user added the bot as a friend.
    FriendAdd
);
user_notice!(
    /// A user removed the bot from their friends.
    FriendDel
);
