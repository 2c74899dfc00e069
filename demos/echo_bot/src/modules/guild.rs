//! Guild channel and direct messages.

use pharos::prelude::*;
use tracing::info;

async fn on_channel_message(event: EventContext<ChannelMessage>) {
    info!(
        guild = %event.guild_id,
        channel = %event.channel_id,
        author = event.author.display_name(),
        content = %event.content,
        "Channel message"
    );
}

async fn on_channel_hello(event: EventContext<ChannelMessage>) {
    info!(channel = %event.channel_id, "Hello from Pharos! (Channel)");
}

async fn on_direct_message(event: EventContext<DirectMessage>) {
    info!(
        guild = %event.guild_id,
        channel = %event.channel_id,
        author = event.author.display_name(),
        content = %event.content,
        direct = event.direct_message,
        "Direct message"
    );
}

fn setup() -> Result<(), BoxError> {
    listen([EventKind::ChannelMessage]).handle(on_channel_message)?;
    listen([EventKind::ChannelMessage])
        .matcher(Matcher::prefix(["!hello"]))
        .handle(on_channel_hello)?;
    listen([EventKind::DirectMessage]).handle(on_direct_message)?;
    Ok(())
}

pharos::module!(GUILD, "guild", setup);
