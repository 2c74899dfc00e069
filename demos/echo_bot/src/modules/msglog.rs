//! Logs every message event before any other module sees it.

use pharos::prelude::*;
use tracing::info;

async fn log_message(event: Event) {
    let author = event.author().map_or("?", |a| a.display_name());
    let content = event.content().map_or("", Content::as_str);
    let attachments = event.attachments().map_or(0, |a| a.0.len());

    match &event {
        Event::GroupMessage(m) => info!(
            group = %m.group.group_openid,
            author,
            content,
            attachments,
            "[msglog] group"
        ),
        Event::ChannelMessage(m) => info!(
            guild = %m.guild_id,
            channel = %m.channel_id,
            author,
            content,
            seq = m.seq,
            "[msglog] channel"
        ),
        Event::DirectMessage(m) => info!(
            guild = %m.guild_id,
            channel = %m.channel_id,
            author,
            content,
            "[msglog] direct"
        ),
        _ => info!(author, content, attachments, "[msglog] c2c"),
    }
}

fn setup() -> Result<(), BoxError> {
    listen(EventKind::MESSAGES)
        .name("msglog")
        .priority(0)
        .handle(log_message)?;
    Ok(())
}

pharos::module!(MSGLOG, "msglog", setup);
