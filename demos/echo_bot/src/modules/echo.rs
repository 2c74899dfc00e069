//! Message matching examples. Replies are logged rather than sent.

use pharos::prelude::*;
use tracing::info;

async fn on_c2c_hello(event: EventContext<C2CMessage>) {
    info!(
        user = event.author.user_openid.as_deref().unwrap_or("?"),
        content = %event.content,
        "C2C hello"
    );
}

async fn on_group_hello(event: EventContext<GroupMessage>, target: Target) {
    info!(
        group = %event.group.group_openid,
        reply_to = %target.target_id,
        content = %event.content,
        "Group hello"
    );
}

async fn on_echo(result: CommandResult, attachments: Option<Attachments>) {
    let reply = if result.args.is_empty() {
        "Empty echo".to_string()
    } else {
        result.args.join(" ")
    };
    let images = attachments.map_or(0, |a| a.0.len());
    info!(reply = %format!("Echo: {reply}"), images, "Echo");
}

async fn on_ping(event: Event) {
    info!(kind = %event.kind(), content = event.content().map(Content::as_str), "pong!");
}

async fn on_say(result: MatchResult) -> Propagation {
    info!(reply = %format!("You said: {}", result.text), "Say");
    Propagation::Stop
}

fn setup() -> Result<(), BoxError> {
    describe(|meta| {
        meta.description = "Prefix, keyword and sub-command examples".into();
    })?;

    listen([EventKind::C2CMessage])
        .matcher(Matcher::prefix(["!hello"]))
        .handle(on_c2c_hello)?;
    listen([EventKind::GroupMessage])
        .matcher(Matcher::prefix(["!hello"]))
        .handle(on_group_hello)?;

    listen([EventKind::C2CMessage, EventKind::GroupMessage])
        .matcher(SubCommandMatch::new("/echo"))
        .handle(on_echo)?;

    listen([EventKind::C2CMessage, EventKind::GroupMessage])
        .matcher(Matcher::keyword("ping"))
        .handle(on_ping)?;

    listen([EventKind::GroupMessage])
        .priority(8)
        .matcher(Matcher::prefix(["!say"]))
        .handle(on_say)?;

    Ok(())
}

pharos::module!(ECHO, "echo", setup);
