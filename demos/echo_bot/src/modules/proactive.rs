use pharos::prelude::*;
use tracing::info;

async fn on_group_switch(event: Event) {
    match event {
        Event::GroupAllowBotProactiveMessage(e) => {
            info!(group = %e.group_openid, operator = %e.op_member_openid, "Proactive messages on")
        }
        Event::GroupRejectBotProactiveMessage(e) => {
            info!(group = %e.group_openid, operator = %e.op_member_openid, "Proactive messages off")
        }
        _ => {}
    }
}

async fn on_c2c_allow(event: EventContext<C2CAllowBotProactiveMessage>) {
    info!(user = %event.user_openid, "C2C proactive messages on");
}

async fn on_c2c_reject(event: EventContext<C2CRejectBotProactiveMessage>) {
    info!(user = %event.user_openid, "C2C proactive messages off");
}

fn setup() -> Result<(), BoxError> {
    listen([
        EventKind::GroupAllowBotProactiveMessage,
        EventKind::GroupRejectBotProactiveMessage,
    ])
    .handle(on_group_switch)?;
    listen([EventKind::C2CAllowBotProactiveMessage]).handle(on_c2c_allow)?;
    listen([EventKind::C2CRejectBotProactiveMessage]).handle(on_c2c_reject)?;
    Ok(())
}

pharos::module!(PROACTIVE, "proactive", setup);
