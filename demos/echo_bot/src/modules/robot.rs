use pharos::prelude::*;
use tracing::info;

async fn on_group_add(event: EventContext<GroupAddRobot>) {
    info!(
        group = %event.group_openid,
        operator = %event.op_member_openid,
        timestamp = event.timestamp,
        "Added to group"
    );
}

async fn on_group_del(event: EventContext<GroupDelRobot>) {
    info!(
        group = %event.group_openid,
        operator = %event.op_member_openid,
        timestamp = event.timestamp,
        "Removed from group"
    );
}

async fn on_friend_add(event: EventContext<FriendAdd>) {
    info!(user = %event.user_openid, timestamp = event.timestamp, "New friend");
}

async fn on_friend_del(event: EventContext<FriendDel>) {
    info!(user = %event.user_openid, timestamp = event.timestamp, "Friend removed");
}

fn setup() -> Result<(), BoxError> {
    listen([EventKind::GroupAddRobot]).handle(on_group_add)?;
    listen([EventKind::GroupDelRobot]).handle(on_group_del)?;
    listen([EventKind::FriendAdd]).handle(on_friend_add)?;
    listen([EventKind::FriendDel]).handle(on_friend_del)?;
    Ok(())
}

pharos::module!(ROBOT, "robot", setup);
