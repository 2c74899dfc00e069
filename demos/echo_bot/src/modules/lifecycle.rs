use pharos::prelude::*;
use tracing::info;

fn setup() -> Result<(), BoxError> {
    listen([EventKind::ApplicationReady])
        .handle(|| async { info!("ApplicationReady, the bot is ready to handle events") })?;
    Ok(())
}

pharos::module!(LIFECYCLE, "lifecycle", setup);
