//! Echo Bot Example
//!
//! A small demonstration of the Pharos framework: a few modules listening to
//! webhook events, matched with prefixes, keywords and sub-commands.
//!
//! # Modules
//!
//! | module      | listens to                                  |
//! |-------------|---------------------------------------------|
//! | `echo`      | `!hello`, `/echo`, `ping`, `!say`           |
//! | `guild`     | channel and direct messages                 |
//! | `lifecycle` | `ApplicationReady`                          |
//! | `msglog`    | every message event                         |
//! | `robot`     | group join/leave, friend add/remove         |
//! | `proactive` | proactive-message switches                  |
//!
//! # Usage
//!
//! ```bash
//! PHAROS_BOT__APPID=... PHAROS_BOT__SECRET=... \
//!     cargo run --package echo-bot -- --config demos/echo_bot/pharos.toml
//! ```

mod modules;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use pharos::prelude::*;

#[derive(Debug, Parser)]
#[command(name = "echo-bot", about = "Pharos echo bot example")]
struct Args {
    /// Configuration file. Defaults to `pharos.toml` in the current directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile, e.g. `staging` layers `pharos.staging.toml` over `pharos.toml`.
    #[arg(short, long, env = "PHAROS_PROFILE")]
    profile: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = Pharos::builder();
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = args.profile {
        builder = builder.profile(profile);
    }

    let app = builder.build()?;
    app.run().await?;

    Ok(())
}
