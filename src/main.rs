mod app;
mod config;
mod irc;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.debug);

    let settings = config::load_settings(&cli)?;

    // One reader thread owns stdin for the whole run; the prompt and the
    // input loop both consume its channel.
    let mut input = app::console::spawn_reader().context("Failed to start console reader")?;

    if !settings.behavior.auto_connect {
        if app::console::confirm(&settings, &mut input).await {
            println!("Starting IRC client");
        } else {
            println!("Program will close");
            return Ok(());
        }
    }

    if let Err(e) = app::run_session(settings, input).await {
        eprintln!("Error: {}", e);
    }

    Ok(())
}
