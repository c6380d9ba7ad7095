//! Operator console: a dedicated reader thread and the startup prompt.

use std::io::BufRead;
use tokio::sync::mpsc;

use crate::config::Settings;

/// Spawn the thread that blocks on stdin and forwards each line.
///
/// The channel closes on end of input. The thread is never joined; it dies
/// with the process.
pub fn spawn_reader() -> std::io::Result<mpsc::UnboundedReceiver<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("console-input".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "console read failed");
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}

/// Show the connection parameters and ask the operator to confirm.
pub async fn confirm(settings: &Settings, input: &mut mpsc::UnboundedReceiver<String>) -> bool {
    let credentials = &settings.credentials;
    println!("IRC client will run with following parameters:");
    println!("IRC server host:\t{}", settings.host);
    println!("IRC server port:\t{}", settings.port);
    println!("IRC user ident :\t{}", credentials.user);
    println!("IRC server pass:\t{}", credentials.pass.as_deref().unwrap_or(""));
    println!("IRC user nick  :\t{}", credentials.nick);
    println!("Is this correct? y/n:");

    match input.recv().await {
        Some(answer) => is_yes(&answer),
        None => false,
    }
}

fn is_yes(answer: &str) -> bool {
    answer.trim_start().starts_with(['y', 'Y'])
}
