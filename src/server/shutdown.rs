//! Operator-driven shutdown triggers.

use std::io::BufRead;
use std::thread;

use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Watches `input` for a line equal to `command` (surrounding whitespace
/// ignored) on a dedicated OS thread.
///
/// The receiver resolves with `Ok(())` once the command is read. If the
/// input ends or fails first, the sender is dropped and the receiver
/// resolves with an error instead. The thread is detached, so a blocked read
/// never keeps the runtime or the process alive.
pub fn stop_on_command<R>(input: R, command: &'static str) -> oneshot::Receiver<()>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = oneshot::channel();

    let spawned = thread::Builder::new()
        .name("stop-command".to_string())
        .spawn(move || {
            for line in input.lines() {
                match line {
                    Ok(line) if line.trim() == command => {
                        let _ = tx.send(());
                        return;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "stop command input failed");
                        return;
                    }
                }
            }
            debug!("stop command input closed");
        });

    if let Err(e) = spawned {
        warn!(error = %e, "failed to start stop command watcher");
    }

    rx
}
