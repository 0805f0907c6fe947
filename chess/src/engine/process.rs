use super::EngineError;

use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Lines read from the engine output
pub(super) type Lines = Receiver<io::Result<String>>;

/// Starts the engine at `path` without arguments, with piped standard input and output
pub(super) fn spawn(path: &Path) -> Result<(Child, ChildStdin, ChildStdout), EngineError> {
    let mut child = Command::new(path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| EngineError::Spawn {
            path: path.to_owned(),
            source,
        })?;
    match (child.stdin.take(), child.stdout.take()) {
        (Some(stdin), Some(stdout)) => Ok((child, stdin, stdout)),
        _ => {
            shutdown(&mut child, Duration::ZERO);
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "engine pipes are not available").into())
        }
    }
}

/// Starts a thread which forwards lines from `reader` into the returned channel
///
/// The thread stops on end of stream, on the first read error (which is forwarded as well), or
/// when the receiver is dropped.
pub(super) fn spawn_reader<R: Read + Send + 'static>(reader: R) -> io::Result<Lines> {
    let (tx, rx) = unbounded();
    thread::Builder::new()
        .name("engine-reader".into())
        .spawn(move || {
            for line in BufReader::new(reader).lines() {
                let failed = line.is_err();
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
            debug!("engine output closed");
        })?;
    Ok(rx)
}

/// Waits up to `grace` for the child to exit, then kills it
pub(super) fn shutdown(child: &mut Child, grace: Duration) {
    let deadline = Instant::now() + grace;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(%status, "engine exited");
                return;
            }
            Ok(None) if Instant::now() < deadline => thread::sleep(POLL_INTERVAL),
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "cannot query engine status");
                break;
            }
        }
    }
    warn!("engine didn't exit in time, killing it");
    if let Err(e) = child.kill() {
        warn!(error = %e, "cannot kill engine");
    }
    if let Err(e) = child.wait() {
        warn!(error = %e, "cannot reap engine");
    }
}
