//! Unix-socket transport shared by the debugger wire formats.
//!
//! Each listener runs on its own thread, accepts a single client connection,
//! and shuttles raw frames between the socket and a pair of queues the wire
//! format's session object drains on the caller's schedule. Framing (GDB
//! packet checksums vs. newline-delimited lines) is the wire format's job;
//! this module only owns the socket and the non-blocking read loop.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Spawn a thread that accepts one connection on `socket_path` and calls
/// `on_bytes` with each chunk read from it, pushing whatever that callback
/// returns into `incoming`. Drains `outgoing` back to the socket between
/// reads. The existing socket file at `socket_path`, if any, is removed
/// first (a stale path left behind by a previous run must not block bind).
pub fn spawn_listener<F>(
    socket_path: String,
    incoming: Arc<RwLock<VecDeque<String>>>,
    outgoing: Arc<RwLock<VecDeque<String>>>,
    mut on_bytes: F,
) -> JoinHandle<()>
where
    F: FnMut(&mut Vec<u8>) -> Vec<String> + Send + 'static,
{
    thread::spawn(move || {
        let _ = std::fs::remove_file(&socket_path);
        let listener = match UnixListener::bind(&socket_path) {
            Ok(l) => l,
            Err(e) => {
                log::error!("debugger socket bind failed at {}: {}", socket_path, e);
                return;
            }
        };
        log::info!("debugger listening on {}", socket_path);

        let (mut stream, _) = match listener.accept() {
            Ok(pair) => pair,
            Err(e) => {
                log::error!("debugger socket accept failed: {}", e);
                return;
            }
        };
        if let Err(e) = stream.set_read_timeout(Some(READ_TIMEOUT)) {
            log::warn!("failed to set debugger socket read timeout: {}", e);
        }
        log::info!("debugger client connected");

        let mut pending = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            match stream.read(&mut buf) {
                Ok(0) => {
                    log::info!("debugger client disconnected");
                    break;
                }
                Ok(n) => {
                    pending.extend_from_slice(&buf[..n]);
                    for frame in on_bytes(&mut pending) {
                        incoming.write().unwrap().push_back(frame);
                    }
                }
                Err(ref e) if matches!(e.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut) => {}
                Err(e) => {
                    log::warn!("debugger socket read error: {}", e);
                    break;
                }
            }

            if !flush_outgoing(&mut stream, &outgoing) {
                break;
            }
        }
    })
}

fn flush_outgoing(stream: &mut UnixStream, outgoing: &Arc<RwLock<VecDeque<String>>>) -> bool {
    let mut queue = outgoing.write().unwrap();
    while let Some(chunk) = queue.pop_front() {
        if stream.write_all(chunk.as_bytes()).is_err() {
            return false;
        }
    }
    true
}
