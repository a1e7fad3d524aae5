//! The line-oriented debugger protocol: space-separated tokens, one command
//! per line, no packet framing. Simpler than GDB RSP for scripting a run
//! from a shell or a test harness.
//!
//! Command vocabulary: `c` (continue), `d` (detach), `h` (halt), `i`
//! (register dump), `m <seg> <off> <len>` (memory read), `q`
//! (heartbeat/query), `s` (single step).

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::cpu::state::SEG_CS;
use crate::cpu::{Cpu, DebugHook};
use crate::memory::Memory;

use super::socket;

/// How long `before_step` sleeps between polls of the incoming queue while
/// paused, mirroring the GDB session's poll interval.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Execution state, mirroring [`super::GdbDebugger`]'s run/pause/step modes.
#[derive(Debug, Clone, Copy, PartialEq)]
enum LineState {
    Running,
    Paused,
    SingleStep,
}

/// Line-oriented debugger session over a Unix socket.
pub struct LineDebugger {
    incoming: Arc<RwLock<VecDeque<String>>>,
    outgoing: Arc<RwLock<VecDeque<String>>>,
    _socket_thread: JoinHandle<()>,
    state: LineState,
}

impl LineDebugger {
    pub fn new(socket_path: &str) -> Self {
        let incoming = Arc::new(RwLock::new(VecDeque::new()));
        let outgoing = Arc::new(RwLock::new(VecDeque::new()));

        let socket_thread = socket::spawn_listener(socket_path.to_string(), incoming.clone(), outgoing.clone(), split_lines);

        Self {
            incoming,
            outgoing,
            _socket_thread: socket_thread,
            state: LineState::Paused,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.state == LineState::Paused
    }

    pub fn is_single_stepping(&self) -> bool {
        self.state == LineState::SingleStep
    }

    fn send_line(&mut self, text: &str) {
        let mut line = text.to_string();
        line.push('\n');
        self.outgoing.write().unwrap().push_back(line);
    }

    /// Process all pending commands against the live CPU/memory state.
    pub fn process_commands(&mut self, cpu: &mut Cpu, mem: &mut Memory) {
        loop {
            let line = {
                let mut queue = self.incoming.write().unwrap();
                queue.pop_front()
            };
            let Some(line) = line else { break };

            log::debug!("line debugger command: {}", line);
            let response = self.handle_line(&line, cpu, mem);
            if let Some(response) = response {
                self.send_line(&response);
            }
        }
    }

    fn handle_line(&mut self, line: &str, cpu: &mut Cpu, mem: &mut Memory) -> Option<String> {
        let mut tokens = line.split_whitespace();
        match tokens.next()? {
            "c" => {
                self.state = LineState::Running;
                Some("ok".to_string())
            }
            "d" => {
                self.state = LineState::Running;
                Some("ok".to_string())
            }
            "h" => {
                cpu.halted = true;
                self.state = LineState::Paused;
                Some("ok".to_string())
            }
            "s" => {
                self.state = LineState::SingleStep;
                Some("ok".to_string())
            }
            "i" => Some(register_dump(cpu)),
            "q" => Some("heartbeat".to_string()),
            "m" => {
                let seg = u16::from_str_radix(tokens.next()?, 16).ok()?;
                let off = u16::from_str_radix(tokens.next()?, 16).ok()?;
                let len: u16 = tokens.next()?.parse().ok()?;
                Some(memory_dump(mem, seg, off, len))
            }
            other => {
                log::warn!("unknown line debugger command: {}", other);
                Some("err unknown command".to_string())
            }
        }
    }

    /// Called after a single-step instruction completes.
    pub fn finish_single_step(&mut self) {
        if self.state == LineState::SingleStep {
            self.state = LineState::Paused;
            self.send_line("stopped");
        }
    }
}

impl DebugHook for LineDebugger {
    /// Drain pending lines, then poll while paused. A session starts
    /// paused, so the guest waits for a `c` or `s` command before the
    /// first instruction runs.
    fn before_step(&mut self, cpu: &mut Cpu, mem: &mut Memory) -> bool {
        self.process_commands(cpu, mem);
        while self.is_paused() {
            if cpu.halted {
                return false;
            }
            std::thread::sleep(POLL_INTERVAL);
            self.process_commands(cpu, mem);
        }
        true
    }

    fn after_step(&mut self, _cpu: &mut Cpu) {
        self.finish_single_step();
    }
}

fn register_dump(cpu: &Cpu) -> String {
    format!(
        "ax={:04x} cx={:04x} dx={:04x} bx={:04x} sp={:04x} bp={:04x} si={:04x} di={:04x} cs={:04x} ip={:04x} flags={:04x}",
        cpu.read_reg16(0),
        cpu.read_reg16(1),
        cpu.read_reg16(2),
        cpu.read_reg16(3),
        cpu.read_reg16(4),
        cpu.read_reg16(5),
        cpu.read_reg16(6),
        cpu.read_reg16(7),
        cpu.read_seg(SEG_CS),
        cpu.ip,
        cpu.get_flags(),
    )
}

fn memory_dump(mem: &Memory, seg: u16, off: u16, len: u16) -> String {
    let mut out = String::with_capacity(len as usize * 2);
    let mut offset = off;
    for _ in 0..len {
        out.push_str(&format!("{:02x}", mem.read8(seg, offset)));
        offset = offset.wrapping_add(1);
    }
    out
}

/// Split accumulated bytes on `\n`, returning completed (and trimmed)
/// lines and leaving any partial trailing line in `pending`.
fn split_lines(pending: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    loop {
        let Some(pos) = pending.iter().position(|&b| b == b'\n') else { break };
        let line_bytes: Vec<u8> = pending.drain(..=pos).collect();
        if let Ok(line) = String::from_utf8(line_bytes) {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        }
    }
    lines
}
