//! GDB Remote Debugging Support
//!
//! Implements the GDB Remote Serial Protocol over a Unix socket, plus a
//! simpler line-oriented protocol for the same attachment point. Both use
//! non-blocking socket I/O on a helper thread so neither ever stalls
//! emulation; the core thread drains whatever commands have queued up by
//! calling `process_commands` between instructions.

pub mod backend;
mod commands;
mod line;
mod protocol;
mod socket;

pub use backend::{Breakpoint, DebugCommand, DebuggerBackend, DebuggerHandle, DebuggerRequest, DebuggerResponse};
pub use line::LineDebugger;

use crate::cpu::state::SEG_CS;
use crate::cpu::{Cpu, DebugHook};
use crate::memory::Memory;
use protocol::format_packet;
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;

/// How long `before_step` sleeps between polls of the incoming queue while
/// paused. The core thread owns `Cpu` outright, so waiting for a GDB
/// command here means spinning on the queue rather than blocking on a
/// channel recv; a few milliseconds keeps that from burning a core.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Debugger execution state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DebugState {
    /// Execute normally
    Running,
    /// Halted, waiting for GDB command
    Paused,
    /// Execute 1 instruction then pause
    SingleStep,
}

/// GDB Remote Debugger
pub struct GdbDebugger {
    /// Incoming packets from GDB client
    incoming_packets: Arc<RwLock<VecDeque<String>>>,

    /// Outgoing packets to GDB client
    outgoing_packets: Arc<RwLock<VecDeque<String>>>,

    /// Socket listener thread handle
    _socket_thread: JoinHandle<()>,

    /// Current execution state
    state: DebugState,

    /// Breakpoints (linear addresses: seg*16 + offset)
    breakpoints: Vec<u32>,

    /// Statistics
    packets_processed: usize,
}

impl GdbDebugger {
    /// Create new debugger and start socket listener
    pub fn new(socket_path: &str) -> Self {
        let incoming = Arc::new(RwLock::new(VecDeque::new()));
        let outgoing = Arc::new(RwLock::new(VecDeque::new()));

        let socket_thread = socket::spawn_listener(socket_path.to_string(), incoming.clone(), outgoing.clone(), split_gdb_packets);

        Self {
            incoming_packets: incoming,
            outgoing_packets: outgoing,
            _socket_thread: socket_thread,
            state: DebugState::Paused, // Start paused, waiting for GDB
            breakpoints: Vec::new(),
            packets_processed: 0,
        }
    }

    /// Check if emulation is paused
    pub fn is_paused(&self) -> bool {
        self.state == DebugState::Paused
    }

    /// Check if in single-step mode
    pub fn is_single_stepping(&self) -> bool {
        self.state == DebugState::SingleStep
    }

    /// Pause execution
    pub fn pause(&mut self) {
        self.state = DebugState::Paused;
    }

    /// Resume execution
    pub fn resume(&mut self) {
        self.state = DebugState::Running;
    }

    /// Execute one instruction then pause
    pub fn single_step(&mut self) {
        self.state = DebugState::SingleStep;
    }

    /// Add breakpoint at linear address
    pub fn add_breakpoint(&mut self, addr: u32) {
        if !self.breakpoints.contains(&addr) {
            self.breakpoints.push(addr);
        }
    }

    /// Remove breakpoint at linear address
    pub fn remove_breakpoint(&mut self, addr: u32) {
        self.breakpoints.retain(|&a| a != addr);
    }

    /// Check if current IP matches a breakpoint
    pub fn check_breakpoint(&self, cpu: &Cpu) -> bool {
        let linear_addr = Memory::physical(cpu.read_seg(SEG_CS), cpu.ip);
        self.breakpoints.contains(&linear_addr)
    }

    /// Send a packet to GDB client
    fn send_packet(&mut self, data: &str) {
        let packet = format_packet(data);
        self.outgoing_packets.write().unwrap().push_back(packet);
    }

    /// Send halt reason to GDB (SIGTRAP)
    pub fn send_halt_reason(&mut self) {
        self.send_packet("S05"); // Signal 5 = SIGTRAP
    }

    /// Process incoming GDB commands
    pub fn process_commands(&mut self, cpu: &mut Cpu, mem: &mut Memory) {
        // Process all pending packets
        loop {
            let packet = {
                let mut queue = self.incoming_packets.write().unwrap();
                queue.pop_front()
            };

            let Some(packet) = packet else {
                break;
            };

            self.packets_processed += 1;

            log::debug!("gdb: received command: {}", packet);

            // Check if this is a deferred-response command (s, c)
            let deferred = packet.starts_with('s') || packet.starts_with('c');

            // Handle command
            let response = commands::handle_command(&packet, cpu, mem, self);

            // Send response
            if !response.is_empty() {
                log::debug!("gdb: sending response: {}", response);
                self.send_packet(&response);
            } else if !deferred {
                // Empty response for unsupported commands (but not for s/c)
                log::trace!("gdb: empty response (not supported)");
                self.send_packet("");
            } else {
                // Deferred response (s/c) - will send S05 later
                log::trace!("gdb: deferred response (will send halt reason after execution)");
            }
        }
    }

    /// Called after single-step instruction completes
    pub fn finish_single_step(&mut self) {
        if self.state == DebugState::SingleStep {
            self.pause();
            self.send_halt_reason();
        }
    }
}

impl DebugHook for GdbDebugger {
    /// Drain whatever GDB has sent since the last instruction, then block
    /// the core thread (by polling) while paused. A session starts paused,
    /// so the very first instruction waits for a GDB client to attach and
    /// send a continue/step request before anything runs.
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

/// Pull complete `$...#cc` packets out of `pending`, draining the consumed
/// bytes (including any leading `+`/`-` acks) and replying `+` for each.
fn split_gdb_packets(pending: &mut Vec<u8>) -> Vec<String> {
    let mut packets = Vec::new();
    loop {
        let Some(start) = pending.iter().position(|&b| b == b'$') else {
            pending.clear();
            break;
        };
        let Some(hash_offset) = pending[start..].iter().position(|&b| b == b'#') else {
            break;
        };
        let hash_pos = start + hash_offset;
        if pending.len() < hash_pos + 3 {
            break;
        }

        let frame: Vec<u8> = pending.drain(..=hash_pos + 2).collect();
        if let Some(packet) = protocol::parse_packet(&frame) {
            packets.push(packet);
        }
    }
    packets
}
