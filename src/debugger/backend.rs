//! The engine-side half of the debugger attachment point.
//!
//! A `DebuggerBackend` is what a run loop consults before dispatching each
//! instruction: if nothing wants to interrupt execution, `step` returns
//! immediately; otherwise it blocks on the request channel until the far
//! end of a wire session (GDB RSP, the line-oriented protocol, or any other
//! transport) sends a command. The backend never parses wire bytes itself -
//! that's the transport's job - it only understands the small command
//! vocabulary both transports translate into.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, RwLock};

use crate::cpu::state::SEG_CS;
use crate::cpu::{Cpu, DebugHook};
use crate::memory::Memory;

/// Commands a wire session can issue to a suspended engine.
#[derive(Debug, Clone, PartialEq)]
pub enum DebugCommand {
    Continue,
    Detach,
    Halt,
    Info,
    Heartbeat,
    Step,
    Unknown(String),
}

/// A request sent from a wire session to the engine thread.
#[derive(Debug, Clone)]
pub struct DebuggerRequest {
    pub cmd: DebugCommand,
    pub data: String,
}

/// A response sent from the engine thread back to a wire session.
#[derive(Debug, Clone)]
pub struct DebuggerResponse {
    pub text: String,
}

/// A breakpoint at a fixed CS:IP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakpoint {
    pub seg: u16,
    pub off: u16,
}

impl Breakpoint {
    fn should_break(&self, cpu: &Cpu) -> bool {
        cpu.read_seg(SEG_CS) == self.seg && cpu.ip == self.off
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebuggerMode {
    Stepping,
    Running,
}

/// The far end of a `DebuggerBackend`, held by a wire session thread.
pub struct DebuggerHandle {
    pub request: Sender<DebuggerRequest>,
    pub response: Receiver<DebuggerResponse>,
    interrupted: Arc<RwLock<bool>>,
}

impl DebuggerHandle {
    /// Request the engine break at the next instruction boundary, even
    /// without a matching breakpoint (an out-of-band "break in").
    pub fn interrupt(&self) {
        *self.interrupted.write().unwrap() = true;
    }
}

/// Engine-side debugger state: breakpoints, single-step mode, and the
/// channel pair a wire session drives it through.
pub struct DebuggerBackend {
    breakpoints: Vec<Breakpoint>,
    request: Receiver<DebuggerRequest>,
    response: Sender<DebuggerResponse>,
    mode: DebuggerMode,
    interrupted: Arc<RwLock<bool>>,
}

impl DebuggerBackend {
    /// Create a backend/handle pair. The backend starts in single-step
    /// mode, matching an attached-but-not-yet-continued debugger.
    pub fn new() -> (Self, DebuggerHandle) {
        let (request_tx, request_rx) = std::sync::mpsc::channel();
        let (response_tx, response_rx) = std::sync::mpsc::channel();
        let interrupted = Arc::new(RwLock::new(false));

        let backend = Self {
            breakpoints: Vec::new(),
            request: request_rx,
            response: response_tx,
            mode: DebuggerMode::Stepping,
            interrupted: interrupted.clone(),
        };
        let handle = DebuggerHandle {
            request: request_tx,
            response: response_rx,
            interrupted,
        };
        (backend, handle)
    }

    pub fn add_breakpoint(&mut self, bp: Breakpoint) {
        self.remove_breakpoint(bp);
        self.breakpoints.push(bp);
    }

    pub fn remove_breakpoint(&mut self, bp: Breakpoint) -> bool {
        let len_before = self.breakpoints.len();
        self.breakpoints.retain(|&b| b != bp);
        self.breakpoints.len() != len_before
    }

    fn should_break(&self, cpu: &Cpu) -> bool {
        if self.mode == DebuggerMode::Stepping {
            return true;
        }
        if self.breakpoints.iter().any(|bp| bp.should_break(cpu)) {
            return true;
        }
        *self.interrupted.read().unwrap()
    }

    /// Called before each instruction is dispatched. Returns `true` if the
    /// run loop should proceed to execute the next instruction, `false` if
    /// it should stop (a HALT command, or the other end of the channel
    /// hung up).
    pub fn step(&mut self, cpu: &mut Cpu) -> bool {
        if !self.should_break(cpu) {
            return true;
        }

        log::trace!("debugger break at {:04x}:{:04x}", cpu.read_seg(SEG_CS), cpu.ip);
        *self.interrupted.write().unwrap() = false;

        while let Ok(req) = self.request.recv() {
            log::debug!("debugger request: {:?}", req.cmd);
            match req.cmd {
                DebugCommand::Continue => {
                    self.mode = DebuggerMode::Running;
                    return true;
                }
                DebugCommand::Detach => {
                    self.mode = DebuggerMode::Running;
                    return true;
                }
                DebugCommand::Step => {
                    self.mode = DebuggerMode::Stepping;
                    return true;
                }
                DebugCommand::Halt => {
                    cpu.halted = true;
                    return false;
                }
                DebugCommand::Info => {
                    let ax = cpu.read_reg16(0);
                    let _ = self.response.send(DebuggerResponse {
                        text: format!("AX: {:04x}", ax),
                    });
                }
                DebugCommand::Heartbeat => {
                    let _ = self.response.send(DebuggerResponse {
                        text: "Heartbeat".to_string(),
                    });
                }
                DebugCommand::Unknown(raw) => {
                    log::warn!("unknown debugger command: {}", raw);
                }
            }
        }

        false
    }
}

impl DebugHook for DebuggerBackend {
    fn before_step(&mut self, cpu: &mut Cpu, _mem: &mut Memory) -> bool {
        self.step(cpu)
    }
}
