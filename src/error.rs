//! Error taxonomy for the CPU core and its collaborators.
//!
//! All fallible core operations return [`CoreError`] rather than panicking,
//! so a host (debugger, loader, test harness) can recover instead of
//! unwinding the whole process.

use thiserror::Error;

/// A trapped arithmetic condition. Currently only integer division raises
/// one; real 8086 hardware would vector to INT 0, but surfacing a host-level
/// error is sufficient for this core.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum TrapKind {
    #[error("divide by zero")]
    DivideByZero,
    #[error("division overflow (quotient does not fit in destination)")]
    DivideOverflow,
}

/// Why the CPU stopped running. Carried by [`CoreError::HaltRequested`] so a
/// caller can tell a guest-initiated HLT apart from a debugger HALT command.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum HaltReason {
    #[error("HLT executed")]
    Hlt,
    #[error("DOS program terminated")]
    DosTerminate,
    #[error("debugger requested halt")]
    Debugger,
}

/// Errors raised while decoding or executing instructions, or while a
/// collaborator (loader, DOS, BIOS) drives the CPU.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CoreError {
    /// The byte at CS:IP does not correspond to any decodable instruction.
    #[error("cannot decode opcode {opcode:#04x} at {cs:04x}:{ip:04x}")]
    DecodeError { opcode: u8, cs: u16, ip: u16 },

    /// An arithmetic operation trapped (currently only integer division).
    #[error("arithmetic trap: {0}")]
    ArithmeticTrap(TrapKind),

    /// An access fell outside the backing address space.
    #[error("memory fault: address {0:#08x} out of range")]
    MemoryFault(u32),

    /// A clean termination signaled by HLT, DOS terminate, or debugger HALT.
    /// Not really an "error" but returned through the same channel so the
    /// fetch-decode-execute loop has one exit path.
    #[error("CPU halted: {0}")]
    HaltRequested(HaltReason),
}
