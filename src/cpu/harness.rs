//! CPU test harness for instruction testing
//!
//! Provides a minimal environment for testing CPU instructions without
//! a full emulator. Contains just CPU state and memory.

use crate::cpu::state::SEG_CS;
use crate::cpu::Cpu;
use crate::memory::Memory;

/// Test harness for CPU instruction testing
///
/// Provides a minimal environment with CPU and memory for testing
/// individual instructions or short sequences.
pub struct CpuHarness {
    /// CPU state
    pub cpu: Cpu,

    /// Flat 1MB address space
    pub mem: Memory,
}

impl CpuHarness {
    /// Create a new test harness with initialized CPU and memory
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            mem: Memory::new(),
        }
    }

    /// Load a program at the specified segment:0 and point CS:IP at it.
    pub fn load_program(&mut self, code: &[u8], segment: u16) {
        for (i, &byte) in code.iter().enumerate() {
            self.mem.write8(segment, i as u16, byte);
        }

        self.cpu.write_seg(SEG_CS, segment);
        self.cpu.ip = 0;
    }

    /// Execute one instruction.
    pub fn step(&mut self) -> Result<(), crate::error::CoreError> {
        self.cpu.step(&mut self.mem)
    }

    /// Execute multiple instructions, stopping early on error.
    pub fn step_n(&mut self, n: usize) -> Result<(), crate::error::CoreError> {
        for _ in 0..n {
            self.step()?;
        }
        Ok(())
    }

    /// Reset CPU to initial state.
    pub fn reset(&mut self) {
        self.cpu.reset();
    }
}

impl Default for CpuHarness {
    fn default() -> Self {
        Self::new()
    }
}
