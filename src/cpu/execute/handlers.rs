//! Catch-all handlers: invalid opcodes, NOP, HLT.

use crate::cpu::Cpu;
use crate::cpu::decode::DecodedInstruction;
use crate::error::CoreError;
use crate::memory::Memory;

/// Handler for unknown or unimplemented opcodes. `step()` never actually
/// reaches this for a byte missing from the dispatch table (it returns
/// `DecodeError` before building an instruction at all); this exists for
/// opcode-extension groups whose `reg` field selects an undefined slot.
pub fn invalid_opcode(cpu: &mut Cpu, _mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    Err(CoreError::DecodeError {
        opcode: instr.opcode,
        cs: cpu.read_seg(crate::cpu::state::SEG_CS),
        ip: cpu.ip.wrapping_sub(instr.length as u16),
    })
}

/// NOP (0x90).
pub fn nop(_cpu: &mut Cpu, _mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    Ok(())
}

/// HLT (0xF4). Latches `cpu.halted`; the fetch loop (and `run`) observe it
/// on their next iteration rather than unwinding through an error here.
pub fn hlt(cpu: &mut Cpu, _mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    cpu.halted = true;
    Ok(())
}
