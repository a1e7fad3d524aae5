//! Flag-manipulation handlers: CLC/STC/CMC, CLI/STI, CLD/STD.

use crate::cpu::Cpu;
use crate::cpu::decode::DecodedInstruction;
use crate::error::CoreError;
use crate::memory::Memory;

/// CLC (0xF8) - Clear Carry Flag.
pub fn clc(cpu: &mut Cpu, _mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    cpu.set_flag(Cpu::CF, false);
    Ok(())
}

/// STC (0xF9) - Set Carry Flag.
pub fn stc(cpu: &mut Cpu, _mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    cpu.set_flag(Cpu::CF, true);
    Ok(())
}

/// CMC (0xF5) - Complement Carry Flag.
pub fn cmc(cpu: &mut Cpu, _mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    let cf = cpu.get_flag(Cpu::CF);
    cpu.set_flag(Cpu::CF, !cf);
    Ok(())
}

/// CLI (0xFA) - Clear Interrupt Flag. Maskable hardware interrupts are
/// outside this core's scope, but the flag itself is still observable by
/// PUSHF and the debugger.
pub fn cli(cpu: &mut Cpu, _mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    cpu.set_flag(Cpu::IF, false);
    Ok(())
}

/// STI (0xFB) - Set Interrupt Flag. IF does not become visible until the
/// instruction immediately following this one finishes executing
/// (`Cpu::set_interrupt_delay`), matching the real 8086's one-instruction
/// interrupt shadow.
pub fn sti(cpu: &mut Cpu, _mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    cpu.set_interrupt_delay();
    Ok(())
}

/// CLD (0xFC) - Clear Direction Flag; string instructions step SI/DI forward.
pub fn cld(cpu: &mut Cpu, _mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    cpu.set_flag(Cpu::DF, false);
    Ok(())
}

/// STD (0xFD) - Set Direction Flag; string instructions step SI/DI backward.
pub fn std(cpu: &mut Cpu, _mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    cpu.set_flag(Cpu::DF, true);
    Ok(())
}
