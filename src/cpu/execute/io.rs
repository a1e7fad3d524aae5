//! IN/OUT port I/O handlers.
//!
//! No peripheral is attached at this layer (hardware timers/PIC/DMA are
//! out of scope); these just move bytes between registers and the flat
//! port array in [`Memory`].

use crate::cpu::Cpu;
use crate::cpu::decode::DecodedInstruction;
use crate::error::CoreError;
use crate::memory::Memory;

/// IN AL, imm8 (0xE4).
pub fn in_al_imm8(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    let port = instr.src.value;
    cpu.write_reg8(0, mem.read_port8(port));
    Ok(())
}

/// IN AX, imm8 (0xE5).
pub fn in_ax_imm8(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    let port = instr.src.value;
    cpu.write_reg16(0, mem.read_port16(port));
    Ok(())
}

/// OUT imm8, AL (0xE6).
pub fn out_imm8_al(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    let port = instr.dst.value;
    mem.write_port8(port, cpu.read_reg8(0));
    Ok(())
}

/// OUT imm8, AX (0xE7).
pub fn out_imm8_ax(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    let port = instr.dst.value;
    mem.write_port16(port, cpu.read_reg16(0));
    Ok(())
}

/// IN AL, DX (0xEC).
pub fn in_al_dx(cpu: &mut Cpu, mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    let port = cpu.read_reg16(2); // DX
    cpu.write_reg8(0, mem.read_port8(port));
    Ok(())
}

/// IN AX, DX (0xED).
pub fn in_ax_dx(cpu: &mut Cpu, mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    let port = cpu.read_reg16(2); // DX
    cpu.write_reg16(0, mem.read_port16(port));
    Ok(())
}

/// OUT DX, AL (0xEE).
pub fn out_dx_al(cpu: &mut Cpu, mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    let port = cpu.read_reg16(2); // DX
    mem.write_port8(port, cpu.read_reg8(0));
    Ok(())
}

/// OUT DX, AX (0xEF).
pub fn out_dx_ax(cpu: &mut Cpu, mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    let port = cpu.read_reg16(2); // DX
    mem.write_port16(port, cpu.read_reg16(0));
    Ok(())
}
