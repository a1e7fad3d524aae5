//! Data transfer handlers: MOV (all forms), XCHG, LEA, LDS/LES, XLAT,
//! LAHF/SAHF, CBW/CWD.
//!
//! MOV's many encodings (reg/rm, rm/reg, reg/imm, rm/imm, moffs, segment
//! register) all reduce to "read src, write dst" once the decoder has
//! resolved operands, including moffs forms and segment-register forms,
//! which `Operand`/`read_operand`/`write_operand` already handle without
//! special cases here.

use crate::cpu::decode::{DecodedInstruction, OperandType};
use crate::cpu::state::SEG_DS;
use crate::cpu::Cpu;
use crate::error::CoreError;
use crate::memory::Memory;

/// MOV, any register/memory/immediate/moffs/segreg form.
pub fn mov(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    let value = cpu.read_operand(mem, &instr.src);
    cpu.write_operand(mem, &instr.dst, value);
    Ok(())
}

/// XCHG r/m, r (0x86/0x87).
pub fn xchg_rm_r(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    let dst_value = cpu.read_operand(mem, &instr.dst);
    let src_value = cpu.read_operand(mem, &instr.src);
    cpu.write_operand(mem, &instr.dst, src_value);
    cpu.write_operand(mem, &instr.src, dst_value);
    Ok(())
}

/// XCHG AX, r16 (0x91-0x97; 0x90 is NOP, handled separately).
pub fn xchg_ax_r16(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    let ax_value = cpu.read_reg16(0);
    let r_value = cpu.read_operand(mem, &instr.dst);
    cpu.write_reg16(0, r_value);
    cpu.write_operand(mem, &instr.dst, ax_value);
    Ok(())
}

/// LEA r16, m (0x8D). Loads the offset of a memory operand without
/// touching memory.
pub fn lea(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    debug_assert!(matches!(instr.src.op_type, OperandType::Mem8 | OperandType::Mem16));
    let ea = cpu.effective_address_of(&instr.src);
    cpu.write_operand(mem, &instr.dst, ea);
    Ok(())
}

/// LDS r16, m16:16 (0xC5): loads the offset into the register operand and
/// the segment into DS.
pub fn lds(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    let (seg_idx, offset) = cpu.calculate_ea_from_operand(&instr.src);
    let seg = cpu.read_seg(seg_idx);
    let new_offset = mem.read16(seg, offset);
    let new_seg = mem.read16(seg, offset.wrapping_add(2));
    cpu.write_operand(mem, &instr.dst, new_offset);
    cpu.write_seg(SEG_DS, new_seg);
    Ok(())
}

/// LES r16, m16:16 (0xC4): loads the offset into the register operand and
/// the segment into ES.
pub fn les(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    let (seg_idx, offset) = cpu.calculate_ea_from_operand(&instr.src);
    let seg = cpu.read_seg(seg_idx);
    let new_offset = mem.read16(seg, offset);
    let new_seg = mem.read16(seg, offset.wrapping_add(2));
    cpu.write_operand(mem, &instr.dst, new_offset);
    cpu.write_seg(crate::cpu::state::SEG_ES, new_seg);
    Ok(())
}

/// XLAT (0xD7): AL = [DS:BX + AL], the classic byte-translate-table idiom.
pub fn xlat(cpu: &mut Cpu, mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    let seg_idx = cpu.segment_override.unwrap_or(SEG_DS);
    let seg = cpu.read_seg(seg_idx);
    let bx = cpu.read_reg16(3);
    let al = cpu.read_reg8(0);
    let offset = bx.wrapping_add(al as u16);
    let value = mem.read8(seg, offset);
    cpu.write_reg8(0, value);
    Ok(())
}

/// LAHF (0x9F): AH = low byte of FLAGS.
pub fn lahf(cpu: &mut Cpu, _mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    cpu.write_reg8(4, cpu.get_flags() as u8);
    Ok(())
}

/// SAHF (0x9E): low byte of FLAGS = AH.
pub fn sahf(cpu: &mut Cpu, _mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    let ah = cpu.read_reg8(4);
    let flags = (cpu.get_flags() & 0xFF00) | ah as u16;
    cpu.set_flags(flags);
    Ok(())
}

/// CBW (0x98): sign-extend AL into AH.
pub fn cbw(cpu: &mut Cpu, _mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    let al = cpu.read_reg8(0) as i8;
    cpu.write_reg16(0, al as i16 as u16);
    Ok(())
}

/// CWD (0x99): sign-extend AX into DX:AX.
pub fn cwd(cpu: &mut Cpu, _mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    let ax = cpu.read_reg16(0) as i16;
    let dx = if ax < 0 { 0xFFFFu16 } else { 0 };
    cpu.write_reg16(2, dx);
    Ok(())
}
