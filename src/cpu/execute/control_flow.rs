//! Control flow handlers: JMP, CALL, RET, the full Jcc table, LOOP family,
//! and software interrupts (INT/INTO/IRET/INT3).

use crate::cpu::decode::{DecodedInstruction, OperandType};
use crate::cpu::state::SEG_CS;
use crate::cpu::Cpu;
use crate::error::CoreError;
use crate::memory::Memory;

use super::stack::{pop_word, push_word};

fn rel_jump(cpu: &mut Cpu, instr: &DecodedInstruction) {
    let offset = instr.src.value as i16;
    cpu.ip = cpu.ip.wrapping_add(offset as u16);
}

/// JMP short, rel8 (0xEB).
pub fn jmp_short(cpu: &mut Cpu, _mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    rel_jump(cpu, instr);
    Ok(())
}

/// JMP near, rel16 (0xE9).
pub fn jmp_near(cpu: &mut Cpu, _mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    rel_jump(cpu, instr);
    Ok(())
}

macro_rules! jcc {
    ($name:ident, $cond:expr) => {
        pub fn $name(cpu: &mut Cpu, _mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
            if $cond(cpu) {
                rel_jump(cpu, instr);
            }
            Ok(())
        }
    };
}

jcc!(jo, |c: &Cpu| c.get_flag(Cpu::OF));
jcc!(jno, |c: &Cpu| !c.get_flag(Cpu::OF));
jcc!(jc, |c: &Cpu| c.get_flag(Cpu::CF));
jcc!(jnc, |c: &Cpu| !c.get_flag(Cpu::CF));
jcc!(jz, |c: &Cpu| c.get_flag(Cpu::ZF));
jcc!(jnz, |c: &Cpu| !c.get_flag(Cpu::ZF));
jcc!(jbe, |c: &Cpu| c.get_flag(Cpu::CF) || c.get_flag(Cpu::ZF));
jcc!(ja, |c: &Cpu| !c.get_flag(Cpu::CF) && !c.get_flag(Cpu::ZF));
jcc!(js, |c: &Cpu| c.get_flag(Cpu::SF));
jcc!(jns, |c: &Cpu| !c.get_flag(Cpu::SF));
jcc!(jp, |c: &Cpu| c.get_flag(Cpu::PF));
jcc!(jnp, |c: &Cpu| !c.get_flag(Cpu::PF));
jcc!(jl, |c: &Cpu| c.get_flag(Cpu::SF) != c.get_flag(Cpu::OF));
jcc!(jge, |c: &Cpu| c.get_flag(Cpu::SF) == c.get_flag(Cpu::OF));
jcc!(jle, |c: &Cpu| c.get_flag(Cpu::ZF) || (c.get_flag(Cpu::SF) != c.get_flag(Cpu::OF)));
jcc!(jg, |c: &Cpu| !c.get_flag(Cpu::ZF) && (c.get_flag(Cpu::SF) == c.get_flag(Cpu::OF)));

/// LOOP (0xE2): CX -= 1, jump if CX != 0.
pub fn loop_(cpu: &mut Cpu, _mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    let cx = cpu.read_reg16(1).wrapping_sub(1);
    cpu.write_reg16(1, cx);
    if cx != 0 {
        rel_jump(cpu, instr);
    }
    Ok(())
}

/// LOOPE/LOOPZ (0xE1): CX -= 1, jump if CX != 0 and ZF = 1.
pub fn loope(cpu: &mut Cpu, _mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    let cx = cpu.read_reg16(1).wrapping_sub(1);
    cpu.write_reg16(1, cx);
    if cx != 0 && cpu.get_flag(Cpu::ZF) {
        rel_jump(cpu, instr);
    }
    Ok(())
}

/// LOOPNE/LOOPNZ (0xE0): CX -= 1, jump if CX != 0 and ZF = 0.
pub fn loopne(cpu: &mut Cpu, _mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    let cx = cpu.read_reg16(1).wrapping_sub(1);
    cpu.write_reg16(1, cx);
    if cx != 0 && !cpu.get_flag(Cpu::ZF) {
        rel_jump(cpu, instr);
    }
    Ok(())
}

/// JCXZ (0xE3): jump if CX = 0. Does not touch CX.
pub fn jcxz(cpu: &mut Cpu, _mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    if cpu.read_reg16(1) == 0 {
        rel_jump(cpu, instr);
    }
    Ok(())
}

/// CALL near, rel16 (0xE8).
pub fn call_near(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    let return_addr = cpu.ip;
    push_word(cpu, mem, return_addr);
    rel_jump(cpu, instr);
    Ok(())
}

/// CALL far direct, ptr16:16 (0x9A). The decoder places the target offset
/// in `src` and the target segment in `dst`.
pub fn call_far(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    let return_cs = cpu.read_seg(SEG_CS);
    let return_ip = cpu.ip;
    push_word(cpu, mem, return_cs);
    push_word(cpu, mem, return_ip);

    cpu.write_seg(SEG_CS, instr.dst.value);
    cpu.ip = instr.src.value;
    Ok(())
}

/// JMP far direct, ptr16:16 (0xEA). Like `call_far`, the decoder places the
/// target offset in `src` and the target segment in `dst`.
pub fn jmp_far(cpu: &mut Cpu, _mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    cpu.write_seg(SEG_CS, instr.dst.value);
    cpu.ip = instr.src.value;
    Ok(())
}

/// CALL r/m16, near indirect (Group FF, reg=2).
pub fn call_rm16(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    let target = cpu.read_operand(mem, &instr.dst);
    let return_addr = cpu.ip;
    push_word(cpu, mem, return_addr);
    cpu.ip = target;
    Ok(())
}

fn read_far_pointer(cpu: &Cpu, mem: &Memory, operand: &crate::cpu::decode::Operand) -> (u16, u16) {
    debug_assert_eq!(operand.op_type, OperandType::Mem16);
    let (seg_idx, offset) = cpu.calculate_ea_from_operand(operand);
    let seg = cpu.read_seg(seg_idx);
    let new_ip = mem.read16(seg, offset);
    let new_cs = mem.read16(seg, offset.wrapping_add(2));
    (new_cs, new_ip)
}

/// CALL m16:16, far indirect (Group FF, reg=3).
pub fn call_m16_16(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    let (new_cs, new_ip) = read_far_pointer(cpu, mem, &instr.dst);

    let return_cs = cpu.read_seg(SEG_CS);
    let return_ip = cpu.ip;
    push_word(cpu, mem, return_cs);
    push_word(cpu, mem, return_ip);

    cpu.write_seg(SEG_CS, new_cs);
    cpu.ip = new_ip;
    Ok(())
}

/// JMP r/m16, near indirect (Group FF, reg=4).
pub fn jmp_rm16(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    cpu.ip = cpu.read_operand(mem, &instr.dst);
    Ok(())
}

/// JMP m16:16, far indirect (Group FF, reg=5).
pub fn jmp_m16_16(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    let (new_cs, new_ip) = read_far_pointer(cpu, mem, &instr.dst);
    cpu.write_seg(SEG_CS, new_cs);
    cpu.ip = new_ip;
    Ok(())
}

/// RET near (0xC3).
pub fn ret_near(cpu: &mut Cpu, mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    cpu.ip = pop_word(cpu, mem);
    Ok(())
}

/// RET near, imm16 (0xC2): pops IP then releases `imm16` bytes of
/// arguments from the stack.
pub fn ret_near_imm(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    cpu.ip = pop_word(cpu, mem);
    let sp = cpu.read_reg16(4).wrapping_add(instr.src.value);
    cpu.write_reg16(4, sp);
    Ok(())
}

/// RETF (0xCB).
pub fn ret_far(cpu: &mut Cpu, mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    cpu.ip = pop_word(cpu, mem);
    let new_cs = pop_word(cpu, mem);
    cpu.write_seg(SEG_CS, new_cs);
    Ok(())
}

/// RETF imm16 (0xCA).
pub fn ret_far_imm(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    cpu.ip = pop_word(cpu, mem);
    let new_cs = pop_word(cpu, mem);
    cpu.write_seg(SEG_CS, new_cs);
    let sp = cpu.read_reg16(4).wrapping_add(instr.src.value);
    cpu.write_reg16(4, sp);
    Ok(())
}

/// INT3 (0xCC) - breakpoint interrupt; shares the vector-3 dispatch path
/// with the two-byte INT imm8 form.
pub fn int3(cpu: &mut Cpu, mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    cpu.enter_interrupt(mem, 3);
    Ok(())
}

/// INT imm8 (0xCD).
pub fn int_imm8(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    let vector = instr.src.value as u8;
    cpu.enter_interrupt(mem, vector);
    Ok(())
}

/// INTO (0xCE): INT 4 taken only if OF is set.
pub fn into(cpu: &mut Cpu, mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    if cpu.get_flag(Cpu::OF) {
        cpu.enter_interrupt(mem, 4);
    }
    Ok(())
}

/// IRET (0xCF): pop IP, CS, and FLAGS, in that order (reverse of how
/// `Cpu::enter_interrupt` pushes them).
pub fn iret(cpu: &mut Cpu, mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    cpu.ip = pop_word(cpu, mem);
    let new_cs = pop_word(cpu, mem);
    cpu.write_seg(SEG_CS, new_cs);
    let flags = pop_word(cpu, mem);
    cpu.set_flags(flags);
    Ok(())
}
