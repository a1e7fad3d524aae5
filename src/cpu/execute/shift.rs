//! Shift and rotate instruction handlers (SHL, SHR, SAR, ROL, ROR, RCL, RCR).
//!
//! Group 2 has three count sources, all sharing the same eight operations:
//! count = 1 (0xD0/0xD1), count = CL (0xD2/0xD3), and an immediate count
//! byte (0xC0/0xC1). None of the three masks the count to register width
//! before calling into `rol`/`ror`/.../`sar` below; those functions already
//! reduce the count modulo the operand width (or modulo width+1 for the
//! through-carry rotates) themselves.

use crate::cpu::decode::{DecodedInstruction, OperandType};
use crate::cpu::Cpu;
use crate::error::CoreError;
use crate::memory::Memory;

fn is_byte_op(instr: &DecodedInstruction) -> bool {
    matches!(instr.dst.op_type, OperandType::Reg8 | OperandType::Mem8)
}

fn set_zsp(cpu: &mut Cpu, result: u16, is_byte: bool) {
    if is_byte {
        cpu.set_zsp8(result as u8);
    } else {
        cpu.set_zsp16(result);
    }
}

/// ROL - rotate left. CF takes the bit rotated out; OF is only meaningful
/// for count == 1, where it reflects whether the sign bit changed.
pub fn rol(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction, count: u8) {
    let is_byte = is_byte_op(instr);
    let value = cpu.read_operand(mem, &instr.dst);
    let width = if is_byte { 8 } else { 16 };
    let count = count % width;
    if count == 0 {
        return;
    }

    let result = if is_byte {
        (value as u8).rotate_left(count as u32) as u16
    } else {
        value.rotate_left(count as u32)
    };
    let cf = result & 1 != 0;

    cpu.write_operand(mem, &instr.dst, result);
    cpu.set_flag(Cpu::CF, cf);
    if count == 1 {
        let msb = if is_byte { result & 0x80 != 0 } else { result & 0x8000 != 0 };
        cpu.set_flag(Cpu::OF, msb != cf);
    }
}

/// ROR - rotate right.
pub fn ror(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction, count: u8) {
    let is_byte = is_byte_op(instr);
    let value = cpu.read_operand(mem, &instr.dst);
    let width = if is_byte { 8 } else { 16 };
    let count = count % width;
    if count == 0 {
        return;
    }

    let result = if is_byte {
        (value as u8).rotate_right(count as u32) as u16
    } else {
        value.rotate_right(count as u32)
    };
    let msb = if is_byte { result & 0x80 != 0 } else { result & 0x8000 != 0 };
    let cf = msb;

    cpu.write_operand(mem, &instr.dst, result);
    cpu.set_flag(Cpu::CF, cf);
    if count == 1 {
        let next_msb = if is_byte { result & 0x40 != 0 } else { result & 0x4000 != 0 };
        cpu.set_flag(Cpu::OF, msb != next_msb);
    }
}

/// RCL - rotate left through carry; CF participates as an extra bit.
pub fn rcl(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction, count: u8) {
    let is_byte = is_byte_op(instr);
    let value = cpu.read_operand(mem, &instr.dst);
    let modulus = if is_byte { 9 } else { 17 };
    let count = count % modulus;
    if count == 0 {
        return;
    }

    let mut cf = cpu.get_flag(Cpu::CF);
    let mut result = value;
    for _ in 0..count {
        let new_cf = if is_byte { result & 0x80 != 0 } else { result & 0x8000 != 0 };
        result = if is_byte {
            ((result << 1) & 0xFF) | (cf as u16)
        } else {
            (result << 1) | (cf as u16)
        };
        cf = new_cf;
    }

    cpu.write_operand(mem, &instr.dst, result);
    cpu.set_flag(Cpu::CF, cf);
    if count == 1 {
        let msb = if is_byte { result & 0x80 != 0 } else { result & 0x8000 != 0 };
        cpu.set_flag(Cpu::OF, msb != cf);
    }
}

/// RCR - rotate right through carry.
pub fn rcr(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction, count: u8) {
    let is_byte = is_byte_op(instr);
    let value = cpu.read_operand(mem, &instr.dst);
    let modulus = if is_byte { 9 } else { 17 };
    let count = count % modulus;
    if count == 0 {
        return;
    }

    let msb_before = if is_byte { value & 0x80 != 0 } else { value & 0x8000 != 0 };
    let mut cf = cpu.get_flag(Cpu::CF);
    let mut result = value;
    for _ in 0..count {
        let new_cf = result & 1 != 0;
        result = if is_byte {
            (result >> 1) | ((cf as u16) << 7)
        } else {
            (result >> 1) | ((cf as u16) << 15)
        };
        cf = new_cf;
    }

    cpu.write_operand(mem, &instr.dst, result);
    cpu.set_flag(Cpu::CF, cf);
    if count == 1 {
        let msb = if is_byte { result & 0x80 != 0 } else { result & 0x8000 != 0 };
        cpu.set_flag(Cpu::OF, msb != msb_before);
    }
}

/// SHL/SAL - shift left, zero-filled; CF takes the last bit shifted out.
pub fn shl(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction, count: u8) {
    if count == 0 {
        return;
    }
    let is_byte = is_byte_op(instr);
    let value = cpu.read_operand(mem, &instr.dst);
    let width = if is_byte { 8u32 } else { 16u32 };

    let cf = if (count as u32) <= width {
        (value >> (width - count as u32)) & 1 != 0
    } else {
        false
    };
    let result = if count as u32 >= width {
        0
    } else if is_byte {
        (value << count) & 0xFF
    } else {
        value << count
    };

    cpu.write_operand(mem, &instr.dst, result);
    set_zsp(cpu, result, is_byte);
    cpu.clear_of_cf_af();
    cpu.set_flag(Cpu::CF, cf);
    if count == 1 {
        let msb = if is_byte { result & 0x80 != 0 } else { result & 0x8000 != 0 };
        cpu.set_flag(Cpu::OF, msb != cf);
    }
}

/// SHR - logical shift right, zero-filled.
pub fn shr(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction, count: u8) {
    if count == 0 {
        return;
    }
    let is_byte = is_byte_op(instr);
    let value = cpu.read_operand(mem, &instr.dst);
    let width = if is_byte { 8u32 } else { 16u32 };
    let original_msb = if is_byte { value & 0x80 != 0 } else { value & 0x8000 != 0 };

    let cf = if (count as u32) <= width && count > 0 {
        (value >> (count as u32 - 1)) & 1 != 0
    } else {
        false
    };
    let result = if count as u32 >= width { 0 } else { value >> count };

    cpu.write_operand(mem, &instr.dst, result);
    set_zsp(cpu, result, is_byte);
    cpu.clear_of_cf_af();
    cpu.set_flag(Cpu::CF, cf);
    if count == 1 {
        cpu.set_flag(Cpu::OF, original_msb);
    }
}

/// SAR - arithmetic shift right, sign-extended.
pub fn sar(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction, count: u8) {
    if count == 0 {
        return;
    }
    let is_byte = is_byte_op(instr);
    let value = cpu.read_operand(mem, &instr.dst);

    let (result, cf) = if is_byte {
        let val = value as i8;
        let shift = count.min(8) as u32;
        let cf = if shift > 0 { ((val as u8) >> (shift - 1)) & 1 != 0 } else { false };
        let shifted = if shift >= 8 {
            if val < 0 { 0xFFu8 } else { 0 }
        } else {
            (val >> shift) as u8
        };
        (shifted as u16, cf)
    } else {
        let val = value as i16;
        let shift = count.min(16) as u32;
        let cf = if shift > 0 { ((val as u16) >> (shift - 1)) & 1 != 0 } else { false };
        let shifted = if shift >= 16 {
            if val < 0 { 0xFFFFu16 } else { 0 }
        } else {
            (val >> shift) as u16
        };
        (shifted, cf)
    };

    cpu.write_operand(mem, &instr.dst, result);
    set_zsp(cpu, result, is_byte);
    cpu.clear_of_cf_af();
    cpu.set_flag(Cpu::CF, cf);
    if count == 1 {
        cpu.set_flag(Cpu::OF, false);
    }
}

fn dispatch_group(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction, count: u8) {
    let operation = instr.reg;
    match operation {
        0 => rol(cpu, mem, instr, count),
        1 => ror(cpu, mem, instr, count),
        2 => rcl(cpu, mem, instr, count),
        3 => rcr(cpu, mem, instr, count),
        4 | 6 => shl(cpu, mem, instr, count), // SHL and SAL are the same operation
        5 => shr(cpu, mem, instr, count),
        7 => sar(cpu, mem, instr, count),
        _ => unreachable!("reg field is masked to 3 bits"),
    }
}

/// Group 2, count = 1 (0xD0 r/m8, 0xD1 r/m16). The reg field of the
/// ModR/M byte, stashed in `instr.src.value` by the decoder, selects the
/// operation.
pub fn group_shift_1(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    dispatch_group(cpu, mem, instr, 1);
    Ok(())
}

/// Group 2, count = CL (0xD2 r/m8, 0xD3 r/m16).
pub fn group_shift_cl(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    let count = cpu.read_reg8(1); // CL
    dispatch_group(cpu, mem, instr, count);
    Ok(())
}

/// Group 2, count = imm8 (0xC0 r/m8, 0xC1 r/m16). The decoder fetches the
/// count byte into `instr.src` and stashes the reg-field operation in
/// `instr.reg`, since this form needs both and `src` can't hold both at once.
pub fn group_shift_imm8(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    let count = instr.src.value as u8;
    dispatch_group(cpu, mem, instr, count);
    Ok(())
}
