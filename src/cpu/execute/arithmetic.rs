//! Arithmetic instruction handlers: ADD, ADC, SUB, SBB, CMP, INC, DEC, and
//! the Group 1/Group 3 opcode-extension dispatchers.
//!
//! ADD/OR/ADC/SBB/AND/SUB/XOR/CMP share one encoding shape (rm/reg, reg/rm,
//! acc/imm) and the decoder already resolves that shape into `dst`/`src`
//! operands, so one function per operation covers all three forms. OR/AND/
//! XOR live here too (not in `logic`) because Group 1 dispatches across all
//! eight on the same opcodes.

use crate::cpu::decode::{DecodedInstruction, OperandType};
use crate::cpu::Cpu;
use crate::error::{CoreError, TrapKind};
use crate::memory::Memory;

fn is_byte_op(instr: &DecodedInstruction) -> bool {
    matches!(instr.dst.op_type, OperandType::Reg8 | OperandType::Mem8)
}

/// Applies one of the eight ALU operations (encoded the way Group 1's reg
/// field encodes them: 0=ADD 1=OR 2=ADC 3=SBB 4=AND 5=SUB 6=XOR 7=CMP) to
/// an 8-bit pair, updates flags, and returns the result. CMP's result is
/// computed for flag purposes only; callers must not write it back.
fn alu8(cpu: &mut Cpu, op: u8, a: u8, b: u8) -> u8 {
    match op {
        0 => {
            let (r, cf) = a.overflowing_add(b);
            cpu.clear_of_cf_af();
            cpu.set_flag(Cpu::CF, cf);
            cpu.set_add8_of_af(a, b, r);
            cpu.set_zsp8(r);
            r
        }
        1 => {
            let r = a | b;
            cpu.clear_of_cf_af();
            cpu.set_zsp8(r);
            r
        }
        2 => {
            let cin = cpu.get_flag(Cpu::CF) as u16;
            let sum = a as u16 + b as u16 + cin;
            let r = sum as u8;
            cpu.clear_of_cf_af();
            cpu.set_flag(Cpu::CF, sum > 0xFF);
            cpu.set_adc8_of_af(a, b, cin as u8, r);
            cpu.set_zsp8(r);
            r
        }
        3 => {
            let bin = cpu.get_flag(Cpu::CF) as i16;
            let diff = a as i16 - b as i16 - bin;
            let r = diff as u8;
            cpu.clear_of_cf_af();
            cpu.set_flag(Cpu::CF, diff < 0);
            cpu.set_sbb8_of_af(a, b, bin as u8, r);
            cpu.set_zsp8(r);
            r
        }
        4 => {
            let r = a & b;
            cpu.clear_of_cf_af();
            cpu.set_zsp8(r);
            r
        }
        5 | 7 => {
            let (r, borrow) = a.overflowing_sub(b);
            cpu.clear_of_cf_af();
            cpu.set_flag(Cpu::CF, borrow);
            cpu.set_sub8_of_af(a, b, r);
            cpu.set_zsp8(r);
            r
        }
        6 => {
            let r = a ^ b;
            cpu.clear_of_cf_af();
            cpu.set_zsp8(r);
            r
        }
        _ => unreachable!("reg field is masked to 3 bits"),
    }
}

/// 16-bit counterpart of [`alu8`].
fn alu16(cpu: &mut Cpu, op: u8, a: u16, b: u16) -> u16 {
    match op {
        0 => {
            let (r, cf) = a.overflowing_add(b);
            cpu.clear_of_cf_af();
            cpu.set_flag(Cpu::CF, cf);
            cpu.set_add16_of_af(a, b, r);
            cpu.set_zsp16(r);
            r
        }
        1 => {
            let r = a | b;
            cpu.clear_of_cf_af();
            cpu.set_zsp16(r);
            r
        }
        2 => {
            let cin = cpu.get_flag(Cpu::CF) as u32;
            let sum = a as u32 + b as u32 + cin;
            let r = sum as u16;
            cpu.clear_of_cf_af();
            cpu.set_flag(Cpu::CF, sum > 0xFFFF);
            cpu.set_adc16_of_af(a, b, cin as u16, r);
            cpu.set_zsp16(r);
            r
        }
        3 => {
            let bin = cpu.get_flag(Cpu::CF) as i32;
            let diff = a as i32 - b as i32 - bin;
            let r = diff as u16;
            cpu.clear_of_cf_af();
            cpu.set_flag(Cpu::CF, diff < 0);
            cpu.set_sbb16_of_af(a, b, bin as u16, r);
            cpu.set_zsp16(r);
            r
        }
        4 => {
            let r = a & b;
            cpu.clear_of_cf_af();
            cpu.set_zsp16(r);
            r
        }
        5 | 7 => {
            let (r, borrow) = a.overflowing_sub(b);
            cpu.clear_of_cf_af();
            cpu.set_flag(Cpu::CF, borrow);
            cpu.set_sub16_of_af(a, b, r);
            cpu.set_zsp16(r);
            r
        }
        6 => {
            let r = a ^ b;
            cpu.clear_of_cf_af();
            cpu.set_zsp16(r);
            r
        }
        _ => unreachable!("reg field is masked to 3 bits"),
    }
}

fn exec_alu(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction, op: u8) {
    if is_byte_op(instr) {
        let a = cpu.read_operand(mem, &instr.dst) as u8;
        let b = cpu.read_operand(mem, &instr.src) as u8;
        let r = alu8(cpu, op, a, b);
        if op != 7 {
            cpu.write_operand(mem, &instr.dst, r as u16);
        }
    } else {
        let a = cpu.read_operand(mem, &instr.dst);
        let b = cpu.read_operand(mem, &instr.src);
        let r = alu16(cpu, op, a, b);
        if op != 7 {
            cpu.write_operand(mem, &instr.dst, r);
        }
    }
}

macro_rules! alu_handler {
    ($name:ident, $op:expr) => {
        pub fn $name(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
            exec_alu(cpu, mem, instr, $op);
            Ok(())
        }
    };
}

alu_handler!(add, 0);
alu_handler!(or, 1);
alu_handler!(adc, 2);
alu_handler!(sbb, 3);
alu_handler!(and, 4);
alu_handler!(sub, 5);
alu_handler!(xor, 6);
alu_handler!(cmp, 7);

// Group 1 (0x80-0x83, r/m with imm8/16) needs no handlers of its own:
// `exec_alu` reads `dst`/`src` generically regardless of whether `src` came
// from a register/rm operand or an immediate, so the decoder just points
// each ModR/M reg value at the same `add`/`or`/.../`cmp` functions above.

/// INC r16 (0x40-0x47) and INC r/m8/16 (Group FE/FF, reg=0).
pub fn inc(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    if is_byte_op(instr) {
        let a = cpu.read_operand(mem, &instr.dst) as u8;
        let r = a.wrapping_add(1);
        cpu.write_operand(mem, &instr.dst, r as u16);
        cpu.set_zsp8(r);
        cpu.set_inc8_of_af(a, r);
    } else {
        let a = cpu.read_operand(mem, &instr.dst);
        let r = a.wrapping_add(1);
        cpu.write_operand(mem, &instr.dst, r);
        cpu.set_zsp16(r);
        cpu.set_inc16_of_af(a, r);
    }
    Ok(())
}

/// DEC r16 (0x48-0x4F) and DEC r/m8/16 (Group FE/FF, reg=1).
pub fn dec(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    if is_byte_op(instr) {
        let a = cpu.read_operand(mem, &instr.dst) as u8;
        let r = a.wrapping_sub(1);
        cpu.write_operand(mem, &instr.dst, r as u16);
        cpu.set_zsp8(r);
        cpu.set_dec8_of_af(a, r);
    } else {
        let a = cpu.read_operand(mem, &instr.dst);
        let r = a.wrapping_sub(1);
        cpu.write_operand(mem, &instr.dst, r);
        cpu.set_zsp16(r);
        cpu.set_dec16_of_af(a, r);
    }
    Ok(())
}

// Group 3 (0xF6/0xF7): TEST/NOT/NEG/MUL/IMUL/DIV/IDIV on r/m8 or r/m16. The
// decoder resolves the ModR/M reg field into a choice of handler (like
// Group 1, not like the shift groups) because each sub-operation has a
// different operand shape: TEST alone carries an immediate `src`.

/// TEST r/m, imm (Group 3, reg=0).
pub fn test_rm_imm(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    if is_byte_op(instr) {
        let a = cpu.read_operand(mem, &instr.dst) as u8;
        let imm = cpu.read_operand(mem, &instr.src) as u8;
        let r = a & imm;
        cpu.clear_of_cf_af();
        cpu.set_zsp8(r);
    } else {
        let a = cpu.read_operand(mem, &instr.dst);
        let imm = cpu.read_operand(mem, &instr.src);
        let r = a & imm;
        cpu.clear_of_cf_af();
        cpu.set_zsp16(r);
    }
    Ok(())
}

/// NOT r/m (Group 3, reg=2). No flags affected.
pub fn not_rm(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    if is_byte_op(instr) {
        let a = cpu.read_operand(mem, &instr.dst) as u8;
        cpu.write_operand(mem, &instr.dst, !a as u16);
    } else {
        let a = cpu.read_operand(mem, &instr.dst);
        cpu.write_operand(mem, &instr.dst, !a);
    }
    Ok(())
}

/// NEG r/m (Group 3, reg=3). Equivalent to 0 - operand; CF is set unless
/// the operand was zero.
pub fn neg_rm(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    if is_byte_op(instr) {
        let a = cpu.read_operand(mem, &instr.dst) as u8;
        let r = alu8(cpu, 5, 0, a);
        cpu.write_operand(mem, &instr.dst, r as u16);
        cpu.set_flag(Cpu::CF, a != 0);
    } else {
        let a = cpu.read_operand(mem, &instr.dst);
        let r = alu16(cpu, 5, 0, a);
        cpu.write_operand(mem, &instr.dst, r);
        cpu.set_flag(Cpu::CF, a != 0);
    }
    Ok(())
}

/// MUL r/m (Group 3, reg=4) - unsigned multiply against AL/AX. CF and OF
/// are set when the upper half of the product is non-zero; SF/ZF/AF/PF are
/// undefined (left untouched, matching the real chip's lack of a defined
/// value for them).
pub fn mul_rm(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    mul(cpu, mem, instr, is_byte_op(instr));
    Ok(())
}

/// IMUL r/m (Group 3, reg=5) - signed multiply against AL/AX.
pub fn imul_rm(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    imul(cpu, mem, instr, is_byte_op(instr));
    Ok(())
}

/// DIV r/m (Group 3, reg=6) - unsigned divide.
pub fn div_rm(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    div(cpu, mem, instr, is_byte_op(instr))
}

/// IDIV r/m (Group 3, reg=7) - signed divide.
pub fn idiv_rm(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    idiv(cpu, mem, instr, is_byte_op(instr))
}

fn mul(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction, is_byte: bool) {
    if is_byte {
        let a = cpu.read_reg8(0) as u16; // AL
        let b = cpu.read_operand(mem, &instr.dst) as u16;
        let result = a * b;
        cpu.write_reg16(0, result); // AX
        let overflow = result > 0xFF;
        cpu.set_flag(Cpu::CF, overflow);
        cpu.set_flag(Cpu::OF, overflow);
    } else {
        let a = cpu.read_reg16(0) as u32; // AX
        let b = cpu.read_operand(mem, &instr.dst) as u32;
        let result = a * b;
        cpu.write_reg16(0, result as u16); // AX = low
        cpu.write_reg16(2, (result >> 16) as u16); // DX = high
        let overflow = result > 0xFFFF;
        cpu.set_flag(Cpu::CF, overflow);
        cpu.set_flag(Cpu::OF, overflow);
    }
    // ZF/SF/PF are undefined by the ISA after MUL/IMUL; this core zeroes
    // them rather than leaving stale state from the prior instruction.
    cpu.set_flag(Cpu::ZF, false);
    cpu.set_flag(Cpu::SF, false);
    cpu.set_flag(Cpu::PF, false);
}

/// IMUL r/m - signed multiply against AL/AX. CF/OF are set when the result
/// does not fit in the lower half sign-extended.
fn imul(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction, is_byte: bool) {
    if is_byte {
        let a = cpu.read_reg8(0) as i8 as i16;
        let b = cpu.read_operand(mem, &instr.dst) as i8 as i16;
        let result = a * b;
        cpu.write_reg16(0, result as u16);
        let overflow = result != (result as i8) as i16;
        cpu.set_flag(Cpu::CF, overflow);
        cpu.set_flag(Cpu::OF, overflow);
    } else {
        let a = cpu.read_reg16(0) as i16 as i32;
        let b = cpu.read_operand(mem, &instr.dst) as i16 as i32;
        let result = a * b;
        cpu.write_reg16(0, result as u16);
        cpu.write_reg16(2, (result >> 16) as u16);
        let overflow = result != (result as i16) as i32;
        cpu.set_flag(Cpu::CF, overflow);
        cpu.set_flag(Cpu::OF, overflow);
    }
    cpu.set_flag(Cpu::ZF, false);
    cpu.set_flag(Cpu::SF, false);
    cpu.set_flag(Cpu::PF, false);
}

/// DIV r/m - unsigned divide AX (or DX:AX) by the operand. Traps with
/// `TrapKind::DivideByZero` on a zero divisor and `DivideOverflow` when the
/// quotient cannot fit in AL/AX.
fn div(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction, is_byte: bool) -> Result<(), CoreError> {
    if is_byte {
        let dividend = cpu.read_reg16(0) as u32; // AX
        let divisor = cpu.read_operand(mem, &instr.dst) as u32;
        if divisor == 0 {
            return Err(CoreError::ArithmeticTrap(TrapKind::DivideByZero));
        }
        let quotient = dividend / divisor;
        if quotient > 0xFF {
            return Err(CoreError::ArithmeticTrap(TrapKind::DivideOverflow));
        }
        let remainder = dividend % divisor;
        cpu.write_reg8(0, quotient as u8); // AL
        cpu.write_reg8(4, remainder as u8); // AH
        cpu.set_flag(Cpu::CF, false);
        cpu.set_flag(Cpu::OF, false);
        cpu.set_zsp8(quotient as u8);
    } else {
        let dividend = ((cpu.read_reg16(2) as u32) << 16) | cpu.read_reg16(0) as u32; // DX:AX
        let divisor = cpu.read_operand(mem, &instr.dst) as u32;
        if divisor == 0 {
            return Err(CoreError::ArithmeticTrap(TrapKind::DivideByZero));
        }
        let quotient = dividend / divisor;
        if quotient > 0xFFFF {
            return Err(CoreError::ArithmeticTrap(TrapKind::DivideOverflow));
        }
        let remainder = dividend % divisor;
        cpu.write_reg16(0, quotient as u16); // AX
        cpu.write_reg16(2, remainder as u16); // DX
        cpu.set_flag(Cpu::CF, false);
        cpu.set_flag(Cpu::OF, false);
        cpu.set_zsp16(quotient as u16);
    }
    Ok(())
}

/// IDIV r/m - signed divide AX (or DX:AX) by the operand.
fn idiv(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction, is_byte: bool) -> Result<(), CoreError> {
    if is_byte {
        let dividend = cpu.read_reg16(0) as i16 as i32; // AX, sign-extended
        let divisor = cpu.read_operand(mem, &instr.dst) as i8 as i32;
        if divisor == 0 {
            return Err(CoreError::ArithmeticTrap(TrapKind::DivideByZero));
        }
        let quotient = dividend / divisor;
        if quotient > i8::MAX as i32 || quotient < i8::MIN as i32 {
            return Err(CoreError::ArithmeticTrap(TrapKind::DivideOverflow));
        }
        let remainder = dividend % divisor;
        cpu.write_reg8(0, quotient as i8 as u8);
        cpu.write_reg8(4, remainder as i8 as u8);
        cpu.set_flag(Cpu::CF, false);
        cpu.set_flag(Cpu::OF, false);
        cpu.set_zsp8(quotient as i8 as u8);
    } else {
        let dividend = (((cpu.read_reg16(2) as u32) << 16) | cpu.read_reg16(0) as u32) as i64;
        // Sign-extend the 32-bit DX:AX value.
        let dividend = (dividend as i32) as i64;
        let divisor = cpu.read_operand(mem, &instr.dst) as i16 as i64;
        if divisor == 0 {
            return Err(CoreError::ArithmeticTrap(TrapKind::DivideByZero));
        }
        let quotient = dividend / divisor;
        if quotient > i16::MAX as i64 || quotient < i16::MIN as i64 {
            return Err(CoreError::ArithmeticTrap(TrapKind::DivideOverflow));
        }
        let remainder = dividend % divisor;
        cpu.write_reg16(0, quotient as i16 as u16);
        cpu.write_reg16(2, remainder as i16 as u16);
        cpu.set_flag(Cpu::CF, false);
        cpu.set_flag(Cpu::OF, false);
        cpu.set_zsp16(quotient as i16 as u16);
    }
    Ok(())
}

/// AAA (0x37) - ASCII Adjust after Addition.
pub fn aaa(cpu: &mut Cpu, _mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    let al = cpu.read_reg8(0);
    let af = cpu.get_flag(Cpu::AF);
    if (al & 0x0F) > 9 || af {
        let ah = cpu.read_reg8(4);
        cpu.write_reg8(0, al.wrapping_add(6) & 0x0F);
        cpu.write_reg8(4, ah.wrapping_add(1));
        cpu.set_flag(Cpu::AF, true);
        cpu.set_flag(Cpu::CF, true);
    } else {
        cpu.write_reg8(0, al & 0x0F);
        cpu.set_flag(Cpu::AF, false);
        cpu.set_flag(Cpu::CF, false);
    }
    Ok(())
}

/// AAS (0x3F) - ASCII Adjust after Subtraction.
pub fn aas(cpu: &mut Cpu, _mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    let al = cpu.read_reg8(0);
    let af = cpu.get_flag(Cpu::AF);
    if (al & 0x0F) > 9 || af {
        let ah = cpu.read_reg8(4);
        cpu.write_reg8(0, al.wrapping_sub(6) & 0x0F);
        cpu.write_reg8(4, ah.wrapping_sub(1));
        cpu.set_flag(Cpu::AF, true);
        cpu.set_flag(Cpu::CF, true);
    } else {
        cpu.write_reg8(0, al & 0x0F);
        cpu.set_flag(Cpu::AF, false);
        cpu.set_flag(Cpu::CF, false);
    }
    Ok(())
}

/// DAA (0x27) - Decimal Adjust after Addition (packed BCD).
pub fn daa(cpu: &mut Cpu, _mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    let mut al = cpu.read_reg8(0);
    let mut cf = cpu.get_flag(Cpu::CF);
    let af = cpu.get_flag(Cpu::AF);
    let old_al = al;

    if (al & 0x0F) > 9 || af {
        let (r, carry) = al.overflowing_add(6);
        al = r;
        cf = cf || carry;
        cpu.set_flag(Cpu::AF, true);
    } else {
        cpu.set_flag(Cpu::AF, false);
    }
    if old_al > 0x99 || cf {
        al = al.wrapping_add(0x60);
        cf = true;
    }

    cpu.write_reg8(0, al);
    cpu.set_flag(Cpu::CF, cf);
    cpu.set_zsp8(al);
    Ok(())
}

/// DAS (0x2F) - Decimal Adjust after Subtraction.
pub fn das(cpu: &mut Cpu, _mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    let mut al = cpu.read_reg8(0);
    let mut cf = cpu.get_flag(Cpu::CF);
    let af = cpu.get_flag(Cpu::AF);
    let old_al = al;

    if (al & 0x0F) > 9 || af {
        al = al.wrapping_sub(6);
        cpu.set_flag(Cpu::AF, true);
    } else {
        cpu.set_flag(Cpu::AF, false);
    }
    if old_al > 0x99 || cf {
        al = al.wrapping_sub(0x60);
        cf = true;
    }

    cpu.write_reg8(0, al);
    cpu.set_flag(Cpu::CF, cf);
    cpu.set_zsp8(al);
    Ok(())
}

/// AAM (0xD4 0x0A) - ASCII Adjust after Multiply; divides AL by 10 (the
/// imm8 operand the decoder resolves) and splits quotient/remainder into
/// AH/AL.
pub fn aam(cpu: &mut Cpu, _mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    let base = instr.src.value as u8;
    if base == 0 {
        return Err(CoreError::ArithmeticTrap(TrapKind::DivideByZero));
    }
    let al = cpu.read_reg8(0);
    cpu.write_reg8(4, al / base);
    cpu.write_reg8(0, al % base);
    cpu.set_zsp8(cpu.read_reg8(0));
    Ok(())
}

/// AAD (0xD5 0x0A) - ASCII Adjust before Division; combines AH:AL as a
/// base-10 digit pair into AL and zeroes AH.
pub fn aad(cpu: &mut Cpu, _mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    let base = instr.src.value as u8;
    let al = cpu.read_reg8(0);
    let ah = cpu.read_reg8(4);
    let result = ah.wrapping_mul(base).wrapping_add(al);
    cpu.write_reg8(0, result);
    cpu.write_reg8(4, 0);
    cpu.set_zsp8(result);
    Ok(())
}
