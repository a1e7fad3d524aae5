//! TEST (0x84/0x85/0xA8/0xA9). AND/OR/XOR live in [`super::arithmetic`]
//! alongside the other Group 1 operations they share an encoding with.

use crate::cpu::decode::{DecodedInstruction, OperandType};
use crate::cpu::Cpu;
use crate::error::CoreError;
use crate::memory::Memory;

/// TEST r/m, reg (0x84/0x85) and TEST AL/AX, imm (0xA8/0xA9). Computes
/// `dst & src` for flags only; CF/OF are cleared and AF is left
/// undefined (cleared here, matching the other logical ops).
pub fn test(cpu: &mut Cpu, mem: &mut Memory, instr: &DecodedInstruction) -> Result<(), CoreError> {
    let is_byte = matches!(instr.dst.op_type, OperandType::Reg8 | OperandType::Mem8);
    if is_byte {
        let a = cpu.read_operand(mem, &instr.dst) as u8;
        let b = cpu.read_operand(mem, &instr.src) as u8;
        cpu.clear_of_cf_af();
        cpu.set_zsp8(a & b);
    } else {
        let a = cpu.read_operand(mem, &instr.dst);
        let b = cpu.read_operand(mem, &instr.src);
        cpu.clear_of_cf_af();
        cpu.set_zsp16(a & b);
    }
    Ok(())
}
