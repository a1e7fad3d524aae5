//! The opcode dispatch table and the per-opcode operand decoder.
//!
//! `DISPATCH_TABLE` answers one question for `Cpu::step`: is this opcode
//! byte known at all? A `None` entry is an immediate `DecodeError` before a
//! single further byte is consumed. For opcodes with a single fixed
//! encoding the table entry is also the real handler, and `decode_instruction`
//! just resolves operands around it. For the opcode-extension groups (Group
//! 1-3, FE, FF, and the bare 0x8F) the real handler depends on the ModR/M
//! `reg` field, so the table entry is a placeholder and `decode_instruction`
//! picks the real handler itself.

use crate::cpu::decode::{DecodedInstruction, InstructionHandler, Operand};
use crate::cpu::execute::{arithmetic, control_flow, data_transfer, flags, handlers, io, logic, prefix, shift, stack, string};
use crate::cpu::state::{SEG_CS, SEG_DS, SEG_ES, SEG_SS};
use crate::cpu::Cpu;
use crate::memory::Memory;

const fn table_entry(opcode: u8) -> Option<InstructionHandler> {
    match opcode {
        // ALU accumulator/rm/reg blocks: ADD, OR, ADC, SBB, AND, SUB, XOR, CMP.
        0x00..=0x05 => Some(arithmetic::add),
        0x08..=0x0D => Some(arithmetic::or),
        0x10..=0x15 => Some(arithmetic::adc),
        0x18..=0x1D => Some(arithmetic::sbb),
        0x20..=0x25 => Some(arithmetic::and),
        0x28..=0x2D => Some(arithmetic::sub),
        0x30..=0x35 => Some(arithmetic::xor),
        0x38..=0x3D => Some(arithmetic::cmp),

        // Segment PUSH/POP.
        0x06 | 0x0E | 0x16 | 0x1E => Some(stack::push_seg),
        0x07 | 0x17 | 0x1F => Some(stack::pop_seg),

        // Segment override prefixes, LOCK, DAA/DAS/AAA/AAS.
        0x26 => Some(prefix::seg_es),
        0x2E => Some(prefix::seg_cs),
        0x36 => Some(prefix::seg_ss),
        0x3E => Some(prefix::seg_ds),
        0xF0 => Some(prefix::lock),
        0xF2 => Some(prefix::repne),
        0xF3 => Some(prefix::rep),
        0x27 => Some(arithmetic::daa),
        0x2F => Some(arithmetic::das),
        0x37 => Some(arithmetic::aaa),
        0x3F => Some(arithmetic::aas),

        // INC/DEC r16, PUSH/POP r16.
        0x40..=0x47 => Some(arithmetic::inc),
        0x48..=0x4F => Some(arithmetic::dec),
        0x50..=0x57 => Some(stack::push_r16),
        0x58..=0x5F => Some(stack::pop_r16),

        // Jcc, short.
        0x70 => Some(control_flow::jo),
        0x71 => Some(control_flow::jno),
        0x72 => Some(control_flow::jc),
        0x73 => Some(control_flow::jnc),
        0x74 => Some(control_flow::jz),
        0x75 => Some(control_flow::jnz),
        0x76 => Some(control_flow::jbe),
        0x77 => Some(control_flow::ja),
        0x78 => Some(control_flow::js),
        0x79 => Some(control_flow::jns),
        0x7A => Some(control_flow::jp),
        0x7B => Some(control_flow::jnp),
        0x7C => Some(control_flow::jl),
        0x7D => Some(control_flow::jge),
        0x7E => Some(control_flow::jle),
        0x7F => Some(control_flow::jg),

        // Group 1/2/3 and the lone Group 11 (0x8F) and Group FE/FF: real
        // handler resolved by reg field in `decode_instruction`.
        0x80..=0x83 | 0x8F | 0xC0 | 0xC1 | 0xD0..=0xD3 | 0xF6 | 0xF7 | 0xFE | 0xFF => {
            Some(handlers::invalid_opcode)
        }

        0x84 | 0x85 => Some(logic::test),
        0x86 | 0x87 => Some(data_transfer::xchg_rm_r),
        0x88..=0x8B => Some(data_transfer::mov),
        0x8C => Some(data_transfer::mov),
        0x8D => Some(data_transfer::lea),
        0x8E => Some(data_transfer::mov),

        0x90 => Some(handlers::nop),
        0x91..=0x97 => Some(data_transfer::xchg_ax_r16),
        0x98 => Some(data_transfer::cbw),
        0x99 => Some(data_transfer::cwd),
        0x9A => Some(control_flow::call_far),
        0x9B => None, // WAIT: x87 bus synchronization, no coprocessor exists here.
        0x9C => Some(stack::pushf),
        0x9D => Some(stack::popf),
        0x9E => Some(data_transfer::sahf),
        0x9F => Some(data_transfer::lahf),

        0xA0..=0xA3 => Some(data_transfer::mov),
        0xA4 => Some(string::movsb),
        0xA5 => Some(string::movsw),
        0xA6 => Some(string::cmpsb),
        0xA7 => Some(string::cmpsw),
        0xA8 | 0xA9 => Some(logic::test),
        0xAA => Some(string::stosb),
        0xAB => Some(string::stosw),
        0xAC => Some(string::lodsb),
        0xAD => Some(string::lodsw),
        0xAE => Some(string::scasb),
        0xAF => Some(string::scasw),

        0xB0..=0xB7 => Some(data_transfer::mov),
        0xB8..=0xBF => Some(data_transfer::mov),

        0xC2 => Some(control_flow::ret_near_imm),
        0xC3 => Some(control_flow::ret_near),
        0xC4 => Some(data_transfer::les),
        0xC5 => Some(data_transfer::lds),
        0xC6 | 0xC7 => Some(data_transfer::mov),
        0xCA => Some(control_flow::ret_far_imm),
        0xCB => Some(control_flow::ret_far),
        0xCC => Some(control_flow::int3),
        0xCD => Some(control_flow::int_imm8),
        0xCE => Some(control_flow::into),
        0xCF => Some(control_flow::iret),

        0xD4 => Some(arithmetic::aam),
        0xD5 => Some(arithmetic::aad),
        0xD7 => Some(data_transfer::xlat),

        0xE0 => Some(control_flow::loopne),
        0xE1 => Some(control_flow::loope),
        0xE2 => Some(control_flow::loop_),
        0xE3 => Some(control_flow::jcxz),
        0xE4 => Some(io::in_al_imm8),
        0xE5 => Some(io::in_ax_imm8),
        0xE6 => Some(io::out_imm8_al),
        0xE7 => Some(io::out_imm8_ax),
        0xE8 => Some(control_flow::call_near),
        0xE9 => Some(control_flow::jmp_near),
        0xEA => Some(control_flow::jmp_far),
        0xEB => Some(control_flow::jmp_short),
        0xEC => Some(io::in_al_dx),
        0xED => Some(io::in_ax_dx),
        0xEE => Some(io::out_dx_al),
        0xEF => Some(io::out_dx_ax),

        0xF4 => Some(handlers::hlt),
        0xF5 => Some(flags::cmc),
        0xF8 => Some(flags::clc),
        0xF9 => Some(flags::stc),
        0xFA => Some(flags::cli),
        0xFB => Some(flags::sti),
        0xFC => Some(flags::cld),
        0xFD => Some(flags::std),

        _ => None,
    }
}

pub static DISPATCH_TABLE: [Option<InstructionHandler>; 256] = {
    let mut table: [Option<InstructionHandler>; 256] = [None; 256];
    let mut i = 0usize;
    while i < 256 {
        table[i] = table_entry(i as u8);
        i += 1;
    }
    table
};

const GROUP1: [InstructionHandler; 8] = [
    arithmetic::add,
    arithmetic::or,
    arithmetic::adc,
    arithmetic::sbb,
    arithmetic::and,
    arithmetic::sub,
    arithmetic::xor,
    arithmetic::cmp,
];

fn decode_group1(cpu: &mut Cpu, mem: &Memory, opcode: u8) -> DecodedInstruction {
    let is_byte = opcode == 0x80 || opcode == 0x82;
    let modrm = cpu.decode_modrm(mem);
    let dst = Cpu::decode_rm_operand(&modrm, is_byte);
    let handler = GROUP1[(modrm.reg & 7) as usize];
    let src = match opcode {
        0x81 => Operand::imm16(cpu.fetch16(mem)),
        0x83 => Operand::imm16(cpu.fetch8(mem) as i8 as i16 as u16),
        _ => Operand::imm8(cpu.fetch8(mem)),
    };
    DecodedInstruction::new(opcode, handler).with_dst(dst).with_src(src)
}

fn decode_group2(cpu: &mut Cpu, mem: &Memory, opcode: u8) -> DecodedInstruction {
    let is_byte = matches!(opcode, 0xC0 | 0xD0 | 0xD2);
    let modrm = cpu.decode_modrm(mem);
    let dst = Cpu::decode_rm_operand(&modrm, is_byte);
    let (handler, src) = match opcode {
        0xC0 | 0xC1 => (shift::group_shift_imm8, Operand::imm8(cpu.fetch8(mem))),
        0xD0 | 0xD1 => (shift::group_shift_1, Operand::none()),
        0xD2 | 0xD3 => (shift::group_shift_cl, Operand::none()),
        _ => unreachable!("decode_group2 only called for 0xC0/C1/D0-D3"),
    };
    DecodedInstruction::new(opcode, handler)
        .with_dst(dst)
        .with_src(src)
        .with_reg(modrm.reg)
}

fn decode_group3(cpu: &mut Cpu, mem: &Memory, opcode: u8) -> DecodedInstruction {
    let is_byte = opcode == 0xF6;
    let modrm = cpu.decode_modrm(mem);
    let dst = Cpu::decode_rm_operand(&modrm, is_byte);
    let (handler, src) = match modrm.reg {
        0 => {
            let imm = if is_byte {
                Operand::imm8(cpu.fetch8(mem))
            } else {
                Operand::imm16(cpu.fetch16(mem))
            };
            (arithmetic::test_rm_imm, imm)
        }
        2 => (arithmetic::not_rm, Operand::none()),
        3 => (arithmetic::neg_rm, Operand::none()),
        4 => (arithmetic::mul_rm, Operand::none()),
        5 => (arithmetic::imul_rm, Operand::none()),
        6 => (arithmetic::div_rm, Operand::none()),
        7 => (arithmetic::idiv_rm, Operand::none()),
        _ => (handlers::invalid_opcode, Operand::none()),
    };
    DecodedInstruction::new(opcode, handler).with_dst(dst).with_src(src)
}

fn decode_group_fe(cpu: &mut Cpu, mem: &Memory, opcode: u8) -> DecodedInstruction {
    let modrm = cpu.decode_modrm(mem);
    let dst = Cpu::decode_rm_operand(&modrm, true);
    let handler = match modrm.reg {
        0 => arithmetic::inc,
        1 => arithmetic::dec,
        _ => handlers::invalid_opcode,
    };
    DecodedInstruction::new(opcode, handler).with_dst(dst)
}

fn decode_group_ff(cpu: &mut Cpu, mem: &Memory, opcode: u8) -> DecodedInstruction {
    let modrm = cpu.decode_modrm(mem);
    let is_memory = !modrm.is_register_direct();
    let rm = Cpu::decode_rm_operand(&modrm, false);
    match modrm.reg {
        0 => DecodedInstruction::new(opcode, arithmetic::inc).with_dst(rm),
        1 => DecodedInstruction::new(opcode, arithmetic::dec).with_dst(rm),
        2 => DecodedInstruction::new(opcode, control_flow::call_rm16).with_dst(rm),
        3 if is_memory => DecodedInstruction::new(opcode, control_flow::call_m16_16).with_dst(rm),
        4 => DecodedInstruction::new(opcode, control_flow::jmp_rm16).with_dst(rm),
        5 if is_memory => DecodedInstruction::new(opcode, control_flow::jmp_m16_16).with_dst(rm),
        6 => DecodedInstruction::new(opcode, stack::push_rm16).with_src(rm),
        _ => DecodedInstruction::new(opcode, handlers::invalid_opcode),
    }
}

fn decode_pop_ev(cpu: &mut Cpu, mem: &Memory, opcode: u8) -> DecodedInstruction {
    let modrm = cpu.decode_modrm(mem);
    let dst = Cpu::decode_rm_operand(&modrm, false);
    if modrm.reg == 0 {
        DecodedInstruction::new(opcode, stack::pop_rm16).with_dst(dst)
    } else {
        DecodedInstruction::new(opcode, handlers::invalid_opcode)
    }
}

fn decode_mov_imm(cpu: &mut Cpu, mem: &Memory, opcode: u8) -> DecodedInstruction {
    let is_byte = opcode == 0xC6;
    let modrm = cpu.decode_modrm(mem);
    if modrm.reg != 0 {
        return DecodedInstruction::new(opcode, handlers::invalid_opcode);
    }
    let dst = Cpu::decode_rm_operand(&modrm, is_byte);
    let src = if is_byte {
        Operand::imm8(cpu.fetch8(mem))
    } else {
        Operand::imm16(cpu.fetch16(mem))
    };
    DecodedInstruction::new(opcode, data_transfer::mov).with_dst(dst).with_src(src)
}

/// Shared shape for LES/LDS/LEA: reg <- r/m, where r/m must be memory (a
/// register-direct ModR/M is an invalid encoding for all three).
fn decode_reg_mem(cpu: &mut Cpu, mem: &Memory, opcode: u8, handler: InstructionHandler) -> DecodedInstruction {
    let modrm = cpu.decode_modrm(mem);
    if modrm.is_register_direct() {
        return DecodedInstruction::new(opcode, handlers::invalid_opcode);
    }
    let rm = Cpu::decode_rm_operand(&modrm, false);
    let reg = Cpu::decode_reg_operand(modrm.reg, false);
    DecodedInstruction::new(opcode, handler).with_dst(reg).with_src(rm)
}

fn decode_alu(cpu: &mut Cpu, mem: &Memory, opcode: u8, handler: InstructionHandler) -> DecodedInstruction {
    match opcode & 0b111 {
        0b000 => {
            let modrm = cpu.decode_modrm(mem);
            let dst = Cpu::decode_rm_operand(&modrm, true);
            let src = Cpu::decode_reg_operand(modrm.reg, true);
            DecodedInstruction::new(opcode, handler).with_dst(dst).with_src(src)
        }
        0b001 => {
            let modrm = cpu.decode_modrm(mem);
            let dst = Cpu::decode_rm_operand(&modrm, false);
            let src = Cpu::decode_reg_operand(modrm.reg, false);
            DecodedInstruction::new(opcode, handler).with_dst(dst).with_src(src)
        }
        0b010 => {
            let modrm = cpu.decode_modrm(mem);
            let src = Cpu::decode_rm_operand(&modrm, true);
            let dst = Cpu::decode_reg_operand(modrm.reg, true);
            DecodedInstruction::new(opcode, handler).with_dst(dst).with_src(src)
        }
        0b011 => {
            let modrm = cpu.decode_modrm(mem);
            let src = Cpu::decode_rm_operand(&modrm, false);
            let dst = Cpu::decode_reg_operand(modrm.reg, false);
            DecodedInstruction::new(opcode, handler).with_dst(dst).with_src(src)
        }
        0b100 => {
            let imm = cpu.fetch8(mem);
            DecodedInstruction::new(opcode, handler)
                .with_dst(Operand::reg8(0))
                .with_src(Operand::imm8(imm))
        }
        0b101 => {
            let imm = cpu.fetch16(mem);
            DecodedInstruction::new(opcode, handler)
                .with_dst(Operand::reg16(0))
                .with_src(Operand::imm16(imm))
        }
        _ => unreachable!("decode_alu only called for the rm/reg/acc forms, opcode & 7 <= 5"),
    }
}

fn direct_mem_operand(is_byte: bool, offset: u16) -> Operand {
    use crate::cpu::decode::OperandType;
    let op_type = if is_byte { OperandType::Mem8 } else { OperandType::Mem16 };
    Operand::new(op_type, 0xFF).with_disp(offset as i16)
}

/// Decode the instruction at the current CS:IP (the opcode byte itself has
/// already been fetched by `Cpu::step`, advancing IP past it) and return it
/// with operands resolved and `handler` finalized, ready for `execute`.
pub fn decode_instruction(cpu: &mut Cpu, mem: &Memory, opcode: u8, handler: InstructionHandler) -> DecodedInstruction {
    let start_ip = cpu.ip.wrapping_sub(1);

    let instr = match opcode {
        0x00..=0x05 | 0x08..=0x0D | 0x10..=0x15 | 0x18..=0x1D | 0x20..=0x25 | 0x28..=0x2D | 0x30..=0x35 | 0x38..=0x3D => {
            decode_alu(cpu, mem, opcode, handler)
        }

        0x06 | 0x16 | 0x1E => DecodedInstruction::new(opcode, handler).with_src(Operand::seg(seg_index(opcode))),
        0x0E => DecodedInstruction::new(opcode, handler).with_src(Operand::seg(SEG_CS)),
        0x07 | 0x17 | 0x1F => DecodedInstruction::new(opcode, handler).with_dst(Operand::seg(seg_index(opcode))),

        0x26 | 0x2E | 0x36 | 0x3E | 0xF0 | 0xF2 | 0xF3 => DecodedInstruction::new(opcode, handler),
        0x27 | 0x2F | 0x37 | 0x3F => DecodedInstruction::new(opcode, handler),

        0x40..=0x47 => DecodedInstruction::new(opcode, handler).with_dst(Operand::reg16(opcode & 7)),
        0x48..=0x4F => DecodedInstruction::new(opcode, handler).with_dst(Operand::reg16(opcode & 7)),
        0x50..=0x57 => DecodedInstruction::new(opcode, handler).with_src(Operand::reg16(opcode & 7)),
        0x58..=0x5F => DecodedInstruction::new(opcode, handler).with_dst(Operand::reg16(opcode & 7)),

        0x70..=0x7F | 0xEB | 0xE0..=0xE3 => {
            let rel = cpu.fetch8(mem) as i8;
            DecodedInstruction::new(opcode, handler).with_src(Operand::rel8(rel))
        }

        0x80..=0x83 => decode_group1(cpu, mem, opcode),
        0xC0 | 0xC1 | 0xD0..=0xD3 => decode_group2(cpu, mem, opcode),
        0xF6 | 0xF7 => decode_group3(cpu, mem, opcode),
        0xFE => decode_group_fe(cpu, mem, opcode),
        0xFF => decode_group_ff(cpu, mem, opcode),
        0x8F => decode_pop_ev(cpu, mem, opcode),

        0x84 | 0x85 => {
            let modrm = cpu.decode_modrm(mem);
            let is_byte = opcode == 0x84;
            let dst = Cpu::decode_rm_operand(&modrm, is_byte);
            let src = Cpu::decode_reg_operand(modrm.reg, is_byte);
            DecodedInstruction::new(opcode, handler).with_dst(dst).with_src(src)
        }
        0x86 | 0x87 => {
            let modrm = cpu.decode_modrm(mem);
            let is_byte = opcode == 0x86;
            let dst = Cpu::decode_rm_operand(&modrm, is_byte);
            let src = Cpu::decode_reg_operand(modrm.reg, is_byte);
            DecodedInstruction::new(opcode, handler).with_dst(dst).with_src(src)
        }
        0x88 => {
            let modrm = cpu.decode_modrm(mem);
            let dst = Cpu::decode_rm_operand(&modrm, true);
            let src = Cpu::decode_reg_operand(modrm.reg, true);
            DecodedInstruction::new(opcode, handler).with_dst(dst).with_src(src)
        }
        0x89 => {
            let modrm = cpu.decode_modrm(mem);
            let dst = Cpu::decode_rm_operand(&modrm, false);
            let src = Cpu::decode_reg_operand(modrm.reg, false);
            DecodedInstruction::new(opcode, handler).with_dst(dst).with_src(src)
        }
        0x8A => {
            let modrm = cpu.decode_modrm(mem);
            let src = Cpu::decode_rm_operand(&modrm, true);
            let dst = Cpu::decode_reg_operand(modrm.reg, true);
            DecodedInstruction::new(opcode, handler).with_dst(dst).with_src(src)
        }
        0x8B => {
            let modrm = cpu.decode_modrm(mem);
            let src = Cpu::decode_rm_operand(&modrm, false);
            let dst = Cpu::decode_reg_operand(modrm.reg, false);
            DecodedInstruction::new(opcode, handler).with_dst(dst).with_src(src)
        }
        0x8C => {
            let modrm = cpu.decode_modrm(mem);
            let rm = Cpu::decode_rm_operand(&modrm, false);
            let seg = Operand::seg(modrm.reg & 3);
            DecodedInstruction::new(opcode, handler).with_dst(rm).with_src(seg)
        }
        0x8D => decode_reg_mem(cpu, mem, opcode, handler),
        0x8E => {
            let modrm = cpu.decode_modrm(mem);
            let rm = Cpu::decode_rm_operand(&modrm, false);
            let seg = Operand::seg(modrm.reg & 3);
            DecodedInstruction::new(opcode, handler).with_dst(seg).with_src(rm)
        }

        0x90 => DecodedInstruction::new(opcode, handler),
        0x91..=0x97 => DecodedInstruction::new(opcode, handler).with_dst(Operand::reg16(opcode & 7)),
        0x98 | 0x99 | 0x9B | 0x9C | 0x9D | 0x9E | 0x9F => DecodedInstruction::new(opcode, handler),
        0x9A => {
            let target_offset = cpu.fetch16(mem);
            let target_seg = cpu.fetch16(mem);
            DecodedInstruction::new(opcode, handler)
                .with_src(Operand::imm16(target_offset))
                .with_dst(Operand::imm16(target_seg))
        }

        0xA0 => {
            let offset = cpu.fetch16(mem);
            DecodedInstruction::new(opcode, handler)
                .with_dst(Operand::reg8(0))
                .with_src(direct_mem_operand(true, offset))
        }
        0xA1 => {
            let offset = cpu.fetch16(mem);
            DecodedInstruction::new(opcode, handler)
                .with_dst(Operand::reg16(0))
                .with_src(direct_mem_operand(false, offset))
        }
        0xA2 => {
            let offset = cpu.fetch16(mem);
            DecodedInstruction::new(opcode, handler)
                .with_dst(direct_mem_operand(true, offset))
                .with_src(Operand::reg8(0))
        }
        0xA3 => {
            let offset = cpu.fetch16(mem);
            DecodedInstruction::new(opcode, handler)
                .with_dst(direct_mem_operand(false, offset))
                .with_src(Operand::reg16(0))
        }
        0xA4..=0xAF => DecodedInstruction::new(opcode, handler),

        0xB0..=0xB7 => {
            let imm = cpu.fetch8(mem);
            DecodedInstruction::new(opcode, handler)
                .with_dst(Operand::reg8(opcode & 7))
                .with_src(Operand::imm8(imm))
        }
        0xB8..=0xBF => {
            let imm = cpu.fetch16(mem);
            DecodedInstruction::new(opcode, handler)
                .with_dst(Operand::reg16(opcode & 7))
                .with_src(Operand::imm16(imm))
        }

        0xC2 | 0xCA => {
            let imm = cpu.fetch16(mem);
            DecodedInstruction::new(opcode, handler).with_src(Operand::imm16(imm))
        }
        0xC3 | 0xCB | 0xCC | 0xCE | 0xCF => DecodedInstruction::new(opcode, handler),
        0xC4 => decode_reg_mem(cpu, mem, opcode, handler),
        0xC5 => decode_reg_mem(cpu, mem, opcode, handler),
        0xC6 | 0xC7 => decode_mov_imm(cpu, mem, opcode),
        0xCD => {
            let imm = cpu.fetch8(mem);
            DecodedInstruction::new(opcode, handler).with_src(Operand::imm8(imm))
        }

        0xD4 | 0xD5 => {
            let imm = cpu.fetch8(mem);
            DecodedInstruction::new(opcode, handler).with_src(Operand::imm8(imm))
        }
        0xD7 => DecodedInstruction::new(opcode, handler),

        0xE4 => {
            let port = cpu.fetch8(mem);
            DecodedInstruction::new(opcode, handler).with_src(Operand::imm8(port))
        }
        0xE5 => {
            let port = cpu.fetch8(mem);
            DecodedInstruction::new(opcode, handler).with_src(Operand::imm8(port))
        }
        0xE6 => {
            let port = cpu.fetch8(mem);
            DecodedInstruction::new(opcode, handler).with_dst(Operand::imm8(port))
        }
        0xE7 => {
            let port = cpu.fetch8(mem);
            DecodedInstruction::new(opcode, handler).with_dst(Operand::imm8(port))
        }
        0xE8 | 0xE9 => {
            let rel = cpu.fetch16(mem) as i16;
            DecodedInstruction::new(opcode, handler).with_src(Operand::rel16(rel))
        }
        0xEA => {
            let target_offset = cpu.fetch16(mem);
            let target_seg = cpu.fetch16(mem);
            DecodedInstruction::new(opcode, handler)
                .with_src(Operand::imm16(target_offset))
                .with_dst(Operand::imm16(target_seg))
        }
        0xEC..=0xEF => DecodedInstruction::new(opcode, handler),

        0xF4 | 0xF5 | 0xF8 | 0xF9 | 0xFA | 0xFB | 0xFC | 0xFD => DecodedInstruction::new(opcode, handler),

        _ => DecodedInstruction::new(opcode, handlers::invalid_opcode),
    };

    let length = cpu.ip.wrapping_sub(start_ip) as u8;
    instr.with_length(length)
}

fn seg_index(opcode: u8) -> u8 {
    match opcode {
        0x06 | 0x07 => SEG_ES,
        0x16 | 0x17 => SEG_SS,
        0x1E | 0x1F => SEG_DS,
        0x0E => SEG_CS,
        _ => unreachable!("seg_index only called for segment push/pop opcodes"),
    }
}
