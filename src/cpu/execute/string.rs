//! String instruction handlers: MOVS, STOS, LODS, CMPS, SCAS.
//!
//! Each handler loops natively (in the host) across the whole repeat count
//! in one call rather than re-entering through `Cpu::step` once per
//! element with IP rewound to the prefix byte. That rewind-based approach
//! would let a debugger or host interrupt land between elements, which
//! nothing in this core's scope needs; looping here keeps `step` simple
//! and the repeat atomic from the caller's perspective.

use crate::cpu::decode::DecodedInstruction;
use crate::cpu::state::{RepeatPrefix, SEG_DS, SEG_ES};
use crate::cpu::Cpu;
use crate::error::CoreError;
use crate::memory::Memory;

fn source_segment(cpu: &Cpu) -> u16 {
    let seg_idx = cpu.segment_override.unwrap_or(SEG_DS);
    cpu.read_seg(seg_idx)
}

fn step_index(cpu: &Cpu, reg: u8, delta: u16) -> u16 {
    let value = cpu.read_reg16(reg);
    if cpu.get_flag(Cpu::DF) {
        value.wrapping_sub(delta)
    } else {
        value.wrapping_add(delta)
    }
}

/// Runs `body` once per repetition, honoring REP/REPNE/REPE semantics, and
/// at least once for an unprefixed string instruction. `body` returns
/// `true` to keep going (ignored for unconditional repeats) when ZF
/// matches the prefix's termination condition.
fn repeat(cpu: &mut Cpu, conditional: bool, mut body: impl FnMut(&mut Cpu)) {
    match cpu.repeat_prefix {
        RepeatPrefix::None => body(cpu),
        RepeatPrefix::Rep => loop {
            if cpu.read_reg16(1) == 0 {
                break;
            }
            body(cpu);
            let cx = cpu.read_reg16(1).wrapping_sub(1);
            cpu.write_reg16(1, cx);
            if conditional && (cx == 0 || !cpu.get_flag(Cpu::ZF)) {
                break;
            }
            if !conditional && cx == 0 {
                break;
            }
        },
        RepeatPrefix::RepNe => loop {
            if cpu.read_reg16(1) == 0 {
                break;
            }
            body(cpu);
            let cx = cpu.read_reg16(1).wrapping_sub(1);
            cpu.write_reg16(1, cx);
            if cx == 0 || (conditional && cpu.get_flag(Cpu::ZF)) {
                break;
            }
        },
    }
}

/// MOVSB (0xA4): copy [DS:SI] -> [ES:DI], then step SI/DI by 1.
pub fn movsb(cpu: &mut Cpu, mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    repeat(cpu, false, |cpu| {
        let src_seg = source_segment(cpu);
        let si = cpu.read_reg16(6);
        let byte = mem.read8(src_seg, si);
        let es = cpu.read_seg(SEG_ES);
        let di = cpu.read_reg16(7);
        mem.write8(es, di, byte);
        cpu.write_reg16(6, step_index(cpu, 6, 1));
        cpu.write_reg16(7, step_index(cpu, 7, 1));
    });
    Ok(())
}

/// MOVSW (0xA5): copy [DS:SI] -> [ES:DI], then step SI/DI by 2.
pub fn movsw(cpu: &mut Cpu, mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    repeat(cpu, false, |cpu| {
        let src_seg = source_segment(cpu);
        let si = cpu.read_reg16(6);
        let word = mem.read16(src_seg, si);
        let es = cpu.read_seg(SEG_ES);
        let di = cpu.read_reg16(7);
        mem.write16(es, di, word);
        cpu.write_reg16(6, step_index(cpu, 6, 2));
        cpu.write_reg16(7, step_index(cpu, 7, 2));
    });
    Ok(())
}

/// STOSB (0xAA): store AL to [ES:DI], then step DI by 1.
pub fn stosb(cpu: &mut Cpu, mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    repeat(cpu, false, |cpu| {
        let es = cpu.read_seg(SEG_ES);
        let di = cpu.read_reg16(7);
        let al = cpu.read_reg8(0);
        mem.write8(es, di, al);
        cpu.write_reg16(7, step_index(cpu, 7, 1));
    });
    Ok(())
}

/// STOSW (0xAB): store AX to [ES:DI], then step DI by 2.
pub fn stosw(cpu: &mut Cpu, mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    repeat(cpu, false, |cpu| {
        let es = cpu.read_seg(SEG_ES);
        let di = cpu.read_reg16(7);
        let ax = cpu.read_reg16(0);
        mem.write16(es, di, ax);
        cpu.write_reg16(7, step_index(cpu, 7, 2));
    });
    Ok(())
}

/// LODSB (0xAC): load [DS:SI] into AL, then step SI by 1.
pub fn lodsb(cpu: &mut Cpu, mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    repeat(cpu, false, |cpu| {
        let src_seg = source_segment(cpu);
        let si = cpu.read_reg16(6);
        let byte = mem.read8(src_seg, si);
        cpu.write_reg8(0, byte);
        cpu.write_reg16(6, step_index(cpu, 6, 1));
    });
    Ok(())
}

/// LODSW (0xAD): load [DS:SI] into AX, then step SI by 2.
pub fn lodsw(cpu: &mut Cpu, mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    repeat(cpu, false, |cpu| {
        let src_seg = source_segment(cpu);
        let si = cpu.read_reg16(6);
        let word = mem.read16(src_seg, si);
        cpu.write_reg16(0, word);
        cpu.write_reg16(6, step_index(cpu, 6, 2));
    });
    Ok(())
}

/// CMPSB (0xA6): compare [DS:SI] - [ES:DI], set flags, then step SI/DI by 1.
pub fn cmpsb(cpu: &mut Cpu, mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    repeat(cpu, true, |cpu| {
        let src_seg = source_segment(cpu);
        let si = cpu.read_reg16(6);
        let a = mem.read8(src_seg, si);
        let es = cpu.read_seg(SEG_ES);
        let di = cpu.read_reg16(7);
        let b = mem.read8(es, di);

        let (r, borrow) = a.overflowing_sub(b);
        cpu.clear_of_cf_af();
        cpu.set_flag(Cpu::CF, borrow);
        cpu.set_sub8_of_af(a, b, r);
        cpu.set_zsp8(r);

        cpu.write_reg16(6, step_index(cpu, 6, 1));
        cpu.write_reg16(7, step_index(cpu, 7, 1));
    });
    Ok(())
}

/// CMPSW (0xA7): compare [DS:SI] - [ES:DI], set flags, then step SI/DI by 2.
pub fn cmpsw(cpu: &mut Cpu, mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    repeat(cpu, true, |cpu| {
        let src_seg = source_segment(cpu);
        let si = cpu.read_reg16(6);
        let a = mem.read16(src_seg, si);
        let es = cpu.read_seg(SEG_ES);
        let di = cpu.read_reg16(7);
        let b = mem.read16(es, di);

        let (r, borrow) = a.overflowing_sub(b);
        cpu.clear_of_cf_af();
        cpu.set_flag(Cpu::CF, borrow);
        cpu.set_sub16_of_af(a, b, r);
        cpu.set_zsp16(r);

        cpu.write_reg16(6, step_index(cpu, 6, 2));
        cpu.write_reg16(7, step_index(cpu, 7, 2));
    });
    Ok(())
}

/// SCASB (0xAE): compare AL - [ES:DI], set flags, then step DI by 1.
pub fn scasb(cpu: &mut Cpu, mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    repeat(cpu, true, |cpu| {
        let al = cpu.read_reg8(0);
        let es = cpu.read_seg(SEG_ES);
        let di = cpu.read_reg16(7);
        let b = mem.read8(es, di);

        let (r, borrow) = al.overflowing_sub(b);
        cpu.clear_of_cf_af();
        cpu.set_flag(Cpu::CF, borrow);
        cpu.set_sub8_of_af(al, b, r);
        cpu.set_zsp8(r);

        cpu.write_reg16(7, step_index(cpu, 7, 1));
    });
    Ok(())
}

/// SCASW (0xAF): compare AX - [ES:DI], set flags, then step DI by 2.
pub fn scasw(cpu: &mut Cpu, mem: &mut Memory, _instr: &DecodedInstruction) -> Result<(), CoreError> {
    repeat(cpu, true, |cpu| {
        let ax = cpu.read_reg16(0);
        let es = cpu.read_seg(SEG_ES);
        let di = cpu.read_reg16(7);
        let b = mem.read16(es, di);

        let (r, borrow) = ax.overflowing_sub(b);
        cpu.clear_of_cf_af();
        cpu.set_flag(Cpu::CF, borrow);
        cpu.set_sub16_of_af(ax, b, r);
        cpu.set_zsp16(r);

        cpu.write_reg16(7, step_index(cpu, 7, 2));
    });
    Ok(())
}
