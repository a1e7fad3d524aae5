//! CPU register file, flags, and the fetch-decode-execute loop.

use crate::cpu::decode::{ModRM, Operand, OperandType};
use crate::cpu::dispatch::DISPATCH_TABLE;
use crate::error::CoreError;
use crate::memory::Memory;

/// An active string-repeat prefix, consumed by the instruction it precedes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatPrefix {
    None,
    /// REP / REPE / REPZ
    Rep,
    /// REPNE / REPNZ
    RepNe,
}

/// A host callback invoked instead of the guest's IVT entry for a given
/// interrupt vector. Used by loader/DOS/BIOS collaborators to service
/// software interrupts without a real-mode handler being present in guest
/// memory.
pub type InterruptHandler = Box<dyn FnMut(&mut Cpu, &mut Memory)>;

/// A single-method hook the engine consults before dispatching every
/// instruction, plus a companion hook
/// after the instruction completes for debuggers that need to react to a
/// single-step finishing (sending a stop reply, for instance). The engine
/// never interprets a debugger's own command vocabulary; it only observes
/// whatever state the hook leaves behind (IP, registers, `halted`) and
/// whether `before_step` says to keep running.
pub trait DebugHook {
    /// Called before the next instruction is dispatched. Returning `false`
    /// halts the engine (a debugger HALT request); the core sets `halted`
    /// itself in that case, matching the HLT/DOS-terminate halt paths.
    fn before_step(&mut self, cpu: &mut Cpu, mem: &mut Memory) -> bool;

    /// Called after the instruction completes. Default no-op; overridden by
    /// debuggers that need to react to single-step completion.
    fn after_step(&mut self, cpu: &mut Cpu) {
        let _ = cpu;
    }
}

/// The one-instruction interrupt-shadow STI arms: `Armed` the instant STI
/// executes (IF not yet visible); promoted to `Due` at the top of the next
/// `step` call, so the instruction that call dispatches still observes the
/// old IF value for its whole execution; committed once that instruction
/// finishes, matching the real 8086's "instruction after STI always runs
/// before a pending interrupt can be taken."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StiShadow {
    None,
    Armed,
    Due,
}

/// Segment register indices, matching the order used throughout decode and
/// the `segments` array: ES, CS, SS, DS.
pub const SEG_ES: u8 = 0;
pub const SEG_CS: u8 = 1;
pub const SEG_SS: u8 = 2;
pub const SEG_DS: u8 = 3;

/// The 8086 register file, flags, and the minimal pieces of processor state
/// (segment override, active repeat prefix, halt latch) needed to execute
/// one instruction at a time.
pub struct Cpu {
    /// General-purpose registers, indexed 0-7: AX, CX, DX, BX, SP, BP, SI, DI.
    pub regs: [u16; 8],

    /// Segment registers, indexed 0-3: ES, CS, SS, DS.
    pub segments: [u16; 4],

    /// Instruction pointer.
    pub ip: u16,

    flags: u16,

    /// Segment override prefix active for the next memory-referencing
    /// instruction, if any. Cleared at the start of every `step`.
    pub segment_override: Option<u8>,

    /// Active string-repeat prefix for the next string instruction.
    /// Cleared at the start of every `step`.
    pub repeat_prefix: RepeatPrefix,

    /// STI's one-instruction interrupt shadow. See [`StiShadow`].
    sti_shadow: StiShadow,

    /// Set by HLT; cleared by a recognized interrupt.
    pub halted: bool,

    interrupt_handlers: Vec<Option<InterruptHandler>>,

    /// At most one attached debugger. A detach request clears this
    /// without the core knowing anything about the debugger's own wire
    /// protocol.
    debugger: Option<Box<dyn DebugHook>>,
}

// FLAGS register bit positions.
impl Cpu {
    pub const CF: u16 = 1 << 0;
    pub const PF: u16 = 1 << 2;
    pub const AF: u16 = 1 << 4;
    pub const ZF: u16 = 1 << 6;
    pub const SF: u16 = 1 << 7;
    pub const TF: u16 = 1 << 8;
    pub const IF: u16 = 1 << 9;
    pub const DF: u16 = 1 << 10;
    pub const OF: u16 = 1 << 11;
    /// Bit 1 is documented as always set on real 8086 hardware.
    const RESERVED: u16 = 1 << 1;
}

impl Cpu {
    /// A freshly constructed CPU: all registers zero, FLAGS holds only the
    /// reserved bit. No reset vector is applied here; a loader is
    /// responsible for placing CS:IP wherever the loaded image requires.
    pub fn new() -> Self {
        Self {
            regs: [0; 8],
            segments: [0; 4],
            ip: 0,
            flags: Self::RESERVED,
            segment_override: None,
            repeat_prefix: RepeatPrefix::None,
            sti_shadow: StiShadow::None,
            halted: false,
            interrupt_handlers: (0..256).map(|_| None).collect(),
            debugger: None,
        }
    }

    /// Return the CPU to its just-constructed state. Does not touch memory.
    pub fn reset(&mut self) {
        self.regs = [0; 8];
        self.segments = [0; 4];
        self.ip = 0;
        self.flags = Self::RESERVED;
        self.segment_override = None;
        self.repeat_prefix = RepeatPrefix::None;
        self.sti_shadow = StiShadow::None;
        self.halted = false;
    }

    // -- register access -----------------------------------------------

    /// Read an 8-bit register by its ModR/M encoding (0-7: AL,CL,DL,BL,AH,CH,DH,BH).
    pub fn read_reg8(&self, reg: u8) -> u8 {
        let idx = (reg & 3) as usize;
        if reg < 4 {
            (self.regs[idx] & 0xFF) as u8
        } else {
            (self.regs[idx] >> 8) as u8
        }
    }

    /// Write an 8-bit register by its ModR/M encoding.
    pub fn write_reg8(&mut self, reg: u8, value: u8) {
        let idx = (reg & 3) as usize;
        if reg < 4 {
            self.regs[idx] = (self.regs[idx] & 0xFF00) | value as u16;
        } else {
            self.regs[idx] = (self.regs[idx] & 0x00FF) | ((value as u16) << 8);
        }
    }

    /// Read a 16-bit register by its ModR/M encoding (0-7: AX,CX,DX,BX,SP,BP,SI,DI).
    pub fn read_reg16(&self, reg: u8) -> u16 {
        self.regs[(reg & 7) as usize]
    }

    /// Write a 16-bit register by its ModR/M encoding.
    pub fn write_reg16(&mut self, reg: u8, value: u16) {
        self.regs[(reg & 7) as usize] = value;
    }

    /// Read a segment register (0=ES,1=CS,2=SS,3=DS).
    pub fn read_seg(&self, seg: u8) -> u16 {
        self.segments[(seg & 3) as usize]
    }

    /// Write a segment register.
    pub fn write_seg(&mut self, seg: u8, value: u16) {
        self.segments[(seg & 3) as usize] = value;
    }

    // -- flags -----------------------------------------------------------

    pub fn get_flags(&self) -> u16 {
        self.flags
    }

    pub fn set_flags(&mut self, value: u16) {
        self.flags = value | Self::RESERVED;
    }

    pub fn get_flag(&self, mask: u16) -> bool {
        self.flags & mask != 0
    }

    pub fn set_flag(&mut self, mask: u16, value: bool) {
        if value {
            self.flags |= mask;
        } else {
            self.flags &= !mask;
        }
    }

    /// Set ZF, SF and PF from an 8-bit result. Used by every ALU handler;
    /// does not touch CF/OF/AF, which each handler computes separately.
    pub fn set_zsp8(&mut self, result: u8) {
        self.set_flag(Self::ZF, result == 0);
        self.set_flag(Self::SF, result & 0x80 != 0);
        self.set_flag(Self::PF, result.count_ones() % 2 == 0);
    }

    /// Set ZF, SF and PF from a 16-bit result. PF is defined over the low
    /// byte only, matching real 8086 behavior.
    pub fn set_zsp16(&mut self, result: u16) {
        self.set_flag(Self::ZF, result == 0);
        self.set_flag(Self::SF, result & 0x8000 != 0);
        self.set_flag(Self::PF, (result as u8).count_ones() % 2 == 0);
    }

    /// Clear OF, CF and AF. Used by the logical instructions (AND/OR/XOR/TEST),
    /// which define OF and CF as always cleared and leave AF undefined; we
    /// clear AF too rather than leave stale state behind.
    pub fn clear_of_cf_af(&mut self) {
        self.set_flag(Self::OF, false);
        self.set_flag(Self::CF, false);
        self.set_flag(Self::AF, false);
    }

    pub fn set_add8_of_af(&mut self, op1: u8, op2: u8, result: u8) {
        let af = (op1 & 0x0F) + (op2 & 0x0F) > 0x0F;
        let of = (op1 ^ result) & (op2 ^ result) & 0x80 != 0;
        self.set_flag(Self::AF, af);
        self.set_flag(Self::OF, of);
    }

    pub fn set_add16_of_af(&mut self, op1: u16, op2: u16, result: u16) {
        let af = (op1 & 0x0F) + (op2 & 0x0F) > 0x0F;
        let of = (op1 ^ result) & (op2 ^ result) & 0x8000 != 0;
        self.set_flag(Self::AF, af);
        self.set_flag(Self::OF, of);
    }

    pub fn set_adc8_of_af(&mut self, op1: u8, op2: u8, carry_in: u8, result: u8) {
        let af = (op1 & 0x0F) + (op2 & 0x0F) + carry_in > 0x0F;
        let of = (op1 ^ result) & (op2 ^ result) & 0x80 != 0;
        self.set_flag(Self::AF, af);
        self.set_flag(Self::OF, of);
    }

    pub fn set_adc16_of_af(&mut self, op1: u16, op2: u16, carry_in: u16, result: u16) {
        let af = (op1 & 0x0F) + (op2 & 0x0F) + carry_in > 0x0F;
        let of = (op1 ^ result) & (op2 ^ result) & 0x8000 != 0;
        self.set_flag(Self::AF, af);
        self.set_flag(Self::OF, of);
    }

    pub fn set_sub8_of_af(&mut self, op1: u8, op2: u8, result: u8) {
        let af = (op1 & 0x0F) < (op2 & 0x0F);
        let of = (op1 ^ op2) & (op1 ^ result) & 0x80 != 0;
        self.set_flag(Self::AF, af);
        self.set_flag(Self::OF, of);
    }

    pub fn set_sub16_of_af(&mut self, op1: u16, op2: u16, result: u16) {
        let af = (op1 & 0x0F) < (op2 & 0x0F);
        let of = (op1 ^ op2) & (op1 ^ result) & 0x8000 != 0;
        self.set_flag(Self::AF, af);
        self.set_flag(Self::OF, of);
    }

    pub fn set_sbb8_of_af(&mut self, op1: u8, op2: u8, borrow_in: u8, result: u8) {
        let af = (op1 & 0x0F) < (op2 & 0x0F) + borrow_in;
        let of = (op1 ^ op2) & (op1 ^ result) & 0x80 != 0;
        self.set_flag(Self::AF, af);
        self.set_flag(Self::OF, of);
    }

    pub fn set_sbb16_of_af(&mut self, op1: u16, op2: u16, borrow_in: u16, result: u16) {
        let af = (op1 & 0x0F) < (op2 & 0x0F) + borrow_in;
        let of = (op1 ^ op2) & (op1 ^ result) & 0x8000 != 0;
        self.set_flag(Self::AF, af);
        self.set_flag(Self::OF, of);
    }

    pub fn set_inc8_of_af(&mut self, op1: u8, _result: u8) {
        self.set_flag(Self::AF, (op1 & 0x0F) == 0x0F);
        self.set_flag(Self::OF, op1 == 0x7F);
    }

    pub fn set_inc16_of_af(&mut self, op1: u16, _result: u16) {
        self.set_flag(Self::AF, (op1 & 0x0F) == 0x0F);
        self.set_flag(Self::OF, op1 == 0x7FFF);
    }

    pub fn set_dec8_of_af(&mut self, op1: u8, _result: u8) {
        self.set_flag(Self::AF, (op1 & 0x0F) == 0);
        self.set_flag(Self::OF, op1 == 0x80);
    }

    pub fn set_dec16_of_af(&mut self, op1: u16, _result: u16) {
        self.set_flag(Self::AF, (op1 & 0x0F) == 0);
        self.set_flag(Self::OF, op1 == 0x8000);
    }

    /// Arm the STI interrupt shadow: IF does not become visible until the
    /// instruction immediately following this one finishes executing. The
    /// 8086 guarantees that instruction always runs before any pending
    /// interrupt is taken, so IRET-from-handler-then-STI sequences cannot
    /// be starved.
    pub fn set_interrupt_delay(&mut self) {
        self.sti_shadow = StiShadow::Armed;
    }

    // -- interrupt handler table -----------------------------------------

    /// Register a host callback for a software interrupt vector. When
    /// present, `int_n`/`int3`/`into` invoke the callback directly instead
    /// of pushing FLAGS/CS/IP and dispatching through the guest's IVT.
    pub fn set_interrupt_handler(&mut self, vector: u8, handler: InterruptHandler) {
        self.interrupt_handlers[vector as usize] = Some(handler);
    }

    /// Remove a previously registered interrupt handler, restoring normal
    /// IVT-based dispatch for that vector.
    pub fn clear_interrupt_handler(&mut self, vector: u8) {
        self.interrupt_handlers[vector as usize] = None;
    }

    // -- debugger attachment point ----------------------------------------

    /// Attach a debugger, replacing any previously attached one. `step` will
    /// consult it before dispatching every subsequent instruction.
    pub fn attach_debugger(&mut self, hook: Box<dyn DebugHook>) {
        self.debugger = Some(hook);
    }

    /// Detach the current debugger, if any. The engine returns to running
    /// entirely off the guest's own IVT and resources.
    pub fn detach_debugger(&mut self) {
        self.debugger = None;
    }

    /// Whether a debugger is currently attached.
    pub fn has_debugger(&self) -> bool {
        self.debugger.is_some()
    }

    /// Service a software or hardware interrupt: either hand off to a
    /// registered host handler, or push FLAGS/CS/IP and load CS:IP from the
    /// guest's interrupt vector table at `vector * 4`.
    pub fn enter_interrupt(&mut self, mem: &mut Memory, vector: u8) {
        self.halted = false;
        if let Some(mut handler) = self.interrupt_handlers[vector as usize].take() {
            handler(self, mem);
            self.interrupt_handlers[vector as usize] = Some(handler);
            return;
        }

        let flags = self.get_flags();
        let cs = self.read_seg(SEG_CS);
        let ip = self.ip;
        crate::cpu::execute::push_word(self, mem, flags);
        crate::cpu::execute::push_word(self, mem, cs);
        crate::cpu::execute::push_word(self, mem, ip);

        self.set_flag(Self::IF, false);
        self.set_flag(Self::TF, false);

        let ivt_offset = (vector as u16).wrapping_mul(4);
        let new_ip = mem.read16(0, ivt_offset);
        let new_cs = mem.read16(0, ivt_offset.wrapping_add(2));
        self.write_seg(SEG_CS, new_cs);
        self.ip = new_ip;
    }

    // -- operand decode ----------------------------------------------------

    /// Fetch and decode a ModR/M byte (plus any displacement bytes) at CS:IP,
    /// advancing IP past it.
    pub fn decode_modrm(&mut self, mem: &Memory) -> ModRM {
        let byte = self.fetch8(mem);
        let modrm = ModRM::decode(byte);
        match modrm.mode {
            crate::cpu::decode::modrm::AddressingMode::MemoryDisp8 { .. } => {
                let disp = self.fetch8(mem) as i8;
                modrm.with_disp8(disp)
            }
            crate::cpu::decode::modrm::AddressingMode::MemoryDisp16 { .. } => {
                let disp = self.fetch16(mem) as i16;
                modrm.with_disp16(disp)
            }
            crate::cpu::decode::modrm::AddressingMode::DirectAddress { .. } => {
                let addr = self.fetch16(mem);
                modrm.with_direct_addr(addr)
            }
            _ => modrm,
        }
    }

    /// Build the `reg` field operand (always a register, never memory).
    pub fn decode_reg_operand(reg: u8, is_byte: bool) -> Operand {
        if is_byte {
            Operand::reg8(reg)
        } else {
            Operand::reg16(reg)
        }
    }

    /// Build the `r/m` field operand: a register for mod=11, otherwise a
    /// memory operand encoding the addressing mode so `read_operand`/
    /// `write_operand` can compute the effective address later.
    ///
    /// Direct addresses are encoded with the sentinel base_index `0xFF` and
    /// the real address stored in `disp`; every other memory mode stores
    /// the r/m field (0-7) in the low byte of `value` and leaves the
    /// address computation to `calculate_ea_from_operand`.
    pub fn decode_rm_operand(modrm: &ModRM, is_byte: bool) -> Operand {
        use crate::cpu::decode::modrm::AddressingMode;
        match modrm.mode {
            AddressingMode::RegisterDirect { rm_reg } => {
                if is_byte {
                    Operand::reg8(rm_reg)
                } else {
                    Operand::reg16(rm_reg)
                }
            }
            AddressingMode::DirectAddress { addr } => {
                let op_type = if is_byte {
                    OperandType::Mem8
                } else {
                    OperandType::Mem16
                };
                Operand::new(op_type, 0xFF).with_disp(addr as i16)
            }
            AddressingMode::MemoryIndirect { base_index } => {
                if is_byte {
                    Operand::mem8_disp(base_index, 0)
                } else {
                    Operand::mem16_disp(base_index, 0)
                }
            }
            AddressingMode::MemoryDisp8 { base_index, disp } => {
                if is_byte {
                    Operand::mem8_disp(base_index, disp as i16)
                } else {
                    Operand::mem16_disp(base_index, disp as i16)
                }
            }
            AddressingMode::MemoryDisp16 { base_index, disp } => {
                if is_byte {
                    Operand::mem8_disp(base_index, disp)
                } else {
                    Operand::mem16_disp(base_index, disp)
                }
            }
        }
    }

    /// Resolve a memory operand's effective address. `base_index == 0xFF`
    /// marks a direct address (already sitting in `operand.disp`);
    /// otherwise this replays the 8086 base/index table, applying any
    /// active segment override and the operand's own displacement.
    pub fn calculate_ea_from_operand(&self, operand: &Operand) -> (u8, u16) {
        let base_index = (operand.value & 0xFF) as u8;
        if base_index == 0xFF {
            let seg = self.segment_override.unwrap_or(SEG_DS);
            return (seg, operand.disp as u16);
        }

        let disp = operand.disp as u16;
        let (default_seg, offset) = match base_index {
            0b000 => (
                SEG_DS,
                self.read_reg16(3).wrapping_add(self.read_reg16(6)).wrapping_add(disp),
            ),
            0b001 => (
                SEG_DS,
                self.read_reg16(3).wrapping_add(self.read_reg16(7)).wrapping_add(disp),
            ),
            0b010 => (
                SEG_SS,
                self.read_reg16(5).wrapping_add(self.read_reg16(6)).wrapping_add(disp),
            ),
            0b011 => (
                SEG_SS,
                self.read_reg16(5).wrapping_add(self.read_reg16(7)).wrapping_add(disp),
            ),
            0b100 => (SEG_DS, self.read_reg16(6).wrapping_add(disp)),
            0b101 => (SEG_DS, self.read_reg16(7).wrapping_add(disp)),
            0b110 => (SEG_SS, self.read_reg16(5).wrapping_add(disp)),
            0b111 => (SEG_DS, self.read_reg16(3).wrapping_add(disp)),
            _ => unreachable!("base_index is masked to 3 bits"),
        };
        let seg = self.segment_override.unwrap_or(default_seg);
        (seg, offset)
    }

    /// Read an operand's value, resolving memory addressing as needed.
    pub fn read_operand(&self, mem: &Memory, operand: &Operand) -> u16 {
        match operand.op_type {
            OperandType::None => 0,
            OperandType::Reg8 => self.read_reg8(operand.value as u8) as u16,
            OperandType::Reg16 => self.read_reg16(operand.value as u8),
            OperandType::SegReg => self.read_seg(operand.value as u8),
            OperandType::Imm8 | OperandType::Rel8 => operand.value,
            OperandType::Imm16 | OperandType::Rel16 => operand.value,
            OperandType::Direct => operand.value,
            OperandType::Mem8 => {
                let (seg, offset) = self.calculate_ea_from_operand(operand);
                mem.read8(self.read_seg(seg), offset) as u16
            }
            OperandType::Mem16 => {
                let (seg, offset) = self.calculate_ea_from_operand(operand);
                mem.read16(self.read_seg(seg), offset)
            }
        }
    }

    /// Write a value to an operand, resolving memory addressing as needed.
    pub fn write_operand(&mut self, mem: &mut Memory, operand: &Operand, value: u16) {
        match operand.op_type {
            OperandType::None
            | OperandType::Imm8
            | OperandType::Imm16
            | OperandType::Rel8
            | OperandType::Rel16
            | OperandType::Direct => {}
            OperandType::Reg8 => self.write_reg8(operand.value as u8, value as u8),
            OperandType::Reg16 => self.write_reg16(operand.value as u8, value),
            OperandType::SegReg => self.write_seg(operand.value as u8, value),
            OperandType::Mem8 => {
                let (seg, offset) = self.calculate_ea_from_operand(operand);
                mem.write8(self.read_seg(seg), offset, value as u8);
            }
            OperandType::Mem16 => {
                let (seg, offset) = self.calculate_ea_from_operand(operand);
                mem.write16(self.read_seg(seg), offset, value);
            }
        }
    }

    /// Compute the effective address of a memory operand without reading
    /// it, for LEA.
    pub fn effective_address_of(&self, operand: &Operand) -> u16 {
        let (_, offset) = self.calculate_ea_from_operand(operand);
        offset
    }

    // -- fetch -------------------------------------------------------------

    pub(crate) fn fetch8(&mut self, mem: &Memory) -> u8 {
        let byte = mem.read8(self.read_seg(SEG_CS), self.ip);
        self.ip = self.ip.wrapping_add(1);
        byte
    }

    pub(crate) fn fetch16(&mut self, mem: &Memory) -> u16 {
        let lo = self.fetch8(mem) as u16;
        let hi = self.fetch8(mem) as u16;
        (hi << 8) | lo
    }

    // -- main loop -----------------------------------------------------------

    /// Execute exactly one instruction (consuming any prefix bytes that
    /// precede it).
    ///
    /// Returns `Ok(())` on a normally executed instruction, or an error if
    /// decode failed or the instruction trapped. HLT does not return an
    /// error here; it only sets `halted`, which a caller (or `run`) is
    /// expected to check.
    pub fn step(&mut self, mem: &mut Memory) -> Result<(), CoreError> {
        self.segment_override = None;
        self.repeat_prefix = RepeatPrefix::None;

        if self.halted {
            return Ok(());
        }

        // Promote an STI armed by the *previous* step: this step's
        // instruction is the one that must finish executing before IF
        // becomes visible to PUSHF or a debugger register read.
        if self.sti_shadow == StiShadow::Armed {
            self.sti_shadow = StiShadow::Due;
        }

        // Consulted once per instruction, before any of its prefix/opcode
        // bytes are dispatched. Taken out of `self` for the call so the
        // hook can take `&mut Cpu` itself,
        // mirroring the interrupt-handler table's take/call/restore pattern.
        if let Some(mut hook) = self.debugger.take() {
            let keep_running = hook.before_step(self, mem);
            self.debugger = Some(hook);
            if !keep_running {
                self.halted = true;
                return Ok(());
            }
        }

        loop {
            let cs = self.read_seg(SEG_CS);
            let ip = self.ip;
            let opcode = self.fetch8(mem);

            let handler = DISPATCH_TABLE[opcode as usize]
                .ok_or(CoreError::DecodeError { opcode, cs, ip })?;

            let instr = crate::cpu::dispatch::decode_instruction(self, mem, opcode, handler);
            instr.execute(self, mem)?;

            // A segment-override or repeat prefix consumes one byte and
            // leaves IP at the next opcode; loop around to decode the
            // instruction it actually modifies.
            let is_prefix = matches!(opcode, 0x26 | 0x2E | 0x36 | 0x3E | 0xF0 | 0xF2 | 0xF3);
            if !is_prefix {
                break;
            }
        }

        // The instruction dispatched above is the one the shadow was
        // waiting on; IF becomes visible now that it has fully executed.
        if self.sti_shadow == StiShadow::Due {
            self.set_flag(Self::IF, true);
            self.sti_shadow = StiShadow::None;
        }

        if let Some(mut hook) = self.debugger.take() {
            hook.after_step(self);
            self.debugger = Some(hook);
        }

        Ok(())
    }

    /// Step repeatedly until `max_steps` instructions have executed or the
    /// CPU halts, whichever comes first. Returns the number of steps
    /// actually taken.
    pub fn run(&mut self, mem: &mut Memory, max_steps: usize) -> Result<usize, CoreError> {
        for i in 0..max_steps {
            if self.halted {
                return Ok(i);
            }
            self.step(mem)?;
        }
        Ok(max_steps)
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
