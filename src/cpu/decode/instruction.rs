//! Decoded instruction representation

use super::operands::{Operand, OperandType};
use crate::cpu::Cpu;
use crate::error::CoreError;
use crate::memory::Memory;

/// Instruction handler function signature.
///
/// Takes mutable CPU state, memory, and the decoded instruction. Returns
/// an error if execution trapped (divide by zero) or the instruction
/// requested a halt the caller should observe.
pub type InstructionHandler = fn(&mut Cpu, &mut Memory, &DecodedInstruction) -> Result<(), CoreError>;

/// A fully decoded instruction ready for execution.
#[derive(Clone)]
pub struct DecodedInstruction {
    /// The opcode byte.
    pub opcode: u8,

    /// First operand (destination for most instructions).
    pub dst: Operand,

    /// Second operand (source for most instructions).
    pub src: Operand,

    /// Total length of the instruction in bytes, including the opcode.
    pub length: u8,

    /// The ModR/M `reg` field, for handlers that need the raw opcode
    /// extension value rather than an operand built from it (the
    /// immediate-count shift group, which needs both the operation and a
    /// fetched count byte and so can't stash the operation in `src` the
    /// way the count=1/count=CL forms do).
    pub reg: u8,

    /// Handler selected for this opcode.
    pub handler: InstructionHandler,
}

impl DecodedInstruction {
    /// Create a new decoded instruction with no operands.
    pub fn new(opcode: u8, handler: InstructionHandler) -> Self {
        Self {
            opcode,
            dst: Operand::none(),
            src: Operand::none(),
            length: 1,
            reg: 0,
            handler,
        }
    }

    /// Set the ModR/M reg field, for group opcodes whose handler needs it
    /// directly rather than via an operand.
    pub fn with_reg(mut self, reg: u8) -> Self {
        self.reg = reg;
        self
    }

    /// Set the destination operand.
    pub fn with_dst(mut self, dst: Operand) -> Self {
        self.dst = dst;
        self
    }

    /// Set the source operand.
    pub fn with_src(mut self, src: Operand) -> Self {
        self.src = src;
        self
    }

    /// Set the instruction length.
    pub fn with_length(mut self, length: u8) -> Self {
        self.length = length;
        self
    }

    /// Check if the instruction has a destination operand.
    pub fn has_dst(&self) -> bool {
        self.dst.op_type != OperandType::None
    }

    /// Check if the instruction has a source operand.
    pub fn has_src(&self) -> bool {
        self.src.op_type != OperandType::None
    }

    /// Execute the instruction.
    #[inline(always)]
    pub fn execute(&self, cpu: &mut Cpu, mem: &mut Memory) -> Result<(), CoreError> {
        (self.handler)(cpu, mem, self)
    }
}

impl std::fmt::Debug for DecodedInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedInstruction")
            .field("opcode", &format_args!("{:#04x}", self.opcode))
            .field("dst", &self.dst)
            .field("src", &self.src)
            .field("length", &self.length)
            .field("handler", &"<fn>")
            .finish()
    }
}
