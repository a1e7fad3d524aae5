//! Instruction decoding: ModR/M parsing and operand representation.

pub mod instruction;
pub mod modrm;
pub mod operands;

pub use instruction::{DecodedInstruction, InstructionHandler};
pub use modrm::{AddressingMode, ModRM};
pub use operands::{Operand, OperandType};
