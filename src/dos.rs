//! A minimal in-process DOS service layer: a first-fit paragraph allocator
//! (the "DOS memory arena") and the INT 20h/INT 21h handlers needed to run
//! simple console programs under it.
//!
//! Grounded on the original's `DosMem` block allocator and `Dos.Int21`
//! dispatch; AH codes not implemented here fall through to a warning log
//! rather than an error, matching the original's `default:` case.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use thiserror::Error;

use crate::cpu::state::{SEG_DS, SEG_ES};
use crate::cpu::Cpu;
use crate::loader::{self, Executable};
use crate::memory::Memory;

/// Paragraphs of slack tolerated before a split allocation leaves a
/// separate free block behind. 512 paragraphs is 8 KiB.
const ALLOWED_SLACK_SPACE: u16 = 512;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DosMemError {
    #[error("unable to allocate {0} paragraphs: arena exhausted")]
    OutOfMemory(u16),
    #[error("no allocated block starts at segment {0:04x}")]
    NotFound(u16),
    #[error("block at segment {0:04x} cannot grow to the requested size")]
    CannotGrow(u16),
}

/// One paragraph-granular block of the arena: either free or owned by the
/// segment of the PSP that allocated it (the "owner" doubles as a DOS PID).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosMemBlock {
    pub avail: bool,
    pub start: u16,
    pub end: u16,
    pub owner: u16,
}

impl DosMemBlock {
    pub fn size(&self) -> u16 {
        self.end - self.start
    }
}

/// A first-fit paragraph allocator over a fixed segment range.
pub struct DosMem {
    start_seg: u16,
    end_seg: u16,
    blocks: Vec<DosMemBlock>,
}

impl DosMem {
    pub fn new(start_seg: u16, end_seg: u16) -> Self {
        Self { start_seg, end_seg, blocks: Vec::new() }
    }

    fn find_block(&self, start: u16) -> Option<usize> {
        self.blocks.iter().position(|b| b.start == start)
    }

    /// Allocate `size` paragraphs from the first free block big enough to
    /// hold them, splitting it unless the leftover would be smaller than
    /// the allowed slack.
    pub fn allocate(&mut self, size: u16) -> Result<u16, DosMemError> {
        if self.blocks.is_empty() {
            self.blocks.push(DosMemBlock { avail: true, start: self.start_seg, end: self.end_seg, owner: 0 });
        }

        for i in 0..self.blocks.len() {
            let block = self.blocks[i];
            if !block.avail || block.size() < size {
                continue;
            }
            if block.size().saturating_add(ALLOWED_SLACK_SPACE) <= size {
                self.blocks[i].avail = false;
                return Ok(block.start);
            }
            let new_block = DosMemBlock { avail: false, start: block.start, end: block.start + size, owner: 0 };
            self.blocks[i].start = new_block.end;
            self.blocks.insert(i, new_block);
            return Ok(new_block.start);
        }
        Err(DosMemError::OutOfMemory(size))
    }

    /// Grow or shrink the block at `start` to `needed` paragraphs by
    /// absorbing immediately-following free blocks.
    pub fn resize(&mut self, start: u16, needed: u16) -> Result<u16, DosMemError> {
        let start_block = self.find_block(start).ok_or(DosMemError::NotFound(start))?;
        let mut last_block = start_block;
        for i in (start_block + 1)..self.blocks.len() {
            if !self.blocks[i].avail {
                break;
            }
            last_block = i;
            if self.blocks[i].end - start >= needed {
                break;
            }
        }
        if start_block == last_block {
            return Err(DosMemError::CannotGrow(start));
        }

        let merged_end = self.blocks[last_block].end;
        let owner = self.blocks[start_block].owner;
        self.blocks.splice(
            start_block..=last_block,
            std::iter::once(DosMemBlock { avail: false, start, end: merged_end, owner }),
        );

        let block_size = merged_end - start;
        if block_size.saturating_add(ALLOWED_SLACK_SPACE) > needed {
            let free_block = DosMemBlock { avail: true, start: start + needed, end: merged_end, owner: 0 };
            self.blocks[start_block].end = start + needed;
            self.blocks.insert(start_block + 1, free_block);
        }
        Ok(self.blocks[start_block].size())
    }
}

/// The set of AH=09 string-terminator byte, matching DOS's `$`-terminated
/// print-string convention.
const STRING_TERMINATOR: u8 = b'$';

/// DOS service state: the memory arena, an installed CPU's interrupt
/// handlers (INT 20h/21h), and the console sinks AH=02/09/40 write to.
pub struct Dos {
    pub mem: DosMem,
    out: Box<dyn Write>,
    err: Box<dyn Write>,
}

impl Dos {
    /// Build a DOS service layer with its own arena covering the
    /// conventional-memory range above the loader's reserved low segments.
    pub fn new(out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        Self { mem: DosMem::new(0x0C85, 0x9FC0), out, err }
    }

    /// Register INT 20h/INT 21h handlers on `cpu` that dispatch into this
    /// service layer. Returns a shared handle so a host can still reach
    /// `Dos::mem`/`Dos::load` after installation.
    pub fn install(self, cpu: &mut Cpu) -> Rc<RefCell<Dos>> {
        let dos = Rc::new(RefCell::new(self));

        cpu.set_interrupt_handler(
            0x20,
            Box::new(move |cpu: &mut Cpu, _mem: &mut Memory| {
                log::trace!("int20: program terminate");
                cpu.halted = true;
            }),
        );

        let int21 = dos.clone();
        cpu.set_interrupt_handler(
            0x21,
            Box::new(move |cpu: &mut Cpu, mem: &mut Memory| {
                int21.borrow_mut().service_int21(cpu, mem);
            }),
        );

        dos
    }

    fn service_int21(&mut self, cpu: &mut Cpu, mem: &mut Memory) {
        let ah = cpu.read_reg8(4);
        log::trace!("int21: ah={:02x} ax={:04x}", ah, cpu.read_reg16(0));
        match ah {
            0x02 => {
                // Print character in DL.
                let dl = cpu.read_reg8(2);
                let _ = self.out.write_all(&[dl]);
            }
            0x09 => {
                // Print $-terminated string at DS:DX.
                let ds = cpu.read_seg(SEG_DS);
                let dx = cpu.read_reg16(2);
                let bytes = string_up_to_terminator(mem, ds, dx);
                let _ = self.out.write_all(&bytes);
            }
            0x25 => {
                // Set interrupt vector AL from DS:DX into the IVT.
                let al = cpu.read_reg8(0);
                let ds = cpu.read_seg(SEG_DS);
                let dx = cpu.read_reg16(2);
                let ivt_off = (al as u16).wrapping_mul(4);
                mem.write16(0, ivt_off, dx);
                mem.write16(0, ivt_off.wrapping_add(2), ds);
            }
            0x30 => {
                // Report DOS version 3.2.
                cpu.write_reg8(4, 2); // AH
                cpu.write_reg8(0, 3); // AL
            }
            0x35 => {
                // Get interrupt vector AL into ES:BX.
                let al = cpu.read_reg8(0);
                let ivt_off = (al as u16).wrapping_mul(4);
                let ip = mem.read16(0, ivt_off);
                let seg = mem.read16(0, ivt_off.wrapping_add(2));
                cpu.write_seg(SEG_ES, seg);
                cpu.write_reg16(3, ip); // BX
            }
            0x40 => {
                // Write CX bytes from DS:DX to handle BX (1=stdout, 2=stderr).
                let bx = cpu.read_reg16(3);
                let cx = cpu.read_reg16(1) as usize;
                let ds = cpu.read_seg(SEG_DS);
                let dx = cpu.read_reg16(2);
                let bytes: Vec<u8> = (0..cx as u16).map(|i| mem.read8(ds, dx.wrapping_add(i))).collect();
                match bx {
                    1 => {
                        let _ = self.out.write_all(&bytes);
                    }
                    2 => {
                        let _ = self.err.write_all(&bytes);
                    }
                    _ => log::trace!("int21 ah=40: unhandled file handle {}", bx),
                }
            }
            0x4A => {
                // SETBLOCK: resize the arena block at ES to BX paragraphs.
                let es = cpu.read_seg(SEG_ES);
                let bx = cpu.read_reg16(3);
                match self.mem.resize(es, bx) {
                    Ok(new_size) => cpu.write_reg16(3, new_size),
                    Err(e) => {
                        log::trace!("int21 ah=4a: {}", e);
                        cpu.set_flag(Cpu::CF, true);
                    }
                }
            }
            0x4C => {
                log::trace!("int21 ah=4c: program terminate, al={:02x}", cpu.read_reg8(0));
                cpu.halted = true;
            }
            other => log::warn!("unhandled DOS interrupt: ah={:02x}", other),
        }
    }

    /// Allocate an environment block, then an image block, write the PSP,
    /// and load `exe` into it, returning the segment the loaded program
    /// starts executing under.
    pub fn load(&mut self, exe: &Executable, cpu: &mut Cpu, mem: &mut Memory) -> Result<u16, DosMemError> {
        let env_seg = self.mem.allocate(10)?;
        mem.load(env_seg, 0, b"PATH=Z:\\\n");

        let segments_needed = exe.segments_needed();
        let base_seg = self.mem.allocate(segments_needed)?;

        match exe {
            Executable::Exe { .. } => {
                loader::write_psp(mem, base_seg, base_seg + segments_needed, env_seg);
                loader::load_exe(exe, cpu, mem, base_seg);
            }
            Executable::Com { .. } => {
                loader::write_psp(mem, base_seg, base_seg + segments_needed, env_seg);
                loader::load_com(exe, cpu, mem, base_seg);
            }
            Executable::Image { .. } => {
                loader::load_image(exe, cpu, mem, base_seg);
            }
        }

        Ok(base_seg)
    }
}

fn string_up_to_terminator(mem: &Memory, seg: u16, mut offset: u16) -> Vec<u8> {
    let mut bytes = Vec::new();
    loop {
        let b = mem.read8(seg, offset);
        if b == STRING_TERMINATOR {
            break;
        }
        bytes.push(b);
        offset = offset.wrapping_add(1);
    }
    bytes
}
