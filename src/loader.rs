//! Executable parsing and guest-memory image loading.
//!
//! Three executable shapes are recognized: a plain COM-style binary (no MZ
//! signature, loaded at offset 0x100 past a PSP), an MZ-signed EXE carrying
//! a relocation table, and a headerless `Image` used only by test harnesses
//! that want to drop raw bytes at a fixed segment with no PSP and no DOS
//! arena involved at all.

use thiserror::Error;

use crate::cpu::state::{SEG_CS, SEG_DS, SEG_ES, SEG_SS};
use crate::cpu::Cpu;
use crate::memory::Memory;

/// Minimum byte count for a file to plausibly carry an MZ header.
const MIN_EXE_HEADER_BYTES: usize = 28;

/// Errors raised while parsing an executable image.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum LoaderError {
    #[error("file too small ({0} bytes) to contain an MZ header")]
    TooShort(usize),
}

/// A single relocation table entry: a segment:offset pair whose word needs
/// the image base segment added to it once the image lands in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    pub offset: u16,
    pub segment: u16,
}

/// The fields of an MZ header needed to place and relocate an EXE image.
/// Field names follow the on-disk layout, not a platform ABI.
#[derive(Debug, Clone, Default)]
pub struct ExeHeader {
    pub bytes_in_last_block: u16,
    pub blocks_in_file: u16,
    pub header_paragraphs: u16,
    pub min_extra_paragraphs: u16,
    pub max_extra_paragraphs: u16,
    pub ss: u16,
    pub sp: u16,
    pub ip: u16,
    pub cs: u16,
    pub relocations: Vec<Relocation>,
}

/// What kind of executable was parsed.
#[derive(Debug, Clone)]
pub enum Executable {
    /// A headerless binary, loaded 0x100 bytes past the start of its
    /// segment, with a PSP expected to precede it.
    Com { data: Vec<u8> },
    /// An MZ-signed binary with a relocation table and explicit initial
    /// CS:IP / SS:SP.
    Exe { header: ExeHeader, data: Vec<u8> },
    /// A raw blob with no PSP and no relocation, placed at offset 0 of its
    /// segment. Used by test harnesses, never by the DOS loader proper.
    Image { data: Vec<u8> },
}

impl Executable {
    /// Parse an executable from its on-disk bytes. Files without the `MZ`
    /// signature in their first two bytes are treated as COM images.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoaderError> {
        if bytes.len() < 2 {
            return Err(LoaderError::TooShort(bytes.len()));
        }
        if bytes[0] != b'M' || bytes[1] != b'Z' {
            return Ok(Executable::Com { data: bytes.to_vec() });
        }
        if bytes.len() < MIN_EXE_HEADER_BYTES {
            return Err(LoaderError::TooShort(bytes.len()));
        }

        let u16_at = |off: usize| u16::from_le_bytes([bytes[off], bytes[off + 1]]);

        let num_relos = u16_at(6);
        let relo_table_offset = u16_at(24);
        let header_paragraphs = u16_at(8);

        let mut relocations = Vec::with_capacity(num_relos as usize);
        for i in 0..num_relos as usize {
            let off_off = relo_table_offset as usize + i * 4;
            let seg_off = off_off + 2;
            relocations.push(Relocation {
                offset: u16_at(off_off),
                segment: u16_at(seg_off),
            });
        }

        let header = ExeHeader {
            bytes_in_last_block: u16_at(2),
            blocks_in_file: u16_at(4),
            header_paragraphs,
            min_extra_paragraphs: u16_at(10),
            max_extra_paragraphs: u16_at(12),
            ss: u16_at(14),
            sp: u16_at(16),
            ip: u16_at(20),
            cs: u16_at(22),
            relocations,
        };

        let body_start = header_paragraphs as usize * 0x10;
        let data = bytes.get(body_start..).unwrap_or(&[]).to_vec();

        Ok(Executable::Exe { header, data })
    }

    /// Number of 16-byte paragraphs the DOS memory arena must reserve to
    /// hold this executable. EXEs size to their header; COM and raw images
    /// always claim a full 64 KiB segment.
    pub fn segments_needed(&self) -> u16 {
        match self {
            Executable::Exe { header, .. } => {
                (header.blocks_in_file / 32).wrapping_add(header.min_extra_paragraphs) + 1
            }
            Executable::Com { .. } | Executable::Image { .. } => 0x1000,
        }
    }

    fn data(&self) -> &[u8] {
        match self {
            Executable::Com { data } => data,
            Executable::Exe { data, .. } => data,
            Executable::Image { data } => data,
        }
    }
}

/// Write the 256-byte Program Segment Prefix at `psp_seg`. Only the fields
/// a simple console program needs are populated; the rest of the PSP (JFT,
/// command tail, ...) is left zeroed.
pub fn write_psp(mem: &mut Memory, psp_seg: u16, next_free_seg: u16, env_seg: u16) {
    mem.write8(psp_seg, 0, 0xCD);
    mem.write8(psp_seg, 1, 0x20);
    mem.write16(psp_seg, 2, next_free_seg);
    mem.write8(psp_seg, 10, 0x22);
    mem.write8(psp_seg, 14, 0x23);
    mem.write8(psp_seg, 18, 0x24);
    mem.write16(psp_seg, 22, 0xFFFE);
    mem.write16(psp_seg, 44, env_seg);
}

/// Load a COM image at `base_seg`, PSP already written at `base_seg`. CS,
/// DS, ES, and SS all alias the same segment; IP starts at 0x100, SP at
/// the top of the segment.
pub fn load_com(exe: &Executable, cpu: &mut Cpu, mem: &mut Memory, base_seg: u16) {
    cpu.write_seg(SEG_CS, base_seg);
    cpu.write_seg(SEG_DS, base_seg);
    cpu.write_seg(SEG_ES, base_seg);
    cpu.write_seg(SEG_SS, base_seg);
    cpu.write_reg16(4, 0xFFFE); // SP
    cpu.ip = 0x0100;
    mem.load(base_seg, 0x0100, exe.data());
}

/// Load a raw headerless image at `base_seg`. No PSP, no relocation; DS is
/// left at segment 0 since there is no DOS arena to point it at.
pub fn load_image(exe: &Executable, cpu: &mut Cpu, mem: &mut Memory, base_seg: u16) {
    cpu.write_seg(SEG_CS, base_seg);
    cpu.write_seg(SEG_DS, 0);
    cpu.write_seg(SEG_ES, base_seg);
    cpu.write_seg(SEG_SS, base_seg);
    cpu.write_reg16(4, 0xFFFE); // SP
    cpu.ip = 0;
    mem.load(base_seg, 0, exe.data());
}

/// Load an EXE image at `base_seg`, PSP already written at `base_seg`. CS
/// and SS are the header's CS/SS added to the image segment (the image
/// itself starts a paragraph past the PSP); relocations are fixed up in
/// place once the image is copied in.
pub fn load_exe(exe: &Executable, cpu: &mut Cpu, mem: &mut Memory, base_seg: u16) {
    let Executable::Exe { header, .. } = exe else {
        panic!("load_exe called on a non-EXE executable");
    };

    let image_seg = base_seg.wrapping_add(0x10);
    let cs = image_seg.wrapping_add(header.cs);
    let ss = image_seg.wrapping_add(header.ss);

    cpu.write_seg(SEG_CS, cs);
    cpu.write_seg(SEG_DS, base_seg);
    cpu.write_seg(SEG_ES, base_seg);
    cpu.write_seg(SEG_SS, ss);
    cpu.write_reg16(4, header.sp); // SP
    cpu.write_reg16(5, 0); // BP
    cpu.ip = header.ip;

    mem.load(image_seg, 0, exe.data());

    for relo in &header.relocations {
        let seg = image_seg.wrapping_add(relo.segment);
        let word = mem.read16(seg, relo.offset);
        mem.write16(seg, relo.offset, word.wrapping_add(image_seg));
        log::trace!(
            "relocation [{:04x}:{:04x}] += {:04x}",
            relo.segment,
            relo.offset,
            image_seg
        );
    }

    log::debug!(
        "exe loaded: cs={:04x} ds={:04x} ss={:04x} ip={:04x} sp={:04x}",
        cs,
        base_seg,
        ss,
        header.ip,
        header.sp
    );
}
