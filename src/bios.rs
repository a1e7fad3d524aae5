//! A minimal BIOS service layer: INT 10h teletype console output and an
//! INT 13h disk-read stub adequate for the loader's needs.
//!
//! Grounded on the original's `Bios.Int10`/`Bios.Int13` handlers; AH codes
//! not implemented here fall through to a trace log rather than an error,
//! matching the original's `default:` case.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use crate::cpu::state::SEG_ES;
use crate::cpu::Cpu;
use crate::memory::Memory;

/// BIOS service state: the console sink AH=09/0A/0E/13 write to.
pub struct Bios {
    out: Box<dyn Write>,
}

impl Bios {
    pub fn new(out: Box<dyn Write>) -> Self {
        Self { out }
    }

    /// Register INT 10h/INT 13h handlers on `cpu` that dispatch into this
    /// service layer. Returns a shared handle so a host can still reach the
    /// sink (or swap it) after installation.
    pub fn install(self, cpu: &mut Cpu) -> Rc<RefCell<Bios>> {
        let bios = Rc::new(RefCell::new(self));

        let int10 = bios.clone();
        cpu.set_interrupt_handler(
            0x10,
            Box::new(move |cpu: &mut Cpu, mem: &mut Memory| {
                int10.borrow_mut().service_int10(cpu, mem);
            }),
        );

        cpu.set_interrupt_handler(
            0x13,
            Box::new(|cpu: &mut Cpu, _mem: &mut Memory| {
                service_int13(cpu);
            }),
        );

        bios
    }

    fn service_int10(&mut self, cpu: &mut Cpu, mem: &mut Memory) {
        let ah = cpu.read_reg8(4);
        log::trace!("int10: ah={:02x} ax={:04x}", ah, cpu.read_reg16(0));
        match ah {
            0x09 | 0x0A => {
                // Write AL, CX times. AH=09 should also set the attribute
                // in BL; this stub treats both forms as plain teletype
                // output, matching the original's "HACK" comment.
                let al = cpu.read_reg8(0);
                let count = cpu.read_reg16(1).max(1);
                for _ in 0..count {
                    let _ = self.out.write_all(&[al]);
                }
            }
            0x0E => {
                // Teletype output: write AL and advance the cursor (cursor
                // position is not modeled; there is no text-mode frame
                // buffer backing this stub).
                let al = cpu.read_reg8(0);
                let _ = self.out.write_all(&[al]);
            }
            0x13 => {
                // Write string: ES:BP points at the string, CX is its
                // length.
                let es = cpu.read_seg(SEG_ES);
                let bp = cpu.read_reg16(5);
                let len = cpu.read_reg16(1) as usize;
                let bytes: Vec<u8> = (0..len as u16).map(|i| mem.read8(es, bp.wrapping_add(i))).collect();
                let _ = self.out.write_all(&bytes);
            }
            other => log::trace!("unhandled BIOS int10 call: ah={:02x}", other),
        }
    }
}

/// INT 13h disk services: only AH=02 (read sectors) is modeled, and only
/// well enough to report success with no data transferred — sufficient for
/// loaders that probe disk geometry before falling back to a DOS-level
/// load. The original makes the same trade: clear CF, zero AH, and do no
/// actual I/O.
fn service_int13(cpu: &mut Cpu) {
    let ah = cpu.read_reg8(4);
    log::trace!("int13: ah={:02x} ax={:04x}", ah, cpu.read_reg16(0));
    match ah {
        0x02 => {
            cpu.write_reg8(4, 0); // AH = status 0 (success)
            cpu.set_flag(Cpu::CF, false);
        }
        other => log::trace!("unhandled BIOS int13 call: ah={:02x}", other),
    }
}
