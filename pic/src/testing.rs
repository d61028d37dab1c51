//! Test doubles for the I/O and gate capabilities.

use crate::error::IoError;
use crate::gates::{EntryStub, IrqStubs, VectorGateInstaller};
use crate::io::{offsets, IoAddr, PortIo};
use crate::line::{Chip, NUM_LINES};
use crate::regs::Icw1;

/// One recorded register write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Write {
    pub chip: Chip,
    pub offset: u16,
    pub value: u8,
}

pub const fn cmd(chip: Chip, value: u8) -> Write {
    Write {
        chip,
        offset: offsets::COMMAND,
        value,
    }
}

pub const fn data(chip: Chip, value: u8) -> Write {
    Write {
        chip,
        offset: offsets::DATA,
        value,
    }
}

/// Per-chip model just deep enough to serve mask reads
#[derive(Debug, Default, Clone, Copy)]
struct ChipModel {
    /// Initialization words still expected on the data port
    pending_icws: u8,
    imr: u8,
}

/// Records every write and models the mask register of both chips
///
/// A clone starts from the same state but records on its own.
#[derive(Debug, Clone)]
pub struct RecordingIo {
    pub primary: IoAddr,
    pub secondary: IoAddr,
    pub writes: Vec<Write>,
    pub waits: usize,
    /// Fail the write with this index (0-based, counting every write issued)
    pub fail_at: Option<usize>,
    issued: usize,
    chips: [ChipModel; 2],
}

impl RecordingIo {
    pub fn new() -> Self {
        Self::with_handles(IoAddr::legacy_primary(), IoAddr::legacy_secondary())
    }

    pub fn with_handles(primary: IoAddr, secondary: IoAddr) -> Self {
        Self {
            primary,
            secondary,
            writes: Vec::new(),
            waits: 0,
            fail_at: None,
            issued: 0,
            chips: [ChipModel::default(); 2],
        }
    }

    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub fn set_masks(&mut self, primary: u8, secondary: u8) {
        self.chips[0].imr = primary;
        self.chips[1].imr = secondary;
    }

    pub fn masks(&self) -> (u8, u8) {
        (self.chips[0].imr, self.chips[1].imr)
    }

    pub fn take(&mut self) -> Vec<Write> {
        core::mem::take(&mut self.writes)
    }

    fn chip_of(&self, addr: IoAddr, offset: u16) -> Result<Chip, IoError> {
        if addr == self.primary {
            Ok(Chip::Primary)
        } else if addr == self.secondary {
            Ok(Chip::Secondary)
        } else {
            Err(IoError::Unreachable {
                base: addr.base(),
                offset,
            })
        }
    }

    fn model(&mut self, chip: Chip) -> &mut ChipModel {
        match chip {
            Chip::Primary => &mut self.chips[0],
            Chip::Secondary => &mut self.chips[1],
        }
    }
}

impl PortIo for RecordingIo {
    fn write_u8(&mut self, addr: IoAddr, offset: u16, value: u8) -> Result<(), IoError> {
        let chip = self.chip_of(addr, offset)?;
        let index = self.issued;
        self.issued += 1;
        if self.fail_at == Some(index) {
            return Err(IoError::Unreachable {
                base: addr.base(),
                offset,
            });
        }
        self.writes.push(Write {
            chip,
            offset,
            value,
        });

        let model = self.model(chip);
        match offset {
            offsets::COMMAND if value & Icw1::INIT.bits() != 0 => {
                model.pending_icws = 3;
                model.imr = 0;
            },
            offsets::DATA if model.pending_icws > 0 => model.pending_icws -= 1,
            offsets::DATA => model.imr = value,
            _ => {},
        }
        Ok(())
    }

    fn read_u8(&mut self, addr: IoAddr, offset: u16) -> Result<u8, IoError> {
        let chip = self.chip_of(addr, offset)?;
        match offset {
            offsets::DATA => Ok(self.model(chip).imr),
            _ => Ok(0),
        }
    }

    fn io_wait(&mut self) {
        self.waits += 1;
    }
}

/// Records installed gates
#[derive(Debug, Default)]
pub struct RecordingGates {
    pub installed: Vec<(u8, EntryStub)>,
}

impl VectorGateInstaller for RecordingGates {
    fn install_gate(&mut self, vector: u8, stub: EntryStub) {
        self.installed.push((vector, stub));
    }
}

/// Sixteen distinct fake stub addresses
pub fn stubs() -> IrqStubs {
    let mut stubs = [EntryStub::new(0); NUM_LINES];
    for (n, stub) in stubs.iter_mut().enumerate() {
        *stub = EntryStub::new(0xFFFF_8000_0010_0000 + n * 0x10);
    }
    stubs
}
