//! # Vector Gate Wiring
//!
//! Each line gets its own low-level entry stub. The stubs are assembly
//! outside this crate; each records which vector fired and jumps to the
//! router. This module only knows their addresses and hands them to
//! whatever owns the IDT.

use crate::line::{IrqLine, NUM_LINES};

/// Address of a per-line assembly entry stub
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct EntryStub(usize);

impl EntryStub {
    /// Wrap a stub address
    #[inline]
    pub const fn new(address: usize) -> Self {
        Self(address)
    }

    /// Wrap a stub symbol
    #[inline]
    pub fn from_fn(stub: unsafe extern "C" fn()) -> Self {
        Self(stub as usize)
    }

    /// Stub address
    #[inline]
    pub const fn address(self) -> usize {
        self.0
    }
}

/// The sixteen entry stubs, indexed by line
pub type IrqStubs = [EntryStub; NUM_LINES];

/// Installs one interrupt gate in the IDT
pub trait VectorGateInstaller {
    /// Point `vector` at `stub`
    fn install_gate(&mut self, vector: u8, stub: EntryStub);
}

impl<T: VectorGateInstaller + ?Sized> VectorGateInstaller for &mut T {
    #[inline]
    fn install_gate(&mut self, vector: u8, stub: EntryStub) {
        (**self).install_gate(vector, stub)
    }
}

/// Install one gate per line, vector `base + line` to `stubs[line]`
pub fn install_gates<G: VectorGateInstaller + ?Sized>(installer: &mut G, base: u8, stubs: &IrqStubs) {
    for line in IrqLine::all() {
        let vector = line.vector(base);
        let stub = stubs[line.index()];
        installer.install_gate(vector, stub);
        log::debug!("PIC: {:?} -> vector {:#04x} (stub {:#x})", line, vector, stub.address());
    }
}

// =============================================================================
// Tests
// =============================================================================
