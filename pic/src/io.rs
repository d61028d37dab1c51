//! # I/O Handles and Access Capability
//!
//! Each 8259 is reached through a pair of registers at a base address:
//! the command register at offset 0 and the data register at offset 1.
//! The base comes from chipset enumeration and may live in either the
//! legacy port space (`0x20`/`0xA0` on every PC) or in memory-mapped space
//! on platforms that emulate the PIC behind a bridge.
//!
//! The controller never touches hardware directly. All register access goes
//! through [`PortIo`], so the protocol logic can run against a recording
//! double in tests and against [`RawIo`] on real hardware.

use core::fmt;

use crate::error::IoError;

// =============================================================================
// Constants
// =============================================================================

/// Conventional I/O port base of the primary PIC
pub const PRIMARY_PORT_BASE: u16 = 0x20;

/// Conventional I/O port base of the secondary PIC
pub const SECONDARY_PORT_BASE: u16 = 0xA0;

/// Register offsets within one chip
pub mod offsets {
    /// Command register (ICW1, OCW2, OCW3)
    pub const COMMAND: u16 = 0x00;
    /// Data register (ICW2-4, OCW1 mask)
    pub const DATA: u16 = 0x01;
}

/// POST diagnostic port, written to as an I/O settling delay
const IO_WAIT_PORT: u16 = 0x80;

// =============================================================================
// I/O Handle
// =============================================================================

/// Access mechanism behind an [`IoAddr`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoSpace {
    /// x86 I/O port space (`in`/`out`)
    Port,
    /// Memory-mapped registers
    Mmio,
}

impl IoSpace {
    /// Short name used in log output
    pub const fn name(self) -> &'static str {
        match self {
            IoSpace::Port => "PIO",
            IoSpace::Mmio => "MMIO",
        }
    }
}

/// Addressable register block of one chip
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct IoAddr {
    base: u64,
    space: IoSpace,
}

impl IoAddr {
    /// Handle in I/O port space
    #[inline]
    pub const fn port(base: u16) -> Self {
        Self {
            base: base as u64,
            space: IoSpace::Port,
        }
    }

    /// Handle to memory-mapped registers
    ///
    /// `base` must be a virtual address already mapped by the caller.
    #[inline]
    pub const fn mmio(base: u64) -> Self {
        Self {
            base,
            space: IoSpace::Mmio,
        }
    }

    /// Conventional primary chip handle (port `0x20`)
    #[inline]
    pub const fn legacy_primary() -> Self {
        Self::port(PRIMARY_PORT_BASE)
    }

    /// Conventional secondary chip handle (port `0xA0`)
    #[inline]
    pub const fn legacy_secondary() -> Self {
        Self::port(SECONDARY_PORT_BASE)
    }

    /// Base address
    #[inline]
    pub const fn base(&self) -> u64 {
        self.base
    }

    /// Access mechanism
    #[inline]
    pub const fn space(&self) -> IoSpace {
        self.space
    }
}

impl fmt::Debug for IoAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x} ({})", self.base, self.space.name())
    }
}

// =============================================================================
// Access Capability
// =============================================================================

/// Byte-wide register access
///
/// Implementations decide how an [`IoAddr`] is reached. Writes are assumed
/// to take effect once they return `Ok`; nothing above this trait retries.
pub trait PortIo {
    /// Write one byte to `addr + offset`
    fn write_u8(&mut self, addr: IoAddr, offset: u16, value: u8) -> Result<(), IoError>;

    /// Read one byte from `addr + offset`
    fn read_u8(&mut self, addr: IoAddr, offset: u16) -> Result<u8, IoError>;

    /// Give slow chips time to latch the previous write
    fn io_wait(&mut self) {}
}

impl<T: PortIo + ?Sized> PortIo for &mut T {
    #[inline]
    fn write_u8(&mut self, addr: IoAddr, offset: u16, value: u8) -> Result<(), IoError> {
        (**self).write_u8(addr, offset, value)
    }

    #[inline]
    fn read_u8(&mut self, addr: IoAddr, offset: u16) -> Result<u8, IoError> {
        (**self).read_u8(addr, offset)
    }

    #[inline]
    fn io_wait(&mut self) {
        (**self).io_wait()
    }
}

// =============================================================================
// Hardware Backend
// =============================================================================

/// Direct hardware access (`in`/`out` and volatile MMIO)
///
/// Stateless; a clone carries the same privilege as its source.
#[cfg(target_arch = "x86_64")]
#[derive(Debug, Clone)]
pub struct RawIo {
    _private: (),
}

#[cfg(target_arch = "x86_64")]
impl RawIo {
    /// Create the hardware backend
    ///
    /// # Safety
    ///
    /// The caller must run at a privilege level allowed to perform port I/O,
    /// and every MMIO handle passed to this backend must be mapped.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }

    fn port_of(addr: IoAddr, offset: u16) -> Result<u16, IoError> {
        u16::try_from(addr.base())
            .ok()
            .and_then(|base| base.checked_add(offset))
            .ok_or(IoError::BadAddress { base: addr.base() })
    }

    fn mmio_of(addr: IoAddr, offset: u16) -> Result<*mut u8, IoError> {
        if addr.base() == 0 {
            return Err(IoError::BadAddress { base: addr.base() });
        }
        addr.base()
            .checked_add(offset as u64)
            .map(|a| a as *mut u8)
            .ok_or(IoError::BadAddress { base: addr.base() })
    }
}

#[cfg(target_arch = "x86_64")]
impl PortIo for RawIo {
    fn write_u8(&mut self, addr: IoAddr, offset: u16, value: u8) -> Result<(), IoError> {
        match addr.space() {
            IoSpace::Port => {
                let port = Self::port_of(addr, offset)?;
                unsafe { outb(port, value) };
            },
            IoSpace::Mmio => {
                let ptr = Self::mmio_of(addr, offset)?;
                // Mapping was guaranteed by the caller of `RawIo::new`
                unsafe { core::ptr::write_volatile(ptr, value) };
            },
        }
        Ok(())
    }

    fn read_u8(&mut self, addr: IoAddr, offset: u16) -> Result<u8, IoError> {
        match addr.space() {
            IoSpace::Port => {
                let port = Self::port_of(addr, offset)?;
                Ok(unsafe { inb(port) })
            },
            IoSpace::Mmio => {
                let ptr = Self::mmio_of(addr, offset)?;
                Ok(unsafe { core::ptr::read_volatile(ptr) })
            },
        }
    }

    #[inline]
    fn io_wait(&mut self) {
        unsafe { outb(IO_WAIT_PORT, 0) };
    }
}

#[cfg(target_arch = "x86_64")]
#[inline]
unsafe fn outb(port: u16, value: u8) {
    unsafe {
        core::arch::asm!(
            "out dx, al",
            in("dx") port,
            in("al") value,
            options(nostack, nomem, preserves_flags),
        );
    }
}

#[cfg(target_arch = "x86_64")]
#[inline]
unsafe fn inb(port: u16) -> u8 {
    let value: u8;
    unsafe {
        core::arch::asm!(
            "in al, dx",
            in("dx") port,
            out("al") value,
            options(nostack, nomem, preserves_flags),
        );
    }
    value
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_handles() {
        let primary = IoAddr::legacy_primary();
        let secondary = IoAddr::legacy_secondary();
        assert_eq!(primary.base(), 0x20);
        assert_eq!(secondary.base(), 0xA0);
        assert_eq!(primary.space(), IoSpace::Port);
        assert_ne!(primary, secondary);
    }

    #[test]
    fn test_handle_debug() {
        assert_eq!(format!("{:?}", IoAddr::port(0x20)), "0x20 (PIO)");
        assert_eq!(format!("{:?}", IoAddr::mmio(0xFEC0_0000)), "0xfec00000 (MMIO)");
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_raw_port_bounds() {
        assert_eq!(RawIo::port_of(IoAddr::port(0xA0), offsets::DATA), Ok(0xA1));
        assert_eq!(
            RawIo::port_of(IoAddr::mmio(0x1_0000), 0),
            Err(IoError::BadAddress { base: 0x1_0000 })
        );
        assert_eq!(
            RawIo::port_of(IoAddr::port(0xFFFF), offsets::DATA),
            Err(IoError::BadAddress { base: 0xFFFF })
        );
    }
}
