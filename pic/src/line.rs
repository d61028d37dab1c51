//! # Interrupt Lines
//!
//! ```text
//!             ┌───────────┐
//!   IRQ 0-7 ─►│  Primary  │── INTR ──► CPU
//!             │   8259    │
//!             │      IR2 ◄┼──────────┐
//!             └───────────┘          │
//!             ┌───────────┐          │
//!  IRQ 8-15 ─►│ Secondary │── INT ───┘
//!             │   8259    │
//!             └───────────┘
//! ```
//!
//! Vector numbers are `base + line`, so with the default base of `0x20`
//! the lines occupy vectors 32-47.

use core::fmt;

use crate::regs::CASCADE_LINE;

// =============================================================================
// Constants
// =============================================================================

/// Number of interrupt lines across both chips
pub const NUM_LINES: usize = 16;

/// Number of interrupt lines per chip
pub const LINES_PER_CHIP: u8 = 8;

// =============================================================================
// Chip
// =============================================================================

/// One of the two cascaded controllers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chip {
    /// Primary (master) chip, lines 0-7
    Primary,
    /// Secondary (slave) chip, lines 8-15
    Secondary,
}

// =============================================================================
// Interrupt Line
// =============================================================================

/// A validated hardware interrupt line (0-15)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IrqLine(u8);

impl IrqLine {
    /// PIT timer
    pub const TIMER: IrqLine = IrqLine(0);
    /// PS/2 keyboard
    pub const KEYBOARD: IrqLine = IrqLine(1);
    /// Secondary chip input on the primary
    pub const CASCADE: IrqLine = IrqLine(CASCADE_LINE);
    /// CMOS real-time clock
    pub const RTC: IrqLine = IrqLine(8);
    /// PS/2 mouse
    pub const MOUSE: IrqLine = IrqLine(12);

    /// Validate a raw line number
    #[inline]
    pub const fn new(line: u8) -> Option<Self> {
        if (line as usize) < NUM_LINES {
            Some(Self(line))
        } else {
            None
        }
    }

    /// Resolve the line a vector belongs to, given the configured base
    #[inline]
    pub const fn from_vector(vector: u8, base: u8) -> Option<Self> {
        match vector.checked_sub(base) {
            Some(line) => Self::new(line),
            None => None,
        }
    }

    /// All sixteen lines in order
    pub fn all() -> impl Iterator<Item = IrqLine> {
        (0..NUM_LINES as u8).map(IrqLine)
    }

    /// Raw line number
    #[inline]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Table index
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Vector number for this line
    #[inline]
    pub const fn vector(self, base: u8) -> u8 {
        base.wrapping_add(self.0)
    }

    /// Chip the line is wired to
    #[inline]
    pub const fn chip(self) -> Chip {
        if self.0 < LINES_PER_CHIP {
            Chip::Primary
        } else {
            Chip::Secondary
        }
    }

    /// Whether the line arrives through the cascade
    #[inline]
    pub const fn is_secondary(self) -> bool {
        self.0 >= LINES_PER_CHIP
    }

    /// Bit for this line in its chip's mask register
    #[inline]
    pub const fn chip_bit(self) -> u8 {
        1 << (self.0 % LINES_PER_CHIP)
    }

    /// Conventional PC/AT assignment
    pub const fn name(self) -> &'static str {
        match self.0 {
            0 => "Timer",
            1 => "Keyboard",
            2 => "Cascade",
            3 => "COM2",
            4 => "COM1",
            5 => "LPT2",
            6 => "Floppy",
            7 => "LPT1",
            8 => "RTC",
            9 => "ACPI",
            12 => "Mouse",
            13 => "FPU",
            14 => "Primary ATA",
            15 => "Secondary ATA",
            _ => "Free",
        }
    }
}

impl fmt::Debug for IrqLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IRQ{} ({})", self.0, self.name())
    }
}

impl fmt::Display for IrqLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IRQ{}", self.0)
    }
}

impl TryFrom<u8> for IrqLine {
    type Error = u8;

    fn try_from(line: u8) -> Result<Self, Self::Error> {
        IrqLine::new(line).ok_or(line)
    }
}

impl From<IrqLine> for u8 {
    fn from(line: IrqLine) -> Self {
        line.0
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_bounds() {
        assert!(IrqLine::new(0).is_some());
        assert!(IrqLine::new(15).is_some());
        assert!(IrqLine::new(16).is_none());
        assert!(IrqLine::new(255).is_none());
        assert_eq!(IrqLine::all().count(), NUM_LINES);
    }

    #[test]
    fn test_chip_split() {
        assert_eq!(IrqLine::TIMER.chip(), Chip::Primary);
        assert_eq!(IrqLine::new(7).map(IrqLine::chip), Some(Chip::Primary));
        assert_eq!(IrqLine::RTC.chip(), Chip::Secondary);
        assert!(IrqLine::MOUSE.is_secondary());
        assert_eq!(IrqLine::MOUSE.chip_bit(), 1 << 4);
        assert_eq!(IrqLine::CASCADE.chip_bit(), 1 << 2);
    }

    #[test]
    fn test_vector_mapping() {
        assert_eq!(IrqLine::from_vector(32, 0x20), Some(IrqLine::TIMER));
        assert_eq!(IrqLine::from_vector(47, 0x20).map(IrqLine::number), Some(15));
        assert_eq!(IrqLine::from_vector(31, 0x20), None);
        assert_eq!(IrqLine::from_vector(48, 0x20), None);
        assert_eq!(IrqLine::KEYBOARD.vector(0x20), 0x21);
        assert_eq!(IrqLine::from_vector(0x30, 0x30), Some(IrqLine::TIMER));
    }

    #[test]
    fn test_names() {
        assert_eq!(IrqLine::TIMER.name(), "Timer");
        assert_eq!(IrqLine::new(10).map(IrqLine::name), Some("Free"));
        assert_eq!(format!("{:?}", IrqLine::KEYBOARD), "IRQ1 (Keyboard)");
        assert_eq!(IrqLine::try_from(16u8), Err(16));
    }
}
