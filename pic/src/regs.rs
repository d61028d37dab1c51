//! # 8259 Control Words
//!
//! ## Initialization Control Words
//!
//! ```text
//! Word  Port     Bits
//! ─────────────────────────────────────────────────────────────────────
//! ICW1  command  | A7 | A6 | A5 | 1 | LTIM | ADI | SNGL | IC4 |
//! ICW2  data     | T7 | T6 | T5 | T4 | T3 | 0 | 0 | 0 |   (vector base)
//! ICW3  data     primary:   one bit per input that has a secondary
//!                secondary: | 0 | 0 | 0 | 0 | 0 | ID2 | ID1 | ID0 |
//! ICW4  data     | 0 | 0 | 0 | SFNM | BUF | M/S | AEOI | uPM |
//! ```
//!
//! The four words must be sent in order. After ICW1 the chip expects ICW2,
//! ICW3 (only in cascade mode) and ICW4 (only when IC4 is set) on its data
//! port, and anything written there is consumed as the next word.
//!
//! ## Operation Control Words
//!
//! - OCW1 (data port): interrupt mask register, one bit per line
//! - OCW2 (command port): end-of-interrupt commands

use bitflags::bitflags;
use static_assertions::const_assert_eq;

bitflags! {
    /// ICW1 bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Icw1: u8 {
        /// ICW4 will follow
        const IC4 = 1 << 0;
        /// Single chip (no ICW3)
        const SINGLE = 1 << 1;
        /// Call address interval of 4 (ignored in 8086 mode)
        const INTERVAL4 = 1 << 2;
        /// Level triggered instead of edge triggered
        const LEVEL = 1 << 3;
        /// Marks the byte as ICW1
        const INIT = 1 << 4;
    }
}

bitflags! {
    /// ICW4 bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Icw4: u8 {
        /// 8086/88 mode
        const MODE_8086 = 1 << 0;
        /// Automatic end of interrupt
        const AUTO_EOI = 1 << 1;
        /// Buffered mode, this chip is the primary
        const BUFFER_PRIMARY = 1 << 2;
        /// Buffered mode
        const BUFFERED = 1 << 3;
        /// Special fully nested mode
        const NESTED = 1 << 4;
    }
}

/// Edge triggered, cascaded, ICW4 follows
pub const ICW1: Icw1 = Icw1::INIT.union(Icw1::IC4);

/// Primary input line wired to the secondary chip
pub const CASCADE_LINE: u8 = 2;

/// ICW3 for the primary: bitmask of inputs with a secondary attached
pub const PRIMARY_ICW3: u8 = 1 << CASCADE_LINE;

/// ICW3 for the secondary: its cascade identity
pub const SECONDARY_ICW3: u8 = CASCADE_LINE;

/// 8086 mode, normal (non-automatic) EOI
pub const ICW4: Icw4 = Icw4::MODE_8086;

/// OCW2 non-specific end of interrupt
pub const OCW2_EOI: u8 = 0x20;

/// OCW1 value masking every line of a chip
pub const MASK_ALL: u8 = 0xFF;

// The bit the primary sets must name the identity the secondary answers to
const_assert_eq!(PRIMARY_ICW3, 1 << SECONDARY_ICW3);
const_assert_eq!(ICW1.bits(), 0x11);
const_assert_eq!(ICW4.bits(), 0x01);

// =============================================================================
// Tests
// =============================================================================
