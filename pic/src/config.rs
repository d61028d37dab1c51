//! # PIC Configuration
//!
//! Settings fixed when the controller is constructed. The vector base is
//! the only value that decides which vectors the lines raise, so it is
//! checked before anything reaches hardware.

use static_assertions::const_assert;

use crate::error::{PicError, PicResult};
use crate::line::NUM_LINES;

/// First vector not reserved for CPU exceptions
pub const FIRST_FREE_VECTOR: u8 = 0x20;

/// Default vector base (lines land on 32-47)
pub const DEFAULT_VECTOR_BASE: u8 = 0x20;

/// Highest base that still fits sixteen vectors below 256
pub const MAX_VECTOR_BASE: u8 = (256 - NUM_LINES) as u8;

const fn is_valid_base(base: u8) -> bool {
    base >= FIRST_FREE_VECTOR && base % 8 == 0 && base <= MAX_VECTOR_BASE
}

const_assert!(is_valid_base(DEFAULT_VECTOR_BASE));

/// Controller configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PicConfig {
    /// Vector raised by primary line 0; the secondary starts at `+ 8`
    pub vector_base: u8,
    /// Issue a settling delay between initialization words
    pub io_delay: bool,
}

impl PicConfig {
    /// Configuration with the given vector base and default settings
    pub const fn with_base(vector_base: u8) -> Self {
        Self {
            vector_base,
            io_delay: true,
        }
    }

    /// Check the vector base
    ///
    /// ICW2 only carries bits 7:3 in 8086 mode, so the base must be a
    /// multiple of 8. It must also sit above the exception vectors.
    pub fn validate(&self) -> PicResult<()> {
        if !is_valid_base(self.vector_base) {
            return Err(PicError::InvalidVectorBase(self.vector_base));
        }
        Ok(())
    }

    /// ICW2 for the primary chip
    #[inline]
    pub const fn primary_base(&self) -> u8 {
        self.vector_base
    }

    /// ICW2 for the secondary chip
    #[inline]
    pub const fn secondary_base(&self) -> u8 {
        self.vector_base.wrapping_add(8)
    }
}

impl Default for PicConfig {
    fn default() -> Self {
        Self::with_base(DEFAULT_VECTOR_BASE)
    }
}

// =============================================================================
// Tests
// =============================================================================
