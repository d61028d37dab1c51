//! # PIC Error Types

use core::fmt;

// =============================================================================
// I/O Errors
// =============================================================================

/// Fault reported by the I/O primitive
///
/// The controller never retries: a fault here is surfaced unchanged to
/// whoever drove the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoError {
    /// The addressed register could not be reached
    Unreachable {
        /// Base address of the handle
        base: u64,
        /// Register offset from the base
        offset: u16,
    },

    /// The handle base is not addressable through its access mechanism
    BadAddress {
        /// Base address of the handle
        base: u64,
    },
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoError::Unreachable { base, offset } => {
                write!(f, "I/O register {:#x}+{} unreachable", base, offset)
            },
            IoError::BadAddress { base } => {
                write!(f, "I/O base {:#x} unusable for its access mode", base)
            },
        }
    }
}

// =============================================================================
// Controller Errors
// =============================================================================

/// PIC Error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PicError {
    /// The I/O primitive failed
    Io(IoError),
    /// No port handles have been stored yet
    NotInitialized,
    /// The controller is initialized but currently disabled
    NotActive,
    /// Vector base overlaps exceptions, is misaligned, or overflows
    InvalidVectorBase(u8),
}

impl fmt::Display for PicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PicError::Io(err) => write!(f, "PIC I/O fault: {}", err),
            PicError::NotInitialized => write!(f, "PIC not initialized"),
            PicError::NotActive => write!(f, "PIC not active"),
            PicError::InvalidVectorBase(base) => {
                write!(f, "Invalid PIC vector base {:#04x}", base)
            },
        }
    }
}

impl From<IoError> for PicError {
    fn from(err: IoError) -> Self {
        PicError::Io(err)
    }
}

/// Result type for PIC operations
pub type PicResult<T> = Result<T, PicError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        let err = IoError::Unreachable {
            base: 0x20,
            offset: 1,
        };
        assert_eq!(PicError::from(err), PicError::Io(err));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            PicError::InvalidVectorBase(0x08).to_string(),
            "Invalid PIC vector base 0x08"
        );
        assert_eq!(
            PicError::Io(IoError::Unreachable {
                base: 0xA0,
                offset: 0
            })
            .to_string(),
            "PIC I/O fault: I/O register 0xa0+0 unreachable"
        );
    }
}
