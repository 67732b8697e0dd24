//! Error types for flash image operations.

use core::fmt;

/// Error type for flash image operations.
///
/// Every fallible core operation fails the same way: an access computed
/// from image contents or configuration landed outside the buffer. Such an
/// access is never clamped and never reads as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashError {
    /// A read or write reached past the end of the image buffer.
    OutOfRange {
        /// Absolute start address of the access.
        addr: u32,
        /// Length of the access in bytes.
        len: usize,
    },
}

impl fmt::Display for FlashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { addr, len } => {
                write!(f, "access of {len} bytes at {addr:#010x} is out of range")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FlashError {}

/// Result type for flash image operations.
pub type Result<T> = core::result::Result<T, FlashError>;
