//! Constants for the PSP flash directory layout.
//!
//! All offsets are absolute positions within the flash address space unless
//! a comment says otherwise, and all multi-byte fields are little-endian.

/// Magic value identifying a combo directory header ("2PSP" on disk).
pub const COMBO_DIR_MAGIC: u32 = 0x5053_5032;

/// Base address of the combo directory.
pub const COMBO_DIR_ADDR: u32 = 0x000c_0000;

/// Base address of the primary directory.
pub const PRIMARY_DIR_ADDR: u32 = 0x000d_1000;

// Directory header field offsets (relative to the directory base)
/// Magic field offset.
pub const DIR_MAGIC_OFFSET: u32 = 0x0;
/// Checksum field offset.
pub const DIR_CHECKSUM_OFFSET: u32 = 0x4;
/// Entry-count (length) field offset.
pub const DIR_LEN_OFFSET: u32 = 0x8;

/// Offset of the entry table relative to the directory base.
pub const ENTRY_TABLE_OFFSET: u32 = 0x10;

/// Size of one directory entry in bytes.
pub const ENTRY_SIZE: u32 = 0x10;

/// Hard upper bound on scanned directory entries, independent of the
/// header's entry-count field.
pub const MAX_DIR_ENTRIES: usize = 64;

// Directory entry field offsets (relative to the entry start)
/// Type-magic field offset.
pub const ENTRY_TYPE_OFFSET: u32 = 0x0;
/// Address field offset.
pub const ENTRY_ADDR_OFFSET: u32 = 0x8;

/// Mask extracting the flash address from an entry's address field.
/// The top byte holds flag bits and is never part of the address.
pub const ENTRY_ADDR_MASK: u32 = 0x00ff_ffff;

/// Offset of the length field within a bootloader header, relative to the
/// entry's masked address.
pub const BL_HEADER_LEN_OFFSET: u32 = 0x14;

// Entry type magics
/// Normal (on-chip) bootloader.
pub const NORMAL_BL_MAGIC: u32 = 0x1;
/// Recovery bootloader.
pub const RECOVERY_BL_MAGIC: u32 = 0x3;

/// A bootloader length field at or above this value is the known overflow
/// signature (top bit set).
pub const OVERFLOW_LEN_THRESHOLD: u32 = 0x8000_0000;

// Checksum span tails: the checksum covers `count * ENTRY_SIZE + tail`
// bytes starting at the length field.
/// Span tail for a combo directory header.
pub const COMBO_CHECKSUM_TAIL: u32 = 0x18;
/// Span tail for a primary directory header. Also the combo directory's
/// own tail when no combo magic is present.
pub const PRIMARY_CHECKSUM_TAIL: u32 = 0x8;
