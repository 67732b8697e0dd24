//! Core types for PSP flash images.

use core::fmt;

use crate::constants::*;

/// Absolute byte address within the flash address space.
pub type FlashAddr = u32;

/// Checksum engine trait for directory checksum fields.
///
/// The firmware's loader validates each directory with a Fletcher-32
/// variant; an engine must return the 4-byte little-endian value that the
/// loader itself would compute over `data`, so that re-embedding the
/// result at the directory's checksum offset makes the image validate.
///
/// Implement this trait to swap the checksum out in tests or to reuse the
/// rebuild logic against a different directory format.
pub trait ChecksumEngine {
    /// Compute the checksum over an arbitrary byte span.
    fn checksum(&self, data: &[u8]) -> [u8; 4];
}

/// Which on-flash directory anchors the metadata structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryKind {
    /// Combo directory at [`COMBO_DIR_ADDR`], identified by its magic.
    Combo,
    /// Primary directory at [`PRIMARY_DIR_ADDR`], assumed present as the
    /// fallback; its own magic is never checked.
    Primary,
}

/// Bootloader component kinds recognized by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootloaderKind {
    /// Normal (on-chip) bootloader, entry type magic `0x1`.
    OnChip,
    /// Recovery bootloader, entry type magic `0x3`.
    Recovery,
}

impl BootloaderKind {
    /// Map an entry type magic to a bootloader kind.
    pub const fn from_type_magic(magic: u32) -> Option<Self> {
        match magic {
            NORMAL_BL_MAGIC => Some(Self::OnChip),
            RECOVERY_BL_MAGIC => Some(Self::Recovery),
            _ => None,
        }
    }
}

impl fmt::Display for BootloaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnChip => write!(f, "on-chip"),
            Self::Recovery => write!(f, "recovery"),
        }
    }
}

/// A flash byte range subject to solution overlay.
///
/// Order within a region list is significant: it is the order in which bytes
/// are consumed from the solution stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    /// Absolute start address of the region.
    pub addr: FlashAddr,
    /// Region size in bytes.
    pub size: usize,
}

/// A fixed 4-byte little-endian patch applied after region overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedValue {
    /// Absolute address of the patch.
    pub addr: FlashAddr,
    /// Value written at `addr`.
    pub val: u32,
}

/// The complete binary layout, bundled into one immutable value.
///
/// Every component takes the layout explicitly instead of reaching for
/// globals, so a variant layout (or a deliberately skewed one in tests)
/// threads through the whole pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashLayout {
    /// Combo directory magic value.
    pub combo_magic: u32,
    /// Combo directory base address.
    pub combo_dir_addr: FlashAddr,
    /// Primary directory base address.
    pub primary_dir_addr: FlashAddr,
    /// Directory magic field offset from the directory base.
    pub dir_magic_offset: u32,
    /// Directory checksum field offset from the directory base.
    pub dir_checksum_offset: u32,
    /// Directory entry-count field offset from the directory base.
    pub dir_len_offset: u32,
    /// Entry table offset from the directory base.
    pub entry_table_offset: u32,
    /// Size of one directory entry.
    pub entry_size: u32,
    /// Hard bound on scanned entries.
    pub max_entries: usize,
    /// Entry type-magic field offset from the entry start.
    pub entry_type_offset: u32,
    /// Entry address field offset from the entry start.
    pub entry_addr_offset: u32,
    /// Mask extracting the flash address from the entry address field.
    pub entry_addr_mask: u32,
    /// Bootloader header length field offset from the entry address.
    pub bl_len_offset: u32,
    /// Checksum span tail for a combo header.
    pub combo_checksum_tail: u32,
    /// Checksum span tail for a primary header.
    pub primary_checksum_tail: u32,
    /// Known-overflow threshold for bootloader length fields.
    pub overflow_threshold: u32,
}

impl FlashLayout {
    /// The AMD PSP layout.
    pub const PSP: Self = Self {
        combo_magic: COMBO_DIR_MAGIC,
        combo_dir_addr: COMBO_DIR_ADDR,
        primary_dir_addr: PRIMARY_DIR_ADDR,
        dir_magic_offset: DIR_MAGIC_OFFSET,
        dir_checksum_offset: DIR_CHECKSUM_OFFSET,
        dir_len_offset: DIR_LEN_OFFSET,
        entry_table_offset: ENTRY_TABLE_OFFSET,
        entry_size: ENTRY_SIZE,
        max_entries: MAX_DIR_ENTRIES,
        entry_type_offset: ENTRY_TYPE_OFFSET,
        entry_addr_offset: ENTRY_ADDR_OFFSET,
        entry_addr_mask: ENTRY_ADDR_MASK,
        bl_len_offset: BL_HEADER_LEN_OFFSET,
        combo_checksum_tail: COMBO_CHECKSUM_TAIL,
        primary_checksum_tail: PRIMARY_CHECKSUM_TAIL,
        overflow_threshold: OVERFLOW_LEN_THRESHOLD,
    };

    /// Base address of a directory of the given kind.
    #[inline]
    pub const fn dir_base(&self, kind: DirectoryKind) -> FlashAddr {
        match kind {
            DirectoryKind::Combo => self.combo_dir_addr,
            DirectoryKind::Primary => self.primary_dir_addr,
        }
    }

    /// Absolute address of a directory's magic field.
    #[inline]
    pub const fn magic_addr(&self, kind: DirectoryKind) -> FlashAddr {
        self.dir_base(kind) + self.dir_magic_offset
    }

    /// Absolute address of a directory's checksum field.
    #[inline]
    pub const fn checksum_addr(&self, kind: DirectoryKind) -> FlashAddr {
        self.dir_base(kind) + self.dir_checksum_offset
    }

    /// Absolute address of a directory's entry-count field.
    #[inline]
    pub const fn len_addr(&self, kind: DirectoryKind) -> FlashAddr {
        self.dir_base(kind) + self.dir_len_offset
    }

    /// Absolute address of a directory's entry table.
    #[inline]
    pub const fn entry_table_addr(&self, kind: DirectoryKind) -> FlashAddr {
        self.dir_base(kind) + self.entry_table_offset
    }

    /// Checksum span tail for a directory header of the given kind.
    #[inline]
    pub const fn checksum_tail(&self, kind: DirectoryKind) -> u32 {
        match kind {
            DirectoryKind::Combo => self.combo_checksum_tail,
            DirectoryKind::Primary => self.primary_checksum_tail,
        }
    }
}

impl Default for FlashLayout {
    fn default() -> Self {
        Self::PSP
    }
}
