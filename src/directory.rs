//! Directory location and traversal.

use crate::error::Result;
use crate::image::FlashImage;
use crate::types::{BootloaderKind, DirectoryKind, FlashAddr, FlashLayout};

/// Select the directory kind anchoring an image's metadata.
///
/// Probes the 4 bytes at the combo base address: on a magic match the
/// combo directory is selected and anchors all directory structures.
/// Otherwise the primary directory is assumed present at its own base
/// address and selected *without any magic check there* — the fallback
/// trusts an unverified header, and that weak precondition is part of the
/// contract, not an accident to repair here.
///
/// A missing combo magic is not a failure; the only error is an image too
/// short to hold the probed field.
pub fn locate(img: &FlashImage, layout: &FlashLayout) -> Result<DirectoryKind> {
    let magic = img.read_u32_le(layout.magic_addr(DirectoryKind::Combo))?;
    if magic == layout.combo_magic {
        Ok(DirectoryKind::Combo)
    } else {
        Ok(DirectoryKind::Primary)
    }
}

/// Directory header fields.
///
/// A transient view computed from the image bytes on demand; headers are
/// never stored separately from the image they describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryHeader {
    /// Magic field value.
    pub magic: u32,
    /// Stored checksum field value.
    pub checksum: u32,
    /// Entry-count (length) field value.
    pub entry_count: u32,
}

impl DirectoryHeader {
    /// Read the header of a directory of the given kind.
    pub fn read(img: &FlashImage, kind: DirectoryKind, layout: &FlashLayout) -> Result<Self> {
        Ok(Self {
            magic: img.read_u32_le(layout.magic_addr(kind))?,
            checksum: img.read_u32_le(layout.checksum_addr(kind))?,
            entry_count: img.read_u32_le(layout.len_addr(kind))?,
        })
    }
}

/// One directory entry: its type magic and masked payload address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry type magic.
    pub type_magic: u32,
    /// Payload flash address, flag byte already masked off.
    pub addr: FlashAddr,
}

impl DirEntry {
    /// The bootloader kind this entry describes, if any.
    #[inline]
    pub const fn bootloader_kind(&self) -> Option<BootloaderKind> {
        BootloaderKind::from_type_magic(self.type_magic)
    }
}

/// Lazy iterator over a directory's entry table.
///
/// Yields entries in table order (ascending offset) and stops after
/// [`FlashLayout::max_entries`] entries no matter what the header's
/// entry-count field claims. The iterator holds only shared borrows and is
/// `Clone`, so a scan can be restarted or forked at any point.
#[derive(Clone)]
pub struct DirEntries<'a> {
    img: &'a FlashImage,
    layout: FlashLayout,
    table: FlashAddr,
    index: usize,
}

impl<'a> DirEntries<'a> {
    /// Iterate the entry table of a directory of the given kind.
    pub fn new(img: &'a FlashImage, kind: DirectoryKind, layout: &FlashLayout) -> Self {
        Self {
            img,
            layout: *layout,
            table: layout.entry_table_addr(kind),
            index: 0,
        }
    }
}

impl Iterator for DirEntries<'_> {
    type Item = Result<DirEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.layout.max_entries {
            return None;
        }
        let entry_addr = self.table + self.index as u32 * self.layout.entry_size;
        self.index += 1;

        let type_magic = match self.img.read_u32_le(entry_addr + self.layout.entry_type_offset) {
            Ok(val) => val,
            Err(e) => return Some(Err(e)),
        };
        let raw_addr = match self.img.read_u32_le(entry_addr + self.layout.entry_addr_offset) {
            Ok(val) => val,
            Err(e) => return Some(Err(e)),
        };

        Some(Ok(DirEntry {
            type_magic,
            addr: raw_addr & self.layout.entry_addr_mask,
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.layout.max_entries - self.index;
        (0, Some(left))
    }
}
