//! Known-overflow classification of flash images.

use crate::directory::{DirEntries, locate};
use crate::error::Result;
use crate::image::FlashImage;
use crate::types::{BootloaderKind, FlashAddr, FlashLayout};

/// Classifier verdict for one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// A bootloader entry's length field carries the known overflow
    /// signature.
    Known {
        /// Which bootloader tripped the predicate.
        kind: BootloaderKind,
        /// Absolute address of the offending length field.
        len_addr: FlashAddr,
    },
    /// No bootloader entry satisfies the overflow predicate.
    Unknown,
}

/// Read the length field of the bootloader header anchored at a directory
/// entry's masked address.
///
/// No validation happens beyond the bounds the image itself enforces;
/// a pointer past the image end is an error, never a silent zero.
pub fn bootloader_length(
    img: &FlashImage,
    entry_addr: FlashAddr,
    layout: &FlashLayout,
) -> Result<u32> {
    img.read_u32_le(entry_addr + layout.bl_len_offset)
}

/// Scan an image's directory for the known length-field overflow.
///
/// Locates the directory, walks its entry table in order, and inspects
/// every normal/recovery bootloader entry until one length field reaches
/// the overflow threshold; that first satisfying entry decides the verdict
/// and ends the scan. Entries of any other type are skipped.
pub fn classify(img: &FlashImage, layout: &FlashLayout) -> Result<Classification> {
    let dir = locate(img, layout)?;
    for entry in DirEntries::new(img, dir, layout) {
        let entry = entry?;
        let Some(kind) = entry.bootloader_kind() else {
            continue;
        };
        if bootloader_length(img, entry.addr, layout)? >= layout.overflow_threshold {
            return Ok(Classification::Known {
                kind,
                len_addr: entry.addr + layout.bl_len_offset,
            });
        }
    }
    Ok(Classification::Unknown)
}
