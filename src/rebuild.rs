//! Flash image reconstruction from solution byte streams.

use crate::error::Result;
use crate::image::FlashImage;
use crate::types::{ChecksumEngine, DirectoryKind, FixedValue, FlashLayout, MemoryRegion};

/// Rebuilds complete flash images from minimized solution files.
///
/// One rebuilder serves a whole batch: it borrows the immutable base
/// template together with the region and patch lists, and every
/// [`rebuild`](Self::rebuild) call clones the template into its own
/// working copy. All held state is read-only, so a caller may run one
/// rebuild per thread over a shared rebuilder without locking.
pub struct Rebuilder<'a, C: ChecksumEngine> {
    template: &'a FlashImage,
    regions: &'a [MemoryRegion],
    fixed: &'a [FixedValue],
    layout: FlashLayout,
    engine: C,
}

impl<'a, C: ChecksumEngine> Rebuilder<'a, C> {
    /// Create a rebuilder over a base template and its input lists.
    pub fn new(
        template: &'a FlashImage,
        regions: &'a [MemoryRegion],
        fixed: &'a [FixedValue],
        layout: &FlashLayout,
        engine: C,
    ) -> Self {
        Self {
            template,
            regions,
            fixed,
            layout: *layout,
            engine,
        }
    }

    /// Rebuild one complete image from a solution byte stream.
    ///
    /// Regions are zero-filled and overlaid in list order while a cursor
    /// consumes the solution bytes; fixed patches are applied afterwards
    /// and overwrite anything the overlay wrote; finally the directory
    /// checksum fields are recomputed. The output is always byte-identical
    /// in length to the template.
    pub fn rebuild(&self, solution: &[u8]) -> Result<FlashImage> {
        let mut img = self.template.clone();
        self.overlay_regions(&mut img, solution)?;
        self.apply_fixed(&mut img)?;
        self.repair_checksums(&mut img)?;
        Ok(img)
    }

    /// Zero-fill each region, then overlay as many leading solution bytes
    /// as fit; excess bytes carry over to the next region, and exhausted
    /// input leaves the rest of a region zero.
    fn overlay_regions(&self, img: &mut FlashImage, mut solution: &[u8]) -> Result<()> {
        for region in self.regions {
            img.zero_fill(region.addr, region.size)?;
            let take = region.size.min(solution.len());
            img.write_bytes(region.addr, &solution[..take])?;
            solution = &solution[take..];
        }
        Ok(())
    }

    fn apply_fixed(&self, img: &mut FlashImage) -> Result<()> {
        for patch in self.fixed {
            img.write_u32_le(patch.addr, patch.val)?;
        }
        Ok(())
    }

    /// Recompute the directory checksum fields.
    ///
    /// With the combo magic present both directories are repaired, each
    /// over its own span. Without it only the combo checksum field is
    /// written, using the shorter primary-style span at the combo base.
    fn repair_checksums(&self, img: &mut FlashImage) -> Result<()> {
        let layout = &self.layout;
        let magic = img.read_u32_le(layout.magic_addr(DirectoryKind::Combo))?;
        if magic == layout.combo_magic {
            for kind in [DirectoryKind::Combo, DirectoryKind::Primary] {
                self.patch_checksum(img, kind, layout.checksum_tail(kind))?;
            }
        } else {
            self.patch_checksum(img, DirectoryKind::Combo, layout.primary_checksum_tail)?;
        }
        Ok(())
    }

    /// Checksum one directory header: the span starts at the entry-count
    /// field and covers `count * entry_size + tail` bytes.
    fn patch_checksum(&self, img: &mut FlashImage, kind: DirectoryKind, tail: u32) -> Result<()> {
        let layout = &self.layout;
        let len_addr = layout.len_addr(kind);
        let count = img.read_u32_le(len_addr)?;
        // The count comes from image bytes; the span math must not wrap.
        let span = count as u64 * layout.entry_size as u64 + tail as u64;
        let span = usize::try_from(span).unwrap_or(usize::MAX);
        let sum = self.engine.checksum(img.bytes_at(len_addr, span)?);
        img.write_bytes(layout.checksum_addr(kind), &sum)
    }
}
