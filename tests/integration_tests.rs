//! Integration tests over synthetic PSP flash images.

use std::fs;
use std::path::Path;

use psp_flash::*;

/// Image length covering both directory areas with room to spare.
const IMAGE_LEN: usize = 0x000e_0000;

/// Helper to write a little-endian u32.
fn write_u32_le(buf: &mut [u8], offset: usize, val: u32) {
    buf[offset..offset + 4].copy_from_slice(&val.to_le_bytes());
}

/// Helper to read a little-endian u32.
fn read_u32_le(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
}

/// Create a blank flash image with a combo directory holding the given
/// `(type_magic, addr_field)` entries.
fn create_combo_image(entries: &[(u32, u32)]) -> Vec<u8> {
    let mut img = vec![0u8; IMAGE_LEN];
    write_u32_le(&mut img, COMBO_DIR_ADDR as usize, COMBO_DIR_MAGIC);
    write_u32_le(
        &mut img,
        (COMBO_DIR_ADDR + DIR_LEN_OFFSET) as usize,
        entries.len() as u32,
    );
    for (i, &(type_magic, addr_field)) in entries.iter().enumerate() {
        let entry = (COMBO_DIR_ADDR + ENTRY_TABLE_OFFSET) as usize + i * ENTRY_SIZE as usize;
        write_u32_le(&mut img, entry, type_magic);
        write_u32_le(&mut img, entry + ENTRY_ADDR_OFFSET as usize, addr_field);
    }
    img
}

/// Set the length field of a bootloader header anchored at `addr`.
fn set_bootloader_length(img: &mut [u8], addr: u32, len: u32) {
    write_u32_le(img, (addr + BL_HEADER_LEN_OFFSET) as usize, len);
}

#[test]
fn rebuild_overlays_one_region_and_repairs_checksums() {
    let template = FlashImage::new(create_combo_image(&[(0x1, 0x2000)]));
    let regions = [MemoryRegion { addr: 0x1000, size: 0x100 }];
    let rebuilder = Rebuilder::new(&template, &regions, &[], &FlashLayout::PSP, Fletcher32);

    let solution = vec![0xaa; 0x100];
    let image = rebuilder.rebuild(&solution).unwrap();
    let out = image.as_bytes();

    assert_eq!(out.len(), IMAGE_LEN);
    assert!(out[0x1000..0x1100].iter().all(|&b| b == 0xaa));
    // Unchanged outside the region, apart from the two checksum fields.
    assert_eq!(out[..0x1000], template.as_bytes()[..0x1000]);
    assert_eq!(out[0x1100..0xc0004], template.as_bytes()[0x1100..0xc0004]);

    // Both checksum fields now hold the Fletcher-32 of their spans.
    let combo_len_addr = (COMBO_DIR_ADDR + DIR_LEN_OFFSET) as usize;
    let combo_span = 1 * ENTRY_SIZE as usize + COMBO_CHECKSUM_TAIL as usize;
    assert_eq!(
        read_u32_le(out, (COMBO_DIR_ADDR + DIR_CHECKSUM_OFFSET) as usize),
        fletcher32(&out[combo_len_addr..combo_len_addr + combo_span])
    );
    let dir_len_addr = (PRIMARY_DIR_ADDR + DIR_LEN_OFFSET) as usize;
    let dir_span = PRIMARY_CHECKSUM_TAIL as usize;
    assert_eq!(
        read_u32_le(out, (PRIMARY_DIR_ADDR + DIR_CHECKSUM_OFFSET) as usize),
        fletcher32(&out[dir_len_addr..dir_len_addr + dir_span])
    );
}

#[test]
fn rebuild_without_combo_magic_uses_short_span() {
    let template = FlashImage::new(vec![0u8; IMAGE_LEN]);
    let rebuilder = Rebuilder::new(&template, &[], &[], &FlashLayout::PSP, Fletcher32);

    let image = rebuilder.rebuild(&[]).unwrap();
    let out = image.as_bytes();

    let combo_len_addr = (COMBO_DIR_ADDR + DIR_LEN_OFFSET) as usize;
    let span = PRIMARY_CHECKSUM_TAIL as usize;
    assert_eq!(
        read_u32_le(out, (COMBO_DIR_ADDR + DIR_CHECKSUM_OFFSET) as usize),
        fletcher32(&out[combo_len_addr..combo_len_addr + span])
    );
    // The primary checksum field is left alone.
    assert_eq!(read_u32_le(out, (PRIMARY_DIR_ADDR + DIR_CHECKSUM_OFFSET) as usize), 0);
}

#[test]
fn classify_finds_known_onchip_overflow() {
    let mut img = create_combo_image(&[(0x1, 0x2000)]);
    set_bootloader_length(&mut img, 0x2000, 0x9000_0000);

    let verdict = classify(&FlashImage::new(img), &FlashLayout::PSP).unwrap();
    assert_eq!(
        verdict,
        Classification::Known {
            kind: BootloaderKind::OnChip,
            len_addr: 0x2000 + BL_HEADER_LEN_OFFSET,
        }
    );
}

#[test]
fn classify_scans_primary_directory_without_combo_magic() {
    let mut img = vec![0u8; IMAGE_LEN];
    let entry = (PRIMARY_DIR_ADDR + ENTRY_TABLE_OFFSET) as usize;
    write_u32_le(&mut img, entry, 0x3);
    write_u32_le(&mut img, entry + ENTRY_ADDR_OFFSET as usize, 0x3000);
    set_bootloader_length(&mut img, 0x3000, 0xffff_ffff);

    let verdict = classify(&FlashImage::new(img), &FlashLayout::PSP).unwrap();
    assert_eq!(
        verdict,
        Classification::Known {
            kind: BootloaderKind::Recovery,
            len_addr: 0x3000 + BL_HEADER_LEN_OFFSET,
        }
    );
}

#[test]
fn classify_clean_image_is_unknown() {
    let mut img = create_combo_image(&[(0x1, 0x2000), (0x3, 0x3000)]);
    set_bootloader_length(&mut img, 0x2000, 0x100);
    set_bootloader_length(&mut img, 0x3000, 0x7fff_ffff);

    let verdict = classify(&FlashImage::new(img), &FlashLayout::PSP).unwrap();
    assert_eq!(verdict, Classification::Unknown);
}

/// Write a complete run directory: config, base image, two solutions.
///
/// Solution `input00` plants the overflow signature inside the overlaid
/// region; `input01` stays clean.
fn create_run_dir(run_dir: &Path) {
    fs::create_dir_all(run_dir.join("solutions")).unwrap();

    fs::write(
        run_dir.join("config.yaml"),
        "flash:
  base: base.ROM
input:
  mem:
    - addr: 0x2000
      size: 0x100
  fixed:
    - addr: 0x4000
      val: 0x11223344
",
    )
    .unwrap();

    // Entry 0 points its bootloader header into the overlaid region.
    let template = create_combo_image(&[(0x1, 0x2000)]);
    fs::write(run_dir.join("base.ROM"), &template).unwrap();

    let mut with_overflow = vec![0u8; 0x100];
    write_u32_le(&mut with_overflow, BL_HEADER_LEN_OFFSET as usize, 0x9000_0000);
    fs::write(run_dir.join("solutions/input00"), &with_overflow).unwrap();
    fs::write(run_dir.join("solutions/input01"), vec![0u8; 0x100]).unwrap();
}

#[test]
fn batch_rebuild_and_triage_roundtrip() {
    let tmp = tempfile::tempdir().unwrap();
    let run_dir = tmp.path().join("run0");
    create_run_dir(&run_dir);

    let rebuilt =
        batch::rebuild_run(&run_dir, Path::new(batch::DEFAULT_IMAGE_DIR), &FlashLayout::PSP)
            .unwrap();
    assert_eq!(rebuilt.files, 2);
    assert_eq!(rebuilt.transformed, 2);

    let out_dir = run_dir.join("solutions").join(batch::DEFAULT_IMAGE_DIR);
    let out = fs::read(out_dir.join("input00_full.ROM")).unwrap();
    assert_eq!(out.len(), IMAGE_LEN);
    assert_eq!(
        read_u32_le(&out, (0x2000 + BL_HEADER_LEN_OFFSET) as usize),
        0x9000_0000
    );
    // The fixed patch lands regardless of the solution contents.
    assert_eq!(read_u32_le(&out, 0x4000), 0x1122_3344);

    let triaged = batch::triage_run(&run_dir, &FlashLayout::PSP).unwrap();
    assert_eq!(triaged.files, 2);
    assert_eq!(triaged.known, 1);
    assert_eq!(triaged.unknown, 1);
    assert_eq!(triaged.failed, 0);
}

#[test]
fn batch_isolates_per_file_failures() {
    let tmp = tempfile::tempdir().unwrap();
    let run_dir = tmp.path().join("run1");
    create_run_dir(&run_dir);

    // A config whose region runs past the image end: every rebuild fails,
    // but the batch itself completes and reports the counts.
    fs::write(
        run_dir.join("config.yaml"),
        "flash:
  base: base.ROM
input:
  mem:
    - addr: 0xfffff000
      size: 0x10000
  fixed: []
",
    )
    .unwrap();

    let rebuilt =
        batch::rebuild_run(&run_dir, Path::new(batch::DEFAULT_IMAGE_DIR), &FlashLayout::PSP)
            .unwrap();
    assert_eq!(rebuilt.files, 2);
    assert_eq!(rebuilt.transformed, 0);
}

#[test]
fn batch_missing_config_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let run_dir = tmp.path().join("run2");
    fs::create_dir_all(run_dir.join("solutions")).unwrap();

    let err = batch::rebuild_run(&run_dir, Path::new("full_img"), &FlashLayout::PSP).unwrap_err();
    assert!(matches!(err, config::SetupError::Io { .. }));
}
