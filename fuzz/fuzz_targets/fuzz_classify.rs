#![no_main]

use libfuzzer_sys::fuzz_target;
use psp_flash::{FlashImage, FlashLayout, classify, locate};

fuzz_target!(|data: &[u8]| {
    let img = FlashImage::new(data.to_vec());

    // Full-size layout: most inputs fail the first directory read, which
    // must surface as an error, never a panic.
    let _ = locate(&img, &FlashLayout::PSP);
    let _ = classify(&img, &FlashLayout::PSP);

    // Compact layout so small inputs reach the entry walker and the
    // bootloader header reads.
    let tiny = FlashLayout {
        combo_dir_addr: 0x000,
        primary_dir_addr: 0x200,
        ..FlashLayout::PSP
    };
    let _ = classify(&img, &tiny);
});
