#![no_main]

use libfuzzer_sys::fuzz_target;
use psp_flash::{FixedValue, FlashImage, FlashLayout, Fletcher32, MemoryRegion, Rebuilder};

fuzz_target!(|data: &[u8]| {
    let layout = FlashLayout {
        combo_dir_addr: 0x000,
        primary_dir_addr: 0x200,
        ..FlashLayout::PSP
    };
    let template = FlashImage::new(vec![0x5a; 0x1000]);
    let regions = [
        MemoryRegion { addr: 0x400, size: 0x40 },
        MemoryRegion { addr: 0x500, size: 0x40 },
    ];
    let fixed = [FixedValue { addr: 0x480, val: 0x1122_3344 }];
    let rebuilder = Rebuilder::new(&template, &regions, &fixed, &layout, Fletcher32);

    // Arbitrary solution streams must never panic, and a rebuild must be
    // deterministic.
    let first = rebuilder.rebuild(data);
    let second = rebuilder.rebuild(data);
    match (first, second) {
        (Ok(a), Ok(b)) => assert_eq!(a.as_bytes(), b.as_bytes()),
        (Err(a), Err(b)) => assert_eq!(a, b),
        _ => panic!("rebuild determinism violated"),
    }
});
