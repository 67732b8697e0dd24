#![no_main]

use libfuzzer_sys::fuzz_target;
use psp_flash::fletcher32;

fuzz_target!(|data: &[u8]| {
    let sum = fletcher32(data);

    // Both halves are reduced modulo 65535 and stay below it.
    assert!(sum & 0xffff < 0xffff);
    assert!(sum >> 16 < 0xffff);

    // A trailing odd byte behaves like a zero-padded word.
    if data.len() % 2 == 1 {
        let mut padded = data.to_vec();
        padded.push(0);
        assert_eq!(sum, fletcher32(&padded));
    }
});
