#![no_main]

use std::io::Read;

use formpart::{Config, Multipart};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The first byte picks the buffer size so boundaries straddle refills.
    let (size, data) = match data.split_first() {
        Some((size, data)) => (18 + *size as usize, data),
        None => return,
    };

    let config = Config::new().buffer_size(size);
    let mut multipart = match Multipart::with_config(data, "X-BOUNDARY", config) {
        Ok(multipart) => multipart,
        Err(_) => return,
    };

    let mut breaks = 0;
    let mut buf = [0; 64];
    while breaks < 3 {
        match multipart.next_part() {
            Err(_) | Ok(None) => breaks += 1,
            Ok(Some(mut part)) => while let Ok(n) = part.read(&mut buf) {
                if n == 0 {
                    break;
                }
            },
        }
    }
});
