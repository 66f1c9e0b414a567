#![no_main]

use libfuzzer_sys::fuzz_target;
use lookout::domain::services::decode_qr;
use lookout::domain::services::raster::extract_from_bytes;

fuzz_target!(|data: &[u8]| {
    if let Some(pixels) = extract_from_bytes(data, 256) {
        assert!(pixels.width() <= 256 && pixels.height() <= 256);
        let _ = decode_qr(&pixels);
    }
});
