#![no_main]

use libfuzzer_sys::fuzz_target;
use lookout::domain::services::looks_like_ciphertext;

fuzz_target!(|text: &str| {
    let hit = looks_like_ciphertext(text);
    if hit {
        assert!(text.trim().chars().count() >= 40);
    }
});
