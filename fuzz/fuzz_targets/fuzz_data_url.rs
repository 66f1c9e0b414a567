#![no_main]

use libfuzzer_sys::fuzz_target;
use lookout::domain::services::data_url;

fuzz_target!(|url: &str| {
    if let Some(parsed) = data_url::decode(url) {
        let again = data_url::encode(&parsed.media_type, &parsed.bytes);
        assert_eq!(data_url::decode(&again), Some(parsed));
    }
});
