#![no_main]
use libfuzzer_sys::fuzz_target;

use agent_state::sessions::key::{decode, EncodedKey};

fuzz_target!(|data: &[u8]| {
    let key = EncodedKey::from_bytes(data.to_vec());
    if let Ok(id) = decode(&key) {
        // Anything that decodes must be exactly what encode would produce.
        assert_eq!(id.encode(), key);
    }
});
