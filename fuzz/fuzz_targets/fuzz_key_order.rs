#![no_main]
use libfuzzer_sys::fuzz_target;

use agent_state::sessions::SessionId;

fuzz_target!(|parts: ((String, String, String), (String, String, String))| {
    let (a, b) = parts;
    let a = SessionId::new(a.0, a.1, a.2);
    let b = SessionId::new(b.0, b.1, b.2);
    assert_eq!(a.cmp(&b), a.encode().cmp(&b.encode()));
});
