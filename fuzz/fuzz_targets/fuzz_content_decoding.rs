//! Fuzz target for decoding service input.
//!
//! Response bodies, `Resource-Type` header values and configuration
//! documents come from outside the process and must be rejected with an
//! error, never a panic.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_content_decoding -- -max_total_time=600

#![no_main]

use libfuzzer_sys::fuzz_target;
use restauth_client::{ConnectionConfig, ContentHandler, JsonHandler, ResourceType};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = JsonHandler.deserialize(s);

        if let Some(resource_type) = ResourceType::from_header_value(s) {
            assert_eq!(
                ResourceType::from_header_value(resource_type.as_str()),
                Some(resource_type)
            );
        }

        if let Ok(config) = ConnectionConfig::from_json_str(s) {
            let _ = config.validate();
            let _ = config.redacted();
        }
    }
});
