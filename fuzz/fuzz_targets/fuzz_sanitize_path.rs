//! Fuzz target for request path sanitizing.
//!
//! Arbitrary paths and segment lists must never panic, and the result must
//! always be a slash-delimited path whose segments contain no raw reserved
//! characters. Entity segments named `.` or `..` are refused.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_sanitize_path -- -max_total_time=600

#![no_main]

use libfuzzer_sys::fuzz_target;
use restauth_client::{sanitize_path, RequestPath};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let path = sanitize_path(s);
        assert!(path.starts_with('/'));
        assert!(path.ends_with('/'));
        assert!(!path.contains(['?', '#', ' ']));
        let added =
            usize::from(!s.starts_with('/')) + usize::from(!s.is_empty() && !s.ends_with('/'));
        assert_eq!(path.matches('/').count(), s.matches('/').count() + added);

        // Every input segment stays a single segment; dot names are refused.
        let segments: Vec<&str> = s.split('\0').collect();
        match RequestPath::from_segments(&segments) {
            Ok(path) => {
                assert_eq!(path.as_str().matches('/').count(), segments.len() + 1);
                assert!(!path.as_str().contains("/./"));
                assert!(!path.as_str().contains("/../"));
            }
            Err(_) => assert!(segments.iter().any(|seg| *seg == "." || *seg == "..")),
        }
    }
});
