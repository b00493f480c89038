// SPDX-License-Identifier: AGPL-3.0-or-later
//! Fuzz target for location parsing and path normalization

#![no_main]

use libfuzzer_sys::fuzz_target;
use od_core::path::{self, Location};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Some(location) = Location::parse(input) {
            let _ = location.to_uri();
            let _ = location.name();
            // a location's URI parses back to the same drive and path
            if let Some(reparsed) = Location::parse(&location.to_uri()) {
                assert_eq!(reparsed.drive, location.drive);
                assert_eq!(reparsed.path, location.path.trim_start_matches('/'));
            }
        }

        // normalization never yields `..` or empty segments
        if let Ok(segments) = path::segments(input) {
            assert!(segments.iter().all(|s| !s.is_empty() && *s != ".." && *s != "."));
        }
        if let Ok(key) = path::normalize(input) {
            assert_eq!(path::normalize(&key).ok().as_deref(), Some(key.as_str()));
        }

        let _ = path::name(input);
        let _ = path::extension(input);
    }
});
