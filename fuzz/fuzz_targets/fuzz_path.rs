// SPDX-License-Identifier: AGPL-3.0-or-later
//! Fuzz target for path intent classification

#![no_main]

use dbxfs_core::path::{
    basename, classify, has_trailing_intent, join_basename, normalize, strip_trailing,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let intent = classify(input);
        assert_eq!(intent.has_trailing_intent, has_trailing_intent(input));
        assert_eq!(intent.basename, basename(input));

        // Only one separator is ever removed
        let stripped = strip_trailing(input);
        assert!(input.len() - stripped.len() <= 1);
        assert!(!basename(input).contains('/'));

        let normalized = normalize(input);
        assert!(normalized.len() <= input.len());

        // Split the input into a destination folder and a source path
        if let Some((dir, source)) = input.split_once('\n') {
            let joined = join_basename(dir, source);
            assert!(joined.starts_with(dir));
            assert!(joined.ends_with(basename(source)));
        }
    }
});
