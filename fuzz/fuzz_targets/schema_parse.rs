//! Negative-space fuzzer for the schema parser.
//!
//! Arbitrary text must either parse into a descriptor graph or return a
//! structured error. Panics, hangs, and allocation blowups are bugs: the
//! parser runs on log headers, which arrive from disk untrusted.

#![no_main]

use libfuzzer_sys::fuzz_target;
use satchel_schema::DescriptorBuilder;

fuzz_target!(|text: &str| {
    let _ = DescriptorBuilder::from_str(text);
});
