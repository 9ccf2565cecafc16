//! Negative-space fuzzer for dynamic message unpacking.
//!
//! Arbitrary bytes against a fixed schema must either unpack or fail with a
//! structured error. The header fields (uid, len) come straight from the
//! fuzzer, so this exercises every validation branch in the trust chain.

#![no_main]

use std::sync::OnceLock;

use libfuzzer_sys::fuzz_target;
use satchel_dynamic::{unpack_message, StructValue};
use satchel_schema::DescriptorBuilder;

const SCHEMA: &str = concat!(
    "Flags:\n  type: Bitfield\n  fields:\n    - a: 3\n    - b: 13\n",
    "Mode:\n  type: Enum\n  values:\n    - Idle:\n    - Active:\n",
    "Sample:\n  type: Message\n  fields:\n",
    "    - counter: uint32\n",
    "    - mode: Mode\n",
    "    - flags: Flags\n",
    "    - readings: [[int16, 3], 2]\n",
);

fn types() -> &'static DescriptorBuilder {
    static TYPES: OnceLock<DescriptorBuilder> = OnceLock::new();
    TYPES.get_or_init(|| DescriptorBuilder::from_str(SCHEMA).expect("fuzz schema parses"))
}

fuzz_target!(|data: &[u8]| {
    let types = types();

    let _ = unpack_message(data, types);

    // Direct tree unpacking with arbitrary (often truncated) buffers.
    if let Some(sample) = types.get("Sample") {
        let mut tree = StructValue::new(sample);
        let _ = tree.unpack(data);
    }
});
