#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    nodetrix_order::fuzz::fuzz_graph_from_json(data);
});
