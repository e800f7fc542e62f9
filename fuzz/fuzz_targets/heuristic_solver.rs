#![no_main]

use libfuzzer_sys::fuzz_target;
use nodetrix_order::fuzz::FuzzHierarchy;

fuzz_target!(|hierarchy: FuzzHierarchy| {
    nodetrix_order::fuzz::fuzz_heuristic_solver(hierarchy);
});
