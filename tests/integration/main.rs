//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against the host simulation adapters.  All tests run on the host
//! (x86_64) with no real hardware required.

mod race_tests;
mod registry_tests;
mod scenario_tests;
