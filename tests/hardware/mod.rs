//! Hardware-specific tests requiring real serial devices.
//!
//! These tests are ignored by default and require actual hardware to run.
//! They should be run manually with the `--ignored` flag and the `TEST_PORT`
//! environment variable pointing at a port whose TX is wired to its RX.

pub mod loopback_tests;
pub mod utils;
