//! Generic test bodies shared by every set variant.
//!
//! Integration tests in this crate and in lockstep-crossbeam instantiate
//! them once per variant and guard type.

pub mod hashers;
pub mod set_stress_tests;
pub mod tracked;
