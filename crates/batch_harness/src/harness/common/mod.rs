//! src/harness/common/mod.rs
//!
//! Utilities shared by the stream and partition workers.

pub mod thread;
