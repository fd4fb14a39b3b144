//! meshcombine core
//!
//! Shared collections, logging setup and profiling hooks used by the
//! meshcombine crates.

pub mod alloc;
pub mod logging;
pub mod profiling;
