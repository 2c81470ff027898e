//! FFI layer exposing the interaction engine to a Python step driver.
//!
//! The spatial simulation that owns adjacency and the tick loop runs in
//! Python; it holds cell identifiers only and calls into the Rust core
//! once per adjacent pair per tick.

pub mod engine;
pub mod types;
