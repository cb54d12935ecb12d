//! Platform abstraction layer
//!
//! Turns raw key events into one immutable `InputSnapshot` per frame. The
//! simulation never polls keys directly.

pub mod input;

pub use input::{InputSnapshot, Key, KeyTracker};
