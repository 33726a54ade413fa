//! # Plannink Cache
//!
//! 選擇性重算的髒標記追蹤

pub mod dirty_tracking;

pub use dirty_tracking::{DirtyReason, DirtyTracker};
