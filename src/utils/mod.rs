//! Utility functions and helpers
//!
//! This module contains atomic file helpers used by the store backends.

pub mod atomic;

pub use atomic::{atomic_write_with, remove_stale_temp, temp_path_for};
