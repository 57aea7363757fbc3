//! Foundation module - Core utilities
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Logging utilities

pub mod logging;
