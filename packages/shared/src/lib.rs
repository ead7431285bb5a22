//! Shared utilities for the Idobata chat backend.
//!
//! Cross-cutting concerns used by every binary: logging setup and
//! time utilities with a clock abstraction.

pub mod logger;
pub mod time;
