//! Foundation types for conch.
//!
//! This crate contains the host-agnostic types shared by the shell engine
//! and its hosts: colors, key events, configuration, the wall-clock service,
//! and error types.

pub mod color;
pub mod config;
pub mod error;
pub mod input;
pub mod time;
