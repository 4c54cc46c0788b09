//! Line-oriented tool server over the notebase core.
//!
//! The binary in `main.rs` wires these modules to stdin/stdout; they are
//! exposed as a library so the protocol can be driven from tests.

pub mod config;
pub mod handlers;
pub mod server;
