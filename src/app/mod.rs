//! Application core — channel orchestration, zero I/O.
//!
//! The per-channel state machine lives in [`crate::channel`]; this module
//! holds the controller that owns the channel table, the startup registry
//! that builds it, and the **port traits** it talks to hardware through.

pub mod controller;
pub mod events;
pub mod ports;
pub mod registry;
