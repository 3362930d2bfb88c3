//! Eventloom Core — shared domain abstractions.
//!
//! This crate defines the fundamental types and contracts that the engine,
//! mapping, and storage crates depend on. It contains no infrastructure
//! code.

pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod store;
pub mod time;
