#![forbid(unsafe_code)]
#![allow(missing_docs)]

//! Deterministic in-process dev chain with an elastic token and a geyser.

pub mod chain;
pub mod geyser;
pub mod token;

pub use chain::{SimChain, SimGeyser, SimToken};
