#![forbid(unsafe_code)]
#![allow(missing_docs)]

//! Cross-chain bridge flow tracking.

pub mod flow;

pub use flow::{BridgeFlow, BridgeParams, FlowError, FlowEvent, FlowState};
