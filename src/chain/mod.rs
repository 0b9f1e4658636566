#![forbid(unsafe_code)]
#![allow(missing_docs)]

//! Simulated-chain boundary: JSON-RPC transport, ABI, contracts, clock, snapshots.

pub mod abi;
pub mod clock;
pub mod contracts;
pub mod rpc;
pub mod snapshot;
