#![forbid(unsafe_code)]
#![allow(missing_docs)]

//! Reward accounting checks: tolerance bands, rebases, the reward oracle.

pub mod rebase;
pub mod rewards;
pub mod status;
pub mod tolerance;
