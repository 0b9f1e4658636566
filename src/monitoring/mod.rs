#![forbid(unsafe_code)]
#![allow(missing_docs)]

//! Observability (metrics, structured logging setup).

pub mod logging;
pub mod metrics;
